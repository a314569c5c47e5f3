//! Tool definitions and the Tool Dispatcher.
//!
//! A tool is a schema-guarded callback a prompt template can invoke mid-render.
//! The dispatcher builds the tool's input from the marker's argument mapping,
//! validates it, calls the implementation, and validates what comes back.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::flow::error::{Boundary, FlowError};
use crate::flow::schema::{ObjectSchema, Schema};
use crate::flow::template::ToolMarker;

/// Implementation of a tool. Receives input already validated against the
/// tool's input schema; its output is validated before use.
///
/// Implementations must not depend on engine state. Any I/O they perform
/// (e.g. a store lookup) happens inside the call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: Value) -> anyhow::Result<Value>;
}

/// Adapter turning a plain synchronous function into a [`ToolHandler`].
pub struct FnTool<F>(F);

impl<F> FnTool<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    async fn call(&self, input: Value) -> anyhow::Result<Value> {
        (self.0)(input)
    }
}

#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    /// Shown to the model; not interpreted by the engine.
    pub description: String,
    pub input_schema: ObjectSchema,
    pub output_schema: Schema,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Resolves tool markers against the tools declared by one flow.
pub struct ToolDispatcher<'a> {
    tools: &'a [ToolDefinition],
}

impl<'a> ToolDispatcher<'a> {
    pub fn new(tools: &'a [ToolDefinition]) -> Self {
        Self { tools }
    }

    pub fn lookup(&self, name: &str) -> Result<&'a ToolDefinition, FlowError> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| FlowError::ToolNotFound {
                name: name.to_string(),
            })
    }

    /// Runs the tool named by `marker`, reading its arguments from `input`.
    pub async fn dispatch(&self, marker: &ToolMarker, input: &Value) -> Result<Value, FlowError> {
        let tool = self.lookup(&marker.name)?;

        let mut args = Map::new();
        for (arg, path) in &marker.args {
            if let Some(value) = path.resolve(input).filter(|v| !v.is_null()) {
                args.insert(arg.clone(), value.clone());
            }
        }

        let validated = tool
            .input_schema
            .validate(&Value::Object(args))
            .map_err(|source| FlowError::SchemaValidation {
                boundary: Boundary::ToolInput {
                    tool: tool.name.clone(),
                },
                source,
            })?;

        debug!("Dispatching tool {}", tool.name);
        let output = tool
            .handler
            .call(validated)
            .await
            .map_err(|source| FlowError::ToolExecution {
                tool: tool.name.clone(),
                source,
            })?;

        tool.output_schema
            .validate(&output)
            .map_err(|source| FlowError::SchemaValidation {
                boundary: Boundary::ToolOutput {
                    tool: tool.name.clone(),
                },
                source,
            })
    }
}
