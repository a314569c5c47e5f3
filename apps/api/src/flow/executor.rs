//! Flow definitions and the Flow Executor.
//!
//! One invocation walks a fixed sequence of stages:
//! Validating → Rendering → (ToolDispatch)* → Invoking → ParsingOutput → Succeeded | Failed.
//! Nothing is carried over between invocations, so concurrent calls share no
//! mutable state.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::flow::error::{Boundary, FlowError, ModelOutputReason};
use crate::flow::model::{ModelBackend, ModelRequest};
use crate::flow::render::render;
use crate::flow::schema::ObjectSchema;
use crate::flow::template::{Template, TemplateError};
use crate::flow::tool::{ToolDefinition, ToolDispatcher};

/// Validated output of an invocation, or the reason there is none.
pub type InvocationResult = Result<Value, FlowError>;

/// A named, immutable prompt-to-model pipeline configuration.
pub struct FlowDefinition {
    name: String,
    system: String,
    input_schema: ObjectSchema,
    output_schema: ObjectSchema,
    template: Template,
    tools: Vec<ToolDefinition>,
}

impl fmt::Debug for FlowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("name", &self.name)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl FlowDefinition {
    pub fn builder(name: &str) -> FlowDefinitionBuilder {
        FlowDefinitionBuilder {
            name: name.to_string(),
            system: String::new(),
            input_schema: ObjectSchema::new(),
            output_schema: ObjectSchema::new(),
            prompt: String::new(),
            tools: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_schema(&self) -> &ObjectSchema {
        &self.output_schema
    }

    /// Validates raw input, producing a request ready for rendering.
    pub fn prepare(&self, raw_input: &Value) -> Result<InvocationRequest<'_>, FlowError> {
        let input = self
            .input_schema
            .validate(raw_input)
            .map_err(|source| FlowError::SchemaValidation {
                boundary: Boundary::FlowInput {
                    flow: self.name.clone(),
                },
                source,
            })?;
        Ok(InvocationRequest { flow: self, input })
    }
}

pub struct FlowDefinitionBuilder {
    name: String,
    system: String,
    input_schema: ObjectSchema,
    output_schema: ObjectSchema,
    prompt: String,
    tools: Vec<ToolDefinition>,
}

impl FlowDefinitionBuilder {
    pub fn system(mut self, system: &str) -> Self {
        self.system = system.to_string();
        self
    }

    pub fn input(mut self, schema: ObjectSchema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn output(mut self, schema: ObjectSchema) -> Self {
        self.output_schema = schema;
        self
    }

    pub fn prompt(mut self, template: &str) -> Self {
        self.prompt = template.to_string();
        self
    }

    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    /// Parses the template and checks every tool marker names a declared tool.
    pub fn build(self) -> Result<FlowDefinition, FlowError> {
        let FlowDefinitionBuilder {
            name,
            system,
            input_schema,
            output_schema,
            prompt,
            tools,
        } = self;

        let invalid = |source: TemplateError| FlowError::Template {
            flow: name.clone(),
            source,
        };

        let template = Template::parse(&prompt).map_err(invalid)?;

        let mut declared = HashSet::new();
        for tool in &tools {
            if !declared.insert(tool.name.as_str()) {
                return Err(invalid(TemplateError::DuplicateTool {
                    name: tool.name.clone(),
                }));
            }
        }
        if let Some(missing) = template.tool_names().find(|n| !declared.contains(n)) {
            return Err(invalid(TemplateError::UndeclaredTool {
                name: missing.to_string(),
            }));
        }

        Ok(FlowDefinition {
            name,
            system,
            input_schema,
            output_schema,
            template,
            tools,
        })
    }
}

/// A validated instance of a flow's input schema. Lives for one call.
#[derive(Debug)]
pub struct InvocationRequest<'f> {
    flow: &'f FlowDefinition,
    input: Value,
}

impl InvocationRequest<'_> {
    /// Renders the flow's prompt for this input, running any tool markers.
    pub async fn render_prompt(&self) -> Result<String, FlowError> {
        render(
            &self.flow.name,
            &self.flow.template,
            &self.input,
            &ToolDispatcher::new(&self.flow.tools),
        )
        .await
    }
}

/// Runs flows against a model backend. Holds no per-call state.
#[derive(Clone)]
pub struct FlowExecutor {
    model: Arc<dyn ModelBackend>,
}

impl FlowExecutor {
    pub fn new(model: Arc<dyn ModelBackend>) -> Self {
        Self { model }
    }

    /// Executes `flow` once. Never retries; any failure aborts the pipeline.
    #[instrument(skip_all, fields(flow = %flow.name))]
    pub async fn execute(&self, flow: &FlowDefinition, raw_input: Value) -> InvocationResult {
        let result = self.run_stages(flow, &raw_input).await;
        match &result {
            Ok(_) => info!("Flow {} succeeded", flow.name),
            Err(e) => warn!("Flow {} failed: {e}", flow.name),
        }
        result
    }

    async fn run_stages(&self, flow: &FlowDefinition, raw_input: &Value) -> InvocationResult {
        debug!("Validating input");
        let request = flow.prepare(raw_input)?;

        debug!("Rendering prompt ({} tools declared)", flow.tools.len());
        let prompt = request.render_prompt().await?;

        debug!("Invoking model with {} byte prompt", prompt.len());
        let response = self
            .model
            .generate(ModelRequest {
                flow: flow.name.clone(),
                prompt,
                system: flow.system.clone(),
                output_hint: flow.output_schema.shape_hint(),
            })
            .await?;

        debug!("Parsing model output");
        let value = response
            .into_value()
            .map_err(|e| FlowError::ModelOutput {
                flow: flow.name.clone(),
                reason: ModelOutputReason::Unparseable(e),
            })?;

        flow.output_schema
            .validate(&value)
            .map_err(|e| FlowError::ModelOutput {
                flow: flow.name.clone(),
                reason: ModelOutputReason::Invalid(e),
            })
    }
}

/// A flow with typed input and output on top of its JSON definition.
pub struct Flow<I, O> {
    definition: Arc<FlowDefinition>,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O> Clone for Flow<I, O> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            _types: PhantomData,
        }
    }
}

impl<I, O> Flow<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    pub fn new(definition: FlowDefinition) -> Self {
        Self {
            definition: Arc::new(definition),
            _types: PhantomData,
        }
    }

    pub fn definition(&self) -> &FlowDefinition {
        &self.definition
    }

    pub async fn run(&self, executor: &FlowExecutor, input: &I) -> Result<O, FlowError> {
        let raw = serde_json::to_value(input)?;
        self.run_value(executor, raw).await
    }

    /// Runs with untyped input, as received from an outer surface.
    pub async fn run_value(&self, executor: &FlowExecutor, raw_input: Value) -> Result<O, FlowError> {
        let output = executor.execute(&self.definition, raw_input).await?;
        Ok(serde_json::from_value(output)?)
    }
}
