// Flow Engine: schema-validated prompt → model → schema-validated output.
// Every model call made by a flow goes through ModelBackend; llm_client provides
// the production implementation.

pub mod error;
pub mod executor;
pub mod model;
pub mod render;
pub mod schema;
pub mod template;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Boundary, FlowError, ModelOutputReason};
pub use executor::{Flow, FlowDefinition, FlowExecutor, InvocationRequest, InvocationResult};
pub use model::{ModelBackend, ModelRequest, ModelResponse};
pub use schema::{ObjectSchema, Schema, SchemaValidationError};
pub use template::{Template, TemplateError};
pub use tool::{FnTool, ToolDefinition, ToolDispatcher, ToolHandler};
