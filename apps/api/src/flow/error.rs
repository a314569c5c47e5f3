use std::fmt;

use thiserror::Error;

use crate::flow::schema::SchemaValidationError;
use crate::flow::template::TemplateError;
use crate::llm_client::LlmError;

/// The boundary at which a schema check failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    FlowInput { flow: String },
    ToolInput { tool: String },
    ToolOutput { tool: String },
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::FlowInput { flow } => write!(f, "input of flow '{flow}'"),
            Boundary::ToolInput { tool } => write!(f, "input of tool '{tool}'"),
            Boundary::ToolOutput { tool } => write!(f, "output of tool '{tool}'"),
        }
    }
}

/// Why a model response was rejected.
#[derive(Debug, Error)]
pub enum ModelOutputReason {
    #[error("response is not valid JSON: {0}")]
    Unparseable(String),

    #[error("response does not match the output schema: {0}")]
    Invalid(#[source] SchemaValidationError),
}

/// Every way a flow definition or invocation can fail.
/// No stage swallows errors; each variant aborts the pipeline.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid {boundary}: {source}")]
    SchemaValidation {
        boundary: Boundary,
        #[source]
        source: SchemaValidationError,
    },

    #[error("tool '{name}' is not declared by this flow")]
    ToolNotFound { name: String },

    #[error("model output for flow '{flow}' was rejected: {reason}")]
    ModelOutput {
        flow: String,
        #[source]
        reason: ModelOutputReason,
    },

    #[error("tool '{tool}' failed: {source:#}")]
    ToolExecution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid flow definition '{flow}': {source}")]
    Template {
        flow: String,
        #[source]
        source: TemplateError,
    },

    #[error("model backend failed: {0}")]
    Backend(#[from] LlmError),

    #[error("typed conversion failed: {0}")]
    Codec(#[from] serde_json::Error),
}

impl FlowError {
    /// True when the caller's input was rejected before any tool or model call.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            FlowError::SchemaValidation {
                boundary: Boundary::FlowInput { .. },
                ..
            }
        )
    }
}
