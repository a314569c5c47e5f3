//! Language-model backend seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{strip_json_fences, LlmError};

/// What the executor hands to the model for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Name of the flow being executed, for logging in the backend.
    pub flow: String,
    pub prompt: String,
    /// Flow-specific system instruction. May be empty.
    pub system: String,
    /// Shape the response should take, rendered from the flow's output schema.
    pub output_hint: Value,
}

/// A backend may return structured data directly, or raw text to be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Structured(Value),
    Text(String),
}

impl ModelResponse {
    /// Normalizes the response into a JSON value ready for validation.
    /// Text is stripped of Markdown code fences before parsing.
    pub fn into_value(self) -> Result<Value, String> {
        match self {
            ModelResponse::Structured(value) => Ok(value),
            ModelResponse::Text(text) => {
                serde_json::from_str(strip_json_fences(&text)).map_err(|e| e.to_string())
            }
        }
    }
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, LlmError>;
}
