use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::flow::FlowError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Flow(e) => flow_error_parts(e),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Callers only learn that output could not be generated; no partial result is ever returned.
fn flow_error_parts(e: &FlowError) -> (StatusCode, &'static str, String) {
    match e {
        _ if e.is_invalid_input() => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
        FlowError::ModelOutput { .. } => {
            tracing::warn!("Model output rejected: {e}");
            (
                StatusCode::BAD_GATEWAY,
                "MODEL_OUTPUT_ERROR",
                "The AI model returned an unusable response".to_string(),
            )
        }
        FlowError::Backend(inner) => {
            tracing::error!("LLM error: {inner}");
            (
                StatusCode::BAD_GATEWAY,
                "LLM_ERROR",
                "An AI processing error occurred".to_string(),
            )
        }
        _ => {
            tracing::error!("Flow error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "FLOW_ERROR",
                "Could not generate output for this request".to_string(),
            )
        }
    }
}
