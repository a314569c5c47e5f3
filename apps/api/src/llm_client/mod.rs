//! LLM Client — the production model backend for every flow.
//!
//! ARCHITECTURAL RULE: flows never call the Anthropic API directly.
//! They go through `ModelBackend`, which this client implements.
//!
//! Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::flow::model::{ModelBackend, ModelRequest, ModelResponse};

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all flows.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
/// Upper bound for `with_max_retries`; keeps the backoff delay well within range.
const RETRY_CAP: u32 = 8;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with transport-level retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: MAX_RETRIES,
        })
    }

    /// Points the client at a different API host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.clamp(1, RETRY_CAP);
        self
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };
        let url = format!("{}{}", self.base_url, MESSAGES_PATH);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

#[async_trait]
impl ModelBackend for LlmClient {
    /// Sends the rendered prompt with a JSON-only system instruction built from
    /// the output-shape hint. The reply text is returned unparsed; the executor
    /// owns parsing and validation.
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, LlmError> {
        let system = prompts::structured_output_system(&request.system, &request.output_hint);
        debug!("Calling {} for flow {}", MODEL, request.flow);
        let response = self.call(&request.prompt, &system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(ModelResponse::Text(text.to_string()))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn message_body(text: &str) -> String {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
            "model": MODEL,
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 12, "output_tokens": 8 }
        })
        .to_string()
    }

    fn request() -> ModelRequest {
        ModelRequest {
            flow: "generateCoverLetter".to_string(),
            prompt: "Write a cover letter".to_string(),
            system: "You are a career coach.".to_string(),
            output_hint: json!({ "type": "object", "required": ["coverLetter"] }),
        }
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_schema_hint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "model": MODEL,
                    "messages": [{ "role": "user", "content": "Write a cover letter" }]
                })),
                Matcher::Regex("coverLetter".to_string()),
                Matcher::Regex("You are a career coach.".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(message_body("{\"coverLetter\": \"Dear team\"}"))
            .create_async()
            .await;

        let client = LlmClient::new("test-key".to_string())
            .unwrap()
            .with_base_url(&server.url());
        let response = client.generate(request()).await.unwrap();

        assert_eq!(
            response,
            ModelResponse::Text("{\"coverLetter\": \"Dear team\"}".to_string())
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried_and_message_is_extracted() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body(r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens too large"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new("k".to_string())
            .unwrap()
            .with_base_url(&server.url());
        let err = client.call("p", "s").await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "max_tokens too large");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_surfaces_after_retry_budget() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(503)
            .with_body("unavailable")
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new("k".to_string())
            .unwrap()
            .with_base_url(&server.url())
            .with_max_retries(1);
        let err = client.call("p", "s").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        mock.assert_async().await;
    }

    #[test]
    fn test_max_retries_is_clamped() {
        let client = LlmClient::new("k".to_string()).unwrap();
        assert_eq!(client.clone().with_max_retries(0).max_retries, 1);
        assert_eq!(client.with_max_retries(u32::MAX).max_retries, RETRY_CAP);
    }

    #[tokio::test]
    async fn test_response_without_text_block_is_empty_content() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                json!({ "content": [], "usage": { "input_tokens": 1, "output_tokens": 0 } })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = LlmClient::new("k".to_string())
            .unwrap()
            .with_base_url(&server.url());
        let err = client.generate(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
