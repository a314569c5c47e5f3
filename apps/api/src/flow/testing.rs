//! Scripted model double shared by flow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::flow::model::{ModelBackend, ModelRequest, ModelResponse};
use crate::llm_client::LlmError;

enum Scripted {
    Respond(ModelResponse),
    Fail { status: u16, message: String },
}

/// Replays scripted responses in order and records every request it receives.
#[derive(Default)]
pub struct StubModel {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl StubModel {
    pub fn structured(value: Value) -> Self {
        Self::default().then(Scripted::Respond(ModelResponse::Structured(value)))
    }

    pub fn text(text: &str) -> Self {
        Self::default().then(Scripted::Respond(ModelResponse::Text(text.to_string())))
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self::default().then(Scripted::Fail {
            status,
            message: message.to_string(),
        })
    }

    fn then(self, step: Scripted) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelBackend for StubModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail { status, message }) => Err(LlmError::Api { status, message }),
            None => Err(LlmError::EmptyContent),
        }
    }
}
