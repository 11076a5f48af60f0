//! Shared test helpers for pipeline and completion tests.

use sitechat_core::error::ProviderError;
use sitechat_core::message::Message;
use sitechat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;
use std::time::Duration;

/// What a `ScriptedProvider` does on every call.
#[derive(Clone)]
pub enum Script {
    /// Answer with this text.
    Reply(String),
    /// Fail with this error.
    Fail(ProviderError),
    /// Sleep (in tokio time) before answering.
    Stall(Duration),
}

/// A mock provider that follows one script and records every request.
pub struct ScriptedProvider {
    script: Script,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(Script::Fail(error))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The system prompt of the most recent request.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.messages.first())
            .map(|m| m.content.clone())
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);

        match &self.script {
            Script::Reply(text) => Ok(make_text_response(text)),
            Script::Fail(error) => Err(error.clone()),
            Script::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(make_text_response("too late"))
            }
        }
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
