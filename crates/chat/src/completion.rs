//! Completion gateway: one bounded call to the configured provider.
//!
//! Every call is wrapped in a timeout. A timeout is reported as
//! `ProviderError::Timeout` and handled like any other provider failure:
//! `reply` degrades to a fixed apology instead of failing the request.

use sitechat_config::AppConfig;
use sitechat_core::error::ProviderError;
use sitechat_core::memory::ConversationTurn;
use sitechat_core::message::Message;
use sitechat_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

const DEFAULT_APOLOGY: &str =
    "Sorry, I'm having trouble answering right now. Please try again in a moment.";

/// The text to send back to the user, and whether it is the apology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub text: String,
    pub degraded: bool,
}

/// Sends `[system, ...history, user]` to a provider with fixed settings.
pub struct CompletionGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    apology: String,
}

impl CompletionGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: Some(200),
            timeout: Duration::from_secs(30),
            apology: DEFAULT_APOLOGY.into(),
        }
    }

    /// Gateway settings taken from `[provider]`, `[chat]` and the model defaults.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_timeout(Duration::from_secs(config.provider.timeout_secs))
            .with_apology(&config.chat.apology)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_apology(mut self, apology: impl Into<String>) -> Self {
        self.apology = apology.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Messages in the order the provider sees them.
    pub fn build_messages(system_prompt: &str, history: &[ConversationTurn], user_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(history.iter().map(Message::from));
        messages.push(Message::user(user_message));
        messages
    }

    /// One provider call, bounded by the configured timeout.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system_prompt, history, user_message),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            history = history.len(),
            "Requesting completion"
        );

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(format!("no completion within {}s", self.timeout.as_secs_f32())))??;

        let text = response.message.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }

        Ok(text.to_string())
    }

    /// Like `complete`, but any failure becomes the apology.
    pub async fn reply(&self, system_prompt: &str, user_message: &str, history: &[ConversationTurn]) -> CompletionOutcome {
        match self.complete(system_prompt, user_message, history).await {
            Ok(text) => CompletionOutcome { text, degraded: false },
            Err(e) => {
                error!(provider = %self.provider.name(), error = %e, "Completion failed, replying with apology");
                CompletionOutcome {
                    text: self.apology.clone(),
                    degraded: true,
                }
            }
        }
    }
}
