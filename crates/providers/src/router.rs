//! Provider selection from configuration.

use crate::openai_compat::OpenAiCompatProvider;
use sitechat_config::AppConfig;
use sitechat_core::error::ProviderError;
use sitechat_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the configured provider.
///
/// Every supported backend speaks the OpenAI wire format; only the base
/// URL and key differ. `provider.api_url` overrides the well-known URL.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let timeout = Duration::from_secs(config.provider.timeout_secs);

    let base_url = config
        .provider
        .api_url
        .clone()
        .or_else(|| default_base_url(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}'; set provider.api_url to use a custom endpoint"
            ))
        })?;

    let api_key = match config.effective_api_key() {
        Some(key) => key.to_string(),
        // Keyless local servers ignore the bearer token.
        None if !config.provider_requires_key() => name.to_string(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "provider '{name}' requires an API key"
            )));
        }
    };

    info!(provider = %name, base_url = %base_url, model = %config.default_model, "Provider configured");

    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key, timeout)?))
}

/// The base URL of a well-known OpenAI-compatible provider.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "fireworks" => Some("https://api.fireworks.ai/inference/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}
