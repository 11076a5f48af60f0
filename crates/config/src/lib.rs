//! Configuration loading, validation, and management for SiteChat.
//!
//! Loads configuration from `~/.sitechat/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.sitechat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key. Required to serve traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name ("openai", "openrouter", "ollama", ...)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model identifier sent with every completion
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Response-length cap per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider endpoint settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Knowledge resolution configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Prompt and reply behaviour
    #[serde(default)]
    pub chat: ChatConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    200
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("provider", &self.provider)
            .field("gateway", &self.gateway)
            .field("knowledge", &self.knowledge)
            .field("memory", &self.memory)
            .field("chat", &self.chat)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Override the provider's base URL (e.g. a proxy or local server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Upper bound on a single completion call
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    30
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Maximum accepted request body
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// One entry of the knowledge preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSourceSetting {
    /// `remote_url_template` with `{site}` substituted
    RemoteSite,
    /// `{dir}/knowledge_{site}.txt`
    LocalSite,
    /// `{bucket_url}/knowledge_{site}.txt`
    ObjectStore,
    /// `{dir}/{default_file}`
    LocalDefault,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory holding local knowledge files
    #[serde(default = "default_knowledge_dir")]
    pub dir: PathBuf,

    /// Global default knowledge file, relative to `dir`
    #[serde(default = "default_knowledge_file")]
    pub default_file: String,

    /// Backends to consult, highest preference first
    #[serde(default = "default_sources")]
    pub sources: Vec<KnowledgeSourceSetting>,

    /// URL of a site's own knowledge document
    #[serde(default = "default_remote_url_template")]
    pub remote_url_template: String,

    /// Base URL of the object-storage bucket; the backend is skipped when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_url: Option<String>,

    /// Timeout for every remote knowledge fetch
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Largest remote knowledge document accepted; bigger ones count as a failed fetch
    #[serde(default = "default_knowledge_max_bytes")]
    pub max_bytes: usize,
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from("knowledge")
}
fn default_knowledge_file() -> String {
    "knowledge.txt".into()
}
fn default_sources() -> Vec<KnowledgeSourceSetting> {
    vec![
        KnowledgeSourceSetting::RemoteSite,
        KnowledgeSourceSetting::LocalSite,
        KnowledgeSourceSetting::ObjectStore,
        KnowledgeSourceSetting::LocalDefault,
    ]
}
fn default_remote_url_template() -> String {
    "https://{site}/knowledge.txt".into()
}
fn default_fetch_timeout() -> u64 {
    5
}
fn default_knowledge_max_bytes() -> usize {
    1024 * 1024
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: default_knowledge_dir(),
            default_file: default_knowledge_file(),
            sources: default_sources(),
            remote_url_template: default_remote_url_template(),
            bucket_url: None,
            fetch_timeout_secs: default_fetch_timeout(),
            max_bytes: default_knowledge_max_bytes(),
        }
    }
}

impl KnowledgeConfig {
    /// Full path of the global default knowledge file.
    pub fn default_file_path(&self) -> PathBuf {
        self.dir.join(&self.default_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Turns retained per session
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Live sessions before the least recently used one is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_turns() -> usize {
    5
}
fn default_max_sessions() -> usize {
    1000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_turns: default_max_turns(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Persona name used in the system prompt
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Answer bare greetings locally without a provider call
    #[serde(default = "default_true")]
    pub greeting_shortcut: bool,

    /// Reply sent when the provider fails or times out
    #[serde(default = "default_apology")]
    pub apology: String,
}

fn default_assistant_name() -> String {
    "SiteChat".into()
}
fn default_apology() -> String {
    "Sorry, I'm having trouble answering right now. Please try again in a moment.".into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            greeting_shortcut: true,
            apology: default_apology(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path, or `~/.sitechat/config.toml`, and apply
    /// the process environment.
    ///
    /// Environment variables override the file:
    /// - `SITECHAT_API_KEY`, then `OPENAI_API_KEY`
    /// - `SITECHAT_PROVIDER`, `SITECHAT_MODEL`
    /// - `SITECHAT_KNOWLEDGE_DIR`, `SITECHAT_BUCKET_URL`
    /// - `SITECHAT_HOST`, `SITECHAT_PORT`
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("SITECHAT_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(provider) = non_empty("SITECHAT_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = non_empty("SITECHAT_MODEL") {
            self.default_model = model;
        }
        if let Some(dir) = non_empty("SITECHAT_KNOWLEDGE_DIR") {
            self.knowledge.dir = PathBuf::from(dir);
        }
        if let Some(bucket) = non_empty("SITECHAT_BUCKET_URL") {
            self.knowledge.bucket_url = Some(bucket);
        }
        if let Some(host) = non_empty("SITECHAT_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = non_empty("SITECHAT_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("SITECHAT_PORT is not a valid port: {port}"))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sitechat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.default_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "default_max_tokens must be > 0".into(),
            ));
        }

        if self.provider.timeout_secs == 0 || self.knowledge.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".into(),
            ));
        }

        if self.knowledge.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.max_bytes must be > 0".into(),
            ));
        }

        if self.memory.max_turns == 0 || self.memory.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_turns and memory.max_sessions must be > 0".into(),
            ));
        }

        if !self.knowledge.remote_url_template.contains("{site}") {
            return Err(ConfigError::ValidationError(
                "knowledge.remote_url_template must contain a {site} placeholder".into(),
            ));
        }

        for (i, source) in self.knowledge.sources.iter().enumerate() {
            if self.knowledge.sources[..i].contains(source) {
                return Err(ConfigError::ValidationError(format!(
                    "knowledge source {source:?} is listed more than once"
                )));
            }
        }

        Ok(())
    }

    /// The configured API key, ignoring blank values.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Whether the selected provider refuses requests without a key.
    /// A local Ollama server does not.
    pub fn provider_requires_key(&self) -> bool {
        !KEYLESS_PROVIDERS.contains(&self.default_provider.as_str())
    }

    /// The startup check: fails when the provider needs a key and none is set.
    pub fn require_api_key(&self) -> Result<(), ConfigError> {
        if self.provider_requires_key() && self.effective_api_key().is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// Render the configuration as TOML with the API key redacted.
    pub fn to_redacted_toml(&self) -> String {
        let mut shown = self.clone();
        if shown.api_key.is_some() {
            shown.api_key = Some("[REDACTED]".into());
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            provider: ProviderSettings::default(),
            gateway: GatewayConfig::default(),
            knowledge: KnowledgeConfig::default(),
            memory: MemoryConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Providers that run without an API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama"];

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No provider API key configured; set SITECHAT_API_KEY (or OPENAI_API_KEY) or api_key in config.toml")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_max_tokens, 200);
        assert_eq!(config.memory.max_turns, 5);
        assert_eq!(config.knowledge.fetch_timeout_secs, 5);
    }

    #[test]
    fn default_source_order() {
        let config = AppConfig::default();
        assert_eq!(
            config.knowledge.sources,
            vec![
                KnowledgeSourceSetting::RemoteSite,
                KnowledgeSourceSetting::LocalSite,
                KnowledgeSourceSetting::ObjectStore,
                KnowledgeSourceSetting::LocalDefault,
            ]
        );
        assert_eq!(config.knowledge.remote_url_template, "https://{site}/knowledge.txt");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.knowledge.sources, config.knowledge.sources);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_memory_capacity_rejected() {
        let mut config = AppConfig::default();
        config.memory.max_turns = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_sources_rejected() {
        let mut config = AppConfig::default();
        config.knowledge.sources = vec![
            KnowledgeSourceSetting::LocalSite,
            KnowledgeSourceSetting::LocalSite,
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn template_without_placeholder_rejected() {
        let mut config = AppConfig::default();
        config.knowledge.remote_url_template = "https://example.com/knowledge.txt".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_provider, "openai");
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o"

[knowledge]
dir = "/srv/knowledge"
sources = ["local_site", "local_default"]

[memory]
max_turns = 8
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.knowledge.dir, PathBuf::from("/srv/knowledge"));
        assert_eq!(config.knowledge.sources.len(), 2);
        assert_eq!(config.memory.max_turns, 8);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let config = AppConfig::default();
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));

        let blank = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(blank.effective_api_key().is_none());
        assert!(blank.require_api_key().is_err());
    }

    #[test]
    fn ollama_starts_without_api_key() {
        let config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        assert!(!config.provider_requires_key());
        assert!(config.require_api_key().is_ok());
        assert!(config.effective_api_key().is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("OPENAI_API_KEY", "sk-openai"),
                ("SITECHAT_MODEL", "gpt-4o"),
                ("SITECHAT_KNOWLEDGE_DIR", "/data/kb"),
                ("SITECHAT_BUCKET_URL", "https://bucket.example.com"),
                ("SITECHAT_PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.effective_api_key(), Some("sk-openai"));
        assert!(config.require_api_key().is_ok());
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.knowledge.dir, PathBuf::from("/data/kb"));
        assert_eq!(config.knowledge.bucket_url.as_deref(), Some("https://bucket.example.com"));
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn sitechat_key_wins_over_openai_key() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("SITECHAT_API_KEY", "sk-sitechat"),
                ("OPENAI_API_KEY", "sk-openai"),
            ]))
            .unwrap();
        assert_eq!(config.effective_api_key(), Some("sk-sitechat"));
    }

    #[test]
    fn invalid_port_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(env(&[("SITECHAT_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn debug_and_toml_redact_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        assert!(!format!("{config:?}").contains("sk-secret"));
        let rendered = config.to_redacted_toml();
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn knowledge_size_limit_defaults_and_validates() {
        let config = AppConfig::default();
        assert_eq!(config.knowledge.max_bytes, 1024 * 1024);

        let mut zero = AppConfig::default();
        zero.knowledge.max_bytes = 0;
        assert!(matches!(zero.validate(), Err(ConfigError::ValidationError(_))));

        let rendered = config.to_redacted_toml();
        assert!(rendered.contains("max_bytes = 1048576"));
    }
}
