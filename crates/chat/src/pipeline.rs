//! The end-to-end chat pipeline behind `POST /chat` and `sitechat ask`.

use crate::completion::CompletionGateway;
use crate::composer::PromptComposer;
use crate::greeting::{GREETING_REPLY, is_greeting};
use sitechat_config::AppConfig;
use sitechat_core::error::ValidationError;
use sitechat_core::knowledge::{KnowledgeBlob, KnowledgeSourceKind};
use sitechat_core::memory::{ConversationStore, ConversationTurn};
use sitechat_core::message::SessionId;
use sitechat_core::provider::Provider;
use sitechat_core::SiteId;
use sitechat_knowledge::KnowledgeResolver;
use sitechat_memory::{InMemoryConversationStore, NoopConversationStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Longest client-supplied session id that is honoured.
const MAX_SESSION_ID_LEN: usize = 128;

/// One incoming chat message.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    /// Raw, unnormalized site value
    pub site: Option<String>,
    /// Conversation to continue; a new one is started when absent
    pub session: Option<SessionId>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }
}

/// The pipeline's answer to one message.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    /// The reply is the apology for a failed completion
    pub is_error: bool,
    /// The conversation this exchange belongs to; `None` when memory is off
    pub session: Option<SessionId>,
    /// `None` when no knowledge was consulted (greetings)
    pub knowledge_source: Option<KnowledgeSourceKind>,
}

/// What a request for `site` would see, without calling the provider.
#[derive(Debug, Clone)]
pub struct PromptPreview {
    pub site: Option<SiteId>,
    pub knowledge: KnowledgeBlob,
    pub system_prompt: String,
}

pub struct ChatPipeline {
    resolver: KnowledgeResolver,
    composer: PromptComposer,
    completion: CompletionGateway,
    memory: Arc<dyn ConversationStore>,
    sessions_enabled: bool,
    greeting_shortcut: bool,
}

impl ChatPipeline {
    /// A pipeline without conversation memory.
    pub fn new(resolver: KnowledgeResolver, composer: PromptComposer, completion: CompletionGateway) -> Self {
        Self {
            resolver,
            composer,
            completion,
            memory: Arc::new(NoopConversationStore),
            sessions_enabled: false,
            greeting_shortcut: true,
        }
    }

    /// Build the whole pipeline from configuration around `provider`.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> sitechat_core::Result<Self> {
        let resolver = sitechat_knowledge::build_from_config(&config.knowledge)?;
        let composer = PromptComposer::new(&config.chat.assistant_name);
        let completion = CompletionGateway::from_config(provider, config);

        let mut pipeline =
            Self::new(resolver, composer, completion).with_greeting_shortcut(config.chat.greeting_shortcut);

        if config.memory.enabled {
            pipeline = pipeline.with_memory(Arc::new(InMemoryConversationStore::new(
                config.memory.max_turns,
                config.memory.max_sessions,
            )));
        }

        info!(
            provider = %pipeline.completion.provider_name(),
            model = %pipeline.completion.model(),
            memory = %pipeline.memory.name(),
            "Chat pipeline ready"
        );
        Ok(pipeline)
    }

    /// Remember conversations in `store` and issue session ids.
    pub fn with_memory(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.memory = store;
        self.sessions_enabled = true;
        self
    }

    pub fn with_greeting_shortcut(mut self, enabled: bool) -> Self {
        self.greeting_shortcut = enabled;
        self
    }

    pub fn memory(&self) -> &Arc<dyn ConversationStore> {
        &self.memory
    }

    /// Answer one message.
    ///
    /// Only an empty message is an error; provider failures come back as
    /// an apology with `is_error` set.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatOutcome, ValidationError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        let site = normalize_site(request.site.as_deref());
        let session = self.session_for(request.session);

        if self.greeting_shortcut && is_greeting(message) {
            info!(site = %site_label(site.as_ref()), "Greeting answered locally");
            self.remember(session.as_ref(), message, GREETING_REPLY).await;
            return Ok(ChatOutcome {
                reply: GREETING_REPLY.to_string(),
                is_error: false,
                session,
                knowledge_source: None,
            });
        }

        let knowledge = self.resolver.resolve(site.as_ref()).await;
        let system_prompt = self.composer.compose(&knowledge, site.as_ref());
        let history = self.history(session.as_ref()).await;

        let outcome = self.completion.reply(&system_prompt, message, &history).await;

        info!(
            site = %site_label(site.as_ref()),
            source = %knowledge.source,
            history = history.len(),
            degraded = outcome.degraded,
            "Chat message answered"
        );

        if !outcome.degraded {
            self.remember(session.as_ref(), message, &outcome.text).await;
        }

        Ok(ChatOutcome {
            reply: outcome.text,
            is_error: outcome.degraded,
            session,
            knowledge_source: Some(knowledge.source),
        })
    }

    /// Resolve and compose for `site` without calling the provider.
    pub async fn preview(&self, site: Option<&str>) -> PromptPreview {
        let site = normalize_site(site);
        let knowledge = self.resolver.resolve(site.as_ref()).await;
        let system_prompt = self.composer.compose(&knowledge, site.as_ref());
        PromptPreview {
            site,
            knowledge,
            system_prompt,
        }
    }

    fn session_for(&self, requested: Option<SessionId>) -> Option<SessionId> {
        if !self.sessions_enabled {
            return None;
        }
        match requested {
            Some(id) if !id.as_str().trim().is_empty() && id.as_str().len() <= MAX_SESSION_ID_LEN => Some(id),
            _ => Some(SessionId::new()),
        }
    }

    async fn history(&self, session: Option<&SessionId>) -> Vec<ConversationTurn> {
        let Some(session) = session else {
            return Vec::new();
        };
        match self.memory.snapshot(session).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(session = %session, error = %e, "Memory snapshot failed, continuing without history");
                Vec::new()
            }
        }
    }

    async fn remember(&self, session: Option<&SessionId>, user: &str, assistant: &str) {
        let Some(session) = session else {
            return;
        };
        if let Err(e) = self
            .memory
            .append_exchange(session, ConversationTurn::user(user), ConversationTurn::assistant(assistant))
            .await
        {
            warn!(session = %session, error = %e, "Failed to record exchange");
        }
    }
}

/// Invalid sites are logged and treated as no site.
fn normalize_site(raw: Option<&str>) -> Option<SiteId> {
    match SiteId::parse_optional(raw) {
        Ok(site) => site,
        Err(e) => {
            warn!(error = %e, "Ignoring invalid site");
            None
        }
    }
}

fn site_label(site: Option<&SiteId>) -> &str {
    site.map(SiteId::as_str).unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::KNOWLEDGE_MARKER;
    use crate::test_helpers::ScriptedProvider;
    use sitechat_core::error::ProviderError;
    use sitechat_core::memory::TurnRole;
    use sitechat_knowledge::{LocalDefaultSource, LocalSiteSource};

    fn pipeline(provider: Arc<ScriptedProvider>, resolver: KnowledgeResolver) -> ChatPipeline {
        ChatPipeline::new(
            resolver,
            PromptComposer::default(),
            CompletionGateway::new(provider, "mock-model"),
        )
        .with_memory(Arc::new(InMemoryConversationStore::default()))
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_provider_call() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let p = pipeline(provider.clone(), KnowledgeResolver::new());

        for msg in ["", "   ", "\n\t"] {
            let err = p.handle(ChatRequest::new(msg)).await.unwrap_err();
            assert_eq!(err, ValidationError::EmptyMessage);
        }
        assert_eq!(provider.call_count(), 0);
        assert_eq!(p.memory().session_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn greeting_short_circuits() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let p = pipeline(provider.clone(), KnowledgeResolver::new());

        let outcome = p
            .handle(ChatRequest::new("hi").with_site("example.com"))
            .await
            .unwrap();

        assert_eq!(outcome.reply, "Hey there! How can I help you today?");
        assert!(!outcome.is_error);
        assert!(outcome.knowledge_source.is_none());
        assert_eq!(provider.call_count(), 0);

        let session = outcome.session.unwrap();
        assert_eq!(p.memory().len(&session).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn greeting_shortcut_can_be_disabled() {
        let provider = Arc::new(ScriptedProvider::replying("Hello! Ask me anything."));
        let p = pipeline(provider.clone(), KnowledgeResolver::new()).with_greeting_shortcut(false);

        let outcome = p.handle(ChatRequest::new("hello")).await.unwrap();
        assert_eq!(outcome.reply, "Hello! Ask me anything.");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn site_knowledge_reaches_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("knowledge_example.com.txt"), "We sell green tea.").unwrap();
        std::fs::write(dir.path().join("knowledge.txt"), "Default facts.").unwrap();

        let resolver = KnowledgeResolver::new()
            .with_source(Arc::new(LocalSiteSource::new(dir.path())))
            .with_source(Arc::new(LocalDefaultSource::new(dir.path().join("knowledge.txt"))));
        let provider = Arc::new(ScriptedProvider::replying("Green tea."));
        let p = pipeline(provider.clone(), resolver);

        let outcome = p
            .handle(ChatRequest::new("What do you sell?").with_site("  Example.COM "))
            .await
            .unwrap();

        assert_eq!(outcome.reply, "Green tea.");
        assert_eq!(outcome.knowledge_source, Some(KnowledgeSourceKind::LocalPerSite));

        let prompt = provider.last_system_prompt().unwrap();
        assert!(prompt.contains(KNOWLEDGE_MARKER));
        assert!(prompt.contains("We sell green tea."));
        assert!(!prompt.contains("Default facts."));
    }

    #[tokio::test]
    async fn invalid_site_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("knowledge.txt"), "Default facts.").unwrap();

        let resolver = KnowledgeResolver::new()
            .with_source(Arc::new(LocalSiteSource::new(dir.path())))
            .with_source(Arc::new(LocalDefaultSource::new(dir.path().join("knowledge.txt"))));
        let provider = Arc::new(ScriptedProvider::replying("ok"));
        let p = pipeline(provider.clone(), resolver);

        let outcome = p
            .handle(ChatRequest::new("question").with_site("../../etc/passwd"))
            .await
            .unwrap();
        assert_eq!(outcome.knowledge_source, Some(KnowledgeSourceKind::LocalDefault));
    }

    #[tokio::test]
    async fn no_knowledge_uses_generic_prompt() {
        let provider = Arc::new(ScriptedProvider::replying("General answer."));
        let p = pipeline(provider.clone(), KnowledgeResolver::new());

        let outcome = p
            .handle(ChatRequest::new("What is Rust?").with_site("example.com"))
            .await
            .unwrap();
        assert_eq!(outcome.knowledge_source, Some(KnowledgeSourceKind::None));

        let prompt = provider.last_system_prompt().unwrap();
        let site = SiteId::parse("example.com").unwrap();
        assert_eq!(prompt, PromptComposer::default().generic(Some(&site)));
        assert!(!prompt.contains(KNOWLEDGE_MARKER));
    }

    #[tokio::test]
    async fn history_is_sent_and_bounded() {
        let provider = Arc::new(ScriptedProvider::replying("answer"));
        let p = pipeline(provider.clone(), KnowledgeResolver::new());
        let session = SessionId::from("conversation-1");

        for i in 0..4 {
            let outcome = p
                .handle(ChatRequest::new(format!("question {i}")).with_session(session.clone()))
                .await
                .unwrap();
            assert_eq!(outcome.session.as_ref(), Some(&session));
        }

        // system + 5 remembered turns + the new user message
        let last = provider.requests().pop().unwrap();
        assert_eq!(last.messages.len(), 7);
        assert_eq!(last.messages[6].content, "question 3");

        let turns = p.memory().snapshot(&session).await.unwrap();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns.last().unwrap().role, TurnRole::Assistant);
    }

    #[tokio::test]
    async fn provider_failure_is_apology_and_not_remembered() {
        let provider = Arc::new(ScriptedProvider::failing(ProviderError::ApiError {
            status_code: 500,
            message: "internal".into(),
        }));
        let p = pipeline(provider.clone(), KnowledgeResolver::new());

        let outcome = p.handle(ChatRequest::new("Are you there?")).await.unwrap();
        assert!(outcome.is_error);
        assert!(!outcome.reply.is_empty());
        assert!(!outcome.reply.contains("internal"));

        let session = outcome.session.unwrap();
        assert_eq!(p.memory().len(&session).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sessions_are_issued_only_with_memory() {
        let provider = Arc::new(ScriptedProvider::replying("answer"));
        let without = ChatPipeline::new(
            KnowledgeResolver::new(),
            PromptComposer::default(),
            CompletionGateway::new(provider.clone(), "m"),
        );
        let outcome = without
            .handle(ChatRequest::new("question").with_session(SessionId::from("ignored")))
            .await
            .unwrap();
        assert!(outcome.session.is_none());

        let with = pipeline(provider, KnowledgeResolver::new());
        let outcome = with.handle(ChatRequest::new("question")).await.unwrap();
        assert!(outcome.session.is_some());

        let oversized = SessionId("x".repeat(MAX_SESSION_ID_LEN + 1));
        let outcome = with
            .handle(ChatRequest::new("question").with_session(oversized.clone()))
            .await
            .unwrap();
        assert_ne!(outcome.session, Some(oversized));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_messages_on_one_session_stay_bounded() {
        let provider = Arc::new(ScriptedProvider::replying("answer"));
        let p = Arc::new(pipeline(provider, KnowledgeResolver::new()));
        let session = SessionId::from("shared");

        let tasks = (0..50).map(|i| {
            let p = p.clone();
            let session = session.clone();
            tokio::spawn(async move {
                p.handle(ChatRequest::new(format!("question {i}")).with_session(session))
                    .await
                    .unwrap()
            })
        });
        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap().reply, "answer");
        }

        let turns = p.memory().snapshot(&session).await.unwrap();
        assert!(turns.len() <= 5);
        for turn in &turns {
            match turn.role {
                TurnRole::User => assert!(turn.content.starts_with("question ")),
                TurnRole::Assistant => assert_eq!(turn.content, "answer"),
            }
        }
    }

    #[tokio::test]
    async fn preview_does_not_call_provider() {
        let provider = Arc::new(ScriptedProvider::replying("unused"));
        let p = pipeline(provider.clone(), KnowledgeResolver::new());

        let preview = p.preview(Some("https://Example.com/")).await;
        assert_eq!(preview.site.as_ref().map(SiteId::as_str), Some("example.com"));
        assert!(preview.knowledge.is_none());
        assert!(!preview.system_prompt.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn from_config_respects_memory_switch() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::replying("x"));

        let config = AppConfig::default();
        let p = ChatPipeline::from_config(&config, provider.clone()).unwrap();
        assert_eq!(p.memory().name(), "in_memory");

        let mut config = AppConfig::default();
        config.memory.enabled = false;
        let p = ChatPipeline::from_config(&config, provider).unwrap();
        assert_eq!(p.memory().name(), "none");
    }
}
