//! No-op conversation store. Disables conversation memory entirely.

use async_trait::async_trait;
use sitechat_core::error::MemoryError;
use sitechat_core::memory::{ConversationStore, ConversationTurn};
use sitechat_core::message::SessionId;

/// A store that remembers nothing; every request is single-turn.
pub struct NoopConversationStore;

#[async_trait]
impl ConversationStore for NoopConversationStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn append(&self, _session: &SessionId, _turn: ConversationTurn) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn append_exchange(
        &self,
        _session: &SessionId,
        _user: ConversationTurn,
        _assistant: ConversationTurn,
    ) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn snapshot(&self, _session: &SessionId) -> Result<Vec<ConversationTurn>, MemoryError> {
        Ok(Vec::new())
    }

    async fn len(&self, _session: &SessionId) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn clear(&self, _session: &SessionId) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn session_count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }
}
