//! Memory trait for bounded, per-session conversation history.
//!
//! Each session keeps only its most recent turns. Turns are evicted oldest
//! first once a session exceeds its capacity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::message::{Message, SessionId};

/// Who produced a remembered turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One user or assistant message kept in conversation memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&ConversationTurn> for Message {
    fn from(turn: &ConversationTurn) -> Self {
        match turn.role {
            TurnRole::User => Message::user(turn.content.clone()),
            TurnRole::Assistant => Message::assistant(turn.content.clone()),
        }
    }
}

/// The core ConversationStore trait.
///
/// Implementations: in-memory bounded store, none (no-op).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    /// Append one turn, evicting the oldest turns past capacity.
    async fn append(&self, session: &SessionId, turn: ConversationTurn) -> Result<(), MemoryError>;

    /// Append a user turn and its reply as one atomic step.
    async fn append_exchange(
        &self,
        session: &SessionId,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<(), MemoryError>;

    /// The retained turns of a session, oldest first.
    async fn snapshot(&self, session: &SessionId) -> Result<Vec<ConversationTurn>, MemoryError>;

    /// Number of retained turns in a session.
    async fn len(&self, session: &SessionId) -> Result<usize, MemoryError>;

    /// Forget a session entirely.
    async fn clear(&self, session: &SessionId) -> Result<(), MemoryError>;

    /// Number of live sessions.
    async fn session_count(&self) -> Result<usize, MemoryError>;
}
