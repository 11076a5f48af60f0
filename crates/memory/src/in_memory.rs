//! In-memory conversation store with bounded history per session.
//!
//! All mutations happen under one `tokio::sync::Mutex`, so concurrent
//! requests can neither lose turns nor interleave the two halves of an
//! exchange.

use async_trait::async_trait;
use sitechat_core::error::MemoryError;
use sitechat_core::memory::{ConversationStore, ConversationTurn};
use sitechat_core::message::SessionId;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tracing::debug;

/// Turns kept per session unless configured otherwise.
pub const DEFAULT_MAX_TURNS: usize = 5;

/// Live sessions kept unless configured otherwise.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct SessionBuffer {
    turns: VecDeque<ConversationTurn>,
    /// Logical clock value of the last write, for LRU eviction.
    touched: u64,
}

#[derive(Default)]
struct Sessions {
    buffers: HashMap<SessionId, SessionBuffer>,
    clock: u64,
}

/// Keeps the most recent `max_turns` turns of up to `max_sessions` sessions.
///
/// Eviction is per turn, not per exchange: with an odd `max_turns` the
/// oldest retained turn can be an answer whose question was already dropped.
pub struct InMemoryConversationStore {
    max_turns: usize,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl InMemoryConversationStore {
    /// Both limits are clamped to at least 1.
    pub fn new(max_turns: usize, max_sessions: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    /// Push turns into a session, creating it (and evicting the least
    /// recently written session at capacity) if needed.
    async fn push(&self, session: &SessionId, turns: impl IntoIterator<Item = ConversationTurn>) {
        let mut sessions = self.sessions.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if !sessions.buffers.contains_key(session) && sessions.buffers.len() >= self.max_sessions {
            if let Some(oldest) = sessions
                .buffers
                .iter()
                .min_by_key(|(_, b)| b.touched)
                .map(|(k, _)| k.clone())
            {
                debug!(session = %oldest, "Evicting least recently used session");
                sessions.buffers.remove(&oldest);
            }
        }

        let buffer = sessions
            .buffers
            .entry(session.clone())
            .or_insert_with(|| SessionBuffer {
                turns: VecDeque::with_capacity(self.max_turns + 1),
                touched: now,
            });
        buffer.touched = now;

        for turn in turns {
            buffer.turns.push_back(turn);
            while buffer.turns.len() > self.max_turns {
                buffer.turns.pop_front();
            }
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS, DEFAULT_MAX_SESSIONS)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, session: &SessionId, turn: ConversationTurn) -> Result<(), MemoryError> {
        self.push(session, [turn]).await;
        Ok(())
    }

    async fn append_exchange(
        &self,
        session: &SessionId,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<(), MemoryError> {
        self.push(session, [user, assistant]).await;
        Ok(())
    }

    async fn snapshot(&self, session: &SessionId) -> Result<Vec<ConversationTurn>, MemoryError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .buffers
            .get(session)
            .map(|b| b.turns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn len(&self, session: &SessionId) -> Result<usize, MemoryError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.buffers.get(session).map_or(0, |b| b.turns.len()))
    }

    async fn clear(&self, session: &SessionId) -> Result<(), MemoryError> {
        self.sessions.lock().await.buffers.remove(session);
        Ok(())
    }

    async fn session_count(&self) -> Result<usize, MemoryError> {
        Ok(self.sessions.lock().await.buffers.len())
    }
}
