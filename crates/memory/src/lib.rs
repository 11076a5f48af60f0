//! Conversation memory implementations for SiteChat.

pub mod in_memory;
pub mod noop;

pub use in_memory::{DEFAULT_MAX_SESSIONS, DEFAULT_MAX_TURNS, InMemoryConversationStore};
pub use noop::NoopConversationStore;
