//! # SiteChat Core
//!
//! Domain types, traits, and error definitions for the SiteChat knowledge
//! chatbot. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates:
//! - [`Provider`] — the hosted completion API (`sitechat-providers`)
//! - [`KnowledgeSource`] — one backend of the knowledge resolver (`sitechat-knowledge`)
//! - [`ConversationStore`] — bounded per-session memory (`sitechat-memory`)

pub mod error;
pub mod knowledge;
pub mod memory;
pub mod message;
pub mod provider;
pub mod site;

// Re-export key types at crate root for ergonomics
pub use error::{Error, KnowledgeError, MemoryError, ProviderError, Result, ValidationError};
pub use knowledge::{KnowledgeBlob, KnowledgeSource, KnowledgeSourceKind};
pub use memory::{ConversationStore, ConversationTurn, TurnRole};
pub use message::{Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use site::SiteId;
