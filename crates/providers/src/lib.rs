//! LLM provider implementations for SiteChat.
//!
//! All providers implement the `sitechat_core::Provider` trait.
//! `build_from_config` picks the backend named in configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, default_base_url};
