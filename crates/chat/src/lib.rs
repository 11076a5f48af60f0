//! The chat pipeline, from a user message to a grounded reply.
//!
//! 1. **Validate** the message and normalize the site
//! 2. **Short-circuit** bare greetings
//! 3. **Resolve** the site's knowledge
//! 4. **Compose** the system prompt
//! 5. **Complete** via the provider, with history from conversation memory
//! 6. **Remember** the exchange

pub mod completion;
pub mod composer;
pub mod greeting;
pub mod pipeline;

#[cfg(test)]
mod test_helpers;

pub use completion::{CompletionGateway, CompletionOutcome};
pub use composer::{KNOWLEDGE_MARKER, PromptComposer};
pub use greeting::{GREETING_REPLY, is_greeting};
pub use pipeline::{ChatOutcome, ChatPipeline, ChatRequest, PromptPreview};
