//! Bare greetings are answered locally, without knowledge or a provider call.

/// The fixed reply to a bare greeting.
pub const GREETING_REPLY: &str = "Hey there! How can I help you today?";

const GREETINGS: &[&str] = &["hi", "hello", "hey", "hi there", "hello there", "hey there"];

/// Whether `message` is nothing but a greeting.
///
/// Case-insensitive; surrounding whitespace and trailing `!`, `.`, `?` are
/// ignored.
pub fn is_greeting(message: &str) -> bool {
    let normalized = message
        .trim()
        .trim_end_matches(['!', '.', '?'])
        .trim_end()
        .to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}
