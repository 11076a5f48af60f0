//! System prompt composition.
//!
//! One template with three slots: the site label, the knowledge text and
//! the directives. The knowledge text is inserted verbatim.

use sitechat_core::{KnowledgeBlob, SiteId};

/// Marks the start of the knowledge section in a composed prompt.
pub const KNOWLEDGE_MARKER: &str = "KNOWLEDGE BASE:";

const DEFAULT_ASSISTANT_NAME: &str = "SiteChat";

const KNOWLEDGE_DIRECTIVES: &[&str] = &[
    "Answer using the knowledge base above.",
    "If the knowledge base does not state the answer directly but it can be safely inferred from what it does say, answer with that inference.",
    "Only use knowledge about {site}. Never mix in knowledge about other websites or businesses.",
    "If the question is not covered by the knowledge base at all, say so politely and offer a helpful general answer instead.",
    "Keep answers short and friendly.",
];

/// Builds the system prompt for one request.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    assistant_name: String,
}

impl PromptComposer {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
        }
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    /// Compose the system prompt for `knowledge`.
    ///
    /// Falls back to the generic template when nothing was resolved.
    pub fn compose(&self, knowledge: &KnowledgeBlob, site: Option<&SiteId>) -> String {
        if knowledge.is_none() {
            return self.generic(site);
        }

        let label = site_label(site);
        let directives: Vec<String> = KNOWLEDGE_DIRECTIVES
            .iter()
            .map(|d| format!("- {}", d.replace("{site}", &label)))
            .collect();

        format!(
            "You are {name}, the assistant for {label}.\n\n\
             {KNOWLEDGE_MARKER}\n{text}\n\n\
             Instructions:\n{directives}",
            name = self.assistant_name,
            text = knowledge.text,
            directives = directives.join("\n"),
        )
    }

    /// The prompt used when no knowledge is available.
    pub fn generic(&self, site: Option<&SiteId>) -> String {
        format!(
            "You are {name}, a friendly and helpful general assistant on {label}. \
             No custom knowledge has been provided, so answer from general knowledge. \
             Keep answers short, and say so when you are not sure.",
            name = self.assistant_name,
            label = site_label(site),
        )
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_ASSISTANT_NAME)
    }
}

fn site_label(site: Option<&SiteId>) -> String {
    site.map_or_else(|| "this website".to_string(), |s| s.to_string())
}
