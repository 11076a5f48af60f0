//! Knowledge trait: one backend the resolver can consult for a site's
//! knowledge text.
//!
//! Implementations: remote site fetch, local per-site file, object store,
//! local default file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KnowledgeError;
use crate::site::SiteId;

/// Where a resolved knowledge blob came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSourceKind {
    /// The global default knowledge file
    LocalDefault,
    /// `knowledge_{site}.txt` on local disk
    LocalPerSite,
    /// `https://{site}/knowledge.txt` served by the site itself
    RemoteSiteFetch,
    /// `knowledge_{site}.txt` in the object-storage bucket
    RemoteObjectStore,
    /// Nothing resolved
    None,
}

impl std::fmt::Display for KnowledgeSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::LocalDefault => "local_default",
            Self::LocalPerSite => "local_site",
            Self::RemoteSiteFetch => "remote_site",
            Self::RemoteObjectStore => "object_store",
            Self::None => "none",
        };
        f.write_str(label)
    }
}

/// A resolved knowledge document. Rebuilt on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBlob {
    /// The site this blob was resolved for (if any)
    pub site: Option<SiteId>,

    /// The verbatim knowledge text; empty iff `source` is `None`
    pub text: String,

    /// Which backend produced the text
    pub source: KnowledgeSourceKind,
}

impl KnowledgeBlob {
    /// A blob carrying knowledge text from `source`.
    pub fn found(site: Option<SiteId>, text: impl Into<String>, source: KnowledgeSourceKind) -> Self {
        Self {
            site,
            text: text.into(),
            source,
        }
    }

    /// The "no knowledge" blob.
    pub fn none(site: Option<SiteId>) -> Self {
        Self {
            site,
            text: String::new(),
            source: KnowledgeSourceKind::None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.source == KnowledgeSourceKind::None
    }
}

/// The core KnowledgeSource trait.
///
/// `Ok(None)` means "nothing here", `Err` means the backend failed. The
/// resolver treats both as a reason to try the next source.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Which kind of blob this source produces.
    fn kind(&self) -> KnowledgeSourceKind;

    /// Look up knowledge text for `site` (or the site-independent default).
    async fn fetch(&self, site: Option<&SiteId>) -> Result<Option<String>, KnowledgeError>;
}
