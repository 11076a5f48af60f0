//! Remote knowledge backends fetched over HTTP.
//!
//! Both share one `reqwest::Client` whose timeout bounds every fetch, and
//! refuse documents larger than `max_bytes` without buffering them.

use async_trait::async_trait;
use sitechat_core::knowledge::{KnowledgeSource, KnowledgeSourceKind};
use sitechat_core::{KnowledgeError, SiteId};
use tracing::debug;

/// Largest document accepted unless configured otherwise.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// Fetches the document a site publishes about itself,
/// `https://{site}/knowledge.txt` by default.
pub struct RemoteSiteSource {
    client: reqwest::Client,
    url_template: String,
    max_bytes: usize,
}

impl RemoteSiteSource {
    /// `url_template` must contain a `{site}` placeholder.
    pub fn new(client: reqwest::Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn url_for(&self, site: &SiteId) -> String {
        self.url_template.replace("{site}", site.as_str())
    }
}

#[async_trait]
impl KnowledgeSource for RemoteSiteSource {
    fn kind(&self) -> KnowledgeSourceKind {
        KnowledgeSourceKind::RemoteSiteFetch
    }

    async fn fetch(&self, site: Option<&SiteId>) -> Result<Option<String>, KnowledgeError> {
        let Some(site) = site else {
            return Ok(None);
        };
        fetch_text(&self.client, &self.url_for(site), self.max_bytes).await
    }
}

/// Fetches `{bucket_url}/knowledge_{site}.txt` from an object-storage bucket
/// exposed over HTTPS.
pub struct ObjectStoreSource {
    client: reqwest::Client,
    bucket_url: String,
    max_bytes: usize,
}

impl ObjectStoreSource {
    pub fn new(client: reqwest::Client, bucket_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket_url: bucket_url.into().trim_end_matches('/').to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn url_for(&self, site: &SiteId) -> String {
        format!("{}/{}", self.bucket_url, site.knowledge_file_name())
    }
}

#[async_trait]
impl KnowledgeSource for ObjectStoreSource {
    fn kind(&self) -> KnowledgeSourceKind {
        KnowledgeSourceKind::RemoteObjectStore
    }

    async fn fetch(&self, site: Option<&SiteId>) -> Result<Option<String>, KnowledgeError> {
        let Some(site) = site else {
            return Ok(None);
        };
        fetch_text(&self.client, &self.url_for(site), self.max_bytes).await
    }
}

/// GET a text document. 404 is a miss; any other non-200 is an error, and
/// so is a body over `max_bytes`. Nothing is ever truncated.
async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Option<String>, KnowledgeError> {
    debug!(url = %url, "Fetching remote knowledge");

    let mut response = client.get(url).send().await.map_err(|e| KnowledgeError::Http {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status().as_u16();

    if status == 404 {
        return Ok(None);
    }

    if status != 200 {
        return Err(KnowledgeError::Status {
            url: url.to_string(),
            status,
        });
    }

    let too_large = || KnowledgeError::TooLarge {
        url: url.to_string(),
        limit: max_bytes,
    };

    if response.content_length().is_some_and(|len| len > max_bytes as u64) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| KnowledgeError::Http {
        url: url.to_string(),
        reason: format!("failed to read body: {e}"),
    })? {
        if body.len() + chunk.len() > max_bytes {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}
