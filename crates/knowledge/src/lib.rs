//! Knowledge resolution for SiteChat.
//!
//! All backends implement the `sitechat_core::KnowledgeSource` trait.
//! The resolver walks them in the configured preference order and stops at
//! the first one that produces text.

pub mod local;
pub mod remote;
pub mod resolver;
pub mod store;

pub use local::{LocalDefaultSource, LocalSiteSource};
pub use remote::{ObjectStoreSource, RemoteSiteSource};
pub use resolver::KnowledgeResolver;
pub use store::LocalKnowledgeStore;

use sitechat_config::{KnowledgeConfig, KnowledgeSourceSetting};
use sitechat_core::KnowledgeError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Build a resolver from configuration.
///
/// One HTTP client is shared by the remote backends, which all honor
/// `max_bytes`. The object store is skipped when no bucket URL is configured.
pub fn build_from_config(config: &KnowledgeConfig) -> Result<KnowledgeResolver, KnowledgeError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()
        .map_err(|e| KnowledgeError::Http {
            url: String::new(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;

    let mut resolver = KnowledgeResolver::new();

    for setting in &config.sources {
        match setting {
            KnowledgeSourceSetting::RemoteSite => {
                resolver = resolver.with_source(Arc::new(
                    RemoteSiteSource::new(client.clone(), &config.remote_url_template)
                        .with_max_bytes(config.max_bytes),
                ));
            }
            KnowledgeSourceSetting::LocalSite => {
                resolver = resolver.with_source(Arc::new(LocalSiteSource::new(&config.dir)));
            }
            KnowledgeSourceSetting::ObjectStore => match &config.bucket_url {
                Some(bucket_url) => {
                    resolver = resolver.with_source(Arc::new(
                        ObjectStoreSource::new(client.clone(), bucket_url).with_max_bytes(config.max_bytes),
                    ));
                }
                None => debug!("No bucket_url configured, object store source disabled"),
            },
            KnowledgeSourceSetting::LocalDefault => {
                resolver = resolver
                    .with_source(Arc::new(LocalDefaultSource::new(config.default_file_path())));
            }
        }
    }

    info!(sources = ?resolver.kinds(), "Knowledge resolver ready");
    Ok(resolver)
}
