//! Knowledge resolver. Walks the configured sources in preference order.
//!
//! Every call re-resolves; nothing is cached, so edits to a knowledge
//! document take effect on the next request.

use sitechat_core::knowledge::{KnowledgeBlob, KnowledgeSource, KnowledgeSourceKind};
use sitechat_core::SiteId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a site's knowledge from an ordered list of backends.
#[derive(Clone, Default)]
pub struct KnowledgeResolver {
    sources: Vec<Arc<dyn KnowledgeSource>>,
}

impl KnowledgeResolver {
    /// A resolver with no sources; it always yields the "none" blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source at the lowest preference so far.
    pub fn with_source(mut self, source: Arc<dyn KnowledgeSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// The configured source kinds, highest preference first.
    pub fn kinds(&self) -> Vec<KnowledgeSourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Resolve knowledge for `site`. Never fails.
    ///
    /// Backend errors and blank documents fall through to the next source.
    pub async fn resolve(&self, site: Option<&SiteId>) -> KnowledgeBlob {
        let site_label = site.map(SiteId::as_str).unwrap_or("-");

        for source in &self.sources {
            let kind = source.kind();
            match source.fetch(site).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    debug!(site = %site_label, source = %kind, bytes = text.len(), "Knowledge resolved");
                    return KnowledgeBlob::found(site.cloned(), text, kind);
                }
                Ok(Some(_)) => {
                    debug!(site = %site_label, source = %kind, "Knowledge document is blank, skipping");
                }
                Ok(None) => {
                    debug!(site = %site_label, source = %kind, "No knowledge at source");
                }
                Err(e) => {
                    warn!(site = %site_label, source = %kind, error = %e, "Knowledge source failed, trying next");
                }
            }
        }

        debug!(site = %site_label, "No knowledge source resolved");
        KnowledgeBlob::none(site.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sitechat_core::KnowledgeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A source with a fixed answer that counts how often it is asked.
    struct StubSource {
        kind: KnowledgeSourceKind,
        answer: fn() -> Result<Option<String>, KnowledgeError>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(kind: KnowledgeSourceKind, answer: fn() -> Result<Option<String>, KnowledgeError>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KnowledgeSource for StubSource {
        fn kind(&self) -> KnowledgeSourceKind {
            self.kind
        }

        async fn fetch(&self, _site: Option<&SiteId>) -> Result<Option<String>, KnowledgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.answer)()
        }
    }

    fn site() -> SiteId {
        SiteId::parse("example.com").unwrap()
    }

    #[tokio::test]
    async fn first_hit_wins_and_stops() {
        let remote = StubSource::new(KnowledgeSourceKind::RemoteSiteFetch, || Ok(Some("remote".into())));
        let local = StubSource::new(KnowledgeSourceKind::LocalPerSite, || Ok(Some("local".into())));
        let resolver = KnowledgeResolver::new()
            .with_source(remote.clone())
            .with_source(local.clone());

        let blob = resolver.resolve(Some(&site())).await;
        assert_eq!(blob.source, KnowledgeSourceKind::RemoteSiteFetch);
        assert_eq!(blob.text, "remote");
        assert_eq!(blob.site, Some(site()));
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn errors_and_misses_fall_through() {
        let failing = StubSource::new(KnowledgeSourceKind::RemoteSiteFetch, || {
            Err(KnowledgeError::Status {
                url: "https://example.com/knowledge.txt".into(),
                status: 503,
            })
        });
        let missing = StubSource::new(KnowledgeSourceKind::LocalPerSite, || Ok(None));
        let bucket = StubSource::new(KnowledgeSourceKind::RemoteObjectStore, || Ok(Some("bucket".into())));
        let resolver = KnowledgeResolver::new()
            .with_source(failing.clone())
            .with_source(missing.clone())
            .with_source(bucket);

        let blob = resolver.resolve(Some(&site())).await;
        assert_eq!(blob.source, KnowledgeSourceKind::RemoteObjectStore);
        assert_eq!(blob.text, "bucket");
        assert_eq!(failing.calls(), 1);
        assert_eq!(missing.calls(), 1);
    }

    #[tokio::test]
    async fn blank_document_is_skipped() {
        let blank = StubSource::new(KnowledgeSourceKind::LocalPerSite, || Ok(Some("  \n\t".into())));
        let default = StubSource::new(KnowledgeSourceKind::LocalDefault, || Ok(Some("default".into())));
        let resolver = KnowledgeResolver::new().with_source(blank).with_source(default);

        let blob = resolver.resolve(Some(&site())).await;
        assert_eq!(blob.source, KnowledgeSourceKind::LocalDefault);
    }

    #[tokio::test]
    async fn exhaustion_yields_none() {
        let missing = StubSource::new(KnowledgeSourceKind::LocalDefault, || Ok(None));
        let resolver = KnowledgeResolver::new().with_source(missing);

        let blob = resolver.resolve(None).await;
        assert!(blob.is_none());
        assert!(blob.text.is_empty());
        assert!(blob.site.is_none());
    }

    #[tokio::test]
    async fn every_call_re_resolves() {
        let remote = StubSource::new(KnowledgeSourceKind::RemoteSiteFetch, || Ok(Some("remote".into())));
        let resolver = KnowledgeResolver::new().with_source(remote.clone());

        resolver.resolve(Some(&site())).await;
        resolver.resolve(Some(&site())).await;
        assert_eq!(remote.calls(), 2);
    }

    #[tokio::test]
    async fn empty_resolver_yields_none() {
        let blob = KnowledgeResolver::new().resolve(Some(&site())).await;
        assert!(blob.is_none());
    }
}
