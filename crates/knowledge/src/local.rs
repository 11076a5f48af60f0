//! Local-disk knowledge backends.

use async_trait::async_trait;
use sitechat_core::knowledge::{KnowledgeSource, KnowledgeSourceKind};
use sitechat_core::{KnowledgeError, SiteId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads `{dir}/knowledge_{site}.txt`. Read-only; a missing file is a miss.
pub struct LocalSiteSource {
    dir: PathBuf,
}

impl LocalSiteSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, site: &SiteId) -> PathBuf {
        self.dir.join(site.knowledge_file_name())
    }
}

#[async_trait]
impl KnowledgeSource for LocalSiteSource {
    fn kind(&self) -> KnowledgeSourceKind {
        KnowledgeSourceKind::LocalPerSite
    }

    async fn fetch(&self, site: Option<&SiteId>) -> Result<Option<String>, KnowledgeError> {
        let Some(site) = site else {
            return Ok(None);
        };
        read_optional(&self.path_for(site)).await
    }
}

/// Reads the single global default knowledge file, for any site.
pub struct LocalDefaultSource {
    path: PathBuf,
}

impl LocalDefaultSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KnowledgeSource for LocalDefaultSource {
    fn kind(&self) -> KnowledgeSourceKind {
        KnowledgeSourceKind::LocalDefault
    }

    async fn fetch(&self, _site: Option<&SiteId>) -> Result<Option<String>, KnowledgeError> {
        read_optional(&self.path).await
    }
}

/// Read a UTF-8 file, mapping "not found" to `Ok(None)`.
async fn read_optional(path: &Path) -> Result<Option<String>, KnowledgeError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(KnowledgeError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
