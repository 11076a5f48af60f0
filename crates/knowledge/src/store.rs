//! Writable local knowledge store behind `POST /upload-knowledge`.

use sitechat_core::{KnowledgeError, SiteId};
use std::path::{Path, PathBuf};
use tracing::info;

/// Persists per-site knowledge files that `LocalSiteSource` reads back.
#[derive(Debug, Clone)]
pub struct LocalKnowledgeStore {
    dir: PathBuf,
}

impl LocalKnowledgeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, site: &SiteId) -> PathBuf {
        self.dir.join(site.knowledge_file_name())
    }

    /// Create or overwrite the knowledge file for `site`.
    ///
    /// Writes a temporary sibling and renames it into place, so readers
    /// see either the old or the new document.
    pub async fn save(&self, site: &SiteId, text: &str) -> Result<PathBuf, KnowledgeError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let target = self.path_for(site);
        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            site.knowledge_file_name(),
            uuid::Uuid::new_v4()
        ));

        tokio::fs::write(&tmp, text).await.map_err(|e| io_error(&tmp, e))?;

        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(&target, e));
        }

        info!(site = %site, path = %target.display(), bytes = text.len(), "Knowledge file saved");
        Ok(target)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> KnowledgeError {
    KnowledgeError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
