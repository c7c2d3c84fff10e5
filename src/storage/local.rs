//! Local filesystem page store

use crate::storage::traits::{generate_filename, PageStore, StorageResult};
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Stores pages as `{base_dir}/{job_id}/{filename}`
#[derive(Debug, Clone)]
pub struct LocalPageStore {
    base_dir: PathBuf,
}

impl LocalPageStore {
    /// Creates a store rooted at `base_dir`
    ///
    /// Nothing is touched on disk until the first save or health check.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl PageStore for LocalPageStore {
    async fn save(&self, job_id: &str, source_url: &str, content: &[u8]) -> StorageResult<String> {
        let job_dir = self.base_dir.join(job_id);
        tokio::fs::create_dir_all(&job_dir).await?;

        let filename = generate_filename(source_url);
        let target = job_dir.join(&filename);

        // Write to a sibling temp file then rename, so readers never see a
        // partially written page.
        let temp = job_dir.join(format!(".{}.tmp-{}", filename, Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&temp, content).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!("Saved {} to {}", source_url, target.display());
        Ok(target.to_string_lossy().into_owned())
    }

    async fn is_healthy(&self) -> bool {
        if let Err(e) = tokio::fs::create_dir_all(&self.base_dir).await {
            tracing::warn!(
                "Storage directory {} unavailable: {}",
                self.base_dir.display(),
                e
            );
            return false;
        }

        let probe = self
            .base_dir
            .join(format!(".health-{}", Uuid::new_v4().simple()));
        match tokio::fs::write(&probe, b"ok").await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&probe).await;
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Storage directory {} not writable: {}",
                    self.base_dir.display(),
                    e
                );
                false
            }
        }
    }

    fn base_location(&self, job_id: &str) -> String {
        self.base_dir.join(job_id).to_string_lossy().into_owned()
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
