//! Storage module for persisting crawled pages
//!
//! This module handles everything a crawl writes out:
//! - The `PageStore` capability shared by all running crawls
//! - Deterministic file naming for page URLs
//! - A local filesystem backend and an S3-compatible object store backend

mod local;
mod s3;
mod traits;

pub use local::LocalPageStore;
pub use s3::S3PageStore;
pub use traits::{generate_filename, PageStore, StorageError, StorageResult};

use crate::config::{StorageBackend, StorageConfig};
use std::sync::Arc;

/// Opens the page store selected by the configuration
///
/// # Arguments
///
/// * `config` - The `[storage]` configuration section
///
/// # Returns
///
/// * `Ok(Arc<dyn PageStore>)` - The configured backend
/// * `Err(StorageError)` - The backend could not be constructed
pub async fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn PageStore>> {
    match config.backend {
        StorageBackend::Local => {
            tracing::info!("Using local page store at {}", config.directory);
            Ok(Arc::new(LocalPageStore::new(&config.directory)))
        }
        StorageBackend::S3 => Ok(Arc::new(S3PageStore::from_config(config).await?)),
    }
}
