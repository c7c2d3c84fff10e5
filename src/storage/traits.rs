//! Page store trait and error types
//!
//! This module defines the capability every page storage backend provides
//! and the naming scheme shared by all of them.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Longest file name a backend is asked to create
const MAX_FILENAME_LEN: usize = 200;

/// Number of hex characters of the URL digest kept in file names
const HASH_LEN: usize = 16;

/// Errors that can occur while persisting pages
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Storage misconfigured: {0}")]
    Config(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A backend that persists fetched page content
///
/// Implementations are shared by every running crawl and must tolerate
/// concurrent calls to [`PageStore::save`].
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Stores one page and returns its location
    ///
    /// # Arguments
    ///
    /// * `job_id` - Crawl the page belongs to, used as a namespace
    /// * `source_url` - URL the content was fetched from
    /// * `content` - Raw page body
    ///
    /// # Returns
    ///
    /// A backend-specific location string (a file path or an object URI).
    /// A failed save leaves nothing readable behind.
    async fn save(&self, job_id: &str, source_url: &str, content: &[u8]) -> StorageResult<String>;

    /// Reports whether the backend can currently accept writes
    async fn is_healthy(&self) -> bool;

    /// Location under which every page of `job_id` is stored
    fn base_location(&self, job_id: &str) -> String;

    /// Short backend name for logs and health output
    fn kind(&self) -> &'static str;
}

/// Derives a deterministic file name for a page URL
///
/// The name is the URL path with `/` replaced by `_` (`index` for the root),
/// followed by the first 16 hex characters of the SHA-256 of the full URL.
/// Characters outside `[A-Za-z0-9._-]` become `_` and long names are cut so
/// the result never exceeds 200 characters.
///
/// # Example
///
/// ```
/// use harvester::storage::generate_filename;
///
/// let name = generate_filename("https://example.com/docs/intro");
/// assert!(name.starts_with("docs_intro_"));
/// assert!(name.ends_with(".html"));
/// ```
pub fn generate_filename(url: &str) -> String {
    let hash = short_hash(url);

    let stem = match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path().trim_matches('/');
            if path.is_empty() {
                "index".to_string()
            } else {
                sanitize(&path.replace('/', "_"))
            }
        }
        Err(_) => return format!("{}.html", hash),
    };

    let name = format!("{}_{}.html", stem, hash);
    if name.len() <= MAX_FILENAME_LEN {
        return name;
    }

    // "_" + hash + ".html"
    let keep = MAX_FILENAME_LEN - (HASH_LEN + 6);
    format!("{}_{}.html", &stem[..keep], hash)
}

fn short_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_LEN);
    encoded
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
