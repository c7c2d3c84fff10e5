//! Progress reporting module
//!
//! Crawl lifecycle milestones are forwarded to an optional external store.
//! Reporting is fire-and-forget: a slow or broken store never delays or
//! fails a crawl.

mod events;
mod noop;
mod schema;
mod sqlite;

pub use events::ProgressEvent;
pub use noop::NoopReporter;
pub use sqlite::SqliteProgressReporter;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while opening a progress store
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for crawl progress events
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Queues an event for `external_ref` without blocking
    fn report(&self, external_ref: &str, event: ProgressEvent);

    /// Flushes queued events and releases the store
    async fn shutdown(&self);
}

/// Builds the reporter for an optional progress database
///
/// A missing or blank connection string disables reporting. A store that
/// cannot be opened is logged and also disables reporting.
pub fn create_reporter(database_url: Option<&str>) -> Arc<dyn ProgressReporter> {
    let Some(url) = database_url.map(str::trim).filter(|u| !u.is_empty()) else {
        tracing::info!("No progress database configured, progress reporting disabled");
        return Arc::new(NoopReporter);
    };

    match SqliteProgressReporter::open(url) {
        Ok(reporter) => Arc::new(reporter),
        Err(e) => {
            tracing::warn!("Failed to open progress database {}: {}", url, e);
            Arc::new(NoopReporter)
        }
    }
}
