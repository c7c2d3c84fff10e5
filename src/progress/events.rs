//! Progress events emitted over a crawl's lifetime

use crate::state::JobStatus;
use serde::Serialize;

/// A lifecycle milestone of one crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The worker pool is about to start
    Started { seed_url: String, max_pages: usize },

    /// A page was stored; carries the running total
    PageCrawled { pages_crawled: usize },

    /// The crawl finished normally
    Completed { total_pages: usize, location: String },

    /// The crawl ended with a job-level failure
    Failed { error: String },
}

impl ProgressEvent {
    /// Short name recorded in the event log
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::PageCrawled { .. } => "page_crawled",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Job status implied by the event
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Started { .. } | Self::PageCrawled { .. } => JobStatus::Running,
            Self::Completed { .. } => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}
