//! HTTP API request/response types
//!
//! JSON bodies use camelCase keys. Crawl requests deserialize straight into
//! [`crate::crawler::CrawlRequest`] and status responses are
//! [`crate::state::JobSnapshot`]s.

use crate::state::JobStatus;
use serde::{Deserialize, Serialize};

/// Body of `202 Accepted` after a crawl is admitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStartedResponse {
    pub crawl_id: String,
    pub status: String,
    pub message: String,
}

impl CrawlStartedResponse {
    pub fn new(crawl_id: String, status: JobStatus) -> Self {
        Self {
            crawl_id,
            status: status.to_string(),
            message: "Crawl started".to_string(),
        }
    }
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `UP` or `DOWN`
    pub status: String,
    /// `healthy` or `unhealthy`
    pub storage: String,
    /// Backend name, `local` or `s3`
    pub storage_type: String,
    pub active_crawls: usize,
    pub max_concurrent_crawls: usize,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", error)
    }

    pub fn internal_error(error: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", error)
    }
}
