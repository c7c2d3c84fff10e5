//! Harvester: a bounded-concurrency web-crawl orchestrator
//!
//! This crate admits crawl requests against a global concurrency cap, runs each
//! admitted crawl as its own bounded pool of fetch workers, persists fetched
//! pages through a pluggable page store, and reports progress to an optional
//! external store without blocking crawl work.

pub mod api;
pub mod config;
pub mod crawler;
pub mod progress;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Max concurrent crawls reached ({limit})")]
    Admission { limit: usize },

    #[error("Crawl not found: {0}")]
    JobNotFound(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlManager, CrawlRequest};
pub use state::{JobSnapshot, JobStatus, PageResult};
pub use url::normalize_url;
