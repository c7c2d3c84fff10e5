//! State module for crawl jobs
//!
//! # Components
//!
//! - `JobStatus`: the PENDING → RUNNING → COMPLETED | FAILED state machine
//! - `CrawlJob`: one crawl's parameters, status, counters and results
//! - `JobSnapshot`: the read-only view handed to callers

mod crawl_job;
mod job_status;

// Re-export main types
pub use crawl_job::{CrawlJob, CrawlParams, JobSnapshot, PageResult};
pub use job_status::JobStatus;
