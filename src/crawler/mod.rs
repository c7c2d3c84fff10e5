//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of HTML pages
//! - Link extraction and same-site scoping
//! - The per-job frontier and politeness delays
//! - The bounded worker pool that runs one crawl
//! - The manager that admits crawls and tracks their jobs

mod fetcher;
mod frontier;
mod manager;
mod parser;
mod politeness;
mod pool;

pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use manager::{CrawlManager, CrawlRequest};
pub use parser::extract_links;
pub use politeness::effective_delay;
pub use pool::{CrawlContext, CrawlPool, JobFailure};
