//! Configuration module for Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering environment overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Concurrency cap: {}", config.crawler.max_concurrent_crawls);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ProgressConfig, ServerConfig, StorageBackend, StorageConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, apply_overrides, compute_config_hash, load_config, load_config_with_hash,
};
pub use validation::validate;
