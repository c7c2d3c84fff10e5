use crate::config::types::{Config, StorageBackend};
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so deployments can tell which configuration a process runs with.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies overrides from the process environment
///
/// See [`apply_overrides`] for the recognized variables.
pub fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Applies overrides looked up through `lookup`
///
/// Recognized keys: `PORT`, `MAX_CONCURRENT_CRAWLS`, `STORAGE_TYPE`, `OUTPUT_DIR`,
/// `S3_BUCKET_NAME`, `AWS_REGION`, `AWS_ENDPOINT_URL`, `PROGRESS_DATABASE_URL`.
/// Blank values are ignored.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(port) = get("PORT") {
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::Validation(format!("PORT must be a port number, got '{}'", port)))?;
        config.server.listen_addr = format!("0.0.0.0:{}", port);
    }

    if let Some(cap) = get("MAX_CONCURRENT_CRAWLS") {
        config.crawler.max_concurrent_crawls = cap.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "MAX_CONCURRENT_CRAWLS must be a positive integer, got '{}'",
                cap
            ))
        })?;
    }

    if let Some(backend) = get("STORAGE_TYPE") {
        config.storage.backend = StorageBackend::parse(&backend).ok_or_else(|| {
            ConfigError::Validation(format!("Unknown STORAGE_TYPE: {}", backend))
        })?;
    }

    if let Some(directory) = get("OUTPUT_DIR") {
        config.storage.directory = directory;
    }

    if let Some(bucket) = get("S3_BUCKET_NAME") {
        config.storage.bucket = Some(bucket);
    }

    if let Some(region) = get("AWS_REGION") {
        config.storage.region = region;
    }

    if let Some(endpoint) = get("AWS_ENDPOINT_URL") {
        config.storage.endpoint = Some(endpoint);
    }

    if let Some(url) = get("PROGRESS_DATABASE_URL") {
        config.progress.database_url = Some(url);
    }

    Ok(())
}
