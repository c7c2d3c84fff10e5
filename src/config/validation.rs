use crate::config::types::{
    Config, CrawlerConfig, ProgressConfig, ServerConfig, StorageBackend, StorageConfig,
};
use crate::{ConfigError, ConfigResult};
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server_config(&config.server)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_progress_config(&config.progress)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> ConfigResult<()> {
    config.listen_addr.parse::<SocketAddr>().map_err(|_| {
        ConfigError::Validation(format!(
            "listen_addr must be a socket address, got '{}'",
            config.listen_addr
        ))
    })?;
    Ok(())
}

/// Validates crawler limits
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.max_concurrent_crawls < 1 {
        return Err(ConfigError::Validation(
            "max_concurrent_crawls must be >= 1".to_string(),
        ));
    }

    if config.max_pages_ceiling < 1 {
        return Err(ConfigError::Validation(
            "max_pages_ceiling must be >= 1".to_string(),
        ));
    }

    if config.default_max_pages < 1 || config.default_max_pages > config.max_pages_ceiling {
        return Err(ConfigError::Validation(format!(
            "default_max_pages must be between 1 and {}, got {}",
            config.max_pages_ceiling, config.default_max_pages
        )));
    }

    if config.max_thread_count < 1 {
        return Err(ConfigError::Validation(
            "max_thread_count must be >= 1".to_string(),
        ));
    }

    if config.default_thread_count < 1 || config.default_thread_count > config.max_thread_count {
        return Err(ConfigError::Validation(format!(
            "default_thread_count must be between 1 and {}, got {}",
            config.max_thread_count, config.default_thread_count
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the page store selection
fn validate_storage_config(config: &StorageConfig) -> ConfigResult<()> {
    match config.backend {
        StorageBackend::Local => {
            if config.directory.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "storage directory cannot be empty".to_string(),
                ));
            }
        }
        StorageBackend::S3 => {
            let bucket = config.bucket.as_deref().unwrap_or("").trim();
            if bucket.is_empty() {
                return Err(ConfigError::Validation(
                    "bucket is required when backend = \"s3\"".to_string(),
                ));
            }

            if config.region.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "region cannot be empty when backend = \"s3\"".to_string(),
                ));
            }

            if let Some(endpoint) = &config.endpoint {
                Url::parse(endpoint).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid storage endpoint '{}': {}", endpoint, e))
                })?;
            }
        }
    }

    Ok(())
}

fn validate_progress_config(config: &ProgressConfig) -> ConfigResult<()> {
    if let Some(url) = &config.database_url {
        if url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database_url cannot be blank; omit it to disable progress reporting"
                    .to_string(),
            ));
        }
    }
    Ok(())
}
