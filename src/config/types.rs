use serde::Deserialize;

/// Main configuration structure for Harvester
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub progress: ProgressConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the request boundary listens on
    #[serde(rename = "listen-addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Crawl admission and per-job limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of crawls pending or running at once
    #[serde(rename = "max-concurrent-crawls")]
    pub max_concurrent_crawls: usize,

    /// Upper bound that every requested `maxPages` is clamped to
    #[serde(rename = "max-pages-ceiling")]
    pub max_pages_ceiling: usize,

    /// Page budget used when a request omits `maxPages`
    #[serde(rename = "default-max-pages")]
    pub default_max_pages: usize,

    /// Worker count used when a request omits `threadCount`
    #[serde(rename = "default-thread-count")]
    pub default_thread_count: usize,

    /// Upper bound on workers per crawl
    #[serde(rename = "max-thread-count")]
    pub max_thread_count: usize,

    /// Politeness delay (milliseconds) used when a request omits `delayMs`
    #[serde(rename = "default-delay-ms")]
    pub default_delay_ms: u64,

    /// Timeout applied to every single page request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// User agent sent with every request and matched against robots.txt
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whether robots.txt disallow rules are honored
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_crawls: 3,
            max_pages_ceiling: 1000,
            default_max_pages: 100,
            default_thread_count: 5,
            max_thread_count: 32,
            default_delay_ms: 1000,
            request_timeout_secs: 10,
            user_agent: "HarvesterBot/1.0".to_string(),
            respect_robots: true,
        }
    }
}

/// Which page store implementation is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    S3,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "s3" => Some(Self::S3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

/// Page store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Base directory for the local backend
    pub directory: String,

    /// Bucket name for the s3 backend
    pub bucket: Option<String>,

    /// Bucket region for the s3 backend
    pub region: String,

    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            directory: "crawled_pages".to_string(),
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

/// External progress store configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Connection string of the progress store; absent disables reporting
    #[serde(rename = "database-url")]
    pub database_url: Option<String>,
}
