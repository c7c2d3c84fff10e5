//! Harvester main entry point
//!
//! This is the command-line interface that runs the crawl service.

use anyhow::Context;
use clap::Parser;
use harvester::config::{apply_env_overrides, load_config_with_hash, validate, Config};
use harvester::crawler::{build_http_client, CrawlManager};
use harvester::progress::create_reporter;
use harvester::storage::open_store;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Harvester: a bounded-concurrency web crawl service
///
/// Harvester accepts crawl requests over HTTP, runs a limited number of
/// crawls at once, stores fetched pages locally or in S3 and records
/// progress in an optional SQLite database.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(version)]
#[command(about = "A bounded-concurrency web crawl service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults and environment are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration, print the effective settings and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    if cli.check {
        print_config(&config);
        return Ok(());
    }

    run_server(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("harvester=info,warn"),
            1 => EnvFilter::new("harvester=debug,tower_http=debug,info"),
            2 => EnvFilter::new("harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any), then applies environment overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Handles the --check mode: prints the effective configuration
fn print_config(config: &Config) {
    println!("=== Harvester Configuration ===\n");

    println!("Server:");
    println!("  Listen address: {}", config.server.listen_addr);

    println!("\nCrawler:");
    println!(
        "  Max concurrent crawls: {}",
        config.crawler.max_concurrent_crawls
    );
    println!(
        "  Max pages: default {}, ceiling {}",
        config.crawler.default_max_pages, config.crawler.max_pages_ceiling
    );
    println!(
        "  Threads: default {}, max {}",
        config.crawler.default_thread_count, config.crawler.max_thread_count
    );
    println!("  Default delay: {}ms", config.crawler.default_delay_ms);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nStorage:");
    println!("  Backend: {}", config.storage.backend.as_str());
    match config.storage.backend {
        harvester::config::StorageBackend::Local => {
            println!("  Directory: {}", config.storage.directory);
        }
        harvester::config::StorageBackend::S3 => {
            println!(
                "  Bucket: {}",
                config.storage.bucket.as_deref().unwrap_or("-")
            );
            println!("  Region: {}", config.storage.region);
            if let Some(endpoint) = &config.storage.endpoint {
                println!("  Endpoint: {}", endpoint);
            }
        }
    }

    println!("\nProgress:");
    match &config.progress.database_url {
        Some(url) => println!("  Database: {}", url),
        None => println!("  Disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Builds the crawl manager and serves the API until Ctrl-C
async fn run_server(config: Config) -> anyhow::Result<()> {
    let client = build_http_client(
        &config.crawler.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    let store = open_store(&config.storage)
        .await
        .context("Failed to open page store")?;
    if !store.is_healthy().await {
        tracing::warn!(
            "Page store ({}) is not healthy at startup; crawls will fail until it recovers",
            store.kind()
        );
    }

    let reporter = create_reporter(config.progress.database_url.as_deref());
    let manager = CrawlManager::new(config.crawler.clone(), client, store, reporter);

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;

    tracing::info!(
        "Harvester ready (max {} concurrent crawls)",
        config.crawler.max_concurrent_crawls
    );

    let result = harvester::api::serve(listener, manager.clone(), async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received interrupt, shutting down"),
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
    })
    .await;

    manager.shutdown().await;
    tracing::info!("Shutdown complete");
    result
}
