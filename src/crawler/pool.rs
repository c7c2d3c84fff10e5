//! Crawl worker pool - runs one admitted crawl to completion
//!
//! The pool owns everything private to a single crawl:
//! - The frontier (queue, visited set, in-flight count)
//! - The site's robots.txt rules and the effective politeness delay
//! - `thread_count` worker tasks pulling from the frontier
//!
//! Per-page failures are logged and skipped. Only when the crawl ends
//! without a single stored page does it fail as a whole, with a
//! [`JobFailure`] describing why.

use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::crawler::politeness::{effective_delay, Politeness};
use crate::crawler::fetch_page;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::robots::{agent_token, fetch_robots, ParsedRobots};
use crate::state::{CrawlJob, PageResult};
use crate::storage::PageStore;
use crate::url::host_of;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

/// Why a crawl ended without producing any page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    #[error("Seed URL {url} could not be crawled: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("Storage unavailable: all {attempts} page saves failed ({last_error})")]
    StorageUnavailable { attempts: usize, last_error: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Shared dependencies every crawl runs with
#[derive(Clone)]
pub struct CrawlContext {
    pub client: Client,
    pub store: Arc<dyn PageStore>,
    pub reporter: Arc<dyn ProgressReporter>,
    /// Full User-Agent string; its product token is matched against robots.txt
    pub user_agent: String,
    pub respect_robots: bool,
}

#[derive(Debug, Default)]
struct PoolStats {
    save_attempts: AtomicUsize,
    save_failures: AtomicUsize,
    fetch_failures: AtomicUsize,
    seed_error: Mutex<Option<String>>,
    storage_error: Mutex<Option<String>>,
}

impl PoolStats {
    fn record(slot: &Mutex<Option<String>>, message: String) {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    fn take(slot: &Mutex<Option<String>>) -> Option<String> {
        slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// State shared by the workers of one crawl
struct PoolShared {
    job: Arc<CrawlJob>,
    context: CrawlContext,
    frontier: Frontier,
    robots: ParsedRobots,
    agent: String,
    scope_host: String,
    delay: Duration,
    stats: PoolStats,
}

/// Marks a URL finished on drop, so a panicking worker cannot stall the others
struct Claim<'a> {
    frontier: &'a Frontier,
    links: Vec<String>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.frontier.complete(std::mem::take(&mut self.links));
    }
}

/// Bounded pool of fetch workers for one crawl
pub struct CrawlPool {
    job: Arc<CrawlJob>,
    context: CrawlContext,
}

impl CrawlPool {
    pub fn new(job: Arc<CrawlJob>, context: CrawlContext) -> Self {
        Self { job, context }
    }

    /// Runs the crawl until the frontier is exhausted or the page budget is reached
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of pages stored
    /// * `Err(JobFailure)` - The crawl could not store a single page
    pub async fn run(self) -> Result<usize, JobFailure> {
        let job = self.job;
        let params = job.params().clone();

        let seed = Url::parse(&params.seed_url).map_err(|e| JobFailure::SeedUnreachable {
            url: params.seed_url.clone(),
            reason: e.to_string(),
        })?;
        let scope_host = host_of(&seed).ok_or_else(|| JobFailure::SeedUnreachable {
            url: params.seed_url.clone(),
            reason: "missing host".to_string(),
        })?;

        let agent = agent_token(&self.context.user_agent).to_string();
        let robots = if self.context.respect_robots {
            fetch_robots(&self.context.client, &seed).await
        } else {
            ParsedRobots::allow_all()
        };

        if !robots.is_allowed(seed.as_str(), &agent) {
            return Err(JobFailure::SeedUnreachable {
                url: params.seed_url.clone(),
                reason: "disallowed by robots.txt".to_string(),
            });
        }

        let delay = effective_delay(params.delay, &robots, &agent);
        if delay > params.delay {
            tracing::info!(
                "[{}] Using robots.txt crawl delay of {:?}",
                job.id(),
                delay
            );
        }

        let shared = Arc::new(PoolShared {
            job: Arc::clone(&job),
            frontier: Frontier::with_seed(params.seed_url.clone()),
            context: self.context,
            robots,
            agent,
            scope_host,
            delay,
            stats: PoolStats::default(),
        });

        tracing::info!(
            "[{}] Crawling {} with {} workers (max {} pages, delay {:?})",
            job.id(),
            params.seed_url,
            params.thread_count,
            params.max_pages,
            delay
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..params.thread_count {
            let shared = Arc::clone(&shared);
            workers.spawn(async move { run_worker(shared, worker_id).await });
        }

        let mut panicked = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("[{}] Crawl worker failed: {}", job.id(), e);
                panicked.get_or_insert_with(|| e.to_string());
            }
        }

        let stats = &shared.stats;
        let pages = job.pages_downloaded();
        tracing::info!(
            "[{}] Workers finished: {} pages stored, {} fetch failures, {} save failures, {} URLs discovered",
            job.id(),
            pages,
            stats.fetch_failures.load(Ordering::Relaxed),
            stats.save_failures.load(Ordering::Relaxed),
            shared.frontier.discovered()
        );

        if pages > 0 {
            return Ok(pages);
        }

        if let Some(error) = panicked {
            return Err(JobFailure::Internal(error));
        }

        if let Some(reason) = PoolStats::take(&stats.seed_error) {
            return Err(JobFailure::SeedUnreachable {
                url: params.seed_url,
                reason,
            });
        }

        let attempts = stats.save_attempts.load(Ordering::Relaxed);
        if attempts > 0 && stats.save_failures.load(Ordering::Relaxed) == attempts {
            return Err(JobFailure::StorageUnavailable {
                attempts,
                last_error: PoolStats::take(&stats.storage_error)
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(0)
    }
}

async fn run_worker(shared: Arc<PoolShared>, worker_id: usize) {
    let mut politeness = Politeness::new(shared.delay);

    while let Some(url) = shared.frontier.next(&shared.job).await {
        let mut claim = Claim {
            frontier: &shared.frontier,
            links: Vec::new(),
        };
        claim.links = process_url(&shared, &url, &mut politeness).await;
    }

    tracing::debug!("[{}] Worker {} exiting", shared.job.id(), worker_id);
}

/// Fetches, stores and extracts one URL
///
/// Returns the links to offer to the frontier; empty when the page was
/// skipped, discarded or could not be stored.
async fn process_url(shared: &PoolShared, url: &str, politeness: &mut Politeness) -> Vec<String> {
    let job = &shared.job;
    let is_seed = url == job.params().seed_url;

    if !shared.robots.is_allowed(url, &shared.agent) {
        tracing::debug!("[{}] Skipping {} (disallowed by robots.txt)", job.id(), url);
        return Vec::new();
    }

    politeness.wait().await;

    let page = match fetch_page(&shared.context.client, url).await {
        Ok(page) => page,
        Err(e) => {
            shared.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
            if is_seed {
                tracing::warn!("[{}] Seed fetch failed: {}", job.id(), e);
                PoolStats::record(&shared.stats.seed_error, e.to_string());
            } else {
                tracing::debug!("[{}] Skipping page: {}", job.id(), e);
            }
            return Vec::new();
        }
    };

    let base = Url::parse(&page.final_url).or_else(|_| Url::parse(url));
    let links = match base {
        Ok(base) => extract_links(&page.body, &base, &shared.scope_host),
        Err(_) => Vec::new(),
    };

    if !job.try_reserve_slot() {
        tracing::debug!("[{}] Page budget reached, discarding {}", job.id(), url);
        return Vec::new();
    }

    shared.stats.save_attempts.fetch_add(1, Ordering::Relaxed);
    let location = match shared
        .context
        .store
        .save(job.id(), url, page.body.as_bytes())
        .await
    {
        Ok(location) => location,
        Err(e) => {
            job.release_slot();
            shared.stats.save_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("[{}] Failed to store {}: {}", job.id(), url, e);
            PoolStats::record(&shared.stats.storage_error, e.to_string());
            return Vec::new();
        }
    };

    let result = PageResult {
        url: url.to_string(),
        storage_path: location,
        status_code: page.status_code,
    };

    match job.commit_page(result) {
        Some(count) => {
            tracing::info!(
                "[{}] Stored {} ({}/{})",
                job.id(),
                url,
                count,
                job.params().max_pages
            );
            shared.context.reporter.report(
                job.external_ref(),
                ProgressEvent::PageCrawled {
                    pages_crawled: count,
                },
            );
            links
        }
        None => Vec::new(),
    }
}
