//! Crawl manager - admission control and the job registry
//!
//! The manager is the single admission point of the service. It is built
//! once at startup and handed to the request boundary as a cheap clonable
//! handle; every clone shares one registry.

use crate::config::CrawlerConfig;
use crate::crawler::pool::{CrawlContext, CrawlPool, JobFailure};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::state::{CrawlJob, CrawlParams, JobSnapshot};
use crate::storage::PageStore;
use crate::url::normalize_url;
use crate::{HarvestError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// A request to start a crawl
///
/// Numeric fields are optional; missing values fall back to the configured
/// defaults and every value is clamped to the configured bounds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub url: Option<String>,
    pub max_pages: Option<i64>,
    #[serde(alias = "threads")]
    pub thread_count: Option<i64>,
    pub delay_ms: Option<i64>,
    /// Caller reference used as the key for progress reporting
    #[serde(alias = "websiteCrawlDetailId")]
    pub external_ref: Option<String>,
}

impl CrawlRequest {
    /// Creates a request for `url` with every optional setting left to defaults
    pub fn new(url: impl Into<String>, external_ref: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            external_ref: Some(external_ref.into()),
            ..Self::default()
        }
    }

    pub fn with_max_pages(mut self, max_pages: i64) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_thread_count(mut self, thread_count: i64) -> Self {
        self.thread_count = Some(thread_count);
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: i64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// Validates the request and resolves it into crawl parameters
    ///
    /// # Returns
    ///
    /// * `Ok((CrawlParams, String))` - Parameters and the external reference
    /// * `Err(HarvestError::Validation)` - A required field is missing or malformed
    pub fn resolve(&self, config: &CrawlerConfig) -> Result<(CrawlParams, String)> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| HarvestError::Validation("url is required".to_string()))?;

        let seed = normalize_url(url)
            .map_err(|e| HarvestError::Validation(format!("invalid url '{}': {}", url, e)))?;

        let external_ref = self
            .external_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| HarvestError::Validation("externalRef is required".to_string()))?;

        let max_pages = clamp(
            self.max_pages,
            config.default_max_pages,
            config.max_pages_ceiling,
        );
        let thread_count = clamp(
            self.thread_count,
            config.default_thread_count,
            config.max_thread_count,
        );
        let delay_ms = self
            .delay_ms
            .map(|d| d.max(0) as u64)
            .unwrap_or(config.default_delay_ms);

        let params = CrawlParams {
            seed_url: seed.to_string(),
            max_pages,
            thread_count,
            delay: Duration::from_millis(delay_ms),
        };
        Ok((params, external_ref.to_string()))
    }
}

fn clamp(value: Option<i64>, default: usize, ceiling: usize) -> usize {
    match value {
        Some(v) if v < 1 => 1,
        Some(v) => usize::try_from(v).unwrap_or(usize::MAX).min(ceiling),
        None => default.min(ceiling),
    }
    .max(1)
}

#[derive(Default)]
struct Registry {
    jobs: HashMap<String, Arc<CrawlJob>>,
    /// Jobs admitted and not yet terminal
    active: usize,
}

struct ManagerInner {
    config: CrawlerConfig,
    context: CrawlContext,
    registry: Mutex<Registry>,
}

/// Admission point and registry for every crawl of the process
#[derive(Clone)]
pub struct CrawlManager {
    inner: Arc<ManagerInner>,
}

impl CrawlManager {
    /// Creates a manager
    ///
    /// # Arguments
    ///
    /// * `config` - Admission limits and request defaults
    /// * `client` - HTTP client shared by every crawl
    /// * `store` - Page store shared by every crawl
    /// * `reporter` - Progress sink shared by every crawl
    pub fn new(
        config: CrawlerConfig,
        client: Client,
        store: Arc<dyn PageStore>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let context = CrawlContext {
            client,
            store,
            reporter,
            user_agent: config.user_agent.clone(),
            respect_robots: config.respect_robots,
        };

        Self {
            inner: Arc::new(ManagerInner {
                config,
                context,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Admits a crawl and starts it in the background
    ///
    /// Returns as soon as the job is registered; the crawl itself runs on
    /// spawned tasks. Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(JobSnapshot)` - The admitted job, still `PENDING`
    /// * `Err(HarvestError::Validation)` - The request is malformed
    /// * `Err(HarvestError::Admission)` - The concurrency cap is reached
    pub fn start_crawl(&self, request: CrawlRequest) -> Result<JobSnapshot> {
        let (params, external_ref) = request.resolve(&self.inner.config)?;
        let limit = self.inner.config.max_concurrent_crawls;

        let job = {
            let mut registry = self.registry();
            if registry.active >= limit {
                tracing::warn!(
                    "Rejecting crawl of {}: {} crawls already active",
                    params.seed_url,
                    registry.active
                );
                return Err(HarvestError::Admission { limit });
            }

            let id = Uuid::new_v4().to_string();
            let job = Arc::new(CrawlJob::new(id.clone(), external_ref, params));
            registry.jobs.insert(id, Arc::clone(&job));
            registry.active += 1;
            job
        };

        tracing::info!(
            "Admitted crawl {} for {} (ref {})",
            job.id(),
            job.params().seed_url,
            job.external_ref()
        );

        let snapshot = job.snapshot();
        let manager = self.clone();
        tokio::spawn(async move { manager.run_job(job).await });
        Ok(snapshot)
    }

    /// Returns a snapshot of a job
    pub fn get_job(&self, id: &str) -> Result<JobSnapshot> {
        let job = self
            .registry()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| HarvestError::JobNotFound(id.to_string()))?;
        Ok(job.snapshot())
    }

    /// Number of jobs currently pending or running
    pub fn active_crawls(&self) -> usize {
        self.registry().active
    }

    /// Configured concurrency cap
    pub fn max_concurrent_crawls(&self) -> usize {
        self.inner.config.max_concurrent_crawls
    }

    /// Whether the page store can currently accept writes
    pub async fn storage_healthy(&self) -> bool {
        self.inner.context.store.is_healthy().await
    }

    /// Short name of the configured page store
    pub fn storage_kind(&self) -> &'static str {
        self.inner.context.store.kind()
    }

    /// Flushes and closes the progress reporter
    ///
    /// Crawls still running keep going but their remaining events are dropped.
    pub async fn shutdown(&self) {
        let active = self.active_crawls();
        if active > 0 {
            tracing::warn!("Shutting down with {} crawls still active", active);
        }
        self.inner.context.reporter.shutdown().await;
    }

    async fn run_job(self, job: Arc<CrawlJob>) {
        let reporter = Arc::clone(&self.inner.context.reporter);

        if let Err(e) = job.mark_running() {
            if let Err(e) = self.finish(&job, || Err(e)) {
                tracing::error!("[{}] Could not start crawl: {}", job.id(), e);
            }
            return;
        }
        reporter.report(
            job.external_ref(),
            ProgressEvent::Started {
                seed_url: job.params().seed_url.clone(),
                max_pages: job.params().max_pages,
            },
        );

        let pool = CrawlPool::new(Arc::clone(&job), self.inner.context.clone());
        let outcome = match tokio::spawn(pool.run()).await {
            Ok(outcome) => outcome,
            Err(e) => Err(JobFailure::Internal(format!("crawl task aborted: {}", e))),
        };

        match outcome {
            Ok(pages) => {
                let location = self.inner.context.store.base_location(job.id());
                match self.finish(&job, || job.complete()) {
                    Ok(()) => {
                        tracing::info!(
                            "[{}] Crawl completed: {} pages stored under {}",
                            job.id(),
                            pages,
                            location
                        );
                        reporter.report(
                            job.external_ref(),
                            ProgressEvent::Completed {
                                total_pages: pages,
                                location,
                            },
                        );
                    }
                    Err(e) => tracing::error!("[{}] {}", job.id(), e),
                }
            }
            Err(failure) => {
                let error = failure.to_string();
                match self.finish(&job, || job.fail(error.clone())) {
                    Ok(()) => {
                        tracing::warn!("[{}] Crawl failed: {}", job.id(), error);
                        reporter.report(job.external_ref(), ProgressEvent::Failed { error });
                    }
                    Err(e) => tracing::error!("[{}] {}", job.id(), e),
                }
            }
        }
    }

    /// Applies a terminal transition and frees the admission slot under one
    /// registry lock, so a caller that observes the terminal status can be
    /// admitted straight away
    fn finish<F>(&self, job: &CrawlJob, transition: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut registry = self.registry();
        let result = transition();
        registry.active = registry.active.saturating_sub(1);
        tracing::debug!(
            "[{}] Released admission slot ({} active)",
            job.id(),
            registry.active
        );
        result
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
