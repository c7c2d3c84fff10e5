//! Crawl job record and its snapshots
//!
//! A `CrawlJob` is shared between the manager's registry and the job's own
//! worker pool. Readers only ever see a [`JobSnapshot`] copied under the job
//! lock; mutation methods are crate-private and used by the pool and manager.

use crate::state::JobStatus;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// One stored page of a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub url: String,
    pub storage_path: String,
    pub status_code: u16,
}

/// Immutable crawl parameters, fixed at admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlParams {
    /// Normalized seed URL
    pub seed_url: String,
    /// Page budget, already clamped to the configured ceiling
    pub max_pages: usize,
    /// Number of concurrent fetch workers
    pub thread_count: usize,
    /// Minimum spacing between two fetches of the same worker
    pub delay: Duration,
}

/// Point-in-time copy of a job, as exposed to callers
///
/// `results` is only populated once the job is `COMPLETED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    #[serde(rename = "crawlId")]
    pub id: String,
    pub status: JobStatus,
    pub url: String,
    pub pages_downloaded: usize,
    pub max_pages: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<PageResult>>,
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    pages_downloaded: usize,
    /// Page slots taken by stored pages plus saves still in flight
    reserved: usize,
    results: Vec<PageResult>,
    error: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

/// State machine and accumulated results of one crawl request
#[derive(Debug)]
pub struct CrawlJob {
    id: String,
    external_ref: String,
    params: CrawlParams,
    started_at: DateTime<Utc>,
    state: RwLock<JobState>,
}

impl CrawlJob {
    /// Creates a job in the `PENDING` state
    pub fn new(id: String, external_ref: String, params: CrawlParams) -> Self {
        Self {
            id,
            external_ref,
            params,
            started_at: Utc::now(),
            state: RwLock::new(JobState {
                status: JobStatus::Pending,
                pages_downloaded: 0,
                reserved: 0,
                results: Vec::new(),
                error: None,
                completed_at: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn external_ref(&self) -> &str {
        &self.external_ref
    }

    pub fn params(&self) -> &CrawlParams {
        &self.params
    }

    pub fn pages_downloaded(&self) -> usize {
        self.read().pages_downloaded
    }

    /// Takes a consistent copy of the job
    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.read();
        JobSnapshot {
            id: self.id.clone(),
            status: state.status,
            url: self.params.seed_url.clone(),
            pages_downloaded: state.pages_downloaded,
            max_pages: self.params.max_pages,
            started_at: self.started_at,
            completed_at: state.completed_at,
            error: state.error.clone(),
            results: (state.status == JobStatus::Completed).then(|| state.results.clone()),
        }
    }

    pub(crate) fn mark_running(&self) -> Result<(), HarvestError> {
        self.transition(JobStatus::Running, None)
    }

    pub(crate) fn complete(&self) -> Result<(), HarvestError> {
        self.transition(JobStatus::Completed, None)
    }

    pub(crate) fn fail(&self, error: impl Into<String>) -> Result<(), HarvestError> {
        self.transition(JobStatus::Failed, Some(error.into()))
    }

    fn transition(&self, to: JobStatus, error: Option<String>) -> Result<(), HarvestError> {
        let mut state = self.write();
        if !state.status.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: state.status,
                to,
            });
        }

        state.status = to;
        if to.is_terminal() {
            state.completed_at = Some(Utc::now());
            state.reserved = state.pages_downloaded;
        }
        if to == JobStatus::Failed {
            state.error = Some(error.unwrap_or_else(|| "crawl failed".to_string()));
        }
        Ok(())
    }

    /// Returns true once every page slot is stored or being stored
    pub(crate) fn is_saturated(&self) -> bool {
        let state = self.read();
        state.reserved >= self.params.max_pages
    }

    /// Reserves one page slot before a page is stored
    ///
    /// Fails when the budget is exhausted or the job is not running, in which
    /// case the fetched page must be discarded.
    pub(crate) fn try_reserve_slot(&self) -> bool {
        let mut state = self.write();
        if state.status != JobStatus::Running || state.reserved >= self.params.max_pages {
            return false;
        }
        state.reserved += 1;
        true
    }

    /// Gives back a slot whose page could not be stored
    pub(crate) fn release_slot(&self) {
        let mut state = self.write();
        if state.reserved > state.pages_downloaded {
            state.reserved -= 1;
        }
    }

    /// Records a stored page against a previously reserved slot
    ///
    /// Returns the new page count, or `None` when no reservation was pending
    /// (the result is then dropped so the page budget is never exceeded).
    pub(crate) fn commit_page(&self, result: PageResult) -> Option<usize> {
        let mut state = self.write();
        if state.status != JobStatus::Running || state.pages_downloaded >= state.reserved {
            return None;
        }
        state.results.push(result);
        state.pages_downloaded += 1;
        Some(state.pages_downloaded)
    }

    fn read(&self) -> RwLockReadGuard<'_, JobState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, JobState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
