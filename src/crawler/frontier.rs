//! Per-job crawl frontier
//!
//! The frontier owns the FIFO queue of URLs still to fetch, the set of every
//! URL ever enqueued and the number of URLs handed to workers but not yet
//! finished. A URL is marked visited when it is enqueued, so no URL is ever
//! queued twice within one job.
//!
//! Workers that find the queue empty while others still have work in flight
//! park on a [`Notify`] and are woken whenever a worker finishes a URL.

use crate::state::CrawlJob;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    in_flight: usize,
}

/// Queue of pending URLs shared by the workers of one crawl
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

impl Frontier {
    /// Creates a frontier holding only `seed`
    pub fn with_seed(seed: String) -> Self {
        let frontier = Self::default();
        {
            let mut state = frontier.lock();
            state.visited.insert(seed.clone());
            state.queue.push_back(seed);
        }
        frontier
    }

    /// Hands out the next URL to fetch
    ///
    /// Waits while the queue is empty but other workers may still discover
    /// links. Returns `None` once the job's page budget is saturated or the
    /// queue is empty with nothing in flight; the caller's worker then exits.
    ///
    /// Every `Some` must be matched by exactly one call to [`Frontier::complete`].
    pub async fn next(&self, job: &CrawlJob) -> Option<String> {
        loop {
            let notified = {
                let mut state = self.lock();

                if job.is_saturated() {
                    return None;
                }

                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(url);
                }

                if state.in_flight == 0 {
                    // Nobody can add work anymore; release every parked worker.
                    self.notify.notify_waiters();
                    return None;
                }

                // Created under the lock so a concurrent `complete` cannot be missed.
                self.notify.notified()
            };

            notified.await;
        }
    }

    /// Finishes a URL handed out by [`Frontier::next`] and enqueues its unseen links
    ///
    /// # Returns
    ///
    /// The number of links that were new to this crawl
    pub fn complete(&self, links: Vec<String>) -> usize {
        let added = {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);

            let mut added = 0;
            for link in links {
                if state.visited.insert(link.clone()) {
                    state.queue.push_back(link);
                    added += 1;
                }
            }
            added
        };

        self.notify.notify_waiters();
        added
    }

    /// Number of distinct URLs this crawl has enqueued so far
    pub fn discovered(&self) -> usize {
        self.lock().visited.len()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
