//! Politeness delays between fetches
//!
//! Each worker spaces its own requests; workers of the same crawl do not
//! coordinate with each other.

use crate::robots::ParsedRobots;
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound honored for a robots.txt Crawl-delay
const MAX_ROBOTS_DELAY: Duration = Duration::from_secs(30);

/// Calculates the delay a crawl's workers keep between fetches
///
/// This takes the maximum of:
/// - The delay requested for the crawl
/// - The robots.txt Crawl-delay for the user agent (capped at 30s)
///
/// # Arguments
///
/// * `requested` - Delay from the crawl request
/// * `robots` - The site's robots.txt rules
/// * `agent` - User agent token matched against robots.txt groups
pub fn effective_delay(requested: Duration, robots: &ParsedRobots, agent: &str) -> Duration {
    let robots_delay = robots
        .crawl_delay(agent)
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .map(Duration::from_secs_f64)
        .map(|d| d.min(MAX_ROBOTS_DELAY))
        .unwrap_or(Duration::ZERO);

    requested.max(robots_delay)
}

/// Per-worker request spacing
#[derive(Debug)]
pub(crate) struct Politeness {
    delay: Duration,
    last_fetch: Option<Instant>,
}

impl Politeness {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fetch: None,
        }
    }

    /// Sleeps until `delay` has passed since this worker's previous fetch
    ///
    /// The first fetch of a worker is not delayed.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_fetch {
            tokio::time::sleep_until(last + self.delay).await;
        }
        self.last_fetch = Some(Instant::now());
    }
}
