//! Shared helpers for integration tests

use harvester::config::CrawlerConfig;
use harvester::crawler::{build_http_client, CrawlManager};
use harvester::progress::{NoopReporter, ProgressReporter};
use harvester::storage::{LocalPageStore, PageStore};
use harvester::JobSnapshot;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{Request, Respond, ResponseTemplate};

/// Crawler settings suited to tests: no politeness delay, short timeouts
pub fn test_crawler_config(max_concurrent_crawls: usize) -> CrawlerConfig {
    CrawlerConfig {
        max_concurrent_crawls,
        default_delay_ms: 0,
        request_timeout_secs: 5,
        user_agent: "TestBot/1.0".to_string(),
        ..CrawlerConfig::default()
    }
}

pub fn manager_with(
    config: CrawlerConfig,
    store: Arc<dyn PageStore>,
    reporter: Arc<dyn ProgressReporter>,
) -> CrawlManager {
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.request_timeout_secs),
    )
    .expect("Failed to build HTTP client");
    CrawlManager::new(config, client, store, reporter)
}

/// Manager storing pages under `dir` with progress reporting disabled
pub fn local_manager(dir: &Path, max_concurrent_crawls: usize) -> CrawlManager {
    manager_with(
        test_crawler_config(max_concurrent_crawls),
        Arc::new(LocalPageStore::new(dir)),
        Arc::new(NoopReporter),
    )
}

/// Polls a job until it reaches a terminal state
pub async fn wait_for_terminal(manager: &CrawlManager, id: &str) -> JobSnapshot {
    for _ in 0..600 {
        let snapshot = manager.get_job(id).expect("job should be registered");
        if snapshot.status.is_terminal() {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("crawl {} did not finish in time", id);
}

/// Waits until the manager has released every admission slot
pub async fn wait_for_idle(manager: &CrawlManager) {
    for _ in 0..200 {
        if manager.active_crawls() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("admission slots were not released");
}

pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html; charset=utf-8")
}

/// A large synthetic site: `/` links to pages 1..=5 and `/page/n` links to
/// `5n+1..=5n+5`, up to `pages` pages in total
pub struct NumberedSite {
    pub pages: usize,
}

impl Respond for NumberedSite {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let current: usize = request
            .url
            .path()
            .trim_start_matches("/page/")
            .parse()
            .unwrap_or(0);

        let links: String = (current * 5 + 1..=current * 5 + 5)
            .filter(|n| *n <= self.pages)
            .map(|n| format!(r#"<a href="/page/{}">page {}</a>"#, n, n))
            .collect();

        html(format!("<html><body><h1>{}</h1>{}</body></html>", current, links))
    }
}
