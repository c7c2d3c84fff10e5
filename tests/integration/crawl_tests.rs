//! End-to-end crawl tests
//!
//! These tests run real crawls through the manager against wiremock sites
//! and check job snapshots, stored files and admission behavior.

use crate::common::{
    html, local_manager, manager_with, test_crawler_config, wait_for_idle, wait_for_terminal,
    NumberedSite,
};
use harvester::progress::NoopReporter;
use harvester::storage::LocalPageStore;
use harvester::{CrawlRequest, HarvestError, JobStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a four page site: `/` linking to `/a`, `/b` and `/c`
async fn mount_small_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body>
                <a href="/a">A</a>
                <a href="/b/">B</a>
                <a href="/c#section">C</a>
                <a href="https://elsewhere.example/">External</a>
            </body></html>"#,
        ))
        .mount(server)
        .await;

    for (page, links) in [
        ("/a", r#"<a href="/">home</a><a href="/b">b</a>"#),
        ("/b", r#"<a href="/a">a</a><a href="/c">c</a>"#),
        ("/c", r#"<a href="/c">self</a>"#),
    ] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(format!("<html><body>{}</body></html>", links)))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_small_site_is_fully_crawled() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new(format!("{}/", server.uri()), "small-site").with_max_pages(10))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.pages_downloaded, 4);
    assert!(snapshot.completed_at.is_some());
    assert!(snapshot.error.is_none());

    let results = snapshot.results.expect("completed job has results");
    assert_eq!(results.len(), 4);

    let urls: HashSet<String> = results.iter().map(|r| r.url.clone()).collect();
    let expected: HashSet<String> = ["/", "/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    assert_eq!(urls, expected);

    for result in &results {
        assert_eq!(result.status_code, 200);
        let stored = std::fs::read_to_string(&result.storage_path).unwrap();
        assert!(stored.contains("<html>"));
        assert!(result.storage_path.contains(&started.id));
    }
}

#[tokio::test]
async fn test_single_worker_crawls_each_page_once() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(
            CrawlRequest::new(format!("{}/", server.uri()), "single-worker")
                .with_max_pages(10)
                .with_thread_count(1),
        )
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.pages_downloaded, 4);

    let results = snapshot.results.unwrap();
    assert_eq!(results[0].url, format!("{}/", server.uri()));
    let unique: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(unique.len(), 4);
}

#[tokio::test]
async fn test_exhausted_frontier_completes_below_budget() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new(server.uri(), "exhausted").with_max_pages(50))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert!(snapshot.pages_downloaded < snapshot.max_pages);
    assert_eq!(
        snapshot.results.as_ref().map(Vec::len),
        Some(snapshot.pages_downloaded)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_page_budget_is_exact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/(page/\d+)?$"))
        .respond_with(NumberedSite { pages: 500 })
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(
            CrawlRequest::new(format!("{}/", server.uri()), "big-site")
                .with_max_pages(50)
                .with_thread_count(8),
        )
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(30);
    let snapshot = loop {
        let snapshot = manager.get_job(&started.id).unwrap();
        assert!(
            snapshot.pages_downloaded <= snapshot.max_pages,
            "budget exceeded: {} > {}",
            snapshot.pages_downloaded,
            snapshot.max_pages
        );
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        assert!(Instant::now() < deadline, "crawl did not finish");
        tokio::task::yield_now().await;
    };

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.pages_downloaded, 50);

    let results = snapshot.results.unwrap();
    assert_eq!(results.len(), 50);
    let unique: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(unique.len(), 50, "no URL may be stored twice");

    let stored_files = std::fs::read_dir(dir.path().join(&started.id))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .count();
    assert_eq!(stored_files, 50);
}

#[tokio::test]
async fn test_requested_budget_is_clamped() {
    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new("http://127.0.0.1:1/", "clamped").with_max_pages(5000))
        .unwrap();
    assert_eq!(started.max_pages, 1000);
}

#[tokio::test]
async fn test_unreachable_seed_fails() {
    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new("http://127.0.0.1:1/", "unreachable"))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.pages_downloaded, 0);
    assert!(snapshot.error.is_some());
    assert!(snapshot.results.is_none());

    wait_for_idle(&manager).await;
}

#[tokio::test]
async fn test_unhealthy_storage_fails_job_without_crashing() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"occupied").unwrap();

    let manager = manager_with(
        test_crawler_config(3),
        Arc::new(LocalPageStore::new(&blocker)),
        Arc::new(NoopReporter),
    );
    assert!(!manager.storage_healthy().await);

    let started = manager
        .start_crawl(CrawlRequest::new(server.uri(), "bad-storage"))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.pages_downloaded, 0);
    let error = snapshot.error.unwrap();
    assert!(error.contains("Storage"), "unexpected error: {}", error);

    // The manager keeps serving after a failed job.
    wait_for_idle(&manager).await;
    assert!(manager.get_job(&started.id).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admission_respects_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let mut handles = Vec::new();
    for i in 0..12 {
        let manager = manager.clone();
        let seed = format!("{}/?caller={}", server.uri(), i);
        handles.push(tokio::spawn(async move {
            manager.start_crawl(CrawlRequest::new(seed, format!("caller-{}", i)))
        }));
    }

    let mut admitted = Vec::new();
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(snapshot) => admitted.push(snapshot.id),
            Err(HarvestError::Admission { limit }) => {
                assert_eq!(limit, 3);
                rejected += 1;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(admitted.len(), 3);
    assert_eq!(rejected, 9);
    assert_eq!(manager.active_crawls(), 3);

    for id in &admitted {
        let snapshot = wait_for_terminal(&manager, id).await;
        assert_eq!(snapshot.status, JobStatus::Completed);
    }
    wait_for_idle(&manager).await;

    // Capacity is available again once the admitted crawls are done.
    assert!(manager
        .start_crawl(CrawlRequest::new(server.uri(), "after"))
        .is_ok());
}

#[tokio::test]
async fn test_terminal_snapshots_are_stable() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new(server.uri(), "stable"))
        .unwrap();
    let first = wait_for_terminal(&manager, &started.id).await;
    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(first.pages_downloaded, 4);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = manager.get_job(&started.id).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_non_html_pages_are_not_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/doc.pdf">pdf</a><a href="/missing">gone</a><a href="/ok">ok</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>fine</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new(server.uri(), "mixed"))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.pages_downloaded, 2);
}

#[tokio::test]
async fn test_robots_rules_are_honored() {
    let server = MockServer::start().await;
    mount_small_site(&server).await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /b\n"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);

    let started = manager
        .start_crawl(CrawlRequest::new(server.uri(), "robots"))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;

    let urls: Vec<String> = snapshot
        .results
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert_eq!(urls.len(), 3);
    assert!(!urls.iter().any(|u| u.ends_with("/b")));
}
