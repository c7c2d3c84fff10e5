//! Progress reporting through a full crawl

use crate::common::{html, manager_with, test_crawler_config, wait_for_idle, wait_for_terminal};
use harvester::progress::create_reporter;
use harvester::storage::LocalPageStore;
use harvester::{CrawlRequest, JobStatus};
use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn test_crawl_milestones_are_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/next">next</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html("<p>end</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db = dir.path().join("progress.db");
    let pages = dir.path().join("pages");

    let manager = manager_with(
        test_crawler_config(2),
        Arc::new(LocalPageStore::new(&pages)),
        create_reporter(Some(&format!("sqlite://{}", db.display()))),
    );

    let started = manager
        .start_crawl(CrawlRequest::new(server.uri(), "detail-7"))
        .unwrap();
    let snapshot = wait_for_terminal(&manager, &started.id).await;
    assert_eq!(snapshot.status, JobStatus::Completed);

    wait_for_idle(&manager).await;
    manager.shutdown().await;

    let conn = Connection::open(&db).unwrap();
    let (status, crawled, total, location): (String, i64, i64, String) = conn
        .query_row(
            "SELECT status, pages_crawled, total_pages, crawled_pages_path
             FROM crawl_progress WHERE job_ref = 'detail-7'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();

    assert_eq!(status, "COMPLETED");
    assert_eq!(crawled, 2);
    assert_eq!(total, 2);
    assert_eq!(location, pages.join(&started.id).to_string_lossy());

    let mut stmt = conn
        .prepare("SELECT event FROM progress_events WHERE job_ref = 'detail-7' ORDER BY id")
        .unwrap();
    let events: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        events,
        vec!["started", "page_crawled", "page_crawled", "completed"]
    );
}

#[tokio::test]
async fn test_failed_crawl_is_recorded() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("progress.db");

    let manager = manager_with(
        test_crawler_config(2),
        Arc::new(LocalPageStore::new(dir.path().join("pages"))),
        create_reporter(db.to_str()),
    );

    let started = manager
        .start_crawl(CrawlRequest::new("http://127.0.0.1:1/", "detail-8"))
        .unwrap();
    wait_for_terminal(&manager, &started.id).await;
    wait_for_idle(&manager).await;
    manager.shutdown().await;

    let conn = Connection::open(&db).unwrap();
    let (status, error): (String, Option<String>) = conn
        .query_row(
            "SELECT status, error_message FROM crawl_progress WHERE job_ref = 'detail-8'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();

    assert_eq!(status, "FAILED");
    assert!(error.is_some());
}
