//! HTTP API tests
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`.

use crate::common::{html, local_manager, manager_with, test_crawler_config, wait_for_terminal};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use harvester::progress::NoopReporter;
use harvester::storage::LocalPageStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_crawl(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/crawl")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_start_and_poll_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>single page</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);
    let app = harvester::api::app(manager.clone());

    let body = json!({
        "url": server.uri(),
        "maxPages": 5,
        "threadCount": 2,
        "delayMs": 0,
        "externalRef": "detail-42",
    });
    let (status, started) = send(&app, post_crawl(body.to_string())).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(started["status"], "PENDING");
    assert!(started["message"].is_string());
    let crawl_id = started["crawlId"].as_str().unwrap().to_string();

    wait_for_terminal(&manager, &crawl_id).await;

    let (status, snapshot) = send(&app, get(&format!("/api/crawl/{}/status", crawl_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["crawlId"], crawl_id.as_str());
    assert_eq!(snapshot["status"], "COMPLETED");
    assert_eq!(snapshot["pagesDownloaded"], 1);
    assert_eq!(snapshot["maxPages"], 5);
    assert!(snapshot["startedAt"].is_i64());
    assert!(snapshot["completedAt"].is_i64());
    assert_eq!(snapshot["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(snapshot["results"][0]["statusCode"], 200);
    assert!(snapshot["results"][0]["storagePath"].is_string());
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 3);
    let app = harvester::api::app(manager.clone());

    let (status, body) = send(
        &app,
        post_crawl(json!({ "externalRef": "r" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("url"));

    let (status, body) = send(
        &app,
        post_crawl(json!({ "url": "https://example.com" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, post_crawl("{not json".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(manager.active_crawls(), 0);
}

#[tokio::test]
async fn test_capacity_exceeded_returns_429() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(1)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = local_manager(dir.path(), 1);
    let app = harvester::api::app(manager.clone());

    let body = json!({ "url": server.uri(), "externalRef": "first", "delayMs": 0 });
    let (status, _) = send(&app, post_crawl(body.to_string())).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let body = json!({ "url": server.uri(), "externalRef": "second", "delayMs": 0 });
    let (status, body) = send(&app, post_crawl(body.to_string())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("Max concurrent crawls"));
}

#[tokio::test]
async fn test_unknown_crawl_returns_404() {
    let dir = TempDir::new().unwrap();
    let app = harvester::api::app(local_manager(dir.path(), 3));

    let (status, body) = send(&app, get("/api/crawl/does-not-exist/status")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health_reports_storage() {
    let dir = TempDir::new().unwrap();
    let app = harvester::api::app(local_manager(dir.path(), 3));

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
    assert_eq!(body["storage"], "healthy");
    assert_eq!(body["storageType"], "local");
    assert_eq!(body["activeCrawls"], 0);

    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file").unwrap();
    let app = harvester::api::app(manager_with(
        test_crawler_config(3),
        Arc::new(LocalPageStore::new(&blocker)),
        Arc::new(NoopReporter),
    ));

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "DOWN");
    assert_eq!(body["storage"], "unhealthy");
}
