//! Request handlers for the crawl API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::{CrawlStartedResponse, ErrorResponse, HealthResponse};
use crate::crawler::{CrawlManager, CrawlRequest};
use crate::HarvestError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub manager: CrawlManager,
}

fn error_response(error: HarvestError) -> Response {
    let message = error.to_string();
    let (status, body) = match error {
        HarvestError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message)),
        HarvestError::Admission { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse::new("TOO_MANY_CRAWLS", message),
        ),
        HarvestError::JobNotFound(_) => {
            (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", message))
        }
        HarvestError::InvalidTransition { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::internal_error(message),
        ),
    };
    (status, Json(body)).into_response()
}

/// Start a crawl
pub async fn start_crawl(
    State(state): State<AppState>,
    body: Result<Json<CrawlRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!("Rejected crawl request body: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(rejection.body_text())),
            )
                .into_response();
        }
    };

    match state.manager.start_crawl(request) {
        Ok(snapshot) => (
            StatusCode::ACCEPTED,
            Json(CrawlStartedResponse::new(snapshot.id, snapshot.status)),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Get the current snapshot of a crawl
pub async fn crawl_status(
    State(state): State<AppState>,
    Path(crawl_id): Path<String>,
) -> Response {
    match state.manager.get_job(&crawl_id) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check: storage reachability and admission load
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.manager.storage_healthy().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "UP" } else { "DOWN" }.to_string(),
            storage: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            storage_type: state.manager.storage_kind().to_string(),
            active_crawls: state.manager.active_crawls(),
            max_concurrent_crawls: state.manager.max_concurrent_crawls(),
        }),
    )
}
