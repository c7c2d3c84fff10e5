//! HTTP API route definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .route("/crawl", post(handlers::start_crawl))
        .route("/crawl/:crawl_id/status", get(handlers::crawl_status))
        .route("/health", get(handlers::health))
        .with_state(app_state);

    Router::new().nest("/api", api)
}
