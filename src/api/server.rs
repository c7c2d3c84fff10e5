//! HTTP API server

use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::handlers::AppState;
use super::routes::create_router;
use crate::crawler::CrawlManager;

/// Builds the full application: routes, state and request tracing
pub fn app(manager: CrawlManager) -> Router {
    create_router(AppState { manager }).layer(TraceLayer::new_for_http())
}

/// Serves the API on `listener` until `shutdown` resolves
///
/// In-flight requests are allowed to finish; crawls keep running on their
/// own tasks and are not affected by the server stopping.
pub async fn serve<F>(listener: TcpListener, manager: CrawlManager, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    tracing::info!("HTTP API listening on http://{}", addr);

    axum::serve(listener, app(manager))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
