//! HTTP request boundary
//!
//! - `POST /api/crawl` starts a crawl (`202`, `400`, `429`)
//! - `GET /api/crawl/:id/status` returns a crawl snapshot (`200`, `404`)
//! - `GET /api/health` reports storage health and load (`200`, `503`)

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::{app, serve};
