//! HTTP API and single-page UI
//!
//! Routes:
//! - `GET /` - embedded UI
//! - `GET /health` - liveness
//! - `GET /api/symbols` - USDT trading pairs
//! - `POST /api/fetch` - candles, summary and chart feed
//! - `POST /api/export/json`, `POST /api/export/csv` - file downloads

pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{response::Html, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
pub use error::WebError;
pub use state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Complete application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(handlers::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn app(config: AppConfig) -> Router {
    router(AppState::new(config))
}

/// Resolves on Ctrl+C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully stopping");
}
