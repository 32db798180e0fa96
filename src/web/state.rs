use std::sync::Arc;

use crate::config::AppConfig;

/// Shared state handed to every handler via `axum::extract::State`.
///
/// Read-only; each request builds its own upstream client.
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}
