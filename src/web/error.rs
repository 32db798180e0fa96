use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::FetchError;
use crate::log_error;
use crate::types::ErrorBody;

/// Error returned by route handlers; rendered as `{success: false, error}`.
#[derive(Debug)]
pub struct WebError(pub FetchError);

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for WebError {}

impl WebError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log_error!("web", "Request failed", code = format!("{:?}", self.0.code), error = self.0);
        }
        (status, axum::Json(ErrorBody::new(self.0.to_string()))).into_response()
    }
}

impl From<FetchError> for WebError {
    fn from(e: FetchError) -> Self {
        Self(e)
    }
}

impl From<serde_json::Error> for WebError {
    fn from(e: serde_json::Error) -> Self {
        Self(FetchError::from(e))
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self(FetchError::internal(format!("Worker task failed: {}", e)))
    }
}
