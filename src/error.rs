//! Unified error types for the fetcher
//!
//! Every stage of the pipeline (resolve, fetch, enrich, export) reports
//! failures through `FetchError` so the CLI and the web service can surface
//! the same message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all fetcher operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl FetchError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, msg)
    }

    /// Non-success HTTP status; the upstream body is kept verbatim.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamStatus, format!("{} - {}", status, body.into()))
    }

    /// Error code embedded in an otherwise successful response body.
    pub fn api_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiError, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoData, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Io, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Prefix the message with the operation that failed, keeping the code.
    pub fn context(mut self, what: &str) -> Self {
        self.message = format!("{}: {}", what, self.message);
        self
    }

    pub fn is_no_data(&self) -> bool {
        self.code == ErrorCode::NoData
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for FetchError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Caller errors
    InvalidInput,
    Config,

    // Upstream errors
    UpstreamStatus,
    ApiError,
    NetworkError,
    Timeout,

    // Payload errors
    ParseError,
    JsonError,
    NoData,

    // Local
    Io,
    Internal,
}

impl ErrorCode {
    /// HTTP status used by the web service for this kind of failure
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput | ErrorCode::Config | ErrorCode::NoData => 400,
            _ => 500,
        }
    }
}

/// Result type alias for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

// Conversions from common error types

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::new(ErrorCode::Io, e.to_string())
    }
}

impl From<csv::Error> for FetchError {
    fn from(e: csv::Error) -> Self {
        FetchError::new(ErrorCode::Io, format!("CSV error: {}", e))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            FetchError::new(ErrorCode::NetworkError, "Connection failed")
        } else if e.is_decode() {
            FetchError::new(ErrorCode::ParseError, e.to_string())
        } else {
            FetchError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}
