//! Error handling for the concurrent monitor crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// A specialized `Result` type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for monitor operations.
///
/// Per-sample failures are never represented here; they travel as
/// [`Outcome::Err`](crate::metrics::data::Outcome) inside a result set.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested concurrency is outside `1..=max`
    #[error("Invalid concurrency {requested}: must be between 1 and {max}")]
    InvalidConcurrency { requested: usize, max: usize },

    /// A collection run could not be completed
    #[error("Collection error: {0}")]
    Collection(String),

    /// JSON serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Create a new invalid concurrency error
    pub fn invalid_concurrency(requested: usize, max: usize) -> Self {
        Self::InvalidConcurrency { requested, max }
    }

    /// Create a new collection error
    pub fn collection_error(msg: impl Into<String>) -> Self {
        Self::Collection(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status this error maps to when returned from a handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidConcurrency { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
