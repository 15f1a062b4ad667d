//! Error types for batch negotiation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type for batch server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while negotiating a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body violates the batch API contract.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The request body is not a JSON object at all.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The URL issuer failed unexpectedly.
    #[error("backend fault: {0}")]
    Backend(String),

    /// OID parsing error
    #[error("invalid OID: {0}")]
    InvalidOid(String),

    /// HTTP request to the storage provider failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid process configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => Error::Http(format!("storage returned status {}", code)),
            other => Error::Http(other.to_string()),
        }
    }
}

/// JSON error body, `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl Error {
    /// HTTP status code this error is surfaced as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal faults stay opaque.
    fn public_message(&self) -> String {
        match self {
            Self::MalformedRequest(msg) | Self::InvalidBody(msg) => msg.clone(),
            _ => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "batch request failed");
        } else {
            tracing::debug!(error = %self, "rejected batch request");
        }

        let body = ErrorResponse {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
