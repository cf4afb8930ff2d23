use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Everything that can go wrong in the pipeline. One flat taxonomy,
/// translated at the boundary: HTTP status + JSON body on the synchronous
/// path, a single error frame followed by teardown on the streaming path.
#[derive(Debug)]
pub enum AppError {
    FileNotFound(String),
    FileTooLarge(usize),
    FileAccess(std::io::Error),

    SamplingFailed(String),
    InvalidSampleSize(usize),

    Internal(anyhow::Error),
    BadRequest(String),

    ConnectionClosed,
    InvalidMessage,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FileNotFound(id) => write!(f, "File not found: {}", id),
            Self::FileTooLarge(size) => write!(f, "File too large: {} bytes", size),
            Self::FileAccess(e) => write!(f, "File access error: {}", e),
            Self::SamplingFailed(msg) => write!(f, "Sampling failed: {}", msg),
            Self::InvalidSampleSize(size) => write!(f, "Invalid sample size: {}", size),
            Self::Internal(e) => write!(f, "Internal error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::ConnectionClosed => write!(f, "Connection closed"),
            Self::InvalidMessage => write!(f, "Invalid message format"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Status for the HTTP boundary; the same numeric code goes into
    /// streaming error frames so both surfaces report identically.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::FileAccess(_) => StatusCode::FORBIDDEN,
            Self::InvalidSampleSize(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidMessage => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Fast-fail: report precisely, no degraded fallback.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
