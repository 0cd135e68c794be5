//! Error types for backend calls

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Http,
    Transport,
    Malformed,
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Required input missing; raised before any request is sent
    #[error("{0}")]
    Validation(String),

    /// Backend answered with a non-2xx status
    #[error("{status} - {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (offline, DNS, refused, timeout)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The body was not the JSON shape expected. `raw` holds the body text.
    #[error("Invalid response format: {reason}")]
    Malformed { reason: String, raw: String },

    /// The owning dashboard was torn down while the request was in flight
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Http { .. } => ErrorKind::Http,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Malformed { .. } => ErrorKind::Malformed,
            ApiError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Raw response text for malformed bodies
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            ApiError::Malformed { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Build an HTTP error from a failed response. Uses the body's `detail`
    /// when there is one, else the status reason phrase.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = detail_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string()
        });
        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("request timed out: {}", err))
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Pull a human message out of an error body.
///
/// FastAPI sends either `{"detail": "text"}` or, for validation failures,
/// `{"detail": [{"msg": "...", ...}, ...]}`.
pub(crate) fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
