//! Client Error Types
//!
//! Every failure the session layer can hit, grouped by where it comes from:
//!
//! - `ApiError` - transport, server-reported and malformed-response failures
//! - `StorageError` - durable credential file failures
//! - `SessionError` - the union the session manager works with
//!
//! None of these escape the public session operations. They are turned into a
//! single user-visible message with [`SessionError::user_message`].
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::shared::error::SharedError;

/// Failures talking to the platform API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Server {
        status: StatusCode,
        /// Message extracted from the error body, if any
        message: Option<String>,
    },

    /// A success response whose body does not match the expected schema
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },
}

impl ApiError {
    /// Build a `Server` error from a status and a raw error body
    pub fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|json| error_message(&json));
        Self::Server { status, message }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Message the server put in its error body
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::MalformedResponse { .. } => None,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Validation failures come as `{ errors: [{ message }] }`, everything else as
/// `{ message }`.
fn error_message(json: &Value) -> Option<String> {
    json.get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
        .or_else(|| json.get("message").and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// Failures reading or writing the durable credential tier
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode credentials: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("No durable storage location is available")]
    Unavailable,
}

/// Anything a session operation can fail with
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Invalid(#[from] SharedError),
}

impl SessionError {
    /// Text for the error notification: the server's message when it sent
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SessionError::Api(api) => api.server_message().unwrap_or(fallback).to_string(),
            _ => fallback.to_string(),
        }
    }
}
