//! Shared Error Types
//!
//! Errors that can be raised before any request leaves the client: form
//! validation and missing session context.
//!
//! # Usage
//!
//! ```rust
//! use rehab_portal::shared::error::SharedError;
//!
//! let error = SharedError::validation("email", "Provide either an email or a phone number");
//! ```
use thiserror::Error;

/// Client-side failures that never reach the network
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Input failed validation
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// An operation needs session data that is not there yet
    #[error("Missing session data: {what}")]
    MissingSessionData {
        /// What the operation expected to find
        what: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new missing session data error
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingSessionData { what: what.into() }
    }
}
