//! Shared Module
//!
//! Configuration and error types that do not depend on the HTTP client, so
//! they can be used by any front-end built on this crate.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
