//! Common test utilities and helpers
//!
//! - Mock API server wiring for the session manager
//! - Response bodies the platform API sends

#![allow(dead_code)]

pub mod auth_helpers;
pub mod mock_server;

pub use auth_helpers::*;
pub use mock_server::*;
