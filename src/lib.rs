//! Rehab Portal - Client Library
//!
//! Client core for the rehabilitation-center shop and rental platform. The
//! platform's business logic lives behind its REST API; this crate is the
//! layer a front-end sits on:
//!
//! - Session management: bootstrap from saved credentials, login, registration,
//!   email/phone verification, password recovery and logout
//! - Credential storage in a durable tier and a volatile tier
//! - Typed API schemas validated at the boundary
//! - Order status stepper and rental order listing for the admin screens
//! - Product editing and team member creation for the admin screens, sent as
//!   multipart uploads
//!
//! # Module Structure
//!
//! - **`shared`** - configuration and error types with no HTTP dependency
//! - **`client`** - API client, session store, session manager, orders
//!
//! # Thread Safety
//!
//! The session store is a `tokio::sync::watch` channel. Operations can run
//! concurrently on one runtime; each tracks its own loading flag.
//!
//! # Error Handling
//!
//! Errors are `thiserror` enums per layer. Session operations never return
//! them: they log the failure and show one notification.

/// Shared configuration and error types
pub mod shared;

/// API client and session management
pub mod client;
