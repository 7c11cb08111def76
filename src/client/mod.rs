//! Client Module
//!
//! Headless client for the platform API: session state, credential storage
//! and the typed calls behind the customer and admin screens.
//!
//! # Architecture
//!
//! - **`config`** - API URL, storage location, auth header scheme
//! - **`types`** - request/response schemas and form inputs
//! - **`error`** - API, storage and session error types
//! - **`api`** - `reqwest` client for every endpoint
//! - **`storage`** - durable and volatile credential tiers
//! - **`session`** - session state and the observable store
//! - **`notify`** / **`navigation`** - seams the hosting UI implements
//! - **`auth`** - the session manager
//! - **`orders`** - order status stepper and rental listing
//! - **`products`** / **`team`** - admin product editor and team member form
//! - **`upload`** - image files for multipart forms
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rehab_portal::client::{
//!     Config, LoginCredentials, LoggingNavigator, SessionManager, TracingNotifier,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = SessionManager::from_config(
//!     Config::from_env()?,
//!     Arc::new(TracingNotifier),
//!     Arc::new(LoggingNavigator),
//! )?;
//! manager.initialize_auth().await;
//! if !manager.store().is_authenticated() {
//!     manager.login(LoginCredentials::new("a@b.com", "secret", true)).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod orders;
pub mod products;
pub mod session;
pub mod storage;
pub mod team;
pub mod types;
pub mod upload;

// Re-export commonly used types
pub use api::ApiClient;
pub use auth::SessionManager;
pub use config::Config;
pub use error::{ApiError, SessionError, StorageError};
pub use navigation::{LoggingNavigator, Navigator, RecordingNavigator, Route};
pub use notify::{Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier};
pub use orders::{status_steps, Order, OrderStatus, RentalFilter, RentalPage, StepState};
pub use products::{Category, Product, ProductForm, ProductType, ProductUpdate};
pub use session::{LoadingFlags, Operation, Session, SessionStatus, SessionStore};
pub use storage::{CredentialPair, CredentialStore, FileStore, KeyValueStore, MemoryStore, StorageTier};
pub use team::{Location, NewTeamMember, TeamMemberForm};
pub use types::{
    ContactMethod, ForgotPasswordRequest, LoginCredentials, Registration, ResetPasswordRequest,
    UserId, UserProfile,
};
pub use upload::ImageUpload;
