//! DbAuth Credential - short-lived database credentials with background rotation
//!
//! Issues database logins to callers through an asynchronous begin/end
//! protocol while a background scheduler regenerates every tracked
//! credential on a fixed cadence.
//!
//! # Components
//!
//! - [`AsyncOperation`] - pending unit of work with exactly-once completion
//! - [`CredentialStore`] - lock-guarded map of database name to current credential
//! - [`CredentialDataService`] - backing-store seam (the only component doing durable I/O)
//! - [`RotationScheduler`] - timer-driven regeneration of every tracked credential
//! - [`AuthorizationService`] - `begin_authorize` / `end_authorize` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use dbauth_credential::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(InMemoryDataService::new());
//! let service = AuthorizationService::start(ServiceConfig::default(), backend).await?;
//!
//! let operation = service.begin_authorize(AuthorizationRequest::new("Election2024"), None, None)?;
//! let authorization = service.end_authorize(operation).await?;
//! assert_eq!(authorization.database_name(), "Election2024");
//!
//! service.shutdown().await;
//! ```
#![forbid(unsafe_code)]

/// Credential, request and authorization values plus the error taxonomy
pub mod core;
/// Exactly-once completion primitive
pub mod operation;
/// Backing-store trait and the bundled in-memory backend
pub mod providers;
/// Background credential rotation
pub mod rotation;
/// Authorization facade, its configuration and metrics
pub mod service;
/// Guarded in-memory credential table
pub mod store;
/// Secrets and input validation
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::core::{
    AuthorizationError, AuthorizationRequest, ConfigError, Credential, DataServiceError,
    DataServiceResult, DbAuthorization,
};
pub use crate::operation::{AsyncOperation, AsyncState, OperationCallback, OperationError};
pub use crate::providers::{CredentialDataService, InMemoryDataService};
pub use crate::rotation::{RotationConfig, RotationReport, RotationScheduler, RotationStats};
pub use crate::service::{
    AuthorizationService, AuthorizeOperation, AuthorizeOutcome, ServiceConfig, ServiceError,
};
pub use crate::store::CredentialStore;
pub use crate::utils::SecretString;

/// Commonly used types and traits
pub mod prelude {
    pub use crate::core::{
        AuthorizationError, AuthorizationRequest, ConfigError, Credential, DataServiceError,
        DbAuthorization,
    };
    pub use crate::operation::{AsyncOperation, OperationError};
    pub use crate::providers::{CredentialDataService, InMemoryDataService};
    pub use crate::rotation::{RotationConfig, RotationReport, RotationScheduler};
    pub use crate::service::{AuthorizationService, AuthorizeOperation, ServiceConfig};
    pub use crate::store::CredentialStore;
    pub use crate::utils::SecretString;
}
