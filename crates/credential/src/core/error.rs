//! Error types for authorization, backing-store access and configuration

use thiserror::Error;

use crate::operation::OperationError;

/// Failures reported by a [`CredentialDataService`](crate::providers::CredentialDataService)
///
/// Both variants are recoverable: the rotation scheduler leaves the affected
/// database untouched and tries again on its next tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataServiceError {
    /// Backing store failed to read or persist a credential change
    #[error("Persistence error for database '{database}': {reason}")]
    Persistence { database: String, reason: String },

    /// Target database rejected the generated credential
    #[error("Authentication backend rejected credential for database '{database}': {reason}")]
    AuthenticationBackend { database: String, reason: String },
}

impl DataServiceError {
    pub fn persistence(database: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Persistence {
            database: database.into(),
            reason: reason.into(),
        }
    }

    pub fn authentication_backend(database: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthenticationBackend {
            database: database.into(),
            reason: reason.into(),
        }
    }

    /// Database the failure belongs to
    pub fn database(&self) -> &str {
        match self {
            Self::Persistence { database, .. } | Self::AuthenticationBackend { database, .. } => {
                database
            }
        }
    }

    /// Whether the next scheduled tick may succeed
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Result type for backing-store operations
pub type DataServiceResult<T> = Result<T, DataServiceError>;

/// Errors surfaced to authorization callers
///
/// `Clone` because the outcome of a request is stored inside a completed
/// [`AsyncOperation`](crate::operation::AsyncOperation) that any number of
/// waiters may read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    /// Request rejected before any operation was created
    #[error("Invalid authorization request: {reason}")]
    InvalidRequest { reason: String },

    /// Lazy credential generation failed in the backing store
    #[error(transparent)]
    DataService(#[from] DataServiceError),

    /// Contract violation or timeout on the operation handle
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// First request for a database arrived with no Tokio runtime to generate on
    #[error("No async runtime available to issue credential for database '{database}'")]
    RuntimeUnavailable { database: String },
}

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
