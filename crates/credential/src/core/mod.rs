//! Core value types and errors

mod credential;
mod error;

pub use credential::{AuthorizationRequest, Credential, DbAuthorization};
pub use error::{AuthorizationError, ConfigError, DataServiceError, DataServiceResult};
