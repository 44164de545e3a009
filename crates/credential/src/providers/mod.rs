//! Backing-store seam
//!
//! [`CredentialDataService`] is the only component allowed to perform
//! durable I/O. The store and the authorization service never touch the
//! backing database directly.
//!
//! Implementations must tolerate concurrent calls from distinct callers
//! (request tasks and the rotation loop). A backend that cannot must
//! serialize internally.

mod memory;

pub use memory::{FailureKind, InMemoryDataService};

use async_trait::async_trait;

use crate::core::{Credential, DataServiceResult};

/// Persists and reads credential changes against a concrete backing store
///
/// # Example
///
/// ```rust,ignore
/// use dbauth_credential::prelude::*;
///
/// #[async_trait]
/// impl CredentialDataService for PostgresLogins {
///     async fn regenerate_credential(&self, database: &str) -> DataServiceResult<Credential> {
///         let login = format!("{database}_{}", self.next_suffix());
///         let password = generate_password();
///         self.admin.create_login(database, &login, &password).await
///             .map_err(|e| DataServiceError::persistence(database, e.to_string()))?;
///         Ok(Credential::new(database, login, password))
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait CredentialDataService: Send + Sync {
    /// Generate a new login/password and persist it so the database accepts it
    async fn regenerate_credential(&self, database: &str) -> DataServiceResult<Credential>;

    /// Login last issued for `database`, or `None` if none was ever issued
    async fn lookup_current_database_user(&self, database: &str)
    -> DataServiceResult<Option<String>>;

    /// Remove `user` from `database`; `false` if it did not exist
    async fn delete_user(&self, database: &str, user: &str) -> DataServiceResult<bool>;

    /// Every credential currently issued, one per database
    async fn list_all_issued_credentials(&self) -> DataServiceResult<Vec<Credential>>;
}
