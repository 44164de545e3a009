//! In-memory credential backend
//!
//! Keeps issued logins per database in process memory. Used by the CLI host
//! and throughout the test suite; supports failure injection and an
//! artificial latency so asynchronous completion paths can be exercised.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use super::CredentialDataService;
use crate::core::{Credential, DataServiceError, DataServiceResult};

/// Which failure an injected fault reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Persistence,
    AuthenticationBackend,
}

#[derive(Debug, Default)]
struct DatabaseLogins {
    generation: u64,
    current: Option<Credential>,
    active_users: BTreeSet<String>,
}

/// Process-local [`CredentialDataService`]
///
/// Logins follow `<database>_u<generation>` (lower-cased database name);
/// passwords are 32 hex characters of fresh UUIDv4 entropy.
#[derive(Debug, Default)]
pub struct InMemoryDataService {
    databases: Mutex<HashMap<String, DatabaseLogins>>,
    failing: DashMap<String, FailureKind>,
    latency: Option<Duration>,
    regenerate_calls: AtomicU64,
    delete_calls: AtomicU64,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every regeneration by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every call touching `database` fail with `kind` until recovered
    pub fn fail_database(&self, database: impl Into<String>, kind: FailureKind) {
        self.failing.insert(database.into(), kind);
    }

    pub fn recover_database(&self, database: &str) {
        self.failing.remove(database);
    }

    /// Logins still accepted by `database`, sorted
    pub fn active_users(&self, database: &str) -> Vec<String> {
        self.databases
            .lock()
            .get(database)
            .map(|logins| logins.active_users.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn regenerate_calls(&self) -> u64 {
        self.regenerate_calls.load(Ordering::Relaxed)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::Relaxed)
    }

    fn check_fault(&self, database: &str) -> DataServiceResult<()> {
        match self.failing.get(database).map(|kind| *kind) {
            None => Ok(()),
            Some(FailureKind::Persistence) => Err(DataServiceError::persistence(
                database,
                "backing store unavailable",
            )),
            Some(FailureKind::AuthenticationBackend) => Err(
                DataServiceError::authentication_backend(database, "login rejected by database"),
            ),
        }
    }
}

#[async_trait]
impl CredentialDataService for InMemoryDataService {
    async fn regenerate_credential(&self, database: &str) -> DataServiceResult<Credential> {
        self.regenerate_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_fault(database)?;

        let mut databases = self.databases.lock();
        let logins = databases.entry(database.to_owned()).or_default();
        logins.generation += 1;

        let login = format!("{}_u{}", database.to_lowercase(), logins.generation);
        let password = Uuid::new_v4().simple().to_string();
        let credential = Credential::new(database, login.clone(), password);

        logins.active_users.insert(login);
        logins.current = Some(credential.clone());

        tracing::debug!(
            database,
            login = credential.login(),
            generation = logins.generation,
            "Regenerated database login"
        );

        Ok(credential)
    }

    async fn lookup_current_database_user(
        &self,
        database: &str,
    ) -> DataServiceResult<Option<String>> {
        self.check_fault(database)?;

        Ok(self
            .databases
            .lock()
            .get(database)
            .and_then(|logins| logins.current.as_ref())
            .map(|credential| credential.login().to_owned()))
    }

    async fn delete_user(&self, database: &str, user: &str) -> DataServiceResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        self.check_fault(database)?;

        Ok(self
            .databases
            .lock()
            .get_mut(database)
            .is_some_and(|logins| logins.active_users.remove(user)))
    }

    async fn list_all_issued_credentials(&self) -> DataServiceResult<Vec<Credential>> {
        let mut issued: Vec<Credential> = self
            .databases
            .lock()
            .values()
            .filter_map(|logins| logins.current.clone())
            .collect();
        issued.sort_by(|a, b| a.database_name().cmp(b.database_name()));
        Ok(issued)
    }
}
