//! Guarded in-memory credential table
//!
//! [`CredentialStore`] maps a logical database name to its current
//! [`Credential`]. Every read, write and iteration happens under one
//! `parking_lot::RwLock`; values are `Arc`-shared and replaced wholesale, so
//! a reader observes one generation or the next, never a mix.
//!
//! The lock only guards memory. Callers must finish any backing-store I/O
//! before calling in, and nothing here calls back into the service.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::Credential;

/// Current credential per database
#[derive(Debug, Default)]
pub struct CredentialStore {
    entries: RwLock<HashMap<String, Arc<Credential>>>,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with credentials, keyed by their database name
    pub fn seeded(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let entries = credentials
            .into_iter()
            .map(|credential| (credential.database_name().to_owned(), Arc::new(credential)))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Current credential for `database`, or `None` if it has never been issued
    pub fn get(&self, database: &str) -> Option<Arc<Credential>> {
        self.entries.read().get(database).cloned()
    }

    /// Replace the entry for `database`, returning the superseded value
    pub fn set(
        &self,
        database: impl Into<String>,
        credential: impl Into<Arc<Credential>>,
    ) -> Option<Arc<Credential>> {
        self.entries
            .write()
            .insert(database.into(), credential.into())
    }

    /// Store `credential` only if `database` has no entry yet
    ///
    /// Returns whichever value is current afterwards.
    pub fn insert_if_absent(
        &self,
        database: impl Into<String>,
        credential: impl Into<Arc<Credential>>,
    ) -> Arc<Credential> {
        Arc::clone(
            self.entries
                .write()
                .entry(database.into())
                .or_insert_with(|| credential.into()),
        )
    }

    /// Replace many entries inside one critical section
    ///
    /// Readers see either none or all of the batch. Returns the number of
    /// entries written.
    pub fn set_many<I, C>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = (String, C)>,
        C: Into<Arc<Credential>>,
    {
        let mut entries = self.entries.write();
        let mut written = 0;
        for (database, credential) in batch {
            entries.insert(database, credential.into());
            written += 1;
        }
        written
    }

    /// Apply `f` to every entry while holding the write lock once
    ///
    /// `f` may swap the `Arc` for a new credential. It must not call back into
    /// the store.
    pub fn for_each_locked<F>(&self, mut f: F)
    where
        F: FnMut(&str, &mut Arc<Credential>),
    {
        let mut entries = self.entries.write();
        for (database, credential) in entries.iter_mut() {
            f(database, credential);
        }
    }

    pub fn remove(&self, database: &str) -> Option<Arc<Credential>> {
        self.entries.write().remove(database)
    }

    pub fn contains(&self, database: &str) -> bool {
        self.entries.read().contains_key(database)
    }

    /// Snapshot of the tracked database names, sorted
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Snapshot of every current credential
    pub fn snapshot(&self) -> Vec<Arc<Credential>> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
