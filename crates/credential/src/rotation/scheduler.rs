//! Rotation Scheduler
//!
//! Drives periodic regeneration of every tracked credential.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::{ConfigError, Credential};
use crate::providers::CredentialDataService;
use crate::rotation::config::{MIN_ROTATION_INTERVAL, RotationConfig};
use crate::rotation::report::{RotationCounters, RotationFailure, RotationReport, RotationStats};
use crate::store::CredentialStore;

/// Periodic rotation scheduler
///
/// Each tick regenerates the configured databases plus every database the
/// store already tracks, then swaps the successes into the store in one
/// critical section. A database whose regeneration fails keeps its previous
/// credential until a later tick succeeds.
///
/// Ticks never overlap: a tick that is still running when the next one is due
/// causes that one to be skipped, not queued. On-demand
/// [`rotate_now`](Self::rotate_now) calls share the same guard.
///
/// The scheduler holds only a [`Weak`] reference to the store; once the
/// owner drops it the loop winds down on its next tick.
///
/// # Example
///
/// ```rust,ignore
/// use dbauth_credential::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let store = Arc::new(CredentialStore::new());
/// let backend = Arc::new(InMemoryDataService::new());
/// let scheduler = RotationScheduler::new(
///     RotationConfig::new(Duration::from_secs(60)).with_databases(["Election2024"]),
///     &store,
///     backend,
/// )?;
///
/// scheduler.start();
/// // ...
/// scheduler.stop().await;
/// ```
pub struct RotationScheduler {
    inner: Arc<SchedulerInner>,
    running: Mutex<Option<RunningLoop>>,
}

struct SchedulerInner {
    config: RotationConfig,
    store: Weak<CredentialStore>,
    data_service: Arc<dyn CredentialDataService>,
    /// Serializes ticks; never held while the store lock is contended by us
    tick_guard: tokio::sync::Mutex<()>,
    counters: RotationCounters,
}

struct RunningLoop {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Regenerated credential plus the login it supersedes
struct Regenerated {
    credential: Credential,
    superseded_user: Option<String>,
}

impl RotationScheduler {
    /// Create a stopped scheduler
    ///
    /// Rejects a zero interval. A non-zero interval below
    /// [`MIN_ROTATION_INTERVAL`] is raised to it.
    pub fn new(
        config: RotationConfig,
        store: &Arc<CredentialStore>,
        data_service: Arc<dyn CredentialDataService>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        if config.interval < MIN_ROTATION_INTERVAL {
            tracing::warn!(
                requested_ms = config.interval.as_millis() as u64,
                minimum_ms = MIN_ROTATION_INTERVAL.as_millis() as u64,
                "Rotation interval below minimum, clamping"
            );
        }

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                config,
                store: Arc::downgrade(store),
                data_service,
                tick_guard: tokio::sync::Mutex::new(()),
                counters: RotationCounters::default(),
            }),
            running: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RotationConfig {
        &self.inner.config
    }

    /// Spawn the background loop
    ///
    /// No-op while a loop is already running. Must be called inside a Tokio
    /// runtime.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            tracing::debug!("Rotation loop already running");
            return;
        }

        let shutdown = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let token = shutdown.clone();
        let handle = tokio::spawn(async move { inner.run_loop(token).await });

        tracing::info!(
            initial_delay_ms = self.inner.config.initial_delay.as_millis() as u64,
            interval_ms = self.inner.config.effective_interval().as_millis() as u64,
            databases = self.inner.config.databases.len(),
            "Rotation scheduler started"
        );

        *running = Some(RunningLoop { shutdown, handle });
    }

    /// Stop the background loop
    ///
    /// A tick already in progress finishes before this returns. Calling
    /// `stop` on a stopped scheduler does nothing.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        running.shutdown.cancel();
        if let Err(e) = running.handle.await {
            tracing::error!(error = %e, "Rotation loop terminated abnormally");
        }
        tracing::info!("Rotation scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Run one rotation batch now
    ///
    /// Waits for an in-flight tick to finish first. Returns `None` if the
    /// store has been dropped.
    pub async fn rotate_now(&self) -> Option<RotationReport> {
        self.inner.rotate_once().await
    }

    pub fn stats(&self) -> RotationStats {
        self.inner.counters.snapshot()
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.shutdown.cancel();
        }
    }
}

impl std::fmt::Debug for RotationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationScheduler")
            .field("config", &self.inner.config)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl SchedulerInner {
    async fn run_loop(&self, shutdown: CancellationToken) {
        let first_tick = Instant::now() + self.config.initial_delay;
        let mut ticker = tokio::time::interval_at(first_tick, self.config.effective_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if self.rotate_once().await.is_none() {
                tracing::info!("Credential store dropped, rotation loop exiting");
                break;
            }
        }
    }

    async fn rotate_once(&self) -> Option<RotationReport> {
        let _tick = self.tick_guard.lock().await;
        let started_at = Utc::now();

        let databases = {
            let store = self.store.upgrade()?;
            self.tracked_databases(&store)
        };

        let mut fresh = Vec::with_capacity(databases.len());
        let mut failed = Vec::new();
        for database in databases {
            match self.regenerate(&database).await {
                Ok(regenerated) => fresh.push((database, regenerated)),
                Err(error) => {
                    tracing::warn!(
                        database = %database,
                        error = %error,
                        "Credential rotation failed, keeping previous credential"
                    );
                    failed.push(RotationFailure { database, error });
                }
            }
        }

        let mut rotated = Vec::with_capacity(fresh.len());
        let mut superseded = Vec::new();
        let batch: Vec<(String, Credential)> = fresh
            .into_iter()
            .map(|(database, regenerated)| {
                rotated.push(database.clone());
                if let Some(user) = regenerated.superseded_user
                    && user != regenerated.credential.login()
                {
                    superseded.push((database.clone(), user));
                }
                (database, regenerated.credential)
            })
            .collect();

        self.store.upgrade()?.set_many(batch);

        let retired = if self.config.retire_superseded_users {
            self.retire(superseded).await
        } else {
            Vec::new()
        };

        let report = RotationReport {
            started_at,
            finished_at: Utc::now(),
            rotated,
            failed,
            retired,
        };
        self.counters.record(&report);

        tracing::info!(
            rotated = report.rotated.len(),
            failed = report.failed.len(),
            retired = report.retired.len(),
            "Rotation batch applied"
        );

        Some(report)
    }

    /// Configured databases plus everything the store already tracks
    fn tracked_databases(&self, store: &CredentialStore) -> BTreeSet<String> {
        let mut databases: BTreeSet<String> = store.database_names().into_iter().collect();
        databases.extend(self.config.databases.iter().cloned());
        databases
    }

    async fn regenerate(
        &self,
        database: &str,
    ) -> Result<Regenerated, crate::core::DataServiceError> {
        let superseded_user = self
            .data_service
            .lookup_current_database_user(database)
            .await?;
        let credential = self.data_service.regenerate_credential(database).await?;

        Ok(Regenerated {
            credential,
            superseded_user,
        })
    }

    async fn retire(&self, superseded: Vec<(String, String)>) -> Vec<String> {
        let mut retired = Vec::with_capacity(superseded.len());
        for (database, user) in superseded {
            match self.data_service.delete_user(&database, &user).await {
                Ok(true) => retired.push(user),
                Ok(false) => {
                    tracing::debug!(database = %database, user = %user, "Superseded login already gone");
                }
                Err(error) => {
                    tracing::warn!(
                        database = %database,
                        user = %user,
                        error = %error,
                        "Failed to retire superseded login"
                    );
                }
            }
        }
        retired
    }
}
