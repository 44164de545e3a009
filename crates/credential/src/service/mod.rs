//! Authorization facade
//!
//! [`AuthorizationService`] serves authorization requests through a
//! begin/end pair built on [`AsyncOperation`]:
//!
//! ```text
//!  begin_authorize ──▶ validate ──▶ store.get ──hit──▶ complete (caller's thread)
//!                                        │
//!                                       miss
//!                                        ▼
//!                          spawned task: single-flight regenerate
//!                                        │
//!                                        ▼
//!                              insert_if_absent ──▶ complete
//!
//!  end_authorize ──▶ wait ──▶ DbAuthorization | AuthorizationError
//! ```
//!
//! Per request the states are `Submitted → Resolving → Completed`. An error is
//! a completed operation carrying `Err`, so `end_authorize` always returns
//! once `complete` has run.

pub mod config;
pub mod metrics;

pub use config::ServiceConfig;
pub use metrics::{MetricsSnapshot, ServiceMetrics};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::core::{
    AuthorizationError, AuthorizationRequest, ConfigError, Credential, DataServiceError,
    DbAuthorization,
};
use crate::operation::{AsyncOperation, AsyncState, OperationCallback};
use crate::providers::CredentialDataService;
use crate::rotation::{RotationScheduler, RotationStats};
use crate::store::CredentialStore;
use crate::utils::validate_database_name;

/// Value an authorization operation completes with
pub type AuthorizeOutcome = Result<DbAuthorization, AuthorizationError>;

/// Handle returned by [`AuthorizationService::begin_authorize`]
pub type AuthorizeOperation = AsyncOperation<AuthorizeOutcome>;

/// Errors raised while bringing the service up
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to seed credential store: {0}")]
    Seed(#[source] DataServiceError),
}

/// Issues database credentials asynchronously
///
/// Owns the [`CredentialStore`]; the optional [`RotationScheduler`] only
/// holds a weak reference to it. Construct once at service start and call
/// [`shutdown`](Self::shutdown) at service stop.
pub struct AuthorizationService {
    inner: Arc<ServiceInner>,
    scheduler: Option<RotationScheduler>,
    /// Runtime lazy generation is spawned on
    runtime: Option<Handle>,
}

struct ServiceInner {
    store: Arc<CredentialStore>,
    data_service: Arc<dyn CredentialDataService>,
    /// Per-database gate so concurrent first requests regenerate once
    lazy_gates: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    metrics: ServiceMetrics,
}

impl AuthorizationService {
    /// Service over an existing store, without background rotation
    ///
    /// Captures the current Tokio runtime, if any, so requests begun later
    /// from plain threads can still generate credentials.
    pub fn new(store: Arc<CredentialStore>, data_service: Arc<dyn CredentialDataService>) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store,
                data_service,
                lazy_gates: DashMap::new(),
                metrics: ServiceMetrics::new(),
            }),
            scheduler: None,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawn lazy generation on `runtime` instead of the captured one
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the store, optionally seed it, and start rotation
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn start(
        config: ServiceConfig,
        data_service: Arc<dyn CredentialDataService>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let store = Arc::new(CredentialStore::new());
        if config.seed_from_backend {
            let issued = data_service
                .list_all_issued_credentials()
                .await
                .map_err(ServiceError::Seed)?;
            let seeded = store.set_many(
                issued
                    .into_iter()
                    .map(|credential| (credential.database_name().to_owned(), credential)),
            );
            info!(seeded, "Seeded credential store from backend");
        }

        let mut service = Self::new(store, data_service);
        if config.rotation.enabled {
            let scheduler = RotationScheduler::new(
                config.rotation,
                &service.inner.store,
                Arc::clone(&service.inner.data_service),
            )?;
            scheduler.start();
            service.scheduler = Some(scheduler);
        }

        Ok(service)
    }

    /// Accept an authorization request
    ///
    /// Fails synchronously with [`AuthorizationError::InvalidRequest`] for a
    /// malformed database name; no operation is created in that case.
    ///
    /// The returned operation may already be complete (credential found in
    /// the store) or complete shortly after (first request for a database
    /// triggers generation on a spawned task). The lazy path runs on the
    /// runtime captured at construction, else the caller's; with neither the
    /// operation completes with [`AuthorizationError::RuntimeUnavailable`].
    pub fn begin_authorize(
        &self,
        request: AuthorizationRequest,
        callback: Option<OperationCallback<AuthorizeOutcome>>,
        state: Option<AsyncState>,
    ) -> Result<AuthorizeOperation, AuthorizationError> {
        validate_database_name(request.database_name())
            .map_err(|reason| AuthorizationError::InvalidRequest { reason })?;

        self.inner.metrics.record_request();
        let operation = AsyncOperation::create(callback, state);

        if let Some(credential) = self.inner.store.get(request.database_name()) {
            self.inner.metrics.record_fast_path();
            debug!(
                database = request.database_name(),
                login = credential.login(),
                "Authorized from current credential"
            );
            operation.complete(Ok(DbAuthorization::issue(&credential)))?;
            return Ok(operation);
        }

        let Some(runtime) = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            self.inner.metrics.record_failure();
            warn!(
                database = request.database_name(),
                "No runtime to issue first credential on"
            );
            operation.complete(Err(AuthorizationError::RuntimeUnavailable {
                database: request.database_name().to_owned(),
            }))?;
            return Ok(operation);
        };

        let inner = Arc::clone(&self.inner);
        let pending = operation.clone();
        runtime.spawn(async move {
            let database = request.database_name();
            let outcome = inner
                .resolve_first_use(database)
                .await
                .map(|credential| DbAuthorization::issue(&credential));

            if let Err(error) = &outcome {
                inner.metrics.record_failure();
                warn!(database, error = %error, "Authorization failed");
            }
            if let Err(error) = pending.complete(outcome) {
                debug!(database, error = %error, "Authorization result discarded");
            }
        });

        Ok(operation)
    }

    /// Retrieve the result of `operation`, waiting if it is still pending
    ///
    /// Consumes and closes the operation.
    pub async fn end_authorize(
        &self,
        operation: AuthorizeOperation,
    ) -> Result<DbAuthorization, AuthorizationError> {
        let outcome = operation.wait(None).await;
        operation.close();
        outcome?
    }

    /// Like [`end_authorize`](Self::end_authorize) but bounded by `timeout`
    ///
    /// On timeout the operation stays open and can be waited on again.
    pub async fn end_authorize_within(
        &self,
        operation: &AuthorizeOperation,
        timeout: Duration,
    ) -> Result<DbAuthorization, AuthorizationError> {
        operation.wait(Some(timeout)).await?
    }

    /// `end_authorize(begin_authorize(request))`
    pub async fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> Result<DbAuthorization, AuthorizationError> {
        let operation = self.begin_authorize(request, None, None)?;
        self.end_authorize(operation).await
    }

    /// Stop background rotation, letting an in-flight tick finish
    pub async fn shutdown(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.stop().await;
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.inner.store
    }

    pub fn scheduler(&self) -> Option<&RotationScheduler> {
        self.scheduler.as_ref()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn rotation_stats(&self) -> Option<RotationStats> {
        self.scheduler.as_ref().map(RotationScheduler::stats)
    }
}

impl std::fmt::Debug for AuthorizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationService")
            .field("databases", &self.inner.store.len())
            .field("metrics", &self.metrics())
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl ServiceInner {
    /// Credential for a database missing from the store
    ///
    /// Concurrent callers for the same database queue on one gate; the first
    /// generates, the rest find the stored result. The last caller through
    /// removes the gate, whether generation succeeded or not.
    async fn resolve_first_use(
        &self,
        database: &str,
    ) -> Result<Arc<Credential>, AuthorizationError> {
        let gate = Arc::clone(&*self.lazy_gates.entry(database.to_owned()).or_default());
        let outcome = {
            let _held = gate.lock().await;
            self.generate_if_missing(database).await
        };

        drop(gate);
        self.lazy_gates
            .remove_if(database, |_, gate| Arc::strong_count(gate) == 1);

        outcome
    }

    async fn generate_if_missing(
        &self,
        database: &str,
    ) -> Result<Arc<Credential>, AuthorizationError> {
        if let Some(existing) = self.store.get(database) {
            return Ok(existing);
        }

        let fresh = self.data_service.regenerate_credential(database).await?;
        self.metrics.record_lazy_initialization();
        info!(
            database,
            login = fresh.login(),
            "Issued first credential for database"
        );

        Ok(self.store.insert_if_absent(database, fresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationError;
    use crate::providers::{FailureKind, InMemoryDataService};
    use crate::rotation::RotationConfig;

    fn service() -> (AuthorizationService, Arc<InMemoryDataService>) {
        let backend = Arc::new(InMemoryDataService::new());
        let service = AuthorizationService::new(Arc::new(CredentialStore::new()), backend.clone());
        (service, backend)
    }

    #[tokio::test]
    async fn empty_database_name_fails_synchronously() {
        let (service, backend) = service();

        let error = service
            .begin_authorize(AuthorizationRequest::new(""), None, None)
            .unwrap_err();

        assert!(matches!(error, AuthorizationError::InvalidRequest { .. }));
        assert_eq!(service.metrics().requests, 0);
        assert_eq!(backend.regenerate_calls(), 0);
    }

    #[tokio::test]
    async fn known_database_completes_before_begin_returns() {
        let (service, _) = service();
        service
            .store()
            .set("db", Credential::new("db", "db_login", "pw"));

        let operation = service
            .begin_authorize(AuthorizationRequest::new("db"), None, None)
            .unwrap();

        assert!(operation.is_completed());
        let authorization = service.end_authorize(operation).await.unwrap();
        assert_eq!(authorization.login(), "db_login");
        assert_eq!(service.metrics().fast_path, 1);
    }

    #[tokio::test]
    async fn unknown_database_is_generated_lazily() {
        let (service, backend) = service();

        let authorization = service
            .authorize(AuthorizationRequest::new("Election2024"))
            .await
            .unwrap();

        assert_eq!(authorization.database_name(), "Election2024");
        assert_eq!(authorization.login(), "election2024_u1");
        assert_eq!(backend.regenerate_calls(), 1);
        assert!(service.store().contains("Election2024"));
        assert_eq!(service.metrics().lazy_initializations, 1);
    }

    #[tokio::test]
    async fn backend_failure_is_carried_by_the_operation() {
        let (service, backend) = service();
        backend.fail_database("db", FailureKind::Persistence);

        let operation = service
            .begin_authorize(AuthorizationRequest::new("db"), None, None)
            .unwrap();
        let error = service.end_authorize(operation).await.unwrap_err();

        assert!(matches!(
            error,
            AuthorizationError::DataService(DataServiceError::Persistence { .. })
        ));
        assert!(!service.store().contains("db"));
        assert_eq!(service.metrics().failures, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn lazy_gates_are_released_after_success_and_failure() {
        let (service, backend) = service();
        backend.fail_database("broken", FailureKind::AuthenticationBackend);

        let requests: Vec<_> = ["fresh", "fresh", "fresh", "broken", "broken"]
            .into_iter()
            .map(|database| {
                service
                    .begin_authorize(AuthorizationRequest::new(database), None, None)
                    .unwrap()
            })
            .collect();
        for (i, operation) in requests.into_iter().enumerate() {
            let outcome = service.end_authorize(operation).await;
            assert_eq!(outcome.is_ok(), i < 3, "request {i}");
        }

        assert!(service.inner.lazy_gates.is_empty());
        assert_eq!(service.metrics().lazy_initializations, 1);
    }

    #[test]
    fn lazy_path_runs_on_captured_runtime_from_plain_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let backend = Arc::new(InMemoryDataService::new());
        let service = {
            let _entered = runtime.enter();
            AuthorizationService::new(Arc::new(CredentialStore::new()), backend.clone())
        };

        let outcome = std::thread::spawn(move || {
            let operation = service
                .begin_authorize(AuthorizationRequest::new("Election2024"), None, None)
                .unwrap();
            operation.wait_blocking(Some(Duration::from_secs(5)))
        })
        .join()
        .unwrap();

        assert_eq!(outcome.unwrap().unwrap().login(), "election2024_u1");
        assert_eq!(backend.regenerate_calls(), 1);
    }

    #[test]
    fn lazy_path_without_runtime_completes_with_error() {
        let (service, backend) = service();

        let operation = service
            .begin_authorize(AuthorizationRequest::new("Election2024"), None, None)
            .unwrap();

        let error = operation.wait_blocking(None).unwrap().unwrap_err();
        assert_eq!(
            error,
            AuthorizationError::RuntimeUnavailable {
                database: "Election2024".to_owned()
            }
        );
        assert_eq!(backend.regenerate_calls(), 0);
        assert_eq!(service.metrics().failures, 1);
    }

    #[test]
    fn explicit_runtime_handle_is_used() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (service, _) = service();
        let service = service.with_runtime(runtime.handle().clone());

        let operation = service
            .begin_authorize(AuthorizationRequest::new("Profiles"), None, None)
            .unwrap();

        let authorization = operation
            .wait_blocking(Some(Duration::from_secs(5)))
            .unwrap()
            .unwrap();
        assert_eq!(authorization.login(), "profiles_u1");
    }

    #[tokio::test(start_paused = true)]
    async fn end_authorize_within_times_out_then_succeeds() {
        let backend = Arc::new(InMemoryDataService::new().with_latency(Duration::from_secs(5)));
        let service = AuthorizationService::new(Arc::new(CredentialStore::new()), backend);

        let operation = service
            .begin_authorize(AuthorizationRequest::new("slow"), None, None)
            .unwrap();

        let early = service
            .end_authorize_within(&operation, Duration::from_secs(1))
            .await;
        assert_eq!(
            early.unwrap_err(),
            AuthorizationError::Operation(OperationError::TimedOut(Duration::from_secs(1)))
        );

        let late = service.end_authorize(operation).await.unwrap();
        assert_eq!(late.login(), "slow_u1");
    }

    #[tokio::test]
    async fn start_rejects_zero_interval() {
        let config = ServiceConfig::default().with_rotation(RotationConfig::new(Duration::ZERO));

        let result =
            AuthorizationService::start(config, Arc::new(InMemoryDataService::new())).await;

        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[tokio::test]
    async fn start_seeds_from_backend() {
        let backend = Arc::new(InMemoryDataService::new());
        backend.regenerate_credential("Profiles").await.unwrap();

        let config = ServiceConfig::default()
            .with_seed_from_backend(true)
            .with_rotation(RotationConfig {
                enabled: false,
                ..RotationConfig::default()
            });
        let service = AuthorizationService::start(config, backend.clone())
            .await
            .unwrap();

        let authorization = service
            .authorize(AuthorizationRequest::new("Profiles"))
            .await
            .unwrap();
        assert_eq!(authorization.login(), "profiles_u1");
        assert_eq!(backend.regenerate_calls(), 1);
        assert!(service.scheduler().is_none());
    }
}
