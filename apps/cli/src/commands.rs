//! Subcommand implementations
//!
//! The binary hosts the service over the in-process backend; every command
//! writes machine-readable JSON to stdout and logs to the configured writer.

use anyhow::Context;
use dbauth_credential::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use crate::config::AppConfig;

/// Serve until Ctrl+C or SIGTERM, rotating in the background
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let backend = Arc::new(InMemoryDataService::new());
    let service = AuthorizationService::start(config.service, backend)
        .await
        .context("failed to start authorization service")?;

    info!(
        rotation = service.scheduler().is_some(),
        "dbauthd ready, press Ctrl+C to stop"
    );

    shutdown_signal().await;
    service.shutdown().await;

    let metrics = service.metrics();
    let rotation = service.rotation_stats().unwrap_or_default();
    info!(
        requests = metrics.requests,
        lazy_initializations = metrics.lazy_initializations,
        batches = rotation.batches,
        rotated = rotation.rotated,
        failed = rotation.failed,
        "dbauthd stopped"
    );
    Ok(())
}

/// Issue credentials for `databases`, one JSON line each
///
/// All requests are begun before any is awaited.
pub async fn authorize(
    mut config: AppConfig,
    databases: Vec<String>,
    show_password: bool,
) -> anyhow::Result<()> {
    config.service.rotation.enabled = false;
    let service = AuthorizationService::start(config.service, Arc::new(InMemoryDataService::new()))
        .await
        .context("failed to start authorization service")?;

    let mut pending = Vec::with_capacity(databases.len());
    for database in databases {
        let operation = service
            .begin_authorize(AuthorizationRequest::new(database.as_str()), None, None)
            .with_context(|| format!("cannot authorize '{database}'"))?;
        pending.push((database, operation));
    }

    for (database, operation) in pending {
        let authorization = service
            .end_authorize(operation)
            .await
            .with_context(|| format!("authorization for '{database}' failed"))?;
        println!("{}", render_authorization(&authorization, show_password)?);
    }

    Ok(())
}

/// Run one rotation batch and print its report
pub async fn rotate(mut config: AppConfig, databases: Vec<String>) -> anyhow::Result<()> {
    config.service.rotation.databases.extend(databases);
    config.service.validate()?;

    let store = Arc::new(CredentialStore::new());
    let scheduler = RotationScheduler::new(
        config.service.rotation,
        &store,
        Arc::new(InMemoryDataService::new()),
    )?;

    let report = scheduler
        .rotate_now()
        .await
        .context("credential store dropped during rotation")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the effective configuration
pub fn show_config(config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn render_authorization(
    authorization: &DbAuthorization,
    show_password: bool,
) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(authorization)?;
    if show_password {
        value["password"] = authorization
            .password()
            .expose_secret(|secret| json!(secret));
    }
    Ok(value.to_string())
}

async fn shutdown_signal() {
    let terminate = async {
        #[cfg(unix)]
        {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Ctrl+C handler failed");
            }
            info!("Received Ctrl+C, shutting down");
        }
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
