//! Global subscriber installation
//!
//! Lives in its own test binary: the subscriber is process-wide.

use dbauth_log::{LogConfig, LogError};

#[test]
fn second_install_is_rejected() {
    let guard = dbauth_log::init(LogConfig::production().with_service("dbauthd"));
    assert!(guard.is_ok());

    tracing::info!(database = "Election2024", "logged through the installed subscriber");

    let again = dbauth_log::init_default();
    assert!(matches!(again, Err(LogError::Init(_))));
}
