//! Rotation schedule configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::core::ConfigError;
use crate::utils::validate_database_name;

/// Interval used when none is configured
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_millis(60_000);

/// Smallest interval the scheduler will run at; shorter non-zero values are raised to it
pub const MIN_ROTATION_INTERVAL: Duration = Duration::from_millis(10);

/// Rotation schedule
///
/// # Example
///
/// ```
/// use dbauth_credential::rotation::RotationConfig;
/// use std::time::Duration;
///
/// let config = RotationConfig::new(Duration::from_secs(300))
///     .with_initial_delay(Duration::from_secs(5))
///     .with_databases(["Election2024", "Profiles"]);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Run the background loop at all
    pub enabled: bool,

    /// Delay before the first tick (default: immediate)
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Time between ticks; zero is rejected
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Databases rotated eagerly, whether or not they were requested yet
    pub databases: Vec<String>,

    /// Delete the superseded login from the backend after each rotation
    pub retire_superseded_users: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::ZERO,
            interval: DEFAULT_ROTATION_INTERVAL,
            databases: Vec::new(),
            retire_superseded_users: false,
        }
    }
}

impl RotationConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_databases<I, S>(mut self, databases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.databases = databases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retired_users(mut self, retire: bool) -> Self {
        self.retire_superseded_users = retire;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::invalid(
                "rotation.interval",
                "must be greater than zero",
            ));
        }

        let mut seen = HashSet::new();
        for database in &self.databases {
            validate_database_name(database)
                .map_err(|reason| ConfigError::invalid("rotation.databases", reason))?;
            if !seen.insert(database.as_str()) {
                return Err(ConfigError::invalid(
                    "rotation.databases",
                    format!("'{database}' is listed more than once"),
                ));
            }
        }

        Ok(())
    }

    /// Interval the timer actually runs at
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_ROTATION_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_rotate_every_minute_immediately() {
        let config = RotationConfig::default();

        assert!(config.enabled);
        assert_eq!(config.initial_delay, Duration::ZERO);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let error = RotationConfig::new(Duration::ZERO).validate().unwrap_err();

        assert_eq!(
            error,
            ConfigError::InvalidValue {
                field: "rotation.interval".into(),
                reason: "must be greater than zero".into(),
            }
        );
    }

    #[test]
    fn tiny_interval_is_clamped() {
        let config = RotationConfig::new(Duration::from_millis(1));

        assert!(config.validate().is_ok());
        assert_eq!(config.effective_interval(), MIN_ROTATION_INTERVAL);
        assert_eq!(
            RotationConfig::new(Duration::from_secs(5)).effective_interval(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn duplicate_and_empty_databases_are_rejected() {
        let duplicate = RotationConfig::default().with_databases(["a", "b", "a"]);
        assert!(duplicate.validate().unwrap_err().to_string().contains("'a'"));

        let empty = RotationConfig::default().with_databases([""]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn deserializes_humantime_durations() {
        let config: RotationConfig = serde_json::from_value(serde_json::json!({
            "initial_delay": "2s",
            "interval": "100ms",
            "databases": ["Election2024"]
        }))
        .unwrap();

        assert_eq!(config.initial_delay, Duration::from_secs(2));
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.databases, ["Election2024"]);
        assert!(config.enabled);
        assert!(!config.retire_superseded_users);
    }
}
