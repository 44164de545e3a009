//! Layered configuration: defaults → TOML file → `DBAUTH_*` env → flags

use anyhow::{Context, bail};
use dbauth_credential::ServiceConfig;
use dbauth_log::LogConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File read when no `--config` is given; silently skipped if absent
pub const DEFAULT_CONFIG_FILE: &str = "dbauth.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub service: ServiceConfig,
}

/// Values given on the command line; `None` leaves lower layers untouched
#[derive(Debug, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub rotation_interval: Option<String>,
}

impl AppConfig {
    /// Resolve the effective configuration
    ///
    /// Nested env keys use `__`, e.g. `DBAUTH_SERVICE__ROTATION__INTERVAL=30s`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        figment = match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file {} not found", path.display());
                }
                figment.merge(Toml::file(path))
            }
            None => figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        };

        figment = figment.merge(Env::prefixed("DBAUTH_").split("__"));

        if let Some(level) = &overrides.log_level {
            figment = figment.merge(Serialized::default("log.level", level));
        }
        if let Some(format) = &overrides.log_format {
            figment = figment.merge(Serialized::default("log.format", format));
        }
        if let Some(interval) = &overrides.rotation_interval {
            figment = figment.merge(Serialized::default("service.rotation.interval", interval));
        }

        let config: Self = figment.extract().context("invalid configuration")?;
        config
            .service
            .validate()
            .context("invalid service configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbauth.toml");
        std::fs::write(
            &path,
            r#"
[log]
level = "warn"

[service.rotation]
interval = "5m"
databases = ["Election2024"]
"#,
        )
        .unwrap();

        let config = AppConfig::load(
            Some(&path),
            &Overrides {
                rotation_interval: Some("250ms".to_owned()),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(config.log.level, "warn");
        assert_eq!(config.service.rotation.interval, Duration::from_millis(250));
        assert_eq!(config.service.rotation.databases, ["Election2024"]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/dbauth.toml")), &Overrides::default());
        assert!(result.is_err());
    }

    #[test]
    fn zero_interval_fails_validation() {
        let result = AppConfig::load(
            None,
            &Overrides {
                rotation_interval: Some("0s".to_owned()),
                ..Overrides::default()
            },
        );
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("greater than zero"), "{message}");
    }
}
