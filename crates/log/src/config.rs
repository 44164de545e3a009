//! Logger configuration and presets

use serde::{Deserialize, Serialize};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// Single line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Output stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Writer {
    Stdout,
    /// Keeps stdout free for command output
    #[default]
    Stderr,
}

/// Which metadata each event line carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub colors: bool,
    pub target: bool,
    /// File and line of the call site
    pub source: bool,
    pub thread_ids: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            target: true,
            source: false,
            thread_ids: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `dbauth_credential=debug,info`
    pub level: String,
    pub format: Format,
    pub writer: Writer,
    pub display: DisplayConfig,
    /// Recorded on a root `app` span when set
    pub service: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: Format::default(),
            writer: Writer::default(),
            display: DisplayConfig::default(),
            service: None,
        }
    }
}

impl LogConfig {
    /// Pretty output at debug level with call sites
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_owned(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// JSON at info level, no colors
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_owned(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                thread_ids: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn default_is_compact_info_on_stderr() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, Format::Compact);
        assert_eq!(config.writer, Writer::Stderr);
    }

    #[test]
    fn presets_differ_in_format_and_level() {
        let dev = LogConfig::development();
        let prod = LogConfig::production();

        assert_eq!(dev.format, Format::Pretty);
        assert_eq!(dev.level, "debug");
        assert!(dev.display.source);

        assert_eq!(prod.format, Format::Json);
        assert!(!prod.display.colors);
    }

    #[rstest]
    #[case("pretty", Format::Pretty)]
    #[case("compact", Format::Compact)]
    #[case("json", Format::Json)]
    fn format_names_deserialize(#[case] name: &str, #[case] expected: Format) {
        let parsed: Format = serde_json::from_value(serde_json::json!(name)).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: LogConfig =
            serde_json::from_str(r#"{ "level": "warn", "display": { "colors": false } }"#)
                .unwrap();

        assert_eq!(parsed.level, "warn");
        assert_eq!(parsed.format, Format::Compact);
        assert!(!parsed.display.colors);
        assert!(parsed.display.target);
    }
}
