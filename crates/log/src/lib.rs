//! DbAuth Log - tracing subscriber setup
//!
//! Builds one global `tracing` subscriber from a serde-friendly
//! [`LogConfig`]: an `EnvFilter` directive plus a pretty, compact or JSON
//! formatter writing to stdout or stderr.
//!
//! ```rust,ignore
//! let _guard = dbauth_log::init(dbauth_log::LogConfig::development())?;
//! tracing::info!("ready");
//! ```
#![forbid(unsafe_code)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{DisplayConfig, Format, LogConfig, Writer};
pub use error::{LogError, LogResult};

/// Install the global subscriber described by `config`
///
/// Keep the returned guard alive for as long as logging is needed.
pub fn init(config: LogConfig) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Install the default subscriber (`info`, compact, stderr)
pub fn init_default() -> LogResult<LoggerGuard> {
    init(LogConfig::default())
}
