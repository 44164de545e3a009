//! Logging setup errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter {0}")]
    Filter(String),

    /// A global subscriber was already installed
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

pub type LogResult<T> = Result<T, LogError>;
