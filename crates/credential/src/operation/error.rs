//! Operation contract errors

use std::time::Duration;
use thiserror::Error;

/// Errors raised by [`AsyncOperation`](super::AsyncOperation)
///
/// `AlreadyCompleted` and `Disposed` signal misuse of the handle.
/// `TimedOut` is only a polling outcome: the operation itself is unaffected.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("Operation has already completed")]
    AlreadyCompleted,

    #[error("Operation has been disposed")]
    Disposed,

    #[error("Operation still pending after {0:?}")]
    TimedOut(Duration),
}

impl OperationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}
