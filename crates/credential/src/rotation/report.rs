//! Rotation outcomes and counters

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::DataServiceError;

/// One database that could not be rotated this tick
#[derive(Debug, Clone, Serialize)]
pub struct RotationFailure {
    pub database: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: DataServiceError,
}

fn serialize_error<S>(error: &DataServiceError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

/// Outcome of one rotation batch
#[derive(Debug, Clone, Serialize)]
pub struct RotationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Databases now holding a fresh credential
    pub rotated: Vec<String>,
    /// Databases left on their previous credential
    pub failed: Vec<RotationFailure>,
    /// Superseded logins deleted from the backend
    pub retired: Vec<String>,
}

impl RotationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cumulative rotation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RotationStats {
    /// Completed batches, timer-driven or on demand
    pub batches: u64,
    pub rotated: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct RotationCounters {
    batches: AtomicU64,
    rotated: AtomicU64,
    failed: AtomicU64,
}

impl RotationCounters {
    pub(crate) fn record(&self, report: &RotationReport) {
        self.rotated
            .fetch_add(report.rotated.len() as u64, Ordering::Relaxed);
        self.failed
            .fetch_add(report.failed.len() as u64, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> RotationStats {
        RotationStats {
            batches: self.batches.load(Ordering::Acquire),
            rotated: self.rotated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
