//! Authorization counters
//!
//! Thread-safe counters using relaxed atomics; read them through
//! [`ServiceMetrics::snapshot`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by the service
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    requests: AtomicU64,
    fast_path: AtomicU64,
    lazy_initializations: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time copy of [`ServiceMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Requests that passed validation
    pub requests: u64,
    /// Requests answered from the store without touching the backend
    pub fast_path: u64,
    /// First-use credentials generated on demand
    pub lazy_initializations: u64,
    /// Requests completed with an error
    pub failures: u64,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fast_path(&self) {
        self.fast_path.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lazy_initialization(&self) {
        self.lazy_initializations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            fast_path: self.fast_path.load(Ordering::Relaxed),
            lazy_initializations: self.lazy_initializations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Share of requests served from the store (0.0 - 1.0)
    ///
    /// Returns 0.0 before the first request.
    pub fn fast_path_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.fast_path as f64 / self.requests as f64
        }
    }
}
