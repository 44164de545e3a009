//! Background credential rotation
//!
//! [`RotationScheduler`] regenerates every tracked credential on a fixed
//! cadence. Regeneration I/O runs outside the store lock; the results are
//! then swapped into the [`CredentialStore`](crate::store::CredentialStore)
//! as one batch.

pub mod config;
pub mod report;
pub mod scheduler;

pub use config::{DEFAULT_ROTATION_INTERVAL, MIN_ROTATION_INTERVAL, RotationConfig};
pub use report::{RotationFailure, RotationReport, RotationStats};
pub use scheduler::RotationScheduler;
