//! Service configuration

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;
use crate::rotation::RotationConfig;

/// Configuration for [`AuthorizationService`](super::AuthorizationService)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Background rotation schedule
    pub rotation: RotationConfig,

    /// Pre-seed the store from the backend's issued credentials at start
    pub seed_from_backend: bool,
}

impl ServiceConfig {
    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_seed_from_backend(mut self, seed: bool) -> Self {
        self.seed_from_backend = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rotation.validate()
    }
}
