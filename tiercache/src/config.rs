use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::{CacheError, Result};

/// Cache configuration
///
/// Durations are carried as milliseconds so the struct round-trips cleanly
/// through YAML. `validate` runs at cache construction; a bad value fails
/// there instead of at first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries in the L1 tier
    pub l1_capacity: usize,
    /// Time-to-live for L2 entries in milliseconds
    pub l2_ttl_ms: u64,
    /// Interval between background L2 sweeps in milliseconds
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1_capacity: 1024,
            l2_ttl_ms: 300_000,
            sweep_interval_ms: 1_000,
        }
    }
}

impl CacheConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: CacheConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// L2 time-to-live as a duration
    pub fn l2_ttl(&self) -> Duration {
        Duration::from_millis(self.l2_ttl_ms)
    }

    /// Sweep interval as a duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Reject non-positive capacity, TTL, or sweep interval
    pub fn validate(&self) -> Result<()> {
        if self.l1_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "l1_capacity must be greater than zero".to_string(),
            ));
        }
        if self.l2_ttl_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "l2_ttl_ms must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "sweep_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
