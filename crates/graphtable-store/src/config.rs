//! Store limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{StoreError, StoreResult};

/// Configuration for a record store backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum operations accepted in one atomic commit
    pub max_commit_ops: usize,
    /// How long a committed idempotency token is remembered
    pub idempotency_window_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_commit_ops: 25,
            idempotency_window_secs: 600,
        }
    }
}

impl StoreConfig {
    pub fn idempotency_window(&self) -> Duration {
        Duration::from_secs(self.idempotency_window_secs)
    }

    /// A replace needs a partition check, one delete and one put.
    pub fn validate(&self) -> StoreResult<()> {
        if self.max_commit_ops < 3 {
            return Err(StoreError::Config(format!(
                "max_commit_ops must be at least 3, got {}",
                self.max_commit_ops
            )));
        }
        Ok(())
    }
}
