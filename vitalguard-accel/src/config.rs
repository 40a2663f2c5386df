//! Accelerator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use vitalguard_core::constants::{DEFAULT_ACCELERATOR_TIMEOUT_MS, DEFAULT_BATCH_SIZE};

use crate::error::AccelError;

/// Accelerator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    /// Deadline per enhancement call (ms)
    pub timeout_ms: u64,
    /// Samples per enhancement call
    pub batch_size: usize,
    /// Requests queued at the worker before senders wait
    pub worker_queue_depth: usize,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ACCELERATOR_TIMEOUT_MS,
            batch_size: DEFAULT_BATCH_SIZE,
            worker_queue_depth: 16,
        }
    }
}

impl AcceleratorConfig {
    /// Deadline as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject zero sizes and a zero deadline
    pub fn validate(&self) -> Result<(), AccelError> {
        if self.timeout_ms == 0 {
            return Err(AccelError::Config("timeout_ms must be positive"));
        }
        if self.batch_size == 0 {
            return Err(AccelError::Config("batch_size must be positive"));
        }
        if self.worker_queue_depth == 0 {
            return Err(AccelError::Config("worker_queue_depth must be positive"));
        }
        Ok(())
    }
}
