//! Accelerator errors
//!
//! Every variant converts into the core's `ProcessingError`, which is how
//! the filter's batch path decides to fall back to the scalar recurrence.

use thiserror::Error;
use vitalguard_core::ProcessingError;

/// Failures of an offloaded enhancement call
#[derive(Debug, Error)]
pub enum AccelError {
    #[error("Enhancement timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Worker stopped")]
    WorkerStopped,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Length mismatch: sent {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl From<AccelError> for ProcessingError {
    fn from(err: AccelError) -> Self {
        match err {
            AccelError::Timeout { timeout_ms } => ProcessingError::AcceleratorTimeout { timeout_ms },
            AccelError::Cancelled => ProcessingError::AcceleratorUnavailable { reason: "request cancelled" },
            AccelError::WorkerStopped => ProcessingError::AcceleratorUnavailable { reason: "worker stopped" },
            AccelError::Backend(_) => ProcessingError::AcceleratorUnavailable { reason: "backend error" },
            AccelError::LengthMismatch { .. } => ProcessingError::AcceleratorUnavailable { reason: "length mismatch" },
            AccelError::Config(reason) => ProcessingError::InvalidConfig { reason },
            AccelError::Processing(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_error() {
        let err: ProcessingError = AccelError::Timeout { timeout_ms: 50 }.into();
        assert_eq!(err, ProcessingError::AcceleratorTimeout { timeout_ms: 50 });

        let err: ProcessingError = AccelError::Backend("gpu lost".into()).into();
        assert!(matches!(err, ProcessingError::AcceleratorUnavailable { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn display() {
        let err = AccelError::LengthMismatch { expected: 30, actual: 29 };
        assert_eq!(err.to_string(), "Length mismatch: sent 30 samples, got 29");
    }
}
