//! Error Types for the Signal Processing Core
//!
//! ## Design Philosophy
//!
//! The per-frame path of VitalGuard must never fail visibly. A camera frame
//! arrives roughly every 33 ms and the display layer expects a snapshot for
//! each one, so every fault inside the core is resolved locally: a channel
//! returns a neutral reading, the distributor replays its last good output,
//! an accelerator call falls back to the in-process filter. Errors therefore
//! travel *inside* the core, between helpers, and are converted into degraded
//! output at the public boundary.
//!
//! Like the rest of the crate the error type is built for `no_std`:
//!
//! 1. **Copy Semantics**: every variant is `Copy`, so errors can be stored in
//!    diagnostics or returned from hot loops without allocation.
//! 2. **Static Messages**: reasons are `&'static str`, never `String`.
//! 3. **Actionable Information**: each variant carries enough context to pick
//!    the fallback (how many samples were missing, which bound was crossed).
//!
//! ## Error Categories
//!
//! ### Signal Conditions
//! - `InsufficientData`: a buffer is shorter than a computation needs
//! - `LowSignalQuality`: the upstream quality gate rejected the sample
//! - `InvalidValue`: NaN or infinite input
//!
//! ### Physiological Violations
//! - `OutOfPhysiologicalRange`: a computed vital left its hard bounds
//! - `CrossValidationFailed`: too many inconsistencies between vitals
//!
//! ### Accelerator Faults
//! - `AcceleratorUnavailable`: the enhancement backend refused or crashed
//! - `AcceleratorTimeout`: the backend did not answer in time
//!
//! ### Programmer Errors
//! - `NotStarted`, `InvalidConfig`, `RegistryFull`
//!
//! ## Resolution Strategy
//!
//! ```rust
//! use vitalguard_core::ProcessingError;
//!
//! fn resolve(err: ProcessingError) -> &'static str {
//!     match err {
//!         ProcessingError::InsufficientData { .. } => "return neutral reading",
//!         ProcessingError::OutOfPhysiologicalRange { .. } => "clamp and flag",
//!         ProcessingError::AcceleratorUnavailable { .. }
//!         | ProcessingError::AcceleratorTimeout { .. } => "run scalar fallback",
//!         ProcessingError::LowSignalQuality { .. } => "replay last snapshot",
//!         ProcessingError::CrossValidationFailed { .. } => "lower confidence",
//!         _ => "return empty result",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for core processing helpers
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Processing errors - small and `Copy` for use in the per-frame path
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ProcessingError {
    /// Buffer below the minimum length for a computation
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of samples the computation needs
        required: usize,
        /// Samples actually available
        available: usize,
    },

    /// A computed vital fell outside its hard bounds
    #[error("Value {value} outside physiological range [{min}, {max}]")]
    OutOfPhysiologicalRange {
        /// The offending value
        value: f32,
        /// Lower physiological bound
        min: f32,
        /// Upper physiological bound
        max: f32,
    },

    /// The enhancement backend failed or is not loaded
    #[error("Accelerator unavailable: {reason}")]
    AcceleratorUnavailable {
        reason: &'static str,
    },

    /// The enhancement backend did not answer within its deadline
    #[error("Accelerator timed out after {timeout_ms} ms")]
    AcceleratorTimeout {
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// Upstream quality gate failed (finger missing or quality too low)
    #[error("Signal quality {quality} below gate")]
    LowSignalQuality {
        /// Reported quality on the 0-100 scale
        quality: f32,
    },

    /// Too many inconsistencies between simultaneously estimated vitals
    #[error("Cross-validation failed with {inconsistencies} inconsistencies")]
    CrossValidationFailed {
        /// Number of inconsistencies found
        inconsistencies: usize,
    },

    /// Processing requested before `start()`
    #[error("Processor not started")]
    NotStarted,

    /// NaN, infinity or otherwise meaningless input
    #[error("Invalid value: not a valid number")]
    InvalidValue,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: &'static str,
    },

    /// Channel registry has no free slot
    #[error("Channel registry full (capacity {capacity})")]
    RegistryFull {
        /// Registry capacity
        capacity: usize,
    },
}

impl ProcessingError {
    /// Whether the pipeline resolves this error by falling back silently
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::NotStarted | Self::InvalidConfig { .. } | Self::RegistryFull { .. }
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ProcessingError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InsufficientData { required, available } =>
                defmt::write!(fmt, "Need {} samples, have {}", required, available),
            Self::OutOfPhysiologicalRange { value, min, max } =>
                defmt::write!(fmt, "Value {} outside [{}, {}]", value, min, max),
            Self::AcceleratorUnavailable { reason } =>
                defmt::write!(fmt, "Accelerator unavailable: {}", reason),
            Self::AcceleratorTimeout { timeout_ms } =>
                defmt::write!(fmt, "Accelerator timeout {} ms", timeout_ms),
            Self::LowSignalQuality { quality } =>
                defmt::write!(fmt, "Signal quality {}", quality),
            Self::CrossValidationFailed { inconsistencies } =>
                defmt::write!(fmt, "Cross-validation: {} inconsistencies", inconsistencies),
            Self::NotStarted =>
                defmt::write!(fmt, "Processor not started"),
            Self::InvalidValue =>
                defmt::write!(fmt, "Invalid value"),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
            Self::RegistryFull { capacity } =>
                defmt::write!(fmt, "Registry full ({})", capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(ProcessingError::InsufficientData { required: 10, available: 3 }.is_recoverable());
        assert!(ProcessingError::AcceleratorTimeout { timeout_ms: 1500 }.is_recoverable());
        assert!(!ProcessingError::NotStarted.is_recoverable());
        assert!(!ProcessingError::RegistryFull { capacity: 8 }.is_recoverable());
    }

    #[cfg(feature = "std")]
    #[test]
    fn display_messages() {
        let err = ProcessingError::OutOfPhysiologicalRange { value: 210.0, min: 80.0, max: 200.0 };
        assert!(err.to_string().contains("210"));

        let err = ProcessingError::InsufficientData { required: 10, available: 4 };
        assert_eq!(err.to_string(), "Insufficient data: need 10, have 4");
    }
}
