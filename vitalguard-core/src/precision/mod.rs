//! Precision Layer
//!
//! Three collaborators sit above the channels and correct their combined
//! output:
//!
//! - [`EnvironmentalAdjuster`]: scales the raw sample for ambient conditions
//!   before distribution and contributes a confidence factor
//! - [`CrossValidator`]: checks the snapshot against physiological ranges and
//!   pairwise plausibility rules, suggests corrections
//! - [`CalibrationManager`]: learns multiplicative factors from operator
//!   reference measurements
//!
//! They are plain values owned by a [`PrecisionContext`], which the
//! processor owns. Two sessions never share calibration or environment
//! state.

pub mod calibration;
pub mod cross_validator;
pub mod environment;

pub use calibration::{CalibrationFactors, CalibrationManager, CalibrationReference};
pub use cross_validator::{
    enforce_pulse_pressure, CorrectionFactors, CrossValidator, Inconsistency, ValidationReport,
};
pub use environment::{
    AdjustmentFactors, ConditionsUpdate, DeviceClass, EnvironmentalAdjuster, EnvironmentalConditions,
};

/// Precision collaborators of one processing session
#[derive(Debug, Clone, Default)]
pub struct PrecisionContext {
    /// Reference-based calibration
    pub calibration: CalibrationManager,
    /// Range and plausibility checks
    pub validator: CrossValidator,
    /// Ambient-condition compensation
    pub environment: EnvironmentalAdjuster,
}

impl PrecisionContext {
    /// Fresh context
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear learned calibration and environment state
    pub fn reset(&mut self) {
        self.calibration.reset_calibration();
        self.environment.reset();
    }
}
