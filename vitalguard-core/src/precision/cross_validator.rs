//! Cross-Validation of Simultaneous Vitals
//!
//! ## Overview
//!
//! Channels are independent, so nothing stops them from producing a
//! combination no body would: a racing heart with low pressure, saturation
//! dropping with no compensating heart rate. The validator applies fixed
//! physiology rules to a snapshot in two passes.
//!
//! ### 1. Range Checks
//!
//! Every present field is compared with its hard bounds. An out-of-range
//! value records a correction factor `bound / value` that would bring it
//! back onto the bound. Inverted pressure (diastolic ≥ systolic) and a
//! pulse pressure outside `[20, 60]` are flagged.
//!
//! ### 2. Plausibility Rules
//!
//! | Condition                                         | Correction          |
//! |---------------------------------------------------|---------------------|
//! | HR > 100 and (sys < 110 or dia < 70)              | BP × 1.05           |
//! | HR < 60 and (sys > 140 or dia > 90)               | BP × 0.95           |
//! | SpO2 < 92 and HR < 70                             | SpO2 × 1.02         |
//! | glucose > 150 and (chol < 150 or trig < 120)      | low field × 1.03    |
//!
//! Factors for the same field multiply. Missing or zero fields are skipped,
//! so rules only fire when both sides are known.
//!
//! ## Scoring
//!
//! ```text
//! confidence = max(0.1, 1 - 0.15 * inconsistencies)
//! valid      = inconsistencies <= 4
//! ```
//!
//! Corrections are only *recorded* by validation. `apply_adjustments`
//! multiplies, re-clamps and finally enforces `diastolic <= systolic - 20`.

use core::fmt;

use crate::constants::buffers::MAX_INCONSISTENCIES;
use crate::constants::physiology::{ABNORMAL_PULSE_PRESSURE_MAX_MMHG, MIN_PULSE_PRESSURE_MMHG};
use crate::constants::quality::{
    INCONSISTENCY_PENALTY, MAX_TOLERATED_INCONSISTENCIES, MIN_VALIDATION_CONFIDENCE,
};
use crate::errors::{ProcessingError, ProcessingResult};
use crate::types::{MeasurementField, Measurements};

use MeasurementField::*;

/// One detected inconsistency
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inconsistency {
    /// A field left its physiological bounds
    OutOfRange {
        /// Offending field
        field: MeasurementField,
        /// Offending value
        value: f32,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },
    /// Diastolic at or above systolic
    InvertedPressure {
        /// Systolic value
        systolic: f32,
        /// Diastolic value
        diastolic: f32,
    },
    /// Pulse pressure outside `[20, 60]`
    AbnormalPulsePressure {
        /// systolic - diastolic
        pulse_pressure: f32,
    },
    /// Elevated heart rate with low pressure
    TachycardiaWithLowPressure,
    /// Low heart rate with high pressure
    BradycardiaWithHighPressure,
    /// Low saturation without compensating heart rate
    LowSaturationWithoutTachycardia,
    /// High glucose with a low lipid field
    MetabolicMismatch {
        /// The low lipid field
        field: MeasurementField,
    },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::OutOfRange { field, value, min, max } => {
                write!(f, "{} {} outside [{}, {}]", field, value, min, max)
            }
            Inconsistency::InvertedPressure { systolic, diastolic } => {
                write!(f, "diastolic {} not below systolic {}", diastolic, systolic)
            }
            Inconsistency::AbnormalPulsePressure { pulse_pressure } => {
                write!(f, "abnormal pulse pressure {}", pulse_pressure)
            }
            Inconsistency::TachycardiaWithLowPressure => {
                f.write_str("elevated heart rate with low blood pressure")
            }
            Inconsistency::BradycardiaWithHighPressure => {
                f.write_str("low heart rate with high blood pressure")
            }
            Inconsistency::LowSaturationWithoutTachycardia => {
                f.write_str("low SpO2 without elevated heart rate")
            }
            Inconsistency::MetabolicMismatch { field } => {
                write!(f, "high glucose with low {}", field)
            }
        }
    }
}

/// Multiplicative corrections per field, 1.0 = none
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionFactors {
    factors: [f32; 7],
}

impl Default for CorrectionFactors {
    fn default() -> Self {
        Self { factors: [1.0; 7] }
    }
}

fn index(field: MeasurementField) -> usize {
    match field {
        HeartRate => 0,
        Spo2 => 1,
        Systolic => 2,
        Diastolic => 3,
        Glucose => 4,
        Cholesterol => 5,
        Triglycerides => 6,
    }
}

impl CorrectionFactors {
    /// Factor for one field
    pub fn get(&self, field: MeasurementField) -> f32 {
        self.factors[index(field)]
    }

    /// Multiply a correction into one field
    pub fn multiply(&mut self, field: MeasurementField, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.factors[index(field)] *= factor;
        }
    }

    /// Whether no correction is recorded
    pub fn is_identity(&self) -> bool {
        self.factors.iter().all(|f| *f == 1.0)
    }
}

/// Outcome of one validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// At most four inconsistencies
    pub is_valid: bool,
    /// `max(0.1, 1 - 0.15 n)`
    pub confidence: f32,
    /// Suggested corrections
    pub adjustment_factors: CorrectionFactors,
    /// Everything flagged, in detection order
    pub inconsistencies: heapless::Vec<Inconsistency, MAX_INCONSISTENCIES>,
}

impl ValidationReport {
    /// Error form for callers that want to propagate a failed validation
    pub fn into_result(self) -> ProcessingResult<Self> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(ProcessingError::CrossValidationFailed {
                inconsistencies: self.inconsistencies.len(),
            })
        }
    }
}

/// Rule-based physiological consistency checker
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossValidator;

impl CrossValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    /// Check a snapshot; corrections are recorded, not applied
    pub fn validate_measurements(&self, m: &Measurements) -> ValidationReport {
        let mut factors = CorrectionFactors::default();
        let mut found: heapless::Vec<Inconsistency, MAX_INCONSISTENCIES> = heapless::Vec::new();
        let mut flag = |i: Inconsistency| {
            log_debug!("cross-validation: {}", i);
            let _ = found.push(i);
        };

        // Range pass
        for field in MeasurementField::ALL {
            let Some(value) = m.present(field) else { continue };
            let (min, max) = field.range();
            if value < min {
                factors.multiply(field, min / value);
            } else if value > max {
                factors.multiply(field, max / value);
            } else {
                continue;
            }
            flag(Inconsistency::OutOfRange { field, value, min, max });
        }

        let hr = m.present(HeartRate);
        let sys = m.present(Systolic);
        let dia = m.present(Diastolic);

        if let (Some(s), Some(d)) = (sys, dia) {
            if d >= s {
                flag(Inconsistency::InvertedPressure { systolic: s, diastolic: d });
            }
            let pp = s - d;
            if pp < MIN_PULSE_PRESSURE_MMHG || pp > ABNORMAL_PULSE_PRESSURE_MAX_MMHG {
                flag(Inconsistency::AbnormalPulsePressure { pulse_pressure: pp });
            }
        }

        // Plausibility pass
        if let Some(hr) = hr {
            let low_bp = sys.is_some_and(|s| s < 110.0) || dia.is_some_and(|d| d < 70.0);
            let high_bp = sys.is_some_and(|s| s > 140.0) || dia.is_some_and(|d| d > 90.0);

            if hr > 100.0 && low_bp {
                factors.multiply(Systolic, 1.05);
                factors.multiply(Diastolic, 1.05);
                flag(Inconsistency::TachycardiaWithLowPressure);
            }
            if hr < 60.0 && high_bp {
                factors.multiply(Systolic, 0.95);
                factors.multiply(Diastolic, 0.95);
                flag(Inconsistency::BradycardiaWithHighPressure);
            }
            if m.present(Spo2).is_some_and(|s| s < 92.0) && hr < 70.0 {
                factors.multiply(Spo2, 1.02);
                flag(Inconsistency::LowSaturationWithoutTachycardia);
            }
        }

        if m.present(Glucose).is_some_and(|g| g > 150.0) {
            if m.present(Cholesterol).is_some_and(|c| c < 150.0) {
                factors.multiply(Cholesterol, 1.03);
                flag(Inconsistency::MetabolicMismatch { field: Cholesterol });
            }
            if m.present(Triglycerides).is_some_and(|t| t < 120.0) {
                factors.multiply(Triglycerides, 1.03);
                flag(Inconsistency::MetabolicMismatch { field: Triglycerides });
            }
        }

        let n = found.len();
        ValidationReport {
            is_valid: n <= MAX_TOLERATED_INCONSISTENCIES,
            confidence: (1.0 - INCONSISTENCY_PENALTY * n as f32).max(MIN_VALIDATION_CONFIDENCE),
            adjustment_factors: factors,
            inconsistencies: found,
        }
    }

    /// Apply recorded corrections, re-clamp, re-enforce pulse pressure
    pub fn apply_adjustments(&self, m: &Measurements, report: &ValidationReport) -> Measurements {
        let mut out = *m;
        for field in MeasurementField::ALL {
            let Some(value) = m.present(field) else { continue };
            let factor = report.adjustment_factors.get(field);
            out.set(field, Some(field.clamp(value * factor)));
        }
        enforce_pulse_pressure(out)
    }
}

/// Lower diastolic so that `systolic - diastolic >= 20` when both are known
pub fn enforce_pulse_pressure(mut m: Measurements) -> Measurements {
    if let (Some(s), Some(d)) = (m.present(Systolic), m.present(Diastolic)) {
        let ceiling = s - MIN_PULSE_PRESSURE_MMHG;
        if d > ceiling {
            m.set(Diastolic, Some(Diastolic.clamp(ceiling)));
        }
    }
    m
}
