//! Reference-Based Calibration
//!
//! ## Overview
//!
//! An operator can enter ground-truth readings (a cuff measurement, a
//! finger oximeter) while the session runs. Each reference is compared to
//! the theoretical normal of every field it supplies:
//!
//! ```text
//! factor(field)  = mean over references of  value / normal(field)
//! confidence     = min(1, references / 5)
//! calibrated     = references >= 2
//! ```
//!
//! ## Applying
//!
//! The correction is blended by confidence so a single untested reference
//! barely moves the output:
//!
//! ```text
//! v' = v * (factor * confidence + (1 - confidence))
//! ```
//!
//! and the result is clamped to the field's physiological bounds.
//!
//! At most five references are kept; the oldest is evicted first.

use heapless::Deque;

use crate::constants::buffers::CALIBRATION_REFERENCE_CAPACITY;
use crate::time::Timestamp;
use crate::types::{MeasurementField, Measurements};

/// Minimum references before the system counts as calibrated
pub const MIN_REFERENCES_FOR_CALIBRATION: usize = 2;

/// One operator-supplied ground-truth reading
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationReference {
    /// Reference values; absent fields are ignored
    pub measurements: Measurements,
    /// When the reference was taken (ms)
    pub timestamp: Timestamp,
}

impl CalibrationReference {
    /// Reference from a measurement set
    pub fn new(measurements: Measurements, timestamp: Timestamp) -> Self {
        Self { measurements, timestamp }
    }
}

/// Learned factors per field
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationFactors {
    factors: [f32; 7],
    /// Blend weight in `[0, 1]`
    pub confidence: f32,
    /// Timestamp of the newest reference
    pub last_updated: Option<Timestamp>,
}

impl Default for CalibrationFactors {
    fn default() -> Self {
        Self {
            factors: [1.0; 7],
            confidence: 0.0,
            last_updated: None,
        }
    }
}

fn slot(field: MeasurementField) -> usize {
    match field {
        MeasurementField::HeartRate => 0,
        MeasurementField::Spo2 => 1,
        MeasurementField::Systolic => 2,
        MeasurementField::Diastolic => 3,
        MeasurementField::Glucose => 4,
        MeasurementField::Cholesterol => 5,
        MeasurementField::Triglycerides => 6,
    }
}

impl CalibrationFactors {
    /// Factor for one field (1.0 when never referenced)
    pub fn factor(&self, field: MeasurementField) -> f32 {
        self.factors[slot(field)]
    }
}

/// Learns and applies calibration factors
#[derive(Debug, Clone, Default)]
pub struct CalibrationManager {
    references: Deque<CalibrationReference, CALIBRATION_REFERENCE_CAPACITY>,
    factors: CalibrationFactors,
}

impl CalibrationManager {
    /// Manager with no references
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reference and recompute all factors
    ///
    /// Returns `false` when the reference has no usable field.
    pub fn add_reference_data(&mut self, reference: CalibrationReference) -> bool {
        if !reference.measurements.has_any() {
            return false;
        }
        if self.references.is_full() {
            self.references.pop_front();
        }
        // Cannot fail: a slot was freed above
        let _ = self.references.push_back(reference);
        self.recompute();
        log_info!(
            "calibration reference added ({} stored, confidence {})",
            self.references.len(),
            self.factors.confidence
        );
        true
    }

    fn recompute(&mut self) {
        let mut factors = CalibrationFactors::default();
        for field in MeasurementField::ALL {
            let normal = field.theoretical_normal();
            let (sum, count) = self
                .references
                .iter()
                .filter_map(|r| r.measurements.present(field))
                .fold((0.0f32, 0usize), |(s, c), v| (s + v / normal, c + 1));
            if count > 0 {
                factors.factors[slot(field)] = sum / count as f32;
            }
        }
        factors.confidence =
            (self.references.len() as f32 / CALIBRATION_REFERENCE_CAPACITY as f32).min(1.0);
        factors.last_updated = self.references.iter().map(|r| r.timestamp).max();
        self.factors = factors;
    }

    /// Calibrate one value
    ///
    /// Non-positive or non-finite values pass through unchanged.
    pub fn apply_calibration(&self, field: MeasurementField, value: f32) -> f32 {
        if !value.is_finite() || value <= 0.0 {
            return value;
        }
        let c = self.factors.confidence;
        let blended = value * (self.factors.factor(field) * c + (1.0 - c));
        field.clamp(blended)
    }

    /// Calibrate every present field of a snapshot
    pub fn apply_to(&self, measurements: &Measurements) -> Measurements {
        let mut out = *measurements;
        for field in MeasurementField::ALL {
            if let Some(v) = measurements.present(field) {
                out.set(field, Some(self.apply_calibration(field, v)));
            }
        }
        out
    }

    /// At least two references seen
    pub fn is_system_calibrated(&self) -> bool {
        self.references.len() >= MIN_REFERENCES_FOR_CALIBRATION
    }

    /// Current blend weight
    pub fn calibration_confidence(&self) -> f32 {
        self.factors.confidence
    }

    /// Current factors
    pub fn factors(&self) -> &CalibrationFactors {
        &self.factors
    }

    /// Number of stored references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Drop all references and return to identity factors
    pub fn reset_calibration(&mut self) {
        self.references.clear();
        self.factors = CalibrationFactors::default();
        log_info!("calibration reset");
    }
}
