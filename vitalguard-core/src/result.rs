//! Display-ready processing result
//!
//! One [`VitalSignsResult`] is produced per processed sample. Display fields
//! are rounded integers with `0` meaning "not available"; the unrounded
//! values the precision layer settled on are kept in `measurements`.

use core::fmt;

use libm::roundf;

use crate::channels::ArrhythmiaStatus;
use crate::time::Timestamp;
use crate::types::Measurements;

/// Systolic/diastolic pair, displayed as `"120/80"`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BloodPressure {
    /// Systolic (mmHg)
    pub systolic: u32,
    /// Diastolic (mmHg)
    pub diastolic: u32,
}

impl BloodPressure {
    /// Both values known
    pub fn is_available(&self) -> bool {
        self.systolic > 0 && self.diastolic > 0
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_available() {
            write!(f, "{}/{}", self.systolic, self.diastolic)
        } else {
            f.write_str("--/--")
        }
    }
}

/// Lipid panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lipids {
    /// Total cholesterol (mg/dL)
    pub total_cholesterol: u32,
    /// Triglycerides (mg/dL)
    pub triglycerides: u32,
}

/// Where the overall precision came from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceBreakdown {
    /// Cardiac channel
    pub cardiac: f32,
    /// SpO2 channel
    pub spo2: f32,
    /// Blood-pressure channel
    pub blood_pressure: f32,
    /// Glucose channel
    pub glucose: f32,
    /// Lipids channel
    pub lipids: f32,
    /// Cross-validation confidence
    pub validation: f32,
    /// Environmental confidence factor
    pub environment: f32,
    /// Calibration blend weight
    pub calibration: f32,
    /// Confidence of the latest block enhancement, if one was accepted
    pub enhancement: Option<f32>,
}

impl ConfidenceBreakdown {
    /// Channel confidences in registry order
    pub fn channels(&self) -> [f32; 5] {
        [self.cardiac, self.spo2, self.blood_pressure, self.glucose, self.lipids]
    }
}

/// Terminal snapshot for one processed sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VitalSignsResult {
    /// Timestamp of the sample that produced this result (ms)
    pub timestamp: Timestamp,
    /// Heart rate (bpm)
    pub heart_rate: u32,
    /// SpO2 (%)
    pub spo2: u32,
    /// Blood pressure
    pub blood_pressure: BloodPressure,
    /// Glucose (mg/dL)
    pub glucose: u32,
    /// Lipids
    pub lipids: Lipids,
    /// Rhythm status
    pub arrhythmia: ArrhythmiaStatus,
    /// Rhythm regularity in `[0, 1]`
    pub rhythm_regularity: f32,
    /// Per-source confidences
    pub confidence: ConfidenceBreakdown,
    /// Overall precision in `[0, 1]`
    pub precision: f32,
    /// At least two calibration references were applied
    pub calibrated: bool,
    /// Cross-validation passed
    pub correlation_validated: bool,
    /// Environmental factors were not neutral
    pub environment_adjusted: bool,
    /// Replayed from an earlier sample
    pub stale: bool,
    /// Time since the replayed result was computed (ms), 0 when fresh
    pub age_ms: u64,
    /// Inconsistencies found by cross-validation
    pub inconsistency_count: usize,
    /// Final unrounded values
    pub measurements: Measurements,
}

/// Round a vital for display, 0 for missing or non-positive values
pub fn display_value(value: Option<f32>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => roundf(v) as u32,
        _ => 0,
    }
}

impl VitalSignsResult {
    /// Placeholder with every vital unavailable
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Fill the display fields from final measurements
    pub fn with_measurements(mut self, m: Measurements) -> Self {
        self.heart_rate = display_value(m.heart_rate);
        self.spo2 = display_value(m.spo2);
        self.blood_pressure = BloodPressure {
            systolic: display_value(m.systolic),
            diastolic: display_value(m.diastolic),
        };
        self.glucose = display_value(m.glucose);
        self.lipids = Lipids {
            total_cholesterol: display_value(m.cholesterol),
            triglycerides: display_value(m.triglycerides),
        };
        self.measurements = m;
        self
    }

    /// Nothing was estimated
    pub fn is_empty(&self) -> bool {
        !self.measurements.has_any()
    }

    /// Replay of this result at `now`
    pub fn replayed(&self, now: Timestamp) -> Self {
        Self {
            stale: true,
            age_ms: crate::time::age_ms(now, self.timestamp),
            ..*self
        }
    }
}
