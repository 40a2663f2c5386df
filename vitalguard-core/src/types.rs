//! Shared domain types
//!
//! The raw input record, the vital-sign kinds the distributor routes by, and
//! the flat `Measurements` snapshot the precision layer operates on.

use core::fmt;

use crate::constants::physiology::*;
use crate::time::Timestamp;

/// One PPG sample as produced by the extraction layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawSample {
    /// Scalar brightness value for the frame
    pub value: f32,
    /// Frame timestamp (ms)
    pub timestamp: Timestamp,
    /// Upstream quality estimate, 0-100
    pub quality: f32,
    /// Whether a finger covers the lens
    pub finger_detected: bool,
}

impl RawSample {
    /// Sample with full quality and finger present
    pub fn new(value: f32, timestamp: Timestamp) -> Self {
        Self {
            value,
            timestamp,
            quality: 100.0,
            finger_detected: true,
        }
    }

    /// Builder-style quality override
    pub fn with_quality(mut self, quality: f32, finger_detected: bool) -> Self {
        self.quality = quality;
        self.finger_detected = finger_detected;
        self
    }

    /// Upstream gate: finger present and quality strictly above `threshold`
    pub fn passes_gate(&self, threshold: f32) -> bool {
        self.finger_detected && self.quality > threshold && self.value.is_finite()
    }
}

/// Kind of vital sign, one per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VitalSignType {
    /// Heart rate and rhythm
    Cardiac,
    /// Oxygen saturation
    Spo2,
    /// Systolic / diastolic pressure
    BloodPressure,
    /// Blood glucose
    Glucose,
    /// Cholesterol and triglycerides
    Lipids,
}

impl VitalSignType {
    /// All kinds in registration order
    pub const ALL: [VitalSignType; 5] = [
        VitalSignType::Cardiac,
        VitalSignType::Spo2,
        VitalSignType::BloodPressure,
        VitalSignType::Glucose,
        VitalSignType::Lipids,
    ];

    /// Short stable identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalSignType::Cardiac => "cardiac",
            VitalSignType::Spo2 => "spo2",
            VitalSignType::BloodPressure => "blood_pressure",
            VitalSignType::Glucose => "glucose",
            VitalSignType::Lipids => "lipids",
        }
    }
}

impl fmt::Display for VitalSignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual numeric field of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasurementField {
    /// Beats per minute
    HeartRate,
    /// Percent saturation
    Spo2,
    /// Systolic mmHg
    Systolic,
    /// Diastolic mmHg
    Diastolic,
    /// Glucose mg/dL
    Glucose,
    /// Total cholesterol mg/dL
    Cholesterol,
    /// Triglycerides mg/dL
    Triglycerides,
}

impl MeasurementField {
    /// All fields
    pub const ALL: [MeasurementField; 7] = [
        MeasurementField::HeartRate,
        MeasurementField::Spo2,
        MeasurementField::Systolic,
        MeasurementField::Diastolic,
        MeasurementField::Glucose,
        MeasurementField::Cholesterol,
        MeasurementField::Triglycerides,
    ];

    /// Hard physiological bounds `(min, max)`
    pub fn range(&self) -> (f32, f32) {
        match self {
            MeasurementField::HeartRate => (HEART_RATE_MIN_BPM, HEART_RATE_MAX_BPM),
            MeasurementField::Spo2 => (SPO2_MIN_PCT, SPO2_MAX_PCT),
            MeasurementField::Systolic => (SYSTOLIC_MIN_MMHG, SYSTOLIC_MAX_MMHG),
            MeasurementField::Diastolic => (DIASTOLIC_MIN_MMHG, DIASTOLIC_MAX_MMHG),
            MeasurementField::Glucose => (GLUCOSE_MIN_MG_DL, GLUCOSE_MAX_MG_DL),
            MeasurementField::Cholesterol => (CHOLESTEROL_MIN_MG_DL, CHOLESTEROL_MAX_MG_DL),
            MeasurementField::Triglycerides => (TRIGLYCERIDES_MIN_MG_DL, TRIGLYCERIDES_MAX_MG_DL),
        }
    }

    /// Reference value calibration ratios are taken against
    pub fn theoretical_normal(&self) -> f32 {
        match self {
            MeasurementField::HeartRate => HEART_RATE_NORMAL_BPM,
            MeasurementField::Spo2 => SPO2_NORMAL_PCT,
            MeasurementField::Systolic => SYSTOLIC_NORMAL_MMHG,
            MeasurementField::Diastolic => DIASTOLIC_NORMAL_MMHG,
            MeasurementField::Glucose => GLUCOSE_NORMAL_MG_DL,
            MeasurementField::Cholesterol => CHOLESTEROL_NORMAL_MG_DL,
            MeasurementField::Triglycerides => TRIGLYCERIDES_NORMAL_MG_DL,
        }
    }

    /// Clamp a value into this field's bounds
    pub fn clamp(&self, value: f32) -> f32 {
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementField::HeartRate => "heart_rate",
            MeasurementField::Spo2 => "spo2",
            MeasurementField::Systolic => "systolic",
            MeasurementField::Diastolic => "diastolic",
            MeasurementField::Glucose => "glucose",
            MeasurementField::Cholesterol => "cholesterol",
            MeasurementField::Triglycerides => "triglycerides",
        }
    }
}

impl fmt::Display for MeasurementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat snapshot of all vitals; `None` means "not available"
///
/// Used for calibration references and cross-validation. Zero values are
/// treated like `None` by the precision layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Measurements {
    /// Heart rate (bpm)
    pub heart_rate: Option<f32>,
    /// SpO2 (%)
    pub spo2: Option<f32>,
    /// Systolic (mmHg)
    pub systolic: Option<f32>,
    /// Diastolic (mmHg)
    pub diastolic: Option<f32>,
    /// Glucose (mg/dL)
    pub glucose: Option<f32>,
    /// Total cholesterol (mg/dL)
    pub cholesterol: Option<f32>,
    /// Triglycerides (mg/dL)
    pub triglycerides: Option<f32>,
}

impl Measurements {
    /// Read one field
    pub fn get(&self, field: MeasurementField) -> Option<f32> {
        match field {
            MeasurementField::HeartRate => self.heart_rate,
            MeasurementField::Spo2 => self.spo2,
            MeasurementField::Systolic => self.systolic,
            MeasurementField::Diastolic => self.diastolic,
            MeasurementField::Glucose => self.glucose,
            MeasurementField::Cholesterol => self.cholesterol,
            MeasurementField::Triglycerides => self.triglycerides,
        }
    }

    /// Field value if present, finite and strictly positive
    pub fn present(&self, field: MeasurementField) -> Option<f32> {
        self.get(field).filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Write one field
    pub fn set(&mut self, field: MeasurementField, value: Option<f32>) {
        let slot = match field {
            MeasurementField::HeartRate => &mut self.heart_rate,
            MeasurementField::Spo2 => &mut self.spo2,
            MeasurementField::Systolic => &mut self.systolic,
            MeasurementField::Diastolic => &mut self.diastolic,
            MeasurementField::Glucose => &mut self.glucose,
            MeasurementField::Cholesterol => &mut self.cholesterol,
            MeasurementField::Triglycerides => &mut self.triglycerides,
        };
        *slot = value;
    }

    /// Builder-style setter
    pub fn with(mut self, field: MeasurementField, value: f32) -> Self {
        self.set(field, Some(value));
        self
    }

    /// Whether at least one field is usable
    pub fn has_any(&self) -> bool {
        MeasurementField::ALL.iter().any(|f| self.present(*f).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_requires_finger_and_quality() {
        let s = RawSample::new(0.5, 0);
        assert!(s.passes_gate(30.0));
        assert!(!s.with_quality(30.0, true).passes_gate(30.0));
        assert!(!s.with_quality(90.0, false).passes_gate(30.0));
        assert!(!RawSample::new(f32::NAN, 0).passes_gate(30.0));
    }

    #[test]
    fn present_ignores_zero_and_nan() {
        let m = Measurements::default()
            .with(MeasurementField::Spo2, 0.0)
            .with(MeasurementField::Glucose, f32::NAN)
            .with(MeasurementField::HeartRate, 72.0);
        assert_eq!(m.present(MeasurementField::Spo2), None);
        assert_eq!(m.present(MeasurementField::Glucose), None);
        assert_eq!(m.present(MeasurementField::HeartRate), Some(72.0));
        assert!(m.has_any());
        assert!(!Measurements::default().has_any());
    }

    #[test]
    fn clamp_uses_field_bounds() {
        assert_eq!(MeasurementField::Spo2.clamp(85.0), 90.0);
        assert_eq!(MeasurementField::Systolic.clamp(250.0), 200.0);
    }
}
