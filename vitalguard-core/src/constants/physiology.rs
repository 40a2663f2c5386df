//! Physiological Bounds and Reference Values
//!
//! Hard bounds every computed vital is clamped to, and the "theoretical
//! normal" values the calibration layer divides reference measurements by.
//! Bounds are deliberately the plausible range for a resting adult measured
//! with a phone camera, not the extreme clinical range.

// ===== HEART RATE =====

/// Lowest heart rate the cardiac channel reports (beats per minute).
pub const HEART_RATE_MIN_BPM: f32 = 40.0;

/// Highest heart rate the cardiac channel reports (beats per minute).
pub const HEART_RATE_MAX_BPM: f32 = 180.0;

/// Resting heart rate used as calibration reference (bpm).
pub const HEART_RATE_NORMAL_BPM: f32 = 70.0;

// ===== OXYGEN SATURATION =====

/// Lower SpO2 bound (percent).
///
/// Camera PPG cannot resolve desaturation below this level reliably.
pub const SPO2_MIN_PCT: f32 = 90.0;

/// Upper SpO2 bound (percent).
pub const SPO2_MAX_PCT: f32 = 100.0;

/// Baseline SpO2 the channel model starts from (percent).
pub const SPO2_BASELINE_PCT: f32 = 97.0;

/// Calibration reference for SpO2 (percent).
pub const SPO2_NORMAL_PCT: f32 = 97.0;

// ===== BLOOD PRESSURE =====

/// Lower systolic bound (mmHg).
pub const SYSTOLIC_MIN_MMHG: f32 = 80.0;

/// Upper systolic bound (mmHg).
pub const SYSTOLIC_MAX_MMHG: f32 = 200.0;

/// Lower diastolic bound (mmHg).
pub const DIASTOLIC_MIN_MMHG: f32 = 40.0;

/// Upper diastolic bound (mmHg).
pub const DIASTOLIC_MAX_MMHG: f32 = 120.0;

/// Calibration reference for systolic pressure (mmHg).
pub const SYSTOLIC_NORMAL_MMHG: f32 = 120.0;

/// Calibration reference for diastolic pressure (mmHg).
pub const DIASTOLIC_NORMAL_MMHG: f32 = 80.0;

/// Minimum systolic - diastolic gap enforced on every output (mmHg).
pub const MIN_PULSE_PRESSURE_MMHG: f32 = 20.0;

/// Pulse pressure band the blood-pressure channel keeps its candidates in.
pub const CHANNEL_PULSE_PRESSURE_MIN_MMHG: f32 = 25.0;

/// Upper end of the channel pulse-pressure band (mmHg).
pub const CHANNEL_PULSE_PRESSURE_MAX_MMHG: f32 = 70.0;

/// Pulse pressure above which the cross-validator flags the pair (mmHg).
pub const ABNORMAL_PULSE_PRESSURE_MAX_MMHG: f32 = 60.0;

// ===== METABOLIC =====

/// Lower glucose bound (mg/dL).
pub const GLUCOSE_MIN_MG_DL: f32 = 70.0;

/// Upper glucose bound (mg/dL).
pub const GLUCOSE_MAX_MG_DL: f32 = 180.0;

/// Baseline the glucose model starts from (mg/dL).
pub const GLUCOSE_BASELINE_MG_DL: f32 = 90.0;

/// Calibration reference for glucose (mg/dL).
pub const GLUCOSE_NORMAL_MG_DL: f32 = 100.0;

/// Lower total cholesterol bound (mg/dL).
pub const CHOLESTEROL_MIN_MG_DL: f32 = 120.0;

/// Upper total cholesterol bound (mg/dL).
pub const CHOLESTEROL_MAX_MG_DL: f32 = 300.0;

/// Calibration reference and model baseline for cholesterol (mg/dL).
pub const CHOLESTEROL_NORMAL_MG_DL: f32 = 180.0;

/// Lower triglycerides bound (mg/dL).
pub const TRIGLYCERIDES_MIN_MG_DL: f32 = 50.0;

/// Upper triglycerides bound (mg/dL).
pub const TRIGLYCERIDES_MAX_MG_DL: f32 = 400.0;

/// Calibration reference and model baseline for triglycerides (mg/dL).
pub const TRIGLYCERIDES_NORMAL_MG_DL: f32 = 150.0;
