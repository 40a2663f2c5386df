//! Buffer Sizes
//!
//! Window and history sizes. Channel windows are expressed in samples at the
//! default 30 Hz frame rate.

// ===== REGISTRIES =====

/// Maximum number of channels a distributor can hold.
///
/// Must be a power of two (heapless index map requirement).
pub const MAX_CHANNELS: usize = 8;

/// Maximum inconsistencies recorded by one cross-validation pass.
pub const MAX_INCONSISTENCIES: usize = 16;

// ===== CHANNEL WINDOWS =====

/// Cardiac window: 3 s, enough for 2-4 beats at resting rates.
pub const CARDIAC_WINDOW: usize = 90;

/// SpO2 window: 2 s.
pub const SPO2_WINDOW: usize = 60;

/// Blood-pressure feature window: 3 s.
pub const BLOOD_PRESSURE_WINDOW: usize = 90;

/// Systolic/diastolic candidate history per channel.
pub const BLOOD_PRESSURE_HISTORY: usize = 20;

/// Glucose feature window: 4 s.
pub const GLUCOSE_WINDOW: usize = 120;

/// Lipid feature window: 4 s.
pub const LIPIDS_WINDOW: usize = 120;

// ===== HISTORIES =====

/// RR intervals kept by the detector and by `RrIntervalData`.
pub const RR_INTERVAL_CAPACITY: usize = 20;

/// Reference measurements kept by the calibration manager.
pub const CALIBRATION_REFERENCE_CAPACITY: usize = 5;

/// Recent Kalman gains used to adapt process noise.
pub const GAIN_HISTORY_SIZE: usize = 10;

/// Slope-sum samples used to recompute the adaptive threshold.
pub const THRESHOLD_HISTORY: usize = 30;

/// Raw samples kept for environmental estimation.
pub const ENVIRONMENT_WINDOW: usize = 60;

// ===== BATCHING =====

/// Default accelerator batch size (1 s of frames).
pub const DEFAULT_BATCH_SIZE: usize = 30;
