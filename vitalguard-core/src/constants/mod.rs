//! Constants for VitalGuard Core
//!
//! Centralized, documented constants used throughout the signal-processing
//! core. Numeric values live here instead of being scattered through the
//! channel implementations, so that a reviewer can audit every physiological
//! bound and every timing assumption in one place.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Physiology**: Hard bounds and reference values per vital sign
//! - **Timing**: Sampling rate, RR-interval limits, accelerator deadlines
//! - **Buffers**: Window and history sizes per channel
//! - **Quality**: Gate thresholds and confidence limits
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name (`_MS`, `_HZ`, `_BPM`, `_MMHG`, `_MG_DL`)
//! 3. Keep tunable defaults here and expose them through config structs

/// Physiological bounds and theoretical-normal reference values.
pub mod physiology;

/// Sampling and interval timing.
pub mod timing;

/// Window, history and registry sizes.
pub mod buffers;

/// Quality gate thresholds and confidence limits.
pub mod quality;

pub use physiology::{
    HEART_RATE_MIN_BPM, HEART_RATE_MAX_BPM,
    SPO2_MIN_PCT, SPO2_MAX_PCT,
    SYSTOLIC_MIN_MMHG, SYSTOLIC_MAX_MMHG,
    DIASTOLIC_MIN_MMHG, DIASTOLIC_MAX_MMHG,
    MIN_PULSE_PRESSURE_MMHG,
};

pub use timing::{
    MS_PER_SECOND, SECONDS_PER_MINUTE, MS_PER_MINUTE,
    DEFAULT_SAMPLE_RATE_HZ, DEFAULT_ACCELERATOR_TIMEOUT_MS,
};

pub use buffers::{
    MAX_CHANNELS, RR_INTERVAL_CAPACITY, CALIBRATION_REFERENCE_CAPACITY,
    DEFAULT_BATCH_SIZE,
};

pub use quality::{
    DEFAULT_QUALITY_THRESHOLD, CONFIDENCE_CEILING, CONFIDENCE_FLOOR,
};
