//! Timing Constants
//!
//! Sampling assumptions and interval limits. Camera PPG arrives at the video
//! frame rate, so every window size in samples is derived from
//! `DEFAULT_SAMPLE_RATE_HZ`.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: f32 = 1000.0;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: f32 = 60.0;

/// Milliseconds per minute (beats-per-minute conversions).
pub const MS_PER_MINUTE: f32 = MS_PER_SECOND * SECONDS_PER_MINUTE;

// ===== SAMPLING =====

/// Default frame rate of the capture layer (Hz).
pub const DEFAULT_SAMPLE_RATE_HZ: f32 = 30.0;

// ===== RR INTERVALS =====

/// Shortest RR interval the peak detector accepts (ms).
///
/// Also sets the minimum peak spacing: 450 ms at 30 Hz is 14 samples.
pub const DETECTOR_MIN_RR_MS: f32 = 450.0;

/// Longest RR interval the peak detector accepts (ms).
pub const DETECTOR_MAX_RR_MS: f32 = 1500.0;

/// Lower bound for externally supplied RR intervals (ms).
pub const RR_DATA_MIN_MS: f32 = 300.0;

/// Silence after the last registered peak that discards stored intervals (ms).
///
/// Twice the longest accepted RR interval: two missed beats in a row mean
/// the pulse is gone, not merely slow.
pub const PEAK_TIMEOUT_MS: f32 = 2.0 * DETECTOR_MAX_RR_MS;

/// Upper bound for externally supplied RR intervals (ms).
pub const RR_DATA_MAX_MS: f32 = 2000.0;

// ===== CONDITIONING =====

/// Cutoff of the level tracker the distributor applies gain around (Hz).
///
/// Well below the slowest heart rate (40 bpm = 0.67 Hz), so the pulse
/// is scaled and the exposure level is not.
pub const LEVEL_TRACK_HZ: f32 = 0.1;

/// Half width of the moving average removed before measuring amplitude (s).
pub const DETREND_HALF_WINDOW_S: f32 = 0.5;

// ===== FRESHNESS AND DEADLINES =====

/// Age after which a cached snapshot is no longer replayed (ms).
pub const DEFAULT_STALE_AFTER_MS: u64 = 3000;

/// Deadline for one accelerator round-trip (ms).
pub const DEFAULT_ACCELERATOR_TIMEOUT_MS: u64 = 1500;
