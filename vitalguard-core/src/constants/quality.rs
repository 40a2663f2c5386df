//! Quality Thresholds and Confidence Limits

// ===== QUALITY GATE =====

/// Minimum upstream quality (0-100 scale) for a sample to be processed.
///
/// Below this the distributor replays its last good snapshot.
pub const DEFAULT_QUALITY_THRESHOLD: f32 = 30.0;

// ===== CONFIDENCE =====

/// Highest confidence a channel can report after blending.
///
/// Camera PPG is never certain; reporting 1.0 would mislead the UI.
pub const CONFIDENCE_CEILING: f32 = 0.95;

/// Lowest confidence a channel reports while its input is valid.
pub const CONFIDENCE_FLOOR: f32 = 0.1;

/// Weight of the newest target when blending channel confidence.
pub const CONFIDENCE_BLEND: f32 = 0.2;

/// Multiplicative decay applied on invalid or insufficient input.
pub const CONFIDENCE_DECAY: f32 = 0.8;

/// Confidence penalty per cross-validation inconsistency.
pub const INCONSISTENCY_PENALTY: f32 = 0.15;

/// Lowest confidence the cross-validator reports.
pub const MIN_VALIDATION_CONFIDENCE: f32 = 0.1;

/// Inconsistency count above which a snapshot is marked invalid.
pub const MAX_TOLERATED_INCONSISTENCIES: usize = 4;

// ===== SIGNAL PRESENCE =====

/// Absolute level below which a window counts as "no signal".
pub const NEAR_ZERO_SIGNAL: f32 = 1e-6;

/// Peak-to-peak span below which a window is treated as flat.
pub const FLAT_SIGNAL_SPAN: f32 = 1e-4;
