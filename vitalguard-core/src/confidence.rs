//! Confidence Arithmetic
//!
//! All confidences in VitalGuard are plain `f32` in `[0, 1]`. This module
//! keeps the handful of update rules in one place so every channel moves its
//! confidence the same way:
//!
//! ```text
//! valid input:    c' = clamp((1 - w) * c + w * target, FLOOR, CEILING)
//! invalid input:  c' = c * DECAY
//! ```

use crate::constants::quality::{
    CONFIDENCE_BLEND, CONFIDENCE_CEILING, CONFIDENCE_DECAY, CONFIDENCE_FLOOR,
};

/// Clamp a raw score into `[0, 1]`, mapping NaN to zero
pub fn normalize(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Blend the current confidence towards `target` after a valid update
pub fn blend(current: f32, target: f32) -> f32 {
    let blended = (1.0 - CONFIDENCE_BLEND) * current + CONFIDENCE_BLEND * normalize(target);
    blended.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

/// Decay confidence after invalid or insufficient input
pub fn decay(current: f32) -> f32 {
    normalize(current * CONFIDENCE_DECAY)
}

/// Mean of the non-zero confidences, `0.0` if none contributes
pub fn combine(scores: &[f32]) -> f32 {
    let (sum, n) = scores
        .iter()
        .filter(|s| **s > 0.0)
        .fold((0.0f32, 0usize), |(sum, n), s| (sum + normalize(*s), n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}
