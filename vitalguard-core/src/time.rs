//! Time handling for the sample stream
//!
//! Timestamps come from the capture layer (frame presentation time) and are
//! treated as opaque monotonic milliseconds. The core never reads a clock
//! itself.

/// Timestamp in milliseconds, as stamped by the capture layer
pub type Timestamp = u64;

/// Milliseconds elapsed from `then` to `now`, zero if the clock went backwards
pub fn age_ms(now: Timestamp, then: Timestamp) -> u64 {
    now.saturating_sub(then)
}

/// Duration of `samples` samples at `sample_rate_hz`, in milliseconds
pub fn samples_to_ms(samples: usize, sample_rate_hz: f32) -> f32 {
    if sample_rate_hz <= 0.0 {
        return 0.0;
    }
    samples as f32 * crate::constants::MS_PER_SECOND / sample_rate_hz
}

/// Number of whole samples spanning at least `ms` at `sample_rate_hz`
pub fn ms_to_samples(ms: f32, sample_rate_hz: f32) -> usize {
    if ms <= 0.0 || sample_rate_hz <= 0.0 {
        return 0;
    }
    libm::ceilf(ms * sample_rate_hz / crate::constants::MS_PER_SECOND) as usize
}
