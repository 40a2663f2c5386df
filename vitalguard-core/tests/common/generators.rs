//! Synthetic PPG generators
//!
//! All series are sampled at 30 Hz with 33 ms timestamps unless stated
//! otherwise, and carry quality 80 with the finger present.

use std::f32::consts::PI;

use vitalguard_core::{RawSample, Timestamp};

/// Frame period at 30 Hz (ms)
pub const FRAME_MS: Timestamp = 33;

/// Sample rate of every generator (Hz)
pub const SAMPLE_RATE_HZ: f32 = 30.0;

/// Deterministic linear congruential generator
pub struct TestRng {
    state: u32,
}

impl TestRng {
    /// Seeded generator
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Uniform in `[0, 1)`
    pub fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in `[lo, hi)`
    pub fn gen_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }
}

fn sample(i: usize, value: f32) -> RawSample {
    RawSample::new(value, i as Timestamp * FRAME_MS).with_quality(80.0, true)
}

/// Constant series
pub fn flatline(value: f32, n: usize) -> Vec<RawSample> {
    (0..n).map(|i| sample(i, value)).collect()
}

/// `offset + amplitude * sin(2π f t)`
pub fn sine_pulse(freq_hz: f32, amplitude: f32, offset: f32, n: usize) -> Vec<RawSample> {
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE_HZ;
            sample(i, offset + amplitude * (2.0 * PI * freq_hz * t).sin())
        })
        .collect()
}

/// Phase-continuous pulse switching from `from_hz` to `to_hz` at sample `switch_at`
pub fn rate_change(from_hz: f32, to_hz: f32, switch_at: usize, offset: f32, n: usize) -> Vec<RawSample> {
    let mut phase = 0.0f32;
    (0..n)
        .map(|i| {
            let value = offset + phase.sin();
            let freq = if i < switch_at { from_hz } else { to_hz };
            phase = (phase + 2.0 * PI * freq / SAMPLE_RATE_HZ) % (2.0 * PI);
            sample(i, value)
        })
        .collect()
}

/// `pulse_n` samples of a unit sine pulse, then `flat_n` samples held at `offset`
pub fn pulse_then_flat(freq_hz: f32, offset: f32, pulse_n: usize, flat_n: usize) -> Vec<RawSample> {
    let mut samples = sine_pulse(freq_hz, 1.0, offset, pulse_n);
    samples.extend((pulse_n..pulse_n + flat_n).map(|i| sample(i, offset)));
    samples
}

/// Sine pulse with uniform noise of `±noise`
pub fn noisy_pulse(freq_hz: f32, amplitude: f32, noise: f32, n: usize, seed: u32) -> Vec<RawSample> {
    let mut rng = TestRng::new(seed);
    sine_pulse(freq_hz, amplitude, 0.0, n)
        .into_iter()
        .map(|mut s| {
            s.value += rng.gen_range(-noise, noise);
            s
        })
        .collect()
}

/// Pulse whose beat-to-beat period alternates between `fast_hz` and `slow_hz`
pub fn irregular_pulse(fast_hz: f32, slow_hz: f32, n: usize) -> Vec<RawSample> {
    let mut phase = 0.0f32;
    let mut beat = 0usize;
    (0..n)
        .map(|i| {
            let freq = if beat % 2 == 0 { fast_hz } else { slow_hz };
            phase += 2.0 * PI * freq / SAMPLE_RATE_HZ;
            if phase >= 2.0 * PI {
                phase -= 2.0 * PI;
                beat += 1;
            }
            sample(i, phase.sin())
        })
        .collect()
}

/// Replace the gate fields of every sample in `range`
pub fn with_dropout(
    mut samples: Vec<RawSample>,
    range: std::ops::Range<usize>,
) -> Vec<RawSample> {
    for s in samples.iter_mut().take(range.end).skip(range.start) {
        s.finger_detected = false;
        s.quality = 0.0;
    }
    samples
}
