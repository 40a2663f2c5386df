//! Blood-pressure channel
//!
//! ## Model
//!
//! Three features of the filtered window drive the candidate pair:
//!
//! - pulse amplitude `a` (max - min, capped at 5)
//! - pulse rate `r` from zero crossings around the mean (70 bpm when the
//!   window holds fewer than two crossings)
//! - signal level `l` (mean, clamped to ±10)
//!
//! ```text
//! systolic  = 115 + 12a + 0.40(r - 70) + 0.8l
//! diastolic =  76 +  4a + 0.15(r - 70) + 0.4l
//! ```
//!
//! Systolic reacts more strongly to amplitude and rate than diastolic. The
//! pulse pressure of every candidate is pulled into `[25, 70]` by moving the
//! diastolic value. Candidates go into 20-entry histories; the reported
//! value is `0.6 * median + 0.4 * mean` of each history after 1.5 x IQR
//! outlier rejection.
//!
//! ## Precision
//!
//! `clamp((1 - mean relative std) * fill ratio, 0, 1)` over the two
//! histories. It doubles as the confidence target.

use super::{ChannelCore, ChannelFeedback, ChannelOutput, VitalChannel};
use crate::buffer::CircularBuffer;
use crate::constants::buffers::{BLOOD_PRESSURE_HISTORY, BLOOD_PRESSURE_WINDOW};
use crate::constants::physiology::*;
use crate::constants::timing::SECONDS_PER_MINUTE;
use crate::filter::FilterConfig;
use crate::stats;
use crate::types::VitalSignType;

const MIN_SAMPLES: usize = 30;
const AMPLITUDE_CAP: f32 = 5.0;
const LEVEL_LIMIT: f32 = 10.0;
const REFERENCE_RATE_BPM: f32 = 70.0;
const IQR_FACTOR: f32 = 1.5;

/// Blood-pressure reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BloodPressureOutput {
    /// Systolic (mmHg), 0 when unknown
    pub systolic: f32,
    /// Diastolic (mmHg), 0 when unknown
    pub diastolic: f32,
    /// History agreement in `[0, 1]`
    pub precision: f32,
    /// Channel confidence
    pub confidence: f32,
}

/// Systolic/diastolic estimator
#[derive(Debug, Clone)]
pub struct BloodPressureChannel {
    core: ChannelCore<BLOOD_PRESSURE_WINDOW>,
    systolic_history: CircularBuffer<f32, BLOOD_PRESSURE_HISTORY>,
    diastolic_history: CircularBuffer<f32, BLOOD_PRESSURE_HISTORY>,
}

impl Default for BloodPressureChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Enforce the channel pulse-pressure band by moving diastolic
fn enforce_pulse_pressure(systolic: f32, diastolic: f32) -> f32 {
    let pp = systolic - diastolic;
    if pp < CHANNEL_PULSE_PRESSURE_MIN_MMHG {
        systolic - CHANNEL_PULSE_PRESSURE_MIN_MMHG
    } else if pp > CHANNEL_PULSE_PRESSURE_MAX_MMHG {
        systolic - CHANNEL_PULSE_PRESSURE_MAX_MMHG
    } else {
        diastolic
    }
}

/// Robust central value of a history
fn robust_center(values: &[f32]) -> f32 {
    let kept = stats::iqr_filter(values, IQR_FACTOR);
    let kept = if kept.is_empty() { values } else { &kept[..] };
    let median = stats::median(kept).unwrap_or(0.0);
    0.6 * median + 0.4 * stats::mean(kept)
}

impl BloodPressureChannel {
    /// Create the channel
    pub fn new() -> Self {
        Self::with_filter(FilterConfig::default())
    }

    /// Channel with a custom input filter
    pub fn with_filter(filter: FilterConfig) -> Self {
        Self {
            core: ChannelCore::with_filter(VitalSignType::BloodPressure, filter),
            systolic_history: CircularBuffer::new(),
            diastolic_history: CircularBuffer::new(),
        }
    }

    fn neutral(&mut self) -> ChannelOutput {
        let confidence = self.core.reject();
        self.core.update_feedback(false, None);
        ChannelOutput::BloodPressure(BloodPressureOutput {
            confidence,
            ..BloodPressureOutput::default()
        })
    }

    /// Candidate pair from the current window
    fn candidate(&self) -> (f32, f32) {
        let window = self.core.window();
        let amplitude = stats::span(&window).min(AMPLITUDE_CAP);
        let level = stats::mean(&window);

        let crossings = stats::zero_crossings(&window, level);
        let window_s = self.core.window_seconds();
        let rate = if crossings < 2 || window_s <= 0.0 {
            REFERENCE_RATE_BPM
        } else {
            (crossings as f32 / 2.0 / window_s * SECONDS_PER_MINUTE)
                .clamp(HEART_RATE_MIN_BPM, HEART_RATE_MAX_BPM)
        };
        let level = level.clamp(-LEVEL_LIMIT, LEVEL_LIMIT);
        let rate_delta = rate - REFERENCE_RATE_BPM;

        let systolic = 115.0 + 12.0 * amplitude + 0.4 * rate_delta + 0.8 * level;
        let diastolic = 76.0 + 4.0 * amplitude + 0.15 * rate_delta + 0.4 * level;
        (systolic, enforce_pulse_pressure(systolic, diastolic))
    }

    fn precision(&self, systolic: &[f32], diastolic: &[f32]) -> f32 {
        let rel = |v: &[f32]| {
            let m = stats::mean(v);
            if m > 0.0 { stats::std_dev(v) / m } else { 1.0 }
        };
        let mean_rel_std = (rel(systolic) + rel(diastolic)) / 2.0;
        let fill = systolic.len() as f32 / BLOOD_PRESSURE_HISTORY as f32;
        ((1.0 - mean_rel_std) * fill).clamp(0.0, 1.0)
    }

    /// Number of stored candidate pairs
    pub fn history_len(&self) -> usize {
        self.systolic_history.len()
    }
}

impl VitalChannel for BloodPressureChannel {
    fn channel_type(&self) -> VitalSignType {
        VitalSignType::BloodPressure
    }

    fn process_signal(&mut self, value: f32) -> ChannelOutput {
        if self.core.push(value).is_none() || !self.core.ready(MIN_SAMPLES) {
            return self.neutral();
        }

        let (s, d) = self.candidate();
        self.systolic_history.push(s);
        self.diastolic_history.push(d);

        let systolic_hist = self.systolic_history.to_vec();
        let diastolic_hist = self.diastolic_history.to_vec();

        let systolic = robust_center(&systolic_hist).clamp(SYSTOLIC_MIN_MMHG, SYSTOLIC_MAX_MMHG);
        let diastolic_ceiling = DIASTOLIC_MAX_MMHG.min(systolic - MIN_PULSE_PRESSURE_MMHG);
        let diastolic = robust_center(&diastolic_hist).clamp(DIASTOLIC_MIN_MMHG, diastolic_ceiling);

        let precision = self.precision(&systolic_hist, &diastolic_hist);
        let confidence = self.core.accept(precision);
        self.core.update_feedback(true, None);

        ChannelOutput::BloodPressure(BloodPressureOutput {
            systolic,
            diastolic,
            precision,
            confidence,
        })
    }

    fn confidence(&self) -> f32 {
        self.core.confidence()
    }

    fn feedback(&self) -> Option<ChannelFeedback> {
        self.core.last_feedback()
    }

    fn reset(&mut self) {
        self.core.reset();
        self.systolic_history.clear();
        self.diastolic_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    fn last(channel: &mut BloodPressureChannel, values: impl Iterator<Item = f32>) -> BloodPressureOutput {
        let mut out = BloodPressureOutput::default();
        for v in values {
            if let ChannelOutput::BloodPressure(o) = channel.process_signal(v) {
                out = o;
            }
        }
        out
    }

    #[test]
    fn flatline_gives_baseline_pair() {
        let mut channel = BloodPressureChannel::new();
        let out = last(&mut channel, core::iter::repeat(0.5).take(100));
        assert!((out.systolic - 115.4).abs() < 0.1, "systolic {}", out.systolic);
        assert!((out.diastolic - 76.2).abs() < 0.1, "diastolic {}", out.diastolic);
        assert!(out.precision > 0.9);
    }

    #[test]
    fn pulse_raises_systolic_more_than_diastolic() {
        let mut channel = BloodPressureChannel::new();
        let out = last(
            &mut channel,
            (0..300).map(|i| (2.0 * PI * 1.2 * i as f32 / 30.0).sin()),
        );
        assert!(out.systolic > 120.0);
        assert!(out.systolic - out.diastolic >= 25.0);
        assert!(out.systolic - out.diastolic <= 70.0);
    }

    #[test]
    fn extreme_input_stays_bounded() {
        let mut channel = BloodPressureChannel::new();
        let out = last(&mut channel, (0..200).map(|i| if i % 3 == 0 { 1e4 } else { -1e4 }));
        assert!(out.systolic >= SYSTOLIC_MIN_MMHG && out.systolic <= SYSTOLIC_MAX_MMHG);
        assert!(out.systolic - out.diastolic >= MIN_PULSE_PRESSURE_MMHG);
    }

    #[test]
    fn pulse_pressure_band() {
        assert_eq!(enforce_pulse_pressure(120.0, 110.0), 95.0);
        assert_eq!(enforce_pulse_pressure(180.0, 100.0), 110.0);
        assert_eq!(enforce_pulse_pressure(120.0, 80.0), 80.0);
    }
}
