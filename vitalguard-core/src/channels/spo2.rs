//! SpO2 channel
//!
//! Baseline saturation plus a small linear term from the window shape:
//!
//! ```text
//! level = clamp((mean(w) - median(w)) / span(w), -0.5, 0.5)   0 when flat
//! spo2  = clamp(97 + 6 * level, 90, 100)
//! ```
//!
//! The level is relative to the window, so neither the exposure offset nor
//! the camera's brightness scale moves the reading.

use super::{ChannelCore, ChannelFeedback, ChannelOutput, VitalChannel};
use crate::constants::buffers::SPO2_WINDOW;
use crate::constants::physiology::{SPO2_BASELINE_PCT, SPO2_MAX_PCT, SPO2_MIN_PCT};
use crate::constants::quality::FLAT_SIGNAL_SPAN;
use crate::filter::FilterConfig;
use crate::stats;
use crate::types::VitalSignType;

const LEVEL_GAIN: f32 = 6.0;
const LEVEL_LIMIT: f32 = 0.5;
const MIN_SAMPLES: usize = 10;

/// SpO2 reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spo2Output {
    /// Saturation (%), 0 when unknown
    pub spo2: f32,
    /// Channel confidence
    pub confidence: f32,
}

/// Oxygen saturation estimator
#[derive(Debug, Clone)]
pub struct Spo2Channel {
    core: ChannelCore<SPO2_WINDOW>,
}

impl Default for Spo2Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Spo2Channel {
    /// Create the channel
    pub fn new() -> Self {
        Self::with_filter(FilterConfig::default())
    }

    /// Channel with a custom input filter
    pub fn with_filter(filter: FilterConfig) -> Self {
        Self {
            core: ChannelCore::with_filter(VitalSignType::Spo2, filter),
        }
    }

    /// Window skew in `[-0.5, 0.5]`, independent of offset and scale
    fn relative_level(window: &[f32]) -> f32 {
        let span = stats::span(window);
        if span <= FLAT_SIGNAL_SPAN {
            return 0.0;
        }
        let median = stats::median(window).unwrap_or_default();
        ((stats::mean(window) - median) / span).clamp(-LEVEL_LIMIT, LEVEL_LIMIT)
    }

    fn neutral(&mut self) -> ChannelOutput {
        let confidence = self.core.reject();
        self.core.update_feedback(false, None);
        ChannelOutput::Spo2(Spo2Output { spo2: 0.0, confidence })
    }
}

impl VitalChannel for Spo2Channel {
    fn channel_type(&self) -> VitalSignType {
        VitalSignType::Spo2
    }

    fn process_signal(&mut self, value: f32) -> ChannelOutput {
        if self.core.push(value).is_none() {
            return self.neutral();
        }
        if !self.core.ready(MIN_SAMPLES) {
            return self.neutral();
        }

        let window = self.core.window();
        let spo2 = (SPO2_BASELINE_PCT + LEVEL_GAIN * Self::relative_level(&window))
            .clamp(SPO2_MIN_PCT, SPO2_MAX_PCT);

        // A clean waveform and a full window both raise trust
        let stability = 1.0 - self.core.noise_ratio().min(1.0);
        let confidence = self.core.accept(0.5 * stability + 0.5 * self.core.fill_ratio());
        self.core.update_feedback(true, None);

        ChannelOutput::Spo2(Spo2Output { spo2, confidence })
    }

    fn confidence(&self) -> f32 {
        self.core.confidence()
    }

    fn feedback(&self) -> Option<ChannelFeedback> {
        self.core.last_feedback()
    }

    fn reset(&mut self) {
        self.core.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last(channel: &mut Spo2Channel, values: impl Iterator<Item = f32>) -> Spo2Output {
        let mut out = Spo2Output::default();
        for v in values {
            if let ChannelOutput::Spo2(o) = channel.process_signal(v) {
                out = o;
            }
        }
        out
    }

    fn pulse(offset: f32, n: usize) -> impl Iterator<Item = f32> {
        (0..n).map(move |i| offset + libm::sinf(2.0 * core::f32::consts::PI * 1.2 * i as f32 / 30.0))
    }

    #[test]
    fn flatline_reads_baseline() {
        let mut channel = Spo2Channel::new();
        let out = last(&mut channel, core::iter::repeat(0.5).take(100));
        assert_eq!(out.spo2, SPO2_BASELINE_PCT);
        assert!(out.confidence > 0.1);
    }

    #[test]
    fn constant_level_does_not_move_reading() {
        let mut channel = Spo2Channel::new();
        assert_eq!(last(&mut channel, core::iter::repeat(1e6).take(30)).spo2, SPO2_BASELINE_PCT);
        channel.reset();
        assert_eq!(last(&mut channel, core::iter::repeat(-1e6).take(30)).spo2, SPO2_BASELINE_PCT);
    }

    #[test]
    fn exposure_offset_does_not_move_reading() {
        let mut dark = Spo2Channel::new();
        let mut bright = Spo2Channel::new();
        let a = last(&mut dark, pulse(0.0, 150));
        let b = last(&mut bright, pulse(120.0, 150));
        assert!((a.spo2 - b.spo2).abs() < 0.1, "{} vs {}", a.spo2, b.spo2);
        assert!(b.spo2 < SPO2_MAX_PCT);
        assert!((a.confidence - b.confidence).abs() < 0.05);
    }

    #[test]
    fn skewed_waveform_stays_in_range() {
        let mut channel = Spo2Channel::new();
        let spikes = (0..150).map(|i| if i % 25 == 0 { 130.0 } else { 120.0 });
        let out = last(&mut channel, spikes);
        assert!(out.spo2 > SPO2_BASELINE_PCT);
        assert!(out.spo2 <= SPO2_MAX_PCT);
    }

    #[test]
    fn insufficient_history_is_neutral() {
        let mut channel = Spo2Channel::new();
        let out = last(&mut channel, core::iter::repeat(0.5).take(5));
        assert_eq!(out.spo2, 0.0);
    }
}
