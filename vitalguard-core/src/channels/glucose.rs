//! Glucose channel
//!
//! Baseline-plus-features model over a 4 s smoothed window:
//!
//! ```text
//! glucose = 90 + 18 * min(auc, 2)
//!              + 12 * (clamp(ratio, 0.2, 5) - 1)
//!              +  4 * (freq - 1.2)              only with a pulse present
//! ```
//!
//! clamped to `[70, 180]`. Readings more than 30 mg/dL from the baseline
//! cost 30% confidence.

use super::{ChannelCore, ChannelFeedback, ChannelOutput, VitalChannel, WaveformFeatures};
use crate::constants::buffers::GLUCOSE_WINDOW;
use crate::constants::physiology::{GLUCOSE_BASELINE_MG_DL, GLUCOSE_MAX_MG_DL, GLUCOSE_MIN_MG_DL};
use crate::filter::FilterConfig;
use crate::types::VitalSignType;

const MIN_SAMPLES: usize = 30;
const AUC_CAP: f32 = 2.0;
const REFERENCE_FREQUENCY_HZ: f32 = 1.2;
const DEVIATION_PENALTY_MG_DL: f32 = 30.0;

/// Glucose reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlucoseOutput {
    /// Glucose (mg/dL), 0 when unknown
    pub glucose: f32,
    /// Channel confidence
    pub confidence: f32,
}

/// Glucose estimator
#[derive(Debug, Clone)]
pub struct GlucoseChannel {
    core: ChannelCore<GLUCOSE_WINDOW>,
}

impl Default for GlucoseChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Glucose estimate for a feature set
pub fn estimate_glucose(features: &WaveformFeatures) -> f32 {
    let ratio = features.peak_valley_ratio.clamp(0.2, 5.0);
    let mut glucose = GLUCOSE_BASELINE_MG_DL
        + 18.0 * features.auc.min(AUC_CAP)
        + 12.0 * (ratio - 1.0);
    if features.pulse_present {
        glucose += 4.0 * (features.crossing_frequency - REFERENCE_FREQUENCY_HZ);
    }
    glucose.clamp(GLUCOSE_MIN_MG_DL, GLUCOSE_MAX_MG_DL)
}

impl GlucoseChannel {
    /// Create the channel
    pub fn new() -> Self {
        Self::with_filter(FilterConfig::default())
    }

    /// Channel with a custom input filter
    pub fn with_filter(filter: FilterConfig) -> Self {
        Self {
            core: ChannelCore::with_filter(VitalSignType::Glucose, filter),
        }
    }

    fn neutral(&mut self) -> ChannelOutput {
        let confidence = self.core.reject();
        self.core.update_feedback(false, None);
        ChannelOutput::Glucose(GlucoseOutput { glucose: 0.0, confidence })
    }
}

impl VitalChannel for GlucoseChannel {
    fn channel_type(&self) -> VitalSignType {
        VitalSignType::Glucose
    }

    fn process_signal(&mut self, value: f32) -> ChannelOutput {
        if self.core.push(value).is_none() || !self.core.ready(MIN_SAMPLES) {
            return self.neutral();
        }
        let window = self.core.window();
        let Some(features) = WaveformFeatures::extract(&window, self.core.sample_rate_hz()) else {
            return self.neutral();
        };

        let glucose = estimate_glucose(&features);
        let target = if features.pulse_present { 0.7 } else { 0.4 };
        let mut confidence = self.core.accept(target * self.core.fill_ratio().max(0.5));
        if libm::fabsf(glucose - GLUCOSE_BASELINE_MG_DL) > DEVIATION_PENALTY_MG_DL {
            confidence = self.core.penalize(0.7);
        }
        self.core.update_feedback(true, None);

        ChannelOutput::Glucose(GlucoseOutput { glucose, confidence })
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

    #[test]
    fn flatline_sits_on_baseline() {
        let mut channel = GlucoseChannel::new();
        let mut out = GlucoseOutput::default();
        for _ in 0..150 {
            if let ChannelOutput::Glucose(o) = channel.process_signal(0.5) {
                out = o;
            }
        }
        assert_eq!(out.glucose, 90.0);
    }

    #[test]
    fn model_clamps() {
        let high = WaveformFeatures {
            auc: 10.0,
            peak_valley_ratio: 50.0,
            crossing_frequency: 5.0,
            pulse_present: true,
        };
        assert_eq!(estimate_glucose(&high), GLUCOSE_MAX_MG_DL);

        let low = WaveformFeatures {
            auc: 0.0,
            peak_valley_ratio: 0.0,
            crossing_frequency: 0.0,
            pulse_present: true,
        };
        // 90 - 12 * 0.8 - 4 * 1.2
        assert!((estimate_glucose(&low) - 75.6).abs() < 1e-3);
    }

    #[test]
    fn pulse_raises_confidence() {
        use core::f32::consts::PI;

        let mut pulsed = GlucoseChannel::new();
        let mut flat = GlucoseChannel::new();
        for i in 0..240 {
            pulsed.process_signal((2.0 * PI * 1.2 * i as f32 / 30.0).sin());
            flat.process_signal(0.5);
        }
        assert!(pulsed.confidence() > flat.confidence());
    }

    #[test]
    fn zero_window_is_neutral() {
        let mut channel = GlucoseChannel::new();
        for _ in 0..60 {
            channel.process_signal(0.0);
        }
        assert_eq!(channel.confidence(), 0.0);
    }
}
