//! Lipids channel
//!
//! Same waveform features as the glucose channel, two outputs:
//!
//! ```text
//! cholesterol   = 180 + 25 * min(auc, 2) + 10 * (ratio - 1)   in [120, 300]
//! triglycerides = 150 + 30 * min(auc, 2) -  8 * (ratio - 1)   in [50, 400]
//! ```

use super::{ChannelCore, ChannelFeedback, ChannelOutput, VitalChannel, WaveformFeatures};
use crate::constants::buffers::LIPIDS_WINDOW;
use crate::constants::physiology::*;
use crate::filter::FilterConfig;
use crate::types::VitalSignType;

const MIN_SAMPLES: usize = 30;
const AUC_CAP: f32 = 2.0;

/// Lipid reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LipidsOutput {
    /// Total cholesterol (mg/dL), 0 when unknown
    pub cholesterol: f32,
    /// Triglycerides (mg/dL), 0 when unknown
    pub triglycerides: f32,
    /// Channel confidence
    pub confidence: f32,
}

/// Cholesterol / triglycerides estimator
#[derive(Debug, Clone)]
pub struct LipidsChannel {
    core: ChannelCore<LIPIDS_WINDOW>,
}

impl Default for LipidsChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Lipid pair for a feature set
pub fn estimate_lipids(features: &WaveformFeatures) -> (f32, f32) {
    let auc = features.auc.min(AUC_CAP);
    let ratio = features.peak_valley_ratio.clamp(0.2, 5.0) - 1.0;
    let cholesterol = (CHOLESTEROL_NORMAL_MG_DL + 25.0 * auc + 10.0 * ratio)
        .clamp(CHOLESTEROL_MIN_MG_DL, CHOLESTEROL_MAX_MG_DL);
    let triglycerides = (TRIGLYCERIDES_NORMAL_MG_DL + 30.0 * auc - 8.0 * ratio)
        .clamp(TRIGLYCERIDES_MIN_MG_DL, TRIGLYCERIDES_MAX_MG_DL);
    (cholesterol, triglycerides)
}

impl LipidsChannel {
    /// Create the channel
    pub fn new() -> Self {
        Self::with_filter(FilterConfig::default())
    }

    /// Channel with a custom input filter
    pub fn with_filter(filter: FilterConfig) -> Self {
        Self {
            core: ChannelCore::with_filter(VitalSignType::Lipids, filter),
        }
    }

    fn neutral(&mut self) -> ChannelOutput {
        let confidence = self.core.reject();
        self.core.update_feedback(false, None);
        ChannelOutput::Lipids(LipidsOutput {
            confidence,
            ..LipidsOutput::default()
        })
    }
}

impl VitalChannel for LipidsChannel {
    fn channel_type(&self) -> VitalSignType {
        VitalSignType::Lipids
    }

    fn process_signal(&mut self, value: f32) -> ChannelOutput {
        if self.core.push(value).is_none() || !self.core.ready(MIN_SAMPLES) {
            return self.neutral();
        }
        let window = self.core.window();
        let Some(features) = WaveformFeatures::extract(&window, self.core.sample_rate_hz()) else {
            return self.neutral();
        };

        let (cholesterol, triglycerides) = estimate_lipids(&features);
        let target = if features.pulse_present { 0.6 } else { 0.35 };
        let confidence = self.core.accept(target * self.core.fill_ratio().max(0.5));
        self.core.update_feedback(true, None);

        ChannelOutput::Lipids(LipidsOutput {
            cholesterol,
            triglycerides,
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
    }
}
