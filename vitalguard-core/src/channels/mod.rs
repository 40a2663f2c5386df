//! Vital-Sign Channels
//!
//! ## Overview
//!
//! One raw PPG stream feeds five independent estimators. Each channel owns
//! its own adaptive filter, a bounded window of filtered samples and a
//! confidence score; none of them can see another's state. After every
//! sample a channel may publish a [`ChannelFeedback`] asking the distributor
//! to condition its input differently (more gain, more smoothing, a narrower
//! band). The feedback is advisory: the distributor decides what to apply.
//!
//! ## Contract
//!
//! - `process_signal` never fails. Non-finite input, a window that is
//!   entirely near zero, or too little history yield a neutral output and a
//!   decayed confidence.
//! - Outputs are clamped to the hard physiological bounds at the point of
//!   computation.
//! - Confidence stays in `[0, 1]`; after a valid update it is blended into
//!   `[0.1, 0.95]`.
//!
//! ## Composition
//!
//! Channels share [`ChannelCore`] (filter + window + confidence + feedback
//! heuristics) and add per-kind feature extraction on top. There is no
//! inheritance chain: each concrete channel is a plain struct implementing
//! [`VitalChannel`].

use alloc::vec::Vec;

use crate::buffer::CircularBuffer;
use crate::confidence;
use crate::constants::quality::NEAR_ZERO_SIGNAL;
use crate::constants::timing::{DEFAULT_SAMPLE_RATE_HZ, DETREND_HALF_WINDOW_S};
use crate::filter::{AdaptiveFilter, FilterConfig};
use crate::rr::RrIntervalData;
use crate::stats;
use crate::types::VitalSignType;

pub mod blood_pressure;
pub mod cardiac;
pub mod glucose;
pub mod lipids;
pub mod spo2;

pub use blood_pressure::{BloodPressureChannel, BloodPressureOutput};
pub use cardiac::{ArrhythmiaStatus, CardiacChannel, CardiacOutput};
pub use glucose::{GlucoseChannel, GlucoseOutput};
pub use lipids::{LipidsChannel, LipidsOutput};
pub use spo2::{Spo2Channel, Spo2Output};

/// Conditioning changes a channel would like applied to its input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuggestedAdjustments {
    /// Multiplier for the input gain
    pub amplification_factor: Option<f32>,
    /// Multiplier for the smoothing strength
    pub filter_strength: Option<f32>,
    /// Lower edge of the pass band (Hz)
    pub frequency_range_min: Option<f32>,
    /// Upper edge of the pass band (Hz)
    pub frequency_range_max: Option<f32>,
}

impl SuggestedAdjustments {
    /// Whether nothing is suggested
    pub fn is_empty(&self) -> bool {
        self.amplification_factor.is_none()
            && self.filter_strength.is_none()
            && self.frequency_range_min.is_none()
            && self.frequency_range_max.is_none()
    }
}

/// Feedback published by a channel after processing a sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelFeedback {
    /// Publishing channel
    pub channel: VitalSignType,
    /// Channel's view of its input quality, `[0, 1]`
    pub signal_quality: f32,
    /// Requested conditioning changes
    pub suggested: SuggestedAdjustments,
    /// Sample count of the channel when the feedback was produced
    pub cycle: u64,
    /// Whether the sample produced a valid reading
    pub success: bool,
}

/// Typed output of one channel for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelOutput {
    /// Heart rate and rhythm
    Cardiac(CardiacOutput),
    /// Oxygen saturation
    Spo2(Spo2Output),
    /// Blood pressure
    BloodPressure(BloodPressureOutput),
    /// Glucose
    Glucose(GlucoseOutput),
    /// Lipids
    Lipids(LipidsOutput),
}

impl ChannelOutput {
    /// Kind of channel that produced this output
    pub fn kind(&self) -> VitalSignType {
        match self {
            ChannelOutput::Cardiac(_) => VitalSignType::Cardiac,
            ChannelOutput::Spo2(_) => VitalSignType::Spo2,
            ChannelOutput::BloodPressure(_) => VitalSignType::BloodPressure,
            ChannelOutput::Glucose(_) => VitalSignType::Glucose,
            ChannelOutput::Lipids(_) => VitalSignType::Lipids,
        }
    }

    /// Confidence carried by the output
    pub fn confidence(&self) -> f32 {
        match self {
            ChannelOutput::Cardiac(o) => o.confidence,
            ChannelOutput::Spo2(o) => o.confidence,
            ChannelOutput::BloodPressure(o) => o.confidence,
            ChannelOutput::Glucose(o) => o.confidence,
            ChannelOutput::Lipids(o) => o.confidence,
        }
    }
}

/// Per-vital-sign processing pipeline
pub trait VitalChannel: Send {
    /// Kind this channel estimates
    fn channel_type(&self) -> VitalSignType;

    /// Process one conditioned sample
    fn process_signal(&mut self, value: f32) -> ChannelOutput;

    /// Current confidence in `[0, 1]`
    fn confidence(&self) -> f32;

    /// Latest feedback, if the channel has something to say
    fn feedback(&self) -> Option<ChannelFeedback>;

    /// Return to the initial state
    fn reset(&mut self);

    /// Accept externally tracked RR intervals; ignored by default
    fn ingest_rr_intervals(&mut self, _data: &RrIntervalData) {}
}

/// Morphology features of a smoothed window, shared by the metabolic channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaveformFeatures {
    /// Mean positive excursion above the window median
    pub auc: f32,
    /// `(max - median) / (median - min)`, 1.0 for a degenerate window
    pub peak_valley_ratio: f32,
    /// Median-crossing frequency (Hz)
    pub crossing_frequency: f32,
    /// Whether at least one full oscillation was seen
    pub pulse_present: bool,
}

impl WaveformFeatures {
    /// Extract features from a 3-point smoothed copy of `window`
    pub fn extract(window: &[f32], sample_rate_hz: f32) -> Option<Self> {
        if window.is_empty() || sample_rate_hz <= 0.0 {
            return None;
        }
        let smoothed = stats::moving_average(window, 1);
        let median = stats::median(&smoothed)?;
        let (lo, hi) = stats::min_max(&smoothed)?;

        let auc = stats::mean(
            &smoothed.iter().map(|v| (v - median).max(0.0)).collect::<Vec<f32>>(),
        );
        let below = median - lo;
        let peak_valley_ratio = if below > 1e-6 { (hi - median) / below } else { 1.0 };

        let crossings = stats::zero_crossings(&smoothed, median);
        let seconds = smoothed.len() as f32 / sample_rate_hz;
        let crossing_frequency = crossings as f32 / 2.0 / seconds;

        Some(Self {
            auc,
            peak_valley_ratio,
            crossing_frequency,
            pulse_present: crossings >= 2,
        })
    }
}

/// State and helpers shared by every channel
#[derive(Debug, Clone)]
pub struct ChannelCore<const N: usize> {
    kind: VitalSignType,
    filter: AdaptiveFilter,
    window: CircularBuffer<f32, N>,
    confidence: f32,
    samples_processed: u64,
    last_feedback: Option<ChannelFeedback>,
    sample_rate_hz: f32,
}

impl<const N: usize> ChannelCore<N> {
    /// Core with the default filter at 30 Hz
    pub fn new(kind: VitalSignType) -> Self {
        Self::with_filter(kind, FilterConfig::default())
    }

    /// Core with a custom filter configuration
    pub fn with_filter(kind: VitalSignType, config: FilterConfig) -> Self {
        Self {
            kind,
            filter: AdaptiveFilter::new(config),
            window: CircularBuffer::new(),
            confidence: 0.0,
            samples_processed: 0,
            last_feedback: None,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    /// Filter and store one sample; `None` for non-finite input
    pub fn push(&mut self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let filtered = self.filter.filter(value);
        self.window.push(filtered);
        self.samples_processed += 1;
        Some(filtered)
    }

    /// Filtered window, oldest first
    pub fn window(&self) -> Vec<f32> {
        self.window.to_vec()
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Fraction of the window filled
    pub fn fill_ratio(&self) -> f32 {
        self.window.len() as f32 / N.max(1) as f32
    }

    /// Whether every windowed sample is indistinguishable from zero
    pub fn is_near_zero(&self) -> bool {
        self.window.iter().all(|v| libm::fabsf(*v) < NEAR_ZERO_SIGNAL)
    }

    /// Whether the window holds at least `required` samples with real signal
    pub fn ready(&self, required: usize) -> bool {
        self.window.len() >= required && !self.is_near_zero()
    }

    /// Blend confidence towards `target` after a valid reading
    pub fn accept(&mut self, target: f32) -> f32 {
        self.confidence = confidence::blend(self.confidence, target);
        self.confidence
    }

    /// Decay confidence after invalid or insufficient input
    pub fn reject(&mut self) -> f32 {
        self.confidence = confidence::decay(self.confidence);
        self.confidence
    }

    /// Scale the current confidence, keeping it in `[0, 1]`
    pub fn penalize(&mut self, factor: f32) -> f32 {
        self.confidence = confidence::normalize(self.confidence * factor);
        self.confidence
    }

    /// Current confidence
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Samples accepted since the last reset
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    /// Sampling rate assumed by feature extraction
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }

    /// Window duration in seconds
    pub fn window_seconds(&self) -> f32 {
        self.window.len() as f32 / self.sample_rate_hz
    }

    /// Latest feedback
    pub fn last_feedback(&self) -> Option<ChannelFeedback> {
        self.last_feedback
    }

    /// Peak-to-peak amplitude of the detrended window
    ///
    /// The slow level is removed first, so a bright but steady exposure
    /// does not read as a large pulse.
    pub fn amplitude(&self) -> f32 {
        stats::span(&self.detrended())
    }

    /// High-frequency residue relative to amplitude
    pub fn noise_ratio(&self) -> f32 {
        let window = self.window();
        let amplitude = stats::span(&stats::detrend(&window, self.detrend_half()));
        if amplitude <= 0.0 {
            return 0.0;
        }
        stats::mean_abs_second_difference(&window) / amplitude
    }

    fn detrend_half(&self) -> usize {
        (DETREND_HALF_WINDOW_S * self.sample_rate_hz) as usize
    }

    fn detrended(&self) -> Vec<f32> {
        stats::detrend(&self.window(), self.detrend_half())
    }

    /// Compute and store feedback from amplitude, noise and confidence
    ///
    /// `band` is the pass band suggested when the channel asks for more
    /// smoothing; channels without a preferred band pass `None`.
    pub fn update_feedback(&mut self, success: bool, band: Option<(f32, f32)>) {
        if self.window.len() < 2 {
            self.last_feedback = None;
            return;
        }
        let amplitude = self.amplitude();
        let noise = self.noise_ratio();
        let conf = self.confidence;
        let mut suggested = SuggestedAdjustments::default();

        if amplitude > 0.0 && amplitude < 0.05 && conf < 0.5 {
            suggested.amplification_factor = Some(1.5);
        } else if amplitude > 10.0 {
            suggested.amplification_factor = Some(0.7);
        }

        if noise > 0.25 && conf < 0.4 {
            suggested.filter_strength = Some(1.3);
            if let Some((lo, hi)) = band {
                suggested.frequency_range_min = Some(lo);
                suggested.frequency_range_max = Some(hi);
            }
        } else if conf > 0.8 && amplitude > 0.0 && amplitude < 0.1 {
            suggested.filter_strength = Some(0.8);
        }

        self.last_feedback = Some(ChannelFeedback {
            channel: self.kind,
            signal_quality: confidence::normalize(conf * (1.0 - noise.min(1.0))),
            suggested,
            cycle: self.samples_processed,
            success,
        });
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.filter.reset();
        self.window.clear();
        self.confidence = 0.0;
        self.samples_processed = 0;
        self.last_feedback = None;
    }
}
