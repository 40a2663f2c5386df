//! Cardiac channel: heart rate, rhythm regularity and arrhythmia status
//!
//! Beats come from [`PeakIntervalDetector`] run over the filtered window on
//! every sample. When the detector has not yet qualified enough intervals,
//! RR intervals ingested from an upstream tracker are used instead.
//!
//! ```text
//! HR          = 60000 / mean(RR)            clamped to [40, 180]
//! regularity  = max(0, 1 - 3 * CV(RR))
//! arrhythmia  = regularity < 0.7
//! ```

use core::fmt;

use super::{ChannelCore, ChannelFeedback, ChannelOutput, VitalChannel};
use crate::constants::buffers::CARDIAC_WINDOW;
use crate::constants::physiology::{HEART_RATE_MAX_BPM, HEART_RATE_MIN_BPM};
use crate::constants::timing::MS_PER_MINUTE;
use crate::filter::FilterConfig;
use crate::peaks::{DetectorConfig, PeakIntervalDetector};
use crate::rr::RrIntervalData;
use crate::stats;
use crate::types::VitalSignType;

/// Regularity below which the rhythm is declared arrhythmic
pub const ARRHYTHMIA_REGULARITY: f32 = 0.7;

/// Band requested when the channel asks for smoothing (40-180 bpm)
const CARDIAC_BAND_HZ: (f32, f32) = (0.67, 3.0);

/// Minimum intervals needed before the side channel is trusted
const MIN_SIDE_CHANNEL_INTERVALS: usize = 3;

/// Rhythm classification shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrhythmiaStatus {
    /// Not enough beats yet
    #[default]
    Calibrating,
    /// Regular rhythm
    Normal,
    /// Irregular rhythm; `count` arrhythmic episodes so far
    Detected {
        /// Number of transitions into an arrhythmic rhythm
        count: u32,
    },
}

impl fmt::Display for ArrhythmiaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrhythmiaStatus::Calibrating => f.write_str("CALIBRATING"),
            ArrhythmiaStatus::Normal => f.write_str("NORMAL RHYTHM"),
            ArrhythmiaStatus::Detected { count } => write!(f, "ARRHYTHMIA DETECTED|{}", count),
        }
    }
}

/// Cardiac reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardiacOutput {
    /// Heart rate (bpm), 0 when unknown
    pub heart_rate: f32,
    /// Rhythm regularity in `[0, 1]`
    pub rhythm_regularity: f32,
    /// Rhythm status
    pub arrhythmia: ArrhythmiaStatus,
    /// Number of RR intervals the reading is based on
    pub intervals_used: usize,
    /// Channel confidence
    pub confidence: f32,
}

/// Heart-rate estimator
#[derive(Debug, Clone)]
pub struct CardiacChannel {
    core: ChannelCore<CARDIAC_WINDOW>,
    detector: PeakIntervalDetector,
    side_channel: Option<RrIntervalData>,
    status: ArrhythmiaStatus,
    arrhythmia_count: u32,
    last: CardiacOutput,
}

impl Default for CardiacChannel {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl CardiacChannel {
    /// Create a channel with the given detector settings
    pub fn new(detector: DetectorConfig) -> Self {
        Self::with_filter(detector, FilterConfig::default())
    }

    /// Channel with a custom input filter
    pub fn with_filter(detector: DetectorConfig, filter: FilterConfig) -> Self {
        Self {
            core: ChannelCore::with_filter(VitalSignType::Cardiac, filter),
            detector: PeakIntervalDetector::new(detector),
            side_channel: None,
            status: ArrhythmiaStatus::Calibrating,
            arrhythmia_count: 0,
            last: CardiacOutput::default(),
        }
    }

    /// Latest output
    pub fn last_output(&self) -> CardiacOutput {
        self.last
    }

    /// Detector, for diagnostics
    pub fn detector(&self) -> &PeakIntervalDetector {
        &self.detector
    }

    fn neutral(&mut self) -> ChannelOutput {
        let confidence = self.core.reject();
        self.core.update_feedback(false, Some(CARDIAC_BAND_HZ));
        self.last = CardiacOutput {
            heart_rate: 0.0,
            rhythm_regularity: 0.0,
            arrhythmia: self.status,
            intervals_used: 0,
            confidence,
        };
        ChannelOutput::Cardiac(self.last)
    }

    fn classify(&mut self, regularity: f32) -> ArrhythmiaStatus {
        let arrhythmic = regularity < ARRHYTHMIA_REGULARITY;
        let was_arrhythmic = matches!(self.status, ArrhythmiaStatus::Detected { .. });
        self.status = if arrhythmic {
            if !was_arrhythmic {
                self.arrhythmia_count += 1;
            }
            ArrhythmiaStatus::Detected { count: self.arrhythmia_count }
        } else {
            ArrhythmiaStatus::Normal
        };
        self.status
    }
}

impl VitalChannel for CardiacChannel {
    fn channel_type(&self) -> VitalSignType {
        VitalSignType::Cardiac
    }

    fn process_signal(&mut self, value: f32) -> ChannelOutput {
        if self.core.push(value).is_none() {
            return self.neutral();
        }
        if !self.core.ready(self.detector.config().min_samples()) {
            return self.neutral();
        }

        let window = self.core.window();
        let detection = self
            .detector
            .detect_peaks_at(&window, self.core.samples_processed());

        let mut intervals = detection.intervals;
        if intervals.is_empty() {
            if let Some(side) = &self.side_channel {
                if side.len() >= MIN_SIDE_CHANNEL_INTERVALS {
                    intervals = side.intervals();
                }
            }
        }
        if intervals.is_empty() {
            return self.neutral();
        }

        let mean_rr = stats::mean(&intervals);
        if mean_rr <= 0.0 {
            return self.neutral();
        }
        let heart_rate = (MS_PER_MINUTE / mean_rr).clamp(HEART_RATE_MIN_BPM, HEART_RATE_MAX_BPM);
        let regularity = (1.0 - 3.0 * stats::coefficient_of_variation(&intervals)).max(0.0);
        let arrhythmia = self.classify(regularity);

        let coverage = (intervals.len() as f32 / 8.0).min(1.0);
        let confidence = self.core.accept(0.5 * regularity + 0.5 * coverage);
        self.core.update_feedback(true, Some(CARDIAC_BAND_HZ));

        self.last = CardiacOutput {
            heart_rate,
            rhythm_regularity: regularity,
            arrhythmia,
            intervals_used: intervals.len(),
            confidence,
        };
        ChannelOutput::Cardiac(self.last)
    }

    fn confidence(&self) -> f32 {
        self.core.confidence()
    }

    fn feedback(&self) -> Option<ChannelFeedback> {
        self.core.last_feedback()
    }

    fn reset(&mut self) {
        self.core.reset();
        self.detector.reset();
        self.side_channel = None;
        self.status = ArrhythmiaStatus::Calibrating;
        self.arrhythmia_count = 0;
        self.last = CardiacOutput::default();
    }

    fn ingest_rr_intervals(&mut self, data: &RrIntervalData) {
        self.side_channel = Some(data.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    fn run(channel: &mut CardiacChannel, freq_hz: f32, samples: usize) -> CardiacOutput {
        let mut out = CardiacOutput::default();
        for i in 0..samples {
            let x = (2.0 * PI * freq_hz * i as f32 / 30.0).sin();
            if let ChannelOutput::Cardiac(o) = channel.process_signal(x) {
                out = o;
            }
        }
        out
    }

    #[test]
    fn sine_gives_expected_rate() {
        let mut channel = CardiacChannel::default();
        let out = run(&mut channel, 1.2, 300);
        assert!((out.heart_rate - 72.0).abs() <= 5.0, "hr {}", out.heart_rate);
        assert!(out.rhythm_regularity > 0.8);
        assert_eq!(out.arrhythmia, ArrhythmiaStatus::Normal);
    }

    #[test]
    fn flatline_reports_zero() {
        let mut channel = CardiacChannel::default();
        for _ in 0..100 {
            channel.process_signal(0.5);
        }
        assert_eq!(channel.last_output().heart_rate, 0.0);
        assert_eq!(channel.last_output().arrhythmia, ArrhythmiaStatus::Calibrating);
    }

    #[test]
    fn lost_pulse_drops_rate_and_confidence() {
        let mut channel = CardiacChannel::default();
        for i in 0..300 {
            channel.process_signal(0.5 + (2.0 * PI * 1.2 * i as f32 / 30.0).sin());
        }
        assert!(channel.last_output().heart_rate > 0.0);
        let peak_confidence = channel.confidence();

        for _ in 0..300 {
            channel.process_signal(0.5);
        }
        assert_eq!(channel.last_output().heart_rate, 0.0);
        assert!(channel.confidence() < 0.1, "confidence {}", channel.confidence());
        assert!(channel.confidence() < peak_confidence);
    }

    #[test]
    fn side_channel_seeds_rhythm() {
        let mut channel = CardiacChannel::default();
        channel.ingest_rr_intervals(&RrIntervalData::from_intervals(&[600.0, 1200.0, 700.0, 1300.0]));
        let mut out = CardiacOutput::default();
        for i in 0..20 {
            if let ChannelOutput::Cardiac(o) = channel.process_signal(0.1 * i as f32) {
                out = o;
            }
        }
        assert!(out.heart_rate > 0.0);
        assert_eq!(out.arrhythmia, ArrhythmiaStatus::Detected { count: 1 });
        assert_eq!(out.arrhythmia.to_string(), "ARRHYTHMIA DETECTED|1");
    }

    #[test]
    fn reset_clears_status() {
        let mut channel = CardiacChannel::default();
        run(&mut channel, 1.2, 200);
        channel.reset();
        assert_eq!(channel.confidence(), 0.0);
        assert_eq!(channel.last_output().arrhythmia, ArrhythmiaStatus::Calibrating);
    }
}
