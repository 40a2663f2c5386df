//! Multi-Criterion Peak and Interval Detection
//!
//! ## Overview
//!
//! Beat timing drives heart rate, rhythm analysis and part of the blood
//! pressure model, so a false peak is expensive. Single-criterion peak
//! picking is unusable on finger-camera PPG: exposure flicker, dicrotic
//! notches and motion all produce local maxima. A candidate is therefore
//! accepted only when five independent tests agree.
//!
//! ## Features
//!
//! The window is first rescaled to a fixed span (50 units) so thresholds do
//! not depend on the camera's brightness scale. Then:
//!
//! ```text
//! d1[i] = (y[i+h] - y[i-h]) / (2h)          windowed slope, h = 2
//! d2[i] = (d1[i+1] - d1[i-1]) / 2           concavity
//! ss[i] = Σ max(d1[j], 0), j in (i-w, i]    slope sum, w = 8
//! ```
//!
//! ## Acceptance Criteria
//!
//! With `thr` the adaptive threshold, sample `i` is a peak only if:
//!
//! | # | Test                                                        |
//! |---|-------------------------------------------------------------|
//! | a | `y[i] > y[i-1]` and `y[i] >= y[j]` for all `|j - i| <= 3`   |
//! | b | `d2[i] < -0.3 * thr`                                        |
//! | c | `max(ss[i-8..=i]) > 1.2 * thr`                              |
//! | d | `y[i] - baseline(i) > 2.5 * thr`                            |
//! | e | at least `min_distance` samples after the previous peak     |
//!
//! `baseline(i)` is the mean over `i ± 8` excluding the `± 2` samples nearest
//! the candidate. `min_distance` is the minimum RR interval (450 ms) in
//! samples, 14 at 30 Hz.
//!
//! The threshold is `mean + 0.35 * range` over the last 30 slope-sum values,
//! clamped to `[0.15, 0.7]`.
//!
//! ## Interval Bookkeeping
//!
//! Peaks are tracked by absolute stream index so a sliding window can be
//! re-analysed every frame without counting a beat twice. Each newly
//! registered peak yields an RR interval against the previous one. Intervals
//! inside `[450, 1500]` ms are stored (at most 20); anything else resets the
//! consecutive-valid counter. Intervals are reported only once three
//! consecutive valid ones have been seen, filtered to those within two
//! standard deviations of their mean. When no peak arrives for
//! `peak_timeout_ms` (twice the longest RR interval) the history is dropped,
//! so a lost pulse stops producing a rate.

use alloc::vec::Vec;

use crate::buffer::CircularBuffer;
use crate::constants::buffers::{RR_INTERVAL_CAPACITY, THRESHOLD_HISTORY};
use crate::constants::quality::FLAT_SIGNAL_SPAN;
use crate::constants::timing::{
    DEFAULT_SAMPLE_RATE_HZ, DETECTOR_MAX_RR_MS, DETECTOR_MIN_RR_MS, MS_PER_SECOND, PEAK_TIMEOUT_MS,
};
use crate::errors::{ProcessingError, ProcessingResult};
use crate::stats;
use crate::time::ms_to_samples;

/// Detector tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// Sampling rate of the analysed series (Hz)
    pub sample_rate_hz: f32,
    /// Half width of the slope window
    pub derivative_half_window: usize,
    /// Neighbourhood radius for the local-maximum test
    pub local_max_radius: usize,
    /// Slope-sum window length
    pub slope_sum_window: usize,
    /// Radius of the prominence baseline
    pub baseline_radius: usize,
    /// Samples nearest the candidate left out of the baseline
    pub baseline_exclusion: usize,
    /// Slope-sum samples feeding the adaptive threshold
    pub threshold_history: usize,
    /// Threshold clamp, low end
    pub threshold_min: f32,
    /// Threshold clamp, high end
    pub threshold_max: f32,
    /// Shortest accepted RR interval (ms)
    pub min_rr_ms: f32,
    /// Longest accepted RR interval (ms)
    pub max_rr_ms: f32,
    /// Consecutive valid intervals required before reporting
    pub min_consecutive_intervals: usize,
    /// Silence after the last peak that discards the interval history (ms)
    pub peak_timeout_ms: f32,
    /// Span the window is rescaled to before feature extraction
    pub normalized_span: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            derivative_half_window: 2,
            local_max_radius: 3,
            slope_sum_window: 8,
            baseline_radius: 8,
            baseline_exclusion: 2,
            threshold_history: THRESHOLD_HISTORY,
            threshold_min: 0.15,
            threshold_max: 0.7,
            min_rr_ms: DETECTOR_MIN_RR_MS,
            max_rr_ms: DETECTOR_MAX_RR_MS,
            min_consecutive_intervals: 3,
            peak_timeout_ms: PEAK_TIMEOUT_MS,
            normalized_span: 50.0,
        }
    }
}

impl DetectorConfig {
    /// Minimum peak spacing in samples
    pub fn min_distance(&self) -> usize {
        ms_to_samples(self.min_rr_ms, self.sample_rate_hz).max(1)
    }

    /// Shortest input the detector analyses
    pub fn min_samples(&self) -> usize {
        2 * (2 * self.derivative_half_window + 1)
    }

    /// Reject impossible settings
    pub fn validate(&self) -> ProcessingResult<()> {
        if !(self.sample_rate_hz > 0.0) {
            return Err(ProcessingError::InvalidConfig { reason: "sample rate must be positive" });
        }
        if !(self.min_rr_ms > 0.0 && self.min_rr_ms < self.max_rr_ms) {
            return Err(ProcessingError::InvalidConfig { reason: "inverted RR limits" });
        }
        if self.peak_timeout_ms < self.max_rr_ms {
            return Err(ProcessingError::InvalidConfig { reason: "peak timeout shorter than max RR" });
        }
        if self.threshold_min > self.threshold_max {
            return Err(ProcessingError::InvalidConfig { reason: "inverted threshold clamp" });
        }
        if self.derivative_half_window == 0 || self.slope_sum_window == 0 {
            return Err(ProcessingError::InvalidConfig { reason: "zero-width feature window" });
        }
        Ok(())
    }
}

/// Result of one detection pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakDetection {
    /// Peak positions within the analysed window
    pub peak_indices: Vec<usize>,
    /// Valley positions within the analysed window
    pub valley_indices: Vec<usize>,
    /// Qualified RR intervals (ms), empty until enough consecutive beats
    pub intervals: Vec<f32>,
    /// Stream time of the last registered peak (ms)
    pub last_peak_time: Option<f32>,
}

/// Stateful peak detector with RR-interval bookkeeping
#[derive(Debug, Clone)]
pub struct PeakIntervalDetector {
    config: DetectorConfig,
    threshold: f32,
    intervals: CircularBuffer<f32, RR_INTERVAL_CAPACITY>,
    consecutive_valid: usize,
    last_peak_abs: Option<u64>,
    /// Samples consumed by `detect_peaks` chunk calls
    consumed: u64,
}

impl Default for PeakIntervalDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

struct Features {
    y: Vec<f32>,
    d2: Vec<f32>,
    slope_sum: Vec<f32>,
}

impl PeakIntervalDetector {
    /// Create a detector
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            threshold: config.threshold_min,
            intervals: CircularBuffer::new(),
            consecutive_valid: 0,
            last_peak_abs: None,
            consumed: 0,
        }
    }

    /// Analyse `values` as the next chunk of the stream
    pub fn detect_peaks(&mut self, values: &[f32]) -> PeakDetection {
        let end = self.consumed + values.len() as u64;
        let detection = self.detect_peaks_at(values, end);
        self.consumed = end;
        detection
    }

    /// Analyse a window whose last sample has absolute index `stream_end - 1`
    ///
    /// Overlapping windows may be passed on every frame; a peak is
    /// registered for interval bookkeeping only once.
    pub fn detect_peaks_at(&mut self, values: &[f32], stream_end: u64) -> PeakDetection {
        self.expire_stale(stream_end);
        let n = values.len();
        if n < self.config.min_samples() || !stats::all_finite(values) {
            return self.idle();
        }
        let Some(features) = self.features(values) else {
            return self.idle();
        };

        self.threshold = self.adaptive_threshold(&features.slope_sum);
        let peaks = self.find_peaks(&features);
        let valleys = self.find_valleys(&features);

        let offset = stream_end.saturating_sub(n as u64);
        for &i in &peaks {
            self.register_peak(offset + i as u64);
        }

        PeakDetection {
            peak_indices: peaks,
            valley_indices: valleys,
            intervals: self.qualified_intervals(),
            last_peak_time: self.last_peak_time(),
        }
    }

    /// Drop the interval history once no peak was seen for the timeout
    fn expire_stale(&mut self, stream_end: u64) {
        let Some(last) = self.last_peak_abs else {
            return;
        };
        let timeout = ms_to_samples(self.config.peak_timeout_ms, self.config.sample_rate_hz) as u64;
        if stream_end.saturating_sub(last) <= timeout {
            return;
        }
        if self.consecutive_valid > 0 || !self.intervals.is_empty() {
            log_debug!(
                "no peak for {} samples, dropping {} intervals",
                stream_end.saturating_sub(last),
                self.intervals.len()
            );
            self.intervals.clear();
            self.consecutive_valid = 0;
        }
    }

    fn idle(&self) -> PeakDetection {
        PeakDetection {
            peak_indices: Vec::new(),
            valley_indices: Vec::new(),
            intervals: self.qualified_intervals(),
            last_peak_time: self.last_peak_time(),
        }
    }

    fn features(&self, values: &[f32]) -> Option<Features> {
        let (lo, hi) = stats::min_max(values)?;
        let range = hi - lo;
        if range < FLAT_SIGNAL_SPAN {
            return None;
        }

        let n = values.len();
        let scale = self.config.normalized_span / range;
        let y: Vec<f32> = values.iter().map(|v| (v - lo) * scale).collect();

        let h = self.config.derivative_half_window;
        let mut d1 = alloc::vec![0.0f32; n];
        for i in h..n.saturating_sub(h) {
            d1[i] = (y[i + h] - y[i - h]) / (2 * h) as f32;
        }

        let mut d2 = alloc::vec![0.0f32; n];
        for i in 1..n.saturating_sub(1) {
            d2[i] = (d1[i + 1] - d1[i - 1]) / 2.0;
        }

        let w = self.config.slope_sum_window;
        let mut slope_sum = alloc::vec![0.0f32; n];
        let mut acc = 0.0f32;
        for i in 0..n {
            acc += d1[i].max(0.0);
            if i >= w {
                acc -= d1[i - w].max(0.0);
            }
            slope_sum[i] = acc.max(0.0);
        }

        Some(Features { y, d2, slope_sum })
    }

    fn adaptive_threshold(&self, slope_sum: &[f32]) -> f32 {
        let start = slope_sum.len().saturating_sub(self.config.threshold_history);
        let recent = &slope_sum[start..];
        let raw = stats::mean(recent) + 0.35 * stats::span(recent);
        raw.clamp(self.config.threshold_min, self.config.threshold_max)
    }

    /// Mean of `y` over the baseline ring around `i`
    fn baseline(&self, y: &[f32], i: usize) -> Option<f32> {
        let lo = i.saturating_sub(self.config.baseline_radius);
        let hi = (i + self.config.baseline_radius + 1).min(y.len());
        let ex = self.config.baseline_exclusion;
        let (sum, count) = (lo..hi)
            .filter(|j| j.abs_diff(i) > ex)
            .fold((0.0f32, 0usize), |(s, c), j| (s + y[j], c + 1));
        (count > 0).then(|| sum / count as f32)
    }

    fn candidate_range(&self, n: usize) -> core::ops::Range<usize> {
        let margin = self.config.local_max_radius.max(self.config.derivative_half_window + 1);
        margin..n.saturating_sub(margin)
    }

    fn find_peaks(&self, f: &Features) -> Vec<usize> {
        let y = &f.y;
        let thr = self.threshold;
        let r = self.config.local_max_radius;
        let min_distance = self.config.min_distance();
        let mut peaks: Vec<usize> = Vec::new();

        for i in self.candidate_range(y.len()) {
            // (a) local maximum
            if !(y[i] > y[i - 1]) || (i - r..=i + r).any(|j| y[j] > y[i]) {
                continue;
            }
            // (b) concavity
            if !(f.d2[i] < -0.3 * thr) {
                continue;
            }
            // (c) rising edge
            let edge_start = i.saturating_sub(self.config.slope_sum_window);
            let edge = f.slope_sum[edge_start..=i].iter().copied().fold(0.0f32, f32::max);
            if !(edge > 1.2 * thr) {
                continue;
            }
            // (d) prominence
            let Some(base) = self.baseline(y, i) else { continue };
            if !(y[i] - base > 2.5 * thr) {
                continue;
            }
            // (e) spacing
            if let Some(&prev) = peaks.last() {
                if i - prev < min_distance {
                    continue;
                }
            }
            peaks.push(i);
        }
        peaks
    }

    fn find_valleys(&self, f: &Features) -> Vec<usize> {
        let y = &f.y;
        let thr = self.threshold;
        let r = self.config.local_max_radius;

        self.candidate_range(y.len())
            .filter(|&i| y[i] < y[i - 1] && !(i - r..=i + r).any(|j| y[j] < y[i]))
            .filter(|&i| {
                self.baseline(y, i)
                    .map(|base| base - y[i] > 2.5 * thr)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn register_peak(&mut self, abs: u64) {
        let min_distance = self.config.min_distance() as u64;
        match self.last_peak_abs {
            None => {
                self.last_peak_abs = Some(abs);
            }
            Some(prev) if abs <= prev => {}
            Some(prev) if abs - prev < min_distance => {}
            Some(prev) => {
                let rr = (abs - prev) as f32 * MS_PER_SECOND / self.config.sample_rate_hz;
                if rr >= self.config.min_rr_ms && rr <= self.config.max_rr_ms {
                    self.intervals.push(rr);
                    self.consecutive_valid += 1;
                } else {
                    self.consecutive_valid = 0;
                }
                self.last_peak_abs = Some(abs);
            }
        }
    }

    fn qualified_intervals(&self) -> Vec<f32> {
        if self.consecutive_valid < self.config.min_consecutive_intervals {
            return Vec::new();
        }
        let stored = self.intervals.to_vec();
        let mean = stats::mean(&stored);
        let sd = stats::std_dev(&stored);
        if sd <= 0.0 {
            return stored;
        }
        stored
            .into_iter()
            .filter(|v| libm::fabsf(v - mean) <= 2.0 * sd)
            .collect()
    }

    fn last_peak_time(&self) -> Option<f32> {
        self.last_peak_abs
            .map(|abs| abs as f32 * MS_PER_SECOND / self.config.sample_rate_hz)
    }

    /// Current adaptive threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Consecutive valid intervals seen so far
    pub fn consecutive_valid(&self) -> usize {
        self.consecutive_valid
    }

    /// Configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Forget all peaks and intervals
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}
