//! Adaptive Single-State Kalman Filter
//!
//! ## Overview
//!
//! Every channel smooths its input with one of these filters. The state is a
//! single scalar (the current level of the signal) so the full Kalman
//! machinery reduces to four lines:
//!
//! ```text
//! predict:  P  = P + Q
//! gain:     K  = P / (P + R)
//! update:   x  = x + K * (z - x)
//!           P  = (1 - K) * P
//! ```
//!
//! ## Adaptation
//!
//! Camera PPG changes character within a session (finger pressure, exposure
//! changes, motion), so the noise terms are not fixed:
//!
//! - **Process noise Q** follows the variance of the last ten gains. A gain
//!   that keeps moving means the model is still settling, so Q is raised to
//!   let the estimate track faster. Q stays in `[min_process_noise,
//!   max_process_noise]`.
//! - **Measurement noise R** doubles when a measurement lands more than
//!   `3R` from the estimate (outlier suppression) and shrinks by 10% when it
//!   lands within `R/2`. R stays in `[min_measurement_noise,
//!   max_measurement_noise]`.
//! - **Re-acquisition**: several consecutive outliers mean the level really
//!   moved. R and P are reset to their configured values so the estimate
//!   jumps to the new level instead of crawling towards it.
//!
//! ## Batch Path
//!
//! A block of samples can be handed to a [`SignalEnhancer`] at once. The
//! enhancer gets a snapshot of this filter and returns the filtered block.
//! If it also returns the filter it advanced, that state is adopted as is;
//! otherwise only the last filtered value becomes the new estimate. Any
//! failure (error, wrong length, non-finite output) silently reruns the
//! scalar recurrence on the same input and bumps `fallback_count`.

use alloc::vec::Vec;
use libm::fabsf;

use crate::buffer::CircularBuffer;
use crate::constants::buffers::GAIN_HISTORY_SIZE;
use crate::enhancer::{EnhanceRequest, Enhancement, SignalEnhancer};
use crate::errors::{ProcessingError, ProcessingResult};
use crate::stats;

/// Filter tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    /// Initial process noise Q
    pub process_noise: f32,
    /// Initial measurement noise R
    pub measurement_noise: f32,
    /// Initial error covariance P
    pub initial_covariance: f32,
    /// Enable Q/R adaptation
    pub adaptive: bool,
    /// Lower clamp for Q
    pub min_process_noise: f32,
    /// Upper clamp for Q
    pub max_process_noise: f32,
    /// Floor for R
    pub min_measurement_noise: f32,
    /// Ceiling for R
    pub max_measurement_noise: f32,
    /// Consecutive outliers that trigger re-acquisition (0 disables)
    pub reacquire_after: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.1,
            initial_covariance: 1.0,
            adaptive: true,
            min_process_noise: 0.001,
            max_process_noise: 0.1,
            min_measurement_noise: 0.01,
            max_measurement_noise: 10.0,
            reacquire_after: 3,
        }
    }
}

impl FilterConfig {
    /// Light, non-adaptive smoothing used before distribution
    pub fn light() -> Self {
        Self {
            process_noise: 0.1,
            measurement_noise: 0.05,
            adaptive: false,
            ..Self::default()
        }
    }

    /// Reject impossible settings
    pub fn validate(&self) -> ProcessingResult<()> {
        if !(self.process_noise > 0.0 && self.measurement_noise > 0.0) {
            return Err(ProcessingError::InvalidConfig { reason: "noise terms must be positive" });
        }
        if !(self.initial_covariance > 0.0) {
            return Err(ProcessingError::InvalidConfig { reason: "initial covariance must be positive" });
        }
        if self.min_process_noise > self.max_process_noise
            || self.min_measurement_noise > self.max_measurement_noise
            || self.min_process_noise <= 0.0
            || self.min_measurement_noise <= 0.0
        {
            return Err(ProcessingError::InvalidConfig { reason: "inverted noise limits" });
        }
        Ok(())
    }
}

/// Snapshot of the scalar filter state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterState {
    /// Current estimate x
    pub estimate: f32,
    /// Error covariance P
    pub error_covariance: f32,
    /// Current Q
    pub process_noise: f32,
    /// Current R
    pub measurement_noise: f32,
}

/// Kalman-style scalar estimator with adaptive noise terms
#[derive(Debug, Clone)]
pub struct AdaptiveFilter {
    config: FilterConfig,
    estimate: f32,
    error_covariance: f32,
    process_noise: f32,
    measurement_noise: f32,
    /// Seed supplied with `with_initial_estimate`
    seed: Option<f32>,
    initialized: bool,
    gains: CircularBuffer<f32, GAIN_HISTORY_SIZE>,
    outlier_streak: u8,
    fallback_count: u32,
}

impl Default for AdaptiveFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl AdaptiveFilter {
    /// Create a filter; the estimate seeds from the first measurement
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            estimate: 0.0,
            error_covariance: config.initial_covariance,
            process_noise: config.process_noise,
            measurement_noise: config.measurement_noise,
            seed: None,
            initialized: false,
            gains: CircularBuffer::new(),
            outlier_streak: 0,
            fallback_count: 0,
        }
    }

    /// Start from an explicit estimate instead of the first measurement
    pub fn with_initial_estimate(mut self, estimate: f32) -> Self {
        self.seed = Some(estimate);
        self.estimate = estimate;
        self.initialized = true;
        self
    }

    /// Feed one measurement, returning the new estimate
    ///
    /// Non-finite measurements leave the state untouched.
    pub fn filter(&mut self, measurement: f32) -> f32 {
        if !measurement.is_finite() {
            return self.estimate;
        }
        if !self.initialized {
            self.estimate = measurement;
            self.initialized = true;
            return self.estimate;
        }

        if self.config.adaptive {
            self.adapt_measurement_noise(measurement);
        }

        // predict
        self.error_covariance += self.process_noise;

        let gain = self.error_covariance / (self.error_covariance + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.error_covariance *= 1.0 - gain;

        if self.config.adaptive {
            self.gains.push(gain);
            self.adapt_process_noise();
        }

        self.estimate
    }

    fn adapt_measurement_noise(&mut self, measurement: f32) {
        let cfg = &self.config;
        let deviation = fabsf(measurement - self.estimate);

        if deviation > 3.0 * self.measurement_noise {
            self.outlier_streak = self.outlier_streak.saturating_add(1);
            if cfg.reacquire_after > 0 && self.outlier_streak >= cfg.reacquire_after {
                self.measurement_noise = cfg.measurement_noise;
                self.error_covariance = self.error_covariance.max(cfg.initial_covariance);
                self.outlier_streak = 0;
                return;
            }
            self.measurement_noise = (self.measurement_noise * 2.0).min(cfg.max_measurement_noise);
        } else {
            self.outlier_streak = 0;
            if deviation < 0.5 * self.measurement_noise {
                self.measurement_noise = (self.measurement_noise * 0.9).max(cfg.min_measurement_noise);
            }
        }
    }

    fn adapt_process_noise(&mut self) {
        if self.gains.len() < 2 {
            return;
        }
        let gains = self.gains.to_vec();
        let spread = stats::variance(&gains);
        self.process_noise = (self.config.process_noise * (1.0 + 100.0 * spread))
            .clamp(self.config.min_process_noise, self.config.max_process_noise);
    }

    /// Run the scalar recurrence over a block
    pub fn filter_slice(&mut self, values: &[f32]) -> Vec<f32> {
        values.iter().map(|v| self.filter(*v)).collect()
    }

    /// Request for an enhancer covering `values`
    pub fn batch_request(&self, values: &[f32]) -> EnhanceRequest {
        EnhanceRequest {
            samples: values.to_vec(),
            filter: self.clone(),
        }
    }

    /// Filter a block through `enhancer`, falling back to the scalar path
    pub fn filter_batch(&mut self, values: &[f32], enhancer: &mut dyn SignalEnhancer) -> Vec<f32> {
        if values.is_empty() {
            return Vec::new();
        }
        let request = self.batch_request(values);
        let outcome = enhancer.enhance(&request);
        self.complete_batch(values, outcome)
    }

    /// Adopt the outcome of an enhancer call made for `values`
    ///
    /// Split out from `filter_batch` so async callers can run the enhancer
    /// themselves and hand the result back.
    #[cfg_attr(not(feature = "log"), allow(unused_variables))]
    pub fn complete_batch(&mut self, values: &[f32], outcome: ProcessingResult<Enhancement>) -> Vec<f32> {
        let checked = outcome.and_then(|e| {
            if e.values.len() != values.len() {
                return Err(ProcessingError::AcceleratorUnavailable { reason: "length mismatch" });
            }
            if !stats::all_finite(&e.values) {
                return Err(ProcessingError::InvalidValue);
            }
            Ok(e)
        });

        match checked {
            Ok(enhancement) => {
                match enhancement.filter {
                    Some(advanced) => {
                        let fallbacks = self.fallback_count;
                        *self = advanced;
                        self.fallback_count = fallbacks;
                    }
                    None => {
                        if let Some(last) = enhancement.values.last() {
                            self.estimate = *last;
                            self.initialized = true;
                        }
                    }
                }
                enhancement.values
            }
            Err(err) => {
                self.fallback_count += 1;
                log_warn!(
                    "enhancer failed ({}), scalar fallback #{} on {} samples",
                    err,
                    self.fallback_count,
                    values.len()
                );
                self.filter_slice(values)
            }
        }
    }

    /// Current estimate
    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    /// Whether a measurement or seed has been seen
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Snapshot of the numeric state
    pub fn state(&self) -> FilterState {
        FilterState {
            estimate: self.estimate,
            error_covariance: self.error_covariance,
            process_noise: self.process_noise,
            measurement_noise: self.measurement_noise,
        }
    }

    /// Configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Number of batch calls that fell back to the scalar path
    pub fn fallback_count(&self) -> u32 {
        self.fallback_count
    }

    /// Return to the freshly constructed state, keeping any explicit seed
    pub fn reset(&mut self) {
        let seed = self.seed;
        *self = Self::new(self.config);
        if let Some(estimate) = seed {
            *self = self.clone().with_initial_estimate(estimate);
        }
    }
}
