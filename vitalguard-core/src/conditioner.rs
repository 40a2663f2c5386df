//! Pre-distribution signal conditioning
//!
//! An optional light smoothing pass on the environment-adjusted value before
//! it is fanned out. Single samples go through the scalar recurrence; blocks
//! go through [`AdaptiveFilter::filter_batch`] and whatever
//! [`SignalEnhancer`] is installed, in chunks of `batch_size`. Enhancer
//! failures never surface: the filter reruns the chunk on the scalar path.
//! The confidence of the latest accepted enhancement is kept for the
//! precision score; a fallback clears it.
//!
//! Disabled (the default), the conditioner is the identity.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::constants::buffers::DEFAULT_BATCH_SIZE;
use crate::enhancer::{EnhanceRequest, Enhancement, NumericEnhancer, SignalEnhancer};
use crate::confidence;
use crate::errors::{ProcessingError, ProcessingResult};
use crate::filter::{AdaptiveFilter, FilterConfig};

/// Conditioning settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConditioningConfig {
    /// Smooth before distribution
    pub enabled: bool,
    /// Samples per enhancer call on the block path
    pub batch_size: usize,
    /// Filter used for conditioning
    pub filter: FilterConfig,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            batch_size: DEFAULT_BATCH_SIZE,
            filter: FilterConfig::light(),
        }
    }
}

impl ConditioningConfig {
    /// Reject a zero batch size or a broken filter config
    pub fn validate(&self) -> ProcessingResult<()> {
        if self.batch_size == 0 {
            return Err(ProcessingError::InvalidConfig { reason: "batch_size must be positive" });
        }
        self.filter.validate()
    }
}

/// Light pre-distribution smoother with a pluggable block enhancer
pub struct SignalConditioner {
    config: ConditioningConfig,
    filter: AdaptiveFilter,
    enhancer: Box<dyn SignalEnhancer + Send>,
    enhancement_confidence: Option<f32>,
}

impl core::fmt::Debug for SignalConditioner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalConditioner")
            .field("enabled", &self.config.enabled)
            .field("enhancer", &self.enhancer.name())
            .field("estimate", &self.filter.estimate())
            .finish()
    }
}

impl SignalConditioner {
    /// Conditioner using the in-process enhancer
    pub fn new(config: ConditioningConfig) -> Self {
        Self::with_enhancer(config, Box::new(NumericEnhancer::new()))
    }

    /// Conditioner with a custom block enhancer
    pub fn with_enhancer(config: ConditioningConfig, enhancer: Box<dyn SignalEnhancer + Send>) -> Self {
        Self {
            config,
            filter: AdaptiveFilter::new(config.filter),
            enhancer,
            enhancement_confidence: None,
        }
    }

    /// Replace the block enhancer
    pub fn set_enhancer(&mut self, enhancer: Box<dyn SignalEnhancer + Send>) {
        log_info!("conditioner enhancer set to {}", enhancer.name());
        self.enhancer = enhancer;
    }

    /// Condition one value
    pub fn condition(&mut self, value: f32) -> f32 {
        if !self.config.enabled {
            return value;
        }
        self.filter.filter(value)
    }

    /// Condition a block, `batch_size` samples per enhancer call
    pub fn condition_block(&mut self, values: &[f32]) -> Vec<f32> {
        if !self.config.enabled {
            return values.to_vec();
        }
        let mut out = Vec::with_capacity(values.len());
        for chunk in values.chunks(self.config.batch_size.max(1)) {
            let request = self.filter.batch_request(chunk);
            let outcome = self.enhancer.enhance(&request);
            out.extend(self.complete_batch(chunk, outcome));
        }
        out
    }

    /// Request for an externally driven (async) enhancer call
    pub fn batch_request(&self, values: &[f32]) -> EnhanceRequest {
        self.filter.batch_request(values)
    }

    /// Adopt the outcome of an externally driven enhancer call
    ///
    /// Disabled conditioning ignores the outcome and passes `values` through.
    pub fn complete_batch(&mut self, values: &[f32], outcome: ProcessingResult<Enhancement>) -> Vec<f32> {
        if !self.config.enabled {
            return values.to_vec();
        }
        let reported = outcome.as_ref().ok().map(|e| confidence::normalize(e.confidence));
        let fallbacks = self.filter.fallback_count();
        let out = self.filter.complete_batch(values, outcome);
        self.enhancement_confidence = if self.filter.fallback_count() == fallbacks {
            reported
        } else {
            None
        };
        out
    }

    /// Confidence reported by the latest accepted enhancement
    ///
    /// `None` before the first block call, after a fallback and with
    /// conditioning disabled.
    pub fn enhancement_confidence(&self) -> Option<f32> {
        self.enhancement_confidence
    }

    /// Whether conditioning is active
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Configuration
    pub fn config(&self) -> &ConditioningConfig {
        &self.config
    }

    /// Underlying filter
    pub fn filter(&self) -> &AdaptiveFilter {
        &self.filter
    }

    /// Block calls that fell back to the scalar path
    pub fn fallback_count(&self) -> u32 {
        self.filter.fallback_count()
    }

    /// Name of the installed enhancer
    pub fn enhancer_name(&self) -> &'static str {
        self.enhancer.name()
    }

    /// Reset the filter state
    pub fn reset(&mut self) {
        self.filter.reset();
        self.enhancement_confidence = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl SignalEnhancer for Broken {
        fn enhance(&mut self, _request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
            Err(ProcessingError::AcceleratorUnavailable { reason: "offline" })
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn enabled() -> ConditioningConfig {
        ConditioningConfig { enabled: true, batch_size: 4, ..Default::default() }
    }

    #[test]
    fn disabled_is_identity() {
        let mut c = SignalConditioner::new(ConditioningConfig::default());
        assert_eq!(c.condition(3.5), 3.5);
        assert_eq!(c.condition_block(&[1.0, 2.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn block_matches_scalar_path() {
        let values: Vec<f32> = (0..10).map(|i| (i as f32 * 0.7).sin()).collect();
        let mut block = SignalConditioner::new(enabled());
        let mut scalar = SignalConditioner::new(enabled());

        let a = block.condition_block(&values);
        let b: Vec<f32> = values.iter().map(|v| scalar.condition(*v)).collect();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
        assert_eq!(block.fallback_count(), 0);
    }

    #[test]
    fn failing_enhancer_falls_back_per_chunk() {
        let mut c = SignalConditioner::with_enhancer(enabled(), Box::new(Broken));
        let out = c.condition_block(&[1.0; 10]);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|v| (v - 1.0).abs() < 1e-6));
        assert_eq!(c.fallback_count(), 3);
        assert_eq!(c.enhancer_name(), "broken");
    }

    struct Doubtful;

    impl SignalEnhancer for Doubtful {
        fn enhance(&mut self, request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
            let mut out = NumericEnhancer::run(request)?;
            out.confidence = 0.3;
            Ok(out)
        }

        fn name(&self) -> &'static str {
            "doubtful"
        }
    }

    #[test]
    fn keeps_enhancer_confidence() {
        let mut c = SignalConditioner::with_enhancer(enabled(), Box::new(Doubtful));
        assert_eq!(c.enhancement_confidence(), None);
        c.condition_block(&[1.0, 1.1, 0.9, 1.0, 1.2]);
        assert_eq!(c.enhancement_confidence(), Some(0.3));
        c.reset();
        assert_eq!(c.enhancement_confidence(), None);
    }

    #[test]
    fn fallback_clears_enhancer_confidence() {
        let mut c = SignalConditioner::with_enhancer(enabled(), Box::new(Doubtful));
        c.condition_block(&[1.0; 4]);
        assert!(c.enhancement_confidence().is_some());
        let out = c.complete_batch(&[1.0; 4], Err(ProcessingError::AcceleratorTimeout { timeout_ms: 50 }));
        assert_eq!(out.len(), 4);
        assert_eq!(c.enhancement_confidence(), None);
    }

    #[test]
    fn zero_batch_rejected() {
        let cfg = ConditioningConfig { batch_size: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
