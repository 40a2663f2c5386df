//! Signal enhancement capability
//!
//! The batch path of [`AdaptiveFilter`] hands a block of samples to an
//! enhancer and takes back a filtered block plus a confidence scalar. What
//! runs behind the trait is opaque to the core: the in-process
//! [`NumericEnhancer`] below, or an offloaded backend wrapped by the
//! `vitalguard-accel` crate. Callers must not depend on which one ran.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::errors::{ProcessingError, ProcessingResult};
use crate::filter::AdaptiveFilter;
use crate::stats;

/// One block of work for an enhancer
#[derive(Debug, Clone)]
pub struct EnhanceRequest {
    /// Samples to enhance, oldest first
    pub samples: Vec<f32>,
    /// Snapshot of the requesting filter
    pub filter: AdaptiveFilter,
}

/// Output of an enhancer
#[derive(Debug, Clone)]
pub struct Enhancement {
    /// Enhanced samples, same length as the request
    pub values: Vec<f32>,
    /// Backend confidence in `[0, 1]`
    pub confidence: f32,
    /// Filter advanced over the block, if the backend tracks it
    pub filter: Option<AdaptiveFilter>,
}

/// Synchronous enhancement capability
pub trait SignalEnhancer {
    /// Enhance one block
    fn enhance(&mut self, request: &EnhanceRequest) -> ProcessingResult<Enhancement>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;
}

impl<E: SignalEnhancer + ?Sized> SignalEnhancer for Box<E> {
    fn enhance(&mut self, request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
        (**self).enhance(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// In-process enhancer: the scalar Kalman recurrence on a copy of the filter
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericEnhancer;

impl NumericEnhancer {
    /// Create the enhancer
    pub fn new() -> Self {
        Self
    }

    /// Enhance without needing `&mut self`
    pub fn run(request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
        if request.samples.is_empty() {
            return Err(ProcessingError::InsufficientData { required: 1, available: 0 });
        }
        let mut filter = request.filter.clone();
        let values = filter.filter_slice(&request.samples);

        // Residual spread relative to signal spread: 1.0 means the filter
        // removed nothing, 0.0 means the residual dwarfs the signal.
        let residuals: Vec<f32> = request
            .samples
            .iter()
            .zip(values.iter())
            .filter(|(raw, _)| raw.is_finite())
            .map(|(raw, out)| raw - out)
            .collect();
        let signal = stats::std_dev(&values);
        let noise = stats::std_dev(&residuals);
        let confidence = if signal + noise > 0.0 {
            signal / (signal + noise)
        } else {
            0.5
        };

        Ok(Enhancement {
            values,
            confidence: crate::confidence::normalize(confidence),
            filter: Some(filter),
        })
    }
}

impl SignalEnhancer for NumericEnhancer {
    fn enhance(&mut self, request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
        Self::run(request)
    }

    fn name(&self) -> &'static str {
        "numeric"
    }
}
