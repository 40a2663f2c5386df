//! Processor with async conditioning
//!
//! Splits `VitalSignsProcessor::process_block` in three: gating and
//! environmental adjustment run synchronously, conditioning awaits the
//! async backend one batch at a time, and the channel stages finish the
//! block synchronously again.
//!
//! `stop` releases the backend for good. A session started again afterwards
//! conditions its blocks in-process, as `VitalSignsProcessor` does, and the
//! fallback counter no longer moves.

use log::debug;

use vitalguard_core::{
    ProcessingError, ProcessingResult, RawSample, VitalSignsProcessor, VitalSignsResult,
};

use crate::config::AcceleratorConfig;
use crate::enhancer::{AsyncEnhancer, TimeoutEnhancer};

/// `VitalSignsProcessor` whose block conditioning runs on an async backend
#[derive(Debug)]
pub struct AcceleratedProcessor<E> {
    processor: VitalSignsProcessor,
    enhancer: TimeoutEnhancer<E>,
    config: AcceleratorConfig,
    backend_released: bool,
}

impl<E: AsyncEnhancer> AcceleratedProcessor<E> {
    /// Wrap `processor`, sending its conditioning batches to `enhancer`
    pub fn new(
        processor: VitalSignsProcessor,
        enhancer: E,
        config: AcceleratorConfig,
    ) -> ProcessingResult<Self> {
        config.validate().map_err(ProcessingError::from)?;
        Ok(Self {
            processor,
            enhancer: TimeoutEnhancer::new(enhancer, config.timeout()),
            config,
            backend_released: false,
        })
    }

    /// Start the session
    pub fn start(&mut self) {
        self.processor.start();
    }

    /// Stop the session, cancel pending backend work and release the backend
    pub fn stop(&mut self) {
        self.processor.stop();
        if !self.backend_released {
            self.enhancer.shutdown();
            self.backend_released = true;
            debug!("Released backend '{}'", self.enhancer.name());
        }
    }

    /// Reset per-signal state, keeping calibration
    pub fn reset(&mut self) {
        self.processor.reset();
    }

    /// Single sample, conditioned in-process
    pub fn process_sample(&mut self, sample: RawSample) -> VitalSignsResult {
        self.processor.process_sample(sample)
    }

    /// One result per sample, conditioning batches awaited on the backend
    ///
    /// Backend failures and timeouts never surface here: the block is
    /// conditioned in-process instead and counted in `fallback_count`.
    pub async fn process_block(&mut self, samples: &[RawSample]) -> Vec<VitalSignsResult> {
        if self.backend_released {
            return self.processor.process_block(samples);
        }
        let prepared = self.processor.prepare_block(samples);
        if !self.processor.conditioner().is_enabled() || prepared.values().is_empty() {
            let values = prepared.values().to_vec();
            return self.processor.finish_block(prepared, &values);
        }

        let mut conditioned = Vec::with_capacity(prepared.values().len());
        for chunk in prepared.values().chunks(self.config.batch_size) {
            let request = self.processor.conditioner().batch_request(chunk);
            let outcome = self.enhancer.enhance(request).await.map_err(ProcessingError::from);
            conditioned.extend(self.processor.conditioner_mut().complete_batch(chunk, outcome));
        }
        debug!(
            "Conditioned {} samples via '{}' ({} fallbacks so far)",
            conditioned.len(),
            self.enhancer.name(),
            self.enhancer.fallback_count()
        );
        self.processor.finish_block(prepared, &conditioned)
    }

    /// Calls answered by the in-process fallback
    pub fn fallback_count(&self) -> u64 {
        self.enhancer.fallback_count()
    }

    /// Whether `stop` has released the backend
    pub fn is_backend_released(&self) -> bool {
        self.backend_released
    }

    /// Backend name
    pub fn backend_name(&self) -> &'static str {
        self.enhancer.name()
    }

    /// Accelerator settings
    pub fn config(&self) -> &AcceleratorConfig {
        &self.config
    }

    /// Wrapped processor
    pub fn processor(&self) -> &VitalSignsProcessor {
        &self.processor
    }

    /// Wrapped processor, mutably
    pub fn processor_mut(&mut self) -> &mut VitalSignsProcessor {
        &mut self.processor
    }

    /// Unwrap, dropping the backend
    pub fn into_inner(self) -> VitalSignsProcessor {
        self.enhancer.shutdown();
        self.processor
    }
}
