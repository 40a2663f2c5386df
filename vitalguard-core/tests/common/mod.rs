//! Common test utilities for integration tests
//!
//! This module provides:
//! - Synthetic PPG generators (sine pulse, flatline, noisy, irregular rhythm)
//! - Deterministic pseudo-random noise
//! - Runner helpers that drive a processor over a sample series

#![allow(dead_code)]

pub mod generators;
pub mod scenarios;

use vitalguard_core::{ProcessorConfig, RawSample, VitalSignsProcessor, VitalSignsResult};

/// Processor with default configuration, already started
pub fn started_processor() -> VitalSignsProcessor {
    started_with(ProcessorConfig::default())
}

/// Processor with `config`, already started
pub fn started_with(config: ProcessorConfig) -> VitalSignsProcessor {
    let mut processor = VitalSignsProcessor::new(config).expect("valid config");
    processor.start();
    processor
}

/// Feed every sample, returning all results
pub fn run(processor: &mut VitalSignsProcessor, samples: &[RawSample]) -> Vec<VitalSignsResult> {
    samples.iter().map(|s| processor.process_sample(*s)).collect()
}

/// Feed every sample, returning the last result
pub fn run_last(processor: &mut VitalSignsProcessor, samples: &[RawSample]) -> VitalSignsResult {
    run(processor, samples)
        .pop()
        .expect("at least one sample")
}
