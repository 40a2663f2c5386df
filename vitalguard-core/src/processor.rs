//! Vital-Signs Processor
//!
//! ## Overview
//!
//! One processor is one capture session. It owns the channel distributor,
//! the optional conditioner and the session's [`PrecisionContext`], and turns
//! every [`RawSample`] into exactly one [`VitalSignsResult`]:
//!
//! ```text
//! RawSample
//!   │  quality gate ──fail──► replay last result (stale) or empty
//!   ▼
//! environment: (value + offset) * amplification, noise reduction
//!   ▼
//! conditioner (optional light smoothing, block path via enhancer)
//!   ▼
//! distributor: fan-out to channels, feedback between cycles
//!   ▼
//! cross-validation: range + plausibility, corrections applied
//!   ▼
//! calibration: learned factors, pulse pressure re-enforced
//!   ▼
//! VitalSignsResult
//! ```
//!
//! ## Failure Policy
//!
//! Nothing here returns an error per sample. A stopped processor yields an
//! empty result, a gated-out sample replays the last result while it is
//! younger than `stale_after_ms`, and every internal fault has already been
//! folded into lower confidence by the time the result is assembled.
//!
//! ## Async Split
//!
//! `process_block` is `prepare_block` + conditioning + `finish_block`. The
//! accelerator crate calls the two halves itself so the conditioning step
//! can run on an async backend.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::buffer::CircularBuffer;
use crate::channels::{ArrhythmiaStatus, VitalChannel};
use crate::conditioner::SignalConditioner;
use crate::config::ProcessorConfig;
use crate::confidence;
use crate::constants::buffers::ENVIRONMENT_WINDOW;
use crate::distributor::{ChannelResults, SignalDistributor};
use crate::enhancer::SignalEnhancer;
use crate::errors::ProcessingResult;
use crate::precision::{enforce_pulse_pressure, CalibrationReference, ConditionsUpdate, PrecisionContext};
use crate::result::{ConfidenceBreakdown, VitalSignsResult};
use crate::rr::RrIntervalData;
use crate::time::{age_ms, Timestamp};
use crate::types::{Measurements, RawSample, VitalSignType};

/// Samples of a block after gating and environmental adjustment
#[derive(Debug, Clone, Default)]
pub struct PreparedBlock {
    samples: Vec<RawSample>,
    gated: Vec<bool>,
    values: Vec<f32>,
    running: bool,
}

impl PreparedBlock {
    /// Adjusted values of the samples that passed the gate, in order
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of samples in the block
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the block is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Session object running the full per-sample pipeline
#[derive(Debug)]
pub struct VitalSignsProcessor {
    config: ProcessorConfig,
    distributor: SignalDistributor,
    conditioner: SignalConditioner,
    precision: PrecisionContext,
    recent_raw: CircularBuffer<f32, ENVIRONMENT_WINDOW>,
    last_result: Option<VitalSignsResult>,
    running: bool,
    samples_processed: u64,
}

fn known(value: f32) -> Option<f32> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn measurements_from(results: &ChannelResults) -> Measurements {
    let mut m = Measurements::default();
    if let Some(c) = results.cardiac {
        m.heart_rate = known(c.heart_rate);
    }
    if let Some(s) = results.spo2 {
        m.spo2 = known(s.spo2);
    }
    if let Some(bp) = results.blood_pressure {
        m.systolic = known(bp.systolic);
        m.diastolic = known(bp.diastolic);
    }
    if let Some(g) = results.glucose {
        m.glucose = known(g.glucose);
    }
    if let Some(l) = results.lipids {
        m.cholesterol = known(l.cholesterol);
        m.triglycerides = known(l.triglycerides);
    }
    m
}

impl VitalSignsProcessor {
    /// Processor with the five standard channels
    pub fn new(config: ProcessorConfig) -> ProcessingResult<Self> {
        config.validate()?;
        let distributor =
            SignalDistributor::with_channel_filters(config.distributor, config.detector, config.filter)?;
        Ok(Self::assemble(config, distributor))
    }

    /// Processor around a caller-built distributor
    pub fn with_distributor(config: ProcessorConfig, distributor: SignalDistributor) -> ProcessingResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, distributor))
    }

    fn assemble(config: ProcessorConfig, distributor: SignalDistributor) -> Self {
        Self {
            config,
            distributor,
            conditioner: SignalConditioner::new(config.conditioning),
            precision: PrecisionContext::new(),
            recent_raw: CircularBuffer::new(),
            last_result: None,
            running: false,
            samples_processed: 0,
        }
    }

    /// Use an existing precision context (calibration carried over)
    pub fn with_precision(mut self, precision: PrecisionContext) -> Self {
        self.precision = precision;
        self
    }

    /// Use a custom block enhancer for conditioning
    pub fn with_enhancer(mut self, enhancer: Box<dyn SignalEnhancer + Send>) -> Self {
        self.conditioner.set_enhancer(enhancer);
        self
    }

    /// Begin accepting samples
    pub fn start(&mut self) {
        if !self.running {
            log_info!("processor started ({} channels)", self.distributor.channel_count());
        }
        self.running = true;
    }

    /// Stop accepting samples; state is kept
    pub fn stop(&mut self) {
        if self.running {
            log_info!("processor stopped after {} samples", self.samples_processed);
        }
        self.running = false;
    }

    /// Whether samples are processed
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Clear channel, conditioning and replay state; calibration is kept
    pub fn reset(&mut self) {
        self.distributor.reset();
        self.conditioner.reset();
        self.recent_raw.clear();
        self.last_result = None;
        self.samples_processed = 0;
        log_info!("processor reset");
    }

    /// `reset` plus calibration references and environmental conditions
    pub fn full_reset(&mut self) {
        self.reset();
        self.precision.reset();
    }

    /// Process one sample
    pub fn process_sample(&mut self, sample: RawSample) -> VitalSignsResult {
        if !self.running {
            return VitalSignsResult::empty(sample.timestamp);
        }
        if !self.gate(&sample) {
            return self.replay(sample.timestamp);
        }
        let adjusted = self.adjust(sample.value);
        let conditioned = self.conditioner.condition(adjusted);
        self.complete(sample.timestamp, conditioned)
    }

    /// Process a block, conditioning it through the installed enhancer
    pub fn process_block(&mut self, samples: &[RawSample]) -> Vec<VitalSignsResult> {
        let prepared = self.prepare_block(samples);
        let conditioned = self.conditioner.condition_block(prepared.values());
        self.finish_block(prepared, &conditioned)
    }

    /// Gate and environment-adjust a block without running the channels
    pub fn prepare_block(&mut self, samples: &[RawSample]) -> PreparedBlock {
        let mut prepared = PreparedBlock {
            samples: samples.to_vec(),
            gated: Vec::with_capacity(samples.len()),
            values: Vec::new(),
            running: self.running,
        };
        for sample in samples {
            let pass = self.running && self.gate(sample);
            prepared.gated.push(pass);
            if pass {
                let adjusted = self.adjust(sample.value);
                prepared.values.push(adjusted);
            }
        }
        prepared
    }

    /// Run the channels and precision layer over a prepared block
    ///
    /// `conditioned` pairs with `prepared.values()`; missing entries fall back
    /// to the unconditioned value.
    pub fn finish_block(&mut self, prepared: PreparedBlock, conditioned: &[f32]) -> Vec<VitalSignsResult> {
        let mut next = 0usize;
        let mut out = Vec::with_capacity(prepared.samples.len());
        for (sample, pass) in prepared.samples.iter().zip(prepared.gated.iter()) {
            if !prepared.running {
                out.push(VitalSignsResult::empty(sample.timestamp));
                continue;
            }
            if !*pass {
                out.push(self.replay(sample.timestamp));
                continue;
            }
            let value = conditioned
                .get(next)
                .or_else(|| prepared.values.get(next))
                .copied()
                .unwrap_or(sample.value);
            next += 1;
            out.push(self.complete(sample.timestamp, value));
        }
        out
    }

    fn gate(&self, sample: &RawSample) -> bool {
        let pass = sample.passes_gate(self.config.distributor.quality_threshold);
        if !pass {
            log_debug!(
                "sample at {} gated out (quality {}, finger {})",
                sample.timestamp,
                sample.quality,
                sample.finger_detected
            );
        }
        pass
    }

    fn adjust(&mut self, value: f32) -> f32 {
        self.recent_raw.push(value);
        let env = &mut self.precision.environment;
        if self.config.estimate_environment {
            env.estimate_conditions(&self.recent_raw.to_vec());
        }
        self.distributor
            .set_noise_reduction(env.adjustment_factors().noise_reduction);
        env.apply_signal_adjustment(value)
    }

    fn replay(&self, now: Timestamp) -> VitalSignsResult {
        match &self.last_result {
            Some(last) if age_ms(now, last.timestamp) <= self.config.stale_after_ms => last.replayed(now),
            _ => VitalSignsResult {
                stale: true,
                ..VitalSignsResult::empty(now)
            },
        }
    }

    fn complete(&mut self, timestamp: Timestamp, value: f32) -> VitalSignsResult {
        self.samples_processed += 1;
        let output = self.distributor.process_signal(value);
        let results = output.results;

        let raw = measurements_from(&results);
        let validator = self.precision.validator;
        let report = validator.validate_measurements(&raw);
        let validated = validator.apply_adjustments(&raw, &report);
        let calibrated = enforce_pulse_pressure(self.precision.calibration.apply_to(&validated));

        let env = self.precision.environment.adjustment_factors();
        let breakdown = ConfidenceBreakdown {
            cardiac: results.confidence(VitalSignType::Cardiac),
            spo2: results.confidence(VitalSignType::Spo2),
            blood_pressure: results.confidence(VitalSignType::BloodPressure),
            glucose: results.confidence(VitalSignType::Glucose),
            lipids: results.confidence(VitalSignType::Lipids),
            validation: report.confidence,
            environment: env.confidence,
            calibration: self.precision.calibration.calibration_confidence(),
            enhancement: self.conditioner.enhancement_confidence(),
        };
        let precision = confidence::normalize(
            confidence::combine(&breakdown.channels())
                * report.confidence
                * env.confidence
                * breakdown.enhancement.unwrap_or(1.0),
        );

        let (arrhythmia, rhythm_regularity) = results
            .cardiac
            .map(|c| (c.arrhythmia, c.rhythm_regularity))
            .unwrap_or((ArrhythmiaStatus::Calibrating, 0.0));

        let result = VitalSignsResult {
            timestamp,
            arrhythmia,
            rhythm_regularity,
            confidence: breakdown,
            precision,
            calibrated: self.precision.calibration.is_system_calibrated(),
            correlation_validated: report.is_valid,
            environment_adjusted: !env.is_neutral(),
            stale: false,
            age_ms: 0,
            inconsistency_count: report.inconsistencies.len(),
            ..VitalSignsResult::default()
        }
        .with_measurements(calibrated);

        self.last_result = Some(result);
        result
    }

    /// Store an operator reference; effective from the next sample
    pub fn add_calibration_reference(&mut self, reference: CalibrationReference) -> bool {
        self.precision.calibration.add_reference_data(reference)
    }

    /// Merge externally measured conditions; effective from the next sample
    pub fn update_environmental_conditions(&mut self, update: ConditionsUpdate) {
        self.precision.environment.update_conditions(update);
    }

    /// Hand RR intervals from an external beat tracker to the channels
    pub fn ingest_rr_intervals(&mut self, data: &RrIntervalData) {
        self.distributor.ingest_rr_intervals(data);
    }

    /// Register or replace a channel
    pub fn register_channel(&mut self, channel: Box<dyn VitalChannel>) -> ProcessingResult<()> {
        self.distributor.register_channel(channel)
    }

    /// Latest computed result
    pub fn last_result(&self) -> Option<&VitalSignsResult> {
        self.last_result.as_ref()
    }

    /// Samples that went through the full pipeline since the last reset
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    /// Configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Precision collaborators
    pub fn precision(&self) -> &PrecisionContext {
        &self.precision
    }

    /// Mutable precision collaborators
    pub fn precision_mut(&mut self) -> &mut PrecisionContext {
        &mut self.precision
    }

    /// Channel distributor
    pub fn distributor(&self) -> &SignalDistributor {
        &self.distributor
    }

    /// Pre-distribution conditioner
    pub fn conditioner(&self) -> &SignalConditioner {
        &self.conditioner
    }

    /// Mutable conditioner, for externally driven enhancer calls
    pub fn conditioner_mut(&mut self) -> &mut SignalConditioner {
        &mut self.conditioner
    }
}
