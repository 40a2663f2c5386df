//! Async backend integration tests
//!
//! These drive the full pipeline through `AcceleratedProcessor` and check
//! that backend timeouts, errors and shutdowns never cost a result.

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use vitalguard_accel::{
    AccelError, AcceleratedProcessor, AcceleratorConfig, AsyncEnhancer, InlineEnhancer,
    WorkerEnhancer,
};
use vitalguard_core::{
    EnhanceRequest, Enhancement, NumericEnhancer, ProcessingError, ProcessingResult,
    ProcessorConfig, RawSample, SignalEnhancer, Timestamp, VitalSignsProcessor,
};

const FRAME_MS: Timestamp = 33;

fn pulse(freq_hz: f32, n: usize) -> Vec<RawSample> {
    (0..n)
        .map(|i| {
            let t = i as f32 / 30.0;
            let value = (2.0 * PI * freq_hz * t).sin();
            RawSample::new(value, i as Timestamp * FRAME_MS).with_quality(80.0, true)
        })
        .collect()
}

fn conditioned_processor() -> VitalSignsProcessor {
    let mut config = ProcessorConfig::default();
    config.conditioning.enabled = true;
    VitalSignsProcessor::new(config).expect("valid config")
}

struct NeverResolves;

#[async_trait]
impl AsyncEnhancer for NeverResolves {
    async fn enhance(&self, _request: EnhanceRequest) -> Result<Enhancement, AccelError> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "never"
    }
}

struct Failing;

#[async_trait]
impl AsyncEnhancer for Failing {
    async fn enhance(&self, _request: EnhanceRequest) -> Result<Enhancement, AccelError> {
        Err(AccelError::Backend("device lost".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct Slow(Duration);

impl SignalEnhancer for Slow {
    fn enhance(&mut self, request: &EnhanceRequest) -> ProcessingResult<Enhancement> {
        std::thread::sleep(self.0);
        NumericEnhancer::run(request)
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn worker_backend_tracks_heart_rate() {
    let worker = WorkerEnhancer::spawn(NumericEnhancer::new(), 16);
    let mut processor =
        AcceleratedProcessor::new(conditioned_processor(), worker, AcceleratorConfig::default()).unwrap();
    processor.start();

    let samples = pulse(1.2, 300);
    let results = processor.process_block(&samples).await;

    assert_eq!(results.len(), samples.len());
    let last = results.last().unwrap();
    assert!((60..=84).contains(&last.heart_rate), "got {}", last.heart_rate);
    assert_eq!(processor.fallback_count(), 0);
    assert_eq!(processor.processor().conditioner().fallback_count(), 0);
    assert_eq!(processor.backend_name(), "numeric");
}

#[tokio::test]
async fn never_resolving_backend_falls_back_after_deadline() {
    let config = AcceleratorConfig { timeout_ms: 50, ..Default::default() };
    let mut processor = AcceleratedProcessor::new(conditioned_processor(), NeverResolves, config).unwrap();
    processor.start();

    let samples = pulse(1.2, 60);
    let started = Instant::now();
    let results = processor.process_block(&samples).await;

    assert_eq!(results.len(), 60);
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(processor.fallback_count(), 2);
    // The fallback answered with a valid block, so the filter saw no failure
    assert_eq!(processor.processor().conditioner().fallback_count(), 0);
}

#[tokio::test]
async fn timeout_output_matches_inline_backend() {
    let samples = pulse(1.2, 90);

    let config = AcceleratorConfig { timeout_ms: 20, ..Default::default() };
    let mut timed_out = AcceleratedProcessor::new(conditioned_processor(), NeverResolves, config).unwrap();
    timed_out.start();
    let a = timed_out.process_block(&samples).await;

    let mut inline =
        AcceleratedProcessor::new(conditioned_processor(), InlineEnhancer, AcceleratorConfig::default()).unwrap();
    inline.start();
    let b = inline.process_block(&samples).await;

    assert_eq!(a, b);
}

#[tokio::test]
async fn backend_error_is_absorbed() {
    let mut processor =
        AcceleratedProcessor::new(conditioned_processor(), Failing, AcceleratorConfig::default()).unwrap();
    processor.start();

    let results = processor.process_block(&pulse(1.0, 120)).await;
    assert_eq!(results.len(), 120);
    assert_eq!(processor.fallback_count(), 4);
}

#[tokio::test]
async fn disabled_conditioning_skips_backend() {
    let processor = VitalSignsProcessor::new(ProcessorConfig::default()).unwrap();
    let mut processor = AcceleratedProcessor::new(processor, Failing, AcceleratorConfig::default()).unwrap();
    processor.start();

    let results = processor.process_block(&pulse(1.0, 60)).await;
    assert_eq!(results.len(), 60);
    assert_eq!(processor.fallback_count(), 0);
}

#[tokio::test]
async fn block_matches_synchronous_processor() {
    let samples = pulse(1.5, 150);

    let mut sync = conditioned_processor();
    sync.start();
    let expected = sync.process_block(&samples);

    let mut accel =
        AcceleratedProcessor::new(conditioned_processor(), InlineEnhancer, AcceleratorConfig::default()).unwrap();
    accel.start();
    let actual = accel.process_block(&samples).await;

    assert_eq!(actual, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_cancels_queued_requests() {
    let worker = Arc::new(WorkerEnhancer::spawn(Slow(Duration::from_millis(200)), 4));
    let request = || vitalguard_core::AdaptiveFilter::default().batch_request(&[1.0, 2.0, 3.0]);

    let first = tokio::spawn({
        let worker = Arc::clone(&worker);
        let request = request();
        async move { worker.enhance(request).await }
    });
    let second = tokio::spawn({
        let worker = Arc::clone(&worker);
        let request = request();
        async move { worker.enhance(request).await }
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    worker.stop();

    for handle in [first, second] {
        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, Err(AccelError::Cancelled)), "{:?}", outcome.map(|e| e.values));
    }
    assert!(matches!(worker.enhance(request()).await, Err(AccelError::WorkerStopped)));
}

#[tokio::test]
async fn stopped_processor_is_inert() {
    let worker = WorkerEnhancer::spawn(NumericEnhancer::new(), 4);
    let mut processor =
        AcceleratedProcessor::new(conditioned_processor(), worker, AcceleratorConfig::default()).unwrap();
    processor.start();
    processor.stop();

    let results = processor.process_block(&pulse(1.2, 30)).await;
    assert!(results.iter().all(|r| r.is_empty()));
}

#[tokio::test]
async fn restart_after_stop_conditions_in_process() {
    let worker = WorkerEnhancer::spawn(NumericEnhancer::new(), 4);
    let mut processor =
        AcceleratedProcessor::new(conditioned_processor(), worker, AcceleratorConfig::default()).unwrap();
    processor.start();
    processor.process_block(&pulse(1.2, 60)).await;
    processor.stop();
    assert!(processor.is_backend_released());

    processor.start();
    processor.reset();
    let results = processor.process_block(&pulse(1.2, 300)).await;

    assert_eq!(results.len(), 300);
    assert!(results.iter().all(|r| !r.stale));
    assert!((60..=84).contains(&results[299].heart_rate), "got {}", results[299].heart_rate);
    assert_eq!(processor.fallback_count(), 0);
    assert_eq!(processor.processor().conditioner().fallback_count(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let config = AcceleratorConfig { batch_size: 0, ..Default::default() };
    let err = AcceleratedProcessor::new(conditioned_processor(), InlineEnhancer, config).unwrap_err();
    assert!(matches!(err, ProcessingError::InvalidConfig { .. }));
}
