//! End-to-end tests of the per-sample pipeline
//!
//! Covers:
//! - Flatline and periodic-pulse scenarios
//! - Quality-gate replay and freshness
//! - Block path with conditioning
//! - RR side channel
//! - Custom channel registration

#![cfg(test)]

mod common;

use vitalguard_core::{
    channels::{ChannelOutput, Spo2Output, VitalChannel},
    ArrhythmiaStatus, ConditioningConfig, ChannelFeedback, ProcessorConfig, RawSample,
    RrIntervalData, VitalSignType,
};

use common::{
    generators::{self, FRAME_MS},
    scenarios::Scenario,
    run, run_last, started_processor, started_with,
};

#[test]
fn test_scenarios_heart_rate() {
    for scenario in Scenario::all() {
        let mut processor = started_processor();
        let result = run_last(&mut processor, &scenario.samples);
        match scenario.heart_rate {
            None => assert_eq!(result.heart_rate, 0, "{}", scenario.name),
            Some((lo, hi)) => assert!(
                (lo..=hi).contains(&result.heart_rate),
                "{}: {} bpm outside [{}, {}]",
                scenario.name,
                result.heart_rate,
                lo,
                hi
            ),
        }
    }
}

#[test]
fn test_flatline_baseline_snapshot() {
    let mut processor = started_processor();
    let result = run_last(&mut processor, &generators::flatline(0.5, 100));

    assert_eq!(result.heart_rate, 0);
    assert_eq!(result.arrhythmia, ArrhythmiaStatus::Calibrating);
    assert!((90..=100).contains(&result.spo2));
    assert!(result.blood_pressure.systolic >= 80 && result.blood_pressure.systolic <= 200);
    assert!(result.blood_pressure.systolic >= result.blood_pressure.diastolic + 20);
    assert!((70..=180).contains(&result.glucose));
    assert!((120..=300).contains(&result.lipids.total_cholesterol));
    assert!(result.correlation_validated);
    assert_eq!(result.inconsistency_count, 0);
    assert!(!result.stale);
}

#[test]
fn test_periodic_pulse_rhythm() {
    let mut processor = started_processor();
    let result = run_last(&mut processor, &generators::sine_pulse(1.2, 1.0, 0.0, 300));

    assert!((67..=77).contains(&result.heart_rate), "got {}", result.heart_rate);
    assert!(result.rhythm_regularity > 0.8, "regularity {}", result.rhythm_regularity);
    assert_eq!(result.arrhythmia, ArrhythmiaStatus::Normal);
    assert!(result.confidence.cardiac > 0.5);
}

#[test]
fn test_heart_rate_tracks_rate_change() {
    let mut processor = started_processor();
    let results = run(&mut processor, &generators::rate_change(1.0, 2.0, 300, 0.0, 750));

    let resting = results[299];
    assert!((55..=65).contains(&resting.heart_rate), "got {}", resting.heart_rate);

    // Same session, no reset: the interval history turns over
    let elevated = results[749];
    assert!((115..=125).contains(&elevated.heart_rate), "got {}", elevated.heart_rate);
    assert_eq!(elevated.arrhythmia, ArrhythmiaStatus::Normal);
}

#[test]
fn test_bright_exposure_keeps_rate() {
    for offset in [60.0, 120.0, 200.0] {
        let mut processor = started_processor();
        let result = run_last(&mut processor, &generators::sine_pulse(1.2, 1.0, offset, 300));

        assert!((67..=77).contains(&result.heart_rate), "offset {}: {} bpm", offset, result.heart_rate);
        assert!(result.rhythm_regularity > 0.8, "offset {}: regularity {}", offset, result.rhythm_regularity);
        assert_eq!(result.arrhythmia, ArrhythmiaStatus::Normal, "offset {}", offset);
        assert_eq!(
            processor.distributor().adjustment(VitalSignType::Cardiac).map(|a| a.gain),
            Some(1.0)
        );
    }
}

#[test]
fn test_lost_pulse_decays_confidence() {
    let mut processor = started_processor();
    let results = run(&mut processor, &generators::pulse_then_flat(1.2, 120.0, 300, 300));

    let with_pulse = results[299];
    assert!((67..=77).contains(&with_pulse.heart_rate), "got {}", with_pulse.heart_rate);
    assert!(with_pulse.confidence.cardiac > 0.5);

    let lost = results[599];
    assert_eq!(lost.heart_rate, 0);
    assert!(lost.confidence.cardiac < 0.1, "cardiac confidence {}", lost.confidence.cardiac);
    assert!(!lost.stale);
}

#[test]
fn test_dropout_replays_then_expires() {
    let mut processor = started_processor();
    let samples = generators::with_dropout(generators::sine_pulse(1.2, 1.0, 0.0, 300), 200..300);
    let results = run(&mut processor, &samples);

    let last_fresh = results[199];
    assert!(!last_fresh.stale);

    // Within the freshness window the last result is replayed
    let early = results[210];
    assert!(early.stale);
    assert_eq!(early.heart_rate, last_fresh.heart_rate);
    assert_eq!(early.age_ms, 11 * FRAME_MS);

    // 100 frames * 33 ms > 3000 ms: no longer replayed
    let late = results[299];
    assert!(late.stale);
    assert_eq!(late.heart_rate, 0);
    assert!(late.is_empty());
}

#[test]
fn test_block_path_with_conditioning() {
    let config = ProcessorConfig {
        conditioning: ConditioningConfig { enabled: true, ..Default::default() },
        ..Default::default()
    };
    let samples = generators::sine_pulse(1.2, 1.0, 0.0, 300);

    let mut processor = started_with(config);
    let results = processor.process_block(&samples);
    assert_eq!(results.len(), samples.len());
    assert_eq!(processor.conditioner().fallback_count(), 0);
    assert_eq!(processor.conditioner().enhancer_name(), "numeric");

    let last = results[results.len() - 1];
    assert!((60..=84).contains(&last.heart_rate), "got {}", last.heart_rate);
}

#[test]
fn test_rr_side_channel_feeds_rhythm() {
    let mut processor = started_processor();
    let rr = RrIntervalData::from_intervals(&[800.0, 820.0, 790.0, 810.0, 805.0]);
    processor.ingest_rr_intervals(&rr);

    // A slow ramp has no detectable peaks but real signal
    let samples: Vec<RawSample> = (0..60)
        .map(|i| RawSample::new(i as f32 * 0.01, i * FRAME_MS).with_quality(80.0, true))
        .collect();
    let result = run_last(&mut processor, &samples);

    assert!((72..=77).contains(&result.heart_rate), "got {}", result.heart_rate);
    assert_eq!(result.arrhythmia, ArrhythmiaStatus::Normal);
}

struct FixedSpo2;

impl VitalChannel for FixedSpo2 {
    fn channel_type(&self) -> VitalSignType {
        VitalSignType::Spo2
    }

    fn process_signal(&mut self, _value: f32) -> ChannelOutput {
        ChannelOutput::Spo2(Spo2Output { spo2: 93.0, confidence: 0.9 })
    }

    fn confidence(&self) -> f32 {
        0.9
    }

    fn feedback(&self) -> Option<ChannelFeedback> {
        None
    }

    fn reset(&mut self) {}
}

#[test]
fn test_custom_channel_replaces_builtin() {
    let mut processor = started_processor();
    processor.register_channel(Box::new(FixedSpo2)).unwrap();
    assert_eq!(processor.distributor().channel_count(), 5);

    let result = run_last(&mut processor, &generators::flatline(0.5, 20));
    assert_eq!(result.spo2, 93);
    assert!((result.confidence.spo2 - 0.9).abs() < 1e-6);
}

#[test]
fn test_stopped_processor_is_inert() {
    let mut processor = started_processor();
    processor.stop();
    let results = run(&mut processor, &generators::sine_pulse(1.2, 1.0, 0.0, 60));
    assert!(results.iter().all(|r| r.is_empty() && !r.stale));
    assert_eq!(processor.samples_processed(), 0);
}
