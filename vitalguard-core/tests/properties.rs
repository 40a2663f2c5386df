//! Property tests for the pipeline invariants

#![cfg(test)]

use proptest::prelude::*;

use vitalguard_core::{
    channels::{BloodPressureChannel, CardiacChannel, ChannelOutput, Spo2Channel, VitalChannel},
    precision::{CalibrationManager, CalibrationReference, CrossValidator},
    AdaptiveFilter, DetectorConfig, FilterConfig, MeasurementField, Measurements,
    PeakIntervalDetector, RrIntervalData,
};

fn raw_series() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, 0..200)
}

proptest! {
    #[test]
    fn filter_converges_on_constant_input(v in -1000.0f32..1000.0, seed in -1000.0f32..1000.0) {
        let mut filter = AdaptiveFilter::new(FilterConfig::default()).with_initial_estimate(seed);
        let mut out = seed;
        for _ in 0..100 {
            out = filter.filter(v);
        }
        let tolerance = (0.01 * v.abs()).max(1e-3);
        prop_assert!((out - v).abs() <= tolerance, "{} vs {}", out, v);
    }

    #[test]
    fn cardiac_heart_rate_in_range(values in raw_series()) {
        let mut channel = CardiacChannel::default();
        for v in values {
            if let ChannelOutput::Cardiac(o) = channel.process_signal(v) {
                prop_assert!(o.heart_rate == 0.0 || (40.0..=180.0).contains(&o.heart_rate));
                prop_assert!((0.0..=1.0).contains(&o.confidence));
            }
        }
    }

    #[test]
    fn spo2_in_range(values in raw_series()) {
        let mut channel = Spo2Channel::new();
        for v in values {
            if let ChannelOutput::Spo2(o) = channel.process_signal(v) {
                prop_assert!(o.spo2 == 0.0 || (90.0..=100.0).contains(&o.spo2));
            }
        }
    }

    #[test]
    fn blood_pressure_keeps_pulse_pressure(values in raw_series()) {
        let mut channel = BloodPressureChannel::new();
        for v in values {
            if let ChannelOutput::BloodPressure(o) = channel.process_signal(v) {
                if o.systolic > 0.0 && o.diastolic > 0.0 {
                    prop_assert!(o.systolic - o.diastolic >= 20.0 - 1e-3);
                    prop_assert!((80.0..=200.0).contains(&o.systolic));
                    prop_assert!((40.0..=120.0).contains(&o.diastolic));
                }
            }
        }
    }

    #[test]
    fn peaks_respect_min_distance(values in prop::collection::vec(-10.0f32..10.0, 0..300)) {
        let config = DetectorConfig::default();
        let min_distance = config.min_distance();
        let mut detector = PeakIntervalDetector::new(config);
        let detection = detector.detect_peaks(&values);
        for pair in detection.peak_indices.windows(2) {
            prop_assert!(pair[1] - pair[0] >= min_distance);
        }
    }

    #[test]
    fn calibration_confidence_is_monotonic(values in prop::collection::vec(60.0f32..140.0, 1..10)) {
        let mut manager = CalibrationManager::new();
        let mut previous = manager.calibration_confidence();
        for (i, v) in values.iter().enumerate() {
            let m = Measurements::default().with(MeasurementField::Glucose, *v);
            manager.add_reference_data(CalibrationReference::new(m, i as u64));
            let now = manager.calibration_confidence();
            prop_assert!(now >= previous);
            previous = now;
        }
        manager.reset_calibration();
        prop_assert_eq!(manager.calibration_confidence(), 0.0);
    }

    #[test]
    fn validator_leaves_valid_snapshots_alone(
        hr in 60.0f32..100.0,
        spo2 in 95.0f32..100.0,
        sys in 110.0f32..130.0,
        pp in 30.0f32..50.0,
        glucose in 80.0f32..140.0,
    ) {
        let m = Measurements::default()
            .with(MeasurementField::HeartRate, hr)
            .with(MeasurementField::Spo2, spo2)
            .with(MeasurementField::Systolic, sys)
            .with(MeasurementField::Diastolic, sys - pp)
            .with(MeasurementField::Glucose, glucose);
        let validator = CrossValidator::new();
        let report = validator.validate_measurements(&m);
        prop_assert!(report.inconsistencies.is_empty());
        prop_assert_eq!(validator.apply_adjustments(&m, &report), m);
    }

    #[test]
    fn rr_data_stays_bounded(intervals in prop::collection::vec(0.0f32..3000.0, 0..64)) {
        let data = RrIntervalData::from_intervals(&intervals);
        prop_assert!(data.len() <= 20);
        prop_assert!(data.intervals().iter().all(|v| (300.0..=2000.0).contains(v)));
    }
}
