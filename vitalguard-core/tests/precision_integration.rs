//! Integration tests for the precision layer
//!
//! Tests the calibration, cross-validation and environmental collaborators
//! both standalone and wired into a processor session.

#![cfg(test)]

mod common;

use vitalguard_core::{
    precision::{
        CalibrationManager, CalibrationReference, ConditionsUpdate, CrossValidator, DeviceClass,
        EnvironmentalAdjuster, Inconsistency, PrecisionContext,
    },
    MeasurementField, Measurements, ProcessingError, ProcessorConfig, VitalSignsProcessor,
};

use common::{generators, run_last, started_processor};

fn spo2_reference(value: f32, timestamp: u64) -> CalibrationReference {
    CalibrationReference::new(Measurements::default().with(MeasurementField::Spo2, value), timestamp)
}

#[test]
fn test_calibration_convergence() {
    let mut manager = CalibrationManager::new();
    assert!(!manager.is_system_calibrated());

    manager.add_reference_data(spo2_reference(95.0, 1_000));
    manager.add_reference_data(spo2_reference(95.0, 2_000));
    assert!(manager.is_system_calibrated());

    let calibrated = manager.apply_calibration(MeasurementField::Spo2, 97.0);
    assert!(calibrated <= 97.0);
    assert!(calibrated >= 97.0 * (95.0 / 97.0));
    assert_eq!(manager.factors().last_updated, Some(2_000));
}

#[test]
fn test_calibration_confidence_caps_and_resets() {
    let mut manager = CalibrationManager::new();
    let mut previous = manager.calibration_confidence();
    for i in 0..8 {
        manager.add_reference_data(spo2_reference(96.0, i));
        let now = manager.calibration_confidence();
        assert!(now >= previous);
        previous = now;
    }
    assert_eq!(manager.reference_count(), 5);
    assert_eq!(manager.calibration_confidence(), 1.0);

    manager.reset_calibration();
    assert_eq!(manager.calibration_confidence(), 0.0);
    assert_eq!(manager.apply_calibration(MeasurementField::Spo2, 97.0), 97.0);
}

#[test]
fn test_out_of_range_pressure_correction() {
    let validator = CrossValidator::new();
    let input = Measurements::default()
        .with(MeasurementField::Systolic, 70.0)
        .with(MeasurementField::Diastolic, 90.0);

    let report = validator.validate_measurements(&input);
    assert!(report
        .inconsistencies
        .iter()
        .any(|i| matches!(i, Inconsistency::InvertedPressure { .. })));

    let fixed = validator.apply_adjustments(&input, &report);
    let s = fixed.systolic.unwrap();
    let d = fixed.diastolic.unwrap();
    assert!(d < s);
    assert!(s - d >= 20.0 - 1e-3);
    assert!((80.0..=200.0).contains(&s));
    assert!((40.0..=120.0).contains(&d));
}

#[test]
fn test_failed_validation_as_error() {
    let validator = CrossValidator::new();
    let absurd = Measurements::default()
        .with(MeasurementField::HeartRate, 250.0)
        .with(MeasurementField::Spo2, 60.0)
        .with(MeasurementField::Systolic, 260.0)
        .with(MeasurementField::Diastolic, 300.0)
        .with(MeasurementField::Glucose, 500.0);

    let err = validator.validate_measurements(&absurd).into_result().unwrap_err();
    assert!(matches!(err, ProcessingError::CrossValidationFailed { inconsistencies } if inconsistencies > 4));
}

#[test]
fn test_environment_standalone() {
    let mut adjuster = EnvironmentalAdjuster::new();
    adjuster.update_conditions(ConditionsUpdate {
        light_level: Some(0.1),
        temperature_c: Some(30.0),
        device: Some(DeviceClass::from_model("Galaxy S24 Ultra")),
        ..Default::default()
    });
    let f = adjuster.adjustment_factors();
    assert!(f.signal_amplification > 1.0);
    assert!(f.confidence < 1.0);
    assert!(adjuster.apply_signal_adjustment(1.0) > 1.0);
}

#[test]
fn test_processor_reports_calibration_and_environment() {
    let mut processor = started_processor();
    processor.add_calibration_reference(spo2_reference(95.0, 0));
    processor.add_calibration_reference(spo2_reference(95.0, 1));
    processor.update_environmental_conditions(ConditionsUpdate {
        light_level: Some(0.1),
        ..Default::default()
    });

    let result = run_last(&mut processor, &generators::flatline(0.5, 60));
    assert!(result.calibrated);
    assert!(result.environment_adjusted);
    assert!((result.confidence.environment - 0.85).abs() < 1e-6);
    assert!((90..=100).contains(&result.spo2));
}

#[test]
fn test_precision_context_is_per_session() {
    let mut first = started_processor();
    first.add_calibration_reference(spo2_reference(95.0, 0));
    first.add_calibration_reference(spo2_reference(95.0, 1));

    let second = started_processor();
    assert!(first.precision().calibration.is_system_calibrated());
    assert!(!second.precision().calibration.is_system_calibrated());

    // Calibration can be carried into a new session explicitly
    let carried: PrecisionContext = first.precision().clone();
    let third = VitalSignsProcessor::new(ProcessorConfig::default())
        .unwrap()
        .with_precision(carried);
    assert_eq!(third.precision().calibration.reference_count(), 2);
}

#[test]
fn test_environment_estimation_from_signal() {
    let config = ProcessorConfig { estimate_environment: true, ..Default::default() };
    let mut processor = common::started_with(config);
    let _ = run_last(&mut processor, &generators::noisy_pulse(1.2, 1.5, 0.5, 90, 7));

    let conditions = *processor.precision().environment.conditions();
    assert!(conditions.motion_level > 0.3);
    assert!(processor.distributor().noise_reduction() > 1.0);
}
