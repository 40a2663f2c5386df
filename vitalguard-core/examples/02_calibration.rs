//! Calibration and Environment Example
//!
//! Shows how operator reference readings and ambient conditions change the
//! snapshot of the same input stream.
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_calibration
//! ```

use std::f32::consts::PI;

use vitalguard_core::{
    precision::{CalibrationReference, ConditionsUpdate, DeviceClass},
    MeasurementField, Measurements, ProcessingResult, ProcessorConfig, RawSample,
    VitalSignsProcessor, VitalSignsResult,
};

fn stream(processor: &mut VitalSignsProcessor) -> VitalSignsResult {
    let mut last = VitalSignsResult::empty(0);
    for frame in 0..300u64 {
        let t = frame as f32 / 30.0;
        let value = 0.5 + 0.3 * (2.0 * PI * 1.1 * t).sin();
        last = processor.process_sample(RawSample::new(value, frame * 33).with_quality(90.0, true));
    }
    last
}

fn show(label: &str, r: &VitalSignsResult) {
    println!(
        "{label:<14} HR {:>3}  SpO2 {:>3}  BP {:>7}  Glu {:>3}  calibrated={} env={} precision {:.2}",
        r.heart_rate,
        r.spo2,
        r.blood_pressure.to_string(),
        r.glucose,
        r.calibrated,
        r.environment_adjusted,
        r.precision
    );
}

fn main() -> ProcessingResult<()> {
    println!("VitalGuard Calibration Example");
    println!("==============================\n");

    let mut processor = VitalSignsProcessor::new(ProcessorConfig::default())?;
    processor.start();
    show("uncalibrated", &stream(&mut processor));

    // Two cuff/oximeter readings taken by the operator
    for (i, (spo2, sys, dia)) in [(95.0, 128.0, 84.0), (96.0, 126.0, 82.0)].into_iter().enumerate() {
        let reference = Measurements::default()
            .with(MeasurementField::Spo2, spo2)
            .with(MeasurementField::Systolic, sys)
            .with(MeasurementField::Diastolic, dia);
        processor.add_calibration_reference(CalibrationReference::new(reference, i as u64));
    }
    processor.reset();
    show("calibrated", &stream(&mut processor));

    // Dim room, budget phone, some hand tremor
    processor.update_environmental_conditions(ConditionsUpdate {
        light_level: Some(0.15),
        motion_level: Some(0.4),
        device: Some(DeviceClass::from_model("Moto G Lite")),
        ..Default::default()
    });
    processor.reset();
    show("dim + tremor", &stream(&mut processor));

    let factors = processor.precision().calibration.factors();
    println!(
        "\nfactors: SpO2 x{:.3}, systolic x{:.3}, confidence {:.2}",
        factors.factor(MeasurementField::Spo2),
        factors.factor(MeasurementField::Systolic),
        factors.confidence
    );
    Ok(())
}
