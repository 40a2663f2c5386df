//! Live Stream Example
//!
//! Feeds a synthetic 30 fps PPG stream through a processor session and
//! prints the snapshot once per second, the way a display layer would.
//!
//! ## What You'll Learn
//!
//! - Session lifecycle (`start`, `stop`, `reset`)
//! - Reading display-ready fields from `VitalSignsResult`
//! - How a lost finger shows up as stale replay
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_live_stream
//! ```

use std::f32::consts::PI;

use vitalguard_core::{ProcessorConfig, RawSample, VitalSignsProcessor};

fn main() {
    print_banner();

    let mut processor = match VitalSignsProcessor::new(ProcessorConfig::default()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return;
        }
    };
    processor.start();

    // 20 s at 30 fps: a 75 bpm pulse, finger lifted between 12 s and 14 s
    for frame in 0..600u64 {
        let t = frame as f32 / 30.0;
        let value = 0.6 + 0.2 * (2.0 * PI * 1.25 * t).sin() + 0.03 * (2.0 * PI * 0.2 * t).sin();
        let finger = !(12.0..14.0).contains(&t);
        let sample = RawSample::new(value, frame * 33).with_quality(if finger { 85.0 } else { 5.0 }, finger);

        let r = processor.process_sample(sample);
        if frame % 30 == 29 {
            println!(
                "t={:>4.1}s  HR {:>3}  SpO2 {:>3}  BP {:>7}  Glu {:>3}  Chol/Trig {:>3}/{:<3}  {:<22} precision {:.2}{}",
                t,
                r.heart_rate,
                r.spo2,
                r.blood_pressure.to_string(),
                r.glucose,
                r.lipids.total_cholesterol,
                r.lipids.triglycerides,
                r.arrhythmia.to_string(),
                r.precision,
                if r.stale { format!("  (stale, {} ms)", r.age_ms) } else { String::new() },
            );
        }
    }

    processor.stop();
}

fn print_banner() {
    println!("VitalGuard Live Stream Example");
    println!("==============================\n");
}
