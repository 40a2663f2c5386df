//! Per-channel adaptive PPG processing for VitalGuard
//!
//! Turns a camera photoplethysmography stream (one brightness scalar per
//! frame) into heart rate, SpO2, blood pressure, glucose and lipid
//! estimates. Every vital sign has its own channel with its own filter,
//! window and confidence; a distributor fans samples out and folds channel
//! feedback back into per-channel conditioning; a precision layer validates,
//! calibrates and compensates the combined snapshot.
//!
//! Key constraints:
//! - `no_std` capable (needs `alloc`)
//! - Fixed-capacity registries and histories via `heapless`
//! - The per-sample path never returns an error
//!
//! ```no_run
//! use vitalguard_core::{ProcessorConfig, RawSample, VitalSignsProcessor};
//!
//! let mut processor = VitalSignsProcessor::new(ProcessorConfig::default()).unwrap();
//! processor.start();
//!
//! let result = processor.process_sample(RawSample::new(0.52, 0).with_quality(85.0, true));
//! println!("{} bpm, BP {}", result.heart_rate, result.blood_pressure);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod buffer;
pub mod channels;
pub mod conditioner;
pub mod confidence;
pub mod config;
pub mod constants;
pub mod distributor;
pub mod enhancer;
pub mod errors;
pub mod filter;
pub mod peaks;
pub mod precision;
pub mod processor;
pub mod result;
pub mod rr;
pub mod stats;
pub mod time;
pub mod types;

// Public API
pub use channels::{ArrhythmiaStatus, ChannelFeedback, ChannelOutput, SuggestedAdjustments, VitalChannel};
pub use conditioner::{ConditioningConfig, SignalConditioner};
#[cfg(feature = "std")]
pub use config::ConfigError;
pub use config::ProcessorConfig;
pub use distributor::{DistributorConfig, DistributorOutput, SignalDistributor};
pub use enhancer::{EnhanceRequest, Enhancement, NumericEnhancer, SignalEnhancer};
pub use errors::{ProcessingError, ProcessingResult};
pub use filter::{AdaptiveFilter, FilterConfig};
pub use peaks::{DetectorConfig, PeakDetection, PeakIntervalDetector};
pub use precision::{
    CalibrationManager, CalibrationReference, ConditionsUpdate, CrossValidator, DeviceClass,
    EnvironmentalAdjuster, PrecisionContext,
};
pub use processor::{PreparedBlock, VitalSignsProcessor};
pub use result::{BloodPressure, ConfidenceBreakdown, Lipids, VitalSignsResult};
pub use rr::RrIntervalData;
pub use time::Timestamp;
pub use types::{MeasurementField, Measurements, RawSample, VitalSignType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
