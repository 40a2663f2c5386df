//! # VitalGuard Accel
//!
//! Async enhancement backends for the VitalGuard processing core.
//!
//! The core conditions blocks of samples through a synchronous
//! `SignalEnhancer`. This crate lets that step run elsewhere, on a tokio
//! worker or any other [`AsyncEnhancer`], while keeping the core's promise
//! that a block always yields one result per sample: every call carries a
//! deadline and falls back to the in-process numeric filter on timeout,
//! backend error or malformed output.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vitalguard_accel::{AcceleratedProcessor, AcceleratorConfig, WorkerEnhancer};
//! use vitalguard_core::{NumericEnhancer, ProcessorConfig, RawSample, VitalSignsProcessor};
//!
//! # async fn run() -> Result<(), vitalguard_core::ProcessingError> {
//! let mut config = ProcessorConfig::default();
//! config.conditioning.enabled = true;
//!
//! let worker = WorkerEnhancer::spawn(NumericEnhancer::new(), 16);
//! let mut processor = AcceleratedProcessor::new(
//!     VitalSignsProcessor::new(config)?,
//!     worker,
//!     AcceleratorConfig::default(),
//! )?;
//! processor.start();
//!
//! let block: Vec<RawSample> = (0..30).map(|i| RawSample::new(1.0, i * 33)).collect();
//! let results = processor.process_block(&block).await;
//! assert_eq!(results.len(), 30);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod enhancer;
pub mod error;
pub mod processor;

pub use config::AcceleratorConfig;
pub use enhancer::{AsyncEnhancer, InlineEnhancer, TimeoutEnhancer, WorkerEnhancer};
pub use error::AccelError;
pub use processor::AcceleratedProcessor;
