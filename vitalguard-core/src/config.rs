//! Processor configuration
//!
//! All tuning for one session in a single serde-friendly tree. Every nested
//! section has its own defaults and `validate()`; missing keys in a JSON
//! document fall back to those defaults.
//!
//! ```json
//! {
//!   "distributor": { "quality_threshold": 40.0 },
//!   "conditioning": { "enabled": true, "batch_size": 30 },
//!   "stale_after_ms": 2000
//! }
//! ```

use crate::conditioner::ConditioningConfig;
use crate::constants::timing::DEFAULT_STALE_AFTER_MS;
use crate::distributor::DistributorConfig;
use crate::errors::{ProcessingError, ProcessingResult};
use crate::filter::FilterConfig;
use crate::peaks::DetectorConfig;

/// Complete session configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcessorConfig {
    /// Fan-out and feedback settings
    pub distributor: DistributorConfig,
    /// Per-channel filter settings
    pub filter: FilterConfig,
    /// Cardiac peak detector settings
    pub detector: DetectorConfig,
    /// Pre-distribution conditioning
    pub conditioning: ConditioningConfig,
    /// Age after which the last result is no longer replayed (ms)
    pub stale_after_ms: u64,
    /// Estimate light and motion from the raw signal
    pub estimate_environment: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            distributor: DistributorConfig::default(),
            filter: FilterConfig::default(),
            detector: DetectorConfig::default(),
            conditioning: ConditioningConfig::default(),
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
            estimate_environment: false,
        }
    }
}

impl ProcessorConfig {
    /// Check every section
    pub fn validate(&self) -> ProcessingResult<()> {
        self.distributor.validate()?;
        self.filter.validate()?;
        self.detector.validate()?;
        self.conditioning.validate()?;
        if libm::fabsf(self.detector.sample_rate_hz - self.distributor.sample_rate_hz) > f32::EPSILON {
            return Err(ProcessingError::InvalidConfig {
                reason: "detector and distributor sample rates differ",
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    #[cfg(feature = "std")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration loading failures
#[cfg(feature = "std")]
#[derive(Debug, thiserror_no_std::Error)]
pub enum ConfigError {
    /// Malformed JSON or wrong types
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed but rejected by validation
    #[error("Configuration rejected: {0}")]
    Invalid(#[from] ProcessingError),
}
