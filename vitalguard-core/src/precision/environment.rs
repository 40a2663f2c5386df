//! Environmental Compensation
//!
//! ## Overview
//!
//! Ambient light, skin temperature, device motion and the phone itself all
//! change the raw brightness signal before any channel sees it. The adjuster
//! turns the current [`EnvironmentalConditions`] into four factors:
//!
//! ```text
//! value' = (value + offset) * amplification
//! ```
//!
//! plus a `noise_reduction` multiplier (handed to the distributor's
//! smoothing) and a `confidence` factor for the final snapshot.
//!
//! ## Effects
//!
//! Each condition is evaluated independently. Effects multiply into
//! amplification, noise reduction and confidence and add into offset:
//!
//! | Condition                    | Effect                                      |
//! |------------------------------|---------------------------------------------|
//! | light < 0.3                  | amplify by `1 + (0.3 - light)`, conf × 0.85 |
//! | light > 0.8                  | amplify × 0.9, offset − 0.05 (saturation)   |
//! | temperature outside 18–26 °C | amplify × `1 + 0.01 dev`, conf × `1 - 0.02 dev` (≥ 0.5) |
//! | screen brightness > 0.8      | noise × 1.2, offset + 0.02                  |
//! | battery < 0.2                | noise × 1.1                                 |
//! | motion > 0.3                 | noise × `1 + motion`, conf × `1 - 0.5 motion` (≥ 0.3) |
//! | device class                 | per-class multipliers                       |
//!
//! Final clamps: amplification `[0.5, 2]`, noise reduction `[1, 3]`, offset
//! `±0.5`, confidence `[0.1, 1]`.
//!
//! ## Estimation
//!
//! Without sensor data, light is guessed from the recent signal range and
//! motion from its standard deviation. Fields supplied through
//! `update_conditions` are never overwritten by estimates.

use alloc::string::String;

use crate::stats;

const LOW_LIGHT: f32 = 0.3;
const HIGH_LIGHT: f32 = 0.8;
const COMFORT_TEMPERATURE_C: (f32, f32) = (18.0, 26.0);
const HIGH_BRIGHTNESS: f32 = 0.8;
const LOW_BATTERY: f32 = 0.2;
const MOTION_THRESHOLD: f32 = 0.3;

/// Signal range treated as full illumination when estimating light
const ESTIMATE_FULL_LIGHT_RANGE: f32 = 2.0;
/// Standard deviation treated as maximal motion when estimating motion
const ESTIMATE_FULL_MOTION_STD: f32 = 1.0;
/// Minimum samples for estimation
const ESTIMATE_MIN_SAMPLES: usize = 10;

/// Coarse camera/sensor class of the capturing device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceClass {
    /// Unknown device, no tweaks
    #[default]
    Generic,
    /// Large sensor, good low-light response
    Flagship,
    /// Average sensor
    MidRange,
    /// Small noisy sensor
    Budget,
}

impl DeviceClass {
    /// Classify a device model string
    pub fn from_model(model: &str) -> Self {
        let model: String = model.to_ascii_lowercase();
        let has = |needle: &str| model.contains(needle);
        if has(" go") || has("lite") || has("budget") {
            DeviceClass::Budget
        } else if has("pro") || has("ultra") || has("max") || has("iphone") || has("pixel") {
            DeviceClass::Flagship
        } else if has("galaxy a") || has("redmi") || has("moto") || has("nord") {
            DeviceClass::MidRange
        } else {
            DeviceClass::Generic
        }
    }

    /// `(amplification, noise_reduction, confidence)` multipliers
    pub fn tweaks(&self) -> (f32, f32, f32) {
        match self {
            DeviceClass::Generic => (1.0, 1.0, 1.0),
            DeviceClass::Flagship => (0.95, 1.0, 1.0),
            DeviceClass::MidRange => (1.0, 1.05, 0.95),
            DeviceClass::Budget => (1.15, 1.2, 0.9),
        }
    }
}

/// Ambient conditions of the capture
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvironmentalConditions {
    /// Ambient light, 0 (dark) to 1 (bright)
    pub light_level: f32,
    /// Skin/device temperature (°C)
    pub temperature_c: f32,
    /// Device motion, 0 (still) to 1 (shaking)
    pub motion_level: f32,
    /// Screen brightness, 0 to 1
    pub screen_brightness: f32,
    /// Battery level, 0 to 1
    pub battery_level: f32,
    /// Device class
    pub device: DeviceClass,
}

impl Default for EnvironmentalConditions {
    fn default() -> Self {
        Self {
            light_level: 0.5,
            temperature_c: 22.0,
            motion_level: 0.0,
            screen_brightness: 0.5,
            battery_level: 1.0,
            device: DeviceClass::Generic,
        }
    }
}

/// Partial update of the conditions; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConditionsUpdate {
    /// Ambient light
    pub light_level: Option<f32>,
    /// Temperature (°C)
    pub temperature_c: Option<f32>,
    /// Motion
    pub motion_level: Option<f32>,
    /// Screen brightness
    pub screen_brightness: Option<f32>,
    /// Battery level
    pub battery_level: Option<f32>,
    /// Device class
    pub device: Option<DeviceClass>,
}

/// Derived compensation factors
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdjustmentFactors {
    /// Multiplier applied after the offset
    pub signal_amplification: f32,
    /// Smoothing multiplier for the distributor
    pub noise_reduction: f32,
    /// Additive offset applied first
    pub signal_offset: f32,
    /// Confidence factor for the snapshot
    pub confidence: f32,
}

impl Default for AdjustmentFactors {
    fn default() -> Self {
        Self {
            signal_amplification: 1.0,
            noise_reduction: 1.0,
            signal_offset: 0.0,
            confidence: 1.0,
        }
    }
}

impl AdjustmentFactors {
    /// Whether the factors leave the signal untouched
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Computes and applies environmental compensation
#[derive(Debug, Clone, Default)]
pub struct EnvironmentalAdjuster {
    conditions: EnvironmentalConditions,
    light_supplied: bool,
    motion_supplied: bool,
    factors: AdjustmentFactors,
}

fn unit(v: f32) -> Option<f32> {
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

impl EnvironmentalAdjuster {
    /// Adjuster with neutral conditions
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge externally supplied conditions and recompute
    pub fn update_conditions(&mut self, update: ConditionsUpdate) {
        let c = &mut self.conditions;
        if let Some(v) = update.light_level.and_then(unit) {
            c.light_level = v;
            self.light_supplied = true;
        }
        if let Some(v) = update.temperature_c.filter(|v| v.is_finite()) {
            c.temperature_c = v;
        }
        if let Some(v) = update.motion_level.and_then(unit) {
            c.motion_level = v;
            self.motion_supplied = true;
        }
        if let Some(v) = update.screen_brightness.and_then(unit) {
            c.screen_brightness = v;
        }
        if let Some(v) = update.battery_level.and_then(unit) {
            c.battery_level = v;
        }
        if let Some(device) = update.device {
            c.device = device;
        }
        self.recompute();
    }

    /// Guess light and motion from recent raw values
    ///
    /// Needs at least ten finite values; fields supplied externally are kept.
    pub fn estimate_conditions(&mut self, recent: &[f32]) {
        if recent.len() < ESTIMATE_MIN_SAMPLES || !stats::all_finite(recent) {
            return;
        }
        if !self.light_supplied {
            self.conditions.light_level = (stats::span(recent) / ESTIMATE_FULL_LIGHT_RANGE).clamp(0.0, 1.0);
        }
        if !self.motion_supplied {
            self.conditions.motion_level = (stats::std_dev(recent) / ESTIMATE_FULL_MOTION_STD).clamp(0.0, 1.0);
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let c = &self.conditions;
        let mut f = AdjustmentFactors::default();

        if c.light_level < LOW_LIGHT {
            f.signal_amplification *= 1.0 + (LOW_LIGHT - c.light_level);
            f.confidence *= 0.85;
        } else if c.light_level > HIGH_LIGHT {
            f.signal_amplification *= 0.9;
            f.signal_offset -= 0.05;
        }

        let (t_lo, t_hi) = COMFORT_TEMPERATURE_C;
        let deviation = if c.temperature_c < t_lo {
            t_lo - c.temperature_c
        } else if c.temperature_c > t_hi {
            c.temperature_c - t_hi
        } else {
            0.0
        };
        if deviation > 0.0 {
            f.signal_amplification *= 1.0 + 0.01 * deviation;
            f.confidence *= (1.0 - 0.02 * deviation).max(0.5);
        }

        if c.screen_brightness > HIGH_BRIGHTNESS {
            f.noise_reduction *= 1.2;
            f.signal_offset += 0.02;
        }
        if c.battery_level < LOW_BATTERY {
            f.noise_reduction *= 1.1;
        }
        if c.motion_level > MOTION_THRESHOLD {
            f.noise_reduction *= 1.0 + c.motion_level;
            f.confidence *= (1.0 - 0.5 * c.motion_level).max(0.3);
        }

        let (amp, noise, conf) = c.device.tweaks();
        f.signal_amplification *= amp;
        f.noise_reduction *= noise;
        f.confidence *= conf;

        f.signal_amplification = f.signal_amplification.clamp(0.5, 2.0);
        f.noise_reduction = f.noise_reduction.clamp(1.0, 3.0);
        f.signal_offset = f.signal_offset.clamp(-0.5, 0.5);
        f.confidence = f.confidence.clamp(0.1, 1.0);
        self.factors = f;
    }

    /// `(value + offset) * amplification`
    pub fn apply_signal_adjustment(&self, value: f32) -> f32 {
        (value + self.factors.signal_offset) * self.factors.signal_amplification
    }

    /// Current factors
    pub fn adjustment_factors(&self) -> AdjustmentFactors {
        self.factors
    }

    /// Current conditions
    pub fn conditions(&self) -> &EnvironmentalConditions {
        &self.conditions
    }

    /// Back to neutral conditions
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let adj = EnvironmentalAdjuster::new();
        assert!(adj.adjustment_factors().is_neutral());
        assert_eq!(adj.apply_signal_adjustment(0.7), 0.7);
    }

    #[test]
    fn low_light_amplifies_and_costs_confidence() {
        let mut adj = EnvironmentalAdjuster::new();
        adj.update_conditions(ConditionsUpdate { light_level: Some(0.1), ..Default::default() });
        let f = adj.adjustment_factors();
        assert!((f.signal_amplification - 1.2).abs() < 1e-6);
        assert!((f.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn offset_applied_before_amplification() {
        let mut adj = EnvironmentalAdjuster::new();
        adj.update_conditions(ConditionsUpdate { light_level: Some(0.95), ..Default::default() });
        let expected = (1.0 - 0.05) * 0.9;
        assert!((adj.apply_signal_adjustment(1.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn heavy_motion_is_bounded() {
        let mut adj = EnvironmentalAdjuster::new();
        adj.update_conditions(ConditionsUpdate {
            motion_level: Some(1.0),
            screen_brightness: Some(1.0),
            battery_level: Some(0.05),
            temperature_c: Some(45.0),
            device: Some(DeviceClass::Budget),
            ..Default::default()
        });
        let f = adj.adjustment_factors();
        assert_eq!(f.noise_reduction, 3.0);
        assert!(f.confidence >= 0.1);
        assert!(f.signal_amplification <= 2.0);
    }

    #[test]
    fn estimation_respects_supplied_fields() {
        let mut adj = EnvironmentalAdjuster::new();
        adj.update_conditions(ConditionsUpdate { light_level: Some(0.6), ..Default::default() });
        let noisy: alloc::vec::Vec<f32> = (0..30).map(|i| if i % 2 == 0 { 2.0 } else { -2.0 }).collect();
        adj.estimate_conditions(&noisy);
        assert_eq!(adj.conditions().light_level, 0.6);
        assert_eq!(adj.conditions().motion_level, 1.0);
    }

    #[test]
    fn estimation_needs_history() {
        let mut adj = EnvironmentalAdjuster::new();
        adj.estimate_conditions(&[1.0, 5.0]);
        assert_eq!(*adj.conditions(), EnvironmentalConditions::default());
    }

    #[test]
    fn device_classification() {
        assert_eq!(DeviceClass::from_model("Pixel 8 Pro"), DeviceClass::Flagship);
        assert_eq!(DeviceClass::from_model("Samsung Galaxy A14"), DeviceClass::MidRange);
        assert_eq!(DeviceClass::from_model("Nokia C2 Go"), DeviceClass::Budget);
        assert_eq!(DeviceClass::from_model("unknown"), DeviceClass::Generic);
    }
}
