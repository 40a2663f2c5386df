//! Signal Distributor
//!
//! ## Overview
//!
//! The distributor fans one raw PPG sample out to every registered
//! [`VitalChannel`] and gathers their typed outputs into one snapshot. It is
//! the only owner of per-channel *conditioning*: before a channel sees the
//! sample, the distributor applies that channel's gain, smoothing strength
//! and pass band. Channels influence their conditioning only through the
//! feedback they publish.
//!
//! ## Cycle
//!
//! ```text
//! raw ──┬─► condition(cardiac) ─► CardiacChannel ──► output, feedback
//!       ├─► condition(spo2)    ─► Spo2Channel    ──► output, feedback
//!       ├─► ...
//!       └─► condition(lipids)  ─► LipidsChannel  ──► output, feedback
//!                                                        │
//!            fold accepted feedback into adjustments ◄───┘  (after all channels)
//! ```
//!
//! Feedback is folded in after every channel has run, so a cycle never sees
//! half-updated parameters, and the new conditioning takes effect on the
//! next sample. Each channel's adjustments move at half the requested rate
//! and at most once every `feedback_interval` cycles.
//!
//! ## Conditioning
//!
//! ```text
//! level = level + a_l * (x - level)         a_l from LEVEL_TRACK_HZ (0.1 Hz)
//! x1 = level + gain * (x - level)           gain scales the pulse, not the exposure
//! x2 = x1 - baseline + pedestal             high-pass, only with a band lower edge
//! y  = y + alpha * (x2 - y)                 alpha = min(1 / (strength * noise_reduction),
//!                                                       1 - exp(-2π f_max / fs))
//! ```
//!
//! `pedestal` is the baseline at the moment the band was first applied, so
//! enabling the high-pass removes drift without stepping the channel's
//! input. With default adjustments (gain 1, strength 1, no band)
//! conditioning is the identity.
//!
//! ## Quality Gate
//!
//! `process_sample` only runs the channels when the finger is present and
//! the upstream quality exceeds the threshold. Otherwise the last good
//! output is replayed with `stale = true`, or an empty stale output if
//! nothing was computed yet.

use alloc::boxed::Box;
use core::f32::consts::PI;

use heapless::FnvIndexMap;
use libm::expf;

use crate::channels::{
    BloodPressureChannel, BloodPressureOutput, CardiacChannel, CardiacOutput, ChannelFeedback,
    ChannelOutput, GlucoseChannel, GlucoseOutput, LipidsChannel, LipidsOutput, Spo2Channel,
    Spo2Output, VitalChannel,
};
use crate::constants::buffers::MAX_CHANNELS;
use crate::constants::quality::DEFAULT_QUALITY_THRESHOLD;
use crate::constants::timing::{DEFAULT_SAMPLE_RATE_HZ, LEVEL_TRACK_HZ};
use crate::errors::{ProcessingError, ProcessingResult};
use crate::filter::FilterConfig;
use crate::peaks::DetectorConfig;
use crate::rr::RrIntervalData;
use crate::types::{RawSample, VitalSignType};

/// Distributor tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DistributorConfig {
    /// Upstream quality (0-100) a sample must exceed
    pub quality_threshold: f32,
    /// Sampling rate of the raw stream (Hz)
    pub sample_rate_hz: f32,
    /// Minimum cycles between two applied feedbacks per channel
    pub feedback_interval: u32,
    /// Fraction of a requested change applied at once
    pub feedback_rate: f32,
    /// Gain clamp, low end
    pub min_gain: f32,
    /// Gain clamp, high end
    pub max_gain: f32,
    /// Filter-strength clamp, low end
    pub min_filter_strength: f32,
    /// Filter-strength clamp, high end
    pub max_filter_strength: f32,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            feedback_interval: 10,
            feedback_rate: 0.5,
            min_gain: 0.25,
            max_gain: 4.0,
            min_filter_strength: 0.5,
            max_filter_strength: 3.0,
        }
    }
}

impl DistributorConfig {
    /// Reject impossible settings
    pub fn validate(&self) -> ProcessingResult<()> {
        if !(self.sample_rate_hz > 0.0) {
            return Err(ProcessingError::InvalidConfig { reason: "sample rate must be positive" });
        }
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(ProcessingError::InvalidConfig { reason: "quality threshold outside 0-100" });
        }
        if !(self.min_gain > 0.0 && self.min_gain <= self.max_gain) {
            return Err(ProcessingError::InvalidConfig { reason: "inverted gain limits" });
        }
        if !(self.min_filter_strength > 0.0 && self.min_filter_strength <= self.max_filter_strength) {
            return Err(ProcessingError::InvalidConfig { reason: "inverted filter-strength limits" });
        }
        if !(self.feedback_rate > 0.0 && self.feedback_rate <= 1.0) {
            return Err(ProcessingError::InvalidConfig { reason: "feedback rate outside (0, 1]" });
        }
        Ok(())
    }
}

/// Conditioning state of one channel's input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelAdjustment {
    /// Input gain
    pub gain: f32,
    /// Smoothing strength (1.0 = none)
    pub filter_strength: f32,
    /// Pass band lower edge (Hz)
    pub band_min: Option<f32>,
    /// Pass band upper edge (Hz)
    pub band_max: Option<f32>,
    level: Option<f32>,
    baseline: Option<f32>,
    pedestal: f32,
    smoothed: Option<f32>,
    last_applied_cycle: Option<u64>,
}

impl Default for ChannelAdjustment {
    fn default() -> Self {
        Self {
            gain: 1.0,
            filter_strength: 1.0,
            band_min: None,
            band_max: None,
            level: None,
            baseline: None,
            pedestal: 0.0,
            smoothed: None,
            last_applied_cycle: None,
        }
    }
}

impl ChannelAdjustment {
    /// Slow level the gain is applied around, once a sample was seen
    pub fn level(&self) -> Option<f32> {
        self.level
    }

    /// Smoothing coefficient for the current strength and band
    pub fn alpha(&self, noise_reduction: f32, sample_rate_hz: f32) -> f32 {
        let strength = self.filter_strength * noise_reduction;
        let mut alpha = if strength > 1.0 { 1.0 / strength } else { 1.0 };
        if let Some(f_max) = self.band_max {
            if sample_rate_hz > 0.0 {
                alpha = alpha.min(1.0 - expf(-2.0 * PI * f_max / sample_rate_hz));
            }
        }
        alpha
    }

    /// Condition one raw sample
    pub fn condition(&mut self, raw: f32, noise_reduction: f32, sample_rate_hz: f32) -> f32 {
        if !raw.is_finite() {
            return raw;
        }
        let level = match self.level {
            Some(l) if sample_rate_hz > 0.0 => {
                l + (1.0 - expf(-2.0 * PI * LEVEL_TRACK_HZ / sample_rate_hz)) * (raw - l)
            }
            _ => raw,
        };
        self.level = Some(level);
        let mut x = if self.gain == 1.0 { raw } else { level + self.gain * (raw - level) };

        if let Some(f_min) = self.band_min.filter(|_| sample_rate_hz > 0.0) {
            let a = 1.0 - expf(-2.0 * PI * f_min / sample_rate_hz);
            let base = match self.baseline {
                Some(b) => b + a * (x - b),
                None => {
                    self.pedestal = x;
                    x
                }
            };
            self.baseline = Some(base);
            x = x - base + self.pedestal;
        }

        let alpha = self.alpha(noise_reduction, sample_rate_hz);
        let y = match self.smoothed {
            Some(prev) => prev + alpha * (x - prev),
            None => x,
        };
        self.smoothed = Some(y);
        y
    }
}

/// Latest typed output per channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelResults {
    /// Cardiac output
    pub cardiac: Option<CardiacOutput>,
    /// SpO2 output
    pub spo2: Option<Spo2Output>,
    /// Blood-pressure output
    pub blood_pressure: Option<BloodPressureOutput>,
    /// Glucose output
    pub glucose: Option<GlucoseOutput>,
    /// Lipids output
    pub lipids: Option<LipidsOutput>,
}

impl ChannelResults {
    /// Store an output in its slot
    pub fn insert(&mut self, output: ChannelOutput) {
        match output {
            ChannelOutput::Cardiac(o) => self.cardiac = Some(o),
            ChannelOutput::Spo2(o) => self.spo2 = Some(o),
            ChannelOutput::BloodPressure(o) => self.blood_pressure = Some(o),
            ChannelOutput::Glucose(o) => self.glucose = Some(o),
            ChannelOutput::Lipids(o) => self.lipids = Some(o),
        }
    }

    /// Confidence of one channel, 0 if absent
    pub fn confidence(&self, kind: VitalSignType) -> f32 {
        match kind {
            VitalSignType::Cardiac => self.cardiac.map(|o| o.confidence),
            VitalSignType::Spo2 => self.spo2.map(|o| o.confidence),
            VitalSignType::BloodPressure => self.blood_pressure.map(|o| o.confidence),
            VitalSignType::Glucose => self.glucose.map(|o| o.confidence),
            VitalSignType::Lipids => self.lipids.map(|o| o.confidence),
        }
        .unwrap_or(0.0)
    }
}

/// Per-channel diagnostics for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelDiagnostics {
    /// Channel
    pub channel: VitalSignType,
    /// Gain used this cycle
    pub gain: f32,
    /// Filter strength used this cycle
    pub filter_strength: f32,
    /// Pass band used this cycle
    pub band: (Option<f32>, Option<f32>),
    /// Conditioned input the channel received
    pub input: f32,
    /// Channel confidence after processing
    pub confidence: f32,
    /// Whether this cycle's feedback changed the adjustments
    pub feedback_applied: bool,
}

/// Diagnostics for one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributorDiagnostics {
    /// Cycle counter
    pub cycle: u64,
    /// One entry per registered channel
    pub channels: heapless::Vec<ChannelDiagnostics, MAX_CHANNELS>,
}

/// Aggregated output of one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributorOutput {
    /// Typed per-channel outputs
    pub results: ChannelResults,
    /// Conditioning diagnostics
    pub diagnostics: DistributorDiagnostics,
    /// Replayed after a failed quality gate
    pub stale: bool,
}

struct ChannelSlot {
    channel: Box<dyn VitalChannel>,
    adjustment: ChannelAdjustment,
}

/// Fan-out engine owning the channel registry
pub struct SignalDistributor {
    config: DistributorConfig,
    slots: FnvIndexMap<VitalSignType, ChannelSlot, MAX_CHANNELS>,
    noise_reduction: f32,
    cycle: u64,
    last_good: Option<DistributorOutput>,
}

impl core::fmt::Debug for SignalDistributor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignalDistributor")
            .field("channels", &self.slots.len())
            .field("cycle", &self.cycle)
            .field("noise_reduction", &self.noise_reduction)
            .finish()
    }
}

impl SignalDistributor {
    /// Empty distributor
    pub fn new(config: DistributorConfig) -> Self {
        Self {
            config,
            slots: FnvIndexMap::new(),
            noise_reduction: 1.0,
            cycle: 0,
            last_good: None,
        }
    }

    /// Distributor with the five standard channels
    pub fn with_default_channels(config: DistributorConfig, detector: DetectorConfig) -> ProcessingResult<Self> {
        Self::with_channel_filters(config, detector, FilterConfig::default())
    }

    /// Five standard channels, each smoothing its input with `filter`
    pub fn with_channel_filters(
        config: DistributorConfig,
        detector: DetectorConfig,
        filter: FilterConfig,
    ) -> ProcessingResult<Self> {
        let mut distributor = Self::new(config);
        distributor.register_channel(Box::new(CardiacChannel::with_filter(detector, filter)))?;
        distributor.register_channel(Box::new(Spo2Channel::with_filter(filter)))?;
        distributor.register_channel(Box::new(BloodPressureChannel::with_filter(filter)))?;
        distributor.register_channel(Box::new(GlucoseChannel::with_filter(filter)))?;
        distributor.register_channel(Box::new(LipidsChannel::with_filter(filter)))?;
        Ok(distributor)
    }

    /// Add a channel, replacing any existing one of the same kind
    pub fn register_channel(&mut self, channel: Box<dyn VitalChannel>) -> ProcessingResult<()> {
        let kind = channel.channel_type();
        let slot = ChannelSlot {
            channel,
            adjustment: ChannelAdjustment::default(),
        };
        match self.slots.insert(kind, slot) {
            Ok(Some(_)) => {
                log_info!("replaced {} channel", kind);
                Ok(())
            }
            Ok(None) => {
                log_info!("registered {} channel ({} total)", kind, self.slots.len());
                Ok(())
            }
            Err(_) => Err(ProcessingError::RegistryFull { capacity: MAX_CHANNELS }),
        }
    }

    /// Run one raw value through every channel, ungated
    pub fn process_signal(&mut self, raw: f32) -> DistributorOutput {
        self.cycle += 1;
        let fs = self.config.sample_rate_hz;
        let nr = self.noise_reduction;

        let mut results = ChannelResults::default();
        let mut diagnostics = DistributorDiagnostics {
            cycle: self.cycle,
            channels: heapless::Vec::new(),
        };
        let mut feedback: heapless::Vec<ChannelFeedback, MAX_CHANNELS> = heapless::Vec::new();

        for (kind, slot) in self.slots.iter_mut() {
            let adj = slot.adjustment;
            let input = slot.adjustment.condition(raw, nr, fs);
            let output = slot.channel.process_signal(input);
            results.insert(output);

            if let Some(fb) = slot.channel.feedback() {
                let _ = feedback.push(fb);
            }
            let _ = diagnostics.channels.push(ChannelDiagnostics {
                channel: *kind,
                gain: adj.gain,
                filter_strength: adj.filter_strength,
                band: (adj.band_min, adj.band_max),
                input,
                confidence: output.confidence(),
                feedback_applied: false,
            });
        }

        // Adjustments change only between cycles
        for fb in &feedback {
            if self.apply_feedback(fb) {
                if let Some(d) = diagnostics.channels.iter_mut().find(|d| d.channel == fb.channel) {
                    d.feedback_applied = true;
                }
            }
        }

        let output = DistributorOutput {
            results,
            diagnostics,
            stale: false,
        };
        self.last_good = Some(output.clone());
        output
    }

    /// Gate on upstream quality, then process or replay
    pub fn process_sample(&mut self, sample: &RawSample) -> DistributorOutput {
        if sample.passes_gate(self.config.quality_threshold) {
            return self.process_signal(sample.value);
        }
        log_debug!(
            "quality gate rejected sample (quality {}, finger {})",
            sample.quality,
            sample.finger_detected
        );
        match &self.last_good {
            Some(last) => DistributorOutput {
                stale: true,
                ..last.clone()
            },
            None => DistributorOutput {
                stale: true,
                ..DistributorOutput::default()
            },
        }
    }

    /// Fold one feedback into its channel's adjustments
    ///
    /// Returns whether anything changed. Rate-limited per channel.
    pub fn apply_feedback(&mut self, feedback: &ChannelFeedback) -> bool {
        let cfg = self.config;
        let cycle = self.cycle;
        let Some(slot) = self.slots.get_mut(&feedback.channel) else {
            return false;
        };
        let s = &feedback.suggested;
        if s.is_empty() {
            return false;
        }
        let adj = &mut slot.adjustment;
        if let Some(last) = adj.last_applied_cycle {
            if cycle.saturating_sub(last) < u64::from(cfg.feedback_interval) {
                return false;
            }
        }

        let step = |current: f32, factor: f32| current * (1.0 + cfg.feedback_rate * (factor - 1.0));
        if let Some(f) = s.amplification_factor.filter(|f| f.is_finite() && *f > 0.0) {
            adj.gain = step(adj.gain, f).clamp(cfg.min_gain, cfg.max_gain);
        }
        if let Some(f) = s.filter_strength.filter(|f| f.is_finite() && *f > 0.0) {
            adj.filter_strength = step(adj.filter_strength, f)
                .clamp(cfg.min_filter_strength, cfg.max_filter_strength);
        }

        let nyquist = cfg.sample_rate_hz / 2.0;
        let lo = s.frequency_range_min.filter(|f| f.is_finite() && *f > 0.0);
        let hi = s.frequency_range_max.filter(|f| f.is_finite() && *f > 0.0 && *f < nyquist);
        match (lo, hi) {
            (Some(lo), Some(hi)) if lo < hi => {
                adj.band_min = Some(lo);
                adj.band_max = Some(hi);
            }
            (Some(lo), None) => adj.band_min = Some(lo),
            (None, Some(hi)) => adj.band_max = Some(hi),
            _ => {}
        }

        adj.last_applied_cycle = Some(cycle);
        log_debug!(
            "{} feedback applied: gain {} strength {}",
            feedback.channel,
            adj.gain,
            adj.filter_strength
        );
        true
    }

    /// Forward externally tracked RR intervals to every channel
    pub fn ingest_rr_intervals(&mut self, data: &RrIntervalData) {
        for (_, slot) in self.slots.iter_mut() {
            slot.channel.ingest_rr_intervals(data);
        }
    }

    /// Environment-driven smoothing multiplier, clamped to `[1, 3]`
    pub fn set_noise_reduction(&mut self, factor: f32) {
        self.noise_reduction = if factor.is_finite() { factor.clamp(1.0, 3.0) } else { 1.0 };
    }

    /// Current noise-reduction multiplier
    pub fn noise_reduction(&self) -> f32 {
        self.noise_reduction
    }

    /// Adjustments of one channel
    pub fn adjustment(&self, kind: VitalSignType) -> Option<&ChannelAdjustment> {
        self.slots.get(&kind).map(|s| &s.adjustment)
    }

    /// Registered channel of one kind
    pub fn channel(&self, kind: VitalSignType) -> Option<&dyn VitalChannel> {
        self.slots.get(&kind).map(|s| s.channel.as_ref())
    }

    /// Number of registered channels
    pub fn channel_count(&self) -> usize {
        self.slots.len()
    }

    /// Cycles processed since the last reset
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Last output computed from a gated-in sample
    pub fn last_good(&self) -> Option<&DistributorOutput> {
        self.last_good.as_ref()
    }

    /// Configuration
    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    /// Reset every channel and all conditioning state
    pub fn reset(&mut self) {
        for (_, slot) in self.slots.iter_mut() {
            slot.channel.reset();
            slot.adjustment = ChannelAdjustment::default();
        }
        self.cycle = 0;
        self.last_good = None;
        self.noise_reduction = 1.0;
    }
}
