//! Named end-to-end scenarios with their expected outcome

use vitalguard_core::RawSample;

use super::generators;

/// One scenario: input series plus what the snapshot should show
pub struct Scenario {
    /// Name used in assertion messages
    pub name: &'static str,
    /// Input series
    pub samples: Vec<RawSample>,
    /// Expected heart rate band, `None` for "no reading"
    pub heart_rate: Option<(u32, u32)>,
}

impl Scenario {
    /// 100 samples of 0.5: no beats, baseline vitals
    pub fn flatline() -> Self {
        Self {
            name: "flatline",
            samples: generators::flatline(0.5, 100),
            heart_rate: None,
        }
    }

    /// 1.2 Hz pulse for 10 s: 72 bpm
    pub fn resting_pulse() -> Self {
        Self {
            name: "resting_pulse",
            samples: generators::sine_pulse(1.2, 1.0, 0.0, 300),
            heart_rate: Some((67, 77)),
        }
    }

    /// 1.5 Hz pulse for 10 s: 90 bpm
    pub fn elevated_pulse() -> Self {
        Self {
            name: "elevated_pulse",
            samples: generators::sine_pulse(1.5, 1.0, 0.0, 300),
            heart_rate: Some((85, 95)),
        }
    }

    /// 1.2 Hz pulse riding on a bright exposure level of 120: still 72 bpm
    pub fn bright_resting_pulse() -> Self {
        Self {
            name: "bright_resting_pulse",
            samples: generators::sine_pulse(1.2, 1.0, 120.0, 300),
            heart_rate: Some((67, 77)),
        }
    }

    /// 10 s of 72 bpm at level 120, then 10 s without a pulse: no reading
    pub fn pulse_lost() -> Self {
        Self {
            name: "pulse_lost",
            samples: generators::pulse_then_flat(1.2, 120.0, 300, 300),
            heart_rate: None,
        }
    }

    /// 60 bpm for 10 s, then 120 bpm for 15 s in the same session
    pub fn rate_change() -> Self {
        Self {
            name: "rate_change",
            samples: generators::rate_change(1.0, 2.0, 300, 0.0, 750),
            heart_rate: Some((115, 125)),
        }
    }

    /// Every scenario with a defined expectation
    pub fn all() -> Vec<Self> {
        vec![
            Self::flatline(),
            Self::resting_pulse(),
            Self::elevated_pulse(),
            Self::bright_resting_pulse(),
            Self::pulse_lost(),
            Self::rate_change(),
        ]
    }
}
