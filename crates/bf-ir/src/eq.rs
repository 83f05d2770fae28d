//! Three-band EQ with two filter cutoffs.

use serde::{Deserialize, Serialize};

/// Band gains are clamped to +/- this many dB.
pub const EQ_GAIN_RANGE_DB: f32 = 12.0;

const MIN_CUTOFF: f32 = 20.0;
const MAX_CUTOFF: f32 = 20_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqBand {
    Low,
    Mid,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EqSettings {
    /// Low shelf gain (dB)
    pub low: f32,
    /// Mid peak gain (dB)
    pub mid: f32,
    /// High shelf gain (dB)
    pub high: f32,
    /// Low-pass cutoff (Hz)
    pub low_pass_freq: f32,
    /// High-pass cutoff (Hz)
    pub high_pass_freq: f32,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            low: 0.0,
            mid: 0.0,
            high: 0.0,
            low_pass_freq: MAX_CUTOFF,
            high_pass_freq: MIN_CUTOFF,
        }
    }
}

impl EqSettings {
    pub fn set_band(&mut self, band: EqBand, gain_db: f32) {
        let gain_db = if gain_db.is_finite() {
            gain_db.clamp(-EQ_GAIN_RANGE_DB, EQ_GAIN_RANGE_DB)
        } else {
            0.0
        };
        match band {
            EqBand::Low => self.low = gain_db,
            EqBand::Mid => self.mid = gain_db,
            EqBand::High => self.high = gain_db,
        }
    }

    pub fn band(&self, band: EqBand) -> f32 {
        match band {
            EqBand::Low => self.low,
            EqBand::Mid => self.mid,
            EqBand::High => self.high,
        }
    }

    pub fn set_low_pass(&mut self, hz: f32) {
        self.low_pass_freq = clamp_cutoff(hz, MAX_CUTOFF);
    }

    pub fn set_high_pass(&mut self, hz: f32) {
        self.high_pass_freq = clamp_cutoff(hz, MIN_CUTOFF);
    }

    /// True when the settings leave the signal untouched.
    pub fn is_flat(&self) -> bool {
        self.low == 0.0
            && self.mid == 0.0
            && self.high == 0.0
            && self.low_pass_freq >= MAX_CUTOFF
            && self.high_pass_freq <= MIN_CUTOFF
    }
}

fn clamp_cutoff(hz: f32, fallback: f32) -> f32 {
    if hz.is_finite() {
        hz.clamp(MIN_CUTOFF, MAX_CUTOFF)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_flat() {
        assert!(EqSettings::default().is_flat());
    }

    #[test]
    fn band_gain_is_clamped() {
        let mut eq = EqSettings::default();
        eq.set_band(EqBand::Low, 30.0);
        eq.set_band(EqBand::High, -30.0);
        assert_eq!(eq.low, 12.0);
        assert_eq!(eq.high, -12.0);
        assert!(!eq.is_flat());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let eq: EqSettings = serde_json::from_str(r#"{"mid": 3}"#).unwrap();
        assert_eq!(eq.mid, 3.0);
        assert_eq!(eq.low_pass_freq, 20_000.0);
        assert_eq!(eq.high_pass_freq, 20.0);
    }
}
