//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Rendering parameters shared by live and offline playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz (offline render; live playback uses the device rate)
    pub sample_rate: u32,
    /// Output channel count, 1 or 2
    pub channels: u16,
    /// Master bus level in dB
    pub master_volume_db: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            master_volume_db: -6.0,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}
