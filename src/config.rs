//! Optional TOML settings file for the command line.
//!
//! ```toml
//! bpm = 96
//! duration = 8.0
//!
//! [engine]
//! sample_rate = 48000
//! channels = 2
//! master_volume_db = -6.0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bf_engine::EngineConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub engine: EngineConfig,
    /// Tempo override applied to loaded patterns
    pub bpm: Option<u32>,
    /// Default render length in seconds
    pub duration: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_use_defaults() {
        let cfg = FileConfig::parse("bpm = 90\n[engine]\nsample_rate = 48000\n").unwrap();
        assert_eq!(cfg.bpm, Some(90));
        assert_eq!(cfg.engine.sample_rate, 48_000);
        assert_eq!(cfg.engine.channels, 2);
        assert_eq!(cfg.engine.master_volume_db, -6.0);
        assert!(cfg.duration.is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "duration = 3.5\n[engine]\nchannels = 1").unwrap();
        let cfg = FileConfig::load(file.path()).unwrap();
        assert_eq!(cfg.duration, Some(3.5));
        assert_eq!(cfg.engine.channels, 1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("tempo = 120").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::load(&dir.path().join("absent.toml")).is_err());
    }
}
