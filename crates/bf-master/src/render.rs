//! Offline rendering: run the live engine in its own time domain, as fast
//! as it can compute, and capture the mixed output.

use std::io;

use bf_engine::{Engine, EngineConfig, Frame, TriggerRecord};
use bf_formats::wav;
use bf_ir::Pattern;
use log::info;
use thiserror::Error;

/// Longest render accepted in one call.
pub const MAX_RENDER_SECONDS: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("render duration {0} s exceeds the {MAX_RENDER_SECONDS} s limit")]
    TooLong(f64),
    #[error("bpm must be between 1 and 999, got {0}")]
    InvalidBpm(u32),
    #[error("unsupported channel count {0}, expected 1 or 2")]
    UnsupportedChannels(u16),
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),
    #[error("WAV encoding failed: {0}")]
    Encode(#[from] io::Error),
}

/// Rendered audio plus every trigger fired while producing it.
#[derive(Clone, Debug)]
pub struct RenderOutput {
    pub frames: Vec<Frame>,
    pub triggers: Vec<TriggerRecord>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RenderOutput {
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate as f64
    }

    /// Number of triggers fired on the track with `id`.
    pub fn trigger_count(&self, id: &str) -> usize {
        self.triggers.iter().filter(|t| t.track == id).count()
    }

    pub fn to_wav(&self) -> Result<Vec<u8>, RenderError> {
        Ok(wav::frames_to_wav(&self.frames, self.channels, self.sample_rate)?)
    }
}

fn validate(bpm: u32, duration: f64, config: &EngineConfig) -> Result<(), RenderError> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(RenderError::InvalidDuration(duration));
    }
    if duration > MAX_RENDER_SECONDS {
        return Err(RenderError::TooLong(duration));
    }
    if !(1..=999).contains(&bpm) {
        return Err(RenderError::InvalidBpm(bpm));
    }
    if !(1..=2).contains(&config.channels) {
        return Err(RenderError::UnsupportedChannels(config.channels));
    }
    if config.sample_rate == 0 {
        return Err(RenderError::InvalidSampleRate(config.sample_rate));
    }
    Ok(())
}

/// Render `duration` seconds of `pattern` at `bpm`, looping the pattern
/// exactly as live playback would. Arguments are checked before any work.
pub fn render_pattern(
    pattern: &Pattern,
    bpm: u32,
    duration: f64,
    config: &EngineConfig,
) -> Result<RenderOutput, RenderError> {
    validate(bpm, duration, config)?;

    let mut engine = Engine::new(pattern.clone(), config);
    engine.set_bpm(bpm as f64);
    engine.enable_trigger_log();
    engine.play();

    let frame_count = (duration * config.sample_rate as f64).round() as usize;
    let frames = engine.render_frames(frame_count);
    let triggers = engine.take_trigger_log();
    engine.stop();

    info!(
        "rendered {frame_count} frames ({duration:.2} s, {} triggers) at {} Hz",
        triggers.len(),
        config.sample_rate
    );

    Ok(RenderOutput {
        frames,
        triggers,
        sample_rate: config.sample_rate,
        channels: config.channels,
    })
}

/// Render and encode to WAV bytes in one step.
pub fn render_to_wav(
    pattern: &Pattern,
    bpm: u32,
    duration: f64,
    config: &EngineConfig,
) -> Result<Vec<u8>, RenderError> {
    render_pattern(pattern, bpm, duration, config)?.to_wav()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_ir::Track;

    fn config() -> EngineConfig {
        EngineConfig::default().with_sample_rate(8_000)
    }

    fn kick_only() -> Pattern {
        let mut p = Pattern::default();
        let mut kick = Track::new("k", "Kick");
        for s in [0, 4, 8, 12] {
            kick.toggle_note(s);
        }
        p.tracks.push(kick);
        p
    }

    #[test]
    fn rejects_bad_durations_before_rendering() {
        let p = kick_only();
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                render_pattern(&p, 120, d, &config()),
                Err(RenderError::InvalidDuration(_))
            ));
        }
        assert!(matches!(
            render_pattern(&p, 120, MAX_RENDER_SECONDS + 1.0, &config()),
            Err(RenderError::TooLong(_))
        ));
    }

    #[test]
    fn rejects_bad_bpm_and_channels() {
        let p = kick_only();
        assert!(matches!(render_pattern(&p, 0, 1.0, &config()), Err(RenderError::InvalidBpm(0))));
        let surround = EngineConfig { channels: 6, ..config() };
        assert!(matches!(
            render_pattern(&p, 120, 1.0, &surround),
            Err(RenderError::UnsupportedChannels(6))
        ));
    }

    #[test]
    fn frame_count_matches_duration() {
        let out = render_pattern(&kick_only(), 120, 1.5, &config()).unwrap();
        assert_eq!(out.frames.len(), 12_000);
        assert!((out.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn bpm_argument_overrides_pattern_tempo() {
        // 240 bpm halves the step length, so 1 s covers all 16 steps once.
        let out = render_pattern(&kick_only(), 240, 1.0, &config()).unwrap();
        assert_eq!(out.trigger_count("k"), 4);
        let slow = render_pattern(&kick_only(), 60, 1.0, &config()).unwrap();
        assert_eq!(slow.trigger_count("k"), 1);
    }

    #[test]
    fn mono_wav_has_one_channel() {
        let mono = EngineConfig { channels: 1, ..config() };
        let bytes = render_to_wav(&kick_only(), 120, 0.5, &mono).unwrap();
        assert_eq!(bytes.len(), 44 + 4_000 * 2);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 1);
    }
}
