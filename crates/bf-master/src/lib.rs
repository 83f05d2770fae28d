//! Headless controller for beatforge.
//!
//! Owns a pattern, runs live playback on a dedicated audio thread, and
//! renders or exports offline. The CLI and any other front end share it.

mod playback;
mod render;

use bf_ir::{Effect, EffectKind, Track};
use log::info;

use crate::playback::{Command, PlaybackHandle};

// Re-export common types so callers don't need bf-ir/bf-engine directly.
pub use bf_engine::{EngineConfig, Frame, TransportState, TriggerRecord};
pub use bf_formats::FormatError;
pub use bf_ir::{EditError, EqBand, Pattern, PlaybackPosition};
pub use playback::PlaybackError;
pub use render::{render_pattern, render_to_wav, RenderError, RenderOutput, MAX_RENDER_SECONDS};

/// Headless controller: owns a pattern and manages playback.
///
/// Every edit goes to the owned pattern first and is then forwarded to the
/// audio thread, where it takes effect at the next tick boundary.
pub struct Controller {
    pattern: Pattern,
    config: EngineConfig,
    state: TransportState,
    playback: Option<PlaybackHandle>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            pattern: Pattern::default(),
            config,
            state: TransportState::Stopped,
            playback: None,
        }
    }

    /// Stop playback and release the audio device.
    pub fn dispose(mut self) {
        self.stop();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Pattern management ---

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Replace the whole pattern, e.g. after generation or a project load.
    pub fn load_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
        self.send(Command::SetBpm(self.pattern.bpm as f64));
        self.publish();
    }

    /// Import exchange JSON, bare or enveloped.
    pub fn load_json(&mut self, data: &[u8]) -> Result<(), FormatError> {
        let pattern = bf_formats::parse_pattern(data)?;
        self.load_pattern(pattern);
        Ok(())
    }

    pub fn export_pattern(&self) -> Result<Vec<u8>, FormatError> {
        bf_formats::export_pattern(&self.pattern)
    }

    fn send(&self, command: Command) {
        if let Some(pb) = &self.playback {
            pb.send(command);
        }
    }

    fn publish(&self) {
        if self.playback.is_some() {
            self.send(Command::UpdatePattern(self.pattern.clone()));
        }
    }

    fn edit<T>(&mut self, f: impl FnOnce(&mut Pattern) -> Result<T, EditError>) -> Result<T, EditError> {
        let out = f(&mut self.pattern)?;
        self.publish();
        Ok(out)
    }

    fn edit_track<T>(&mut self, id: &str, f: impl FnOnce(&mut Track) -> T) -> Result<T, EditError> {
        self.edit(|p| p.track_mut(id).map(f))
    }

    // --- Notes ---

    pub fn toggle_note(&mut self, track: &str, step: u16) -> Result<bool, EditError> {
        self.edit(|p| p.toggle_note(track, step))
    }

    pub fn set_velocity(&mut self, track: &str, step: u16, velocity: f32) -> Result<(), EditError> {
        self.edit(|p| p.set_velocity(track, step, velocity))
    }

    pub fn clear_notes(&mut self, track: &str) -> Result<(), EditError> {
        self.edit(|p| p.clear_notes(track))
    }

    // --- Tracks ---

    pub fn add_track(&mut self, instrument: &str) -> String {
        let id = self.pattern.add_track(instrument);
        self.publish();
        id
    }

    pub fn remove_track(&mut self, id: &str) -> Result<Track, EditError> {
        self.edit(|p| p.remove_track(id))
    }

    pub fn set_volume(&mut self, track: &str, volume: f32) -> Result<(), EditError> {
        self.edit_track(track, |t| t.set_volume(volume))
    }

    pub fn set_pan(&mut self, track: &str, pan: f32) -> Result<(), EditError> {
        self.edit_track(track, |t| t.set_pan(pan))
    }

    pub fn set_mute(&mut self, track: &str, mute: bool) -> Result<(), EditError> {
        self.edit_track(track, |t| t.set_mute(mute))
    }

    pub fn set_solo(&mut self, track: &str, solo: bool) -> Result<(), EditError> {
        self.edit_track(track, |t| t.set_solo(solo))
    }

    pub fn set_eq_band(&mut self, track: &str, band: EqBand, gain_db: f32) -> Result<(), EditError> {
        self.edit_track(track, |t| t.set_eq_band(band, gain_db))
    }

    pub fn set_low_pass(&mut self, track: &str, hz: f32) -> Result<(), EditError> {
        self.edit_track(track, |t| t.eq.set_low_pass(hz))
    }

    pub fn set_high_pass(&mut self, track: &str, hz: f32) -> Result<(), EditError> {
        self.edit_track(track, |t| t.eq.set_high_pass(hz))
    }

    // --- Effects ---

    pub fn add_effect(&mut self, track: &str, kind: impl Into<EffectKind>) -> Result<String, EditError> {
        self.edit_track(track, |t| t.add_effect(kind))
    }

    pub fn toggle_effect(&mut self, track: &str, effect: &str) -> Result<bool, EditError> {
        self.edit(|p| p.track_mut(track)?.toggle_effect(effect).ok_or_else(|| unknown_effect(track, effect)))
    }

    pub fn remove_effect(&mut self, track: &str, effect: &str) -> Result<Effect, EditError> {
        self.edit(|p| p.track_mut(track)?.remove_effect(effect).ok_or_else(|| unknown_effect(track, effect)))
    }

    pub fn set_effect_param(
        &mut self,
        track: &str,
        effect: &str,
        key: &str,
        value: f32,
    ) -> Result<(), EditError> {
        self.edit(|p| {
            p.track_mut(track)?
                .effect_mut(effect)
                .map(|e| e.set_param(key, value))
                .ok_or_else(|| unknown_effect(track, effect))
        })
    }

    // --- Tempo and master ---

    /// Change tempo without moving the playhead. Clamped to 1..=999.
    pub fn set_bpm(&mut self, bpm: u32) {
        self.pattern.bpm = bpm.clamp(1, 999);
        self.send(Command::SetBpm(self.pattern.bpm as f64));
        self.publish();
    }

    /// Set the master level from a linear gain.
    pub fn set_master_volume(&mut self, gain: f32) {
        self.config.master_volume_db = bf_ir::volume_to_db(gain);
        self.send(Command::SetMasterVolume(gain));
    }

    // --- Real-time playback ---

    /// Start from the top when stopped, resume when paused.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let alive = self.playback.as_ref().is_some_and(PlaybackHandle::is_alive);
        match self.state {
            TransportState::Playing if alive => Ok(()),
            TransportState::Paused if alive => {
                self.send(Command::Play);
                self.state = TransportState::Playing;
                Ok(())
            }
            _ => {
                self.stop();
                let handle = PlaybackHandle::spawn(self.pattern.clone(), self.config.clone())?;
                self.playback = Some(handle);
                self.state = TransportState::Playing;
                info!("playing {} tracks at {} bpm", self.pattern.tracks.len(), self.pattern.bpm);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.send(Command::Pause);
            self.state = TransportState::Paused;
        }
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        match self.state {
            TransportState::Paused => self.play(),
            _ => Ok(()),
        }
    }

    /// Silence everything and rewind. Returns once the audio thread is gone.
    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.shutdown();
        }
        self.state = TransportState::Stopped;
    }

    /// Move the playhead. Ignored while stopped.
    pub fn seek(&mut self, steps: f64) {
        if self.state != TransportState::Stopped {
            self.send(Command::Seek(steps));
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
            && self.playback.as_ref().is_some_and(PlaybackHandle::is_alive)
    }

    /// Current playhead, wrapped at the pattern's step count.
    pub fn position(&self) -> PlaybackPosition {
        let absolute = match (&self.playback, self.state) {
            (Some(pb), TransportState::Playing | TransportState::Paused) => pb.position(),
            _ => 0.0,
        };
        PlaybackPosition::new(absolute, self.pattern.steps)
    }

    // --- Offline rendering ---

    /// Render `duration` seconds at the pattern's tempo. Live playback is
    /// stopped first so the two never run side by side.
    pub fn render(&mut self, duration: f64) -> Result<RenderOutput, RenderError> {
        if self.playback.is_some() {
            info!("stopping live playback for offline render");
            self.stop();
        }
        render_pattern(&self.pattern, self.pattern.bpm, duration, &self.config)
    }

    pub fn render_to_wav(&mut self, duration: f64) -> Result<Vec<u8>, RenderError> {
        self.render(duration)?.to_wav()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn unknown_effect(track: &str, effect: &str) -> EditError {
    EditError::UnknownEffect {
        track: track.to_string(),
        effect: effect.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        let mut c = Controller::with_config(EngineConfig::default().with_sample_rate(8_000));
        c.load_pattern(bf_formats::generator::fallback_pattern());
        c
    }

    #[test]
    fn edits_go_to_the_owned_pattern() {
        let mut c = controller();
        assert!(c.toggle_note("track-1", 2).unwrap());
        c.set_velocity("track-1", 2, 0.5).unwrap();
        assert_eq!(c.pattern().tracks[0].notes.get(2).unwrap().velocity, 0.5);
        c.set_mute("track-2", true).unwrap();
        assert!(c.pattern().tracks[1].mute);
        assert!(matches!(c.set_pan("nope", 0.0), Err(EditError::UnknownTrack(_))));
    }

    #[test]
    fn effect_editing_round_trip() {
        let mut c = controller();
        let id = c.add_effect("track-1", "reverb").unwrap();
        c.set_effect_param("track-1", &id, "decay", 2.5).unwrap();
        assert_eq!(c.pattern().tracks[0].effects[0].param("decay", 0.0), 2.5);
        assert!(!c.toggle_effect("track-1", &id).unwrap());
        c.remove_effect("track-1", &id).unwrap();
        assert!(matches!(
            c.toggle_effect("track-1", &id),
            Err(EditError::UnknownEffect { .. })
        ));
    }

    #[test]
    fn track_collection_editing() {
        let mut c = controller();
        let id = c.add_track("Clap");
        assert_eq!(c.pattern().tracks.len(), 4);
        assert_eq!(c.pattern().track(&id).unwrap().volume, 0.7);
        c.remove_track(&id).unwrap();
        c.clear_notes("track-3").unwrap();
        assert!(c.pattern().tracks[2].notes.is_empty());
    }

    #[test]
    fn stopped_controller_ignores_seek_and_reports_zero() {
        let mut c = controller();
        c.seek(5.0);
        c.pause();
        assert_eq!(c.state(), TransportState::Stopped);
        assert_eq!(c.position().step, 0);
        assert!(!c.is_playing());
    }

    #[test]
    fn bpm_is_clamped_and_stored() {
        let mut c = controller();
        c.set_bpm(0);
        assert_eq!(c.pattern().bpm, 1);
        c.set_bpm(140);
        assert_eq!(c.pattern().bpm, 140);
    }

    #[test]
    fn render_uses_pattern_tempo() {
        let mut c = controller();
        let out = c.render(2.0).unwrap();
        assert_eq!(out.trigger_count("track-1"), 4);
        assert_eq!(out.trigger_count("track-2"), 2);
        assert_eq!(out.frames.len(), 16_000);
    }

    #[test]
    fn master_volume_updates_render_config() {
        let mut c = controller();
        c.set_master_volume(0.0);
        assert!((c.config().master_volume_db + 40.0).abs() < 1e-4);
    }

    #[test]
    fn export_and_reload_is_lossless() {
        let mut c = controller();
        c.toggle_note("track-2", 9).unwrap();
        let bytes = c.export_pattern().unwrap();
        let before = c.pattern().clone();
        c.load_json(&bytes).unwrap();
        assert_eq!(c.pattern(), &before);
    }
}
