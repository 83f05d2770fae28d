//! The pattern: an ordered set of tracks over a fixed step grid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instrument::color_for_index;
use crate::track::Track;

pub const DEFAULT_BPM: u32 = 120;
/// Step count of generated and short patterns.
pub const GENERATOR_STEPS: u16 = 16;
/// Step count of the full sequencer grid (four bars).
pub const SEQUENCER_STEPS: u16 = 64;

const NEW_TRACK_VOLUME: f32 = 0.7;

fn default_bpm() -> u32 {
    DEFAULT_BPM
}

fn default_steps() -> u16 {
    GENERATOR_STEPS
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("no track with id {0:?}")]
    UnknownTrack(String),
    #[error("step {step} is outside a {steps}-step pattern")]
    StepOutOfRange { step: u16, steps: u16 },
    #[error("track {track:?} has no effect {effect:?}")]
    UnknownEffect { track: String, effect: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default = "default_bpm")]
    pub bpm: u32,
    #[serde(default = "default_steps")]
    pub steps: u16,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(DEFAULT_BPM, GENERATOR_STEPS)
    }
}

impl Pattern {
    pub fn new(bpm: u32, steps: u16) -> Self {
        Self { tracks: Vec::new(), bpm, steps }
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: &str) -> Result<&mut Track, EditError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| EditError::UnknownTrack(id.to_string()))
    }

    fn check_step(&self, step: u16) -> Result<(), EditError> {
        if step >= self.steps {
            return Err(EditError::StepOutOfRange { step, steps: self.steps });
        }
        Ok(())
    }

    /// Toggle a note. Returns whether a note is present afterwards.
    pub fn toggle_note(&mut self, track: &str, step: u16) -> Result<bool, EditError> {
        self.check_step(step)?;
        Ok(self.track_mut(track)?.toggle_note(step))
    }

    pub fn set_velocity(&mut self, track: &str, step: u16, velocity: f32) -> Result<(), EditError> {
        self.check_step(step)?;
        self.track_mut(track)?.set_velocity(step, velocity);
        Ok(())
    }

    pub fn clear_notes(&mut self, track: &str) -> Result<(), EditError> {
        self.track_mut(track)?.notes.clear();
        Ok(())
    }

    /// Append an empty track for `instrument` and return its id.
    pub fn add_track(&mut self, instrument: impl Into<String>) -> String {
        let mut n = self.tracks.len() + 1;
        while self.track(&format!("track-{n}")).is_some() {
            n += 1;
        }
        let id = format!("track-{n}");
        let mut track = Track::new(id.clone(), instrument);
        track.volume = NEW_TRACK_VOLUME;
        track.color = Some(color_for_index(self.tracks.len()).to_string());
        self.tracks.push(track);
        id
    }

    pub fn remove_track(&mut self, id: &str) -> Result<Track, EditError> {
        let idx = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| EditError::UnknownTrack(id.to_string()))?;
        Ok(self.tracks.remove(idx))
    }

    /// Whether any track is soloed.
    pub fn any_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }

    /// Total number of note events across all tracks.
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tracks() -> Pattern {
        let mut p = Pattern::default();
        p.add_track("Kick");
        p.add_track("Snare");
        p
    }

    #[test]
    fn add_track_assigns_ids_and_defaults() {
        let p = two_tracks();
        assert_eq!(p.tracks[0].id, "track-1");
        assert_eq!(p.tracks[1].id, "track-2");
        assert_eq!(p.tracks[1].volume, 0.7);
        assert_eq!(p.tracks[1].color.as_deref(), Some("hsl(160, 70%, 55%)"));
    }

    #[test]
    fn add_track_after_removal_avoids_collision() {
        let mut p = two_tracks();
        p.remove_track("track-1").unwrap();
        let id = p.add_track("Clap");
        assert_ne!(id, "track-2");
    }

    #[test]
    fn toggle_rejects_bad_track_and_step() {
        let mut p = two_tracks();
        assert_eq!(
            p.toggle_note("missing", 0),
            Err(EditError::UnknownTrack("missing".into()))
        );
        assert_eq!(
            p.toggle_note("track-1", 16),
            Err(EditError::StepOutOfRange { step: 16, steps: 16 })
        );
        assert_eq!(p.toggle_note("track-1", 15), Ok(true));
    }

    #[test]
    fn json_defaults_bpm_and_steps() {
        let p: Pattern = serde_json::from_str(r#"{"tracks":[]}"#).unwrap();
        assert_eq!(p.bpm, 120);
        assert_eq!(p.steps, 16);
    }

    #[test]
    fn serialization_is_lossless() {
        let mut p = two_tracks();
        p.set_velocity("track-1", 3, 0.42).unwrap();
        p.tracks[1].add_effect("reverb");
        p.tracks[1].set_pan(-0.25);
        let json = serde_json::to_string(&p).unwrap();
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
