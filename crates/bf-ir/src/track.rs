//! A single instrument lane with its mixer settings.

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, EffectKind};
use crate::eq::{EqBand, EqSettings};
use crate::mixer::volume_to_db;
use crate::note::Notes;

fn default_volume() -> f32 {
    0.8
}

/// One track of a pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    /// Free-form instrument label; resolved to a synthesis recipe by substring
    pub instrument: String,
    #[serde(default)]
    pub notes: Notes,
    /// Linear fader, [0, 1]
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Stereo position, [-1, 1]
    #[serde(default)]
    pub pan: f32,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub solo: bool,
    /// Display-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub eq: EqSettings,
}

impl Track {
    pub fn new(id: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instrument: instrument.into(),
            notes: Notes::new(),
            volume: default_volume(),
            pan: 0.0,
            mute: false,
            solo: false,
            color: None,
            effects: Vec::new(),
            eq: EqSettings::default(),
        }
    }

    /// Toggle the note at `step`. Returns whether a note is present afterwards.
    pub fn toggle_note(&mut self, step: u16) -> bool {
        self.notes.toggle(step)
    }

    pub fn set_velocity(&mut self, step: u16, velocity: f32) {
        self.notes.set_velocity(step, velocity);
    }

    // --- Mixer ---

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.mute = mute;
    }

    pub fn set_solo(&mut self, solo: bool) {
        self.solo = solo;
    }

    pub fn set_eq_band(&mut self, band: EqBand, gain_db: f32) {
        self.eq.set_band(band, gain_db);
    }

    /// Fader level in dB, floored so a zero fader stays finite.
    pub fn volume_db(&self) -> f32 {
        volume_to_db(self.volume)
    }

    // --- Effects ---

    /// Append an enabled effect with default parameters and return its id.
    pub fn add_effect(&mut self, kind: impl Into<EffectKind>) -> String {
        let kind = kind.into();
        let base = format!("{}-{}", self.id, kind);
        let mut id = base.clone();
        let mut n = 2;
        while self.effect(&id).is_some() {
            id = format!("{base}-{n}");
            n += 1;
        }
        self.effects.push(Effect::new(id.clone(), kind));
        id
    }

    pub fn effect(&self, id: &str) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    pub fn effect_mut(&mut self, id: &str) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.id == id)
    }

    /// Flip an effect's `enabled` flag. Returns the new state.
    pub fn toggle_effect(&mut self, id: &str) -> Option<bool> {
        let effect = self.effect_mut(id)?;
        effect.enabled = !effect.enabled;
        Some(effect.enabled)
    }

    pub fn remove_effect(&mut self, id: &str) -> Option<Effect> {
        let idx = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixer_setters_clamp() {
        let mut t = Track::new("t", "Kick");
        t.set_volume(1.7);
        t.set_pan(-3.0);
        assert_eq!(t.volume, 1.0);
        assert_eq!(t.pan, -1.0);
        t.set_volume(f32::NAN);
        assert_eq!(t.volume, 0.0);
        assert!(t.volume_db().is_finite());
    }

    #[test]
    fn effect_ids_are_unique() {
        let mut t = Track::new("track-1", "Snare");
        let a = t.add_effect(EffectKind::Reverb);
        let b = t.add_effect(EffectKind::Reverb);
        assert_eq!(a, "track-1-reverb");
        assert_ne!(a, b);
        assert_eq!(t.effects.len(), 2);
    }

    #[test]
    fn toggle_and_remove_effect() {
        let mut t = Track::new("t", "Snare");
        let id = t.add_effect(EffectKind::Delay);
        assert_eq!(t.toggle_effect(&id), Some(false));
        assert_eq!(t.toggle_effect(&id), Some(true));
        assert_eq!(t.toggle_effect("nope"), None);
        assert!(t.remove_effect(&id).is_some());
        assert!(t.effects.is_empty());
    }

    #[test]
    fn minimal_json_gets_defaults() {
        let t: Track = serde_json::from_str(r#"{"id":"a","instrument":"Kick"}"#).unwrap();
        assert_eq!(t.volume, 0.8);
        assert!(t.notes.is_empty());
        assert!(t.eq.is_flat());
    }
}
