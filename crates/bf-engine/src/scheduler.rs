//! Per-tick trigger resolution.
//!
//! Decides which tracks are audible and which of their notes fire on a
//! given tick. Pure functions over a [`Pattern`] snapshot.

use bf_ir::{Pattern, Track};

/// Triggered velocities are floored to this.
pub const MIN_TRIGGER_VELOCITY: f32 = 0.1;

/// A note due to fire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trigger {
    /// Index into `pattern.tracks`
    pub track: usize,
    pub step: u16,
    /// Velocity after clamping to [`MIN_TRIGGER_VELOCITY`], 1.0
    pub velocity: f32,
    /// Swing delay as a fraction of a tick
    pub offset: f32,
}

/// A track is audible when it is not muted and either nothing is soloed
/// or it is soloed itself.
pub fn is_audible(track: &Track, any_solo: bool) -> bool {
    !track.mute && (!any_solo || track.solo)
}

/// Indices of the audible tracks.
pub fn audible_tracks(pattern: &Pattern) -> Vec<usize> {
    let any_solo = pattern.any_solo();
    pattern
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| is_audible(t, any_solo))
        .map(|(i, _)| i)
        .collect()
}

/// Velocity to trigger with, or `None` if the stored velocity never triggers.
pub fn trigger_velocity(stored: f32) -> Option<f32> {
    if stored > 0.0 {
        Some(stored.clamp(MIN_TRIGGER_VELOCITY, 1.0))
    } else {
        None
    }
}

/// Notes that fire on absolute `tick`, in track order.
pub fn triggers_at_tick(pattern: &Pattern, tick: u64) -> Vec<Trigger> {
    if pattern.steps == 0 {
        return Vec::new();
    }
    let step = (tick % pattern.steps as u64) as u16;
    let any_solo = pattern.any_solo();

    let mut triggers = Vec::new();
    for (index, track) in pattern.tracks.iter().enumerate() {
        if !is_audible(track, any_solo) {
            continue;
        }
        let Some(note) = track.notes.get(step) else {
            continue;
        };
        if let Some(velocity) = trigger_velocity(note.velocity) {
            triggers.push(Trigger { track: index, step, velocity, offset: note.offset });
        }
    }
    triggers
}
