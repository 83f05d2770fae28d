//! Beat generation support: request parameters, response normalization,
//! caller-side padding, the built-in fallback pattern, and swing.
//!
//! The generation service itself is external; this module only shapes
//! what goes to it and what comes back.

use std::fmt;

use bf_ir::{color_for_index, NoteEvent, Pattern, Track, GENERATOR_STEPS, INSTRUMENTS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::exchange::{pattern_from_value, split_envelope};
use crate::FormatError;

const MIN_TRACKS: usize = 3;
const MAX_TRACKS: usize = 8;
const PADDED_VOLUME: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    HipHop,
    Trap,
    House,
    Techno,
    Dnb,
    Custom,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Genre::HipHop => "hip-hop",
            Genre::Trap => "trap",
            Genre::House => "house",
            Genre::Techno => "techno",
            Genre::Dnb => "dnb",
            Genre::Custom => "custom",
        })
    }
}

/// What the caller asks the generation service for. Every knob is in [0, 1].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub genre: Genre,
    pub complexity: f32,
    pub swing: f32,
    pub density: f32,
    pub variation: f32,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            genre: Genre::HipHop,
            complexity: 0.5,
            swing: 0.3,
            density: 0.5,
            variation: 0.5,
        }
    }
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), FormatError> {
        for (name, value) in [
            ("complexity", self.complexity),
            ("swing", self.swing),
            ("density", self.density),
            ("variation", self.variation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FormatError::InvalidParams(format!("{name} = {value} is outside [0, 1]")));
            }
        }
        Ok(())
    }
}

/// A generated pattern plus whatever metadata the service attached.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedPattern {
    pub pattern: Pattern,
    pub metadata: Option<Value>,
}

/// Parse a generation response, bare or enveloped.
pub fn parse_response(data: &[u8]) -> Result<GeneratedPattern, FormatError> {
    let value: Value = serde_json::from_slice(data)?;
    let (pattern, metadata) = split_envelope(value)?;
    Ok(GeneratedPattern {
        pattern: pattern_from_value(pattern)?,
        metadata,
    })
}

/// Track count a pattern of `complexity` is padded to.
pub fn track_count(complexity: f32) -> usize {
    let c = if complexity.is_finite() { complexity.clamp(0.0, 1.0) } else { 0.0 };
    ((3.0 + c * 5.0).round() as usize).clamp(MIN_TRACKS, MAX_TRACKS)
}

/// Append empty tracks from the canonical instrument list until the
/// pattern has [`track_count`] tracks.
pub fn pad_tracks(pattern: &mut Pattern, complexity: f32) {
    let target = track_count(complexity);
    while pattern.tracks.len() < target && pattern.tracks.len() < INSTRUMENTS.len() {
        let idx = pattern.tracks.len();
        let mut n = idx + 1;
        while pattern.track(&format!("track-{n}")).is_some() {
            n += 1;
        }
        let mut track = Track::new(format!("track-{n}"), INSTRUMENTS[idx]);
        track.volume = PADDED_VOLUME;
        track.color = Some(color_for_index(idx).to_string());
        pattern.tracks.push(track);
    }
}

fn fallback_track(idx: usize, volume: f32, notes: impl IntoIterator<Item = (u16, f32)>) -> Track {
    let mut track = Track::new(format!("track-{}", idx + 1), INSTRUMENTS[idx]);
    track.volume = volume;
    track.color = Some(color_for_index(idx).to_string());
    track.notes = notes.into_iter().map(|(s, v)| NoteEvent::new(s, v)).collect();
    track
}

/// The built-in pattern used when generation fails: four-on-the-floor kick,
/// backbeat snare, sixteenth hats with accented downbeats.
pub fn fallback_pattern() -> Pattern {
    let hat_index = 2;
    let mut pattern = Pattern::new(bf_ir::DEFAULT_BPM, GENERATOR_STEPS);
    pattern.tracks = vec![
        fallback_track(0, 0.8, [(0, 1.0), (4, 0.9), (8, 1.0), (12, 0.9)]),
        fallback_track(1, 0.7, [(4, 1.0), (12, 0.95)]),
        fallback_track(
            hat_index,
            0.6,
            (0..GENERATOR_STEPS).map(|s| (s, if s % 2 == 0 { 0.8 } else { 0.4 })),
        ),
    ];
    pattern
}

/// Delay every note on an odd (off-beat) sixteenth by `swing / 3` of a step.
/// Full swing gives a triplet feel; zero swing straightens the pattern.
pub fn apply_swing(pattern: &mut Pattern, swing: f32) {
    let offset = if swing.is_finite() { swing.clamp(0.0, 1.0) / 3.0 } else { 0.0 };
    for track in &mut pattern.tracks {
        let odd: Vec<u16> = track.notes.iter().map(|n| n.step).filter(|s| s % 2 == 1).collect();
        for step in odd {
            track.notes.set_offset(step, offset);
        }
    }
}
