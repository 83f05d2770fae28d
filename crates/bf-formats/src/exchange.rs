//! JSON pattern exchange.
//!
//! Parsing is tolerant: anything the generation service or an older save
//! leaves out or mistypes is filled with a default, and bad entries are
//! dropped with a warning instead of failing the whole pattern. Only text
//! that is not JSON, or JSON that is not an object, is an error.

use std::collections::HashSet;

use bf_ir::{
    color_for_index, EqBand, EqSettings, Effect, NoteEvent, Pattern, Project, Track, DEFAULT_BPM,
    GENERATOR_STEPS,
};
use log::warn;
use serde_json::{Map, Value};

use crate::FormatError;

const DEFAULT_VOLUME: f32 = 0.8;

type Object = Map<String, Value>;

/// A finite number under `key`, or `None` for anything else.
fn number(obj: &Object, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}

/// A string under `key`. Numbers are accepted and printed.
fn text(obj: &Object, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag(obj: &Object, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// The array under `key`; a missing, null or non-array value is empty.
fn entries<'a>(obj: &'a Object, key: &str) -> &'a [Value] {
    obj.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
}

/// Split a `{pattern, metadata}` response envelope. A bare pattern comes back
/// unchanged with no metadata.
pub(crate) fn split_envelope(value: Value) -> Result<(Value, Option<Value>), FormatError> {
    let Value::Object(mut map) = value else {
        return Err(FormatError::NotAnObject);
    };
    match map.remove("pattern") {
        Some(pattern @ Value::Object(_)) => Ok((pattern, map.remove("metadata"))),
        Some(other) => {
            map.insert("pattern".into(), other);
            Ok((Value::Object(map), None))
        }
        None => Ok((Value::Object(map), None)),
    }
}

/// Parse a pattern from exchange JSON, bare or wrapped in a response envelope.
pub fn parse_pattern(data: &[u8]) -> Result<Pattern, FormatError> {
    let value: Value = serde_json::from_slice(data)?;
    let (pattern, _) = split_envelope(value)?;
    pattern_from_value(pattern)
}

pub(crate) fn pattern_from_value(value: Value) -> Result<Pattern, FormatError> {
    let Value::Object(obj) = value else {
        return Err(FormatError::NotAnObject);
    };

    let steps = match number(&obj, "steps") {
        Some(s) if (1.0..=u16::MAX as f64).contains(&s) => s.round() as u16,
        _ => GENERATOR_STEPS,
    };
    let bpm = match number(&obj, "bpm") {
        Some(b) if (1.0..=999.0).contains(&b) => b.round() as u32,
        _ => DEFAULT_BPM,
    };

    let mut pattern = Pattern::new(bpm, steps);
    let mut ids = HashSet::new();
    for (index, entry) in entries(&obj, "tracks").iter().enumerate() {
        let Value::Object(raw) = entry else {
            warn!("dropping track entry {index}: expected an object, got {entry}");
            continue;
        };
        let track = normalize_track(raw, pattern.tracks.len(), steps, &mut ids);
        pattern.tracks.push(track);
    }
    Ok(pattern)
}

fn normalize_track(raw: &Object, index: usize, steps: u16, ids: &mut HashSet<String>) -> Track {
    let mut id = text(raw, "id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("track-{}", index + 1));
    if ids.contains(&id) {
        let base = id.clone();
        let mut n = 2;
        while ids.contains(&id) {
            id = format!("{base}-{n}");
            n += 1;
        }
        warn!("duplicate track id {base:?} renamed to {id:?}");
    }
    ids.insert(id.clone());

    let mut track = Track::new(id, text(raw, "instrument").unwrap_or_default());
    track.set_volume(number(raw, "volume").map_or(DEFAULT_VOLUME, |v| v as f32));
    track.set_pan(number(raw, "pan").map_or(0.0, |v| v as f32));
    track.mute = flag(raw, "mute");
    track.solo = flag(raw, "solo");
    track.color = Some(text(raw, "color").unwrap_or_else(|| color_for_index(index).to_string()));
    track.eq = match raw.get("eq") {
        Some(Value::Object(eq)) => normalize_eq(eq),
        _ => EqSettings::default(),
    };

    for entry in entries(raw, "notes") {
        let Value::Object(note) = entry else {
            warn!("track {}: dropping note entry {entry}", track.id);
            continue;
        };
        if let Some(note) = normalize_note(note, steps, &track.id) {
            track.notes.insert(note);
        }
    }

    for (n, entry) in entries(raw, "effects").iter().enumerate() {
        match normalize_effect(entry, &track, n) {
            Some(effect) => track.effects.push(effect),
            None => warn!("track {}: dropping malformed effect {entry}", track.id),
        }
    }
    track
}

/// Build EQ settings through the clamping setters. Mistyped fields stay flat.
fn normalize_eq(raw: &Object) -> EqSettings {
    let mut eq = EqSettings::default();
    for (key, band) in [("low", EqBand::Low), ("mid", EqBand::Mid), ("high", EqBand::High)] {
        if let Some(db) = number(raw, key) {
            eq.set_band(band, db as f32);
        }
    }
    if let Some(hz) = number(raw, "lowPassFreq") {
        eq.set_low_pass(hz as f32);
    }
    if let Some(hz) = number(raw, "highPassFreq") {
        eq.set_high_pass(hz as f32);
    }
    eq
}

/// Effects need a `type`; a missing id is generated from the track id.
fn normalize_effect(entry: &Value, track: &Track, n: usize) -> Option<Effect> {
    let Value::Object(raw) = entry else {
        return None;
    };
    let kind = text(raw, "type").filter(|t| !t.is_empty())?;
    let id = text(raw, "id").filter(|id| !id.is_empty()).unwrap_or_else(|| {
        let mut n = n + 1;
        while track.effect(&format!("{}-fx-{n}", track.id)).is_some() {
            n += 1;
        }
        format!("{}-fx-{n}", track.id)
    });

    let mut effect = Effect::new(id, kind);
    effect.enabled = raw.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    if let Some(Value::Object(params)) = raw.get("parameters") {
        effect.parameters = params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    }
    Some(effect)
}

fn normalize_note(raw: &Object, steps: u16, track: &str) -> Option<NoteEvent> {
    let step = match number(raw, "step") {
        Some(s) if s.fract() == 0.0 && s >= 0.0 && s < steps as f64 => s as u16,
        other => {
            warn!("track {track}: dropping note with step {other:?} outside 0..{steps}");
            return None;
        }
    };
    let velocity = match raw.get("velocity") {
        None | Some(Value::Null) => 1.0,
        Some(v) => v.as_f64().map_or(0.0, |v| v as f32),
    };
    if velocity.is_nan() || velocity <= 0.0 {
        warn!("track {track}: dropping silent note at step {step}");
        return None;
    }
    Some(NoteEvent {
        step,
        velocity: velocity.min(1.0),
        offset: number(raw, "offset").map_or(0.0, |o| (o as f32).clamp(0.0, 0.999)),
    })
}

/// Serialize a pattern to pretty JSON.
pub fn export_pattern(pattern: &Pattern) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec_pretty(pattern)?)
}

/// Parse a saved project. Tracks go through the same normalization as patterns.
pub fn parse_project(data: &[u8]) -> Result<Project, FormatError> {
    let mut value: Value = serde_json::from_slice(data)?;
    let Value::Object(map) = &mut value else {
        return Err(FormatError::NotAnObject);
    };
    let name = map.get("name").and_then(Value::as_str).unwrap_or("Untitled").to_string();
    let created_at = map.get("createdAt").and_then(Value::as_str).map(str::to_string);
    map.insert("steps".into(), Value::from(bf_ir::SEQUENCER_STEPS));
    let pattern = pattern_from_value(value)?;
    Ok(Project {
        name,
        bpm: pattern.bpm,
        tracks: pattern.tracks,
        created_at,
    })
}

pub fn export_project(project: &Project) -> Result<Vec<u8>, FormatError> {
    Ok(serde_json::to_vec_pretty(project)?)
}
