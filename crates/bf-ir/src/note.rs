//! Note events and the per-track note set.

use serde::{Deserialize, Serialize};

/// A single hit on the step grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Step index within the pattern
    pub step: u16,
    /// Stored velocity, (0, 1]
    pub velocity: f32,
    /// Swing delay as a fraction of one step, [0, 1)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub offset: f32,
}

fn is_zero(v: &f32) -> bool {
    *v == 0.0
}

impl NoteEvent {
    pub fn new(step: u16, velocity: f32) -> Self {
        Self { step, velocity, offset: 0.0 }
    }
}

/// Notes of one track, unique by step and kept in ascending step order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<NoteEvent>", into = "Vec<NoteEvent>")]
pub struct Notes(Vec<NoteEvent>);

impl Notes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn index_of(&self, step: u16) -> Result<usize, usize> {
        self.0.binary_search_by_key(&step, |n| n.step)
    }

    /// Look up the note at `step`.
    pub fn get(&self, step: u16) -> Option<&NoteEvent> {
        self.index_of(step).ok().map(|i| &self.0[i])
    }

    pub fn contains(&self, step: u16) -> bool {
        self.index_of(step).is_ok()
    }

    /// Remove the note at `step` if there is one, otherwise insert one at
    /// full velocity. Returns whether a note is present afterwards.
    pub fn toggle(&mut self, step: u16) -> bool {
        match self.index_of(step) {
            Ok(i) => {
                self.0.remove(i);
                false
            }
            Err(i) => {
                self.0.insert(i, NoteEvent::new(step, 1.0));
                true
            }
        }
    }

    /// Upsert the velocity at `step`. Non-positive (or NaN) velocities
    /// remove the note; others are stored capped at 1.0 and never floored.
    pub fn set_velocity(&mut self, step: u16, velocity: f32) {
        if velocity.is_nan() || velocity <= 0.0 {
            self.remove(step);
            return;
        }
        let velocity = velocity.min(1.0);
        match self.index_of(step) {
            Ok(i) => self.0[i].velocity = velocity,
            Err(i) => self.0.insert(i, NoteEvent::new(step, velocity)),
        }
    }

    /// Insert or replace a full note event.
    pub fn insert(&mut self, note: NoteEvent) {
        match self.index_of(note.step) {
            Ok(i) => self.0[i] = note,
            Err(i) => self.0.insert(i, note),
        }
    }

    pub fn remove(&mut self, step: u16) -> Option<NoteEvent> {
        self.index_of(step).ok().map(|i| self.0.remove(i))
    }

    /// Set the swing offset of an existing note. No-op if the step is empty.
    pub fn set_offset(&mut self, step: u16, offset: f32) {
        if let Ok(i) = self.index_of(step) {
            self.0[i].offset = offset.clamp(0.0, 0.999);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteEvent> {
        self.0.iter()
    }
}

impl From<Vec<NoteEvent>> for Notes {
    /// Sorts by step; for duplicate steps the last entry wins.
    fn from(mut notes: Vec<NoteEvent>) -> Self {
        notes.sort_by_key(|n| n.step);
        let mut out: Vec<NoteEvent> = Vec::with_capacity(notes.len());
        for note in notes {
            match out.last_mut() {
                Some(last) if last.step == note.step => *last = note,
                _ => out.push(note),
            }
        }
        Self(out)
    }
}

impl From<Notes> for Vec<NoteEvent> {
    fn from(notes: Notes) -> Self {
        notes.0
    }
}

impl FromIterator<NoteEvent> for Notes {
    fn from_iter<I: IntoIterator<Item = NoteEvent>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}
