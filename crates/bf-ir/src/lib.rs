//! Core data model for beatforge.
//!
//! Patterns, tracks, note events and mixer settings. Everything here is
//! plain data: it serializes losslessly to JSON and carries no live audio
//! resources, so storage and generation collaborators can produce and
//! consume it without the engine.

mod effect;
mod eq;
mod instrument;
mod mixer;
mod note;
mod pattern;
mod project;
mod timestamp;
mod track;

pub use effect::{Effect, EffectKind};
pub use eq::{EqBand, EqSettings, EQ_GAIN_RANGE_DB};
pub use instrument::{color_for_index, INSTRUMENTS, INSTRUMENT_COLORS};
pub use mixer::{gain_to_db, volume_to_db, SILENCE_FLOOR};
pub use note::{NoteEvent, Notes};
pub use pattern::{EditError, Pattern, DEFAULT_BPM, GENERATOR_STEPS, SEQUENCER_STEPS};
pub use project::Project;
pub use timestamp::{seconds_per_tick, PlaybackPosition, Timestamp, TICKS_PER_BEAT};
pub use track::Track;
