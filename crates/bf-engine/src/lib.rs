//! Playback engine for beatforge.
//!
//! Resolves instruments to synthesis voices, builds per-track effect
//! chains and channel strips, and drives them from a sixteenth-note
//! transport. The same [`Engine`] serves live playback and offline render.

mod channel;
mod config;
mod engine;
mod envelope;
mod eq;
mod frame;
mod trigger_queue;
mod voice;

pub mod effects;
pub mod recipe;
pub mod scheduler;
pub mod transport;

pub use channel::{pan_gains, ChannelStrip};
pub use config::EngineConfig;
pub use effects::EffectsChain;
pub use engine::{Engine, TriggerRecord};
pub use envelope::Envelope;
pub use frame::Frame;
pub use recipe::{resolve, Recipe, VoiceKind};
pub use scheduler::{audible_tracks, is_audible, triggers_at_tick, Trigger};
pub use transport::{Transport, TransportState};
pub use voice::{Voice, VoiceError};
