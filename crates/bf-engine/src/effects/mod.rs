//! Insert effects applied between a track's voice and its channel strip.

mod chain;
mod compressor;
mod delay;
mod distortion;
mod reverb;

use std::fmt::Debug;

use crate::frame::Frame;

pub use chain::EffectsChain;
pub use compressor::Compressor;
pub use delay::FeedbackDelay;
pub use distortion::Distortion;
pub use reverb::Reverb;

/// A stereo effect processed one frame at a time.
pub trait EffectProcessor: Send + Debug {
    /// Process one frame.
    fn process(&mut self, input: Frame) -> Frame;

    /// Clear internal state (delay lines, envelopes).
    fn reset(&mut self);

    /// Effect name, for logging.
    fn name(&self) -> &'static str;
}

/// Linear dry/wet blend.
fn blend(dry: Frame, wet: Frame, mix: f32) -> Frame {
    dry * (1.0 - mix) + wet * mix
}
