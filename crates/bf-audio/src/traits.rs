//! Audio output trait and error types.

use bf_engine::Frame;
use thiserror::Error;

/// Error type for audio operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No audio device available
    #[error("no audio output device available")]
    NoDevice,
}

/// A sink the live render loop pushes frames into, one at a time.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Queue one frame, waiting for room while `keep_going` holds.
    /// Returns `false` if the frame was not queued.
    fn push_frame(&mut self, frame: Frame, keep_going: &dyn Fn() -> bool) -> bool;

    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop playback. Output goes silent on the next device callback.
    fn stop(&mut self) -> Result<(), AudioError>;
}
