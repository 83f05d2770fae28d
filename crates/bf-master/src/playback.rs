//! Live playback on a dedicated audio thread.
//!
//! The output stream is created on the audio thread itself. The thread
//! reports whether the device came up through a one-shot channel, then
//! renders frames into the ring buffer until told to stop. Edits arrive
//! as commands and are applied between frames.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use bf_audio::{AudioError, AudioOutput, CpalOutput};
use bf_engine::{Engine, EngineConfig};
use bf_ir::Pattern;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio output unavailable: {0}")]
    Audio(#[from] AudioError),
    #[error("could not start the audio thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("audio thread exited before reporting readiness")]
    ThreadExited,
}

/// Messages from the controller to the audio thread.
#[derive(Debug)]
pub(crate) enum Command {
    UpdatePattern(Pattern),
    SetBpm(f64),
    SetMasterVolume(f32),
    Play,
    Pause,
    Seek(f64),
}

/// Controller-side handle to a running audio thread.
pub(crate) struct PlaybackHandle {
    commands: Sender<Command>,
    stop_signal: Arc<AtomicBool>,
    /// Absolute position in steps, stored as `f64` bits
    position: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    /// Start the audio thread and wait until the device is up.
    pub(crate) fn spawn(pattern: Pattern, config: EngineConfig) -> Result<Self, PlaybackError> {
        let (commands, command_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let stop_signal = Arc::new(AtomicBool::new(false));
        let position = Arc::new(AtomicU64::new(0f64.to_bits()));

        let stop = stop_signal.clone();
        let pos = position.clone();
        let thread = std::thread::Builder::new()
            .name("beatforge-audio".into())
            .spawn(move || audio_thread(pattern, config, command_rx, ready_tx, stop, pos))?;

        let mut handle = Self {
            commands,
            stop_signal,
            position,
            thread: Some(thread),
        };
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => {
                handle.shutdown();
                Err(e.into())
            }
            Err(_) => {
                handle.shutdown();
                Err(PlaybackError::ThreadExited)
            }
        }
    }

    pub(crate) fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("audio thread is gone; command dropped");
        }
    }

    /// Last absolute position the audio thread published.
    pub(crate) fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Relaxed))
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the thread and wait for it. Nothing sounds once this returns.
    pub(crate) fn shutdown(&mut self) {
        self.stop_signal.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn apply(engine: &mut Engine, command: Command) {
    match command {
        Command::UpdatePattern(pattern) => engine.update_pattern(pattern),
        Command::SetBpm(bpm) => engine.set_bpm(bpm),
        Command::SetMasterVolume(gain) => engine.set_master_volume(gain),
        Command::Play => {
            debug!("audio thread: play");
            engine.play();
        }
        Command::Pause => {
            debug!("audio thread: pause");
            engine.pause();
        }
        Command::Seek(steps) => {
            debug!("audio thread: seek to {steps}");
            engine.seek(steps);
        }
    }
}

fn audio_thread(
    pattern: Pattern,
    config: EngineConfig,
    commands: Receiver<Command>,
    ready: Sender<Result<(), AudioError>>,
    stop_signal: Arc<AtomicBool>,
    position: Arc<AtomicU64>,
) {
    let mut output = match CpalOutput::open() {
        Ok(output) => output,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if let Err(e) = output.start() {
        let _ = ready.send(Err(e));
        return;
    }

    let sample_rate = output.sample_rate();
    let mut engine = Engine::new(pattern, &config.with_sample_rate(sample_rate));
    engine.play();
    let _ = ready.send(Ok(()));
    info!("live playback started at {sample_rate} Hz");

    run(&mut engine, &mut output, &commands, &stop_signal, &position);

    // Hard cut: the callback drains the ring once the stream is stopped.
    engine.stop();
    if let Err(e) = output.stop() {
        warn!("stopping output stream: {e}");
    }
    info!("live playback stopped");
}

/// Render into `output` until `stop_signal` is raised or the output gives up.
/// Commands are applied between frames; the position is published about a
/// hundred times a second and after every command batch.
fn run(
    engine: &mut Engine,
    output: &mut impl AudioOutput,
    commands: &Receiver<Command>,
    stop_signal: &AtomicBool,
    position: &AtomicU64,
) {
    let publish_interval = (engine.sample_rate() / 100).max(1) as u64;
    let mut frame_count: u64 = 0;
    let keep_going = || !stop_signal.load(Ordering::Relaxed);

    while keep_going() {
        let mut touched = false;
        for command in commands.try_iter() {
            apply(engine, command);
            touched = true;
        }
        if !output.push_frame(engine.render_frame(), &keep_going) {
            break;
        }
        frame_count += 1;
        if touched || frame_count % publish_interval == 0 {
            position.store(engine.position().absolute.to_bits(), Ordering::Relaxed);
        }
    }
}
