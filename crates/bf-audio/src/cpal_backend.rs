//! Live output through the default cpal device.
//!
//! The render thread pushes frames into a lock-free ring; the device
//! callback drains it through a [`StreamFeeder`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bf_engine::Frame;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::{error, info};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::traits::{AudioError, AudioOutput};

/// Ring capacity in seconds of audio.
const RING_SECONDS: f32 = 0.2;

/// Device-side half of the ring: turns queued frames into interleaved
/// samples for whatever channel count the device asked for.
pub(crate) struct StreamFeeder {
    frames: HeapCons<Frame>,
    gate: Arc<AtomicBool>,
    channels: usize,
}

impl StreamFeeder {
    /// Fill one device buffer. While gated off the ring is emptied so
    /// stale audio never plays after a restart. Underruns are silence.
    pub(crate) fn fill(&mut self, out: &mut [f32]) {
        if !self.gate.load(Ordering::Relaxed) {
            self.frames.clear();
            out.fill(0.0);
            return;
        }
        for slot in out.chunks_mut(self.channels) {
            let frame = self.frames.try_pop().unwrap_or_default();
            let (head, rest) = slot.split_at_mut(slot.len().min(2));
            match head {
                [l, r] => (*l, *r) = (frame.left, frame.right),
                [mono] => *mono = frame.to_mono(),
                _ => {}
            }
            rest.fill(0.0);
        }
    }
}

/// Stereo output on the host's default device.
pub struct CpalOutput {
    stream: Stream,
    sample_rate: u32,
    frames: HeapProd<Frame>,
    gate: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Open the default device and build a stream that stays silent until
    /// [`AudioOutput::start`].
    pub fn open() -> Result<Self, AudioError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;
        let mut config: StreamConfig = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?
            .into();
        config.channels = 2;
        let sample_rate = config.sample_rate.0;

        let (frames, consumer) = ring(sample_rate).split();
        let gate = Arc::new(AtomicBool::new(false));
        let mut feeder = StreamFeeder {
            frames: consumer,
            gate: Arc::clone(&gate),
            channels: config.channels as usize,
        };

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| feeder.fill(data),
                |err| error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        match device.name() {
            Ok(name) => info!("audio output: {name} @ {sample_rate} Hz"),
            Err(_) => info!("audio output: default device @ {sample_rate} Hz"),
        }
        Ok(Self { stream, sample_rate, frames, gate })
    }
}

fn ring(sample_rate: u32) -> HeapRb<Frame> {
    HeapRb::new(((sample_rate as f32 * RING_SECONDS) as usize).max(1))
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn push_frame(&mut self, frame: Frame, keep_going: &dyn Fn() -> bool) -> bool {
        while self.frames.is_full() {
            if !keep_going() {
                return false;
            }
            std::thread::yield_now();
        }
        self.frames.try_push(frame).is_ok()
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.gate.store(true, Ordering::Relaxed);
        self.stream.play().map_err(|e| AudioError::Playback(e.to_string()))
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.gate.store(false, Ordering::Relaxed);
        self.stream.pause().map_err(|e| AudioError::Playback(e.to_string()))
    }
}
