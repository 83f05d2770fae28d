//! Main playback engine.

use bf_ir::{gain_to_db, Pattern, PlaybackPosition, Timestamp, SILENCE_FLOOR};
use log::{debug, warn};

use crate::channel::ChannelStrip;
use crate::config::EngineConfig;
use crate::frame::Frame;
use crate::scheduler::{triggers_at_tick, Trigger};
use crate::transport::{Transport, TransportState};
use crate::trigger_queue::TriggerQueue;

/// One fired note, as recorded by the trigger log.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerRecord {
    pub tick: u64,
    pub track: String,
    pub step: u16,
    pub velocity: f32,
}

/// Noise seed for the strip at `index`.
fn strip_seed(index: usize) -> u32 {
    (index as u32).wrapping_add(1).wrapping_mul(0x9E37_79B9)
}

/// The main playback engine.
///
/// Owns a pattern snapshot, one channel strip per track and the transport.
/// Renders one stereo frame per call. Pattern updates are staged and take
/// effect at the next tick boundary.
pub struct Engine {
    /// Pattern the ticks are resolved against
    pattern: Pattern,
    /// Replacement waiting for the next tick boundary
    staged: Option<Pattern>,
    /// Channel strips, parallel to `pattern.tracks`
    strips: Vec<ChannelStrip>,
    transport: Transport,
    /// Swung triggers waiting for their offset
    pending: TriggerQueue,
    sample_rate: u32,
    /// Master bus gain (linear)
    master_gain: f32,
    trigger_log: Option<Vec<TriggerRecord>>,
}

impl Engine {
    /// Create a stopped engine for `pattern`.
    pub fn new(pattern: Pattern, config: &EngineConfig) -> Self {
        let sample_rate = config.sample_rate;
        let strips = pattern
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| ChannelStrip::new(t, sample_rate, strip_seed(i)))
            .collect();
        Self {
            transport: Transport::new(pattern.bpm as f64, sample_rate),
            pattern,
            staged: None,
            strips,
            pending: TriggerQueue::new(),
            sample_rate,
            master_gain: 10f32.powf(config.master_volume_db / 20.0),
            trigger_log: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    // --- Transport ---

    pub fn play(&mut self) {
        self.transport.play();
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    /// Stop and silence everything: voices, effect tails and pending triggers.
    pub fn stop(&mut self) {
        self.transport.stop();
        if !self.pending.is_empty() {
            debug!("stop drops {} pending swung triggers", self.pending.len());
        }
        self.pending.clear();
        for strip in &mut self.strips {
            strip.stop();
        }
        if let Some(pattern) = self.staged.take() {
            self.apply_pattern(pattern);
        }
    }

    pub fn seek(&mut self, steps: f64) {
        self.transport.seek(steps);
        self.pending.clear();
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.transport.set_bpm(bpm);
    }

    pub fn bpm(&self) -> f64 {
        self.transport.bpm()
    }

    /// Swung triggers queued for later in the current tick.
    pub fn pending_triggers(&self) -> usize {
        self.pending.len()
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition::new(self.transport.position_in_steps(), self.pattern.steps)
    }

    // --- Mixer ---

    /// Set the master level from a linear gain, floored like track faders.
    pub fn set_master_volume(&mut self, gain: f32) {
        let gain = if gain.is_nan() { SILENCE_FLOOR } else { gain.max(SILENCE_FLOOR) };
        self.master_gain = 10f32.powf(gain_to_db(gain) / 20.0);
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Replace the pattern. While playing the swap happens at the next tick
    /// boundary so a tick never sees a half-applied edit.
    pub fn update_pattern(&mut self, pattern: Pattern) {
        if self.transport.is_playing() {
            self.staged = Some(pattern);
        } else {
            self.apply_pattern(pattern);
        }
    }

    fn apply_pattern(&mut self, pattern: Pattern) {
        let mut old: Vec<Option<ChannelStrip>> = self.strips.drain(..).map(Some).collect();
        let strips = pattern
            .tracks
            .iter()
            .enumerate()
            .map(|(i, track)| {
                let reused = old
                    .iter_mut()
                    .find(|s| matches!(s, Some(strip) if strip.id() == track.id))
                    .and_then(Option::take);
                match reused {
                    Some(mut strip) => {
                        strip.sync(track);
                        strip
                    }
                    None => ChannelStrip::new(track, self.sample_rate, strip_seed(i)),
                }
            })
            .collect();
        self.strips = strips;
        self.pattern = pattern;
    }

    // --- Trigger log ---

    /// Start recording every fired trigger.
    pub fn enable_trigger_log(&mut self) {
        self.trigger_log.get_or_insert_with(Vec::new);
    }

    pub fn take_trigger_log(&mut self) -> Vec<TriggerRecord> {
        self.trigger_log.as_mut().map(std::mem::take).unwrap_or_default()
    }

    // --- Rendering ---

    /// Generate one frame of audio.
    pub fn render_frame(&mut self) -> Frame {
        if self.transport.is_playing() {
            if let Some(tick) = self.transport.take_due_tick() {
                self.process_tick(tick);
            }
            for trigger in self.pending.pop_until(self.transport.now()) {
                let tick = self.transport.now().tick;
                self.fire(tick, trigger);
            }
            self.transport.advance();
        }

        let mut out = Frame::silence();
        for strip in &mut self.strips {
            out.mix(strip.render());
        }
        (out * self.master_gain).clamped()
    }

    /// Render `count` frames.
    pub fn render_frames(&mut self, count: usize) -> Vec<Frame> {
        (0..count).map(|_| self.render_frame()).collect()
    }

    fn process_tick(&mut self, tick: u64) {
        // Swung notes left over from the previous tick still belong to the
        // old strip layout.
        for trigger in self.pending.pop_until(self.transport.now()) {
            self.fire(tick, trigger);
        }
        if let Some(pattern) = self.staged.take() {
            debug!("applying staged pattern at tick {tick}");
            self.apply_pattern(pattern);
        }
        for trigger in triggers_at_tick(&self.pattern, tick) {
            if trigger.offset > 0.0 {
                self.pending.push(Timestamp::with_offset(tick, trigger.offset), trigger);
            } else {
                self.fire(tick, trigger);
            }
        }
    }

    /// Fire one trigger. Failures are logged and never stop the tick.
    fn fire(&mut self, tick: u64, trigger: Trigger) {
        let gate = self.transport.seconds_per_tick() as f32;
        let Some(strip) = self.strips.get_mut(trigger.track) else {
            return;
        };
        if let Err(e) = strip.trigger(trigger.velocity, gate) {
            warn!("track {}: trigger at step {} failed: {e}", strip.id(), trigger.step);
            return;
        }
        if let Some(log) = &mut self.trigger_log {
            log.push(TriggerRecord {
                tick,
                track: strip.id().to_string(),
                step: trigger.step,
                velocity: trigger.velocity,
            });
        }
    }
}
