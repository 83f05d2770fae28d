//! Transport: the BPM clock and its play/pause/stop state machine.
//!
//! Time advances one output sample at a time. Ticks are sixteenth notes;
//! the tick phase is kept in samples so that a tempo change rescales the
//! phase and leaves the position in steps untouched.

use bf_ir::{seconds_per_tick, Timestamp};
use log::debug;

const MIN_BPM: f64 = 1.0;
const MAX_BPM: f64 = 999.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Clone, Debug)]
pub struct Transport {
    state: TransportState,
    bpm: f64,
    sample_rate: u32,
    samples_per_tick: f64,
    /// Current tick (absolute, monotonic while playing)
    tick: u64,
    /// Samples elapsed within the current tick
    phase: f64,
    /// Whether the current tick's boundary has been handed out
    fired: bool,
}

impl Transport {
    pub fn new(bpm: f64, sample_rate: u32) -> Self {
        let bpm = sanitize_bpm(bpm).unwrap_or(bf_ir::DEFAULT_BPM as f64);
        Self {
            state: TransportState::Stopped,
            bpm,
            sample_rate,
            samples_per_tick: samples_per_tick(bpm, sample_rate),
            tick: 0,
            phase: 0.0,
            fired: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Tick length at the current tempo.
    pub fn seconds_per_tick(&self) -> f64 {
        seconds_per_tick(self.bpm)
    }

    /// Start from zero when stopped, resume from the frozen position when paused.
    pub fn play(&mut self) {
        match self.state {
            TransportState::Stopped => {
                self.rewind();
                self.state = TransportState::Playing;
            }
            TransportState::Paused => self.state = TransportState::Playing,
            TransportState::Playing => {}
        }
        debug!("transport playing at {:.3} steps", self.position_in_steps());
    }

    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
            debug!("transport paused at {:.3} steps", self.position_in_steps());
        }
    }

    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.rewind();
    }

    fn rewind(&mut self) {
        self.tick = 0;
        self.phase = 0.0;
        self.fired = false;
    }

    /// Jump to `steps`. Ignored while stopped. A position exactly on a tick
    /// boundary fires that tick next.
    pub fn seek(&mut self, steps: f64) {
        if self.state == TransportState::Stopped {
            return;
        }
        let steps = if steps.is_finite() { steps.max(0.0) } else { 0.0 };
        self.tick = steps.floor() as u64;
        self.phase = steps.fract() * self.samples_per_tick;
        self.fired = self.phase > 0.0;
    }

    /// Change tempo without moving the current position. Non-finite or
    /// non-positive values are ignored.
    pub fn set_bpm(&mut self, bpm: f64) {
        let Some(bpm) = sanitize_bpm(bpm) else {
            debug!("ignoring invalid bpm {bpm}");
            return;
        };
        let fraction = self.phase / self.samples_per_tick;
        self.bpm = bpm;
        self.samples_per_tick = samples_per_tick(bpm, self.sample_rate);
        self.phase = fraction * self.samples_per_tick;
    }

    /// Absolute position in steps. Zero while stopped.
    pub fn position_in_steps(&self) -> f64 {
        self.tick as f64 + self.phase / self.samples_per_tick
    }

    /// Current time as a sub-tick timestamp.
    pub fn now(&self) -> Timestamp {
        Timestamp::with_offset(self.tick, (self.phase / self.samples_per_tick) as f32)
    }

    /// The current tick if its boundary has not been handled yet.
    pub fn take_due_tick(&mut self) -> Option<u64> {
        if self.state != TransportState::Playing || self.fired {
            return None;
        }
        self.fired = true;
        Some(self.tick)
    }

    /// Move forward by one sample.
    pub fn advance(&mut self) {
        if self.state != TransportState::Playing {
            return;
        }
        self.phase += 1.0;
        if self.phase >= self.samples_per_tick {
            self.phase -= self.samples_per_tick;
            self.tick += 1;
            self.fired = false;
        }
    }
}

fn sanitize_bpm(bpm: f64) -> Option<f64> {
    (bpm.is_finite() && bpm > 0.0).then(|| bpm.clamp(MIN_BPM, MAX_BPM))
}

fn samples_per_tick(bpm: f64, sample_rate: u32) -> f64 {
    seconds_per_tick(bpm) * sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run `samples` samples, collecting the ticks that fired.
    fn run(t: &mut Transport, samples: usize) -> Vec<u64> {
        let mut fired = Vec::new();
        for _ in 0..samples {
            if let Some(tick) = t.take_due_tick() {
                fired.push(tick);
            }
            t.advance();
        }
        fired
    }

    #[test]
    fn starts_stopped_at_zero() {
        let t = Transport::new(120.0, 44_100);
        assert_eq!(t.state(), TransportState::Stopped);
        assert_eq!(t.position_in_steps(), 0.0);
    }

    #[test]
    fn ticks_every_sixteenth() {
        // 120 BPM at 1000 Hz: 125 samples per tick.
        let mut t = Transport::new(120.0, 1000);
        t.play();
        assert_eq!(run(&mut t, 500), vec![0, 1, 2, 3]);
        assert!((t.position_in_steps() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn stopped_and_paused_do_not_tick() {
        let mut t = Transport::new(120.0, 1000);
        assert!(run(&mut t, 300).is_empty());
        t.play();
        run(&mut t, 130);
        t.pause();
        let frozen = t.position_in_steps();
        assert!(run(&mut t, 300).is_empty());
        assert_eq!(t.position_in_steps(), frozen);
    }

    #[test]
    fn resume_continues_without_refiring() {
        let mut t = Transport::new(120.0, 1000);
        t.play();
        assert_eq!(run(&mut t, 10), vec![0]);
        t.pause();
        t.play();
        assert_eq!(run(&mut t, 240), vec![1]);
    }

    #[test]
    fn stop_resets_position() {
        let mut t = Transport::new(120.0, 1000);
        t.play();
        run(&mut t, 333);
        t.stop();
        assert_eq!(t.position_in_steps(), 0.0);
        t.play();
        assert_eq!(run(&mut t, 1), vec![0]);
    }

    #[test]
    fn set_bpm_keeps_position() {
        let mut t = Transport::new(120.0, 1000);
        t.play();
        run(&mut t, 190);
        let before = t.position_in_steps();
        t.set_bpm(90.0);
        assert!((t.position_in_steps() - before).abs() < 1e-9);
        assert_eq!(t.state(), TransportState::Playing);
    }

    #[test]
    fn set_bpm_changes_tick_spacing() {
        let mut t = Transport::new(120.0, 1000);
        t.set_bpm(60.0);
        t.play();
        assert_eq!(run(&mut t, 500), vec![0, 1]);
    }

    #[test]
    fn invalid_bpm_is_ignored() {
        let mut t = Transport::new(120.0, 1000);
        t.set_bpm(0.0);
        t.set_bpm(f64::NAN);
        assert_eq!(t.bpm(), 120.0);
    }

    #[test]
    fn seek_moves_position_and_fires_on_boundary() {
        let mut t = Transport::new(120.0, 1000);
        t.seek(5.0);
        assert_eq!(t.position_in_steps(), 0.0);
        t.play();
        t.seek(8.0);
        assert_eq!(run(&mut t, 1), vec![8]);
        t.seek(9.5);
        assert_eq!(run(&mut t, 70), vec![10]);
    }
}
