//! Schroeder/Freeverb-style reverb.
//!
//! Eight damped feedback combs in parallel feed four allpasses in series,
//! one bank per channel with the right bank's delays spread slightly.
//! Comb feedback is derived from the decay time so the tail falls by
//! 60 dB after `decay` seconds.

use arrayvec::ArrayVec;

use super::{blend, EffectProcessor};
use crate::frame::Frame;

/// Comb delays in samples at 44.1 kHz.
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// Allpass delays in samples at 44.1 kHz.
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;
const DAMPING: f32 = 0.2;
const ALLPASS_FEEDBACK: f32 = 0.5;

#[derive(Clone, Debug)]
struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    store: f32,
}

impl Comb {
    fn new(len: usize, decay: f32, sample_rate: f32) -> Self {
        let feedback = 10f32.powf(-3.0 * len as f32 / (decay * sample_rate));
        Self { buffer: vec![0.0; len], pos: 0, feedback: feedback.min(0.98), store: 0.0 }
    }

    fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.pos];
        self.store = out * (1.0 - DAMPING) + self.store * DAMPING;
        self.buffer[self.pos] = input + self.store * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
        self.store = 0.0;
    }
}

#[derive(Clone, Debug)]
struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self { buffer: vec![0.0; len], pos: 0 }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        self.buffer[self.pos] = input + delayed * ALLPASS_FEEDBACK;
        self.pos = (self.pos + 1) % self.buffer.len();
        delayed - input * ALLPASS_FEEDBACK
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

#[derive(Clone, Debug)]
struct Bank {
    combs: ArrayVec<Comb, 8>,
    allpasses: ArrayVec<Allpass, 4>,
}

impl Bank {
    fn new(spread: usize, decay: f32, sample_rate: f32) -> Self {
        let scale = sample_rate / 44_100.0;
        let len = |n: usize| (((n + spread) as f32 * scale) as usize).max(1);
        Self {
            combs: COMB_TUNING.iter().map(|&n| Comb::new(len(n), decay, sample_rate)).collect(),
            allpasses: ALLPASS_TUNING.iter().map(|&n| Allpass::new(len(n))).collect(),
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input);
        }
        out /= self.combs.len() as f32;
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }

    fn reset(&mut self) {
        self.combs.iter_mut().for_each(Comb::reset);
        self.allpasses.iter_mut().for_each(Allpass::reset);
    }
}

#[derive(Clone, Debug)]
pub struct Reverb {
    left: Bank,
    right: Bank,
    mix: f32,
}

impl Reverb {
    /// `decay` in seconds, `mix` in [0, 1].
    pub fn new(decay: f32, mix: f32, sample_rate: u32) -> Self {
        let decay = decay.max(0.01);
        let sr = sample_rate as f32;
        Self {
            left: Bank::new(0, decay, sr),
            right: Bank::new(STEREO_SPREAD, decay, sr),
            mix: mix.clamp(0.0, 1.0),
        }
    }
}

impl EffectProcessor for Reverb {
    fn process(&mut self, input: Frame) -> Frame {
        let mono = input.to_mono();
        let wet = Frame::new(self.left.process(mono), self.right.process(mono));
        blend(input, wet, self.mix)
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    fn name(&self) -> &'static str {
        "reverb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_tail(decay: f32) -> f32 {
        let mut r = Reverb::new(decay, 1.0, 44_100);
        r.process(Frame::mono(1.0));
        let mut energy = 0.0;
        for _ in 0..44_100 {
            let f = r.process(Frame::silence());
            energy += f.left * f.left + f.right * f.right;
        }
        energy
    }

    #[test]
    fn longer_decay_rings_longer() {
        assert!(impulse_tail(3.0) > impulse_tail(0.5));
    }

    #[test]
    fn dry_mix_passes_input() {
        let mut r = Reverb::new(1.5, 0.0, 44_100);
        let out = r.process(Frame::new(0.25, -0.5));
        assert_eq!(out, Frame::new(0.25, -0.5));
    }

    #[test]
    fn reset_clears_tail() {
        let mut r = Reverb::new(1.5, 1.0, 44_100);
        for _ in 0..2000 {
            r.process(Frame::mono(0.5));
        }
        r.reset();
        for _ in 0..2000 {
            assert!(r.process(Frame::silence()).is_silent());
        }
    }
}
