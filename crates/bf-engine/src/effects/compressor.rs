//! Feed-forward peak compressor with fixed threshold and timing.

use super::EffectProcessor;
use crate::frame::Frame;

pub const THRESHOLD_DB: f32 = -24.0;
pub const ATTACK: f32 = 0.003;
pub const RELEASE: f32 = 0.25;

#[derive(Clone, Debug)]
pub struct Compressor {
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed gain reduction in dB
    reduction: f32,
}

impl Compressor {
    pub fn new(ratio: f32, sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        Self {
            ratio: ratio.max(1.0),
            attack_coeff: (-1.0 / (ATTACK * sr)).exp(),
            release_coeff: (-1.0 / (RELEASE * sr)).exp(),
            reduction: 0.0,
        }
    }
}

impl EffectProcessor for Compressor {
    fn process(&mut self, input: Frame) -> Frame {
        let peak = input.left.abs().max(input.right.abs());
        let level_db = if peak > 1e-6 { 20.0 * peak.log10() } else { -120.0 };
        let over = (level_db - THRESHOLD_DB).max(0.0);
        let target = over * (1.0 - 1.0 / self.ratio);
        let coeff = if target > self.reduction { self.attack_coeff } else { self.release_coeff };
        self.reduction = target + (self.reduction - target) * coeff;
        input * 10f32.powf(-self.reduction / 20.0)
    }

    fn reset(&mut self) {
        self.reduction = 0.0;
    }

    fn name(&self) -> &'static str {
        "compression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_signal_is_untouched() {
        let mut c = Compressor::new(4.0, 44_100);
        let x = Frame::mono(0.01);
        for _ in 0..1000 {
            assert_eq!(c.process(x), x);
        }
    }

    #[test]
    fn loud_signal_is_reduced_by_ratio() {
        let mut c = Compressor::new(4.0, 44_100);
        let mut out = Frame::silence();
        for _ in 0..44_100 {
            out = c.process(Frame::mono(1.0));
        }
        // 0 dBFS input is 24 dB over; 4:1 leaves 6 dB over threshold.
        let out_db = 20.0 * out.left.log10();
        assert!((out_db - (-18.0)).abs() < 0.1, "got {out_db}");
    }
}
