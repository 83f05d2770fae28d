//! Waveshaping distortion.

use std::f32::consts::PI;

use super::{blend, EffectProcessor};
use crate::frame::Frame;

#[derive(Clone, Debug)]
pub struct Distortion {
    /// Curve steepness, 0-100
    k: f32,
    mix: f32,
}

impl Distortion {
    /// `drive` and `mix` in [0, 1].
    pub fn new(drive: f32, mix: f32) -> Self {
        Self {
            k: drive.clamp(0.0, 1.0) * 100.0,
            mix: mix.clamp(0.0, 1.0),
        }
    }

    fn shape(&self, x: f32) -> f32 {
        let x = x.clamp(-1.0, 1.0);
        let deg = PI / 180.0;
        (3.0 + self.k) * x * 20.0 * deg / (PI + self.k * x.abs())
    }
}

impl EffectProcessor for Distortion {
    fn process(&mut self, input: Frame) -> Frame {
        let wet = Frame::new(self.shape(input.left), self.shape(input.right));
        blend(input, wet, self.mix)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "distortion"
    }
}
