//! Channel EQ: three bands plus low- and high-pass filters.
//!
//! Biquad coefficients follow the RBJ audio EQ cookbook.

use std::f32::consts::{FRAC_1_SQRT_2, TAU};

use bf_ir::EqSettings;

use crate::frame::Frame;

const LOW_SHELF_HZ: f32 = 400.0;
const MID_PEAK_HZ: f32 = 1000.0;
const HIGH_SHELF_HZ: f32 = 2500.0;
const MID_Q: f32 = 0.7;

#[derive(Clone, Copy, Debug, Default)]
struct Coeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coeffs {
    fn normalize(b: [f32; 3], a: [f32; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
        }
    }

    fn low_shelf(freq: f32, gain_db: f32, sr: f32) -> Self {
        let a = 10f32.powf(gain_db / 40.0);
        let w = TAU * freq / sr;
        let (sin, cos) = w.sin_cos();
        let alpha = sin * FRAC_1_SQRT_2;
        let sq = 2.0 * a.sqrt() * alpha;
        Self::normalize(
            [
                a * ((a + 1.0) - (a - 1.0) * cos + sq),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos),
                a * ((a + 1.0) - (a - 1.0) * cos - sq),
            ],
            [
                (a + 1.0) + (a - 1.0) * cos + sq,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos),
                (a + 1.0) + (a - 1.0) * cos - sq,
            ],
        )
    }

    fn high_shelf(freq: f32, gain_db: f32, sr: f32) -> Self {
        let a = 10f32.powf(gain_db / 40.0);
        let w = TAU * freq / sr;
        let (sin, cos) = w.sin_cos();
        let alpha = sin * FRAC_1_SQRT_2;
        let sq = 2.0 * a.sqrt() * alpha;
        Self::normalize(
            [
                a * ((a + 1.0) + (a - 1.0) * cos + sq),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
                a * ((a + 1.0) + (a - 1.0) * cos - sq),
            ],
            [
                (a + 1.0) - (a - 1.0) * cos + sq,
                2.0 * ((a - 1.0) - (a + 1.0) * cos),
                (a + 1.0) - (a - 1.0) * cos - sq,
            ],
        )
    }

    fn peak(freq: f32, gain_db: f32, q: f32, sr: f32) -> Self {
        let a = 10f32.powf(gain_db / 40.0);
        let w = TAU * freq / sr;
        let (sin, cos) = w.sin_cos();
        let alpha = sin / (2.0 * q);
        Self::normalize(
            [1.0 + alpha * a, -2.0 * cos, 1.0 - alpha * a],
            [1.0 + alpha / a, -2.0 * cos, 1.0 - alpha / a],
        )
    }

    fn low_pass(freq: f32, sr: f32) -> Self {
        let w = TAU * freq.min(sr * 0.45) / sr;
        let (sin, cos) = w.sin_cos();
        let alpha = sin * FRAC_1_SQRT_2;
        Self::normalize(
            [(1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0],
            [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        )
    }

    fn high_pass(freq: f32, sr: f32) -> Self {
        let w = TAU * freq.min(sr * 0.45) / sr;
        let (sin, cos) = w.sin_cos();
        let alpha = sin * FRAC_1_SQRT_2;
        Self::normalize(
            [(1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0],
            [1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        )
    }
}

/// Stereo biquad, transposed direct form II.
#[derive(Clone, Debug)]
struct Biquad {
    c: Coeffs,
    z: [[f32; 2]; 2],
}

impl Biquad {
    fn new(c: Coeffs) -> Self {
        Self { c, z: [[0.0; 2]; 2] }
    }

    fn tick(&mut self, ch: usize, x: f32) -> f32 {
        let c = &self.c;
        let z = &mut self.z[ch];
        let y = c.b0 * x + z[0];
        z[0] = c.b1 * x - c.a1 * y + z[1];
        z[1] = c.b2 * x - c.a2 * y;
        y
    }

    fn process(&mut self, frame: Frame) -> Frame {
        Frame::new(self.tick(0, frame.left), self.tick(1, frame.right))
    }
}

/// Filters needed for one channel's EQ settings. Flat bands and filters
/// at their extremes are left out.
#[derive(Clone, Debug)]
pub struct EqStage {
    filters: Vec<Biquad>,
}

impl EqStage {
    /// `None` when the settings are flat.
    pub fn new(settings: &EqSettings, sample_rate: u32) -> Option<Self> {
        if settings.is_flat() {
            return None;
        }
        let sr = sample_rate as f32;
        let mut filters = Vec::new();
        if settings.high_pass_freq > 20.0 {
            filters.push(Biquad::new(Coeffs::high_pass(settings.high_pass_freq, sr)));
        }
        if settings.low != 0.0 {
            filters.push(Biquad::new(Coeffs::low_shelf(LOW_SHELF_HZ, settings.low, sr)));
        }
        if settings.mid != 0.0 {
            filters.push(Biquad::new(Coeffs::peak(MID_PEAK_HZ, settings.mid, MID_Q, sr)));
        }
        if settings.high != 0.0 {
            filters.push(Biquad::new(Coeffs::high_shelf(HIGH_SHELF_HZ, settings.high, sr)));
        }
        if settings.low_pass_freq < 20_000.0 {
            filters.push(Biquad::new(Coeffs::low_pass(settings.low_pass_freq, sr)));
        }
        Some(Self { filters })
    }

    pub fn process(&mut self, mut frame: Frame) -> Frame {
        for f in &mut self.filters {
            frame = f.process(frame);
        }
        frame
    }

    pub fn reset(&mut self) {
        for f in &mut self.filters {
            f.z = [[0.0; 2]; 2];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_ir::EqBand;

    fn sine_gain(stage: &mut EqStage, freq: f32) -> f32 {
        let sr = 44_100.0;
        let mut peak = 0.0f32;
        for n in 0..44_100 {
            let x = (TAU * freq * n as f32 / sr).sin();
            let y = stage.process(Frame::mono(x)).left;
            if n > 22_050 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn flat_settings_bypass() {
        assert!(EqStage::new(&EqSettings::default(), 44_100).is_none());
    }

    #[test]
    fn low_boost_raises_bass() {
        let mut eq = EqSettings::default();
        eq.set_band(EqBand::Low, 12.0);
        let mut stage = EqStage::new(&eq, 44_100).unwrap();
        let gain = sine_gain(&mut stage, 60.0);
        assert!(gain > 3.0, "gain {gain}");
    }

    #[test]
    fn low_pass_cuts_highs() {
        let mut eq = EqSettings::default();
        eq.set_low_pass(500.0);
        let mut stage = EqStage::new(&eq, 44_100).unwrap();
        assert!(sine_gain(&mut stage, 8000.0) < 0.05);
        let mut stage = EqStage::new(&eq, 44_100).unwrap();
        assert!(sine_gain(&mut stage, 100.0) > 0.9);
    }
}
