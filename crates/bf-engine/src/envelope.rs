//! Per-sample ADSR envelope.

use crate::recipe::Adsr;

/// Level below which a releasing envelope is considered finished (-80 dB).
const SILENCE: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Release,
}

/// Runtime state for one ADSR.
///
/// Attack is linear; decay and release are exponential, reaching -60 dB of
/// their distance to the target after the configured time.
#[derive(Clone, Debug)]
pub struct Envelope {
    stage: Stage,
    level: f32,
    attack_step: f32,
    decay_coeff: f32,
    release_coeff: f32,
    sustain: f32,
}

fn coeff(seconds: f32, sample_rate: f32) -> f32 {
    let samples = (seconds * sample_rate).max(1.0);
    (0.001f32.ln() / samples).exp()
}

impl Envelope {
    pub fn new(adsr: &Adsr, sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        Self {
            stage: Stage::Idle,
            level: 0.0,
            attack_step: 1.0 / (adsr.attack * sr).max(1.0),
            decay_coeff: coeff(adsr.decay, sr),
            release_coeff: coeff(adsr.release, sr),
            sustain: adsr.sustain.clamp(0.0, 1.0),
        }
    }

    /// Start the attack from the current level.
    pub fn gate_on(&mut self) {
        self.stage = Stage::Attack;
    }

    pub fn gate_off(&mut self) {
        if self.stage != Stage::Idle {
            self.stage = Stage::Release;
        }
    }

    /// Hard stop.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.level = 0.0;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    /// Advance one sample and return the new level.
    pub fn next(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => {}
            Stage::Attack => {
                self.level += self.attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level = self.sustain + (self.level - self.sustain) * self.decay_coeff;
                if self.sustain == 0.0 && self.level < SILENCE {
                    self.reset();
                }
            }
            Stage::Release => {
                self.level *= self.release_coeff;
                if self.level < SILENCE {
                    self.reset();
                }
            }
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 1000;

    fn env(a: f32, d: f32, s: f32, r: f32) -> Envelope {
        Envelope::new(&Adsr::new(a, d, s, r), SR)
    }

    #[test]
    fn idle_outputs_zero() {
        let mut e = env(0.01, 0.1, 0.5, 0.1);
        assert_eq!(e.next(), 0.0);
        assert!(!e.is_active());
    }

    #[test]
    fn attack_reaches_peak_in_attack_time() {
        let mut e = env(0.01, 0.1, 0.5, 0.1);
        e.gate_on();
        let mut samples = 0;
        let mut peak = 0.0;
        while e.stage() == Stage::Attack {
            peak = e.next();
            samples += 1;
        }
        assert!((10..=11).contains(&samples), "took {samples} samples");
        assert_eq!(peak, 1.0);
    }

    #[test]
    fn decay_settles_at_sustain() {
        let mut e = env(0.001, 0.1, 0.5, 0.1);
        e.gate_on();
        let mut level = 0.0;
        for _ in 0..1000 {
            level = e.next();
        }
        assert!((level - 0.5).abs() < 1e-3);
    }

    #[test]
    fn release_goes_idle() {
        let mut e = env(0.001, 0.1, 0.5, 0.1);
        e.gate_on();
        for _ in 0..50 {
            e.next();
        }
        e.gate_off();
        for _ in 0..1000 {
            e.next();
        }
        assert!(!e.is_active());
        assert_eq!(e.next(), 0.0);
    }

    #[test]
    fn zero_sustain_finishes_during_decay() {
        let mut e = env(0.001, 0.05, 0.0, 0.05);
        e.gate_on();
        for _ in 0..500 {
            e.next();
        }
        assert!(!e.is_active());
    }
}
