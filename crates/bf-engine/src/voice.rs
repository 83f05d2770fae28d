//! Synthesis voices.
//!
//! One monophonic voice per track. The voice's [`VoiceKind`] is fixed by its
//! recipe and consulted once per sample through a single `match`.

use std::f32::consts::TAU;

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::envelope::Envelope;
use crate::recipe::{MembraneParams, MetalParams, Recipe, RecipeParams, VoiceKind, Waveform};

/// Frequency ratios of the six metallic partials.
const METAL_RATIOS: [f32; 6] = [1.0, 1.483, 1.932, 2.546, 2.630, 3.897];

const METAL_GAIN: f32 = 0.6;
const NOISE_GAIN: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoiceError {
    #[error("sample rate must be positive")]
    InvalidSampleRate,
    #[error("recipe parameter {name} is invalid: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
    #[error("velocity {0} is not finite")]
    InvalidVelocity(f32),
    #[error("gate length {0}s is invalid")]
    InvalidGate(f32),
}

/// Deterministic white noise (xorshift32).
#[derive(Clone, Debug)]
struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// One-pole filter section.
#[derive(Clone, Debug, Default)]
struct OnePole {
    alpha: f32,
    state: f32,
}

impl OnePole {
    fn new(cutoff: f32, sample_rate: f32) -> Self {
        let cutoff = cutoff.min(sample_rate * 0.45);
        Self { alpha: 1.0 - (-TAU * cutoff / sample_rate).exp(), state: 0.0 }
    }

    fn lowpass(&mut self, x: f32) -> f32 {
        self.state += self.alpha * (x - self.state);
        self.state
    }

    fn highpass(&mut self, x: f32) -> f32 {
        x - self.lowpass(x)
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[derive(Clone, Debug, Default)]
struct Partial {
    carrier_inc: f32,
    modulator_inc: f32,
    carrier_phase: f32,
    modulator_phase: f32,
}

fn oscillator(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (TAU * phase).sin(),
        Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
    }
}

fn wrap(phase: f32) -> f32 {
    phase - phase.floor()
}

fn check(name: &'static str, value: f32) -> Result<(), VoiceError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(VoiceError::InvalidParameter { name, value })
    }
}

/// A monophonic synthesis voice.
#[derive(Clone, Debug)]
pub struct Voice {
    recipe: Recipe,
    sample_rate: f32,
    envelope: Envelope,
    velocity: f32,
    /// Samples left before gate-off
    gate_remaining: u32,
    phase: f32,
    freq: f32,
    /// Per-sample multiplier of the membrane pitch sweep
    sweep_coeff: f32,
    partials: ArrayVec<Partial, 6>,
    highpass: OnePole,
    lowpass: OnePole,
    noise: NoiseSource,
}

impl Voice {
    /// Create a silent voice for `recipe`. `seed` fixes the noise sequence.
    pub fn new(recipe: Recipe, sample_rate: u32, seed: u32) -> Result<Self, VoiceError> {
        if sample_rate == 0 {
            return Err(VoiceError::InvalidSampleRate);
        }
        let sr = sample_rate as f32;
        let env = &recipe.envelope;
        check("attack", env.attack)?;
        check("decay", env.decay)?;
        check("release", env.release)?;

        let mut voice = Self {
            recipe,
            sample_rate: sr,
            envelope: Envelope::new(env, sample_rate),
            velocity: 0.0,
            gate_remaining: 0,
            phase: 0.0,
            freq: 0.0,
            sweep_coeff: 1.0,
            partials: ArrayVec::new(),
            highpass: OnePole::default(),
            lowpass: OnePole::default(),
            noise: NoiseSource::new(seed),
        };

        match recipe.params {
            RecipeParams::Membrane(m) => {
                check("base_freq", m.base_freq)?;
                check("octaves", m.octaves)?;
                check("pitch_decay", m.pitch_decay)?;
                voice.sweep_coeff = (1.0 / m.octaves).powf(1.0 / (m.pitch_decay * sr));
            }
            RecipeParams::Metal(m) => {
                check("frequency", m.frequency)?;
                check("harmonicity", m.harmonicity)?;
                check("resonance", m.resonance)?;
                check("octaves", m.octaves)?;
                voice.init_metal(&m);
            }
            RecipeParams::Tonal(t) => {
                check("freq", t.freq)?;
                voice.freq = t.freq;
            }
            RecipeParams::Noise => {}
        }
        Ok(voice)
    }

    fn init_metal(&mut self, m: &MetalParams) {
        for ratio in METAL_RATIOS {
            let carrier = m.frequency * ratio;
            self.partials.push(Partial {
                carrier_inc: carrier / self.sample_rate,
                modulator_inc: carrier * m.harmonicity / self.sample_rate,
                ..Partial::default()
            });
        }
        self.highpass = OnePole::new(m.resonance, self.sample_rate);
        self.lowpass = OnePole::new(m.resonance * m.octaves.exp2(), self.sample_rate);
    }

    pub fn kind(&self) -> VoiceKind {
        self.recipe.kind()
    }

    pub fn is_active(&self) -> bool {
        self.envelope.is_active()
    }

    /// Start a note. The envelope holds for `gate_seconds`, then releases.
    pub fn trigger(&mut self, velocity: f32, gate_seconds: f32) -> Result<(), VoiceError> {
        if !velocity.is_finite() {
            return Err(VoiceError::InvalidVelocity(velocity));
        }
        if !gate_seconds.is_finite() || gate_seconds <= 0.0 {
            return Err(VoiceError::InvalidGate(gate_seconds));
        }
        self.velocity = velocity;
        self.gate_remaining = (gate_seconds * self.sample_rate).round().max(1.0) as u32;
        if let RecipeParams::Membrane(MembraneParams { base_freq, octaves, .. }) = self.recipe.params {
            self.freq = base_freq * octaves;
            self.phase = 0.0;
        }
        self.envelope.gate_on();
        Ok(())
    }

    /// Silence immediately.
    pub fn stop(&mut self) {
        self.envelope.reset();
        self.gate_remaining = 0;
        self.highpass.reset();
        self.lowpass.reset();
    }

    /// Produce the next mono sample.
    pub fn next_sample(&mut self) -> f32 {
        if !self.envelope.is_active() {
            return 0.0;
        }
        if self.gate_remaining > 0 {
            self.gate_remaining -= 1;
            if self.gate_remaining == 0 {
                self.envelope.gate_off();
            }
        }
        let level = self.envelope.next() * self.velocity;

        let raw = match self.recipe.params {
            RecipeParams::Membrane(m) => {
                let out = oscillator(Waveform::Sine, self.phase);
                self.phase = wrap(self.phase + self.freq / self.sample_rate);
                self.freq = (self.freq * self.sweep_coeff).max(m.base_freq);
                out
            }
            RecipeParams::Noise => self.noise.next() * NOISE_GAIN,
            RecipeParams::Metal(m) => {
                let index = m.modulation_index / TAU;
                let mut sum = 0.0;
                for p in &mut self.partials {
                    let modulation = (TAU * p.modulator_phase).sin() * index;
                    let carrier = (TAU * (p.carrier_phase + modulation)).sin();
                    sum += carrier.signum();
                    p.carrier_phase = wrap(p.carrier_phase + p.carrier_inc);
                    p.modulator_phase = wrap(p.modulator_phase + p.modulator_inc);
                }
                let band = self.lowpass.lowpass(self.highpass.highpass(sum / 6.0));
                band * METAL_GAIN
            }
            RecipeParams::Tonal(t) => {
                let out = oscillator(t.waveform, self.phase);
                self.phase = wrap(self.phase + self.freq / self.sample_rate);
                out
            }
        };
        raw * level
    }
}
