//! Instrument label to synthesis recipe resolution.
//!
//! Labels are matched case-insensitively by substring, first match wins:
//! kick, snare/clap, hat, tom, rim, then the melodic fallback. All recipe
//! constants live in this file.

/// Which synthesis voice a recipe drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceKind {
    /// Sine with a fast downward pitch sweep
    Membrane,
    /// White noise burst
    Noise,
    /// Inharmonic FM partials through a band filter
    Metal,
    /// Plain oscillator
    Tonal,
}

/// Oscillator shape for pitched voices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// ADSR times in seconds, sustain as a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self { attack, decay, sustain, release }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MembraneParams {
    /// Resting pitch in Hz
    pub base_freq: f32,
    /// Sweep start as a multiple of the resting pitch
    pub octaves: f32,
    /// Sweep time in seconds
    pub pitch_decay: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetalParams {
    /// Fundamental in Hz; every metal hit sounds at C6
    pub frequency: f32,
    pub harmonicity: f32,
    pub modulation_index: f32,
    /// High-pass cutoff in Hz
    pub resonance: f32,
    /// Pass band width above `resonance`, in octaves
    pub octaves: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TonalParams {
    pub waveform: Waveform,
    pub freq: f32,
}

/// Kind-specific parameters, tagged by kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecipeParams {
    Membrane(MembraneParams),
    Noise,
    Metal(MetalParams),
    Tonal(TonalParams),
}

/// A fixed synthesis recipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recipe {
    pub envelope: Adsr,
    pub params: RecipeParams,
}

impl Recipe {
    pub fn kind(&self) -> VoiceKind {
        match self.params {
            RecipeParams::Membrane(_) => VoiceKind::Membrane,
            RecipeParams::Noise => VoiceKind::Noise,
            RecipeParams::Metal(_) => VoiceKind::Metal,
            RecipeParams::Tonal(_) => VoiceKind::Tonal,
        }
    }
}

const C2: f32 = 65.406;
const C3: f32 = 130.813;
const C4: f32 = 261.626;
const C6: f32 = 1046.502;

const KICK: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.4, 0.01, 1.4),
    params: RecipeParams::Membrane(MembraneParams {
        base_freq: C2,
        octaves: 6.0,
        pitch_decay: 0.05,
    }),
};

const NOISE_HIT: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.2, 0.0, 0.2),
    params: RecipeParams::Noise,
};

const HAT_PARAMS: MetalParams = MetalParams {
    frequency: C6,
    harmonicity: 5.1,
    modulation_index: 32.0,
    resonance: 4000.0,
    octaves: 1.5,
};

const OPEN_HAT: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.3, 0.0, 0.3),
    params: RecipeParams::Metal(HAT_PARAMS),
};

const CLOSED_HAT: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.1, 0.0, 0.05),
    params: RecipeParams::Metal(HAT_PARAMS),
};

const TOM: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.3, 0.0, 0.8),
    params: RecipeParams::Membrane(MembraneParams {
        base_freq: C3,
        octaves: 4.0,
        pitch_decay: 0.08,
    }),
};

const RIM: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.05, 0.0, 0.05),
    params: RecipeParams::Metal(MetalParams {
        frequency: C6,
        harmonicity: 3.1,
        modulation_index: 16.0,
        resonance: 3000.0,
        octaves: 1.0,
    }),
};

const MELODIC: Recipe = Recipe {
    envelope: Adsr::new(0.001, 0.1, 0.0, 0.1),
    params: RecipeParams::Tonal(TonalParams {
        waveform: Waveform::Triangle,
        freq: C4,
    }),
};

/// Resolve an instrument label to its recipe.
pub fn resolve(label: &str) -> Recipe {
    let label = label.to_lowercase();
    if label.contains("kick") {
        KICK
    } else if label.contains("snare") || label.contains("clap") {
        NOISE_HIT
    } else if label.contains("hat") {
        if label.contains("open") {
            OPEN_HAT
        } else {
            CLOSED_HAT
        }
    } else if label.contains("tom") {
        TOM
    } else if label.contains("rim") {
        RIM
    } else {
        MELODIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kick_is_membrane() {
        let r = resolve("Kick");
        assert_eq!(r.kind(), VoiceKind::Membrane);
        assert_eq!(r.envelope, Adsr::new(0.001, 0.4, 0.01, 1.4));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(resolve("808 KICK deep").kind(), VoiceKind::Membrane);
        assert_eq!(resolve("Hand Clap").kind(), VoiceKind::Noise);
        assert_eq!(resolve("snare 2").kind(), VoiceKind::Noise);
    }

    #[test]
    fn open_hat_rings_longer_than_closed() {
        let open = resolve("Hi-Hat Open");
        let closed = resolve("Hi-Hat Closed");
        assert_eq!(open.kind(), VoiceKind::Metal);
        assert_eq!(closed.kind(), VoiceKind::Metal);
        assert_eq!((closed.envelope.decay, closed.envelope.release), (0.1, 0.05));
        assert_eq!((open.envelope.decay, open.envelope.release), (0.3, 0.3));
    }

    #[test]
    fn tom_sits_above_kick_with_shorter_release() {
        let (RecipeParams::Membrane(kick), RecipeParams::Membrane(tom)) =
            (resolve("kick").params, resolve("Tom Low").params)
        else {
            panic!("expected membrane recipes");
        };
        assert!(tom.base_freq > kick.base_freq);
        assert_eq!(resolve("tom").envelope.release, 0.8);
    }

    #[test]
    fn rim_is_short_metal() {
        let r = resolve("Rim");
        assert_eq!(r.kind(), VoiceKind::Metal);
        assert_eq!((r.envelope.decay, r.envelope.release), (0.05, 0.05));
    }

    #[test]
    fn metal_recipes_sound_at_c6() {
        for label in ["Hi-Hat Closed", "Hi-Hat Open", "Rim"] {
            let RecipeParams::Metal(m) = resolve(label).params else {
                panic!("{label} should be metal");
            };
            assert_eq!(m.frequency, C6);
        }
    }

    #[test]
    fn unknown_falls_back_to_triangle() {
        let r = resolve("Cowbell");
        assert_eq!(r.kind(), VoiceKind::Tonal);
        assert!(matches!(
            r.params,
            RecipeParams::Tonal(TonalParams { waveform: Waveform::Triangle, .. })
        ));
    }

    #[test]
    fn resolution_is_deterministic() {
        for label in ["Kick", "Snare", "Hi-Hat Open", "Rim", "Tom High", "Pad"] {
            assert_eq!(resolve(label), resolve(label));
        }
    }
}
