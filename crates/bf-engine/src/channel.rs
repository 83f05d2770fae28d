//! Per-track channel strip: voice, insert effects, EQ, then volume and pan.

use std::f32::consts::FRAC_PI_4;

use bf_ir::{EqSettings, Effect, Track};
use log::debug;

use crate::effects::EffectsChain;
use crate::eq::EqStage;
use crate::frame::Frame;
use crate::recipe::{resolve, VoiceKind};
use crate::voice::{Voice, VoiceError};

/// Equal-power pan gains for `pan` in [-1, 1].
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (theta.cos(), theta.sin())
}

fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Signal path of one track.
#[derive(Debug)]
pub struct ChannelStrip {
    id: String,
    sample_rate: u32,
    seed: u32,
    instrument: String,
    voice: Result<Voice, VoiceError>,
    effects: Vec<Effect>,
    chain: EffectsChain,
    eq: EqSettings,
    eq_stage: Option<EqStage>,
    gain: f32,
    pan: (f32, f32),
    mute: bool,
}

impl ChannelStrip {
    pub fn new(track: &Track, sample_rate: u32, seed: u32) -> Self {
        let mut strip = Self {
            id: track.id.clone(),
            sample_rate,
            seed,
            instrument: track.instrument.clone(),
            voice: Voice::new(resolve(&track.instrument), sample_rate, seed),
            effects: track.effects.clone(),
            chain: EffectsChain::build(&track.effects, sample_rate),
            eq: track.eq,
            eq_stage: EqStage::new(&track.eq, sample_rate),
            gain: 1.0,
            pan: pan_gains(0.0),
            mute: false,
        };
        strip.apply_mixer(track);
        strip
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn voice_kind(&self) -> Option<VoiceKind> {
        self.voice.as_ref().ok().map(Voice::kind)
    }

    /// Linear channel gain after the dB conversion.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn effect_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    fn apply_mixer(&mut self, track: &Track) {
        self.gain = db_to_gain(track.volume_db());
        self.pan = pan_gains(track.pan);
        self.mute = track.mute;
    }

    /// Bring the strip in line with `track`. Only parts that changed are rebuilt.
    pub fn sync(&mut self, track: &Track) {
        self.apply_mixer(track);
        if track.instrument != self.instrument {
            debug!("track {}: instrument {:?} -> {:?}", self.id, self.instrument, track.instrument);
            self.instrument = track.instrument.clone();
            self.voice = Voice::new(resolve(&track.instrument), self.sample_rate, self.seed);
        }
        if track.effects != self.effects {
            self.effects = track.effects.clone();
            self.chain = EffectsChain::build(&track.effects, self.sample_rate);
        }
        if track.eq != self.eq {
            self.eq = track.eq;
            self.eq_stage = EqStage::new(&track.eq, self.sample_rate);
        }
    }

    /// Start a note on this track's voice.
    pub fn trigger(&mut self, velocity: f32, gate_seconds: f32) -> Result<(), VoiceError> {
        match &mut self.voice {
            Ok(voice) => voice.trigger(velocity, gate_seconds),
            Err(e) => Err(e.clone()),
        }
    }

    /// Hard stop: silence the voice and clear effect tails.
    pub fn stop(&mut self) {
        if let Ok(voice) = &mut self.voice {
            voice.stop();
        }
        self.chain.reset();
        if let Some(eq) = &mut self.eq_stage {
            eq.reset();
        }
    }

    /// Render one frame of this channel's output.
    pub fn render(&mut self) -> Frame {
        let sample = match &mut self.voice {
            Ok(voice) => voice.next_sample(),
            Err(_) => 0.0,
        };
        let mut frame = self.chain.process(Frame::mono(sample));
        if let Some(eq) = &mut self.eq_stage {
            frame = eq.process(frame);
        }
        if self.mute {
            return Frame::silence();
        }
        Frame::new(
            frame.left * self.gain * self.pan.0,
            frame.right * self.gain * self.pan.1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pan_is_equal_power() {
        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < 1e-6);
        assert!((l * l + r * r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hard_pan_silences_other_side() {
        let (l, r) = pan_gains(-1.0);
        assert!((l - 1.0).abs() < 1e-6 && r.abs() < 1e-6);
        let (l, r) = pan_gains(1.0);
        assert!(l.abs() < 1e-6 && (r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_volume_keeps_finite_floor_gain() {
        let mut track = Track::new("t", "Kick");
        track.volume = 0.0;
        let strip = ChannelStrip::new(&track, 44_100, 1);
        assert!((strip.gain() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn muted_strip_is_silent() {
        let mut track = Track::new("t", "Snare");
        track.mute = true;
        let mut strip = ChannelStrip::new(&track, 44_100, 1);
        strip.trigger(1.0, 0.125).unwrap();
        assert!((0..1000).all(|_| strip.render().is_silent()));
    }

    #[test]
    fn sync_rebuilds_changed_effects_only() {
        let mut track = Track::new("t", "Snare");
        let mut strip = ChannelStrip::new(&track, 44_100, 1);
        assert!(strip.effect_names().is_empty());
        track.add_effect("delay");
        track.add_effect("reverb");
        strip.sync(&track);
        assert_eq!(strip.effect_names(), vec!["delay", "reverb"]);
        let id = track.effects[0].id.clone();
        track.toggle_effect(&id);
        strip.sync(&track);
        assert_eq!(strip.effect_names(), vec!["reverb"]);
    }

    #[test]
    fn instrument_change_swaps_voice_kind() {
        let mut track = Track::new("t", "Kick");
        let mut strip = ChannelStrip::new(&track, 44_100, 1);
        assert_eq!(strip.voice_kind(), Some(VoiceKind::Membrane));
        track.instrument = "Hi-Hat Open".into();
        strip.sync(&track);
        assert_eq!(strip.voice_kind(), Some(VoiceKind::Metal));
    }
}
