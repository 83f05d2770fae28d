//! Builds a track's ordered effect chain from its descriptors.

use bf_ir::{Effect, EffectKind};
use log::debug;

use super::{Compressor, Distortion, EffectProcessor, FeedbackDelay, Reverb};
use crate::frame::Frame;

/// Enabled effects of one track, in processing order.
#[derive(Debug, Default)]
pub struct EffectsChain {
    processors: Vec<Box<dyn EffectProcessor>>,
}

impl EffectsChain {
    /// Build a chain. Disabled effects and unknown types are left out.
    pub fn build(effects: &[Effect], sample_rate: u32) -> Self {
        let processors = effects
            .iter()
            .filter(|e| e.enabled)
            .filter_map(|e| build_processor(e, sample_rate))
            .collect();
        Self { processors }
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Processor names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn process(&mut self, mut frame: Frame) -> Frame {
        for p in &mut self.processors {
            frame = p.process(frame);
        }
        frame
    }

    pub fn reset(&mut self) {
        for p in &mut self.processors {
            p.reset();
        }
    }
}

fn build_processor(effect: &Effect, sample_rate: u32) -> Option<Box<dyn EffectProcessor>> {
    let processor: Box<dyn EffectProcessor> = match &effect.kind {
        EffectKind::Reverb => Box::new(Reverb::new(
            effect.param("decay", 1.5),
            effect.param("mix", 0.3),
            sample_rate,
        )),
        EffectKind::Delay => Box::new(FeedbackDelay::new(
            effect.param("time", 0.25),
            effect.param("feedback", 0.3),
            effect.param("mix", 0.3),
            sample_rate,
        )),
        EffectKind::Distortion => Box::new(Distortion::new(
            effect.param("drive", 0.4),
            effect.param("mix", 0.5),
        )),
        EffectKind::Compression => Box::new(Compressor::new(effect.param("ratio", 4.0), sample_rate)),
        EffectKind::Other(name) => {
            debug!("skipping unknown effect type {name:?} ({})", effect.id);
            return None;
        }
    };
    Some(processor)
}
