//! Feedback delay.

use super::{blend, EffectProcessor};
use crate::frame::Frame;

/// Longest supported delay time in seconds.
const MAX_TIME: f32 = 2.0;

#[derive(Clone, Debug)]
pub struct FeedbackDelay {
    buffer: Vec<Frame>,
    pos: usize,
    feedback: f32,
    mix: f32,
}

impl FeedbackDelay {
    /// `time` in seconds, `feedback` and `mix` in [0, 1].
    pub fn new(time: f32, feedback: f32, mix: f32, sample_rate: u32) -> Self {
        let time = time.clamp(0.001, MAX_TIME);
        let len = ((time * sample_rate as f32).round() as usize).max(1);
        Self {
            buffer: vec![Frame::silence(); len],
            pos: 0,
            feedback: feedback.clamp(0.0, 0.95),
            mix: mix.clamp(0.0, 1.0),
        }
    }
}

impl EffectProcessor for FeedbackDelay {
    fn process(&mut self, input: Frame) -> Frame {
        let delayed = self.buffer[self.pos];
        self.buffer[self.pos] = input + delayed * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        blend(input, delayed, self.mix)
    }

    fn reset(&mut self) {
        self.buffer.fill(Frame::silence());
        self.pos = 0;
    }

    fn name(&self) -> &'static str {
        "delay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_arrives_after_delay_time() {
        let mut d = FeedbackDelay::new(0.01, 0.5, 1.0, 1000);
        assert!(d.process(Frame::mono(1.0)).is_silent());
        for _ in 1..10 {
            assert!(d.process(Frame::silence()).is_silent());
        }
        assert_eq!(d.process(Frame::silence()), Frame::mono(1.0));
        for _ in 1..10 {
            d.process(Frame::silence());
        }
        assert_eq!(d.process(Frame::silence()), Frame::mono(0.5));
    }

    #[test]
    fn feedback_is_capped() {
        let d = FeedbackDelay::new(0.25, 4.0, 0.3, 44_100);
        assert_eq!(d.feedback, 0.95);
    }
}
