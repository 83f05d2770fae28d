//! Audio frame type.

use std::ops::{Add, AddAssign, Mul};

/// A stereo audio frame, nominal range [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Mix another frame into this one.
    pub fn mix(&mut self, other: Frame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Average of both channels.
    pub fn to_mono(self) -> f32 {
        0.5 * (self.left + self.right)
    }

    pub fn is_silent(self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// Clamp both channels to [-1, 1].
    pub fn clamped(self) -> Self {
        Self {
            left: self.left.clamp(-1.0, 1.0),
            right: self.right.clamp(-1.0, 1.0),
        }
    }
}

impl Add for Frame {
    type Output = Frame;
    fn add(self, rhs: Frame) -> Frame {
        Frame::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Frame) {
        self.mix(rhs);
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;
    fn mul(self, gain: f32) -> Frame {
        Frame::new(self.left * gain, self.right * gain)
    }
}
