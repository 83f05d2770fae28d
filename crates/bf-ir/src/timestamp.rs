//! Time on the sixteenth-note tick grid.

/// Scheduler ticks per quarter-note beat (sixteenth-note resolution).
pub const TICKS_PER_BEAT: u32 = 4;

/// Length of one tick in seconds at `bpm`.
pub fn seconds_per_tick(bpm: f64) -> f64 {
    60.0 / bpm / TICKS_PER_BEAT as f64
}

/// Time position in the transport.
///
/// Uses ticks as the base unit but supports sub-tick offsets for swing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Absolute tick since play started
    pub tick: u64,
    /// 0-65535 subdivision within the tick
    pub subtick: u16,
}

impl Timestamp {
    /// Create a timestamp at an exact tick boundary.
    pub const fn from_ticks(tick: u64) -> Self {
        Self { tick, subtick: 0 }
    }

    /// Create a timestamp with a fractional offset within a tick.
    ///
    /// `fraction` should be in the range [0.0, 1.0).
    pub fn with_offset(tick: u64, fraction: f32) -> Self {
        Self {
            tick,
            subtick: (fraction.clamp(0.0, 0.99999) * 65536.0) as u16,
        }
    }

    /// Position in (fractional) ticks.
    pub fn as_ticks(self) -> f64 {
        self.tick as f64 + self.subtick as f64 / 65536.0
    }

    /// Convert to seconds at a fixed tempo.
    pub fn to_seconds(self, bpm: f64) -> f64 {
        self.as_ticks() * seconds_per_tick(bpm)
    }
}

/// Transport position as reported to a display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackPosition {
    /// Monotonic position in steps since play started
    pub absolute: f64,
    /// Step within the pattern, wrapped at the pattern's step count
    pub step: u16,
}

impl PlaybackPosition {
    pub fn new(absolute: f64, steps: u16) -> Self {
        let absolute = if absolute.is_finite() { absolute.max(0.0) } else { 0.0 };
        let step = if steps == 0 { 0 } else { (absolute.floor() as u64 % steps as u64) as u16 };
        Self { absolute, step }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ordering() {
        let t1 = Timestamp::from_ticks(10);
        let t2 = Timestamp::from_ticks(20);
        let t3 = Timestamp::with_offset(10, 0.5);

        assert!(t1 < t2);
        assert!(t1 < t3);
        assert!(t3 < t2);
    }

    #[test]
    fn tick_length_at_120_bpm() {
        assert!((seconds_per_tick(120.0) - 0.125).abs() < 1e-12);
        assert!((Timestamp::from_ticks(12).to_seconds(120.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn position_wraps_at_true_step_count() {
        assert_eq!(PlaybackPosition::new(17.5, 16).step, 1);
        assert_eq!(PlaybackPosition::new(17.5, 64).step, 17);
        assert_eq!(PlaybackPosition::new(-3.0, 16).step, 0);
    }
}
