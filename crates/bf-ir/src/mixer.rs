//! Linear gain to decibel conversion for mixer faders.

/// Smallest linear gain fed into the log conversion (-40 dB).
pub const SILENCE_FLOOR: f32 = 0.01;

/// Convert linear gain to decibels. Zero maps to negative infinity.
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

/// Convert a fader value in [0, 1] to decibels, flooring at [`SILENCE_FLOOR`]
/// so a fader at zero yields a finite level.
pub fn volume_to_db(volume: f32) -> f32 {
    let volume = if volume.is_nan() { SILENCE_FLOOR } else { volume.max(SILENCE_FLOOR) };
    gain_to_db(volume)
}
