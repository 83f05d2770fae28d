//! Canonical instrument names and their display colors.

/// Instruments in the order padding and generation assign them.
pub const INSTRUMENTS: [&str; 8] = [
    "Kick",
    "Snare",
    "Hi-Hat Closed",
    "Hi-Hat Open",
    "Clap",
    "Rim",
    "Tom High",
    "Tom Low",
];

pub const INSTRUMENT_COLORS: [&str; 8] = [
    "hsl(280, 85%, 58%)",
    "hsl(160, 70%, 55%)",
    "hsl(50, 95%, 60%)",
    "hsl(200, 80%, 60%)",
    "hsl(340, 75%, 68%)",
    "hsl(32, 85%, 65%)",
    "hsl(280, 60%, 65%)",
    "hsl(220, 70%, 60%)",
];

/// Palette color for the track at `index`, cycling.
pub fn color_for_index(index: usize) -> &'static str {
    INSTRUMENT_COLORS[index % INSTRUMENT_COLORS.len()]
}
