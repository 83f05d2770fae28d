//! Integration test: exchange JSON tolerance and lossless persistence.

use bf_formats::generator::{apply_swing, fallback_pattern, pad_tracks, parse_response};
use bf_formats::{export_pattern, parse_pattern};
use bf_ir::{EffectKind, INSTRUMENTS};
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> Vec<u8> {
    fs::read(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/patterns").join(name)).unwrap()
}

#[test]
fn envelope_response_is_normalized() {
    let generated = parse_response(&fixture("generated_envelope.json")).unwrap();
    let pattern = &generated.pattern;

    assert_eq!(pattern.bpm, 120, "missing bpm defaults to 120");
    assert_eq!(pattern.steps, 16);
    assert_eq!(pattern.tracks.len(), 3, "import never pads");
    assert_eq!(generated.metadata.unwrap()["genre"], "house");

    let hat = &pattern.tracks[1];
    assert_eq!(hat.id, "track-2");
    assert_eq!(hat.volume, 0.8);
    let steps: Vec<(u16, f32)> = hat.notes.iter().map(|n| (n.step, n.velocity)).collect();
    assert_eq!(steps, vec![(2, 1.0)], "zero velocity and out of range steps are dropped");

    let gong = &pattern.tracks[2];
    assert!(gong.notes.is_empty(), "missing notes mean an empty track");
    assert_eq!(gong.effects[0].kind, EffectKind::Other("chorus".into()));
}

#[test]
fn plain_import_ignores_metadata() {
    let pattern = parse_pattern(&fixture("generated_envelope.json")).unwrap();
    assert_eq!(pattern.tracks[0].notes.len(), 2);
}

#[test]
fn export_then_import_is_lossless() {
    let mut pattern = parse_pattern(&fixture("generated_envelope.json")).unwrap();
    pattern.tracks[0].set_pan(-0.4);
    pattern.tracks[0].add_effect("delay");
    apply_swing(&mut pattern, 0.5);

    let json = export_pattern(&pattern).unwrap();
    assert_eq!(parse_pattern(&json).unwrap(), pattern);
}

#[test]
fn malformed_json_is_the_only_error() {
    assert!(parse_pattern(b"{ not json").is_err());
    assert!(parse_pattern(b"[1, 2, 3]").is_err());
    assert!(parse_pattern(b"{}").unwrap().tracks.is_empty());
}

#[test]
fn padded_fallback_uses_instrument_order() {
    let mut pattern = fallback_pattern();
    pad_tracks(&mut pattern, 1.0);
    assert_eq!(pattern.tracks.len(), 8);
    for (track, name) in pattern.tracks.iter().zip(INSTRUMENTS) {
        assert_eq!(track.instrument, name);
    }
}
