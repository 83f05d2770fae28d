//! Integration test: offline render → WAV bytes → independent decode.

use bf_engine::EngineConfig;
use bf_formats::parse_header;
use bf_formats::wav::HEADER_LEN;
use bf_ir::Pattern;
use bf_master::{render_to_wav, Controller, RenderError};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

fn kick_snare() -> Pattern {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/patterns/kick_snare.json");
    bf_formats::parse_pattern(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn empty_pattern_is_exact_silent_wav() {
    let wav = render_to_wav(&Pattern::default(), 120, 4.0, &EngineConfig::default()).unwrap();
    assert_eq!(wav.len(), 44 + 4 * 44_100 * 2 * 2);
    assert!(wav[HEADER_LEN..].iter().all(|&b| b == 0));
}

#[test]
fn all_muted_pattern_is_silent() {
    let mut pattern = kick_snare();
    for track in &mut pattern.tracks {
        track.set_mute(true);
    }
    let wav = render_to_wav(&pattern, 120, 1.0, &EngineConfig::default()).unwrap();
    assert!(wav[HEADER_LEN..].iter().all(|&b| b == 0));
}

#[test]
fn header_sizes_are_consistent() {
    let wav = render_to_wav(&kick_snare(), 120, 1.25, &EngineConfig::default()).unwrap();
    let header = parse_header(&wav).unwrap();
    let frames = (1.25f64 * 44_100.0).round() as u32;
    assert_eq!(header.data_size, frames * 2 * 2);
    assert_eq!(header.chunk_size, 36 + header.data_size);
    assert_eq!(header.byte_rate, 44_100 * 2 * 2);
    assert_eq!(header.block_align, 4);
    assert_eq!(header.bits_per_sample, 16);
}

#[test]
fn hound_decodes_the_export() {
    let wav = render_to_wav(&kick_snare(), 120, 2.0, &EngineConfig::default()).unwrap();
    let reader = hound::WavReader::new(Cursor::new(&wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 2 * 44_100 * 2);
    assert!(samples.iter().any(|&s| s != 0));
}

#[test]
fn rendering_is_deterministic() {
    let mut a = Controller::new();
    a.load_pattern(kick_snare());
    let mut b = Controller::new();
    b.load_pattern(kick_snare());
    assert_eq!(a.render_to_wav(2.0).unwrap(), b.render_to_wav(2.0).unwrap());
    assert_eq!(a.render_to_wav(2.0).unwrap(), b.render_to_wav(2.0).unwrap());
}

#[test]
fn effects_render_deterministically_too() {
    let mut ctrl = Controller::new();
    ctrl.load_pattern(kick_snare());
    ctrl.add_effect("track-1", "reverb").unwrap();
    ctrl.add_effect("track-2", "delay").unwrap();
    ctrl.add_effect("track-2", "distortion").unwrap();
    let first = ctrl.render_to_wav(1.0).unwrap();
    let second = ctrl.render_to_wav(1.0).unwrap();
    assert_eq!(first, second);
}

#[test]
fn invalid_duration_is_rejected_before_rendering() {
    let mut ctrl = Controller::new();
    ctrl.load_pattern(kick_snare());
    assert!(matches!(ctrl.render_to_wav(0.0), Err(RenderError::InvalidDuration(_))));
    assert!(matches!(ctrl.render_to_wav(-2.0), Err(RenderError::InvalidDuration(_))));
}

#[test]
fn written_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.wav");
    let wav = render_to_wav(&kick_snare(), 100, 0.5, &EngineConfig::default()).unwrap();
    fs::write(&path, &wav).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.duration(), 22_050);
}
