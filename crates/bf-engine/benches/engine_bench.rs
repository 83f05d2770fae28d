use bf_engine::{Engine, EngineConfig};
use bf_ir::{EffectKind, NoteEvent, Pattern, Track, INSTRUMENTS};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Eight tracks, every other step filled, a couple of effects.
fn busy_pattern() -> Pattern {
    let mut pattern = Pattern::new(128, 16);
    for (i, name) in INSTRUMENTS.iter().enumerate() {
        let mut track = Track::new(format!("track-{}", i + 1), *name);
        track.notes = (0..16).step_by(2).map(|s| NoteEvent::new(s, 0.8)).collect();
        if i % 3 == 0 {
            track.add_effect(EffectKind::Reverb);
        }
        if i % 4 == 1 {
            track.add_effect(EffectKind::Delay);
        }
        pattern.tracks.push(track);
    }
    pattern
}

fn bench_render_one_second(c: &mut Criterion) {
    let config = EngineConfig::default();
    let pattern = busy_pattern();
    c.bench_function("render_1s_8_tracks", |b| {
        b.iter(|| {
            let mut engine = Engine::new(pattern.clone(), &config);
            engine.play();
            for _ in 0..config.sample_rate {
                black_box(engine.render_frame());
            }
        })
    });
}

fn bench_empty_pattern(c: &mut Criterion) {
    let config = EngineConfig::default();
    c.bench_function("render_1s_empty", |b| {
        b.iter(|| {
            let mut engine = Engine::new(Pattern::default(), &config);
            engine.play();
            black_box(engine.render_frames(config.sample_rate as usize));
        })
    });
}

criterion_group!(benches, bench_render_one_second, bench_empty_pattern);
criterion_main!(benches);
