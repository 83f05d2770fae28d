//! beatforge command line: offline render, live playback and pattern export.
//!
//! Usage:
//!   beatforge render pattern.json -o out.wav --duration 8
//!   beatforge play pattern.json --seconds 10
//!   beatforge export pattern.json
//!   beatforge demo --swing 0.3

mod config;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use std::{fs, thread};

use anyhow::{bail, Context, Result};
use bf_formats::generator::{apply_swing, fallback_pattern, pad_tracks};
use bf_ir::{seconds_per_tick, Pattern};
use bf_master::Controller;
use clap::{Parser, Subcommand};
use log::info;

use crate::config::FileConfig;

#[derive(Parser)]
#[command(name = "beatforge", version, about = "Step sequencer playback and offline rendering")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a pattern to a WAV file
    Render {
        /// Pattern JSON (exchange format, bare or enveloped)
        input: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Length in seconds (default: one pass through the pattern)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Tempo override
        #[arg(short, long)]
        bpm: Option<u32>,

        /// Sample rate in Hz
        #[arg(short, long)]
        sample_rate: Option<u32>,

        /// Channel count, 1 or 2
        #[arg(short, long)]
        channels: Option<u16>,
    },

    /// Play a pattern on the default output device
    Play {
        input: PathBuf,

        /// Tempo override
        #[arg(short, long)]
        bpm: Option<u32>,

        /// Stop after this many seconds (default: play until interrupted)
        #[arg(long)]
        seconds: Option<f64>,
    },

    /// Print the normalized pattern JSON
    Export {
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the built-in fallback pattern
    Demo {
        /// Swing amount in [0, 1]
        #[arg(long, default_value = "0.0")]
        swing: f32,

        /// Pad to the track count this complexity implies
        #[arg(long)]
        complexity: Option<f32>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_pattern(path: &Path, bpm: Option<u32>) -> Result<Pattern> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut pattern = bf_formats::parse_pattern(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    if let Some(bpm) = bpm {
        pattern.bpm = bpm;
    }
    Ok(pattern)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, bytes).with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            writeln!(stdout)?;
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Commands::Render { input, output, duration, bpm, sample_rate, channels } => {
            let pattern = load_pattern(&input, bpm.or(file.bpm))?;
            let mut engine = file.engine.clone();
            if let Some(rate) = sample_rate {
                engine.sample_rate = rate;
            }
            if let Some(channels) = channels {
                engine.channels = channels;
            }
            let duration = duration
                .or(file.duration)
                .unwrap_or_else(|| pattern.steps as f64 * seconds_per_tick(pattern.bpm as f64));

            let mut ctrl = Controller::with_config(engine);
            ctrl.load_pattern(pattern);
            let rendered = ctrl.render(duration)?;
            for track in &ctrl.pattern().tracks {
                info!("{} ({}): {} triggers", track.id, track.instrument, rendered.trigger_count(&track.id));
            }
            let wav = rendered.to_wav()?;
            fs::write(&output, &wav).with_context(|| format!("writing {}", output.display()))?;
            println!("Rendered {duration:.2} s ({} bytes) to {}", wav.len(), output.display());
            ctrl.dispose();
        }

        Commands::Play { input, bpm, seconds } => {
            let pattern = load_pattern(&input, bpm.or(file.bpm))?;
            if let Some(s) = seconds {
                if !s.is_finite() || s <= 0.0 {
                    bail!("--seconds must be positive, got {s}");
                }
            }
            let steps = pattern.steps;
            let mut ctrl = Controller::with_config(file.engine);
            ctrl.load_pattern(pattern);
            ctrl.play().context("starting live playback")?;
            println!("Playing... (Ctrl-C to quit)");

            let started = Instant::now();
            while ctrl.is_playing() {
                if seconds.is_some_and(|s| started.elapsed().as_secs_f64() >= s) {
                    break;
                }
                print!("\rStep: {:02} / {steps}", ctrl.position().step + 1);
                let _ = std::io::stdout().flush();
                thread::sleep(Duration::from_millis(10));
            }
            ctrl.dispose();
            println!("\rDone.          ");
        }

        Commands::Export { input, output } => {
            let pattern = load_pattern(&input, file.bpm)?;
            let json = bf_formats::export_pattern(&pattern)?;
            write_output(output.as_deref(), &json)?;
        }

        Commands::Demo { swing, complexity } => {
            let mut pattern = fallback_pattern();
            if let Some(c) = complexity {
                pad_tracks(&mut pattern, c);
            }
            apply_swing(&mut pattern, swing);
            write_output(None, &bf_formats::export_pattern(&pattern)?)?;
        }
    }
    Ok(())
}
