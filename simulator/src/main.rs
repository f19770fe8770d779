//! ECG monitor simulator for the desktop.
//!
//! Drives the shared [`Pipeline`] with either a synthetic BMD101 stream or a
//! recorded byte capture. View events are logged (set `RUST_LOG=debug` or
//! `trace` for more), the auxiliary console output goes to stdout.
//!
//! # Usage
//!
//! ```bash
//! # 30 s of sinus rhythm, type 'k' after 2 s
//! simulator --arm-at 2
//!
//! # Fibrillation-like rhythm through the IIR filter, keep the bytes
//! simulator --irregular --filter 1 --arm-at 2 --dump afib.bin
//!
//! # Replay a capture
//! simulator --replay afib.bin --arm-at 2
//! ```

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

mod classifier;
mod console;
mod stream;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use ecg_common::config::{DEFAULT_PULSE_THRESHOLD, FILTER_SELECTOR_MAX};
use ecg_common::{Pipeline, PipelineConfig, SessionState};
use log::{info, warn};

use crate::classifier::{DEFAULT_WINDOW, RhythmClassifier};
use crate::console::ConsoleBoard;
use crate::stream::{RAW_FRAME_LEN, ReplayStream, Rhythm, SAMPLE_RATE_HZ, StreamConfig, SyntheticStream};

#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Drive the ECG pipeline from a synthetic or recorded BMD101 stream", long_about = None)]
struct Cli {
    /// Seconds of synthetic signal to generate
    #[arg(long, default_value_t = 30)]
    duration: u32,

    /// Initial filter selector (0-1 none, 2-3 IIR, 4-5 moving average)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=i64::from(FILTER_SELECTOR_MAX)))]
    filter: u8,

    /// Seconds into the run at which 'k' is typed on the aux console
    #[arg(long)]
    arm_at: Option<f32>,

    /// Nominal heart rate of the synthetic rhythm
    #[arg(long, default_value_t = 72)]
    bpm: u8,

    /// Generate a fibrillation-like irregular rhythm
    #[arg(long)]
    irregular: bool,

    /// Seconds before the electrodes report contact
    #[arg(long, default_value_t = 1)]
    contact_after: u32,

    /// Seed for the rhythm generator
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Raw samples (or their frame bytes when replaying) per poll
    #[arg(long, default_value_t = 1)]
    burst: usize,

    /// Window swing above which a heartbeat is flagged
    #[arg(long, default_value_t = DEFAULT_PULSE_THRESHOLD)]
    pulse_threshold: i32,

    /// Samples the stand-in classifier accumulates before deciding
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// Replay a raw BMD101 byte capture instead of synthesising
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Write every byte fed to the pipeline to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Pace the run at wall-clock speed
    #[arg(long)]
    realtime: bool,
}

/// Where sensor bytes come from.
enum Source {
    Synthetic { stream: SyntheticStream, total: u64, burst: usize },
    Replay(ReplayStream),
}

impl Source {
    fn from_cli(cli: &Cli) -> Result<Self> {
        if let Some(path) = &cli.replay {
            let bytes = std::fs::read(path).with_context(|| format!("reading capture {}", path.display()))?;
            info!("Replaying {} bytes from {}", bytes.len(), path.display());
            return Ok(Self::Replay(ReplayStream::new(bytes, cli.burst * RAW_FRAME_LEN)));
        }

        let config = StreamConfig {
            rhythm: Rhythm { bpm: cli.bpm, irregular: cli.irregular },
            seed: cli.seed,
            contact_after_s: cli.contact_after,
        };
        info!(
            "Synthesising {} s at {} bpm ({})",
            cli.duration,
            cli.bpm,
            if cli.irregular { "irregular" } else { "regular" }
        );
        Ok(Self::Synthetic {
            stream: SyntheticStream::new(&config),
            total: u64::from(cli.duration) * u64::from(SAMPLE_RATE_HZ),
            burst: cli.burst.max(1),
        })
    }

    /// Append the next burst to `out` and return the time at its end.
    fn next_burst(
        &mut self,
        out: &mut Vec<u8>,
    ) -> Option<u32> {
        match self {
            Self::Synthetic { stream, total, burst } => {
                let remaining = total.saturating_sub(stream.produced());
                if remaining == 0 {
                    return None;
                }
                stream.fill((*burst as u64).min(remaining) as usize, out);
                Some(stream.elapsed_ms() as u32)
            }
            Self::Replay(replay) => replay.next_burst(out),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = PipelineConfig {
        filter_selector: cli.filter,
        pulse_threshold: cli.pulse_threshold,
        ..PipelineConfig::new()
    };
    let mut pipeline = Pipeline::new(config).context("invalid pipeline configuration")?;
    let mut board = ConsoleBoard::new(RhythmClassifier::new(cli.window), io::stdout());
    let mut source = Source::from_cli(&cli)?;

    let mut dump = match &cli.dump {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let mut arm_at_ms = cli.arm_at.map(|s| (s * 1000.0) as u32);
    let mut burst = Vec::new();
    let mut now_ms = 0;
    let started = Instant::now();

    loop {
        burst.clear();
        let Some(t) = source.next_burst(&mut burst) else {
            break;
        };
        now_ms = t;

        if let Some(at) = arm_at_ms
            && now_ms >= at
        {
            info!("Typing 'k' at {} ms", now_ms);
            board.type_in(b"k");
            arm_at_ms = None;
        }

        if let Some(out) = dump.as_mut() {
            out.write_all(&burst).context("writing dump")?;
        }

        pipeline.poll(&burst, now_ms, &mut board);

        if cli.realtime {
            let target = started + Duration::from_millis(now_ms.into());
            if let Some(wait) = target.checked_duration_since(Instant::now()) {
                thread::sleep(wait);
            }
        }
    }

    if let Some(mut out) = dump {
        out.flush().context("flushing dump")?;
    }

    info!("Finished after {} ms of signal", now_ms);
    info!("Stats: {:?}", pipeline.stats());
    info!("Beats: {}, last HR {} bpm", board.beats(), board.heart_rate());
    match board.diagnoses().last() {
        Some(diagnosis) => info!("Diagnosis: {}", diagnosis.label()),
        None if pipeline.session_state() != SessionState::Idle => warn!("Inference still running at end of input"),
        None => info!("No inference requested"),
    }
    Ok(())
}
