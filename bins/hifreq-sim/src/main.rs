//! hifreq simulation driver.
//!
//! Loads a simulation config, builds the generator dictionaries, binds the
//! vertex provider and drives one decay stream, writing each readout window
//! as a JSON line.

mod config;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hifreq_core::constants::KEY_SEED;
use hifreq_core::types::PrimaryEvent;
use hifreq_stream::{DecayStreamEngine, VertexProvider};
use serde::Serialize;
use tracing::info;

use crate::config::SimConfig;

/// Windowed decay streams from a high-activity source.
#[derive(Parser, Debug)]
#[command(
    name = "hifreq-sim",
    version,
    about = "Stream readout windows from a high-activity radioactive source"
)]
struct Args {
    /// Simulation config file (TOML)
    #[arg(long, short, default_value = "hifreq.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Produce readout windows as JSON lines.
    Run {
        /// Number of windows to produce
        #[arg(long, short = 'n', default_value_t = 10)]
        windows: u64,

        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Override the stream seed from the config
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the resolved configuration.
    Describe,
}

/// One output line.
#[derive(Serialize)]
struct WindowLine<'a> {
    index: u64,
    #[serde(flatten)]
    event: &'a PrimaryEvent,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, &args.log_format);

    let cfg = SimConfig::load(&args.config)?;
    info!(config = %args.config.display(), stream = %cfg.name, "configuration loaded");

    match args.command {
        Command::Run {
            windows,
            output,
            seed,
        } => run(cfg, windows, output, seed),
        Command::Describe => describe(&cfg),
    }
}

fn run(mut cfg: SimConfig, windows: u64, output: Option<PathBuf>, seed: Option<u64>) -> Result<()> {
    if let Some(seed) = seed {
        let seed = i64::try_from(seed).context("seed does not fit in a signed 64-bit integer")?;
        cfg.stream.set(KEY_SEED, seed);
    }
    let (decay_generators, vertex_generators) = cfg.registries()?;

    let vertices = VertexProvider::shared(format!("{}_vg", cfg.name));
    vertices
        .lock()
        .initialize(&cfg.vertex, &vertex_generators)
        .context("failed to bind vertex provider")?;

    let mut engine = DecayStreamEngine::new(cfg.name.clone(), vertices);
    engine
        .initialize(&cfg.stream, &decay_generators)
        .context("failed to initialize decay stream")?;

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut particles = 0usize;
    let mut empty = 0u64;
    for index in 0..windows {
        let event = engine.next_window()?;
        particles += event.len();
        if event.is_empty() {
            empty += 1;
        }
        serde_json::to_writer(&mut out, &WindowLine { index, event: &event })?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let mean = if windows > 0 {
        particles as f64 / windows as f64
    } else {
        0.0
    };
    info!(
        stream = %engine.name(),
        windows,
        particles,
        empty_windows = empty,
        mean_particles_per_window = mean,
        max_delay_s = engine.max_delay_time().unwrap_or(0.0),
        clock_s = engine.current_time().unwrap_or(0.0),
        pending = engine.pending_len(),
        "run complete"
    );
    engine.reset();
    Ok(())
}

fn describe(cfg: &SimConfig) -> Result<()> {
    let (decay_generators, vertex_generators) = cfg.registries()?;
    println!("{}", serde_json::to_string_pretty(cfg)?);
    info!(
        decay_generators = ?decay_generators.names().collect::<Vec<_>>(),
        vertex_generators = ?vertex_generators.names().collect::<Vec<_>>(),
        "dictionaries"
    );
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so that window output on stdout stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(io::stderr))
            .init();
    }
}
