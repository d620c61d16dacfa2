//! Helios - headless runner for the ecosystem simulation.

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use helios::simulation::ecosystem::{Ecosystem, EcosystemSummary};
use helios::simulation::level::LevelConfig;
use helios::simulation::params::Params;

#[derive(Parser)]
#[command(name = "helios")]
#[command(version)]
#[command(about = "Headless ecosystem simulation with hunger, predation and population goals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a level for a fixed number of ticks
    Run {
        /// Level file (JSON). Uses the built-in forest level when omitted
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Parameter overrides (JSON); missing fields keep their defaults
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "3000")]
        ticks: u64,

        /// Seconds per tick
        #[arg(long, default_value = "0.1")]
        dt: f32,

        /// Random seed for reproducibility
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Write a JSON summary here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep running after the level is won
        #[arg(long)]
        keep_going: bool,
    },

    /// Write the built-in forest level as JSON
    Init {
        /// Output path
        #[arg(short, long, default_value = "forest.json")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct RunReport {
    generated_at: String,
    seed: u64,
    ticks: u64,
    dt: f32,
    summary: EcosystemSummary,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            level,
            params,
            ticks,
            dt,
            seed,
            output,
            keep_going,
        } => run(level, params, ticks, dt, seed, output, keep_going),
        Commands::Init { output } => {
            LevelConfig::forest()
                .save_to_file(&output)
                .with_context(|| format!("writing level to {}", output.display()))?;
            info!("wrote forest level to {}", output.display());
            Ok(())
        }
    }
}

fn load_params(path: Option<PathBuf>) -> anyhow::Result<Params> {
    let Some(path) = path else {
        return Ok(Params::default());
    };
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("reading params from {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing params in {}", path.display()))
}

fn run(
    level_path: Option<PathBuf>,
    params_path: Option<PathBuf>,
    ticks: u64,
    dt: f32,
    seed: u64,
    output: Option<PathBuf>,
    keep_going: bool,
) -> anyhow::Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        bail!("dt must be a positive number, got {dt}");
    }

    let level = match &level_path {
        Some(path) => LevelConfig::from_file(path)
            .with_context(|| format!("loading level from {}", path.display()))?,
        None => LevelConfig::forest(),
    };
    let params = load_params(params_path)?;

    let mut ecosystem = Ecosystem::new(&level, params, seed).context("starting level")?;

    let mut ran = 0;
    for tick in 0..ticks {
        ecosystem
            .step(dt)
            .with_context(|| format!("simulation step {tick}"))?;
        ran = tick + 1;
        if ecosystem.is_won() && !keep_going {
            break;
        }
    }
    ecosystem.end_level();

    let summary = ecosystem.summary();
    info!(
        "{} ticks, t={:.1}s, energy {}, won: {}",
        ran, summary.time, summary.energy, summary.won
    );
    for (name, status) in &summary.goals {
        info!("  {name}: {}/{}", status.current, status.goal);
    }

    if let Some(path) = output {
        let report = RunReport {
            generated_at: Utc::now().to_rfc3339(),
            seed,
            ticks: ran,
            dt,
            summary,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json).with_context(|| format!("writing summary to {}", path.display()))?;
        info!("summary written to {}", path.display());
    }
    Ok(())
}
