//! Blue CLI - Command-line interface for running and inspecting Blue boards.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Blue - A deterministic hex-board simulation of programmable machines
#[derive(Parser, Debug)]
#[command(name = "blue")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scenario and print its events
    Run {
        /// Scenario file (JSON)
        #[arg(required = true)]
        scenario: std::path::PathBuf,

        /// Random seed (default: the scenario's)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Frames to run (default: the scenario's)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save recording to file
        #[arg(long)]
        save: Option<std::path::PathBuf>,

        /// Suppress frame-by-frame output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded game
    Replay {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: std::path::PathBuf,

        /// Stop after this many frames and show the board
        #[arg(short, long)]
        frame: Option<u64>,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check that a scenario would run as written
    Validate {
        /// Scenario file (JSON)
        #[arg(required = true)]
        scenario: std::path::PathBuf,
    },

    /// Generate a scenario with one stock drone per program
    Generate {
        /// Assembly source files, one drone each
        #[arg(required = true, num_args = 1..)]
        programs: Vec<std::path::PathBuf>,

        /// Random seed
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Board width in tiles
        #[arg(long, default_value = "24")]
        width: u32,

        /// Board height in tiles
        #[arg(long, default_value = "24")]
        height: u32,

        /// Frames the scenario runs for
        #[arg(short, long, default_value = "1000")]
        frames: u64,

        /// Where to write the scenario
        #[arg(short, long, required = true)]
        out: std::path::PathBuf,
    },

    /// Run many seeds of a scenario in parallel and aggregate statistics
    Batch {
        /// Scenario file (JSON)
        #[arg(required = true)]
        scenario: std::path::PathBuf,

        /// Number of runs (default: 100)
        #[arg(short, long, default_value = "100")]
        runs: u64,

        /// Starting seed (increments for each run, default: the scenario's)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Frames per run (default: the scenario's)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text, json, or csv
        #[arg(long, default_value = "text")]
        format: cli::BatchFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blue=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Run { scenario, seed, frames, format, save, quiet } => {
            cli::run::execute(scenario, seed, frames, format, save, quiet)
        }

        Commands::Replay { recording, frame, format } => cli::replay::execute(recording, frame, format),

        Commands::Validate { scenario } => cli::validate::execute(scenario),

        Commands::Generate { programs, seed, width, height, frames, out } => {
            cli::generate::execute(programs, seed, width, height, frames, out)
        }

        Commands::Batch { scenario, runs, seed, frames, threads, format, progress } => {
            cli::batch::execute(scenario, runs, seed, frames, threads, format, progress)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
