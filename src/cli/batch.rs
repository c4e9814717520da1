//! Batch command implementation.
//!
//! Runs one scenario under many seeds in parallel. Every seed is run twice and
//! the two event logs compared, and the board is checked for consistency after
//! every frame.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::PathBuf;
use std::time::Instant;

use blue::board::check_invariants;
use blue::error::BlueResult;
use blue::scenario::Scenario;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use super::output::{
    BatchStats, EventCounts, JsonBatchResult, RunSummary, count_events, format_batch_csv, format_batch_text,
};
use super::{BatchFormat, CliError, load_scenario};

/// Execute the batch command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or the results cannot be
/// serialized.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    scenario_path: PathBuf,
    runs: u64,
    seed: Option<u64>,
    frames: Option<u64>,
    threads: Option<usize>,
    format: BatchFormat,
    progress: bool,
) -> Result<(), CliError> {
    let scenario = load_scenario(&scenario_path)?;
    scenario.validate()?;

    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or(scenario.seed);
    let frames = frames.unwrap_or(scenario.frames);

    let pb = if progress {
        let pb = ProgressBar::new(runs);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs ({per_sec})")
            .map_err(|e| CliError::new(format!("Bad progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    info!(scenario = %scenario_path.display(), runs, base_seed, frames, "starting batch");
    let start = Instant::now();

    // Each thread accumulates into its own stats, merged at the end.
    let stats = (0..runs)
        .into_par_iter()
        .fold(BatchStats::default, |mut local, i| {
            let run_seed = base_seed.wrapping_add(i);
            match run_twice(&scenario, run_seed, frames) {
                Ok(run) => local.add_result(&run),
                Err(e) => {
                    warn!(seed = run_seed, error = %e, "run failed");
                    local.runs_failed += 1;
                }
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            local
        })
        .reduce(BatchStats::default, |mut a, b| {
            a.merge(&b);
            a
        });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let runs_per_sec =
        if duration.as_secs_f64() > 0.0 { stats.runs() as f64 / duration.as_secs_f64() } else { 0.0 };

    match format {
        BatchFormat::Text => {
            println!();
            print!("{}", format_batch_text(&stats));
            println!();
            println!("Duration: {:.2}s ({runs_per_sec:.1} runs/sec)", duration.as_secs_f64());
        }
        BatchFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonBatchResult::from_stats(&stats))?;
            println!("{json}");
        }
        BatchFormat::Csv => print!("{}", format_batch_csv(&stats)),
    }

    if stats.nondeterministic_seeds.is_empty() && stats.invariant_violations == 0 {
        Ok(())
    } else {
        Err(CliError::new("Batch found nondeterministic or inconsistent runs"))
    }
}

/// Run `seed` twice and compare the logs.
fn run_twice(scenario: &Scenario, seed: u64, frames: u64) -> BlueResult<RunSummary> {
    let first = run_once(scenario, seed, frames)?;
    let second = run_once(scenario, seed, frames)?;
    Ok(RunSummary {
        seed,
        frames,
        survivors: first.survivors,
        deterministic: first.digest == second.digest,
        violations: first.violations,
        event_counts: first.event_counts,
    })
}

struct SingleRun {
    digest: u64,
    survivors: usize,
    violations: usize,
    event_counts: EventCounts,
}

fn run_once(scenario: &Scenario, seed: u64, frames: u64) -> BlueResult<SingleRun> {
    let mut hasher = DefaultHasher::new();
    let mut violations = 0;
    let mut event_counts = EventCounts::new();
    let board = scenario.run_with(seed, frames, |board, events| {
        count_events(&mut event_counts, events);
        if let Ok(json) = serde_json::to_vec(events) {
            json.hash(&mut hasher);
        }
        violations += check_invariants(board).len();
    })?;
    Ok(SingleRun {
        digest: hasher.finish(),
        survivors: board.machines().filter(|m| m.is_alive()).count(),
        violations,
        event_counts,
    })
}
