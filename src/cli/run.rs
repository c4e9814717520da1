//! Run command implementation.

use std::path::PathBuf;

use blue::replay::{Recording, render_ascii, render_events};
use tracing::info;

use super::output::{JsonFrame, JsonRunResult, format_run_text};
use super::{CliError, OutputFormat, load_scenario};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or run.
pub(crate) fn execute(
    scenario_path: PathBuf,
    seed: Option<u64>,
    frames: Option<u64>,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut scenario = load_scenario(&scenario_path)?;
    if let Some(seed) = seed {
        scenario.seed = seed;
    }
    if let Some(frames) = frames {
        scenario.frames = frames;
    }
    let seed = scenario.seed;

    info!(scenario = %scenario_path.display(), seed, frames = scenario.frames, "running scenario");

    let mut log = Vec::new();
    let board = scenario.run_with(seed, scenario.frames, |board, events| {
        if events.is_empty() {
            return;
        }
        let frame = board.frame_number() - 1;
        match format {
            OutputFormat::Text if !quiet => {
                println!("Frame {frame}");
                print!("{}", render_events(events));
            }
            OutputFormat::Text => {}
            OutputFormat::Json => log.push(JsonFrame { frame, events: events.clone() }),
        }
    })?;

    if let Some(save_path) = save {
        Recording::new(scenario)
            .save(&save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        info!(path = %save_path.display(), "recording saved");
    }

    match format {
        OutputFormat::Text => {
            if !quiet {
                println!();
                print!("{}", render_ascii(&board));
                println!();
            }
            print!("{}", format_run_text(seed, &board));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonRunResult::new(seed, &board, log))?;
            println!("{json}");
        }
    }

    Ok(())
}
