//! Replay command implementation.

use std::path::PathBuf;

use blue::replay::{Recording, ReplayEngine, ReplayError, render_events};

use super::output::{JsonFrame, JsonRunResult};
use super::{CliError, OutputFormat};

/// Execute the replay command.
///
/// Without `frame` the whole recording is played back. With it, play stops
/// after that many frames and the board is shown.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or the frame is out of
/// bounds.
pub(crate) fn execute(recording_path: PathBuf, frame: Option<u64>, format: OutputFormat) -> Result<(), CliError> {
    let recording = Recording::load(&recording_path)
        .map_err(|e| CliError::new(format!("Failed to load recording {}: {e}", recording_path.display())))?;

    let mut engine = ReplayEngine::new(recording)?;
    let target = frame.unwrap_or_else(|| engine.max_frame());
    if target > engine.max_frame() {
        return Err(ReplayError::FrameOutOfBounds { requested: target, max_frame: engine.max_frame() }.into());
    }

    match format {
        OutputFormat::Text => print_text_replay(&mut engine, target),
        OutputFormat::Json => print_json_replay(&mut engine, target),
    }
}

fn print_text_replay(engine: &mut ReplayEngine, target: u64) -> Result<(), CliError> {
    while engine.frame() < target {
        let frame = engine.frame();
        let events = engine.step_forward()?;
        if !events.is_empty() {
            println!("Frame {frame}");
            print!("{}", render_events(events));
        }
    }
    println!();
    print!("{}", engine.render_ascii());
    Ok(())
}

fn print_json_replay(engine: &mut ReplayEngine, target: u64) -> Result<(), CliError> {
    let mut log = Vec::new();
    while engine.frame() < target {
        let frame = engine.frame();
        let events = engine.step_forward()?;
        if !events.is_empty() {
            log.push(JsonFrame { frame, events: events.clone() });
        }
    }
    let seed = engine.recording().scenario.seed;
    let json = serde_json::to_string_pretty(&JsonRunResult::new(seed, engine.board(), log))?;
    println!("{json}");
    Ok(())
}
