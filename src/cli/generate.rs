//! Generate command implementation.

use std::path::PathBuf;

use blue::scenario::generate_scenario;
use tracing::info;

use super::{CliError, load_program};

/// Execute the generate command.
///
/// # Errors
///
/// Returns an error if a program does not assemble, the board is too small
/// for everything, or the scenario cannot be written.
pub(crate) fn execute(
    programs: Vec<PathBuf>,
    seed: u64,
    width: u32,
    height: u32,
    frames: u64,
    out: PathBuf,
) -> Result<(), CliError> {
    let code = programs.iter().map(|p| load_program(p)).collect::<Result<Vec<_>, _>>()?;

    let mut scenario = generate_scenario(seed, width, height, &code)?;
    scenario.frames = frames;
    scenario.save(&out)?;

    info!(path = %out.display(), seed, machines = code.len(), "scenario written");
    println!(
        "Wrote {} ({width} x {height}, {} asteroids, {} machines)",
        out.display(),
        scenario.asteroids.len(),
        scenario.machines.len()
    );
    Ok(())
}
