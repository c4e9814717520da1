//! Scenario validation command implementation.

use std::path::PathBuf;

use blue::machine::Machine;

use super::{CliError, load_scenario};

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be read or would not run as
/// written.
pub(crate) fn execute(scenario_path: PathBuf) -> Result<(), CliError> {
    let scenario = load_scenario(&scenario_path)?;

    println!("Validating: {}", scenario_path.display());
    println!();

    let board = scenario.build_board();
    print_check("Board is one island of tiles", board.is_ok());
    board?;

    let mut machines = Vec::with_capacity(scenario.machines.len());
    for p in &scenario.machines {
        let machine = Machine::create_machine(p.template.clone());
        print_check(&format!("Machine {} builds", p.template.machines_name), machine.is_ok());
        machines.push(machine?);
    }

    let placed = scenario.validate();
    print_check("Placements are free and on the board", placed.is_ok());
    placed?;

    println!();
    println!("Summary:");
    println!("  Seed:       {}", scenario.seed);
    println!("  Grid:       {} x {}", scenario.grid.width(), scenario.grid.height());
    println!("  Frames:     {}", scenario.frames);
    println!("  Asteroids:  {}", scenario.asteroids.len());
    println!("  Suns:       {}", scenario.suns.len());
    println!("  Machines:   {}", machines.len());
    for (p, m) in scenario.machines.iter().zip(&machines) {
        println!(
            "    {} at {}: {} ({} lines of code)",
            m.name(),
            p.board_xy,
            m.classification(),
            p.template.boot_code.size()
        );
    }

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    println!("  {name}: {status}");
}
