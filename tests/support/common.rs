//! Helpers shared by the integration tests.

#![allow(dead_code)]
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
#![allow(unreachable_pub)]

use blue::board::{Asteroid, BoardState, FrameEvents};
use blue::hex::{HexCoord, HexFacing};
use blue::instructions::Instructions;
use blue::scenario::{Placement, Scenario, drone_template, generate_scenario};
use blue::tradables::TradableType;

/// Assemble a program from the `programs` directory.
pub fn load_program(name: &str) -> Instructions {
    let path = format!("{}/programs/{name}.asm", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {path}: {e}"));
    text.parse().unwrap_or_else(|e| panic!("Failed to assemble {path}: {e}"))
}

/// A generated 20x20 board with a miner, a sentry and a wanderer.
pub fn create_test_scenario(seed: u64, frames: u64) -> Scenario {
    let programs = [load_program("miner"), load_program("sentry"), load_program("wanderer")];
    let mut scenario = generate_scenario(seed, 20, 20, &programs).unwrap();
    scenario.frames = frames;
    scenario
}

/// A miner two tiles south of a Kamacite asteroid.
pub fn create_mining_scenario() -> Scenario {
    let mut scenario = Scenario::empty(3, 12, 12).unwrap();
    scenario.asteroids.push(Asteroid::new(TradableType::Kamacite, 200, HexCoord::new(6, 4)).unwrap());
    scenario.machines.push(Placement {
        template: drone_template("Miner", load_program("miner")).unwrap(),
        board_xy: HexCoord::new(6, 6),
        facing: HexFacing::Tile0,
    });
    scenario.frames = 400;
    scenario
}

/// Run `scenario` and return every frame's events as JSON.
pub fn event_log(scenario: &Scenario, seed: u64) -> Vec<String> {
    let mut log = Vec::new();
    scenario
        .run_with(seed, scenario.frames, |_, events| log.push(serde_json::to_string(events).unwrap()))
        .unwrap();
    log
}

/// Run `scenario`, handing every frame to `observe`, and return the final board.
pub fn run<F>(scenario: &Scenario, observe: F) -> BoardState
where
    F: FnMut(&BoardState, &FrameEvents),
{
    scenario.run_with(scenario.seed, scenario.frames, observe).unwrap()
}
