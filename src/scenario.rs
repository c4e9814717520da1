//! Scenarios: everything needed to start a game, as JSON.
//!
//! A scenario names the seed, the grid, the scenery and the machines placed
//! before the first frame. Running the same scenario always produces the same
//! events.

mod generate;

pub use generate::{drone_blueprint, drone_template, generate_scenario};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{Asteroid, BoardState, FrameEvents, GameAction, Sun};
use crate::error::{BlueError, BlueResult};
use crate::hex::{GameHexGrid, HexCoord, HexFacing, HexGrid};
use crate::machine::MachineTemplate;

/// Frames run when a scenario does not say.
pub const DEFAULT_FRAMES: u64 = 1000;

const fn default_frames() -> u64 {
    DEFAULT_FRAMES
}

/// A machine on the board at the start of the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Placement {
    /// What to build.
    pub template: MachineTemplate,
    /// Where.
    pub board_xy: HexCoord,
    /// Initial facing.
    #[serde(default)]
    pub facing: HexFacing,
}

/// A complete game setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Scenario {
    /// Seed of the board's random stream.
    pub seed: u64,
    /// The tiles.
    pub grid: HexGrid,
    /// Asteroids.
    #[serde(default)]
    pub asteroids: Vec<Asteroid>,
    /// Suns.
    #[serde(default)]
    pub suns: Vec<Sun>,
    /// Machines placed on frame 0, in order.
    #[serde(default)]
    pub machines: Vec<Placement>,
    /// Frames to run.
    #[serde(default = "default_frames")]
    pub frames: u64,
}

impl Scenario {
    /// An empty `width` by `height` board.
    ///
    /// # Errors
    ///
    /// The dimensions are out of range.
    pub fn empty(seed: u64, width: u32, height: u32) -> BlueResult<Self> {
        Ok(Self {
            seed,
            grid: HexGrid::new(width, height, 0, crate::hex::flags::OFF_BOARD)?,
            asteroids: Vec::new(),
            suns: Vec::new(),
            machines: Vec::new(),
            frames: DEFAULT_FRAMES,
        })
    }

    /// Read a scenario from a JSON file.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not a scenario.
    pub fn load(path: &Path) -> BlueResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the scenario as pretty JSON.
    ///
    /// # Errors
    ///
    /// The file cannot be written.
    pub fn save(&self, path: &Path) -> BlueResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The board before its first frame, with the scenery in place.
    ///
    /// Machines are not on it yet; they arrive with [`Scenario::initial_actions`].
    ///
    /// # Errors
    ///
    /// The grid is not a single island, or scenery overlaps or lies off the
    /// board.
    pub fn build_board(&self) -> BlueResult<BoardState> {
        self.build_board_with_seed(self.seed)
    }

    /// As [`Scenario::build_board`], with another seed.
    ///
    /// # Errors
    ///
    /// As [`Scenario::build_board`].
    pub fn build_board_with_seed(&self, seed: u64) -> BlueResult<BoardState> {
        let grid = GameHexGrid::new(self.grid.clone())?;
        BoardState::new(seed, grid, self.asteroids.clone(), self.suns.clone())
    }

    /// The actions applied on frame 0: one placement per machine.
    #[must_use]
    pub fn initial_actions(&self) -> Vec<GameAction> {
        self.machines
            .iter()
            .map(|p| GameAction::AddMachine { template: p.template.clone(), xy: p.board_xy, facing: p.facing })
            .collect()
    }

    /// Catch placements that would be silently dropped on frame 0.
    ///
    /// # Errors
    ///
    /// A machine is off the board or shares a tile with another machine or
    /// with scenery.
    pub fn validate(&self) -> BlueResult<()> {
        let mut board = self.build_board()?;
        for p in &self.machines {
            let machine = crate::machine::Machine::create_machine(p.template.clone())?;
            board.add_machine_to_board(p.board_xy, p.facing, machine)?;
        }
        if self.frames == 0 {
            return Err(BlueError::Scenario("Scenario runs no frames.".into()));
        }
        Ok(())
    }

    /// Run `frames` frames on a board seeded with `seed`, handing each
    /// frame's events to `observe`. Returns the final board.
    ///
    /// # Errors
    ///
    /// The board cannot be built.
    pub fn run_with<F>(&self, seed: u64, frames: u64, mut observe: F) -> BlueResult<BoardState>
    where
        F: FnMut(&BoardState, &FrameEvents),
    {
        let mut board = self.build_board_with_seed(seed)?;
        let mut events = FrameEvents::default();
        let placements = self.initial_actions();
        for frame in 0..frames {
            let actions: &[GameAction] = if frame == 0 { &placements } else { &[] };
            board.advance_one_frame(actions, &mut events);
            observe(&board, &events);
        }
        info!(seed, frames, machines = board.machine_count(), "scenario finished");
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::tests::create_test_template;
    use crate::tradables::TradableType;
    use tempfile::NamedTempFile;

    fn create_test_scenario() -> Scenario {
        let mut s = Scenario::empty(17, 12, 12).unwrap();
        s.asteroids.push(Asteroid::new(TradableType::Panguite, 60, HexCoord::new(8, 8)).unwrap());
        s.suns.push(Sun::new(HexCoord::new(1, 10), 3).unwrap());
        s.machines.push(Placement {
            template: create_test_template("sense( 2 )\ngoto 1"),
            board_xy: HexCoord::new(4, 4),
            facing: HexFacing::Tile2,
        });
        s.frames = 20;
        s
    }

    #[test]
    fn test_scenario_json_roundtrip() {
        let s = create_test_scenario();
        let file = NamedTempFile::new().unwrap();
        s.save(file.path()).unwrap();
        let back = Scenario::load(file.path()).unwrap();
        assert_eq!(back, s);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("asteroids").is_some());
        assert_eq!(json["machines"][0]["board-xy"], serde_json::to_value(HexCoord::new(4, 4)).unwrap());
    }

    #[test]
    fn test_frames_default_when_missing() {
        let mut json = serde_json::to_value(create_test_scenario()).unwrap();
        json.as_object_mut().unwrap().remove("frames");
        let s: Scenario = serde_json::from_value(json).unwrap();
        assert_eq!(s.frames, DEFAULT_FRAMES);
    }

    #[test]
    fn test_validate_catches_overlaps() {
        let mut s = create_test_scenario();
        assert!(s.validate().is_ok());
        s.machines[0].board_xy = HexCoord::new(8, 8);
        assert!(matches!(s.validate(), Err(BlueError::TileOccupied(_))));
    }

    #[test]
    fn test_run_places_machines_on_the_first_frame() {
        let s = create_test_scenario();
        let mut frames = 0;
        let board = s
            .run_with(s.seed, s.frames, |_, events| {
                if frames == 0 {
                    assert_eq!(events.machine_events[0].kind.name(), "added-to-board");
                }
                frames += 1;
            })
            .unwrap();
        assert_eq!(frames, 20);
        assert_eq!(board.frame_number(), 20);
        assert_eq!(board.machine_count(), 1);
        assert!(board.sun_at(HexCoord::new(1, 10)).is_some());
    }
}
