//! Game replay and viewing system.
//!
//! Because games are 100% deterministic, a replay needs only the scenario and
//! the actions players issued, keyed by the frame they were applied on. No
//! state deltas are stored. To view frame N, re-run the board from frame 0.
//!
//! # Time Travel
//!
//! - **Forward**: run one more frame
//! - **Backward**: re-run from frame 0 to (`current_frame` - 1)
//! - **Jump to frame N**: re-run from frame 0 to N

mod render;

pub use render::{render_ascii, render_events};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::{BoardState, FrameEvents, GameAction};
use crate::error::{BlueError, BlueResult};
use crate::scenario::Scenario;

/// A scenario plus every action issued while it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// The setup, including the machines placed on frame 0.
    pub scenario: Scenario,
    /// Later actions, with the frame each was applied on.
    #[serde(default)]
    pub actions: Vec<(u64, GameAction)>,
}

impl Recording {
    /// A recording of `scenario` with no extra actions.
    #[must_use]
    pub const fn new(scenario: Scenario) -> Self {
        Self { scenario, actions: Vec::new() }
    }

    /// Record `action` for `frame`. Actions on the same frame keep the order
    /// they were recorded in.
    pub fn record(&mut self, frame: u64, action: GameAction) {
        let at = self.actions.partition_point(|(f, _)| *f <= frame);
        self.actions.insert(at, (frame, action));
    }

    /// Everything applied on `frame`: the placements on frame 0, then the
    /// recorded actions.
    #[must_use]
    pub fn actions_for_frame(&self, frame: u64) -> Vec<GameAction> {
        let mut actions = if frame == 0 { self.scenario.initial_actions() } else { Vec::new() };
        actions.extend(self.actions.iter().filter(|(f, _)| *f == frame).map(|(_, a)| a.clone()));
        actions
    }

    /// Save recording to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if file operations fail.
    pub fn save(&self, path: &Path) -> BlueResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load recording from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a recording.
    pub fn load(path: &Path) -> BlueResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Error type for replay operations.
#[derive(Debug)]
pub enum ReplayError {
    /// The scenario could not be turned into a board.
    Board(BlueError),
    /// Frame number out of bounds.
    FrameOutOfBounds {
        /// Requested frame.
        requested: u64,
        /// Last frame of the recording.
        max_frame: u64,
    },
    /// Every recorded frame has been played.
    Finished,
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Board(e) => write!(f, "Cannot build board: {e}"),
            Self::FrameOutOfBounds { requested, max_frame } => {
                write!(f, "Frame {requested} out of bounds (max: {max_frame})")
            }
            Self::Finished => write!(f, "Replay is already finished"),
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<BlueError> for ReplayError {
    fn from(e: BlueError) -> Self {
        Self::Board(e)
    }
}

/// Replay engine - steps through a recording deterministically.
///
/// Since games are deterministic, this engine can:
/// - Step forward by running one frame
/// - Step backward by replaying from frame 0
/// - Jump to any frame by replaying from frame 0
pub struct ReplayEngine {
    recording: Recording,
    board: BoardState,
    events: FrameEvents,
}

impl std::fmt::Debug for ReplayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayEngine")
            .field("frame", &self.board.frame_number())
            .field("is_finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl ReplayEngine {
    /// Create a new replay engine from a recording, before frame 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be built.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at_frame(recording, 0)
    }

    /// Create a new replay engine with `target_frame` frames already run.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be built.
    pub fn new_at_frame(recording: Recording, target_frame: u64) -> Result<Self, ReplayError> {
        let board = recording.scenario.build_board()?;
        let mut engine = Self { recording, board, events: FrameEvents::default() };
        let target = target_frame.min(engine.max_frame());
        while engine.board.frame_number() < target {
            engine.run_frame();
        }
        Ok(engine)
    }

    /// Get the recording.
    #[must_use]
    pub const fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.board.frame_number()
    }

    /// The last frame of the recording.
    #[must_use]
    pub const fn max_frame(&self) -> u64 {
        self.recording.scenario.frames
    }

    /// Current board.
    #[must_use]
    pub const fn board(&self) -> &BoardState {
        &self.board
    }

    /// Events of the most recently run frame.
    #[must_use]
    pub const fn events(&self) -> &FrameEvents {
        &self.events
    }

    /// Check if every recorded frame has been run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.frame() >= self.max_frame()
    }

    /// Run one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay is finished.
    pub fn step_forward(&mut self) -> Result<&FrameEvents, ReplayError> {
        if self.is_finished() {
            return Err(ReplayError::Finished);
        }
        self.run_frame();
        Ok(&self.events)
    }

    /// Step backward one frame.
    ///
    /// This replays from frame 0 to (`current_frame` - 1).
    ///
    /// # Errors
    ///
    /// Returns an error if no frame has been run yet.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        if self.frame() == 0 {
            return Err(ReplayError::FrameOutOfBounds { requested: 0, max_frame: self.max_frame() });
        }
        self.goto_frame(self.frame() - 1)
    }

    /// Jump to a specific frame.
    ///
    /// This replays from frame 0 to the target frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is out of bounds.
    pub fn goto_frame(&mut self, target_frame: u64) -> Result<(), ReplayError> {
        if target_frame > self.max_frame() {
            return Err(ReplayError::FrameOutOfBounds { requested: target_frame, max_frame: self.max_frame() });
        }
        let recording = self.recording.clone();
        *self = Self::new_at_frame(recording, target_frame)?;
        Ok(())
    }

    /// Render current state to ASCII for terminal viewing.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        render_ascii(&self.board)
    }

    fn run_frame(&mut self) {
        let actions = self.recording.actions_for_frame(self.board.frame_number());
        self.board.advance_one_frame(&actions, &mut self.events);
    }
}
