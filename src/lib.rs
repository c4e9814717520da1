// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Blue: a deterministic hex-board simulation kernel for programmable machines.
//!
//! Machines are built from blueprints and run small bytecode programs. Each
//! frame every machine moves, survives or dies, and executes instructions;
//! the board then resolves what they asked for (shots, broadcasts, trades,
//! builds) in a fixed order, so a seed and a scenario always replay exactly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Scenario / Replay / Batch runner  │
//! ├─────────────────────────────────────┤
//! │   Board: frame loop, event queue    │
//! ├─────────────────────────────────────┤
//! │   Machine VM + hardware             │
//! ├─────────────────────────────────────┤
//! │   Hex grid, pathfinder, tradables   │
//! └─────────────────────────────────────┘
//! ```

pub mod blueprint;
pub mod board;
pub mod combat;
pub mod constants;
pub mod error;
pub mod fixed_angle;
pub mod hex;
pub mod instructions;
pub mod machine;
pub mod pathfinder;
pub mod replay;
pub mod rng;
pub mod scenario;
pub mod tradables;

pub use error::{BlueError, BlueResult};

// Re-export key types at crate root for convenience
pub use board::{BoardState, FrameEvents, GameAction};
pub use hex::{HexCoord, HexFacing};
pub use instructions::Instructions;
pub use machine::{Machine, MachineEvent, MachineEventKind, MachineId, MachineTemplate};
pub use scenario::Scenario;
