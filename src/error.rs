//! Construction-time error types.
//!
//! Anything that builds kernel state (grids, blueprints, templates, scenarios,
//! assembly text) fails fast with a [`BlueError`]. Faults raised by a running
//! machine program are never errors: they are reported as machine events.

use thiserror::Error;

use crate::hex::HexCoord;

/// Errors raised while constructing or loading simulation state.
#[derive(Error, Debug)]
pub enum BlueError {
    /// Grid width or height outside `1..=100`, or a tile array of the wrong size.
    #[error("Grid dimensions error: {0}")]
    GridDimensions(String),

    /// The invalid tile value of a grid must have at least one bit set.
    #[error("Invalid tile value is not permitted to be zero.")]
    ZeroInvalidTileValue,

    /// A game board must be a single connected island of tiles.
    #[error("Game board must contain exactly one island of tiles, found {0}.")]
    IslandCount(u32),

    /// A coordinate was outside the board or on an off-board tile.
    #[error("Coordinate {0} is not on the board.")]
    NotOnBoard(HexCoord),

    /// Something was placed on a tile that was already occupied or reserved.
    #[error("Tile {0} is occupied.")]
    TileOccupied(HexCoord),

    /// A component, hardware or modifier description failed validation.
    #[error("Invalid component: {0}")]
    Component(String),

    /// A blueprint layout failed validation.
    #[error("Invalid blueprint: {0}")]
    Blueprint(String),

    /// A machine template or machine name was unusable.
    #[error("Invalid template: {0}")]
    Template(String),

    /// A line of assembly text could not be compiled.
    #[error("Cannot compile line {line}: \"{text}\"")]
    Assembly {
        /// One-based line number within the source text.
        line: usize,
        /// The offending text.
        text: String,
    },

    /// A scenario was structurally valid JSON but semantically wrong.
    #[error("Invalid scenario: {0}")]
    Scenario(String),

    /// I/O failure while reading or writing persisted state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON shape or syntax failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for fallible construction.
pub type BlueResult<T> = Result<T, BlueError>;
