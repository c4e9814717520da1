//! Hexagonal board geometry.
//!
//! The public coordinate system is "odd-q" offset coordinates; axial
//! coordinates are used internally wherever neighbours or distances are
//! computed. World positions place the centre of tile (0, 0) at the origin
//! with tiles two units high.
//!
//! ```text
//!    ___       ___
//!   /0,0\___  /2,0\___
//!   \___/1,0\ \___/3,0\
//!   /0,1\___/ /2,1\___/
//!   \___/1,1\ \___/3,1\
//!       \___/     \___/
//! ```

pub mod flags;
mod coord;
mod facing;
mod game_grid;
mod geometry;
mod grid;
mod steps;

pub use coord::HexCoord;
pub use facing::{HexFacing, TurnDirection};
pub use flags::HexContentFlags;
pub use game_grid::GameHexGrid;
pub use geometry::{
    HalfLine3d, SQRT_3, TILE_INNER_RADIUS, calculate_coord, calculate_neighbour_coord,
    calculate_xy, clockwise_turn_count, closest_facing_from_angle, count_of_hexagons_inside_ring,
    facing_neighbour_coord, neighbours_facing, relative_angle, step_distance_between,
};
pub use grid::{HexGrid, HexTile, MAX_GRID_HEIGHT, MAX_GRID_WIDTH, NeighbouringTile, Neighbours};
