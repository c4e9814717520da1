//! A hex grid that knows about machines, asteroids, suns and reservations.

use serde::{Deserialize, Serialize};

use super::flags::{
    ASTEROID, BOT, HexContentFlags, MAX_SUN_STRENGTH, OFF_BOARD, RESERVED, SUN, SUN_STRENGTH,
    TILE_VALUE_MASK, is_asteroid_on_tile, is_bot_on_tile, is_empty_and_unreserved_tile,
    is_off_board_tile, is_reserved_tile, sun_strength, sun_strength_as_flags,
};
use super::geometry::{HalfLine3d, step_distance_between};
use super::grid::{HexGrid, HexTile};
use super::{HexCoord, HexFacing};
use crate::error::{BlueError, BlueResult};

/// The board's tile grid with game rules layered on top.
///
/// A tile is reserved while something occupies it or a machine is moving onto
/// it. Sun tiles are always off the board; their light is recorded as a
/// strength on the surrounding tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameHexGridRecord", into = "GameHexGridRecord")]
pub struct GameHexGrid {
    grid: HexGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GameHexGridRecord {
    grid: HexGrid,
}

impl TryFrom<GameHexGridRecord> for GameHexGrid {
    type Error = BlueError;

    fn try_from(r: GameHexGridRecord) -> BlueResult<Self> {
        GameHexGrid::new(r.grid)
    }
}

impl From<GameHexGrid> for GameHexGridRecord {
    fn from(g: GameHexGrid) -> Self {
        Self { grid: g.grid }
    }
}

impl GameHexGrid {
    /// Wrap a grid as a game board.
    ///
    /// # Errors
    ///
    /// The board tiles must form exactly one connected island.
    pub fn new(grid: HexGrid) -> BlueResult<Self> {
        match grid.number_of_islands() {
            1 => Ok(Self { grid }),
            n => Err(BlueError::IslandCount(n)),
        }
    }

    /// The underlying grid.
    #[must_use]
    pub const fn grid(&self) -> &HexGrid {
        &self.grid
    }

    /// Flags reported for tiles outside the bounds.
    #[must_use]
    pub const fn invalid_tile_value(&self) -> HexContentFlags {
        self.grid.invalid_tile_value()
    }

    /// Contents of a tile (invalid value outside the bounds).
    #[must_use]
    pub fn contents(&self, xy: HexCoord) -> HexContentFlags {
        self.grid.contents(xy)
    }

    /// Contents of the neighbour of `xy` in direction `facing`.
    #[must_use]
    pub fn get_neighbour_contents(&self, xy: HexCoord, facing: HexFacing) -> HexContentFlags {
        self.grid.get_neighbour_contents(xy, facing)
    }

    /// Accumulated sun strength on a tile, 0..=7.
    #[must_use]
    pub fn tile_sun_strength(&self, xy: HexCoord) -> u8 {
        sun_strength(self.grid.contents(xy))
    }

    fn sun_flag_contents(&self, xy: HexCoord) -> HexContentFlags {
        self.grid.contents(xy) & SUN_STRENGTH
    }

    /// True if `xy` is a board tile.
    #[must_use]
    pub fn is_on_board(&self, xy: HexCoord) -> bool {
        self.grid.is_on_board(xy)
    }

    /// True if `xy` is a board tile that is occupied or claimed.
    #[must_use]
    pub fn is_tile_reserved(&self, xy: HexCoord) -> bool {
        self.grid.is_on_board(xy) && is_reserved_tile(self.grid.contents(xy))
    }

    /// True if `xy` is a board tile free to move onto or build on.
    #[must_use]
    pub fn is_tile_empty_and_unreserved(&self, xy: HexCoord) -> bool {
        self.grid.is_on_board(xy) && is_empty_and_unreserved_tile(self.grid.contents(xy))
    }

    /// Put an asteroid on a free board tile.
    ///
    /// # Errors
    ///
    /// Fails if the tile is off the board or not free.
    pub fn place_asteroid_on_tile(&mut self, xy: HexCoord) -> BlueResult<()> {
        if !self.is_on_board(xy) {
            return Err(BlueError::NotOnBoard(xy));
        }
        if !is_empty_and_unreserved_tile(self.grid.contents(xy)) {
            return Err(BlueError::TileOccupied(xy));
        }
        let f = ASTEROID | self.sun_flag_contents(xy);
        self.grid.set_in_bounds(xy, f);
        Ok(())
    }

    /// Put a sun of `strength` on a tile, taking the tile off the board and
    /// lighting every tile within `strength` steps.
    ///
    /// Light accumulates: a tile at distance `d` gains `1 + strength - d`,
    /// capped at 7.
    ///
    /// # Errors
    ///
    /// Fails if the tile is outside the bounds or is an occupied board tile.
    pub fn place_sun_on_tile(&mut self, strength: u8, xy: HexCoord) -> BlueResult<()> {
        if !self.grid.is_in_board_bounds(xy) {
            return Err(BlueError::NotOnBoard(xy));
        }
        let here = self.grid.contents(xy);
        if !is_empty_and_unreserved_tile(here) && !is_off_board_tile(here) {
            return Err(BlueError::TileOccupied(xy));
        }

        self.grid.set_in_bounds(xy, OFF_BOARD | SUN);

        let mut tiles = Vec::new();
        self.grid
            .get_sorted_circle_contents(xy, u16::from(strength), 0, &mut tiles);
        for tile in tiles.iter().skip(1) {
            let distance = step_distance_between(tile.coord, xy);
            let lit = 1 + u16::from(sun_strength(tile.contents)) + u16::from(strength) - distance;
            let lit = u8::try_from(lit.min(u16::from(MAX_SUN_STRENGTH))).unwrap_or(MAX_SUN_STRENGTH);
            let f = sun_strength_as_flags(lit) | (tile.contents & TILE_VALUE_MASK);
            self.grid.set_in_bounds(tile.coord, f);
        }
        Ok(())
    }

    /// Mark a tile as holding a newly placed machine.
    pub fn place_bot_on_tile(&mut self, xy: HexCoord) {
        debug_assert!(self.is_tile_empty_and_unreserved(xy));
        let f = BOT | self.sun_flag_contents(xy);
        self.grid.set_in_bounds(xy, f);
    }

    /// Move a machine's flag onto a tile it had reserved.
    pub fn move_bot_from_tile_to_tile(&mut self, from: HexCoord, to: HexCoord) {
        debug_assert!(is_bot_on_tile(self.grid.contents(from)));
        debug_assert!(is_reserved_tile(self.grid.contents(to)));
        let f = self.sun_flag_contents(from);
        self.grid.set_in_bounds(from, f);
        let t = BOT | self.sun_flag_contents(to);
        self.grid.set_in_bounds(to, t);
    }

    /// Clear a machine from a tile.
    pub fn remove_bot_from_tile(&mut self, xy: HexCoord) {
        debug_assert!(is_bot_on_tile(self.grid.contents(xy)));
        let f = self.sun_flag_contents(xy);
        self.grid.set_in_bounds(xy, f);
    }

    /// Clear an asteroid from a tile.
    pub fn remove_asteroid_from_tile(&mut self, xy: HexCoord) {
        debug_assert!(is_asteroid_on_tile(self.grid.contents(xy)));
        let f = self.sun_flag_contents(xy);
        self.grid.set_in_bounds(xy, f);
    }

    /// Claim a free tile for a machine about to move onto it.
    pub fn reserve_empty_tile(&mut self, xy: HexCoord) {
        debug_assert!(self.is_tile_empty_and_unreserved(xy));
        let f = RESERVED | self.sun_flag_contents(xy);
        self.grid.set_in_bounds(xy, f);
    }

    /// Release a claimed tile that was never occupied.
    pub fn unreserve_empty_tile(&mut self, xy: HexCoord) {
        debug_assert!(self.grid.contents(xy) & RESERVED != 0);
        let f = self.sun_flag_contents(xy);
        self.grid.set_in_bounds(xy, f);
    }

    /// The in-bounds neighbour of `xy` in direction `facing`.
    #[must_use]
    pub fn try_get_neighbour_tile(&self, xy: HexCoord, facing: HexFacing) -> Option<HexCoord> {
        self.grid.try_get_neighbour_tile(xy, facing)
    }

    /// Tiles within `radius` of `xy` passing `mask`, closest first.
    pub fn get_sorted_circle_contents(
        &self,
        xy: HexCoord,
        radius: u16,
        mask: HexContentFlags,
        tiles: &mut Vec<HexTile>,
    ) {
        self.grid.get_sorted_circle_contents(xy, radius, mask, tiles);
    }

    /// Machines, asteroids and suns under the line from `a` towards `b`, no
    /// further than `max_steps` from `a`. `a` is excluded.
    pub fn contents_under_line(
        &self,
        a: HexCoord,
        b: HexCoord,
        max_steps: u16,
        out: &mut Vec<HexCoord>,
    ) {
        self.grid
            .contents_under_line(a, b, max_steps, BOT | ASTEROID | SUN, out);
    }

    /// The tile under a ray meeting the board plane `y = 0`.
    #[must_use]
    pub fn get_line_intersection(&self, line: &HalfLine3d) -> HexTile {
        self.grid.get_line_intersection(line, 0.0)
    }
}
