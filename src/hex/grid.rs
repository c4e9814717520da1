//! The bounded hex grid of content flags.

#![allow(clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

use super::geometry::{FACING_NEIGHBOURS, HalfLine3d, calculate_coord, step_distance_between};
use super::steps::hex_steps_under_line;
use super::{HexContentFlags, HexCoord, HexFacing};
use crate::error::{BlueError, BlueResult};

/// Largest permitted grid width.
pub const MAX_GRID_WIDTH: u32 = 100;
/// Largest permitted grid height.
pub const MAX_GRID_HEIGHT: u32 = 100;

/// A tile and its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexTile {
    /// Where the tile is.
    pub coord: HexCoord,
    /// What the tile holds.
    pub contents: HexContentFlags,
}

/// A neighbouring tile tagged with the facing that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbouringTile {
    /// The neighbour.
    pub tile: HexTile,
    /// Facing from the centre tile towards this neighbour.
    pub facing: HexFacing,
}

/// Up to six neighbours of a centre tile, in facing order.
#[derive(Debug, Clone, Copy)]
pub struct Neighbours {
    centre: HexTile,
    tiles: [Option<NeighbouringTile>; 6],
    len: usize,
}

impl Neighbours {
    /// The tile the neighbours surround.
    #[must_use]
    pub const fn centre(&self) -> HexTile {
        self.centre
    }

    /// Number of neighbours that passed the mask.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when no neighbour passed the mask.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over the neighbours in facing order.
    pub fn iter(&self) -> impl Iterator<Item = &NeighbouringTile> {
        self.tiles[..self.len].iter().flatten()
    }
}

/// A `width` x `height` array of tile flags in "odd-q" layout.
///
/// Reads outside the bounds yield the grid's invalid tile value. A tile whose
/// flags share any bit with the invalid value is not part of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HexGridRecord", into = "HexGridRecord")]
pub struct HexGrid {
    tiles: Vec<HexContentFlags>,
    width: u8,
    height: u8,
    invalid_tile_value: HexContentFlags,
}

/// Wire shape of a [`HexGrid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HexGridRecord {
    grid: Vec<HexContentFlags>,
    #[serde(rename = "grid-width")]
    width: u32,
    #[serde(rename = "grid-height")]
    height: u32,
    #[serde(rename = "invalid-tile-value")]
    invalid_tile_value: HexContentFlags,
}

impl TryFrom<HexGridRecord> for HexGrid {
    type Error = BlueError;

    fn try_from(r: HexGridRecord) -> BlueResult<Self> {
        HexGrid::from_tiles(r.grid, r.width, r.height, r.invalid_tile_value)
    }
}

impl From<HexGrid> for HexGridRecord {
    fn from(g: HexGrid) -> Self {
        Self {
            width: u32::from(g.width),
            height: u32::from(g.height),
            invalid_tile_value: g.invalid_tile_value,
            grid: g.tiles,
        }
    }
}

fn validate_dimension(n: u32, max: u32, what: &str) -> BlueResult<u8> {
    if n == 0 {
        return Err(BlueError::GridDimensions(format!("{what} must not be zero")));
    }
    if n > max {
        return Err(BlueError::GridDimensions(format!("{what} {n} exceeds {max}")));
    }
    u8::try_from(n).map_err(|_| BlueError::GridDimensions(format!("{what} {n} too large")))
}

impl HexGrid {
    /// Create a grid with every tile set to `default_contents`.
    ///
    /// # Errors
    ///
    /// Fails if either dimension is zero or over 100, or if the invalid tile
    /// value is zero.
    pub fn new(
        width: u32,
        height: u32,
        default_contents: HexContentFlags,
        invalid_tile_value: HexContentFlags,
    ) -> BlueResult<Self> {
        let w = validate_dimension(width, MAX_GRID_WIDTH, "width")?;
        let h = validate_dimension(height, MAX_GRID_HEIGHT, "height")?;
        let tiles = vec![default_contents; usize::from(w) * usize::from(h)];
        Self::from_tiles(tiles, width, height, invalid_tile_value)
    }

    /// Create a grid from a row-major tile array.
    ///
    /// # Errors
    ///
    /// Fails on bad dimensions, a tile count other than `width * height`, or a
    /// zero invalid tile value.
    pub fn from_tiles(
        tiles: Vec<HexContentFlags>,
        width: u32,
        height: u32,
        invalid_tile_value: HexContentFlags,
    ) -> BlueResult<Self> {
        let w = validate_dimension(width, MAX_GRID_WIDTH, "width")?;
        let h = validate_dimension(height, MAX_GRID_HEIGHT, "height")?;
        if tiles.len() != usize::from(w) * usize::from(h) {
            return Err(BlueError::GridDimensions(format!(
                "{} tiles do not fill a {w} x {h} grid",
                tiles.len()
            )));
        }
        if invalid_tile_value == 0 {
            return Err(BlueError::ZeroInvalidTileValue);
        }
        Ok(Self {
            tiles,
            width: w,
            height: h,
            invalid_tile_value,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width as i32
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height as i32
    }

    /// Tiles within the bounds, valid or not. Always `width * height`.
    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.tiles.len()
    }

    /// The flags value reported for out-of-bounds reads.
    #[must_use]
    pub const fn invalid_tile_value(&self) -> HexContentFlags {
        self.invalid_tile_value
    }

    fn index(&self, c: HexCoord) -> Option<usize> {
        if self.is_in_board_bounds(c) {
            Some(usize::from(self.width) * c.y as usize + c.x as usize)
        } else {
            None
        }
    }

    /// True if `c` lies inside the array bounds.
    #[must_use]
    pub fn is_in_board_bounds(&self, c: HexCoord) -> bool {
        c.x >= 0 && c.y >= 0 && i32::from(c.x) < self.width() && i32::from(c.y) < self.height()
    }

    /// True if `c` is in bounds and its tile is part of the board.
    #[must_use]
    pub fn is_on_board(&self, c: HexCoord) -> bool {
        self.index(c)
            .is_some_and(|i| self.tiles[i] & self.invalid_tile_value == 0)
    }

    /// Contents of `c`, or the invalid tile value outside the bounds.
    #[must_use]
    pub fn contents(&self, c: HexCoord) -> HexContentFlags {
        self.index(c).map_or(self.invalid_tile_value, |i| self.tiles[i])
    }

    /// Checked read of the contents of `c`.
    ///
    /// # Errors
    ///
    /// Fails if `c` is outside the bounds.
    pub fn contents_at(&self, c: HexCoord) -> BlueResult<HexContentFlags> {
        self.index(c)
            .map(|i| self.tiles[i])
            .ok_or(BlueError::NotOnBoard(c))
    }

    /// Overwrite the contents of `c`.
    ///
    /// # Errors
    ///
    /// Fails if `c` is outside the bounds.
    pub fn set_contents(&mut self, c: HexCoord, flags: HexContentFlags) -> BlueResult<()> {
        let i = self.index(c).ok_or(BlueError::NotOnBoard(c))?;
        self.tiles[i] = flags;
        Ok(())
    }

    /// Overwrite an in-bounds tile; writes outside the bounds are dropped.
    pub(crate) fn set_in_bounds(&mut self, c: HexCoord, flags: HexContentFlags) {
        debug_assert!(self.is_in_board_bounds(c), "write outside grid at {c}");
        if let Some(i) = self.index(c) {
            self.tiles[i] = flags;
        }
    }

    /// Number of tiles that are part of the board.
    #[must_use]
    pub fn valid_tiles_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| **t & self.invalid_tile_value == 0)
            .count()
    }

    /// The neighbour of `c` in direction `facing`, if it is within bounds.
    #[must_use]
    pub fn try_get_neighbour_tile(&self, c: HexCoord, facing: HexFacing) -> Option<HexCoord> {
        if !self.is_in_board_bounds(c) {
            return None;
        }
        let n = super::facing_neighbour_coord(c, facing);
        self.is_in_board_bounds(n).then_some(n)
    }

    /// Contents of the neighbour of `c` in direction `facing`.
    #[must_use]
    pub fn get_neighbour_contents(&self, c: HexCoord, facing: HexFacing) -> HexContentFlags {
        self.try_get_neighbour_tile(c, facing)
            .map_or(self.invalid_tile_value, |n| self.contents(n))
    }

    /// The in-bounds neighbours of `c` whose contents pass `mask`.
    ///
    /// A zero mask passes every tile. Out-of-bounds centres have no neighbours.
    #[must_use]
    pub fn get_neighbours(&self, c: HexCoord, mask: HexContentFlags) -> Neighbours {
        let mut n = Neighbours {
            centre: HexTile {
                coord: c,
                contents: self.contents(c),
            },
            tiles: [None; 6],
            len: 0,
        };

        if self.is_in_board_bounds(c) {
            for facing in HexFacing::ALL {
                let coord = super::facing_neighbour_coord(c, facing);
                if self.is_in_board_bounds(coord) {
                    let contents = self.contents(coord);
                    if mask == 0 || contents & mask != 0 {
                        n.tiles[n.len] = Some(NeighbouringTile {
                            tile: HexTile { coord, contents },
                            facing,
                        });
                        n.len += 1;
                    }
                }
            }
        }

        n
    }

    /// Fill `tiles` with the in-bounds tiles within `radius` of `c` whose
    /// contents pass `mask`, closest first.
    ///
    /// Each ring starts at the lower left and sweeps counter-clockwise. This
    /// order feeds sensing and targeting so it must not change.
    pub fn get_sorted_circle_contents(
        &self,
        c: HexCoord,
        radius: u16,
        mask: HexContentFlags,
        tiles: &mut Vec<HexTile>,
    ) {
        const RING_WALK: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

        tiles.clear();
        if !self.is_in_board_bounds(c) {
            return;
        }

        let passes = |contents: HexContentFlags| mask == 0 || contents & mask != 0;

        let centre = self.contents(c);
        if passes(centre) {
            tiles.push(HexTile {
                coord: c,
                contents: centre,
            });
        }

        let (cq, cr) = c.to_axial();
        for ring in 1..=i32::from(radius) {
            let mut q = cq - ring;
            let mut r = cr + ring;
            for (dq, dr) in RING_WALK {
                for _ in 0..ring {
                    let coord = HexCoord::from_axial(q, r);
                    if coord.is_valid() && self.is_in_board_bounds(coord) {
                        let contents = self.contents(coord);
                        if passes(contents) {
                            tiles.push(HexTile { coord, contents });
                        }
                    }
                    q += dq;
                    r += dr;
                }
            }
        }
    }

    /// Fill `out` with the tiles under the line from `a` to `b` whose contents
    /// pass `mask` and which are at most `max_steps` from `a`.
    ///
    /// `a` itself is never included, and a line from a tile to itself crosses
    /// nothing.
    pub fn contents_under_line(
        &self,
        a: HexCoord,
        b: HexCoord,
        max_steps: u16,
        mask: HexContentFlags,
        out: &mut Vec<HexCoord>,
    ) {
        out.clear();
        let start = (i32::from(a.x), i32::from(a.y));
        let end = (i32::from(b.x), i32::from(b.y));
        hex_steps_under_line(start, end, |x, y| {
            let (Ok(x), Ok(y)) = (i8::try_from(x), i8::try_from(y)) else {
                return false;
            };
            let here = HexCoord::new(x, y);
            let in_range = step_distance_between(here, a) <= max_steps;
            if in_range && self.is_in_board_bounds(here) {
                let contents = self.contents(here);
                if mask == 0 || contents & mask != 0 {
                    out.push(here);
                }
            }
            in_range
        });
    }

    /// The tile hit by a ray meeting the `y = board_y` plane, or the invalid
    /// coordinate and invalid contents when it misses the bounds.
    #[must_use]
    pub fn get_line_intersection(&self, line: &HalfLine3d, board_y: f32) -> HexTile {
        let miss = HexTile {
            coord: HexCoord::invalid(),
            contents: self.invalid_tile_value,
        };
        let Some(p) = line.y_plane_intersection(board_y) else {
            return miss;
        };
        let coord = calculate_coord(p[0], p[2]);
        if coord.is_valid() && self.is_in_board_bounds(coord) {
            HexTile {
                coord,
                contents: self.contents(coord),
            }
        } else {
            miss
        }
    }

    /// Number of separate groups of connected board tiles.
    #[must_use]
    pub fn number_of_islands(&self) -> u32 {
        let mut island_of = vec![0u32; self.tiles.len()];
        let mut islands = 0;
        let mut stack = Vec::new();

        for y in 0..self.height {
            for x in 0..self.width {
                #[allow(clippy::cast_possible_wrap)]
                let start = HexCoord::new(x as i8, y as i8);
                let Some(i) = self.index(start) else { continue };
                if !self.is_on_board(start) || island_of[i] != 0 {
                    continue;
                }

                islands += 1;
                stack.push(start);
                while let Some(t) = stack.pop() {
                    let Some(ti) = self.index(t) else { continue };
                    if island_of[ti] != 0 {
                        continue;
                    }
                    island_of[ti] = islands;
                    let (q, r) = t.to_axial();
                    for (dq, dr) in FACING_NEIGHBOURS {
                        let n = HexCoord::from_axial(q + dq, r + dr);
                        if self.is_on_board(n)
                            && let Some(ni) = self.index(n)
                            && island_of[ni] == 0
                        {
                            stack.push(n);
                        }
                    }
                }
            }
        }

        islands
    }
}
