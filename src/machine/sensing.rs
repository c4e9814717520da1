//! What a machine last saw around itself.

use crate::hex::flags::{ASTEROID, BOT, SUN, TILE_VALUE_MASK};
use crate::hex::{GameHexGrid, HexCoord, HexTile};

/// Tiles found by the last completed sense, origin first, then closest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct SenseResults {
    tiles: Vec<HexTile>,
}

impl SenseResults {
    /// Replace the results with what lies within `radius` of `origin`.
    pub(crate) fn sense(&mut self, grid: &GameHexGrid, origin: HexCoord, radius: u16) {
        let mut found = Vec::new();
        grid.get_sorted_circle_contents(origin, radius, BOT | ASTEROID | SUN, &mut found);
        self.tiles.clear();
        self.tiles.push(HexTile { coord: origin, contents: grid.contents(origin) });
        self.tiles.extend(found.into_iter().filter(|t| t.coord != origin));
    }

    pub(crate) fn count(&self) -> u16 {
        u16::try_from(self.tiles.len()).unwrap_or(u16::MAX)
    }

    /// Location of result `n`, wrapping around the result count.
    pub(crate) fn location(&self, n: u16) -> HexCoord {
        self.nth(n).map_or_else(HexCoord::invalid, |t| t.coord)
    }

    /// Contents of result `n` without the sun strength bits.
    pub(crate) fn result_type(&self, n: u16) -> u16 {
        self.nth(n).map_or(0, |t| u16::from(t.contents & TILE_VALUE_MASK))
    }

    fn nth(&self, n: u16) -> Option<&HexTile> {
        if self.tiles.is_empty() {
            return None;
        }
        self.tiles.get(usize::from(n) % self.tiles.len())
    }
}
