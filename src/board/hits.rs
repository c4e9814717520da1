//! What a straight shot or sight line meets first.

use super::BoardState;
use crate::hex::flags::{ASTEROID, BOT};
use crate::hex::{GameHexGrid, HexCoord, HexTile, calculate_xy};

/// Collision radius of a machine, in world units.
pub const MACHINE_HIT_RADIUS: f32 = 0.75;

/// Collision radius of an asteroid, in world units.
pub const ASTEROID_HIT_RADIUS: f32 = 1.0;

/// Finds the first solid object along a line across the board.
///
/// This is the only view of the board a machine gets for line of fire. The
/// board lends its [`GameHexGrid`] to each machine every frame through
/// [`MachineContext::grid`](crate::machine::MachineContext::grid), so
/// machines never depend on [`BoardState`].
pub trait HitByLine {
    /// The first machine or asteroid cut by the line from `from` through
    /// `target`, looking no further than `max_range` steps from `from`.
    fn find_first_hit_by_line(&self, from: HexCoord, target: HexCoord, max_range: u16) -> Option<HexTile>;
}

impl HitByLine for GameHexGrid {
    fn find_first_hit_by_line(&self, from: HexCoord, target: HexCoord, max_range: u16) -> Option<HexTile> {
        let mut under = Vec::new();
        self.contents_under_line(from, target, max_range, &mut under);
        let a = calculate_xy(from);
        let b = calculate_xy(target);
        under.into_iter().find_map(|coord| {
            let contents = self.contents(coord);
            let radius = if contents & BOT != 0 {
                MACHINE_HIT_RADIUS
            } else if contents & ASTEROID != 0 {
                ASTEROID_HIT_RADIUS
            } else {
                return None;
            };
            line_cuts_circle(a, b, calculate_xy(coord), radius).then_some(HexTile { coord, contents })
        })
    }
}

impl HitByLine for BoardState {
    fn find_first_hit_by_line(&self, from: HexCoord, target: HexCoord, max_range: u16) -> Option<HexTile> {
        self.grid.find_first_hit_by_line(from, target, max_range)
    }
}

// The line is unbounded; a degenerate line cuts only circles around its point.
fn line_cuts_circle(a: [f32; 2], b: [f32; 2], centre: [f32; 2], radius: f32) -> bool {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let (cx, cy) = (centre[0] - a[0], centre[1] - a[1]);
    let len = dx.hypot(dy);
    if len <= f32::EPSILON {
        return cx.hypot(cy) < radius;
    }
    (dx * cy - dy * cx).abs() / len < radius
}
