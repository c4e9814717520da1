//! Grid-independent hex geometry: world positions, neighbours and distances.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use super::{HexCoord, HexFacing};

/// `sqrt(3)`, the horizontal distance between adjacent column centres.
pub const SQRT_3: f32 = 1.732_050_8;

/// Radius of the circle inscribed in a tile. Tiles are two units high.
pub const TILE_INNER_RADIUS: f32 = 1.0;

/// Axial `(q, r)` offsets to each neighbour, indexed by facing.
pub(crate) const FACING_NEIGHBOURS: [(i32, i32); 6] =
    [(0, -1), (1, -1), (1, 0), (0, 1), (-1, 1), (-1, 0)];

/// World-space centre of a tile on the board plane.
#[must_use]
pub fn calculate_xy(c: HexCoord) -> [f32; 2] {
    let col = i32::from(c.x);
    let row = i32::from(c.y);
    [col as f32 * SQRT_3, (2 * row + (col & 1)) as f32]
}

/// The tile whose centre is nearest to world point `(x, y)`.
///
/// The result is unbounded and may lie outside any particular grid.
#[must_use]
pub fn calculate_coord(x: f32, y: f32) -> HexCoord {
    const CANDIDATES: [(i32, i32); 7] = [(0, 0), (1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

    let ax = x / SQRT_3;
    let ay = 0.5 * (y - x / SQRT_3);
    let fx = (ax + 0.5).floor() as i32;
    let fy = (ay + 0.5).floor() as i32;

    let mut closest = (fx, fy);
    let mut closest_distance = f32::MAX;
    for (dq, dr) in CANDIDATES {
        let q = fx + dq;
        let r = fy + dr;
        let dx = x - q as f32 * SQRT_3;
        let dy = y - (2 * r + q) as f32;
        let d = dx * dx + dy * dy;
        if d < closest_distance {
            closest_distance = d;
            closest = (q, r);
        }
    }

    HexCoord::from_axial(closest.0, closest.1)
}

/// The neighbour of `c` in direction `facing`.
#[must_use]
pub fn facing_neighbour_coord(c: HexCoord, facing: HexFacing) -> HexCoord {
    calculate_neighbour_coord(c, facing, 1)
}

/// The tile `n` steps from `c` in direction `facing`.
#[must_use]
pub fn calculate_neighbour_coord(c: HexCoord, facing: HexFacing, n: i32) -> HexCoord {
    let (q, r) = c.to_axial();
    let (dq, dr) = FACING_NEIGHBOURS[usize::from(facing.index())];
    HexCoord::from_axial(q + n * dq, r + n * dr)
}

/// The facing from `c` towards the adjacent tile `neighbour`, if they touch.
#[must_use]
pub fn neighbours_facing(c: HexCoord, neighbour: HexCoord) -> Option<HexFacing> {
    let (cq, cr) = c.to_axial();
    let (nq, nr) = neighbour.to_axial();
    let delta = (nq - cq, nr - cr);
    FACING_NEIGHBOURS
        .iter()
        .position(|d| *d == delta)
        .map(|i| HexFacing::ALL[i])
}

/// Number of moves between two tiles, ignoring board contents.
#[must_use]
pub fn step_distance_between(a: HexCoord, b: HexCoord) -> u16 {
    let (aq, ar) = a.to_axial();
    let (bq, br) = b.to_axial();
    let dq = aq - bq;
    let dr = ar - br;
    let ds = -dq - dr;
    dq.abs().max(dr.abs()).max(ds.abs()) as u16
}

/// Tiles inside a hexagonal ring of `radius`: 1, 7, 19, 37...
#[must_use]
pub const fn count_of_hexagons_inside_ring(radius: u32) -> u32 {
    1 + 3 * radius * (radius + 1)
}

/// World angle from `from` towards `to` in `[0, 2pi)`, measured from +x
/// towards +y (down the board).
#[must_use]
pub fn relative_angle(from: HexCoord, to: HexCoord) -> f32 {
    let a = calculate_xy(from);
    let b = calculate_xy(to);
    let angle = (b[1] - a[1]).atan2(b[0] - a[0]);
    if angle < 0.0 { angle + TAU } else { angle }
}

/// Facing whose direction is closest to a world angle in `[0, 2pi]`.
///
/// Each facing owns the sixty degree sector centred on its neighbour
/// direction; facing 2 points at thirty degrees.
#[must_use]
pub fn closest_facing_from_angle(angle: f32) -> HexFacing {
    let sector = (angle.rem_euclid(TAU) / (PI / 3.0)).floor() as i32;
    HexFacing::from_index(sector.min(5) + 2)
}

/// Clockwise face turns (0..=5) needed for a machine at `from` facing
/// `facing` to bring `to` into its facing sector.
#[must_use]
pub fn clockwise_turn_count(from: HexCoord, facing: HexFacing, to: HexCoord) -> u32 {
    if from == to {
        return 0;
    }
    let wanted = u32::from(closest_facing_from_angle(relative_angle(from, to)).index());
    let now = u32::from(facing.index());
    if wanted >= now { wanted - now } else { wanted + 6 - now }
}

/// A ray in world space. The board lies in the `y = board_y` plane with board
/// x and y mapped to world x and z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfLine3d {
    /// Start point.
    pub origin: [f32; 3],
    /// Direction; need not be normalised.
    pub direction: [f32; 3],
}

impl HalfLine3d {
    /// The point where the ray meets the plane `y = plane_y`, if it does.
    #[must_use]
    pub fn y_plane_intersection(&self, plane_y: f32) -> Option<[f32; 3]> {
        let dy = self.direction[1];
        if dy.abs() < f32::EPSILON {
            return None;
        }
        let t = (plane_y - self.origin[1]) / dy;
        if t < 0.0 {
            return None;
        }
        Some([
            self.origin[0] + t * self.direction[0],
            plane_y,
            self.origin[2] + t * self.direction[2],
        ])
    }
}
