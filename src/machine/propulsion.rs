//! Fixed-point movement between tile centres.

use crate::blueprint::Hardware;
use crate::constants::{INT32_TILE_WIDTH, MAX_MACHINE_MOVE_SPEED, MIN_MACHINE_MOVE_SPEED};
use crate::fixed_angle::FixedAngle;
use crate::hex::{GameHexGrid, HexCoord, HexFacing, TurnDirection};

use super::events::PositionInfo;
use super::turning::TurningSystem;

/// Moves a machine whole tiles along its facing and turns it between
/// facings.
///
/// `distance` is measured from the current tile's centre along the facing.
/// Adjacent centres are two tile widths apart, so a machine changes tile when
/// `distance` passes one tile width. Every tile a machine is about to enter
/// is reserved first; a blocked tile makes it slow to a stop at the centre of
/// the tile it is on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Propulsion {
    advancing: bool,
    tiles_wanted: u16,
    tiles_advanced: u16,
    accel: i32,
    next_tile: HexCoord,
    stop_at_centre: bool,
    turning: TurningSystem,
    xy: HexCoord,
    distance: i32,
    speed: i32,
    thrust: i32,
    max_speed: i32,
}

impl Propulsion {
    /// Propulsion for `hw`. Immobile hardware gets a system that never moves.
    pub(crate) fn new(hw: &Hardware) -> Self {
        if !hw.is_mobile() {
            return Self::default();
        }
        let max_speed = hw
            .max_possible_speed()
            .clamp(MIN_MACHINE_MOVE_SPEED, MAX_MACHINE_MOVE_SPEED);
        Self {
            turning: TurningSystem::new(hw.turn_power(), hw.max_possible_turn_speed()),
            thrust: hw.thrust_power().clamp(MIN_MACHINE_MOVE_SPEED, max_speed),
            max_speed,
            ..Self::default()
        }
    }

    /// Stand still at the centre of `xy`.
    pub(crate) fn reset(&mut self, xy: HexCoord, facing: HexFacing) {
        self.advancing = false;
        self.tiles_wanted = 0;
        self.tiles_advanced = 0;
        self.accel = 0;
        self.next_tile = xy;
        self.stop_at_centre = false;
        self.turning.reset(facing);
        self.xy = xy;
        self.distance = 0;
        self.speed = 0;
    }

    pub(crate) const fn xy(&self) -> HexCoord {
        self.xy
    }

    pub(crate) const fn facing(&self) -> HexFacing {
        self.turning.facing()
    }

    #[allow(dead_code)]
    pub(crate) const fn angle(&self) -> FixedAngle {
        self.turning.angle()
    }

    pub(crate) const fn is_advancing(&self) -> bool {
        self.advancing
    }

    pub(crate) const fn is_turning(&self) -> bool {
        self.turning.is_turning()
    }

    pub(crate) const fn is_moving(&self) -> bool {
        self.advancing || self.turning.is_turning()
    }

    pub(crate) const fn tiles_advanced(&self) -> u16 {
        self.tiles_advanced
    }

    /// The tile being moved onto, if a move is under way.
    pub(crate) fn reserved_tile(&self) -> Option<HexCoord> {
        (self.advancing && self.next_tile != self.xy).then_some(self.next_tile)
    }

    /// The facing after `n` turns in `direction`, from the current facing.
    pub(crate) fn facing_after_n_turns(&self, direction: TurnDirection, n: u16) -> HexFacing {
        self.facing().turned(direction.sign() * i32::from(n % 6))
    }

    pub(crate) fn start_n_face_turns(&mut self, direction: TurnDirection, n: u16) {
        self.turning.start_n_face_turns(direction, n);
    }

    /// Begin moving `n` tiles forward. Nothing happens unless the first tile
    /// is free.
    pub(crate) fn start_n_tile_move(&mut self, grid: &mut GameHexGrid, n: u16) {
        self.tiles_wanted = n;
        self.tiles_advanced = 0;
        if n == 0 || self.thrust == 0 {
            return;
        }
        if let Some(next) = grid.try_get_neighbour_tile(self.xy, self.facing())
            && grid.is_tile_empty_and_unreserved(next)
        {
            grid.reserve_empty_tile(next);
            self.next_tile = next;
            self.accel = self.thrust;
            self.stop_at_centre = false;
            self.advancing = true;
            self.speed = self.accel;
        }
    }

    /// One tick of movement, updating the grid as tiles are entered.
    pub(crate) fn tick(&mut self, grid: &mut GameHexGrid) {
        if self.turning.is_turning() {
            self.turning.advance();
        } else if self.advancing {
            self.tick_advancing(grid);
        }
    }

    fn tick_advancing(&mut self, grid: &mut GameHexGrid) {
        let old_distance = self.distance;
        self.distance += self.speed;
        self.speed = (self.speed + self.accel).clamp(MIN_MACHINE_MOVE_SPEED, self.max_speed);

        if self.stop_at_centre && old_distance < 0 && self.distance >= 0 {
            self.distance = 0;
            self.speed = 0;
            self.accel = 0;
            self.advancing = false;
        } else if self.distance > INT32_TILE_WIDTH {
            grid.move_bot_from_tile_to_tile(self.xy, self.next_tile);
            self.xy = self.next_tile;
            self.distance -= 2 * INT32_TILE_WIDTH;
            self.tiles_advanced += 1;

            if self.tiles_advanced >= self.tiles_wanted {
                self.decelerate_to_centre();
            } else {
                match grid.try_get_neighbour_tile(self.xy, self.facing()) {
                    Some(next) if grid.is_tile_empty_and_unreserved(next) => {
                        grid.reserve_empty_tile(next);
                        self.next_tile = next;
                    }
                    _ => self.decelerate_to_centre(),
                }
            }
        }
    }

    fn decelerate_to_centre(&mut self) {
        self.stop_at_centre = true;
        self.next_tile = self.xy;
        if self.distance < 0 {
            let speed = i64::from(self.speed);
            let a = (speed * speed) / (2 * i64::from(self.distance));
            self.accel = i32::try_from(a).unwrap_or(-MAX_MACHINE_MOVE_SPEED);
        } else {
            self.distance = 0;
            self.speed = 0;
            self.accel = 0;
            self.advancing = false;
        }
    }

    pub(crate) const fn position_info(&self) -> PositionInfo {
        PositionInfo {
            xy: self.xy,
            angle: self.turning.angle(),
            distance: self.distance,
            speed: self.speed,
            turn_speed: self.turning.speed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::tests::create_test_blueprint;
    use crate::hex::HexGrid;
    use crate::hex::flags::OFF_BOARD;

    fn create_test_grid() -> GameHexGrid {
        GameHexGrid::new(HexGrid::new(8, 8, 0, OFF_BOARD).unwrap()).unwrap()
    }

    fn create_test_propulsion(grid: &mut GameHexGrid, xy: HexCoord, facing: HexFacing) -> Propulsion {
        let bp = create_test_blueprint();
        let mut p = Propulsion::new(bp.hardware_of_blueprint());
        p.thrust = 100_000;
        p.max_speed = MAX_MACHINE_MOVE_SPEED;
        grid.place_bot_on_tile(xy);
        p.reset(xy, facing);
        p
    }

    fn tick_until_still(p: &mut Propulsion, grid: &mut GameHexGrid) -> u32 {
        let mut ticks = 0;
        while p.is_moving() {
            p.tick(grid);
            ticks += 1;
            assert!(ticks < 10_000, "move never finished");
        }
        ticks
    }

    #[test]
    fn test_advance_two_tiles() {
        let mut grid = create_test_grid();
        let start = HexCoord::new(2, 5);
        let mut p = create_test_propulsion(&mut grid, start, HexFacing::Tile0);
        p.start_n_tile_move(&mut grid, 2);
        assert!(p.is_advancing());
        assert!(grid.is_tile_reserved(HexCoord::new(2, 4)));
        tick_until_still(&mut p, &mut grid);
        assert_eq!(p.xy(), HexCoord::new(2, 3));
        assert_eq!(p.tiles_advanced(), 2);
        assert_eq!(p.position_info().distance, 0);
        assert!(grid.is_tile_empty_and_unreserved(start));
        assert!(!grid.is_tile_empty_and_unreserved(HexCoord::new(2, 3)));
    }

    #[test]
    fn test_blocked_tile_prevents_start() {
        let mut grid = create_test_grid();
        grid.place_asteroid_on_tile(HexCoord::new(2, 4)).unwrap();
        let mut p = create_test_propulsion(&mut grid, HexCoord::new(2, 5), HexFacing::Tile0);
        p.start_n_tile_move(&mut grid, 3);
        assert!(!p.is_advancing());
        assert_eq!(p.tiles_advanced(), 0);
    }

    #[test]
    fn test_stops_before_obstacle() {
        let mut grid = create_test_grid();
        grid.place_asteroid_on_tile(HexCoord::new(2, 2)).unwrap();
        let mut p = create_test_propulsion(&mut grid, HexCoord::new(2, 5), HexFacing::Tile0);
        p.start_n_tile_move(&mut grid, 5);
        tick_until_still(&mut p, &mut grid);
        assert_eq!(p.xy(), HexCoord::new(2, 3));
        assert_eq!(p.tiles_advanced(), 2);
    }

    #[test]
    fn test_edge_of_board_stops_movement() {
        let mut grid = create_test_grid();
        let mut p = create_test_propulsion(&mut grid, HexCoord::new(2, 0), HexFacing::Tile0);
        p.start_n_tile_move(&mut grid, 1);
        assert!(!p.is_moving());
    }

    #[test]
    fn test_immobile_propulsion() {
        let mut grid = create_test_grid();
        let mut p = Propulsion::default();
        grid.place_bot_on_tile(HexCoord::new(1, 1));
        p.reset(HexCoord::new(1, 1), HexFacing::Tile3);
        p.start_n_tile_move(&mut grid, 1);
        p.start_n_face_turns(TurnDirection::Clockwise, 1);
        assert!(!p.is_moving());
        assert_eq!(p.facing(), HexFacing::Tile3);
    }
}
