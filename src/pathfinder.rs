//! A* route finding over the game board.
//!
//! Searches run to completion when requested and their results are parked
//! under a [`SearchId`] until the requesting machine collects them. An id that
//! is unknown (never issued, already collected or cancelled) simply finds
//! nothing.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use tracing::trace;

use crate::hex::flags::{ASTEROID, BOT, RESERVED, is_off_board_tile};
use crate::hex::{
    GameHexGrid, HexContentFlags, HexCoord, HexFacing, TurnDirection, facing_neighbour_coord,
    neighbours_facing, step_distance_between,
};
use crate::instructions::Instruction;
use crate::instructions::opcode::{ADVANCE, TURN, VALUE_ARG0, VALUE_ARG1};

/// Each unit of tile cost outweighs one face turn this many times.
const CONTENT_COST_FACTOR: u32 = 4;

/// Highest cost a tile category may be given.
pub const MAX_PATH_COST: u8 = 255;

/// Per-machine movement costs for each kind of tile. A cost of zero makes
/// that kind of tile impassable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathCosts {
    costs: [u8; 3],
}

impl Default for PathCosts {
    fn default() -> Self {
        Self { costs: [1, 3, 0] }
    }
}

impl PathCosts {
    /// Index of the cost of an empty tile.
    pub const UNOCCUPIED: u16 = 0;
    /// Index of the cost of a tile holding (or claimed by) a machine.
    pub const BOT: u16 = 1;
    /// Index of the cost of a tile holding an asteroid.
    pub const ASTEROID: u16 = 2;

    /// Set the cost for tile kind `tile_type % 3`, capped at [`MAX_PATH_COST`].
    pub fn set_cost(&mut self, tile_type: u16, weight: u16) {
        self.costs[usize::from(tile_type % 3)] = weight.min(u16::from(MAX_PATH_COST)) as u8;
    }

    /// Cost for tile kind `tile_type % 3`.
    #[must_use]
    pub const fn cost(&self, tile_type: u16) -> u8 {
        self.costs[(tile_type % 3) as usize]
    }

    /// Cost of entering a tile with these contents.
    #[must_use]
    pub fn cost_of_contents(&self, contents: HexContentFlags) -> u32 {
        let kind = if is_off_board_tile(contents) {
            return 0;
        } else if contents & ASTEROID != 0 {
            2
        } else if contents & (BOT | RESERVED) != 0 {
            1
        } else {
            0
        };
        u32::from(self.costs[kind])
    }
}

/// Handle to a finished search held by a [`HexPathfinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchId(u32);

/// What to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRequest {
    /// Starting tile.
    pub start: HexCoord,
    /// Goal tile. If occupied, arriving next to it counts as arriving.
    pub goal: HexCoord,
    /// Facing at the start, used to cost the first turns.
    pub facing: HexFacing,
    /// Tiles further than `search_radius` from this are never considered.
    pub search_centre: HexCoord,
    /// Zero finds nothing unless the start is the goal.
    pub search_radius: u16,
    /// When non-zero the path is cut to at most `1 + path_limit` tiles.
    pub path_limit: u16,
}

#[derive(Debug)]
struct SearchResult {
    path: Vec<HexCoord>,
    facing: HexFacing,
}

/// Board-owned route finding service shared by all machines.
#[derive(Debug, Default)]
pub struct HexPathfinder {
    results: BTreeMap<SearchId, SearchResult>,
    next_id: u32,
}

impl HexPathfinder {
    /// Create an idle pathfinder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a search and keep its result until collected.
    pub fn search_for_path_between(
        &mut self,
        request: &PathRequest,
        grid: &GameHexGrid,
        costs: &PathCosts,
    ) -> SearchId {
        let id = SearchId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let path = find_path(request, grid, costs);
        trace!(?id, start = %request.start, goal = %request.goal, len = path.len(), "path search");
        self.results.insert(id, SearchResult { path, facing: request.facing });
        id
    }

    /// Collect the tiles of a finished search, start and end included. Empty
    /// when no route was found; `None` for an unknown id.
    pub fn take_path(&mut self, id: SearchId) -> Option<Vec<HexCoord>> {
        self.results.remove(&id).map(|r| r.path)
    }

    /// Collect a finished search as turn and advance instructions.
    pub fn take_path_instructions(&mut self, id: SearchId) -> Option<Vec<Instruction>> {
        self.results
            .remove(&id)
            .map(|r| make_path_instructions(&r.path, r.facing))
    }

    /// Forget a search.
    pub fn cancel(&mut self, id: SearchId) {
        self.results.remove(&id);
    }

    /// Number of results waiting to be collected.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.results.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unseen,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    g: u32,
    parent: HexCoord,
    state: NodeState,
}

struct Search<'a> {
    request: &'a PathRequest,
    grid: &'a GameHexGrid,
    costs: &'a PathCosts,
    width: usize,
    nodes: Vec<Node>,
    goal_is_vacant: bool,
}

impl Search<'_> {
    fn slot(&self, xy: HexCoord) -> usize {
        self.width * xy.y as usize + xy.x as usize
    }

    fn node(&self, xy: HexCoord) -> Node {
        self.nodes[self.slot(xy)]
    }

    fn node_mut(&mut self, xy: HexCoord) -> &mut Node {
        let i = self.slot(xy);
        &mut self.nodes[i]
    }

    fn arrived(&self, xy: HexCoord) -> bool {
        if self.goal_is_vacant {
            xy == self.request.goal
        } else {
            step_distance_between(self.request.goal, xy) == 1
        }
    }

    fn facing_at(&self, xy: HexCoord) -> HexFacing {
        if xy == self.request.start {
            self.request.facing
        } else {
            neighbours_facing(self.node(xy).parent, xy).unwrap_or(self.request.facing)
        }
    }

    /// Zero when the move is impossible.
    fn cost_of_moving(&self, from: HexCoord, to: HexCoord) -> u32 {
        let content_cost = self.costs.cost_of_contents(self.grid.contents(to));
        if content_cost == 0 {
            return 0;
        }
        let turns = if from == self.request.start {
            0
        } else {
            let now = i32::from(self.facing_at(from).index());
            let wanted = neighbours_facing(from, to).map_or(now, |f| i32::from(f.index()));
            let d = (wanted - now).rem_euclid(6);
            d.min(6 - d).min(3) as u32
        };
        content_cost * CONTENT_COST_FACTOR + turns
    }

    fn heuristic(&self, xy: HexCoord) -> u32 {
        u32::from(step_distance_between(self.request.goal, xy)) * CONTENT_COST_FACTOR
    }

    fn build_path(&self, end: HexCoord) -> Vec<HexCoord> {
        let mut path = vec![end];
        let mut xy = end;
        while xy != self.request.start {
            xy = self.node(xy).parent;
            path.push(xy);
        }
        path.reverse();
        if self.request.path_limit > 0 {
            path.truncate(1 + usize::from(self.request.path_limit));
        }
        path
    }

    fn run(&mut self) -> Vec<HexCoord> {
        let start = self.request.start;
        let mut open = BinaryHeap::new();
        self.node_mut(start).state = NodeState::Open;
        open.push(Reverse((self.heuristic(start), start, 0u32)));

        while let Some(Reverse((_, xy, g))) = open.pop() {
            let node = self.node(xy);
            if node.state != NodeState::Open || node.g != g {
                continue;
            }
            if self.arrived(xy) {
                return self.build_path(xy);
            }
            self.node_mut(xy).state = NodeState::Closed;

            for facing in HexFacing::ALL {
                let n = facing_neighbour_coord(xy, facing);
                if !self.grid.is_on_board(n)
                    || step_distance_between(n, self.request.search_centre)
                        > self.request.search_radius
                {
                    continue;
                }
                let cost = self.cost_of_moving(xy, n);
                if cost == 0 {
                    continue;
                }
                let g_n = g + cost;
                let neighbour = self.node(n);
                if neighbour.state != NodeState::Unseen && g_n >= neighbour.g {
                    continue;
                }
                *self.node_mut(n) = Node { g: g_n, parent: xy, state: NodeState::Open };
                open.push(Reverse((g_n + self.heuristic(n), n, g_n)));
            }
        }
        Vec::new()
    }
}

/// Find a route for `request`. The path holds both ends, or is empty when no
/// route exists. A start equal to the goal gives a one-tile path.
#[must_use]
pub fn find_path(request: &PathRequest, grid: &GameHexGrid, costs: &PathCosts) -> Vec<HexCoord> {
    if request.start == request.goal {
        return vec![request.start];
    }
    let board = grid.grid();
    if !board.is_in_board_bounds(request.start) || !grid.is_on_board(request.goal) {
        return Vec::new();
    }
    let width = board.width() as usize;
    let unseen = Node { g: 0, parent: HexCoord::invalid(), state: NodeState::Unseen };
    let mut search = Search {
        request,
        grid,
        costs,
        width,
        nodes: vec![unseen; board.grid_size()],
        goal_is_vacant: grid.is_tile_empty_and_unreserved(request.goal),
    };
    search.run()
}

fn advance_instruction(n: u16) -> Instruction {
    Instruction::from_asm(ADVANCE | VALUE_ARG0, n, 0, 0)
}

fn turn_instruction(now: HexFacing, wanted: HexFacing) -> Instruction {
    let clockwise = (i32::from(wanted.index()) - i32::from(now.index())).rem_euclid(6) as u16;
    let (count, direction) = if clockwise > 3 {
        (6 - clockwise, TurnDirection::CounterClockwise)
    } else {
        (clockwise, TurnDirection::Clockwise)
    };
    Instruction::from_asm(TURN | VALUE_ARG0 | VALUE_ARG1, count, direction.value(), 0)
}

/// Turn and advance instructions that drive a machine along `path`, which
/// starts at the machine's own tile facing `facing`.
#[must_use]
pub fn make_path_instructions(path: &[HexCoord], facing: HexFacing) -> Vec<Instruction> {
    let mut code = Vec::new();
    let Some(&first) = path.first() else {
        return code;
    };
    let mut facing = facing;
    let mut current = first;
    let mut advances = 0u16;
    let mut i = 1;
    while i < path.len() {
        if facing_neighbour_coord(current, facing) == path[i] {
            current = path[i];
            advances += 1;
            i += 1;
            continue;
        }
        let Some(wanted) = neighbours_facing(current, path[i]) else {
            break;
        };
        if advances > 0 {
            code.push(advance_instruction(advances));
            advances = 0;
        }
        code.push(turn_instruction(facing, wanted));
        facing = wanted;
    }
    if advances > 0 {
        code.push(advance_instruction(advances));
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexGrid;
    use crate::hex::flags::OFF_BOARD;

    fn create_test_board(w: u32, h: u32) -> GameHexGrid {
        GameHexGrid::new(HexGrid::new(w, h, 0, OFF_BOARD).unwrap()).unwrap()
    }

    fn create_test_request(start: HexCoord, goal: HexCoord) -> PathRequest {
        PathRequest {
            start,
            goal,
            facing: HexFacing::Tile3,
            search_centre: start,
            search_radius: 20,
            path_limit: 0,
        }
    }

    fn assert_connected(path: &[HexCoord]) {
        for pair in path.windows(2) {
            assert_eq!(step_distance_between(pair[0], pair[1]), 1, "{pair:?}");
        }
    }

    #[test]
    fn test_straight_path() {
        let grid = create_test_board(10, 10);
        let a = HexCoord::new(2, 1);
        let b = HexCoord::new(2, 6);
        let path = find_path(&create_test_request(a, b), &grid, &PathCosts::default());
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        assert_connected(&path);

        // Already facing down: one advance of five.
        let code = make_path_instructions(&path, HexFacing::Tile3);
        assert_eq!(code, vec![advance_instruction(5)]);
    }

    #[test]
    fn test_identity_path() {
        let grid = create_test_board(4, 4);
        let a = HexCoord::new(1, 1);
        assert_eq!(find_path(&create_test_request(a, a), &grid, &PathCosts::default()), vec![a]);
        assert!(make_path_instructions(&[a], HexFacing::Tile0).is_empty());
    }

    #[test]
    fn test_asteroids_are_avoided() {
        let mut grid = create_test_board(10, 10);
        for y in 0..9 {
            grid.place_asteroid_on_tile(HexCoord::new(4, y)).unwrap();
        }
        let a = HexCoord::new(2, 2);
        let b = HexCoord::new(6, 2);
        let path = find_path(&create_test_request(a, b), &grid, &PathCosts::default());
        assert!(!path.is_empty());
        assert_connected(&path);
        assert!(path.contains(&HexCoord::new(4, 9)));
    }

    #[test]
    fn test_walled_off_goal_has_no_path() {
        let mut grid = create_test_board(10, 10);
        for y in 0..10 {
            grid.place_asteroid_on_tile(HexCoord::new(4, y)).unwrap();
        }
        let path = find_path(
            &create_test_request(HexCoord::new(1, 1), HexCoord::new(7, 7)),
            &grid,
            &PathCosts::default(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn test_occupied_goal_stops_alongside() {
        let mut grid = create_test_board(10, 10);
        let goal = HexCoord::new(5, 5);
        grid.place_bot_on_tile(goal);
        let path = find_path(
            &create_test_request(HexCoord::new(5, 1), goal),
            &grid,
            &PathCosts::default(),
        );
        assert_eq!(path.last(), Some(&HexCoord::new(5, 4)));
    }

    #[test]
    fn test_search_radius_and_limit() {
        let grid = create_test_board(10, 10);
        let a = HexCoord::new(2, 0);
        let b = HexCoord::new(2, 8);
        let mut request = create_test_request(a, b);
        request.search_radius = 3;
        assert!(find_path(&request, &grid, &PathCosts::default()).is_empty());

        request.search_radius = 20;
        request.path_limit = 2;
        let path = find_path(&request, &grid, &PathCosts::default());
        assert_eq!(path, vec![a, HexCoord::new(2, 1), HexCoord::new(2, 2)]);
    }

    #[test]
    fn test_zero_cost_makes_empty_tiles_impassable() {
        let grid = create_test_board(5, 5);
        let mut costs = PathCosts::default();
        costs.set_cost(PathCosts::UNOCCUPIED, 0);
        let path = find_path(
            &create_test_request(HexCoord::new(0, 0), HexCoord::new(3, 3)),
            &grid,
            &costs,
        );
        assert!(path.is_empty());
    }

    #[test]
    fn test_costs_wrap_and_cap() {
        let mut costs = PathCosts::default();
        costs.set_cost(4, 1000);
        assert_eq!(costs.cost(PathCosts::BOT), MAX_PATH_COST);
        assert_eq!(costs.cost(7), MAX_PATH_COST);
        assert_eq!(costs.cost(PathCosts::ASTEROID), 0);
    }

    #[test]
    fn test_turns_take_the_short_way() {
        let up = turn_instruction(HexFacing::Tile0, HexFacing::Tile5);
        assert_eq!(up.args, [1, TurnDirection::CounterClockwise.value(), 0]);
        let right = turn_instruction(HexFacing::Tile0, HexFacing::Tile2);
        assert_eq!(right.args, [2, TurnDirection::Clockwise.value(), 0]);
        let back = turn_instruction(HexFacing::Tile4, HexFacing::Tile1);
        assert_eq!(back.args, [3, TurnDirection::Clockwise.value(), 0]);
    }

    #[test]
    fn test_path_instructions_turn_then_advance() {
        let a = HexCoord::new(2, 2);
        let path = vec![a, HexCoord::new(2, 1), HexCoord::new(2, 0)];
        let code = make_path_instructions(&path, HexFacing::Tile3);
        assert_eq!(code.len(), 2);
        assert_eq!(code[0].cmd(), TURN);
        assert_eq!(code[0].args[0], 3);
        assert_eq!(code[1], advance_instruction(2));
    }

    #[test]
    fn test_results_are_collected_once() {
        let grid = create_test_board(6, 6);
        let mut finder = HexPathfinder::new();
        let id = finder.search_for_path_between(
            &create_test_request(HexCoord::new(1, 1), HexCoord::new(1, 4)),
            &grid,
            &PathCosts::default(),
        );
        assert_eq!(finder.pending(), 1);
        assert_eq!(finder.take_path_instructions(id).map(|c| c.len()), Some(1));
        assert!(finder.take_path(id).is_none());
        finder.cancel(id);
        assert_eq!(finder.pending(), 0);
    }
}
