//! The simulation kernel.
//!
//! A [`BoardState`] owns the grid, every machine, asteroid and sun, the
//! board's random stream and its pathfinder. [`BoardState::advance_one_frame`]
//! is the only way the world changes. Each frame:
//!
//! 1. Player actions are applied in order.
//! 2. Every machine on the board moves and turns.
//! 3. Every machine settles its damage; survivors run their programs and the
//!    dead explode.
//! 4. Market requests are settled, purchases before queries.
//! 5. The machine events raised this frame are resolved. Resolution only ever
//!    produces secondary events, delayed events and notices.
//! 6. Delayed events falling due are resolved.
//! 7. Mined out asteroids and dead machines leave the grid and the entity
//!    lists together, and the frame counter moves on.
//!
//! A frame is single threaded. Given a seed and an action sequence the
//! produced [`FrameEvents`] are always the same.

mod asteroid;
mod delayed;
mod handlers;
pub mod hits;
mod invariants;
mod trading;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{BlueError, BlueResult};
use crate::hex::flags::is_bot_on_tile;
use crate::hex::{GameHexGrid, HexCoord, HexFacing};
use crate::instructions::Instructions;
use crate::machine::{Machine, MachineContext, MachineEvent, MachineEventKind, MachineId, MachineTemplate, SecondaryEvent, TradeRequest};
use crate::pathfinder::HexPathfinder;
use crate::rng::BoardRng;

pub use asteroid::{Asteroid, Sun};
use delayed::DelayedEvents;
pub use invariants::{InvariantViolation, check_invariants};

/// Something a player does to the board, applied at the start of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum GameAction {
    /// Build a machine from `template` and place it on a free tile.
    AddMachine {
        /// What to build.
        template: MachineTemplate,
        /// Where.
        xy: HexCoord,
        /// Initial facing.
        facing: HexFacing,
    },
    /// Deliver code to the message buffer of whatever machine is on `xy`.
    SendInstructions {
        /// Receiving tile.
        xy: HexCoord,
        /// The code.
        code: Instructions,
    },
}

/// Everything observers learn about one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrameEvents {
    /// Events raised by machines, in the order raised, followed by the
    /// board's notices.
    pub machine_events: Vec<MachineEvent>,
    /// Effects of resolving them.
    pub secondary_events: Vec<SecondaryEvent>,
}

impl FrameEvents {
    /// Forget the previous frame.
    pub fn clear(&mut self) {
        self.machine_events.clear();
        self.secondary_events.clear();
    }

    /// True when nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.machine_events.is_empty() && self.secondary_events.is_empty()
    }
}

const fn slot(id: MachineId) -> usize {
    id.0 as usize
}

/// The board: grid, entities and the services machines borrow.
#[derive(Debug)]
pub struct BoardState {
    frame_number: u64,
    grid: GameHexGrid,
    machines: Vec<Option<Machine>>,
    by_xy: BTreeMap<HexCoord, MachineId>,
    asteroids: Vec<Asteroid>,
    suns: Vec<Sun>,
    rng: BoardRng,
    pathfinder: HexPathfinder,
    delayed: DelayedEvents,
    machine_events: Vec<MachineEvent>,
    secondary_events: Vec<SecondaryEvent>,
    trades: Vec<TradeRequest>,
}

impl BoardState {
    /// A board on `grid` holding `asteroids` and `suns`, its random stream
    /// seeded with `seed`.
    ///
    /// # Errors
    ///
    /// An asteroid or sun on a tile that is off the board or already taken.
    pub fn new(seed: u64, mut grid: GameHexGrid, mut asteroids: Vec<Asteroid>, mut suns: Vec<Sun>) -> BlueResult<Self> {
        suns.sort_by_key(|s| s.board_xy);
        for sun in &suns {
            grid.place_sun_on_tile(sun.strength, sun.board_xy)?;
        }
        asteroids.sort_by_key(Asteroid::board_xy);
        for a in asteroids.iter().filter(|a| a.is_on_board()) {
            grid.place_asteroid_on_tile(a.board_xy())?;
        }
        debug!(seed, asteroids = asteroids.len(), suns = suns.len(), "board created");
        Ok(Self {
            frame_number: 0,
            grid,
            machines: Vec::new(),
            by_xy: BTreeMap::new(),
            asteroids,
            suns,
            rng: BoardRng::new(seed),
            pathfinder: HexPathfinder::new(),
            delayed: DelayedEvents::default(),
            machine_events: Vec::with_capacity(128),
            secondary_events: Vec::with_capacity(128),
            trades: Vec::with_capacity(16),
        })
    }

    /// Frames completed so far.
    #[must_use]
    pub const fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// The tiles.
    #[must_use]
    pub const fn grid(&self) -> &GameHexGrid {
        &self.grid
    }

    /// Every machine on the board, in placement order.
    pub fn machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter().flatten()
    }

    /// Machines on the board.
    #[must_use]
    pub fn machine_count(&self) -> usize {
        self.machines().count()
    }

    /// The machine with handle `id`, unless it has been destroyed.
    #[must_use]
    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(slot(id)).and_then(Option::as_ref)
    }

    /// The machine standing on `xy`.
    #[must_use]
    pub fn machine_at(&self, xy: HexCoord) -> Option<&Machine> {
        self.machine_id_at(xy).and_then(|id| self.machine(id))
    }

    /// Asteroids, ordered by tile.
    #[must_use]
    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    /// The asteroid on `xy`, mined out or not.
    #[must_use]
    pub fn asteroid_at(&self, xy: HexCoord) -> Option<&Asteroid> {
        self.asteroids
            .binary_search_by_key(&xy, Asteroid::board_xy)
            .ok()
            .map(|i| &self.asteroids[i])
    }

    /// Suns, ordered by tile.
    #[must_use]
    pub fn suns(&self) -> &[Sun] {
        &self.suns
    }

    /// The sun on `xy`.
    #[must_use]
    pub fn sun_at(&self, xy: HexCoord) -> Option<&Sun> {
        self.suns.iter().find(|s| s.board_xy == xy)
    }

    /// Events waiting for a later frame.
    #[must_use]
    pub fn pending_delayed_events(&self) -> usize {
        self.delayed.len()
    }

    /// Place `machine` on the free tile `xy`. Its arrival is reported with
    /// the next frame's events.
    ///
    /// # Errors
    ///
    /// `xy` is off the board, occupied or reserved.
    pub fn add_machine_to_board(&mut self, xy: HexCoord, facing: HexFacing, mut machine: Machine) -> BlueResult<MachineId> {
        if !self.grid.is_on_board(xy) {
            return Err(BlueError::NotOnBoard(xy));
        }
        if !self.grid.is_tile_empty_and_unreserved(xy) {
            return Err(BlueError::TileOccupied(xy));
        }
        let id = u32::try_from(self.machines.len())
            .map(MachineId)
            .map_err(|_| BlueError::Scenario("Too many machines.".into()))?;
        self.grid.place_bot_on_tile(xy);
        machine.add_to_board(id, xy, facing, &self.grid);
        self.by_xy.insert(xy, id);
        self.machines.push(Some(machine));
        self.machine_events.push(MachineEvent { machine: id, kind: MachineEventKind::AddedToBoard { xy, facing } });
        Ok(id)
    }

    /// Run one frame, applying `actions` first. `events` is cleared and
    /// refilled with what happened.
    pub fn advance_one_frame(&mut self, actions: &[GameAction], events: &mut FrameEvents) {
        events.clear();
        for action in actions {
            self.apply_action(action);
        }

        let living: Vec<MachineId> = self.machines().filter(|m| m.is_alive()).map(Machine::id).collect();

        for &id in &living {
            if let Some(m) = self.machines.get_mut(slot(id)).and_then(Option::as_mut) {
                let mut ctx = MachineContext {
                    grid: &mut self.grid,
                    rng: &mut self.rng,
                    pathfinder: &mut self.pathfinder,
                    events: &mut self.machine_events,
                    trades: &mut self.trades,
                };
                m.resolve_movement(&mut ctx);
            }
        }
        self.rebuild_index();

        for &id in &living {
            let Some(m) = self.machines.get_mut(slot(id)).and_then(Option::as_mut) else {
                continue;
            };
            if m.resolve_combat(&mut self.rng) {
                let mut ctx = MachineContext {
                    grid: &mut self.grid,
                    rng: &mut self.rng,
                    pathfinder: &mut self.pathfinder,
                    events: &mut self.machine_events,
                    trades: &mut self.trades,
                };
                m.advance_one_frame(&mut ctx);
            } else {
                debug!(machine = %id, "machine destroyed");
                self.explode_machine(id);
            }
        }

        let mut trades = std::mem::take(&mut self.trades);
        trades.sort();
        for request in &trades {
            self.handle_trade_request(request);
        }
        trades.clear();
        self.trades = trades;

        // Notices raised while resolving land behind the frame's events and
        // are not resolved themselves.
        let mut primary = std::mem::take(&mut self.machine_events);
        for e in &primary {
            self.handle_event(e);
        }
        primary.append(&mut self.machine_events);
        self.machine_events = primary;

        while let Some(e) = self.delayed.pop_due(self.frame_number) {
            self.handle_event(&e);
        }

        self.remove_depleted_asteroids();
        self.sweep_dead_machines();

        if cfg!(debug_assertions) {
            let violations = check_invariants(self);
            for v in &violations {
                warn!(frame = self.frame_number, "{v}");
            }
            debug_assert!(violations.is_empty(), "board inconsistent after frame {}", self.frame_number);
        }

        std::mem::swap(&mut events.machine_events, &mut self.machine_events);
        std::mem::swap(&mut events.secondary_events, &mut self.secondary_events);
        debug!(
            frame = self.frame_number,
            machines = self.machines().count(),
            machine_events = events.machine_events.len(),
            secondary_events = events.secondary_events.len(),
            delayed = self.delayed.len(),
            "frame complete"
        );
        self.frame_number += 1;
    }

    fn apply_action(&mut self, action: &GameAction) {
        match action {
            GameAction::AddMachine { template, xy, facing } => {
                let placed = Machine::create_machine(template.clone())
                    .and_then(|m| self.add_machine_to_board(*xy, *facing, m));
                match placed {
                    Ok(id) => debug!(machine = %id, %xy, "machine placed"),
                    Err(e) => warn!(%xy, error = %e, "machine not placed"),
                }
            }
            GameAction::SendInstructions { xy, code } => {
                self.send_instructions_to_board(*xy, Arc::new(code.clone()));
            }
        }
    }

    /// Hand `code` to the machine on `xy`, if any.
    fn send_instructions_to_board(&mut self, xy: HexCoord, code: Arc<Instructions>) {
        if let Some(m) = self.machine_id_at(xy).and_then(|id| self.machine_mut(id)) {
            trace!(machine = %m.id(), %xy, lines = code.size(), "instructions delivered");
            m.receive_broadcast(code);
        }
    }

    fn machine_id_at(&self, xy: HexCoord) -> Option<MachineId> {
        self.by_xy.get(&xy).copied()
    }

    fn machine_mut(&mut self, id: MachineId) -> Option<&mut Machine> {
        self.machines.get_mut(slot(id)).and_then(Option::as_mut)
    }

    /// Two different machines at once, in the order asked.
    fn machine_pair_mut(&mut self, a: MachineId, b: MachineId) -> Option<(&mut Machine, &mut Machine)> {
        let (i, j) = (slot(a), slot(b));
        if i == j || i.max(j) >= self.machines.len() {
            return None;
        }
        let (low, high) = self.machines.split_at_mut(i.max(j));
        let first = low[i.min(j)].as_mut()?;
        let second = high[0].as_mut()?;
        Some(if i < j { (first, second) } else { (second, first) })
    }

    fn asteroid_at_mut(&mut self, xy: HexCoord) -> Option<&mut Asteroid> {
        self.asteroids
            .binary_search_by_key(&xy, Asteroid::board_xy)
            .ok()
            .map(|i| &mut self.asteroids[i])
    }

    // Tiles change only while moving, so the index is rebuilt once movement
    // is resolved and then follows placements and removals.
    fn rebuild_index(&mut self) {
        self.by_xy.clear();
        for m in self.machines.iter().flatten() {
            self.by_xy.insert(m.board_xy(), m.id());
        }
    }

    fn remove_depleted_asteroids(&mut self) {
        for a in &mut self.asteroids {
            if a.is_on_board() && a.volume() == 0 {
                a.set_as_removed_from_board();
                self.grid.remove_asteroid_from_tile(a.board_xy());
                debug!(xy = %a.board_xy(), "asteroid removed");
            }
        }
    }

    fn sweep_dead_machines(&mut self) {
        for entry in &mut self.machines {
            if entry.as_ref().is_none_or(Machine::is_alive) {
                continue;
            }
            let Some(mut m) = entry.take() else {
                continue;
            };
            for xy in m.reserved_tiles() {
                if self.grid.is_tile_reserved(xy) {
                    self.grid.unreserve_empty_tile(xy);
                }
            }
            let xy = m.board_xy();
            if self.by_xy.get(&xy) == Some(&m.id()) {
                self.by_xy.remove(&xy);
                if is_bot_on_tile(self.grid.contents(xy)) {
                    self.grid.remove_bot_from_tile(xy);
                }
            }
            m.removed_from_board(&mut self.pathfinder);
            debug!(machine = %m.id(), name = %m.name(), %xy, "machine removed");
        }
    }
}
