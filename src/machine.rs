//! Programmable machines.
//!
//! A machine is one board entity running a small bytecode program. It owns
//! its program, cargo, hardpoints, propulsion and combat state, and moves
//! through a single [`BlockingCondition`] at a time: instructions run only
//! while nothing blocks.
//!
//! Machines never hold references to the board. Each frame the board lends
//! the grid, the random stream, the pathfinder and the frame's output queues
//! through a [`MachineContext`]. Everything a machine wants done to another
//! entity is raised as a [`MachineEvent`] and resolved by the board.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

mod args;
mod commands;
mod events;
mod execute;
mod hardpoints;
mod propulsion;
mod sensing;
mod template;
mod trade;
mod turning;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::blueprint::{Blueprint, Classification, Hardware};
use crate::combat::{CombatSystem, Damages, Explosion, Resistances};
use crate::constants::{CPU_BASELINE_INSTRUCTIONS_PER_CYCLE, MAX_CREDITS_PER_MACHINE, SUN_STRENGTH_TO_CAP_FACTOR};
use crate::error::{BlueError, BlueResult};
use crate::fixed_angle::fixed_angle_from_facing;
use crate::hex::flags::MAX_SUN_STRENGTH;
use crate::hex::{GameHexGrid, HexCoord, HexFacing};
use crate::instructions::{Instruction, Instructions};
use crate::pathfinder::{HexPathfinder, PathCosts, SearchId};
use crate::rng::BoardRng;
use crate::tradables::{Amount, Cargohold, TradableType};

use hardpoints::HardpointCollective;
use propulsion::Propulsion;
use sensing::SenseResults;
use trade::ForSaleTable;

pub use events::{MachineEvent, MachineEventKind, MachineFault, PositionInfo, SecondaryEvent, ShotOutcome};
pub use template::{MachineName, MachineTemplate};
pub use trade::{ForSale, Quote, TradeRequest, TradeType};

/// Handle of a machine on a board.
///
/// Ids are handed out in placement order and never reused, so a handle to a
/// destroyed machine finds nothing instead of finding a stranger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(pub u32);

impl std::fmt::Display for MachineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a machine is waiting for. Instructions only run while
/// [`BlockingCondition::NothingBlocking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockingCondition {
    /// Running.
    #[default]
    NothingBlocking,
    /// Turning on the spot.
    WaitingForNFaceTurns,
    /// Moving forward.
    WaitingForNTileMoves {
        /// Line receiving the number of tiles moved.
        store_at: Option<u16>,
    },
    /// Sensing.
    WaitingForSensingCompleted {
        /// Radius that will be sensed.
        radius: u16,
        /// Ticks until the results arrive.
        ticks_left: u16,
    },
    /// Idling.
    WaitingForSynch {
        /// Frames left.
        frames: u16,
    },
    /// Paying for a transmission.
    WaitingForTransmitCapCostToBePaid {
        /// Capacitance still owed.
        cost_left: u16,
        /// Receiver's tile.
        to: HexCoord,
        /// First line sent.
        begin: u16,
        /// Lines sent.
        len: u16,
    },
    /// Paying for a broadcast.
    WaitingForBroadcastCapCostToBePaid {
        /// Capacitance still owed.
        cost_left: u16,
        /// Broadcast radius.
        range: u16,
        /// First line sent.
        begin: u16,
        /// Lines sent.
        len: u16,
    },
    /// Building a machine on a reserved tile.
    WaitingForBuildToComplete {
        /// Build ticks left.
        ticks_left: u16,
        /// Build ticks in total.
        ticks_total: u16,
        /// Capacitance still owed.
        cap_left: u16,
        /// Index into the known blueprints.
        blueprint: u16,
        /// Reserved build site.
        site: HexCoord,
        /// First line of the child's boot code.
        begin: u16,
        /// Lines of boot code.
        len: u16,
    },
    /// Waiting on a navigation search.
    WaitingForAStarRoute {
        /// Frames left.
        frames: u16,
    },
    /// Waiting on a plotted route.
    WaitingForRoutePlot {
        /// Frames left.
        frames: u16,
    },
    /// Refining ore.
    WaitingForRefiningCycleToEnd {
        /// Capacitance still owed for this unit.
        cap_left: u16,
        /// Ticks left for this unit.
        ticks_left: u16,
        /// Units left after this one.
        units_left: u16,
        /// Ore being refined.
        ore: TradableType,
    },
    /// Waiting on the market.
    WaitingForTrade {
        /// Frames left.
        frames: u16,
        /// Line receiving the answer.
        store_at: Option<u16>,
    },
    /// Never runs again.
    WaitingForever,
}

/// Board services lent to a machine for one call.
#[derive(Debug)]
pub struct MachineContext<'a> {
    /// The board's tiles.
    pub grid: &'a mut GameHexGrid,
    /// The board's random stream.
    pub rng: &'a mut BoardRng,
    /// The board's route finder.
    pub pathfinder: &'a mut HexPathfinder,
    /// Primary events raised this frame.
    pub events: &'a mut Vec<MachineEvent>,
    /// Market requests raised this frame.
    pub trades: &'a mut Vec<TradeRequest>,
}

/// Navigation program synthesised from a path search.
#[derive(Debug, Clone, Default)]
struct Navigation {
    active: bool,
    code: Vec<Instruction>,
    ptr: usize,
    expected_facing: HexFacing,
    expected_xy: HexCoord,
}

/// A programmable board entity.
#[derive(Debug, Clone)]
pub struct Machine {
    id: MachineId,
    name: MachineName,
    classification: Classification,
    known_blueprints: Vec<Arc<Blueprint>>,
    hardware: Hardware,
    hardpoints: HardpointCollective,
    propulsion: Propulsion,
    combat: CombatSystem,
    cargo: Cargohold,
    code: Instructions,
    ip: u16,
    ip_updated: bool,
    cycles: u32,
    blocking: BlockingCondition,
    capacitance: u16,
    external_cap_delta: i32,
    error_code: u16,
    credits: u16,
    for_sale: ForSaleTable,
    sense: SenseResults,
    messages: Vec<Arc<Instructions>>,
    current_message: Option<Arc<Instructions>>,
    sent: BTreeMap<u16, Arc<Instructions>>,
    next_code_id: u16,
    navigation: Navigation,
    path_costs: PathCosts,
    search: Option<SearchId>,
    route: Vec<HexCoord>,
    self_destruct_triggered: bool,
    children_built: u32,
    pulse_period: f32,
    hue_shift: u8,
    on_board: bool,
}

/// Instructions per tick relative to the baseline CPU.
fn cpu_speed_metric(hw: &Hardware) -> f32 {
    let per_tick = hw.processor_speed_cycles_per_tick() as f32 / hw.cycles_per_instruction().max(1) as f32;
    per_tick / CPU_BASELINE_INSTRUCTIONS_PER_CYCLE
}

impl Machine {
    /// Create a machine from `template`. The machine is off the board until
    /// [`Machine::add_to_board`].
    ///
    /// The machine's own blueprint is always the first known blueprint.
    ///
    /// # Errors
    ///
    /// Unusable hardware (zero hull, zero cycles per instruction...).
    pub fn create_machine(template: MachineTemplate) -> BlueResult<Self> {
        let MachineTemplate {
            machines_name,
            machines_blueprint,
            mut known_blueprints,
            boot_code,
            pulse_period,
            hue_shift,
        } = template;

        if machines_name.as_str().is_empty() {
            return Err(BlueError::Template("Machine name is empty.".into()));
        }
        if known_blueprints.first().is_none_or(|bp| **bp != *machines_blueprint) {
            known_blueprints.insert(0, Arc::clone(&machines_blueprint));
        }

        let hardware = machines_blueprint.hardware_of_blueprint().clone();
        hardware.validate()?;
        let classification = Classification::of(&machines_blueprint)?;

        let [k, t, e, r] = hardware.resistances_percent().map(|p| f32::from(p) * 0.01);
        let combat = CombatSystem::new(
            u32::try_from(hardware.hull_hitpoints()).unwrap_or(0),
            u32::try_from(hardware.armour_hitpoints()).unwrap_or(0),
            Resistances::new(k, t, e, r),
        );

        let metric = cpu_speed_metric(&hardware);
        let pulse_period = if metric > 0.0 { pulse_period / metric } else { pulse_period };

        Ok(Self {
            id: MachineId::default(),
            name: machines_name,
            classification,
            hardpoints: HardpointCollective::new(&machines_blueprint),
            propulsion: Propulsion::new(&hardware),
            combat,
            cargo: Cargohold::new(hardware.cargohold_volume()),
            known_blueprints,
            hardware,
            code: boot_code,
            ip: 1,
            ip_updated: false,
            cycles: 0,
            blocking: BlockingCondition::NothingBlocking,
            capacitance: 0,
            external_cap_delta: 0,
            error_code: 0,
            credits: 0,
            for_sale: ForSaleTable::default(),
            sense: SenseResults::default(),
            messages: Vec::new(),
            current_message: None,
            sent: BTreeMap::new(),
            next_code_id: 0,
            navigation: Navigation::default(),
            path_costs: PathCosts::default(),
            search: None,
            route: Vec::new(),
            self_destruct_triggered: false,
            children_built: 0,
            pulse_period,
            hue_shift,
            on_board: false,
        })
    }

    /// Place the machine at `xy` facing `facing` under handle `id`. The caller
    /// has already marked the tile as holding a machine.
    pub fn add_to_board(&mut self, id: MachineId, xy: HexCoord, facing: HexFacing, grid: &GameHexGrid) {
        self.id = id;
        self.on_board = true;
        self.propulsion.reset(xy, facing);
        self.hardpoints.change_location(xy);
        self.hardpoints.change_orientation(fixed_angle_from_facing(facing));
        self.sense.sense(grid, xy, 0);
        debug!(machine = %id, name = %self.name, %xy, "machine added to board");
    }

    /// The machine left the board. Any search it was waiting on is dropped.
    pub fn removed_from_board(&mut self, pathfinder: &mut HexPathfinder) {
        if let Some(id) = self.search.take() {
            pathfinder.cancel(id);
        }
        self.on_board = false;
        self.navigation = Navigation::default();
    }

    /// Handle on the board.
    #[must_use]
    pub const fn id(&self) -> MachineId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &MachineName {
        &self.name
    }

    /// Classification of the machine's blueprint.
    #[must_use]
    pub const fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Blueprints this machine can build; its own is first.
    #[must_use]
    pub fn known_blueprints(&self) -> &[Arc<Blueprint>] {
        &self.known_blueprints
    }

    /// The machine's own blueprint.
    #[must_use]
    pub fn blueprint(&self) -> &Arc<Blueprint> {
        &self.known_blueprints[0]
    }

    /// Derived hardware.
    #[must_use]
    pub const fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    /// Tile the machine is on.
    #[must_use]
    pub const fn board_xy(&self) -> HexCoord {
        self.propulsion.xy()
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> HexFacing {
        self.propulsion.facing()
    }

    /// Sub-tile position.
    #[must_use]
    pub const fn position_info(&self) -> PositionInfo {
        self.propulsion.position_info()
    }

    /// True while the machine is on a board.
    #[must_use]
    pub const fn is_on_board(&self) -> bool {
        self.on_board
    }

    /// True until the machine is destroyed.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.combat.is_alive()
    }

    /// Hull and armour state.
    #[must_use]
    pub const fn combat_system(&self) -> &CombatSystem {
        &self.combat
    }

    /// Stored capacitance.
    #[must_use]
    pub const fn capacitance(&self) -> u16 {
        self.capacitance
    }

    /// Credit balance.
    #[must_use]
    pub const fn credits(&self) -> u16 {
        self.credits
    }

    /// Cargo.
    #[must_use]
    pub const fn cargo(&self) -> &Cargohold {
        &self.cargo
    }

    /// Cargo, for seeding scenarios.
    pub const fn cargo_mut(&mut self) -> &mut Cargohold {
        &mut self.cargo
    }

    /// The running program.
    #[must_use]
    pub const fn code(&self) -> &Instructions {
        &self.code
    }

    /// Line about to run, 1-based.
    #[must_use]
    pub const fn instruction_pointer(&self) -> u16 {
        self.ip
    }

    /// What the machine is waiting for.
    #[must_use]
    pub const fn blocking_condition(&self) -> BlockingCondition {
        self.blocking
    }

    /// Last error code set by a fault or by the program.
    #[must_use]
    pub const fn error_code(&self) -> u16 {
        self.error_code
    }

    /// Messages waiting in the buffer.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Price list line for `t`.
    #[must_use]
    pub const fn for_sale(&self, t: TradableType) -> ForSale {
        self.for_sale.get(t)
    }

    /// Team colour shift.
    #[must_use]
    pub const fn hue_shift(&self) -> u8 {
        self.hue_shift
    }

    /// Presentation pulse period, scaled by CPU speed.
    #[must_use]
    pub const fn pulse_period(&self) -> f32 {
        self.pulse_period
    }

    /// Tiles this machine holds reserved: the tile it is moving onto and any
    /// build site.
    #[must_use]
    pub fn reserved_tiles(&self) -> Vec<HexCoord> {
        let mut tiles: Vec<_> = self.propulsion.reserved_tile().into_iter().collect();
        if let BlockingCondition::WaitingForBuildToComplete { site, .. } = self.blocking {
            tiles.push(site);
        }
        tiles
    }

    fn emit(&self, ctx: &mut MachineContext<'_>, kind: MachineEventKind) {
        trace!(machine = %self.id, event = kind.name(), "machine event");
        ctx.events.push(MachineEvent { machine: self.id, kind });
    }

    /// Move and turn by one tick, reporting any change of position.
    pub fn resolve_movement(&mut self, ctx: &mut MachineContext<'_>) {
        let before = self.propulsion.position_info();
        self.propulsion.tick(ctx.grid);
        let now = self.propulsion.position_info();
        if now == before {
            return;
        }
        if now.angle != before.angle {
            self.hardpoints.change_orientation(now.angle);
        }
        self.emit(ctx, MachineEventKind::PositionalUpdate { position: now });
        if now.xy != before.xy {
            self.hardpoints.change_location(now.xy);
            self.emit(ctx, MachineEventKind::ChangedTile { from: before.xy, to: now.xy });
        }
    }

    /// One frame of capacitor, hardpoint, blocking and program activity.
    pub fn advance_one_frame(&mut self, ctx: &mut MachineContext<'_>) {
        self.tick_capacitor(ctx.grid);
        self.hardpoints.tick();
        self.tick_blocked_status(ctx);
        self.tick_instructions(ctx);
    }

    // Refill slows as the capacitor fills. Solar power and external changes
    // are added on top, then the result is clamped to the capacity.
    fn tick_capacitor(&mut self, grid: &GameHexGrid) {
        let capacity = self.hardware.cap_capacity();
        let x = if capacity > 0 { f32::from(self.capacitance) / f32::from(capacity) } else { 1.0 };
        let generated = (f32::from(self.hardware.cap_refill_per_tick()) * (1.0 - x).max(0.0)) as i32;
        let solar = self.cap_from_solar_panels(grid.tile_sun_strength(self.board_xy()));
        let c = i32::from(self.capacitance) + generated + solar + self.external_cap_delta;
        self.capacitance = u16::try_from(c.clamp(0, i32::from(capacity))).unwrap_or(capacity);
        self.external_cap_delta = 0;
    }

    fn cap_from_solar_panels(&self, sun_strength: u8) -> i32 {
        let panels = f32::from(self.hardware.cap_solar_panels_count());
        (panels * f32::from(sun_strength) * SUN_STRENGTH_TO_CAP_FACTOR) as i32
    }

    fn tick_instructions(&mut self, ctx: &mut MachineContext<'_>) {
        if !self.is_not_blocked() {
            return;
        }
        let cpi = self.hardware.cycles_per_instruction().max(1);
        self.cycles = self.cycles.saturating_add(self.hardware.processor_speed_cycles_per_tick());
        while self.cycles > cpi {
            self.cycles -= cpi;
            if self.is_not_blocked() {
                self.execute_current_instruction(ctx);
            }
        }
    }

    fn is_not_blocked(&self) -> bool {
        self.blocking == BlockingCondition::NothingBlocking
    }

    // Out of capacitance the cycles are spent anyway.
    fn execute_current_instruction(&mut self, ctx: &mut MachineContext<'_>) {
        let cost = self.hardware.cap_instruction_cost();
        if self.capacitance < cost {
            return;
        }
        self.capacitance -= cost;
        if self.navigation.active {
            self.execute_navigation_instruction(ctx);
        } else {
            self.execute_code_instruction(ctx);
        }
    }

    /// Let the combat system settle this frame's damage. Returns false when
    /// the machine did not survive.
    pub fn resolve_combat(&mut self, rng: &mut BoardRng) -> bool {
        self.combat.resolve(rng)
    }

    /// Destroy the machine.
    pub fn kill(&mut self) {
        self.combat.kill();
    }

    /// Take damage; it is settled by [`Machine::resolve_combat`].
    pub fn apply_damage(&mut self, damage: &Damages) {
        self.combat.apply_damage(damage);
    }

    /// Repair armour.
    pub fn apply_armour_repairs(&mut self, repairs: i32) {
        self.combat.repair_armour(repairs);
    }

    /// Gain or lose capacitance at the next capacitor tick.
    pub const fn apply_cap_alteration(&mut self, delta: i32) {
        self.external_cap_delta = self.external_cap_delta.saturating_add(delta);
    }

    /// Keep an incoming message if there is room for it.
    pub fn receive_broadcast(&mut self, code: Arc<Instructions>) {
        if self.messages.len() < usize::from(self.hardware.max_stored_messages()) {
            self.messages.push(code);
        } else {
            trace!(machine = %self.id, "message buffer full, message dropped");
        }
    }

    fn push_code(&mut self, code: Instructions) -> u16 {
        while self.sent.contains_key(&self.next_code_id) {
            self.next_code_id = self.next_code_id.wrapping_add(1);
        }
        let id = self.next_code_id;
        self.next_code_id = id.wrapping_add(1);
        self.sent.insert(id, Arc::new(code));
        id
    }

    /// Collect code this machine sent under `id`.
    pub fn pop_code(&mut self, id: u16) -> Option<Arc<Instructions>> {
        self.sent.remove(&id)
    }

    /// Share of the capacitor's refill that is nuclear rather than solar.
    fn nuclear_proportion(&self) -> f32 {
        let nuke = f32::from(self.hardware.cap_refill_per_tick());
        let sun = self.cap_from_solar_panels(MAX_SUN_STRENGTH) as f32;
        if nuke <= 0.0 {
            0.0
        } else if sun > 0.0 {
            nuke / (sun + nuke)
        } else {
            1.0
        }
    }

    /// The blast this machine makes when destroyed where it stands.
    #[must_use]
    pub fn get_explosion(&self) -> Explosion {
        Explosion::of_machine(
            self.board_xy(),
            self.capacitance,
            self.blueprint().component_count(),
            self.nuclear_proportion(),
        )
    }

    /// Effect multiplier of hardpoint `index` at `range` tiles.
    #[must_use]
    pub fn falloff_at(&self, index: usize, range: u16) -> f32 {
        self.hardpoints.falloff_at(index, range)
    }

    /// The machine this one just finished building from known blueprint
    /// `blueprint`, booting the code sent under `code_id`.
    ///
    /// The child knows its own blueprint first, then the builder's others,
    /// and inherits the builder's hue and pulse period.
    ///
    /// # Errors
    ///
    /// An unknown blueprint index, or unusable hardware.
    pub fn build_machine(&mut self, blueprint: u16, code_id: u16) -> BlueResult<Self> {
        let idx = usize::from(blueprint);
        let bp = self
            .known_blueprints
            .get(idx)
            .cloned()
            .ok_or_else(|| BlueError::Template(format!("Unknown blueprint index {blueprint}.")))?;
        let mut known = vec![Arc::clone(&bp)];
        known.extend(
            self.known_blueprints
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != idx)
                .map(|(_, b)| Arc::clone(b)),
        );
        let boot_code = self.pop_code(code_id).map(Arc::unwrap_or_clone).unwrap_or_default();
        self.children_built += 1;
        Self::create_machine(MachineTemplate {
            machines_name: MachineName::child_of(&self.name, self.children_built),
            machines_blueprint: bp,
            known_blueprints: known,
            boot_code,
            pulse_period: self.pulse_period,
            hue_shift: self.hue_shift,
        })
    }

    /// This machine's offer against `request`, if it has one.
    #[must_use]
    pub fn get_trade_quote(&self, request: &TradeRequest) -> Option<Quote> {
        let line = self.for_sale.get(request.commodity);
        let on_sale = line.quantity.min(self.cargo.count_of(request.commodity));
        if on_sale == 0 {
            return None;
        }
        if request.trade_type == TradeType::Buying && request.price_limit < line.price {
            return None;
        }
        Some(Quote { seller: self.id, price: line.price, availability: on_sale })
    }

    /// Sell up to `quantity` units of `t` to `buyer`. Returns the units sold.
    ///
    /// The sale is limited by what is on offer and held, by what the buyer
    /// can pay and store, and by how many credits the seller can hold.
    pub fn sell_goods_to(&mut self, buyer: &mut Self, t: TradableType, quantity: u16) -> u16 {
        let line = self.for_sale.get(t);
        let mut agreed = line.quantity.min(self.cargo.count_of(t)).min(quantity);
        if line.price > 0 {
            agreed = agreed
                .min((MAX_CREDITS_PER_MACHINE - self.credits) / line.price)
                .min(buyer.credits / line.price);
        }
        agreed = agreed.min(buyer.cargo.free_volume() / t.unit_volume());
        if agreed == 0 {
            return 0;
        }
        let goods = Amount::of(t, agreed as i16);
        if buyer.cargo.is_locked() || self.cargo.is_locked() || !self.cargo.contains_at_least(&goods) {
            return 0;
        }
        self.cargo.transfer_cargo_to(&goods, &mut buyer.cargo);
        let cost = agreed * line.price;
        self.credits += cost;
        buyer.credits -= cost;
        self.for_sale.reduce(t, agreed);
        agreed
    }

    /// The market's answer to this frame's request.
    pub fn trade_reply(&mut self, answer: u16) {
        if let BlockingCondition::WaitingForTrade { store_at: Some(line), .. } = self.blocking {
            self.store(line, answer);
        }
    }

    /// Move `units` of `t` into `other`'s cargohold if both are unlocked and
    /// the goods fit.
    pub fn try_transfer_cargo_to(&mut self, other: &mut Self, t: TradableType, units: u16) -> bool {
        if units == 0 || self.cargo.is_locked() || other.cargo.is_locked() {
            return false;
        }
        let goods = Amount::of(t, i16::try_from(units).unwrap_or(i16::MAX));
        if !self.cargo.contains_at_least(&goods) || !other.cargo.has_capacity_for(&goods) {
            return false;
        }
        self.cargo.transfer_cargo_to(&goods, &mut other.cargo);
        true
    }

    /// Pay `amount` credits to the adjacent `other`.
    pub fn try_transfer_credits_to(&mut self, other: &mut Self, amount: u16) -> bool {
        let adjacent = crate::hex::step_distance_between(self.board_xy(), other.board_xy()) == 1;
        if !adjacent || amount > self.credits || MAX_CREDITS_PER_MACHINE - other.credits < amount {
            return false;
        }
        self.credits -= amount;
        other.credits += amount;
        true
    }

    /// Add credits, capped at the most a machine can hold.
    pub const fn give_credits(&mut self, amount: u16) {
        self.credits = self.credits.saturating_add(amount);
    }

    fn store(&mut self, line: u16, v: u16) {
        self.code[line] = Instruction::value(v as i16);
    }

    fn store_location(&mut self, line: u16, xy: HexCoord) {
        self.code[line] = Instruction::location(xy);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::blueprint::tests::{create_test_hardpoint, create_test_thruster};
    use crate::blueprint::{
        AttachPoint, Chassis, Component, ComponentCategory, EmissiveChannels, HardwareModifier, HardwareStat,
        ShotEffect, Softpoint, ThrusterAttachPoint,
    };
    use crate::hex::HexGrid;
    use crate::hex::flags::OFF_BOARD;

    pub(crate) fn create_test_modifier() -> HardwareModifier {
        HardwareModifier::default()
            .with_delta(HardwareStat::ProcessorSpeedCyclesPerTick, 1000)
            .with_delta(HardwareStat::CapRefillPerTick, 100)
            .with_delta(HardwareStat::CapInstructionCost, 1)
            .with_delta(HardwareStat::MaxSensingRadius, 4)
            .with_delta(HardwareStat::TilesSensedPer10Ticks, 100)
            .with_delta(HardwareStat::CapSensingCostPerTile, 1)
            .with_delta(HardwareStat::CapBroadcastCostPerTile, 2)
            .with_delta(HardwareStat::CapTransmitCostPerTile, 2)
            .with_delta(HardwareStat::MaxBroadcastRange, 5)
            .with_delta(HardwareStat::MaxTransmitRange, 5)
            .with_delta(HardwareStat::MaxStoredMessages, 3)
            .with_delta(HardwareStat::CargoholdVolume, 200)
            .with_delta(HardwareStat::CapRefineCost, 2)
    }

    fn create_test_part(name: &str, cost: Amount) -> Component {
        Component::new(name, 100, 50, ComponentCategory::Industrial, cost, 1.0).unwrap()
    }

    /// A mobile, fast, well-equipped machine design.
    pub(crate) fn create_test_machine_blueprint() -> Blueprint {
        let mut softpoints = BTreeMap::new();
        softpoints.insert(
            AttachPoint::new(1).unwrap(),
            Softpoint::new(create_test_part("CPU", Amount::of(TradableType::Metals, 5)), create_test_modifier()),
        );
        for n in [20, 40, 60] {
            softpoints.insert(
                AttachPoint::new(n).unwrap(),
                Softpoint::new(create_test_part("BOX", Amount::of(TradableType::Metals, 5)), HardwareModifier::default()),
            );
        }
        let mut thrusters = BTreeMap::new();
        thrusters.insert(ThrusterAttachPoint::new(81).unwrap(), create_test_thruster());
        thrusters.insert(ThrusterAttachPoint::new(83).unwrap(), create_test_thruster());
        let mut hardpoints = BTreeMap::new();
        hardpoints.insert(AttachPoint::new(3).unwrap(), create_test_hardpoint(ShotEffect::CapDrain(40)));
        Blueprint::new(Chassis::new("ZZ1", EmissiveChannels::default()), thrusters, softpoints, hardpoints).unwrap()
    }

    /// A one-part, immobile design that costs five Metals.
    pub(crate) fn create_test_child_blueprint() -> Blueprint {
        let mut softpoints = BTreeMap::new();
        softpoints.insert(
            AttachPoint::new(1).unwrap(),
            Softpoint::new(create_test_part("PIP", Amount::of(TradableType::Metals, 5)), create_test_modifier()),
        );
        Blueprint::new(Chassis::new("PIP", EmissiveChannels::default()), BTreeMap::new(), softpoints, BTreeMap::new())
            .unwrap()
    }

    pub(crate) fn create_test_template(code: &str) -> MachineTemplate {
        let mut t = MachineTemplate::new(
            MachineName::new("Tester"),
            Arc::new(create_test_machine_blueprint()),
            code.parse().unwrap(),
        );
        t.known_blueprints.push(Arc::new(create_test_child_blueprint()));
        t
    }

    /// Board services without a board, for driving machines directly.
    #[derive(Debug)]
    pub(crate) struct TestWorld {
        pub(crate) grid: GameHexGrid,
        pub(crate) rng: BoardRng,
        pub(crate) pathfinder: HexPathfinder,
        pub(crate) events: Vec<MachineEvent>,
        pub(crate) trades: Vec<TradeRequest>,
    }

    impl TestWorld {
        pub(crate) fn new() -> Self {
            Self {
                grid: GameHexGrid::new(HexGrid::new(16, 16, 0, OFF_BOARD).unwrap()).unwrap(),
                rng: BoardRng::new(7),
                pathfinder: HexPathfinder::new(),
                events: Vec::new(),
                trades: Vec::new(),
            }
        }

        pub(crate) fn ctx(&mut self) -> MachineContext<'_> {
            MachineContext {
                grid: &mut self.grid,
                rng: &mut self.rng,
                pathfinder: &mut self.pathfinder,
                events: &mut self.events,
                trades: &mut self.trades,
            }
        }

        pub(crate) fn place(&mut self, id: u32, xy: HexCoord, code: &str) -> Machine {
            let mut m = Machine::create_machine(create_test_template(code)).unwrap();
            self.grid.place_bot_on_tile(xy);
            m.add_to_board(MachineId(id), xy, HexFacing::Tile0, &self.grid);
            m
        }

        pub(crate) fn frame(&mut self, m: &mut Machine) {
            let mut ctx = self.ctx();
            m.resolve_movement(&mut ctx);
            m.advance_one_frame(&mut ctx);
        }

        pub(crate) fn frames(&mut self, m: &mut Machine, n: usize) {
            for _ in 0..n {
                self.frame(m);
            }
        }

        pub(crate) fn event_names(&self) -> Vec<&'static str> {
            self.events.iter().map(|e| e.kind.name()).collect()
        }
    }

    #[test]
    fn test_own_blueprint_is_known_first() {
        let mut t = create_test_template("goto 1");
        t.known_blueprints = vec![Arc::new(create_test_child_blueprint())];
        let m = Machine::create_machine(t).unwrap();
        assert_eq!(m.known_blueprints().len(), 2);
        assert_eq!(**m.blueprint(), create_test_machine_blueprint());
        assert_eq!(m.instruction_pointer(), 1);
        assert_eq!(m.capacitance(), 0);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut t = create_test_template("goto 1");
        t.machines_name = MachineName::new("");
        assert!(matches!(Machine::create_machine(t), Err(BlueError::Template(_))));
    }

    #[test]
    fn test_faster_cpu_pulses_faster() {
        let m = Machine::create_machine(create_test_template("goto 1")).unwrap();
        // 1000 cycles at 100 per instruction is five times the baseline.
        assert!((m.pulse_period() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_capacitor_fills_slower_when_full() {
        let mut w = TestWorld::new();
        let mut m = w.place(0, HexCoord::new(5, 5), "synch( 100 )");
        w.frame(&mut m);
        let first = m.capacitance();
        w.frame(&mut m);
        let second = m.capacitance() - first;
        // One instruction ran before blocking.
        assert_eq!(first, 99);
        assert!(second < first);
        w.frames(&mut m, 500);
        assert!(m.capacitance() <= m.hardware().cap_capacity());
    }

    #[test]
    fn test_external_cap_changes_apply_once() {
        let mut w = TestWorld::new();
        let mut m = w.place(0, HexCoord::new(5, 5), "synch( 100 )");
        w.frame(&mut m);
        let before = m.capacitance();
        m.apply_cap_alteration(-1000);
        w.frame(&mut m);
        assert_eq!(m.capacitance(), 0);
        w.frame(&mut m);
        assert!(m.capacitance() > 0);
        assert!(before > 0);
    }

    #[test]
    fn test_no_cap_means_no_instructions() {
        let mut w = TestWorld::new();
        let mut m = w.place(0, HexCoord::new(5, 5), "[3] = 2\ngoto 1\n0");
        m.apply_cap_alteration(-100_000);
        w.frame(&mut m);

        // The frame's cycles are used up without running anything.
        assert_eq!(m.capacitance(), 0);
        assert!(m.cycles <= m.hardware().cycles_per_instruction());
        assert_eq!(m.instruction_pointer(), 1);
        assert_eq!(m.code()[3].arg(0), 0);
        assert_eq!(m.blocking_condition(), BlockingCondition::NothingBlocking);

        w.frame(&mut m);
        assert_eq!(m.code()[3].arg(0), 2);
    }

    #[test]
    fn test_messages_are_bounded() {
        let mut m = Machine::create_machine(create_test_template("goto 1")).unwrap();
        for _ in 0..5 {
            m.receive_broadcast(Arc::new(Instructions::default()));
        }
        assert_eq!(m.message_count(), 3);
    }

    #[test]
    fn test_code_store_ids_wrap_and_skip_used() {
        let mut m = Machine::create_machine(create_test_template("goto 1")).unwrap();
        m.next_code_id = u16::MAX;
        let a = m.push_code(Instructions::default());
        let b = m.push_code(Instructions::default());
        assert_eq!((a, b), (u16::MAX, 0));
        m.next_code_id = u16::MAX;
        let c = m.push_code(Instructions::default());
        assert_eq!(c, 1);
        assert!(m.pop_code(a).is_some());
        assert!(m.pop_code(a).is_none());
    }

    #[test]
    fn test_child_knows_its_own_blueprint_first() {
        let mut m = Machine::create_machine(create_test_template("goto 1")).unwrap();
        let id = m.push_code("sense( 1 )".parse().unwrap());
        let child = m.build_machine(1, id).unwrap();
        assert_eq!(**child.blueprint(), create_test_child_blueprint());
        assert_eq!(child.known_blueprints().len(), 2);
        assert_eq!(*child.known_blueprints()[1], create_test_machine_blueprint());
        assert_eq!(child.name().as_str(), "Tester.1");
        assert_eq!(child.code().size(), 1);
        assert!(m.build_machine(9, 0).is_err());
    }

    #[test]
    fn test_explosion_of_solar_free_machine_is_nuclear() {
        let m = Machine::create_machine(create_test_template("goto 1")).unwrap();
        let boom = m.get_explosion();
        assert_eq!(boom.percent_nuclear, 100);
        assert_eq!(usize::from(boom.damage), m.blueprint().component_count());
    }

    #[test]
    fn test_credits_are_capped() {
        let mut m = Machine::create_machine(create_test_template("goto 1")).unwrap();
        m.give_credits(u16::MAX - 1);
        m.give_credits(10);
        assert_eq!(m.credits(), MAX_CREDITS_PER_MACHINE);
    }

    #[test]
    fn test_credit_transfer_needs_neighbours() {
        let mut w = TestWorld::new();
        let mut a = w.place(0, HexCoord::new(5, 5), "goto 1");
        let mut b = w.place(1, HexCoord::new(5, 6), "goto 1");
        let mut c = w.place(2, HexCoord::new(9, 9), "goto 1");
        a.give_credits(50);
        assert!(a.try_transfer_credits_to(&mut b, 20));
        assert!(!a.try_transfer_credits_to(&mut c, 20));
        assert!(!a.try_transfer_credits_to(&mut b, 31));
        assert_eq!((a.credits(), b.credits()), (30, 20));
    }

    #[test]
    fn test_sale_limited_by_buyer_funds() {
        let mut w = TestWorld::new();
        let mut seller = w.place(0, HexCoord::new(5, 5), "goto 1");
        let mut buyer = w.place(1, HexCoord::new(5, 6), "goto 1");
        assert!(seller.cargo_mut().try_add_cargo(&Amount::of(TradableType::Metals, 20)));
        seller.for_sale.set(TradableType::Metals, 15, 3);
        buyer.give_credits(30);

        let request = TradeRequest {
            customer: buyer.id(),
            trade_type: TradeType::Buying,
            commodity: TradableType::Metals,
            quantity: 12,
            price_limit: 3,
        };
        let quote = seller.get_trade_quote(&request).unwrap();
        assert_eq!((quote.price, quote.availability), (3, 15));

        let sold = seller.sell_goods_to(&mut buyer, TradableType::Metals, 12);
        assert_eq!(sold, 10);
        assert_eq!(buyer.credits(), 0);
        assert_eq!(seller.credits(), 30);
        assert_eq!(buyer.cargo().count_of(TradableType::Metals), 10);
        assert_eq!(seller.for_sale(TradableType::Metals).quantity, 5);

        let cheap = TradeRequest { price_limit: 2, ..request };
        assert!(seller.get_trade_quote(&cheap).is_none());
    }
}
