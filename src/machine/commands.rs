//! What instructions do, and how blocked machines resume.

use crate::hex::flags::BOT;
use crate::hex::{GameHexGrid, HexCoord, TurnDirection, count_of_hexagons_inside_ring, step_distance_between};
use crate::constants::MAX_FACE_TURNS_LIMIT;
use crate::instructions::{Instruction, Instructions};
use crate::pathfinder::{PathRequest, make_path_instructions};
use crate::tradables::{Amount, TRADABLE_TYPES_COUNT, TradableType, refine, refine_period_factor};

use super::{BlockingCondition as B, Machine, MachineContext, MachineEventKind, MachineFault, Navigation};
use super::trade::{TradeRequest, TradeType};

/// Tradable named by a program value, wrapping around the eight types.
pub(super) const fn tradable_of(v: u16) -> TradableType {
    TradableType::ALL[v as usize % TRADABLE_TYPES_COUNT]
}

impl Machine {
    pub(super) fn signal_error(&mut self, ctx: &mut MachineContext<'_>, fault: MachineFault) {
        self.error_code = fault.code();
        self.emit(ctx, MachineEventKind::Error { line: self.ip, fault });
    }

    pub(super) fn set_ip(&mut self, line: u16) {
        self.ip = self.code.line_of(line);
        self.ip_updated = true;
    }

    pub(super) const fn synch(&mut self, frames: u16) {
        if frames > 0 {
            self.blocking = B::WaitingForSynch { frames };
        }
    }

    const fn unblock(&mut self) {
        self.blocking = B::NothingBlocking;
    }

    /// Uniform value in `[min(a, b), max(a, b)]`.
    pub(super) fn get_rand(ctx: &mut MachineContext<'_>, a: u16, b: u16) -> u16 {
        let (lo, hi) = (u32::from(a.min(b)), u32::from(a.max(b)));
        (lo + ctx.rng.urand() % (1 + hi - lo)) as u16
    }

    /// Pay as much of `cost` as the capacitor holds. Returns what is still
    /// owed.
    fn cap_try_pay(&mut self, cost: u16) -> u16 {
        let paid = cost.min(self.capacitance);
        self.capacitance -= paid;
        cost - paid
    }

    // Senses less far rather than not at all when capacitance is short.
    fn cap_try_extract_sensing(&mut self, mut radius: u16) -> u16 {
        let per_tile = u32::from(self.hardware.cap_sensing_cost_per_tile());
        let cost_of = |r: u16| (count_of_hexagons_inside_ring(u32::from(r)) - 1) * per_tile;
        while radius > 0 && cost_of(radius) > u32::from(self.capacitance) {
            radius -= 1;
        }
        self.capacitance -= cost_of(radius) as u16;
        radius
    }

    /// Advance whatever the machine is waiting for by one tick, and finish it
    /// when it is done.
    pub(super) fn tick_blocked_status(&mut self, ctx: &mut MachineContext<'_>) {
        match self.blocking {
            B::NothingBlocking | B::WaitingForever => {}
            B::WaitingForNFaceTurns => {
                if !self.propulsion.is_turning() {
                    self.unblock();
                }
            }
            B::WaitingForNTileMoves { store_at } => {
                if !self.propulsion.is_advancing() {
                    self.unblock();
                    if let Some(line) = store_at {
                        self.store(line, self.propulsion.tiles_advanced());
                    }
                }
            }
            B::WaitingForSensingCompleted { radius, ticks_left } => {
                if ticks_left > 0 {
                    self.blocking = B::WaitingForSensingCompleted { radius, ticks_left: ticks_left - 1 };
                } else {
                    self.unblock();
                    self.sense.sense(ctx.grid, self.board_xy(), radius);
                }
            }
            B::WaitingForSynch { frames } => {
                self.blocking = if frames > 1 { B::WaitingForSynch { frames: frames - 1 } } else { B::NothingBlocking };
            }
            B::WaitingForTrade { frames, store_at } => {
                self.blocking = if frames > 1 {
                    B::WaitingForTrade { frames: frames - 1, store_at }
                } else {
                    B::NothingBlocking
                };
            }
            B::WaitingForAStarRoute { frames } => {
                if frames > 1 {
                    self.blocking = B::WaitingForAStarRoute { frames: frames - 1 };
                } else {
                    self.unblock();
                    self.complete_search_and_start_navigating(ctx);
                }
            }
            B::WaitingForRoutePlot { frames } => {
                if frames > 1 {
                    self.blocking = B::WaitingForRoutePlot { frames: frames - 1 };
                } else {
                    self.unblock();
                    self.complete_route_plotting(ctx);
                }
            }
            B::WaitingForTransmitCapCostToBePaid { cost_left, to, begin, len } => {
                let cost_left = self.cap_try_pay(cost_left);
                if cost_left > 0 {
                    self.blocking = B::WaitingForTransmitCapCostToBePaid { cost_left, to, begin, len };
                } else {
                    self.unblock();
                    self.do_transmission(ctx, to, begin, len);
                    self.synch(1);
                }
            }
            B::WaitingForBroadcastCapCostToBePaid { cost_left, range, begin, len } => {
                let cost_left = self.cap_try_pay(cost_left);
                if cost_left > 0 {
                    self.blocking = B::WaitingForBroadcastCapCostToBePaid { cost_left, range, begin, len };
                } else {
                    self.unblock();
                    self.do_broadcast(ctx, range, begin, len);
                    self.synch(1);
                }
            }
            B::WaitingForBuildToComplete { ticks_left, ticks_total, cap_left, blueprint, site, begin, len } => {
                let ticks_left = ticks_left.saturating_sub(1);
                let cap_left = self.cap_try_pay(cap_left);
                if ticks_left > 0 || cap_left > 0 {
                    self.blocking =
                        B::WaitingForBuildToComplete { ticks_left, ticks_total, cap_left, blueprint, site, begin, len };
                } else {
                    self.unblock();
                    self.complete_build(ctx, blueprint, site, begin, len);
                }
            }
            B::WaitingForRefiningCycleToEnd { cap_left, ticks_left, units_left, ore } => {
                let cap_left = self.cap_try_pay(cap_left);
                let ticks_left = ticks_left.saturating_sub(1);
                if ticks_left > 0 || cap_left > 0 {
                    self.blocking = B::WaitingForRefiningCycleToEnd { cap_left, ticks_left, units_left, ore };
                } else {
                    self.unblock();
                    if self.cargo.try_add_cargo(&refine(ore, 1)) {
                        self.start_refining_cycle(units_left, ore);
                    }
                }
            }
        }
    }

    /// Copy line `from` over line `to`.
    pub(super) fn command_copy(&mut self, from: u16, to: u16) {
        self.code[to] = self.code[from];
    }

    pub(super) fn command_sense(&mut self, ctx: &mut MachineContext<'_>, requested: u16) {
        let radius = self.cap_try_extract_sensing(requested.min(self.hardware.max_sensing_radius()));
        let tiles_per_10 = u32::from(self.hardware.tiles_sensed_per_10_ticks().max(1));
        let ticks = count_of_hexagons_inside_ring(u32::from(radius)) * 10 / tiles_per_10;
        let duration = u16::try_from(ticks).unwrap_or(u16::MAX);
        self.blocking = B::WaitingForSensingCompleted { radius, ticks_left: duration };
        if radius > 0 {
            self.emit(ctx, MachineEventKind::Sensed { radius, duration });
        }
    }

    pub(super) fn command_turn(&mut self, direction: TurnDirection, turns: u16) {
        if self.propulsion.is_moving() {
            return;
        }
        let turns = if turns > MAX_FACE_TURNS_LIMIT {
            MAX_FACE_TURNS_LIMIT + turns % MAX_FACE_TURNS_LIMIT
        } else {
            turns
        };
        if turns > 0 {
            self.propulsion.start_n_face_turns(direction, turns);
            self.blocking = B::WaitingForNFaceTurns;
        }
    }

    pub(super) fn command_advance(&mut self, ctx: &mut MachineContext<'_>, tiles: u16, store_at: Option<u16>) {
        if self.propulsion.is_moving() {
            return;
        }
        if tiles > 0 && self.hardware.is_mobile() {
            self.blocking = B::WaitingForNTileMoves { store_at };
            self.propulsion.start_n_tile_move(ctx.grid, tiles);
        } else if let Some(line) = store_at {
            self.store(line, 0);
        }
    }

    /// Copy `n` lines from `from` to `to`. Both ranges wrap around the
    /// program; overlapping ranges copy as if through a buffer.
    pub(super) fn command_copy_code(&mut self, from: u16, to: u16, n: u16) {
        let buffer: Vec<Instruction> = (0..n).map(|i| self.code[from.wrapping_add(i)]).collect();
        for (i, ins) in (0..n).zip(buffer) {
            self.code[to.wrapping_add(i)] = ins;
        }
    }

    /// Exchange `n` lines at `a` with `n` lines at `b`, through a buffer.
    pub(super) fn command_swap_code(&mut self, a: u16, b: u16, n: u16) {
        let first: Vec<Instruction> = (0..n).map(|i| self.code[a.wrapping_add(i)]).collect();
        let second: Vec<Instruction> = (0..n).map(|i| self.code[b.wrapping_add(i)]).collect();
        for (i, ins) in (0..n).zip(second) {
            self.code[a.wrapping_add(i)] = ins;
        }
        for (i, ins) in (0..n).zip(first) {
            self.code[b.wrapping_add(i)] = ins;
        }
    }

    pub(super) fn command_move_msg_to_msgbuf(&mut self, n: u16) {
        let n = usize::from(n);
        if n < self.messages.len() {
            self.current_message = Some(self.messages.remove(n));
        }
    }

    /// Copy `count` lines of the current message, from its line `src + 1`,
    /// into the program at `dest`. Lines past the end of the message copy as
    /// no-ops and nothing is written past the end of the program.
    pub(super) fn command_copy_msgbuf_code(&mut self, src: u16, dest: u16, count: u16) {
        let size = self.code.size();
        if usize::from(dest) >= size {
            return;
        }
        let Some(msg) = self.current_message.clone() else {
            return;
        };
        let available = usize::from(src.saturating_add(count)).min(msg.size());
        let lines: Vec<Instruction> = (usize::from(src)..available)
            .map(|i| msg[(i + 1) as u16])
            .chain(std::iter::repeat(Instruction::nop()))
            .take(usize::from(count).min(size - usize::from(dest)))
            .collect();
        for (i, ins) in lines.into_iter().enumerate() {
            self.code[dest + i as u16] = ins;
        }
    }

    pub(super) fn message_line_count(&self) -> u16 {
        self.current_message.as_ref().map_or(0, |m| m.size() as u16)
    }

    fn is_valid_instruction_range(&self, begin: u16, len: u16) -> bool {
        let size = self.code.size();
        let (begin, len) = (usize::from(begin), usize::from(len));
        begin > 0 && len > 0 && begin - 1 < size && begin + len - 1 <= size
    }

    pub(super) fn command_broadcast(&mut self, range: u16, begin: u16, len: u16) {
        let range = range.min(self.hardware.max_broadcast_range());
        let cost_left = range
            .saturating_mul(self.hardware.cap_broadcast_cost_per_tile())
            .saturating_add(1);
        self.blocking = B::WaitingForBroadcastCapCostToBePaid { cost_left, range, begin, len };
    }

    pub(super) fn command_transmit(&mut self, to: HexCoord, begin: u16, len: u16) {
        let distance = step_distance_between(self.board_xy(), to);
        if distance <= self.hardware.max_transmit_range() {
            let cost_left = distance
                .saturating_mul(self.hardware.cap_transmit_cost_per_tile())
                .saturating_add(1);
            self.blocking = B::WaitingForTransmitCapCostToBePaid { cost_left, to, begin, len };
        }
    }

    fn do_broadcast(&mut self, ctx: &mut MachineContext<'_>, range: u16, begin: u16, len: u16) {
        if self.is_valid_instruction_range(begin, len) {
            let code_id = self.push_code(self.code.subset(begin, usize::from(len)));
            self.emit(ctx, MachineEventKind::Broadcasted { xy: self.board_xy(), code_id, range });
        }
    }

    fn do_transmission(&mut self, ctx: &mut MachineContext<'_>, to: HexCoord, begin: u16, len: u16) {
        if self.is_valid_instruction_range(begin, len) {
            let code_id = self.push_code(self.code.subset(begin, usize::from(len)));
            self.emit(ctx, MachineEventKind::Transmitted { code_id, to });
        }
    }

    pub(super) fn can_build(&self, blueprint: u16) -> bool {
        self.known_blueprints
            .get(usize::from(blueprint))
            .is_some_and(|bp| self.cargo.cargo_contents().can_afford(bp.build_cost()))
    }

    /// Start building known blueprint `blueprint` on the tile in front. The
    /// build cost is taken from the cargohold up front.
    pub(super) fn command_build(&mut self, ctx: &mut MachineContext<'_>, blueprint: u16, begin: u16, len: u16) {
        if !self.can_build(blueprint) {
            return;
        }
        let Some(site) = ctx
            .grid
            .try_get_neighbour_tile(self.board_xy(), self.facing())
            .filter(|&xy| ctx.grid.is_tile_empty_and_unreserved(xy))
        else {
            return;
        };
        ctx.grid.reserve_empty_tile(site);

        let bp = &self.known_blueprints[usize::from(blueprint)];
        let components = bp.component_count();
        let time = f32::from(self.hardware.ticks_to_build_a_component()) * components as f32 * (1.0 + bp.build_complexity());
        let ticks = time.clamp(0.0, f32::from(u16::MAX)) as u16;
        let cap = (usize::from(self.hardware.capcost_to_build_10_components()) * components).min(usize::from(u16::MAX)) as u16;
        let cost = *bp.build_cost();
        self.cargo.destroy_cargo(&cost);

        self.blocking = B::WaitingForBuildToComplete {
            ticks_left: ticks,
            ticks_total: ticks,
            cap_left: cap,
            blueprint,
            site,
            begin,
            len,
        };
        self.emit(ctx, MachineEventKind::StartedBuild { site, blueprint });
    }

    // A bad boot code range gets the default program.
    fn complete_build(&mut self, ctx: &mut MachineContext<'_>, blueprint: u16, site: HexCoord, begin: u16, len: u16) {
        let boot = if self.is_valid_instruction_range(begin, len) {
            self.code.subset(begin, usize::from(len))
        } else {
            Instructions::default()
        };
        let code_id = self.push_code(boot);
        self.emit(ctx, MachineEventKind::CompletedBuild { site, blueprint, code_id });
    }

    fn is_machine_alongside(&self, grid: &GameHexGrid, xy: HexCoord) -> bool {
        step_distance_between(self.board_xy(), xy) == 1 && grid.is_on_board(xy) && grid.contents(xy) & BOT != 0
    }

    pub(super) fn command_give_cargo_to(&mut self, ctx: &mut MachineContext<'_>, to: HexCoord, tradable: u16, units: u16) {
        let Some(t) = TradableType::from_index(tradable) else {
            return;
        };
        if units > 0 && self.cargo.count_of(t) >= units && self.is_machine_alongside(ctx.grid, to) {
            self.emit(ctx, MachineEventKind::CargoTransferred { from: self.board_xy(), to, tradable, units });
            self.synch(1);
        }
    }

    pub(super) fn command_take_cargo_from(&mut self, ctx: &mut MachineContext<'_>, from: HexCoord, tradable: u16, units: u16) {
        if units > 0 && usize::from(tradable) < TRADABLE_TYPES_COUNT && self.is_machine_alongside(ctx.grid, from) {
            self.emit(ctx, MachineEventKind::CargoTransferred { from, to: self.board_xy(), tradable, units });
            self.synch(1);
        }
    }

    /// Ticks to refine one unit of `ore`.
    pub(super) fn refine_period(&self, ore: TradableType) -> u16 {
        let period = (refine_period_factor(ore) * f32::from(self.hardware.refine_period())).ceil();
        (period.clamp(1.0, f32::from(u16::MAX))) as u16
    }

    pub(super) fn command_refine(&mut self, units: u16, ore: u16) {
        if let Some(&ore) = TradableType::ORES.get(usize::from(ore)) {
            self.start_refining_cycle(units, ore);
        }
    }

    // Each cycle consumes one unit of ore up front.
    fn start_refining_cycle(&mut self, units: u16, ore: TradableType) {
        let one = Amount::of(ore, 1);
        if units == 0 || !self.cargo.contains_at_least(&one) {
            return;
        }
        self.cargo.destroy_cargo(&one);
        self.blocking = B::WaitingForRefiningCycleToEnd {
            cap_left: self.hardware.cap_refine_cost(),
            ticks_left: self.refine_period(ore),
            units_left: units - 1,
            ore,
        };
    }

    pub(super) fn command_self_destruct(&mut self, ctx: &mut MachineContext<'_>, countdown: u16) {
        if self.self_destruct_triggered {
            return;
        }
        self.self_destruct_triggered = true;
        if countdown == 0 {
            self.blocking = B::WaitingForever;
        }
        self.emit(ctx, MachineEventKind::InitiatedSelfDestruct { countdown });
    }

    fn can_move_to(&self, grid: &GameHexGrid, xy: HexCoord) -> bool {
        self.hardware.is_mobile() && xy != self.board_xy() && grid.is_on_board(xy)
    }

    pub(super) fn command_navigate_to(&mut self, ctx: &mut MachineContext<'_>, xy: HexCoord) {
        if self.can_move_to(ctx.grid, xy) {
            self.begin_navigation(ctx, xy, 0);
        }
    }

    pub(super) fn command_navigate_n_towards(&mut self, ctx: &mut MachineContext<'_>, n: u16, xy: HexCoord) {
        if n > 0 && self.can_move_to(ctx.grid, xy) {
            self.begin_navigation(ctx, xy, n);
        }
    }

    // A neighbouring goal needs no search.
    fn begin_navigation(&mut self, ctx: &mut MachineContext<'_>, goal: HexCoord, path_limit: u16) {
        let start = self.board_xy();
        if step_distance_between(start, goal) == 1 {
            self.switch_to_navigation(make_path_instructions(&[start, goal], self.facing()));
            return;
        }
        if let Some(old) = self.search.take() {
            ctx.pathfinder.cancel(old);
        }
        let request = PathRequest {
            start,
            goal,
            facing: self.facing(),
            search_centre: start,
            search_radius: self.hardware.max_sensing_radius(),
            path_limit,
        };
        self.search = Some(ctx.pathfinder.search_for_path_between(&request, ctx.grid, &self.path_costs));
        self.blocking = B::WaitingForAStarRoute { frames: 2 };
    }

    fn complete_search_and_start_navigating(&mut self, ctx: &mut MachineContext<'_>) {
        let code = self
            .search
            .take()
            .and_then(|id| ctx.pathfinder.take_path_instructions(id))
            .unwrap_or_default();
        self.switch_to_navigation(code);
    }

    fn switch_to_navigation(&mut self, code: Vec<Instruction>) {
        self.navigation = Navigation {
            active: !code.is_empty(),
            code,
            ptr: 0,
            expected_facing: self.facing(),
            expected_xy: self.board_xy(),
        };
    }

    pub(super) fn command_set_astar_weight(&mut self, tile_type: u16, weight: u16) {
        self.path_costs.set_cost(tile_type % 3, weight);
    }

    pub(super) fn astar_weight(&self, tile_type: u16) -> u16 {
        u16::from(self.path_costs.cost(tile_type % 3))
    }

    fn in_sensor_range(&self, xy: HexCoord) -> bool {
        step_distance_between(self.board_xy(), xy) <= self.hardware.max_sensing_radius()
    }

    /// Plot a route from `a` to `b` without moving. Both ends must be on
    /// the board and within sensing range.
    pub(super) fn command_plot_route_between(&mut self, ctx: &mut MachineContext<'_>, a: HexCoord, b: HexCoord) {
        self.route.clear();
        if a == b
            || !ctx.grid.is_on_board(a)
            || !ctx.grid.is_on_board(b)
            || !self.in_sensor_range(a)
            || !self.in_sensor_range(b)
        {
            return;
        }
        if step_distance_between(a, b) == 1 {
            self.route = vec![a, b];
            return;
        }
        if let Some(old) = self.search.take() {
            ctx.pathfinder.cancel(old);
        }
        let request = PathRequest {
            start: a,
            goal: b,
            facing: self.facing(),
            search_centre: self.board_xy(),
            search_radius: self.hardware.max_sensing_radius(),
            path_limit: 0,
        };
        self.search = Some(ctx.pathfinder.search_for_path_between(&request, ctx.grid, &self.path_costs));
        self.blocking = B::WaitingForRoutePlot { frames: 2 };
    }

    fn complete_route_plotting(&mut self, ctx: &mut MachineContext<'_>) {
        self.route = self
            .search
            .take()
            .and_then(|id| ctx.pathfinder.take_path(id))
            .unwrap_or_default();
    }

    pub(super) fn route_length(&self) -> u16 {
        u16::try_from(self.route.len()).unwrap_or(u16::MAX)
    }

    /// Write `n` route tiles, starting at route index `from`, as location
    /// lines from line `to`. The route index wraps.
    pub(super) fn command_copy_route(&mut self, from: u16, to: u16, n: u16) {
        if self.route.is_empty() {
            return;
        }
        for i in 0..n {
            let xy = self.route[(usize::from(from) + usize::from(i)) % self.route.len()];
            self.store_location(to.wrapping_add(i), xy);
        }
    }

    /// Raise a market request and wait a frame for the answer.
    pub(super) fn trade_synch(
        &mut self,
        ctx: &mut MachineContext<'_>,
        trade_type: TradeType,
        tradable: u16,
        quantity: u16,
        store_at: Option<u16>,
    ) {
        // Programs cannot name a limit, so a purchase accepts any price.
        let price_limit = if trade_type == TradeType::Buying { u16::MAX } else { 0 };
        ctx.trades.push(TradeRequest {
            customer: self.id,
            trade_type,
            commodity: tradable_of(tradable),
            quantity,
            price_limit,
        });
        self.blocking = B::WaitingForTrade { frames: 1, store_at };
    }

    pub(super) fn command_for_sale(&mut self, tradable: u16, quantity: u16, price: u16) {
        self.for_sale.set(tradable_of(tradable), quantity, price);
    }

    pub(super) fn command_cancel_sales(&mut self) {
        self.for_sale.cancel_all();
    }

    pub(super) fn command_transfer_credits_to(&mut self, ctx: &mut MachineContext<'_>, to: HexCoord, amount: u16) {
        if amount <= self.credits {
            self.emit(ctx, MachineEventKind::TransferCash { to, amount });
        }
        self.synch(1);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::TestWorld;
    use super::*;
    use crate::hex::HexFacing;

    fn create_test_machine(w: &mut TestWorld, code: &str) -> Machine {
        w.place(0, HexCoord::new(5, 5), code)
    }

    #[test]
    fn test_sensing_blocks_then_reports() {
        let mut w = TestWorld::new();
        w.grid.place_asteroid_on_tile(HexCoord::new(5, 7)).unwrap();
        let mut m = create_test_machine(&mut w, "sense( 2 )\ngoto 2");
        w.frame(&mut m);
        assert!(matches!(m.blocking_condition(), B::WaitingForSensingCompleted { radius: 2, .. }));
        assert_eq!(w.event_names(), vec!["sensed"]);
        // 19 tiles at 100 tiles per 10 ticks.
        assert!(matches!(w.events[0].kind, MachineEventKind::Sensed { radius: 2, duration: 1 }));
        w.frames(&mut m, 3);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
        assert_eq!(m.sense.count(), 2);
        assert_eq!(m.sense.location(1), HexCoord::new(5, 7));
    }

    #[test]
    fn test_short_cap_senses_less_far() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.capacitance = 10;
        // Radius 2 costs 18, radius 1 costs 6.
        assert_eq!(m.cap_try_extract_sensing(2), 1);
        assert_eq!(m.capacitance(), 4);
        assert_eq!(m.cap_try_extract_sensing(4), 0);
    }

    #[test]
    fn test_synch_waits_whole_frames() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "synch( 3 )\n[1] = 7\ngoto 2");
        w.frame(&mut m);
        assert_eq!(m.blocking_condition(), B::WaitingForSynch { frames: 3 });
        w.frames(&mut m, 2);
        assert!(m.code()[1].arg(0) != 7);
        w.frame(&mut m);
        assert!(m.code()[1].is_value());
        assert_eq!(m.code()[1].arg(0), 7);
    }

    #[test]
    fn test_copy_code_wraps_through_buffer() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "1\n2\n3\n4");
        m.command_copy_code(3, 4, 3);
        let values: Vec<_> = m.code().iter().map(|i| i.signed_arg(0)).collect();
        assert_eq!(values, vec![4, 1, 3, 3]);
        m.command_swap_code(1, 2, 1);
        let values: Vec<_> = m.code().iter().map(|i| i.signed_arg(0)).collect();
        assert_eq!(values, vec![1, 4, 3, 3]);
    }

    #[test]
    fn test_msgbuf_copy_pads_and_clips() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "0\n0\n0\n0\n0");
        m.receive_broadcast(std::sync::Arc::new("5\n6".parse().unwrap()));
        m.command_copy_msgbuf_code(0, 2, 9);
        assert!(m.code()[2].is_value());
        // Nothing to copy yet.
        assert_eq!(m.code()[2].arg(0), 0);
        m.command_move_msg_to_msgbuf(0);
        assert_eq!(m.message_count(), 0);
        assert_eq!(m.message_line_count(), 2);
        m.command_copy_msgbuf_code(0, 2, 9);
        let values: Vec<_> = m.code().iter().map(|i| (i.is_nop(), i.signed_arg(0))).collect();
        assert_eq!(values, vec![(false, 0), (false, 5), (false, 6), (true, 0), (false, 0)]);
        m.command_copy_msgbuf_code(0, 5, 1);
        assert!(m.code()[5].is_value());
    }

    #[test]
    fn test_instruction_range_validity() {
        let mut w = TestWorld::new();
        let m = create_test_machine(&mut w, "1\n2\n3");
        assert!(m.is_valid_instruction_range(1, 3));
        assert!(m.is_valid_instruction_range(3, 1));
        assert!(!m.is_valid_instruction_range(0, 1));
        assert!(!m.is_valid_instruction_range(2, 3));
        assert!(!m.is_valid_instruction_range(1, 0));
    }

    #[test]
    fn test_broadcast_pays_then_sends() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "broadcast( 9, 1, 2 )\ngoto 2");
        w.frame(&mut m);
        // Range is cut to 5, costing 11 in all.
        assert!(matches!(
            m.blocking_condition(),
            B::WaitingForBroadcastCapCostToBePaid { range: 5, cost_left: 11, .. }
        ));
        w.frame(&mut m);
        assert_eq!(m.blocking_condition(), B::WaitingForSynch { frames: 1 });
        let sent = w.events.iter().find_map(|e| match e.kind {
            MachineEventKind::Broadcasted { code_id, range, .. } => Some((code_id, range)),
            _ => None,
        });
        let (code_id, range) = sent.unwrap();
        assert_eq!(range, 5);
        assert_eq!(m.pop_code(code_id).unwrap().size(), 2);
    }

    #[test]
    fn test_transmit_out_of_range_is_ignored() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_transmit(HexCoord::new(15, 5), 1, 1);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
        m.command_transmit(HexCoord::new(7, 5), 1, 1);
        assert!(matches!(
            m.blocking_condition(),
            B::WaitingForTransmitCapCostToBePaid { cost_left: 5, .. }
        ));
    }

    #[test]
    fn test_build_reserves_site_and_completes() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "build( 1, 1, 2 )\ngoto 2");
        assert!(m.cargo_mut().try_add_cargo(&Amount::of(TradableType::Metals, 6)));
        w.frame(&mut m);
        let site = HexCoord::new(5, 4);
        assert!(w.grid.is_tile_reserved(site));
        assert_eq!(m.cargo().count_of(TradableType::Metals), 1);
        assert!(matches!(m.blocking_condition(), B::WaitingForBuildToComplete { blueprint: 1, .. }));
        assert_eq!(m.reserved_tiles(), vec![site]);
        assert!(w.events.iter().any(|e| e.kind == MachineEventKind::StartedBuild { site, blueprint: 1 }));

        w.frames(&mut m, 200);
        let done = w.events.iter().find_map(|e| match e.kind {
            MachineEventKind::CompletedBuild { site: s, blueprint, code_id } => Some((s, blueprint, code_id)),
            _ => None,
        });
        let (s, blueprint, code_id) = done.unwrap();
        assert_eq!((s, blueprint), (site, 1));
        let child = m.build_machine(blueprint, code_id).unwrap();
        assert_eq!(child.code().size(), 2);
    }

    #[test]
    fn test_build_needs_cargo() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "build( 1, 1, 2 )\ngoto 2");
        w.frame(&mut m);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
        assert!(!w.grid.is_tile_reserved(HexCoord::new(5, 4)));
        assert!(w.events.is_empty());
    }

    #[test]
    fn test_refining_turns_ore_into_goods() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "refine( 2, 0 )\ngoto 2");
        let ore = TradableType::ORES[0];
        assert!(m.cargo_mut().try_add_cargo(&Amount::of(ore, 3)));
        w.frame(&mut m);
        assert!(matches!(m.blocking_condition(), B::WaitingForRefiningCycleToEnd { units_left: 1, .. }));
        assert_eq!(m.cargo().count_of(ore), 2);
        w.frames(&mut m, 20);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
        assert_eq!(m.cargo().count_of(ore), 1);
        assert_eq!(m.cargo().count_of(TradableType::Metals), 2);
        assert_eq!(m.cargo().count_of(TradableType::Alkalis), 2);
    }

    #[test]
    fn test_refine_period_scales_with_ore() {
        let mut w = TestWorld::new();
        let m = create_test_machine(&mut w, "goto 1");
        let periods: Vec<_> = TradableType::ORES.iter().map(|&o| m.refine_period(o)).collect();
        assert_eq!(periods, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_self_destruct_only_once() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_self_destruct(&mut w.ctx(), 0);
        m.command_self_destruct(&mut w.ctx(), 5);
        assert_eq!(m.blocking_condition(), B::WaitingForever);
        assert_eq!(w.event_names(), vec!["initiated-self-destruct"]);
    }

    #[test]
    fn test_cargo_exchange_needs_a_neighbour() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        let _other = w.place(1, HexCoord::new(5, 6), "goto 1");
        assert!(m.cargo_mut().try_add_cargo(&Amount::of(TradableType::Metals, 4)));

        m.command_give_cargo_to(&mut w.ctx(), HexCoord::new(5, 8), 4, 1);
        assert!(w.events.is_empty());
        m.command_give_cargo_to(&mut w.ctx(), HexCoord::new(5, 6), 4, 9);
        assert!(w.events.is_empty());
        m.command_give_cargo_to(&mut w.ctx(), HexCoord::new(5, 6), 4, 4);
        assert_eq!(
            w.events[0].kind,
            MachineEventKind::CargoTransferred { from: HexCoord::new(5, 5), to: HexCoord::new(5, 6), tradable: 4, units: 4 }
        );
        assert_eq!(m.blocking_condition(), B::WaitingForSynch { frames: 1 });
    }

    #[test]
    fn test_navigate_to_neighbour_skips_search() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_navigate_to(&mut w.ctx(), HexCoord::new(5, 4));
        assert!(m.navigation.active);
        assert_eq!(w.pathfinder.pending(), 0);
        m.command_navigate_to(&mut w.ctx(), HexCoord::new(5, 5));
        assert!(m.navigation.active);
    }

    #[test]
    fn test_navigate_searches_then_drives() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_navigate_to(&mut w.ctx(), HexCoord::new(5, 2));
        assert_eq!(m.blocking_condition(), B::WaitingForAStarRoute { frames: 2 });
        assert_eq!(w.pathfinder.pending(), 1);
        w.frames(&mut m, 400);
        assert_eq!(w.pathfinder.pending(), 0);
        assert_eq!(m.board_xy(), HexCoord::new(5, 2));
        assert_eq!(m.facing(), HexFacing::Tile0);
        assert!(!m.navigation.active);
    }

    #[test]
    fn test_route_plot_needs_both_ends_in_range() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_plot_route_between(&mut w.ctx(), HexCoord::new(5, 5), HexCoord::new(5, 15));
        assert_eq!(m.route_length(), 0);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
        m.command_plot_route_between(&mut w.ctx(), HexCoord::new(5, 5), HexCoord::new(5, 6));
        assert_eq!(m.route_length(), 2);
        m.command_plot_route_between(&mut w.ctx(), HexCoord::new(5, 5), HexCoord::new(5, 8));
        assert_eq!(m.blocking_condition(), B::WaitingForRoutePlot { frames: 2 });
        w.frames(&mut m, 2);
        assert_eq!(m.route_length(), 4);
        m.command_copy_route(3, 1, 2);
        assert_eq!(m.code()[1].location_value(), HexCoord::new(5, 8));
        assert_eq!(m.code()[2].location_value(), HexCoord::new(5, 5));
    }

    #[test]
    fn test_astar_weights_are_capped() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_set_astar_weight(4, 900);
        assert_eq!(m.astar_weight(1), 255);
        assert_eq!(m.astar_weight(0), 1);
    }

    #[test]
    fn test_trade_requests_wait_a_frame() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.trade_synch(&mut w.ctx(), TradeType::QueryPrice, 10, 0, Some(3));
        assert_eq!(w.trades.len(), 1);
        assert_eq!(w.trades[0].commodity, TradableType::ALL[2]);
        m.trade_reply(42);
        assert_eq!(m.code()[3].arg(0), 42);
        w.frame(&mut m);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
    }

    #[test]
    fn test_turns_are_clamped() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.command_turn(TurnDirection::Clockwise, 0);
        assert_eq!(m.blocking_condition(), B::NothingBlocking);
        m.command_turn(TurnDirection::Clockwise, 1000);
        assert_eq!(m.blocking_condition(), B::WaitingForNFaceTurns);
    }
}
