//! Instruction dispatch.

use crate::board::hits::HitByLine;
use crate::hex::{
    HexCoord, TurnDirection, calculate_neighbour_coord, clockwise_turn_count, step_distance_between,
};
use crate::instructions::opcode as op;
use crate::instructions::{Instruction, check_assert, decompile};
use crate::tradables::TradableType;

use super::args::{ArgType, Args};
use super::trade::TradeType;
use super::{Machine, MachineContext, MachineEventKind, MachineFault, Navigation};

use ArgType::{Data as D, Direction as Dir, Location as L, Value as V};

type MathOp = fn(i16, i16) -> Option<i16>;

const fn flag(b: bool) -> u16 {
    b as u16
}

impl Machine {
    /// Run the line under the instruction pointer and move on.
    pub(super) fn execute_code_instruction(&mut self, ctx: &mut MachineContext<'_>) {
        let ins = self.code[self.ip];
        if let Err(fault) = self.dispatch(ins, ctx) {
            self.signal_error(ctx, fault);
        }
        if self.ip_updated {
            self.ip_updated = false;
        } else {
            self.ip += 1;
        }
        if usize::from(self.ip) > self.code.size() {
            self.ip = 1;
        }
    }

    /// Run the next step of a synthesised route. The route is abandoned as
    /// soon as the machine is not where the previous step should have left
    /// it.
    pub(super) fn execute_navigation_instruction(&mut self, ctx: &mut MachineContext<'_>) {
        let nav = &self.navigation;
        let off_course = nav.ptr > 0 && (nav.expected_facing != self.facing() || nav.expected_xy != self.board_xy());
        let next = if off_course { None } else { nav.code.get(nav.ptr).copied() };
        let Some(ins) = next else {
            self.navigation = Navigation::default();
            return;
        };
        self.navigation.ptr += 1;
        match ins.cmd() {
            op::TURN => {
                let (turns, direction) = (ins.arg(0), TurnDirection::from_value(ins.arg(1)));
                self.navigation.expected_facing = self.propulsion.facing_after_n_turns(direction, turns);
                self.navigation.expected_xy = self.board_xy();
                self.command_turn(direction, turns);
            }
            op::ADVANCE => {
                let tiles = ins.arg(0);
                self.navigation.expected_facing = self.facing();
                self.navigation.expected_xy = calculate_neighbour_coord(self.board_xy(), self.facing(), i32::from(tiles));
                self.command_advance(ctx, tiles, None);
            }
            _ => self.navigation = Navigation::default(),
        }
    }

    fn fetch(&self, ins: &Instruction, types: &[ArgType]) -> Result<Args, MachineFault> {
        Args::fetch(&self.code, ins, types)
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&mut self, ins: Instruction, ctx: &mut MachineContext<'_>) -> Result<(), MachineFault> {
        match ins.cmd() {
            op::NOP | op::LOCATION => {}

            op::JMP => {
                let a = self.fetch(&ins, &[V])?;
                self.set_ip(a.value(0));
            }
            op::STORE_JMP => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), self.ip);
                self.set_ip(a.value(1));
            }
            op::COPY => {
                let a = self.fetch(&ins, &[D, V])?;
                if ins.is_indirection(0) {
                    self.command_copy(ins.arg(0), a.value(1));
                } else {
                    self.store(a.value(1), a.value(0));
                }
            }
            op::PRINT_TXT => self.emit(ctx, MachineEventKind::Text { text: ins.args_as_text() }),
            op::PRINT_VAL => {
                let kind = if ins.is_indirection(0) {
                    MachineEventKind::PrintInstruction { text: decompile(&self.code[ins.arg(0)]) }
                } else {
                    MachineEventKind::Text { text: ins.arg(0).to_string() }
                };
                self.emit(ctx, kind);
            }

            op::ADD => self.command_math(&ins, |a, b| Some(a.wrapping_add(b)))?,
            op::SUB => self.command_math(&ins, |a, b| Some(a.wrapping_sub(b)))?,
            op::MUL => self.command_math(&ins, |a, b| Some(a.wrapping_mul(b)))?,
            op::DIV => self.command_math(&ins, |a, b| (b != 0).then(|| a.wrapping_div(b)))?,
            op::MODULO => self.command_math(&ins, |a, b| (b != 0).then(|| a.wrapping_rem(b)))?,
            op::XOR => self.command_math(&ins, |a, b| Some(a ^ b))?,
            op::OR => self.command_math(&ins, |a, b| Some(a | b))?,
            op::AND => self.command_math(&ins, |a, b| Some(a & b))?,
            op::EQ => self.command_math(&ins, |a, b| Some(i16::from(a == b)))?,
            op::NEQ => self.command_math(&ins, |a, b| Some(i16::from(a != b)))?,
            op::BOOL_AND => self.command_math(&ins, |a, b| Some(i16::from(a != 0 && b != 0)))?,
            op::BOOL_OR => self.command_math(&ins, |a, b| Some(i16::from(a != 0 || b != 0)))?,
            op::BOOL_LT => self.command_math(&ins, |a, b| Some(i16::from(a < b)))?,
            op::BOOL_GT => self.command_math(&ins, |a, b| Some(i16::from(a > b)))?,
            op::BOOL_LTE => self.command_math(&ins, |a, b| Some(i16::from(a <= b)))?,
            op::BOOL_GTE => self.command_math(&ins, |a, b| Some(i16::from(a >= b)))?,
            op::LEFT_SHIFT => self.command_math(&ins, |a, b| {
                Some(u32::try_from(b).ok().and_then(|s| a.checked_shl(s)).unwrap_or(0))
            })?,
            op::RIGHT_SHIFT => self.command_math(&ins, |a, b| {
                Some(u32::try_from(b).ok().and_then(|s| a.checked_shr(s)).unwrap_or(if a < 0 { -1 } else { 0 }))
            })?,
            op::ABS => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), (a.value(1) as i16).unsigned_abs());
            }

            op::JMP_EQ => self.jump_if(&ins, |a, b| a == b)?,
            op::JMP_NEQ => self.jump_if(&ins, |a, b| a != b)?,
            op::JMP_LT => self.jump_if(&ins, |a, b| a < b)?,
            op::JMP_GT => self.jump_if(&ins, |a, b| a > b)?,
            op::JMP_LTE => self.jump_if(&ins, |a, b| a <= b)?,
            op::JMP_GTE => self.jump_if(&ins, |a, b| a >= b)?,

            op::ASSERT => {
                let a = self.fetch(&ins, &[V, V])?;
                let (op1, op2, operator) = (a.value(0), a.value(1), ins.arg(2));
                if !check_assert(op1, op2, operator) {
                    self.error_code = MachineFault::AssertionFailed.code();
                    self.emit(ctx, MachineEventKind::Asserted { line: self.ip, op1, op2, op: operator });
                }
            }
            op::SET_ERROR_CODE => {
                let a = self.fetch(&ins, &[V])?;
                self.error_code = a.value(0);
            }
            op::GET_ERROR_CODE => self.store_result(&ins, self.error_code)?,

            op::RAND_RANGE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                let r = Self::get_rand(ctx, a.value(1), a.value(2));
                self.store(a.value(0), r);
            }
            op::RAND => {
                let a = self.fetch(&ins, &[V])?;
                let r = Self::get_rand(ctx, 0, u16::MAX - 1);
                self.store(a.value(0), r);
            }
            op::CAP => self.store_result(&ins, self.capacitance)?,
            op::MAX_CAP => self.store_result(&ins, self.hardware.cap_capacity())?,
            op::SYNCH => {
                let a = self.fetch(&ins, &[V])?;
                self.synch(a.value(0));
            }

            op::SENSE_MAX => self.command_sense(ctx, self.hardware.max_sensing_radius()),
            op::SENSE => {
                let a = self.fetch(&ins, &[V])?;
                self.command_sense(ctx, a.value(0));
            }
            op::SENSE_RESULT_COUNT => self.store_result(&ins, self.sense.count())?,
            op::SENSE_RESULT_LOCATION => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store_location(a.value(0), self.sense.location(a.value(1)));
            }
            op::SENSE_RESULT_TYPE => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), self.sense.result_type(a.value(1)));
            }
            op::MAX_SENSE_RANGE => self.store_result(&ins, self.hardware.max_sensing_radius())?,

            op::TURN => {
                let a = self.fetch(&ins, &[V, Dir])?;
                self.command_turn(a.direction(1), a.value(0));
            }
            op::ADVANCE => {
                let a = self.fetch(&ins, &[V])?;
                self.command_advance(ctx, a.value(0), None);
            }
            op::ADVANCE_WITH_STORE => {
                let a = self.fetch(&ins, &[V, V])?;
                self.command_advance(ctx, a.value(0), Some(a.value(1)));
            }

            op::CW_TURN_COUNT_TO => {
                let a = self.fetch(&ins, &[V, L])?;
                let n = clockwise_turn_count(self.board_xy(), self.facing(), a.location(1));
                self.store(a.value(0), n as u16);
            }
            op::DISTANCE_TO => {
                let a = self.fetch(&ins, &[V, L])?;
                self.store(a.value(0), step_distance_between(self.board_xy(), a.location(1)));
            }
            op::DISTANCE_BETWEEN => {
                let a = self.fetch(&ins, &[V, L, L])?;
                self.store(a.value(0), step_distance_between(a.location(1), a.location(2)));
            }
            op::GET_LOCATION => {
                let a = self.fetch(&ins, &[V])?;
                self.store_location(a.value(0), self.board_xy());
            }
            op::LINENUMBER => self.store_result(&ins, self.ip)?,
            op::GET_LINENUMBER_PLUS => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), a.value(1).wrapping_add(self.ip));
            }
            op::LINE_COUNT => self.store_result(&ins, self.code.size() as u16)?,
            op::IS_LOCATION => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), flag(self.code[a.value(1)].cmd() == op::LOCATION));
            }
            op::COMPARE_CODE_LINE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.store(a.value(0), flag(self.code[a.value(1)] == self.code[a.value(2)]));
            }
            op::SWAP_CODE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_swap_code(a.value(0), a.value(1), a.value(2));
            }
            op::COPY_CODE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_copy_code(a.value(0), a.value(1), a.value(2));
            }

            op::MAX_TRANSMIT_RANGE => self.store_result(&ins, self.hardware.max_transmit_range())?,
            op::TRANSMIT => {
                let a = self.fetch(&ins, &[L, V, V])?;
                self.command_transmit(a.location(0), a.value(1), a.value(2));
            }
            op::MAX_BROADCAST_RANGE => self.store_result(&ins, self.hardware.max_broadcast_range())?,
            op::BROADCAST => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_broadcast(a.value(0), a.value(1), a.value(2));
            }
            op::MSG_CLEAR_MSGS => self.messages.clear(),
            op::COPY_MSGBUF_CODE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_copy_msgbuf_code(a.value(0), a.value(1), a.value(2));
            }
            op::MOVE_MSG_MSGBUF => {
                let a = self.fetch(&ins, &[V])?;
                self.command_move_msg_to_msgbuf(a.value(0));
            }
            op::MSGBUF_LINE_COUNT => self.store_result(&ins, self.message_line_count())?,
            op::GET_MSGS_COUNT => self.store_result(&ins, self.messages.len() as u16)?,
            op::GET_MAX_MSGS => self.store_result(&ins, self.hardware.max_stored_messages())?,

            op::GET_BLUEPRINT_COUNT => self.store_result(&ins, self.known_blueprints.len() as u16)?,
            op::CAN_BUILD => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), flag(self.can_build(a.value(1))));
            }
            op::BUILD => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_build(ctx, a.value(0), a.value(1), a.value(2));
            }

            op::CAN_AIM_AT => {
                let a = self.fetch(&ins, &[V, L])?;
                self.store(a.value(0), flag(self.hardpoints.can_aim_at(a.location(1))));
            }
            op::AIM_AT => {
                let a = self.fetch(&ins, &[L])?;
                self.hardpoints.aim_at(a.location(0));
            }
            op::CAN_FIRE_AT => {
                let a = self.fetch(&ins, &[V, L])?;
                let n = self.hardpoints.can_fire_at(self.capacitance, a.location(1));
                self.store(a.value(0), n as u16);
            }
            op::FIRE_AT => {
                let a = self.fetch(&ins, &[L])?;
                self.command_fire_at(ctx, a.location(0));
            }
            op::HAS_LINE_OF_FIRE_TO => {
                let a = self.fetch(&ins, &[V, L])?;
                let clear = self.has_line_of_fire_to(ctx, a.location(1));
                self.store(a.value(0), clear);
            }
            op::SELF_DESTRUCT => {
                let a = self.fetch(&ins, &[V])?;
                self.command_self_destruct(ctx, a.value(0));
            }

            op::IS_CARGO_LOCKED => self.store_result(&ins, flag(self.cargo.is_locked()))?,
            op::LOCK_CARGO => {
                let a = self.fetch(&ins, &[V])?;
                self.cargo.set_locked(a.value(0) > 0);
            }
            op::CARGOHOLD_FREE_SPACE => self.store_result(&ins, self.cargo.free_volume())?,
            op::CARGOHOLD_SPACE_USED => self.store_result(&ins, self.cargo.used_volume())?,
            op::CARGOHOLD_VOLUME => self.store_result(&ins, self.cargo.total_volume())?,
            op::CARGOHOLD_UNITS_OF => {
                let a = self.fetch(&ins, &[V, V])?;
                let units = TradableType::from_index(a.value(1)).map_or(0, |t| self.cargo.count_of(t));
                self.store(a.value(0), units);
            }
            op::CARGOHOLD_VOL_OF => {
                let a = self.fetch(&ins, &[V, V])?;
                let volume = TradableType::from_index(a.value(1))
                    .map_or(0, |t| t.volume_of_n_units(u32::from(self.cargo.count_of(t))));
                self.store(a.value(0), volume as u16);
            }
            op::GIVE_CARGO_TO => {
                let a = self.fetch(&ins, &[L, V, V])?;
                self.command_give_cargo_to(ctx, a.location(0), a.value(1), a.value(2));
            }
            op::TAKE_CARGO_FROM => {
                let a = self.fetch(&ins, &[L, V, V])?;
                self.command_take_cargo_from(ctx, a.location(0), a.value(1), a.value(2));
            }

            op::NAVIGATE_TO => {
                let a = self.fetch(&ins, &[L])?;
                self.command_navigate_to(ctx, a.location(0));
            }
            op::NAVIGATE_N_TOWARDS => {
                let a = self.fetch(&ins, &[V, L])?;
                self.command_navigate_n_towards(ctx, a.value(0), a.location(1));
            }
            op::SET_ASTAR_WEIGHT => {
                let a = self.fetch(&ins, &[V, V])?;
                self.command_set_astar_weight(a.value(0), a.value(1));
            }
            op::GET_ASTAR_WEIGHT => {
                let a = self.fetch(&ins, &[V, V])?;
                self.store(a.value(0), self.astar_weight(a.value(1)));
            }
            op::PLOT_ROUTE_BETWEEN => {
                let a = self.fetch(&ins, &[L, L])?;
                self.command_plot_route_between(ctx, a.location(0), a.location(1));
            }
            op::GET_ROUTE_LENGTH => self.store_result(&ins, self.route_length())?,
            op::COPY_ROUTE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_copy_route(a.value(0), a.value(1), a.value(2));
            }

            op::REFINE => {
                let a = self.fetch(&ins, &[V, V])?;
                self.command_refine(a.value(0), a.value(1));
            }
            op::GET_REFINE_PERIOD => {
                let a = self.fetch(&ins, &[V, V])?;
                let ore = TradableType::ORES[usize::from(a.value(1)) % TradableType::ORES.len()];
                self.store(a.value(0), self.refine_period(ore));
            }

            op::GET_PRICE => {
                let a = self.fetch(&ins, &[V, V])?;
                self.trade_synch(ctx, TradeType::QueryPrice, a.value(1), 0, Some(a.value(0)));
            }
            op::GET_AVAILABILITY => {
                let a = self.fetch(&ins, &[V, V])?;
                self.trade_synch(ctx, TradeType::QueryAvailability, a.value(1), 0, Some(a.value(0)));
            }
            op::TRY_BUY => {
                let a = self.fetch(&ins, &[V, V])?;
                self.trade_synch(ctx, TradeType::Buying, a.value(0), a.value(1), None);
            }
            op::TRY_BUY_WITH_STORE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.trade_synch(ctx, TradeType::Buying, a.value(1), a.value(2), Some(a.value(0)));
            }
            op::FOR_SALE => {
                let a = self.fetch(&ins, &[V, V, V])?;
                self.command_for_sale(a.value(0), a.value(1), a.value(2));
            }
            op::CANCEL_SALES => self.command_cancel_sales(),
            op::GET_CREDITS_BALANCE => self.store_result(&ins, self.credits)?,
            op::TRANSFER_CREDITS_TO => {
                let a = self.fetch(&ins, &[L, V])?;
                self.command_transfer_credits_to(ctx, a.location(0), a.value(1));
            }

            _ => return Err(MachineFault::UnknownInstruction),
        }
        Ok(())
    }

    // `[d] = f()` forms.
    fn store_result(&mut self, ins: &Instruction, v: u16) -> Result<(), MachineFault> {
        let a = self.fetch(ins, &[V])?;
        self.store(a.value(0), v);
        Ok(())
    }

    // Arithmetic is on signed 16 bit values and wraps. `None` from the
    // operator is a program error.
    fn command_math(&mut self, ins: &Instruction, math: MathOp) -> Result<(), MachineFault> {
        let a = self.fetch(ins, &[V, V, V])?;
        let result = math(a.value(1) as i16, a.value(2) as i16).ok_or(MachineFault::ProgramRaisedError)?;
        self.store(a.value(0), result as u16);
        Ok(())
    }

    // Comparisons are unsigned, and locations compare by their packed value.
    fn jump_if(&mut self, ins: &Instruction, cond: fn(u16, u16) -> bool) -> Result<(), MachineFault> {
        let a = self.fetch(ins, &[D, D, V])?;
        if cond(a.value(0), a.value(1)) {
            self.set_ip(a.value(2));
        }
        Ok(())
    }

    fn command_fire_at(&mut self, ctx: &mut MachineContext<'_>, target: HexCoord) {
        let shots = self.hardpoints.fire_at(ctx.rng, &mut self.capacitance, target);
        if shots.is_empty() {
            return;
        }
        let firer = self.board_xy();
        for shot in shots {
            self.emit(ctx, MachineEventKind::Fired { firer, target, shot });
        }
        self.synch(1);
    }

    // Neighbours are always in the clear; a machine is never clear of itself.
    fn has_line_of_fire_to(&self, ctx: &MachineContext<'_>, target: HexCoord) -> u16 {
        let from = self.board_xy();
        let distance = step_distance_between(from, target);
        if distance > 1 {
            flag(ctx.grid.find_first_hit_by_line(from, target, distance).is_none())
        } else {
            distance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::BlockingCondition;
    use super::super::tests::TestWorld;
    use super::*;
    use crate::hex::HexFacing;
    use crate::instructions::opcode::VALUE_ARG0;
    use crate::instructions::pack_assert_op;
    use crate::tradables::Amount;

    fn create_test_machine(w: &mut TestWorld, code: &str) -> Machine {
        w.place(0, HexCoord::new(5, 5), code)
    }

    fn run(code: &str, frames: usize) -> (Machine, TestWorld) {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, code);
        w.frames(&mut m, frames);
        (m, w)
    }

    fn value_at(m: &Machine, line: u16) -> i16 {
        assert!(m.code()[line].is_value(), "line {line} is not a value");
        m.code()[line].signed_arg(0)
    }

    #[test]
    fn test_arithmetic_wraps() {
        let (m, _) = run("[5] = 32767 + 1\n[6] = 7 / 2\n[7] = -7 % 3\ngoto 4\n0\n0\n0", 1);
        assert_eq!(value_at(&m, 5), i16::MIN);
        assert_eq!(value_at(&m, 6), 3);
        assert_eq!(value_at(&m, 7), -1);
        assert_eq!(m.error_code(), 0);
    }

    #[test]
    fn test_compound_assignment() {
        let (m, _) = run("[4] += 5\n[4] *= 3\ngoto 3\n2", 1);
        assert_eq!(value_at(&m, 4), 21);
    }

    #[test]
    fn test_division_by_zero_faults() {
        let (m, w) = run("[3] = 1 / 0\ngoto 2\n0", 1);
        assert_eq!(m.error_code(), MachineFault::ProgramRaisedError.code());
        assert_eq!(value_at(&m, 3), 0);
        assert_eq!(
            w.events[0].kind,
            MachineEventKind::Error { line: 1, fault: MachineFault::ProgramRaisedError }
        );
    }

    #[test]
    fn test_math_on_a_location_faults() {
        let (m, w) = run("[4] = [3] + 1\ngoto 2\nlocation( 1, 1 )\n0", 1);
        assert_eq!(m.error_code(), MachineFault::ExpectedValueNotFoundAtLine.code());
        assert_eq!(w.event_names(), vec!["error"]);
    }

    #[test]
    fn test_out_of_range_shifts() {
        let (m, _) = run("[4] = 1 << 20\n[5] = -8 >> 20\ngoto 3\n9\n9", 1);
        assert_eq!(value_at(&m, 4), 0);
        assert_eq!(value_at(&m, 5), -1);
    }

    #[test]
    fn test_conditional_jumps_compare_unsigned() {
        let (m, _) = run("if [6] > 3 goto 4\n[7] = 1\ngoto 3\n[7] = 2\ngoto 5\n-1\n0", 1);
        assert_eq!(value_at(&m, 7), 2);
        let (m, _) = run("if [6] goto 4\n[7] = 1\ngoto 3\n[7] = 2\ngoto 5\n0\n0", 1);
        assert_eq!(value_at(&m, 7), 1);
    }

    #[test]
    fn test_store_and_goto_records_the_calling_line() {
        let (m, _) = run("store_and_goto( 4, 3 )\ngoto 2\ngoto 3\n0", 1);
        assert_eq!(value_at(&m, 4), 1);
        assert_eq!(m.instruction_pointer(), 3);
    }

    #[test]
    fn test_copy_moves_whole_lines() {
        let (m, _) = run("[4] = [3]\ngoto 2\nlocation( 2, 3 )\n0", 1);
        assert!(m.code()[4].is_location());
        assert_eq!(m.code()[4].location_value(), HexCoord::new(2, 3));

        let (m, _) = run("[[5]] = 9\ngoto 2\n0\n0\n4", 1);
        assert_eq!(value_at(&m, 4), 9);
    }

    #[test]
    fn test_failed_assert_reports() {
        let (m, w) = run("assert( [3] == 2 )\ngoto 2\n1", 1);
        assert_eq!(m.error_code(), MachineFault::AssertionFailed.code());
        assert_eq!(
            w.events[0].kind,
            MachineEventKind::Asserted { line: 1, op1: 1, op2: 2, op: pack_assert_op("==") }
        );
        let (m, w) = run("assert( [3] == 1 )\ngoto 2\n1", 1);
        assert_eq!(m.error_code(), 0);
        assert!(w.events.is_empty());
    }

    #[test]
    fn test_print_forms() {
        let (m, w) = run("print( \"HI\" )\nprint( 42 )\nprint( [4] )\ngoto 4", 1);
        let texts: Vec<_> = w.events.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            texts,
            vec![
                MachineEventKind::Text { text: "HI".into() },
                MachineEventKind::Text { text: "42".into() },
                MachineEventKind::PrintInstruction { text: decompile(&m.code()[4]) },
            ]
        );
    }

    #[test]
    fn test_unknown_opcode_is_skipped() {
        let (m, w) = run("0x0FFF 0x0000 0x0000 0x0000\ngoto 2", 1);
        assert_eq!(m.error_code(), MachineFault::UnknownInstruction.code());
        assert_eq!(w.event_names(), vec!["error"]);
        assert_eq!(m.instruction_pointer(), 2);
    }

    #[test]
    fn test_program_sets_and_reads_error_code() {
        let (m, _) = run("set_error_code( 77 )\n[4] = get_error_code()\ngoto 3\n0", 1);
        assert_eq!(value_at(&m, 4), 77);
    }

    #[test]
    fn test_instruction_pointer_wraps() {
        let (m, _) = run("[3] += 1\n0\n0", 1);
        assert!(value_at(&m, 3) >= 2);
        assert!((1..=3).contains(&m.instruction_pointer()));
    }

    #[test]
    fn test_line_queries() {
        let (m, _) = run("[4] = get_line_count()\n[5] = get_line_number_plus( 2 )\ngoto 3\n0\n0", 1);
        assert_eq!(value_at(&m, 4), 5);
        assert_eq!(value_at(&m, 5), 4);
    }

    #[test]
    fn test_location_queries() {
        let code = "[6] = get_location()\n[7] = get_distance_to( [8] )\n[9] = is_location( 8 )\n\
                    [10] = compare_line( 6, 6 )\ngoto 5\n0\n0\nlocation( 5, 8 )\n0\n0";
        let (m, _) = run(code, 1);
        assert_eq!(m.code()[6].location_value(), HexCoord::new(5, 5));
        assert_eq!(value_at(&m, 7), 3);
        assert_eq!(value_at(&m, 9), 1);
        assert_eq!(value_at(&m, 10), 1);
    }

    #[test]
    fn test_random_range_is_inclusive() {
        let (m, _) = run("[3] = get_random( 9, 7 )\ngoto 1\n0", 5);
        assert!((7..=9).contains(&value_at(&m, 3)));
    }

    #[test]
    fn test_cargo_queries() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(
            &mut w,
            "[4] = get_cargohold_count_of( 4 )\n[5] = get_cargohold_count_of( 9 )\ngoto 3\n0\n0",
        );
        assert!(m.cargo_mut().try_add_cargo(&Amount::of(TradableType::Metals, 3)));
        w.frame(&mut m);
        assert_eq!(value_at(&m, 4), 3);
        assert_eq!(value_at(&m, 5), 0);
    }

    #[test]
    fn test_turn_instruction_blocks_until_done() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "turn_cw( 2 )\ngoto 2");
        w.frame(&mut m);
        assert_eq!(m.blocking_condition(), BlockingCondition::WaitingForNFaceTurns);
        w.frames(&mut m, 200);
        assert_eq!(m.blocking_condition(), BlockingCondition::NothingBlocking);
        assert_eq!(m.facing(), HexFacing::Tile2);
    }

    #[test]
    fn test_line_of_fire() {
        let mut w = TestWorld::new();
        let m = create_test_machine(&mut w, "goto 1");
        let ctx = w.ctx();
        assert_eq!(m.has_line_of_fire_to(&ctx, HexCoord::new(5, 5)), 0);
        assert_eq!(m.has_line_of_fire_to(&ctx, HexCoord::new(5, 6)), 1);
        assert_eq!(m.has_line_of_fire_to(&ctx, HexCoord::new(5, 8)), 1);
        drop(ctx);
        w.grid.place_asteroid_on_tile(HexCoord::new(5, 7)).unwrap();
        assert_eq!(m.has_line_of_fire_to(&w.ctx(), HexCoord::new(5, 9)), 0);
    }

    #[test]
    fn test_navigation_abandoned_when_off_course() {
        let mut w = TestWorld::new();
        let mut m = create_test_machine(&mut w, "goto 1");
        m.navigation = Navigation {
            active: true,
            code: vec![Instruction::from_asm(op::ADVANCE | VALUE_ARG0, 1, 0, 0); 2],
            ptr: 1,
            expected_facing: HexFacing::Tile0,
            expected_xy: HexCoord::new(9, 9),
        };
        m.execute_navigation_instruction(&mut w.ctx());
        assert!(!m.navigation.active);
        assert_eq!(m.blocking_condition(), BlockingCondition::NothingBlocking);
    }
}
