//! Opcodes and argument flags of the machine instruction set.
//!
//! The low twelve bits of an instruction's command word select the operation;
//! the top bits say which arguments are immediate values rather than line
//! numbers to read through.

// Opcode names are the mnemonics used throughout the VM and assembler.
#![allow(missing_docs)]

pub const NOP: u16 = 0x0000;
pub const JMP: u16 = 0x0001;
pub const STORE_JMP: u16 = 0x0002;
pub const COPY: u16 = 0x0003;
pub const PRINT_TXT: u16 = 0x0004;
pub const PRINT_VAL: u16 = 0x0005;
pub const ADD: u16 = 0x0006;
pub const SUB: u16 = 0x0007;
pub const MUL: u16 = 0x0008;
pub const DIV: u16 = 0x0009;
pub const RAND_RANGE: u16 = 0x000A;
pub const RAND: u16 = 0x000B;
pub const CAP: u16 = 0x000C;
pub const MAX_CAP: u16 = 0x000D;
pub const SYNCH: u16 = 0x000E;
pub const SENSE: u16 = 0x000F;
pub const SENSE_MAX: u16 = 0x0010;
pub const TURN: u16 = 0x0011;
pub const ADVANCE: u16 = 0x0012;
pub const ADVANCE_WITH_STORE: u16 = 0x0013;
pub const SENSE_RESULT_COUNT: u16 = 0x0014;
pub const SENSE_RESULT_LOCATION: u16 = 0x0015;
pub const SENSE_RESULT_TYPE: u16 = 0x0016;
pub const MAX_SENSE_RANGE: u16 = 0x0017;
pub const CW_TURN_COUNT_TO: u16 = 0x0018;
pub const DISTANCE_TO: u16 = 0x0019;
pub const DISTANCE_BETWEEN: u16 = 0x001A;
pub const GET_LOCATION: u16 = 0x001B;
pub const GET_LINENUMBER_PLUS: u16 = 0x001C;
pub const LINENUMBER: u16 = 0x001D;
pub const LINE_COUNT: u16 = 0x001E;
pub const MAX_TRANSMIT_RANGE: u16 = 0x001F;
pub const TRANSMIT: u16 = 0x0020;
pub const MAX_BROADCAST_RANGE: u16 = 0x0021;
pub const BROADCAST: u16 = 0x0022;
pub const GET_BLUEPRINT_COUNT: u16 = 0x0023;
pub const ASSERT: u16 = 0x0024;
pub const XOR: u16 = 0x0025;
pub const OR: u16 = 0x0026;
pub const AND: u16 = 0x0027;
pub const LEFT_SHIFT: u16 = 0x0028;
pub const RIGHT_SHIFT: u16 = 0x0029;
pub const EQ: u16 = 0x002A;
pub const NEQ: u16 = 0x002B;
pub const BOOL_AND: u16 = 0x002C;
pub const BOOL_OR: u16 = 0x002D;
pub const BOOL_LT: u16 = 0x002E;
pub const BOOL_GT: u16 = 0x002F;
pub const BOOL_LTE: u16 = 0x0030;
pub const BOOL_GTE: u16 = 0x0031;
pub const MODULO: u16 = 0x0032;
pub const JMP_EQ: u16 = 0x0033;
pub const JMP_NEQ: u16 = 0x0034;
pub const JMP_LT: u16 = 0x0035;
pub const JMP_GT: u16 = 0x0036;
pub const JMP_LTE: u16 = 0x0037;
pub const JMP_GTE: u16 = 0x0038;
pub const ABS: u16 = 0x0039;
pub const SWAP_CODE: u16 = 0x003A;
pub const COPY_CODE: u16 = 0x003B;
pub const COMPARE_CODE_LINE: u16 = 0x003C;
pub const MSG_CLEAR_MSGS: u16 = 0x003D;
pub const COPY_MSGBUF_CODE: u16 = 0x003E;
pub const MOVE_MSG_MSGBUF: u16 = 0x003F;
pub const MSGBUF_LINE_COUNT: u16 = 0x0040;
pub const GET_MSGS_COUNT: u16 = 0x0041;
pub const GET_MAX_MSGS: u16 = 0x0042;
pub const CAN_BUILD: u16 = 0x0043;
pub const BUILD: u16 = 0x0044;
pub const CAN_AIM_AT: u16 = 0x0045;
pub const AIM_AT: u16 = 0x0046;
pub const CAN_FIRE_AT: u16 = 0x0047;
pub const FIRE_AT: u16 = 0x0048;
pub const HAS_LINE_OF_FIRE_TO: u16 = 0x0049;
pub const SELF_DESTRUCT: u16 = 0x004A;
pub const IS_LOCATION: u16 = 0x004B;
pub const IS_CARGO_LOCKED: u16 = 0x004C;
pub const LOCK_CARGO: u16 = 0x004D;
pub const CARGOHOLD_FREE_SPACE: u16 = 0x004E;
pub const CARGOHOLD_SPACE_USED: u16 = 0x004F;
pub const CARGOHOLD_VOLUME: u16 = 0x0050;
pub const CARGOHOLD_UNITS_OF: u16 = 0x0051;
pub const CARGOHOLD_VOL_OF: u16 = 0x0052;
pub const GIVE_CARGO_TO: u16 = 0x0053;
pub const TAKE_CARGO_FROM: u16 = 0x0054;
pub const NAVIGATE_TO: u16 = 0x0055;
pub const NAVIGATE_N_TOWARDS: u16 = 0x0056;
pub const SET_ASTAR_WEIGHT: u16 = 0x0057;
pub const GET_ASTAR_WEIGHT: u16 = 0x0058;
pub const REFINE: u16 = 0x0059;
pub const GET_REFINE_PERIOD: u16 = 0x005A;
pub const PLOT_ROUTE_BETWEEN: u16 = 0x005B;
pub const GET_ROUTE_LENGTH: u16 = 0x005C;
pub const COPY_ROUTE: u16 = 0x005D;
pub const SET_ERROR_CODE: u16 = 0x005E;
pub const GET_ERROR_CODE: u16 = 0x005F;
pub const GET_PRICE: u16 = 0x0060;
pub const GET_AVAILABILITY: u16 = 0x0061;
pub const TRY_BUY: u16 = 0x0062;
pub const TRY_BUY_WITH_STORE: u16 = 0x0063;
pub const FOR_SALE: u16 = 0x0064;
pub const CANCEL_SALES: u16 = 0x0065;
pub const GET_CREDITS_BALANCE: u16 = 0x0066;
pub const TRANSFER_CREDITS_TO: u16 = 0x0067;

/// Marks a line holding a packed board coordinate rather than an operation.
pub const LOCATION: u16 = 0x0999;

pub const VALUE_ARG_MASK: u16 = 0xF000;
pub const INSTRUCTION_MASK: u16 = 0x0FFF;
pub const VALUE_ARG0: u16 = 0x1000;
pub const VALUE_ARG1: u16 = 0x2000;
pub const VALUE_ARG2: u16 = 0x4000;

/// Value flag for argument `n` (0..=2).
#[must_use]
pub const fn value_flag(n: usize) -> u16 {
    match n {
        0 => VALUE_ARG0,
        1 => VALUE_ARG1,
        _ => VALUE_ARG2,
    }
}

/// Mnemonic for an opcode, if it is one.
#[must_use]
pub const fn opcode_name(cmd: u16) -> Option<&'static str> {
    let name = match cmd {
        NOP => "NOP",
        JMP => "JMP",
        STORE_JMP => "STORE_JMP",
        COPY => "COPY",
        PRINT_TXT => "PRINT_TXT",
        PRINT_VAL => "PRINT_VAL",
        ADD => "ADD",
        SUB => "SUB",
        MUL => "MUL",
        DIV => "DIV",
        RAND_RANGE => "RAND_RANGE",
        RAND => "RAND",
        CAP => "CAP",
        MAX_CAP => "MAX_CAP",
        SYNCH => "SYNCH",
        SENSE => "SENSE",
        SENSE_MAX => "SENSE_MAX",
        TURN => "TURN",
        ADVANCE => "ADVANCE",
        ADVANCE_WITH_STORE => "ADVANCE_WITH_STORE",
        SENSE_RESULT_COUNT => "SENSE_RESULT_COUNT",
        SENSE_RESULT_LOCATION => "SENSE_RESULT_LOCATION",
        SENSE_RESULT_TYPE => "SENSE_RESULT_TYPE",
        MAX_SENSE_RANGE => "MAX_SENSE_RANGE",
        CW_TURN_COUNT_TO => "CW_TURN_COUNT_TO",
        DISTANCE_TO => "DISTANCE_TO",
        DISTANCE_BETWEEN => "DISTANCE_BETWEEN",
        GET_LOCATION => "GET_LOCATION",
        GET_LINENUMBER_PLUS => "GET_LINENUMBER_PLUS",
        LINENUMBER => "LINENUMBER",
        LINE_COUNT => "LINE_COUNT",
        MAX_TRANSMIT_RANGE => "MAX_TRANSMIT_RANGE",
        TRANSMIT => "TRANSMIT",
        MAX_BROADCAST_RANGE => "MAX_BROADCAST_RANGE",
        BROADCAST => "BROADCAST",
        GET_BLUEPRINT_COUNT => "GET_BLUEPRINT_COUNT",
        ASSERT => "ASSERT",
        XOR => "XOR",
        OR => "OR",
        AND => "AND",
        LEFT_SHIFT => "LEFT_SHIFT",
        RIGHT_SHIFT => "RIGHT_SHIFT",
        EQ => "EQ",
        NEQ => "NEQ",
        BOOL_AND => "BOOL_AND",
        BOOL_OR => "BOOL_OR",
        BOOL_LT => "BOOL_LT",
        BOOL_GT => "BOOL_GT",
        BOOL_LTE => "BOOL_LTE",
        BOOL_GTE => "BOOL_GTE",
        MODULO => "MODULO",
        JMP_EQ => "JMP_EQ",
        JMP_NEQ => "JMP_NEQ",
        JMP_LT => "JMP_LT",
        JMP_GT => "JMP_GT",
        JMP_LTE => "JMP_LTE",
        JMP_GTE => "JMP_GTE",
        ABS => "ABS",
        SWAP_CODE => "SWAP_CODE",
        COPY_CODE => "COPY_CODE",
        COMPARE_CODE_LINE => "COMPARE_CODE_LINE",
        MSG_CLEAR_MSGS => "MSG_CLEAR_MSGS",
        COPY_MSGBUF_CODE => "COPY_MSGBUF_CODE",
        MOVE_MSG_MSGBUF => "MOVE_MSG_MSGBUF",
        MSGBUF_LINE_COUNT => "MSGBUF_LINE_COUNT",
        GET_MSGS_COUNT => "GET_MSGS_COUNT",
        GET_MAX_MSGS => "GET_MAX_MSGS",
        CAN_BUILD => "CAN_BUILD",
        BUILD => "BUILD",
        CAN_AIM_AT => "CAN_AIM_AT",
        AIM_AT => "AIM_AT",
        CAN_FIRE_AT => "CAN_FIRE_AT",
        FIRE_AT => "FIRE_AT",
        HAS_LINE_OF_FIRE_TO => "HAS_LINE_OF_FIRE_TO",
        SELF_DESTRUCT => "SELF_DESTRUCT",
        IS_LOCATION => "IS_LOCATION",
        IS_CARGO_LOCKED => "IS_CARGO_LOCKED",
        LOCK_CARGO => "LOCK_CARGO",
        CARGOHOLD_FREE_SPACE => "CARGOHOLD_FREE_SPACE",
        CARGOHOLD_SPACE_USED => "CARGOHOLD_SPACE_USED",
        CARGOHOLD_VOLUME => "CARGOHOLD_VOLUME",
        CARGOHOLD_UNITS_OF => "CARGOHOLD_UNITS_OF",
        CARGOHOLD_VOL_OF => "CARGOHOLD_VOL_OF",
        GIVE_CARGO_TO => "GIVE_CARGO_TO",
        TAKE_CARGO_FROM => "TAKE_CARGO_FROM",
        NAVIGATE_TO => "NAVIGATE_TO",
        NAVIGATE_N_TOWARDS => "NAVIGATE_N_TOWARDS",
        SET_ASTAR_WEIGHT => "SET_ASTAR_WEIGHT",
        GET_ASTAR_WEIGHT => "GET_ASTAR_WEIGHT",
        REFINE => "REFINE",
        GET_REFINE_PERIOD => "GET_REFINE_PERIOD",
        PLOT_ROUTE_BETWEEN => "PLOT_ROUTE_BETWEEN",
        GET_ROUTE_LENGTH => "GET_ROUTE_LENGTH",
        COPY_ROUTE => "COPY_ROUTE",
        SET_ERROR_CODE => "SET_ERROR_CODE",
        GET_ERROR_CODE => "GET_ERROR_CODE",
        GET_PRICE => "GET_PRICE",
        GET_AVAILABILITY => "GET_AVAILABILITY",
        TRY_BUY => "TRY_BUY",
        TRY_BUY_WITH_STORE => "TRY_BUY_WITH_STORE",
        FOR_SALE => "FOR_SALE",
        CANCEL_SALES => "CANCEL_SALES",
        GET_CREDITS_BALANCE => "GET_CREDITS_BALANCE",
        TRANSFER_CREDITS_TO => "TRANSFER_CREDITS_TO",
        LOCATION => "LOCATION",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_opcode_fits_the_instruction_mask() {
        for cmd in 0..=INSTRUCTION_MASK {
            if opcode_name(cmd).is_some() {
                assert_eq!(cmd & VALUE_ARG_MASK, 0);
            }
        }
        assert_eq!(opcode_name(TRANSFER_CREDITS_TO), Some("TRANSFER_CREDITS_TO"));
        assert_eq!(opcode_name(0x0068), None);
    }

    #[test]
    fn test_value_flags_are_distinct_bits() {
        assert_eq!(value_flag(0) | value_flag(1) | value_flag(2), 0x7000);
        assert_eq!(VALUE_ARG_MASK & INSTRUCTION_MASK, 0);
    }
}
