//! Assembly text for machine programs.
//!
//! Every instruction has a text form. Operands are either literal integers,
//! which set the argument's value flag, or `[n]` line references, which the VM
//! reads through. Destinations invert this: `[n]` names line `n` directly and
//! `[[n]]` names the line whose number is stored at `n`.
//!
//! [`decompile`] always produces text that [`compile`] turns back into the same
//! instruction, falling back to four raw hex words when no friendlier form
//! reproduces it exactly.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::error::{BlueError, BlueResult};
use crate::hex::HexCoord;

use super::instruction::{Instruction, TEXT_MAX_LENGTH, pack_assert_op};
use super::opcode::{
    ABS, ADD, ADVANCE, ADVANCE_WITH_STORE, AIM_AT, AND, ASSERT, BOOL_AND, BOOL_GT, BOOL_GTE,
    BOOL_LT, BOOL_LTE, BOOL_OR, BROADCAST, BUILD, CAN_AIM_AT, CAN_BUILD, CAN_FIRE_AT, CANCEL_SALES,
    CAP, CARGOHOLD_FREE_SPACE, CARGOHOLD_SPACE_USED, CARGOHOLD_UNITS_OF, CARGOHOLD_VOL_OF,
    CARGOHOLD_VOLUME, COMPARE_CODE_LINE, COPY, COPY_CODE, COPY_MSGBUF_CODE, COPY_ROUTE,
    CW_TURN_COUNT_TO, DISTANCE_BETWEEN, DISTANCE_TO, DIV, EQ, FIRE_AT, FOR_SALE,
    GET_ASTAR_WEIGHT, GET_AVAILABILITY, GET_BLUEPRINT_COUNT, GET_CREDITS_BALANCE, GET_ERROR_CODE,
    GET_LINENUMBER_PLUS, GET_LOCATION, GET_MAX_MSGS, GET_MSGS_COUNT, GET_PRICE,
    GET_REFINE_PERIOD, GET_ROUTE_LENGTH, GIVE_CARGO_TO, HAS_LINE_OF_FIRE_TO, IS_CARGO_LOCKED,
    IS_LOCATION, JMP, JMP_EQ, JMP_GT, JMP_GTE, JMP_LT, JMP_LTE, JMP_NEQ, LEFT_SHIFT, LINE_COUNT,
    LINENUMBER, LOCATION, LOCK_CARGO, MAX_BROADCAST_RANGE, MAX_CAP, MAX_SENSE_RANGE,
    MAX_TRANSMIT_RANGE, MODULO, MOVE_MSG_MSGBUF, MSG_CLEAR_MSGS, MSGBUF_LINE_COUNT, MUL,
    NAVIGATE_N_TOWARDS, NAVIGATE_TO, NEQ, NOP, OR, PLOT_ROUTE_BETWEEN, PRINT_TXT, PRINT_VAL, RAND,
    RAND_RANGE, REFINE, RIGHT_SHIFT, SELF_DESTRUCT, SENSE, SENSE_MAX, SENSE_RESULT_COUNT,
    SENSE_RESULT_LOCATION, SENSE_RESULT_TYPE, SET_ASTAR_WEIGHT, SET_ERROR_CODE, STORE_JMP, SUB,
    SWAP_CODE, SYNCH, TAKE_CARGO_FROM, TRANSFER_CREDITS_TO, TRANSMIT, TRY_BUY, TRY_BUY_WITH_STORE,
    TURN, XOR, value_flag,
};
use super::{Instructions, MAX_BOT_INSTRUCTIONS};

/// Operators of `[d] = a op b`, longest first so `<<` wins over `<`.
const BINARY_OPS: &[(&str, u16)] = &[
    ("<<", LEFT_SHIFT),
    (">>", RIGHT_SHIFT),
    (">=", BOOL_GTE),
    ("<=", BOOL_LTE),
    ("==", EQ),
    ("!=", NEQ),
    ("&&", BOOL_AND),
    ("||", BOOL_OR),
    ("+", ADD),
    ("-", SUB),
    ("*", MUL),
    ("/", DIV),
    ("%", MODULO),
    ("|", OR),
    ("&", AND),
    ("^", XOR),
    (">", BOOL_GT),
    ("<", BOOL_LT),
];

const COMPOUND_OPS: &[(&str, u16)] = &[
    ("+=", ADD),
    ("-=", SUB),
    ("*=", MUL),
    ("/=", DIV),
    ("%=", MODULO),
    ("|=", OR),
    ("&=", AND),
    ("^=", XOR),
];

const JUMP_OPS: &[(&str, u16)] = &[
    (">=", JMP_GTE),
    ("<=", JMP_LTE),
    ("==", JMP_EQ),
    ("!=", JMP_NEQ),
    (">", JMP_GT),
    ("<", JMP_LT),
];

const ASSERT_OPS: &[(&str, u16)] = &[
    ("==", 0),
    ("!=", 0),
    ("<=", 0),
    (">=", 0),
    ("&&", 0),
    ("||", 0),
    ("<", 0),
    (">", 0),
    ("&", 0),
    ("|", 0),
];

const KEYWORDS: &[&str] = &["goto", "if", "assert", "print", "location"];

/// Where an operand lands and how it is read.
#[derive(Debug, Clone, Copy)]
enum Param {
    /// Literal (flagged) or `[n]` read through.
    Value(usize),
    /// `[n]` only: a line expected to hold a location.
    Line(usize),
    /// `[n]` (flagged) or `[[n]]` (read through).
    Dest(usize),
    /// Not written in the text; always this flagged value.
    Fixed(usize, u16),
}

/// A named function-call form, either `name( args )` or `[d] = name( args )`.
#[derive(Debug)]
struct Syntax {
    name: &'static str,
    opcode: u16,
    params: &'static [Param],
}

use Param::{Dest, Fixed, Line, Value};

const fn syn(name: &'static str, opcode: u16, params: &'static [Param]) -> Syntax {
    Syntax { name, opcode, params }
}

static SYNTAX: &[Syntax] = &[
    syn("clear_msgs", MSG_CLEAR_MSGS, &[]),
    syn("sense", SENSE_MAX, &[]),
    syn("cancel_sales", CANCEL_SALES, &[]),
    syn("advance", ADVANCE, &[Value(0)]),
    syn("print", PRINT_VAL, &[Value(0)]),
    syn("sense", SENSE, &[Value(0)]),
    syn("synch", SYNCH, &[Value(0)]),
    syn("selfdestruct", SELF_DESTRUCT, &[Value(0)]),
    syn("move_msg_to_msgbuf", MOVE_MSG_MSGBUF, &[Value(0)]),
    syn("lock_cargohold", LOCK_CARGO, &[Value(0)]),
    syn("set_error_code", SET_ERROR_CODE, &[Value(0)]),
    syn("turn", TURN, &[Value(1), Value(0)]),
    syn("turn_cw", TURN, &[Value(0), Fixed(1, 1)]),
    syn("turn_ccw", TURN, &[Value(0), Fixed(1, 0)]),
    syn("navigate_to", NAVIGATE_TO, &[Line(0)]),
    syn("aim_at", AIM_AT, &[Line(0)]),
    syn("fire_at", FIRE_AT, &[Line(0)]),
    syn("store_and_goto", STORE_JMP, &[Value(0), Value(1)]),
    syn("refine", REFINE, &[Value(0), Value(1)]),
    syn("set_navigation_weighting", SET_ASTAR_WEIGHT, &[Value(0), Value(1)]),
    syn("try_buy", TRY_BUY, &[Value(0), Value(1)]),
    syn("plot_route_between", PLOT_ROUTE_BETWEEN, &[Line(0), Line(1)]),
    syn("build", BUILD, &[Value(0), Value(1), Value(2)]),
    syn("broadcast", BROADCAST, &[Value(0), Value(1), Value(2)]),
    syn("copy_code_from_msgbuf", COPY_MSGBUF_CODE, &[Value(0), Value(1), Value(2)]),
    syn("copy_code", COPY_CODE, &[Value(0), Value(1), Value(2)]),
    syn("swap_code", SWAP_CODE, &[Value(0), Value(1), Value(2)]),
    syn("copy_route", COPY_ROUTE, &[Value(0), Value(1), Value(2)]),
    syn("for_sale", FOR_SALE, &[Value(0), Value(1), Value(2)]),
    syn("transmit", TRANSMIT, &[Line(0), Value(1), Value(2)]),
    syn("give_cargo_to", GIVE_CARGO_TO, &[Line(0), Value(1), Value(2)]),
    syn("take_cargo_from", TAKE_CARGO_FROM, &[Line(0), Value(1), Value(2)]),
    syn("navigate_n_towards", NAVIGATE_N_TOWARDS, &[Value(0), Line(1)]),
    syn("transfer_credits_to", TRANSFER_CREDITS_TO, &[Line(0), Value(1)]),
    // [d] = f()
    syn("get_line_number", LINENUMBER, &[Dest(0)]),
    syn("get_line_count", LINE_COUNT, &[Dest(0)]),
    syn("get_msgbuf_line_count", MSGBUF_LINE_COUNT, &[Dest(0)]),
    syn("get_cap", CAP, &[Dest(0)]),
    syn("get_max_cap", MAX_CAP, &[Dest(0)]),
    syn("get_max_msgs", GET_MAX_MSGS, &[Dest(0)]),
    syn("get_msgs_count", GET_MSGS_COUNT, &[Dest(0)]),
    syn("get_sense_range", MAX_SENSE_RANGE, &[Dest(0)]),
    syn("get_transmit_range", MAX_TRANSMIT_RANGE, &[Dest(0)]),
    syn("get_broadcast_range", MAX_BROADCAST_RANGE, &[Dest(0)]),
    syn("get_blueprint_count", GET_BLUEPRINT_COUNT, &[Dest(0)]),
    syn("get_sense_result_count", SENSE_RESULT_COUNT, &[Dest(0)]),
    syn("get_location", GET_LOCATION, &[Dest(0)]),
    syn("get_random", RAND, &[Dest(0)]),
    syn("get_cargohold_freespace", CARGOHOLD_FREE_SPACE, &[Dest(0)]),
    syn("get_cargohold_spaceused", CARGOHOLD_SPACE_USED, &[Dest(0)]),
    syn("get_cargohold_volume", CARGOHOLD_VOLUME, &[Dest(0)]),
    syn("is_cargohold_locked", IS_CARGO_LOCKED, &[Dest(0)]),
    syn("get_route_length", GET_ROUTE_LENGTH, &[Dest(0)]),
    syn("get_error_code", GET_ERROR_CODE, &[Dest(0)]),
    syn("get_credits_balance", GET_CREDITS_BALANCE, &[Dest(0)]),
    // [d] = f( x )
    syn("abs", ABS, &[Dest(0), Value(1)]),
    syn("advance", ADVANCE_WITH_STORE, &[Dest(1), Value(0)]),
    syn("can_build", CAN_BUILD, &[Dest(0), Value(1)]),
    syn("get_sense_result_type", SENSE_RESULT_TYPE, &[Dest(0), Value(1)]),
    syn("get_sense_result_location", SENSE_RESULT_LOCATION, &[Dest(0), Value(1)]),
    syn("get_cargohold_count_of", CARGOHOLD_UNITS_OF, &[Dest(0), Value(1)]),
    syn("get_cargohold_volume_of", CARGOHOLD_VOL_OF, &[Dest(0), Value(1)]),
    syn("get_navigation_weighting", GET_ASTAR_WEIGHT, &[Dest(0), Value(1)]),
    syn("get_refine_period", GET_REFINE_PERIOD, &[Dest(0), Value(1)]),
    syn("is_location", IS_LOCATION, &[Dest(0), Value(1)]),
    syn("get_line_number_plus", GET_LINENUMBER_PLUS, &[Dest(0), Value(1)]),
    syn("get_price", GET_PRICE, &[Dest(0), Value(1)]),
    syn("get_availability", GET_AVAILABILITY, &[Dest(0), Value(1)]),
    // [d] = f( [x] )
    syn("get_distance_to", DISTANCE_TO, &[Dest(0), Line(1)]),
    syn("get_cw_turn_count_to", CW_TURN_COUNT_TO, &[Dest(0), Line(1)]),
    syn("can_fire_at", CAN_FIRE_AT, &[Dest(0), Line(1)]),
    syn("can_aim_at", CAN_AIM_AT, &[Dest(0), Line(1)]),
    syn("has_line_of_fire_to", HAS_LINE_OF_FIRE_TO, &[Dest(0), Line(1)]),
    // [d] = f( a, b )
    syn("get_random", RAND_RANGE, &[Dest(0), Value(1), Value(2)]),
    syn("compare_line", COMPARE_CODE_LINE, &[Dest(0), Value(1), Value(2)]),
    syn("try_buy", TRY_BUY_WITH_STORE, &[Dest(0), Value(1), Value(2)]),
    syn("get_distance_between", DISTANCE_BETWEEN, &[Dest(0), Line(1), Line(2)]),
];

impl Syntax {
    fn is_store(&self) -> bool {
        self.params.iter().any(|p| matches!(p, Dest(_)))
    }

    fn arity(&self) -> usize {
        self.params.iter().filter(|p| matches!(p, Value(_) | Line(_))).count()
    }

    fn encode(&self, dest: Option<Operand>, args: &[Operand]) -> Option<Instruction> {
        let mut e = Encoder::new(self.opcode);
        let mut args = args.iter().copied();
        for &p in self.params {
            match p {
                Dest(_) => e.set(p, dest?)?,
                Fixed(slot, v) => e.fixed(slot, v),
                Value(_) | Line(_) => e.set(p, args.next()?)?,
            }
        }
        Some(e.finish())
    }

    fn render(&self, ins: &Instruction) -> Option<String> {
        let mut dest = None;
        let mut parts = Vec::new();
        for &p in self.params {
            match p {
                Value(slot) => parts.push(value_text(ins, slot)),
                Line(slot) => {
                    if !ins.is_indirection(slot) {
                        return None;
                    }
                    parts.push(format!("[{}]", ins.arg(slot)));
                }
                Dest(slot) => dest = Some(dest_text(ins, slot)),
                Fixed(..) => {}
            }
        }
        let call = if parts.is_empty() {
            format!("{}()", self.name)
        } else {
            format!("{}( {} )", self.name, parts.join(", "))
        };
        Some(match dest {
            Some(d) => format!("{d} = {call}"),
            None => call,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Literal(u16),
    Ref(u16),
    RefRef(u16),
}

#[derive(Debug, Clone, Copy)]
struct Encoder {
    command: u16,
    args: [u16; 3],
}

impl Encoder {
    const fn new(opcode: u16) -> Self {
        Self { command: opcode, args: [0; 3] }
    }

    fn set(&mut self, param: Param, operand: Operand) -> Option<()> {
        match (param, operand) {
            (Value(slot), Operand::Literal(v)) | (Dest(slot), Operand::Ref(v)) => {
                self.args[slot] = v;
                self.command |= value_flag(slot);
            }
            (Value(slot) | Line(slot), Operand::Ref(n)) | (Dest(slot), Operand::RefRef(n)) => {
                self.args[slot] = n;
            }
            _ => return None,
        }
        Some(())
    }

    fn fixed(&mut self, slot: usize, v: u16) {
        self.args[slot] = v;
        self.command |= value_flag(slot);
    }

    const fn finish(self) -> Instruction {
        Instruction { command: self.command, args: self.args }
    }
}

#[derive(Debug)]
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos == self.text.len()
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.text.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        if !rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            return None;
        }
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        self.pos += len;
        Some(&rest[..len])
    }

    fn keyword(&mut self, word: &str) -> bool {
        let save = self.pos;
        if self.ident() == Some(word) {
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// `[+-]?digits` in `-32768..=65535`.
    fn integer(&mut self) -> Option<i32> {
        self.skip_ws();
        let rest = self.rest();
        let sign_len = usize::from(rest.starts_with(['+', '-']));
        let digits = rest[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > 6 {
            return None;
        }
        let v: i32 = rest[..sign_len + digits].parse().ok()?;
        if !(-32768..=65535).contains(&v) {
            return None;
        }
        self.pos += sign_len + digits;
        Some(v)
    }

    fn line_number(&mut self) -> Option<u16> {
        let save = self.pos;
        let n = self.integer().and_then(|v| u16::try_from(v).ok());
        if n.is_none() {
            self.pos = save;
        }
        n
    }

    fn operand(&mut self) -> Option<Operand> {
        if self.eat("[") {
            if self.eat("[") {
                let n = self.line_number()?;
                (self.eat("]") && self.eat("]")).then_some(Operand::RefRef(n))
            } else {
                let n = self.line_number()?;
                self.eat("]").then_some(Operand::Ref(n))
            }
        } else {
            self.integer().map(|v| Operand::Literal(v as u16))
        }
    }

    fn one_of(&mut self, ops: &[(&'static str, u16)]) -> Option<(&'static str, u16)> {
        self.skip_ws();
        let found = ops.iter().copied().find(|(op, _)| self.rest().starts_with(op))?;
        self.pos += found.0.len();
        Some(found)
    }

    fn hex_word(&mut self) -> Option<u16> {
        if !(self.eat("0x") || self.eat("0X")) {
            return None;
        }
        let rest = self.rest();
        let digits = rest.bytes().take_while(u8::is_ascii_hexdigit).count();
        if digits == 0 || digits > 4 {
            return None;
        }
        self.pos += digits;
        u16::from_str_radix(&rest[..digits], 16).ok()
    }

    fn args(&mut self) -> Option<Vec<Operand>> {
        if !self.eat("(") {
            return None;
        }
        let mut args = Vec::new();
        if self.eat(")") {
            return Some(args);
        }
        loop {
            args.push(self.operand()?);
            if self.eat(")") {
                return Some(args);
            }
            if !self.eat(",") {
                return None;
            }
        }
    }
}

/// Drop a trailing `//` comment that is not inside a quoted string.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    let mut after_slash = false;
    for (i, b) in line.bytes().enumerate() {
        match b {
            b'"' => quoted = !quoted,
            b'/' if after_slash => return &line[..i - 1],
            _ => {}
        }
        after_slash = b == b'/' && !quoted;
    }
    line
}

/// Compile one line of assembly text.
///
/// Blank lines and comment-only lines compile to a no-op. Returns `None` when
/// the text matches no instruction form.
#[must_use]
pub fn compile(line: &str) -> Option<Instruction> {
    let text = strip_comment(line).trim();
    if text.is_empty() {
        return Some(Instruction::nop());
    }
    let mut c = Cursor::new(text);
    let ins = if text.starts_with("0x") || text.starts_with("0X") {
        parse_raw(&mut c)?
    } else if text.starts_with('[') {
        parse_assignment(&mut c)?
    } else if let Some(v) = c.integer() {
        Instruction::value(v as u16 as i16)
    } else {
        parse_statement(&mut c)?
    };
    c.at_end().then_some(ins)
}

/// Compile one line, reporting failure as an error.
///
/// # Errors
///
/// Returns [`BlueError::Assembly`] naming line 1 if the text does not compile.
pub fn try_compile(line: &str) -> BlueResult<Instruction> {
    compile(line).ok_or_else(|| BlueError::Assembly { line: 1, text: line.to_string() })
}

/// Compile a sequence of lines into a program.
///
/// # Errors
///
/// Returns [`BlueError::Assembly`] for the first line that does not compile,
/// or when there are more lines than a machine can hold.
pub fn compile_lines<I, S>(lines: I) -> BlueResult<Instructions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut code = Vec::new();
    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if i >= MAX_BOT_INSTRUCTIONS {
            return Err(BlueError::Assembly {
                line: i + 1,
                text: format!("program longer than {MAX_BOT_INSTRUCTIONS} lines"),
            });
        }
        let ins = compile(line).ok_or_else(|| BlueError::Assembly {
            line: i + 1,
            text: line.to_string(),
        })?;
        code.push(ins);
    }
    Ok(Instructions::new(code))
}

/// Compile newline-separated program text.
///
/// # Errors
///
/// See [`compile_lines`].
pub fn compile_code(text: &str) -> BlueResult<Instructions> {
    compile_lines(text.lines())
}

fn parse_raw(c: &mut Cursor<'_>) -> Option<Instruction> {
    let command = c.hex_word()?;
    let a = c.hex_word()?;
    let b = c.hex_word()?;
    let d = c.hex_word()?;
    Some(Instruction::from_asm(command, a, b, d))
}

fn parse_assignment(c: &mut Cursor<'_>) -> Option<Instruction> {
    let dest = c.operand()?;
    if let Some((_, opcode)) = c.one_of(COMPOUND_OPS) {
        let Operand::Ref(d) = dest else {
            return None;
        };
        let v = c.operand()?;
        let mut e = Encoder::new(opcode);
        e.set(Dest(0), dest)?;
        e.set(Value(1), Operand::Ref(d))?;
        e.set(Value(2), v)?;
        return Some(e.finish());
    }
    if !c.eat("=") || c.rest().starts_with('=') {
        return None;
    }
    if let Some(name) = c.ident() {
        let args = c.args()?;
        return lookup(name, Some(dest), &args);
    }
    let a = c.operand()?;
    if c.at_end() {
        let mut e = Encoder::new(COPY);
        e.set(Value(0), a)?;
        e.set(Dest(1), dest)?;
        return Some(e.finish());
    }
    let (_, opcode) = c.one_of(BINARY_OPS)?;
    let b = c.operand()?;
    let mut e = Encoder::new(opcode);
    e.set(Dest(0), dest)?;
    e.set(Value(1), a)?;
    e.set(Value(2), b)?;
    Some(e.finish())
}

fn parse_statement(c: &mut Cursor<'_>) -> Option<Instruction> {
    let name = c.ident()?;
    match name {
        "goto" => {
            let target = c.operand()?;
            let mut e = Encoder::new(JMP);
            e.set(Value(0), target)?;
            Some(e.finish())
        }
        "if" => parse_if(c),
        "assert" => parse_assert(c),
        "location" => parse_location(c),
        "print" => {
            let save = c.pos;
            if c.eat("(") && c.peek() == Some(b'"') {
                return parse_text(c);
            }
            c.pos = save;
            let args = c.args()?;
            lookup(name, None, &args)
        }
        _ => {
            let args = c.args()?;
            lookup(name, None, &args)
        }
    }
}

fn lookup(name: &str, dest: Option<Operand>, args: &[Operand]) -> Option<Instruction> {
    SYNTAX
        .iter()
        .filter(|s| s.name == name && s.is_store() == dest.is_some() && s.arity() == args.len())
        .find_map(|s| s.encode(dest, args))
}

fn parse_if(c: &mut Cursor<'_>) -> Option<Instruction> {
    let invert = c.eat("!");
    let a = c.operand()?;
    if c.keyword("goto") {
        let target = c.operand()?;
        let mut jump = Encoder::new(JMP);
        jump.set(Value(0), target)?;
        return match a {
            Operand::Literal(v) if (v != 0) != invert => Some(jump.finish()),
            Operand::Literal(_) => Some(Instruction::nop()),
            Operand::Ref(_) => {
                let mut e = Encoder::new(if invert { JMP_EQ } else { JMP_NEQ });
                e.set(Value(0), a)?;
                e.set(Value(1), Operand::Literal(0))?;
                e.set(Value(2), target)?;
                Some(e.finish())
            }
            Operand::RefRef(_) => None,
        };
    }
    if invert {
        return None;
    }
    let (_, opcode) = c.one_of(JUMP_OPS)?;
    let b = c.operand()?;
    if !c.keyword("goto") {
        return None;
    }
    let target = c.operand()?;
    let mut e = Encoder::new(opcode);
    e.set(Value(0), a)?;
    e.set(Value(1), b)?;
    e.set(Value(2), target)?;
    Some(e.finish())
}

fn parse_assert(c: &mut Cursor<'_>) -> Option<Instruction> {
    if !c.eat("(") {
        return None;
    }
    c.skip_ws();
    let invert = c.rest().starts_with('!') && !c.rest().starts_with("!=");
    if invert {
        c.pos += 1;
    }
    let a = c.operand()?;
    let mut e = Encoder::new(ASSERT);
    e.set(Value(0), a)?;
    if c.eat(")") {
        e.set(Value(1), Operand::Literal(0))?;
        e.args[2] = pack_assert_op(if invert { "==" } else { "!=" });
        return Some(e.finish());
    }
    if invert {
        return None;
    }
    let (op, _) = c.one_of(ASSERT_OPS)?;
    let b = c.operand()?;
    e.set(Value(1), b)?;
    e.args[2] = pack_assert_op(op);
    c.eat(")").then_some(e.finish())
}

fn parse_location(c: &mut Cursor<'_>) -> Option<Instruction> {
    if !c.eat("(") {
        return None;
    }
    let x = i8::try_from(c.integer()?).ok()?;
    if !c.eat(",") {
        return None;
    }
    let y = i8::try_from(c.integer()?).ok()?;
    c.eat(")").then_some(Instruction::location(HexCoord::new(x, y)))
}

fn parse_text(c: &mut Cursor<'_>) -> Option<Instruction> {
    if !c.eat("\"") {
        return None;
    }
    let rest = c.rest();
    let end = rest.find('"')?;
    let text = &rest[..end];
    if text.len() > TEXT_MAX_LENGTH || !text.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        return None;
    }
    c.pos += end + 1;
    if !c.eat(")") {
        return None;
    }
    let [a, b, d] = Instruction::pack_text(text);
    Some(Instruction::from_asm(PRINT_TXT, a, b, d))
}

fn value_text(ins: &Instruction, slot: usize) -> String {
    if ins.is_indirection(slot) {
        format!("[{}]", ins.arg(slot))
    } else {
        ins.signed_arg(slot).to_string()
    }
}

fn dest_text(ins: &Instruction, slot: usize) -> String {
    if ins.is_indirection(slot) {
        format!("[[{}]]", ins.arg(slot))
    } else {
        format!("[{}]", ins.arg(slot))
    }
}

fn symbol_for(ops: &[(&'static str, u16)], cmd: u16) -> Option<&'static str> {
    ops.iter().find(|(_, code)| *code == cmd).map(|(op, _)| *op)
}

fn candidates(ins: &Instruction) -> Vec<String> {
    let cmd = ins.cmd();
    let mut out = Vec::new();
    match cmd {
        NOP if ins.is_value() => out.push(ins.signed_arg(0).to_string()),
        NOP => out.push(String::new()),
        LOCATION => {
            let xy = ins.location_value();
            out.push(format!("location( {}, {} )", xy.x, xy.y));
        }
        JMP => out.push(format!("goto {}", value_text(ins, 0))),
        COPY => out.push(format!("{} = {}", dest_text(ins, 1), value_text(ins, 0))),
        PRINT_TXT => out.push(format!("print( \"{}\" )", ins.args_as_text())),
        ASSERT => out.push(format!(
            "assert( {} {} {} )",
            value_text(ins, 0),
            ins.arg_as_chars(2),
            value_text(ins, 1)
        )),
        _ => {}
    }
    if let Some(op) = symbol_for(BINARY_OPS, cmd) {
        out.push(format!(
            "{} = {} {op} {}",
            dest_text(ins, 0),
            value_text(ins, 1),
            value_text(ins, 2)
        ));
    }
    if let Some(op) = symbol_for(JUMP_OPS, cmd) {
        out.push(format!(
            "if {} {op} {} goto {}",
            value_text(ins, 0),
            value_text(ins, 1),
            value_text(ins, 2)
        ));
    }
    out.extend(SYNTAX.iter().filter(|s| s.opcode == cmd).filter_map(|s| s.render(ins)));
    out
}

/// Text for an instruction that compiles back to exactly that instruction.
#[must_use]
pub fn decompile(ins: &Instruction) -> String {
    candidates(ins)
        .into_iter()
        .find(|text| compile(text) == Some(*ins))
        .unwrap_or_else(|| {
            format!(
                "0x{:04x} 0x{:04x} 0x{:04x} 0x{:04x}",
                ins.command, ins.args[0], ins.args[1], ins.args[2]
            )
        })
}

/// Function names, keywords and operators starting with `prefix`, sorted.
/// An empty prefix predicts nothing.
#[must_use]
pub fn predict_text(prefix: &str) -> Vec<String> {
    if prefix.is_empty() {
        return Vec::new();
    }
    let ops = BINARY_OPS.iter().chain(COMPOUND_OPS).chain(JUMP_OPS).map(|(op, _)| *op);
    let mut words: Vec<String> = SYNTAX
        .iter()
        .map(|s| s.name)
        .chain(KEYWORDS.iter().copied())
        .chain(ops)
        .filter(|w| w.starts_with(prefix))
        .map(str::to_string)
        .collect();
    words.sort();
    words.dedup();
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::opcode::{VALUE_ARG0, VALUE_ARG1, VALUE_ARG2};

    const SAMPLE: [&str; 5] = [
        "sense(5)",
        "[1] = get_sense_result_count()",
        "[4] = get_distance_between([2],[5])",
        "print(\"DIST\")",
        "if [0] goto [2]",
    ];

    fn create_test_compiled(line: &str) -> Instruction {
        compile(line).unwrap_or_else(|| panic!("failed to compile {line:?}"))
    }

    #[test]
    fn test_compile_sample_program() {
        let from_lines = compile_lines(SAMPLE).unwrap();
        let from_text = compile_code(&SAMPLE.join("\n")).unwrap();
        assert_eq!(from_lines.size(), 5);
        assert_eq!(from_lines, from_text);
    }

    #[test]
    fn test_blank_and_comment_lines_are_nops() {
        assert_eq!(create_test_compiled(""), Instruction::nop());
        assert_eq!(create_test_compiled("   // nothing here"), Instruction::nop());
        assert_eq!(create_test_compiled("\r"), Instruction::nop());
    }

    #[test]
    fn test_copy_literal_to_line() {
        let ins = create_test_compiled("[0] = 1");
        assert_eq!(ins, Instruction::from_asm(COPY | VALUE_ARG0 | VALUE_ARG1, 1, 0, 0));
        assert_eq!(decompile(&ins), "[0] = 1");

        let ins = create_test_compiled("[[3]] = [4]");
        assert_eq!(ins, Instruction::from_asm(COPY, 4, 3, 0));
        assert_eq!(decompile(&ins), "[[3]] = [4]");
    }

    #[test]
    fn test_value_lines() {
        assert_eq!(create_test_compiled("-5"), Instruction::value(-5));
        assert_eq!(create_test_compiled("65535"), Instruction::value(-1));
        assert_eq!(create_test_compiled("  12 // twelve"), Instruction::value(12));
        assert!(compile("70000").is_none());
        assert!(compile("5 6").is_none());
    }

    #[test]
    fn test_if_variants() {
        let cases = [
            ("if [1] > [2] goto 5", JMP_GT),
            ("if [1] < 3 goto [5]", JMP_LT),
            ("if [1] >= 3 goto 5", JMP_GTE),
            ("if [1] <= 3 goto 5", JMP_LTE),
            ("if [1] == 3 goto 5", JMP_EQ),
            ("if [1] != 3 goto 5", JMP_NEQ),
            ("if [3] goto 7", JMP_NEQ),
            ("if ![3] goto 7", JMP_EQ),
        ];
        for (line, opcode) in cases {
            assert_eq!(create_test_compiled(line).cmd(), opcode, "{line}");
        }
        assert_eq!(
            create_test_compiled("if [3] goto 7"),
            Instruction::from_asm(JMP_NEQ | VALUE_ARG1 | VALUE_ARG2, 3, 0, 7)
        );
    }

    #[test]
    fn test_if_with_literal_condition_folds() {
        assert_eq!(create_test_compiled("if 1 goto 7"), Instruction::from_asm(JMP | VALUE_ARG0, 7, 0, 0));
        assert_eq!(create_test_compiled("if 0 goto 7"), Instruction::nop());
        assert_eq!(create_test_compiled("if !0 goto [7]"), Instruction::from_asm(JMP, 7, 0, 0));
    }

    #[test]
    fn test_assert_forms() {
        let ins = create_test_compiled("assert( [1] <= 5 )");
        assert_eq!(ins, Instruction::from_asm(ASSERT | VALUE_ARG1, 1, 5, pack_assert_op("<=")));
        assert_eq!(decompile(&ins), "assert( [1] <= 5 )");

        let ins = create_test_compiled("assert( [4] )");
        assert_eq!(ins, Instruction::from_asm(ASSERT | VALUE_ARG1, 4, 0, pack_assert_op("!=")));
        assert_eq!(decompile(&ins), "assert( [4] != 0 )");

        let ins = create_test_compiled("assert( !7 )");
        assert_eq!(
            ins,
            Instruction::from_asm(ASSERT | VALUE_ARG0 | VALUE_ARG1, 7, 0, pack_assert_op("=="))
        );
    }

    #[test]
    fn test_compound_assignment() {
        let ins = create_test_compiled("[3] += 2");
        assert_eq!(ins, Instruction::from_asm(ADD | VALUE_ARG0 | VALUE_ARG2, 3, 3, 2));
        assert_eq!(decompile(&ins), "[3] = [3] + 2");
        assert!(compile("[[3]] += 2").is_none());
    }

    #[test]
    fn test_binary_operators() {
        assert_eq!(create_test_compiled("[1] = [2] << 3").cmd(), LEFT_SHIFT);
        assert_eq!(create_test_compiled("[1] = [2] < 3").cmd(), BOOL_LT);
        assert_eq!(create_test_compiled("[1] = [2] - -3").args, [1, 2, 0xFFFD]);
        assert_eq!(create_test_compiled("[1] = [2] % [3]").cmd(), MODULO);
        assert!(compile("[1] == [2]").is_none());
    }

    #[test]
    fn test_turn_aliases() {
        let ins = create_test_compiled("turn_cw( 2 )");
        assert_eq!(ins, Instruction::from_asm(TURN | VALUE_ARG0 | VALUE_ARG1, 2, 1, 0));
        assert_eq!(decompile(&ins), "turn( 1, 2 )");
        assert_eq!(create_test_compiled("turn_ccw( [9] )").args, [9, 0, 0]);
    }

    #[test]
    fn test_advance_with_store_places_destination_second() {
        let ins = create_test_compiled("[7] = advance( 3 )");
        assert_eq!(
            ins,
            Instruction::from_asm(ADVANCE_WITH_STORE | VALUE_ARG0 | VALUE_ARG1, 3, 7, 0)
        );
        assert_eq!(decompile(&ins), "[7] = advance( 3 )");
    }

    #[test]
    fn test_print_text_and_value() {
        let ins = create_test_compiled("print( \"A//B\" ) // shout");
        assert_eq!(ins.cmd(), PRINT_TXT);
        assert_eq!(ins.args_as_text(), "A//B");
        assert!(compile("print( \"TOOLONG\" )").is_none());
        assert_eq!(create_test_compiled("print( [3] )"), Instruction::from_asm(PRINT_VAL, 3, 0, 0));
    }

    #[test]
    fn test_location_lines() {
        let ins = create_test_compiled("location( 3, 4 )");
        assert_eq!(ins.location_value(), HexCoord::new(3, 4));
        assert_eq!(decompile(&ins), "location( 3, 4 )");
    }

    #[test]
    fn test_line_only_arguments_reject_literals() {
        assert!(compile("navigate_to( 5 )").is_none());
        assert!(compile("navigate_to( [5] )").is_some());
        assert!(compile("[1] = get_distance_to( 4 )").is_none());
    }

    #[test]
    fn test_unknown_text_fails() {
        assert!(compile("frobnicate( 1 )").is_none());
        assert!(compile("[1] = [[2]]").is_none());
        assert!(compile("goto").is_none());
        assert!(matches!(try_compile("nonsense"), Err(BlueError::Assembly { line: 1, .. })));
    }

    #[test]
    fn test_compile_code_reports_failing_line() {
        let err = compile_code("sense( 1 )\n[1] = 2\nwhat").unwrap_err();
        assert!(matches!(err, BlueError::Assembly { line: 3, .. }));
    }

    #[test]
    fn test_decompile_is_canonical() {
        let lines = [
            "",
            "-12",
            "goto [4]",
            "sense( 5 )",
            "sense()",
            "clear_msgs()",
            "[1] = get_sense_result_count()",
            "[4] = get_distance_between( [2], [5] )",
            "print( \"DIST\" )",
            "if [0] != 0 goto [2]",
            "if [1] >= -3 goto 10",
            "[2] = [3] * 4",
            "[[2]] = get_random( 1, 6 )",
            "transmit( [5], 1, 10 )",
            "navigate_n_towards( 4, [9] )",
            "build( 1, 2, 0 )",
            "store_and_goto( 3, 9 )",
            "[9] = get_price( 2 )",
        ];
        for line in lines {
            let ins = create_test_compiled(line);
            assert_eq!(decompile(&ins), line);
        }
    }

    #[test]
    fn test_decompile_falls_back_to_hex() {
        let ins = Instruction::from_asm(0x0FFF, 1, 2, 3);
        assert_eq!(decompile(&ins), "0x0fff 0x0001 0x0002 0x0003");
        assert_eq!(compile(&decompile(&ins)), Some(ins));

        // navigate_to with a flagged argument has no friendly form
        let ins = Instruction::from_asm(NAVIGATE_TO | VALUE_ARG0, 5, 0, 0);
        assert_eq!(compile(&decompile(&ins)), Some(ins));
        assert!(decompile(&ins).starts_with("0x"));
    }

    #[test]
    fn test_predict_text_narrows() {
        assert!(predict_text("").is_empty());
        assert_eq!(predict_text("get_sense_result_type"), vec!["get_sense_result_type"]);
        assert!(!predict_text(">").is_empty());
        assert!(!predict_text("if").is_empty());
        let gets = predict_text("get_");
        assert!(gets.len() > 10);
        assert!(gets.windows(2).all(|w| w[0] < w[1]));
        assert!(predict_text("turn").contains(&"turn_ccw".to_string()));
    }
}
