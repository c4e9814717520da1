//! A single four-word machine instruction.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::fmt;

use crate::hex::HexCoord;

use super::opcode::{
    INSTRUCTION_MASK, LOCATION, NOP, VALUE_ARG_MASK, VALUE_ARG0, opcode_name, value_flag,
};

/// Most characters a `print( "TEXT" )` instruction can carry.
pub const TEXT_MAX_LENGTH: usize = 6;

/// One line of a machine program: a command word and three argument words.
///
/// The command word's low twelve bits hold the opcode and its top bits flag
/// which arguments are immediate values. Unflagged arguments are line
/// numbers whose contents the VM reads at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Instruction {
    /// Opcode plus argument value flags.
    pub command: u16,
    /// The three argument words.
    pub args: [u16; 3],
}

impl Instruction {
    /// Build an instruction from its four raw words.
    #[must_use]
    pub const fn from_asm(command: u16, arg0: u16, arg1: u16, arg2: u16) -> Self {
        Self { command, args: [arg0, arg1, arg2] }
    }

    /// The no-op instruction (all words zero).
    #[must_use]
    pub const fn nop() -> Self {
        Self { command: NOP, args: [0, 0, 0] }
    }

    /// A data line holding a single value: a no-op with its first argument
    /// flagged as an immediate.
    #[must_use]
    pub const fn value(v: i16) -> Self {
        Self { command: NOP | VALUE_ARG0, args: [v as u16, 0, 0] }
    }

    /// A data line holding a packed board coordinate.
    #[must_use]
    pub const fn location(xy: HexCoord) -> Self {
        Self { command: LOCATION, args: [xy.to_u16(), 0, 0] }
    }

    /// Opcode without flags.
    #[must_use]
    pub const fn cmd(&self) -> u16 {
        self.command & INSTRUCTION_MASK
    }

    /// Value flags without the opcode.
    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.command & VALUE_ARG_MASK
    }

    /// Raw argument word `n` (0..=2).
    #[must_use]
    pub const fn arg(&self, n: usize) -> u16 {
        self.args[n]
    }

    /// Argument `n` reinterpreted as a signed value.
    #[must_use]
    pub const fn signed_arg(&self, n: usize) -> i16 {
        self.args[n] as i16
    }

    /// True when argument `n` is a line number to read through rather than an
    /// immediate value.
    #[must_use]
    pub const fn is_indirection(&self, n: usize) -> bool {
        self.command & value_flag(n) == 0
    }

    /// True for a data line made by [`Instruction::value`].
    #[must_use]
    pub const fn is_value(&self) -> bool {
        self.cmd() == NOP && self.command & VALUE_ARG0 != 0
    }

    /// True for a data line made by [`Instruction::location`].
    #[must_use]
    pub const fn is_location(&self) -> bool {
        self.command == LOCATION
    }

    /// True for a plain no-op: no flags, no arguments.
    #[must_use]
    pub const fn is_nop(&self) -> bool {
        self.command == NOP && self.args[0] == 0 && self.args[1] == 0 && self.args[2] == 0
    }

    /// Coordinate held by a location line.
    #[must_use]
    pub const fn location_value(&self) -> HexCoord {
        HexCoord::from_u16(self.args[0])
    }

    /// The two characters packed into argument `n`, low byte first, with
    /// trailing NULs dropped.
    #[must_use]
    pub fn arg_as_chars(&self, n: usize) -> String {
        let w = self.args[n];
        [(w & 0xFF) as u8, (w >> 8) as u8]
            .into_iter()
            .take_while(|&b| b != 0)
            .map(char::from)
            .collect()
    }

    /// Text packed across all three arguments, stopping at the first NUL.
    /// Unprintable bytes are shown as `?`.
    #[must_use]
    pub fn args_as_text(&self) -> String {
        self.args
            .iter()
            .flat_map(|w| [(w & 0xFF) as u8, (w >> 8) as u8])
            .take_while(|&b| b != 0)
            .map(|b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '?' })
            .collect()
    }

    /// Pack up to [`TEXT_MAX_LENGTH`] bytes into three argument words, low
    /// byte first. Longer text is truncated.
    #[must_use]
    pub fn pack_text(text: &str) -> [u16; 3] {
        let mut args = [0u16; 3];
        for (i, b) in text.bytes().take(TEXT_MAX_LENGTH).enumerate() {
            args[i / 2] |= u16::from(b) << ((i % 2) * 8);
        }
        args
    }
}

/// Evaluate an assertion operator against two operands.
///
/// `op` packs up to two ASCII characters, the first in the low byte. An `op`
/// of zero asserts that `op1` is non-zero. Comparisons are unsigned; `&&` and
/// `||` are logical while a lone `&` or `|` tests the bitwise result.
#[must_use]
pub const fn check_assert(op1: u16, op2: u16, op: u16) -> bool {
    if op == 0 {
        return op1 != 0;
    }
    let first = (op & 0xFF) as u8;
    let second = (op >> 8) as u8;
    match (first, second) {
        (b'=', b'=') => op1 == op2,
        (b'!', b'=') => op1 != op2,
        (b'<', b'=') => op1 <= op2,
        (b'>', b'=') => op1 >= op2,
        (b'&', b'&') => op1 != 0 && op2 != 0,
        (b'|', b'|') => op1 != 0 || op2 != 0,
        (b'&', 0) => op1 & op2 != 0,
        (b'|', 0) => op1 | op2 != 0,
        (b'<', 0) => op1 < op2,
        (b'>', 0) => op1 > op2,
        (b'!', 0) => op1 == 0,
        _ => false,
    }
}

/// Pack a one- or two-character assertion operator, first character low.
#[must_use]
pub fn pack_assert_op(op: &str) -> u16 {
    op.bytes().take(2).enumerate().fold(0, |acc, (i, b)| acc | (u16::from(b) << (i * 8)))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match opcode_name(self.cmd()) {
            Some(name) => write!(f, "{name}")?,
            None => write!(f, "0x{:04x}", self.cmd())?,
        }
        for n in 0..3 {
            if self.is_indirection(n) {
                write!(f, " [{}]", self.args[n])?;
            } else {
                write!(f, " {}", self.signed_arg(n))?;
            }
        }
        Ok(())
    }
}
