//! Machine program memory.
//!
//! A program is a non-empty list of [`Instruction`]s addressed from 1. Line
//! numbers wrap modulo the program size, so line 0 is the last line and line
//! `size + 1` is the first again. Programs persist as decompiled assembly text.

#![allow(clippy::cast_possible_truncation)]

mod asm;
mod instruction;
pub mod opcode;

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BlueError;

pub use asm::{compile, compile_code, compile_lines, decompile, predict_text, try_compile};
pub use instruction::{Instruction, TEXT_MAX_LENGTH, check_assert, pack_assert_op};

/// Most lines any machine program may hold.
pub const MAX_BOT_INSTRUCTIONS: usize = 1000;

/// A machine's program: 1-based, wrapping, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "InstructionsJson", into = "InstructionsJson")]
pub struct Instructions {
    code: Vec<Instruction>,
}

impl Default for Instructions {
    fn default() -> Self {
        Self { code: vec![Instruction::nop()] }
    }
}

impl Instructions {
    /// Wrap a list of instructions. An empty list becomes a single no-op and a
    /// list longer than [`MAX_BOT_INSTRUCTIONS`] is truncated.
    #[must_use]
    pub fn new(mut code: Vec<Instruction>) -> Self {
        if code.is_empty() {
            return Self::default();
        }
        code.truncate(MAX_BOT_INSTRUCTIONS);
        Self { code }
    }

    /// A program of `n` no-ops (at least one).
    #[must_use]
    pub fn with_size(n: usize) -> Self {
        Self { code: vec![Instruction::nop(); n.clamp(1, MAX_BOT_INSTRUCTIONS)] }
    }

    /// Number of lines.
    #[must_use]
    pub fn size(&self) -> usize {
        self.code.len()
    }

    /// Zero-based storage index for a 1-based, wrapping line number.
    #[must_use]
    pub fn index_of(&self, line: u16) -> usize {
        let size = self.code.len();
        (usize::from(line) + size - 1) % size
    }

    /// Canonical 1-based line number for a wrapping line number.
    #[must_use]
    pub fn line_of(&self, line: u16) -> u16 {
        (self.index_of(line) + 1) as u16
    }

    /// Swap two lines.
    pub fn swap(&mut self, a: u16, b: u16) {
        let (a, b) = (self.index_of(a), self.index_of(b));
        self.code.swap(a, b);
    }

    /// `count` lines starting at `start`, wrapping past the end as needed.
    #[must_use]
    pub fn subset(&self, start: u16, count: usize) -> Self {
        let first = self.index_of(start);
        let size = self.code.len();
        let code = (0..count.min(MAX_BOT_INSTRUCTIONS))
            .map(|i| self.code[(first + i) % size])
            .collect();
        Self::new(code)
    }

    /// Lines in program order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.code.iter()
    }

    /// Decompiled text of every line.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        self.code.iter().map(decompile).collect()
    }
}

impl Index<u16> for Instructions {
    type Output = Instruction;

    fn index(&self, line: u16) -> &Instruction {
        &self.code[self.index_of(line)]
    }
}

impl IndexMut<u16> for Instructions {
    fn index_mut(&mut self, line: u16) -> &mut Instruction {
        let i = self.index_of(line);
        &mut self.code[i]
    }
}

impl FromStr for Instructions {
    type Err = BlueError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        compile_code(text)
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.to_lines().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct InstructionsJson {
    instructions: Vec<String>,
}

impl From<Instructions> for InstructionsJson {
    fn from(code: Instructions) -> Self {
        Self { instructions: code.to_lines() }
    }
}

impl TryFrom<InstructionsJson> for Instructions {
    type Error = BlueError;

    fn try_from(json: InstructionsJson) -> Result<Self, Self::Error> {
        compile_lines(json.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_program(n: i16) -> Instructions {
        Instructions::new((1..=n).map(Instruction::value).collect())
    }

    #[test]
    fn test_empty_program_is_one_nop() {
        let code = Instructions::new(Vec::new());
        assert_eq!(code.size(), 1);
        assert!(code[1].is_nop());
        assert_eq!(Instructions::with_size(0).size(), 1);
    }

    #[test]
    fn test_line_numbers_wrap() {
        let code = create_test_program(5);
        assert_eq!(code[1], Instruction::value(1));
        assert_eq!(code[5], Instruction::value(5));
        assert_eq!(code[0], code[5]);
        assert_eq!(code[6], code[1]);
        assert_eq!(code[10], code[0]);
        assert_eq!(code.line_of(0), 5);
        assert_eq!(code.line_of(7), 2);
    }

    #[test]
    fn test_large_line_numbers_wrap() {
        let code = create_test_program(7);
        assert_eq!(code[u16::MAX], code[(u32::from(u16::MAX) % 7) as u16]);
    }

    #[test]
    fn test_swap_and_subset_wrap() {
        let mut code = create_test_program(4);
        code.swap(0, 1);
        assert_eq!(code[1], Instruction::value(4));
        assert_eq!(code[4], Instruction::value(1));

        let part = code.subset(3, 3);
        assert_eq!(part.size(), 3);
        assert_eq!(part[1], Instruction::value(3));
        assert_eq!(part[2], Instruction::value(1));
        assert_eq!(part[3], Instruction::value(4));
    }

    #[test]
    fn test_too_long_program_is_truncated() {
        let code = Instructions::with_size(MAX_BOT_INSTRUCTIONS + 5);
        assert_eq!(code.size(), MAX_BOT_INSTRUCTIONS);
    }

    #[test]
    fn test_json_uses_assembly_text() {
        let code: Instructions = "sense( 3 )\n[1] = 4\n\n".parse().unwrap();
        let json = serde_json::to_value(&code).unwrap();
        assert_eq!(json["instructions"][0], "sense( 3 )");
        assert_eq!(json["instructions"][1], "[1] = 4");
        assert_eq!(json["instructions"][2], "");
        let back: Instructions = serde_json::from_value(json).unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn test_bad_json_line_is_rejected() {
        let json = serde_json::json!({ "instructions": ["sense( 3 )", "what is this"] });
        assert!(serde_json::from_value::<Instructions>(json).is_err());
    }
}
