//! Operand fetching for the instruction being executed.

use crate::hex::{HexCoord, TurnDirection};
use crate::instructions::opcode::{LOCATION, NOP};
use crate::instructions::{Instruction, Instructions};

use super::events::MachineFault;

/// What an operand must hold when it is read through a line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgType {
    /// A value line.
    Value,
    /// A location line.
    Location,
    /// A value line whose value is a turn direction.
    Direction,
    /// Either a value or a location line.
    Data,
}

/// The resolved operands of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Args {
    args: [u16; 3],
}

impl Args {
    /// Resolve the first `types.len()` operands of `ins`.
    ///
    /// Immediate operands are taken as they are. Indirect operands read the
    /// first argument of the line they name, which must be of the expected
    /// kind. Every operand is fetched; when several are wrong the last one
    /// decides the fault.
    pub(crate) fn fetch(code: &Instructions, ins: &Instruction, types: &[ArgType]) -> Result<Self, MachineFault> {
        let mut args = [0u16; 3];
        let mut fault = None;
        for (i, &t) in types.iter().enumerate().take(3) {
            if !ins.is_indirection(i) {
                args[i] = ins.arg(i);
                continue;
            }
            let deref = code[ins.arg(i)];
            args[i] = deref.arg(0);
            let cmd = deref.cmd();
            match t {
                ArgType::Value | ArgType::Direction if cmd != NOP => {
                    fault = Some(MachineFault::ExpectedValueNotFoundAtLine);
                }
                ArgType::Location if cmd != LOCATION => {
                    fault = Some(MachineFault::ExpectedLocationNotFoundAtLine);
                }
                ArgType::Data if cmd != NOP && cmd != LOCATION => {
                    fault = Some(MachineFault::ExpectedValueNotFoundAtLine);
                }
                _ => {}
            }
        }
        fault.map_or(Ok(Self { args }), Err)
    }

    pub(crate) const fn value(&self, i: usize) -> u16 {
        self.args[i]
    }

    pub(crate) const fn location(&self, i: usize) -> HexCoord {
        HexCoord::from_u16(self.args[i])
    }

    pub(crate) const fn direction(&self, i: usize) -> TurnDirection {
        TurnDirection::from_value(self.args[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::opcode::{ADD, TURN, VALUE_ARG0, VALUE_ARG1, VALUE_ARG2};

    fn create_test_code() -> Instructions {
        Instructions::new(vec![
            Instruction::value(7),
            Instruction::location(HexCoord::new(3, 4)),
            Instruction::from_asm(TURN, 1, 1, 0),
            Instruction::value(-1),
        ])
    }

    #[test]
    fn test_immediates_are_taken_raw() {
        let code = create_test_code();
        let ins = Instruction::from_asm(ADD | VALUE_ARG0 | VALUE_ARG1 | VALUE_ARG2, 9, 8, 7);
        let args = Args::fetch(&code, &ins, &[ArgType::Value, ArgType::Value, ArgType::Value]).unwrap();
        assert_eq!((args.value(0), args.value(1), args.value(2)), (9, 8, 7));
    }

    #[test]
    fn test_indirect_reads_first_argument() {
        let code = create_test_code();
        let ins = Instruction::from_asm(ADD | VALUE_ARG0, 1, 1, 2);
        let args = Args::fetch(&code, &ins, &[ArgType::Value, ArgType::Value, ArgType::Location]).unwrap();
        assert_eq!(args.value(1), 7);
        assert_eq!(args.location(2), HexCoord::new(3, 4));
    }

    #[test]
    fn test_wrong_kind_of_line_faults() {
        let code = create_test_code();
        let ins = Instruction::from_asm(ADD, 2, 0, 0);
        assert_eq!(
            Args::fetch(&code, &ins, &[ArgType::Value]),
            Err(MachineFault::ExpectedValueNotFoundAtLine)
        );
        let ins = Instruction::from_asm(ADD, 1, 0, 0);
        assert_eq!(
            Args::fetch(&code, &ins, &[ArgType::Location]),
            Err(MachineFault::ExpectedLocationNotFoundAtLine)
        );
        let ins = Instruction::from_asm(ADD, 3, 2, 0);
        assert_eq!(
            Args::fetch(&code, &ins, &[ArgType::Data, ArgType::Data]),
            Err(MachineFault::ExpectedValueNotFoundAtLine)
        );
    }

    #[test]
    fn test_last_fault_wins() {
        let code = create_test_code();
        let ins = Instruction::from_asm(ADD, 3, 1, 0);
        assert_eq!(
            Args::fetch(&code, &ins, &[ArgType::Value, ArgType::Location]),
            Err(MachineFault::ExpectedLocationNotFoundAtLine)
        );
    }

    #[test]
    fn test_direction_is_parity() {
        let code = create_test_code();
        let ins = Instruction::from_asm(TURN | VALUE_ARG0 | VALUE_ARG1, 2, 3, 0);
        let args = Args::fetch(&code, &ins, &[ArgType::Direction, ArgType::Direction]).unwrap();
        assert_eq!(args.direction(1), TurnDirection::Clockwise);
        assert_eq!(args.direction(0), TurnDirection::CounterClockwise);
    }
}
