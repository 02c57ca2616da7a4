//! Virtual machines for the AM0 and AM1 instruction sets.
//!
//! AM0 is a stack machine with a program counter, an operand stack and
//! addressable memory. AM1 extends it with procedure calls: memory becomes a
//! runtime stack of call frames addressed relative to a base pointer.
//!
//! ```
//! use amn::{load, run, InstructionSet};
//! use std::collections::VecDeque;
//!
//! let program = load("READ 0; LOAD 0; LIT 2; MUL; STORE 1; WRITE 1;", InstructionSet::Am0).unwrap();
//! let mut input: VecDeque<i64> = vec![21].into();
//! let mut output: Vec<i64> = Vec::new();
//! let (_, result) = run(&program, &mut input, &mut output);
//! assert!(result.is_ok());
//! assert_eq!(output, vec![42]);
//! ```

pub mod instruction;
pub mod io;
pub mod memory;
pub mod processor;
pub mod program;
pub mod status;

pub use instruction::parse::ParseError;
pub use instruction::{Instruction, InstructionSet, Opcode};
pub use processor::{Fault, FaultKind, MachineState, Processor, Step};
pub use program::Program;

/// Parses `text` into a program for `instruction_set`
pub fn load(text: &str, instruction_set: InstructionSet) -> Result<Program, ParseError> {
    Program::parse(text, instruction_set)
}

/// Runs `program` on a fresh machine until it terminates or faults.
/// The final state is returned in both cases.
pub fn run<I, O>(program: &Program, input: &mut I, output: &mut O) -> (MachineState, Result<(), Fault>)
where
    I: io::Input + ?Sized,
    O: io::Output + ?Sized,
{
    let mut processor = Processor::new(program.instruction_set());
    let result = processor.run(program, input, output);
    if let Err(fault) = &result {
        log::error!("{}", fault);
    }
    (processor.into_state(), result)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::memory::Value;
    use color_eyre::eyre::Result;

    const MAXIMUM: &str = "READ 0; READ 1; LOAD 0; LOAD 1; GT; JMC 10; LOAD 0; STORE 2; JMP 12; LOAD 1; STORE 2; WRITE 2;";

    const SUM_OF_SQUARES: &str = include_str!("../demos/programs/sum_of_squares.am0");

    const DOUBLE: &str = include_str!("../demos/programs/double.am1");

    const ARITHMETIC: &str = "
READ 1;
LOAD 1;
LIT 7;
LIT 1;
SUB;
DIV;
LIT 2;
MOD;
STORE 1;
LOAD 1; LIT 0; EQ;
LOAD 1; LIT 0; NE;
LOAD 1; LIT 0; LT;
LOAD 1; LIT 0; GT;
LOAD 1; LIT 1; LE;
LOAD 1; LIT 1; GE;
WRITE 1;
STORE 2; WRITE 2;
STORE 2; WRITE 2;
STORE 2; WRITE 2;
STORE 2; WRITE 2;
STORE 2; WRITE 2;
STORE 2; WRITE 2;
";

    fn run_with(
        text: &str,
        instruction_set: InstructionSet,
        inputs: Vec<Value>,
    ) -> Result<(MachineState, Vec<Value>)> {
        let program = load(text, instruction_set)?;
        let mut input: VecDeque<Value> = inputs.into();
        let mut output: Vec<Value> = Vec::new();
        let (state, result) = run(&program, &mut input, &mut output);
        result?;
        Ok((state, output))
    }

    #[test]
    fn maximum_of_two_inputs() -> Result<()> {
        let (_, output) = run_with(MAXIMUM, InstructionSet::Am0, vec![8, 42])?;
        assert_eq!(output, vec![42]);

        let (_, output) = run_with(MAXIMUM, InstructionSet::Am0, vec![42, 8])?;
        assert_eq!(output, vec![42]);

        Ok(())
    }

    #[test]
    fn sum_of_squares() -> Result<()> {
        let (state, output) = run_with(SUM_OF_SQUARES, InstructionSet::Am0, vec![2])?;
        assert_eq!(output, vec![5]);
        assert!(state.stack.is_empty());

        let (_, output) = run_with(SUM_OF_SQUARES, InstructionSet::Am0, vec![10])?;
        assert_eq!(output, vec![385]);

        Ok(())
    }

    #[test]
    fn arithmetic_and_comparisons() -> Result<()> {
        let (_, output) = run_with(ARITHMETIC, InstructionSet::Am0, vec![42])?;
        assert_eq!(output, vec![1, 1, 1, 1, 0, 1, 0]);

        Ok(())
    }

    #[test]
    fn recursive_procedure() -> Result<()> {
        let (state, output) = run_with(DOUBLE, InstructionSet::Am1, vec![1, 42])?;
        assert_eq!(output, vec![2]);
        assert_eq!(state.counter, 0);
        assert_eq!(state.base, 0);
        assert_eq!(state.memory.values().collect::<Vec<_>>(), vec![1, 2]);

        let (_, output) = run_with(DOUBLE, InstructionSet::Am1, vec![5])?;
        assert_eq!(output, vec![10]);

        Ok(())
    }

    #[test]
    fn am0_runs_on_am1() -> Result<()> {
        let program = "INIT 3; READ 1; LOAD 1; LOAD 1; MUL; STORE 2; WRITE 2;";
        let (_, output) = run_with(program, InstructionSet::Am1, vec![-7])?;
        assert_eq!(output, vec![49]);

        Ok(())
    }

    #[test]
    fn runs_are_deterministic() -> Result<()> {
        let text = "LIT 6; LIT 7; MUL; STORE 0; LIT 0; LOAD 0; LIT 2; DIV; STORE 1;";
        let (first, _) = run_with(text, InstructionSet::Am0, vec![])?;
        let (second, _) = run_with(text, InstructionSet::Am0, vec![])?;

        assert_eq!(first, second);
        assert_eq!(first.stack.as_slice(), &[0]);
        assert_eq!(first.memory.iter().collect::<Vec<_>>(), vec![(0, 42), (1, 21)]);

        Ok(())
    }

    #[test]
    fn fault_reports_final_state() -> Result<()> {
        let program = load("LIT 4; LIT 0; DIV;", InstructionSet::Am0)?;
        let (state, result) = run(&program, &mut VecDeque::<Value>::new(), &mut Vec::<Value>::new());

        let fault = result.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::DivisionByZero);
        assert_eq!(fault.counter(), 3);
        assert_eq!(fault.to_string(), "fault [pc: 3]: division by zero - `DIV`");
        assert_eq!(state.stack.as_slice(), &[4, 0]);
        assert_eq!(state.counter, 3);

        Ok(())
    }

    #[test]
    fn am1_program_is_rejected_by_am0() -> Result<()> {
        let err = load("LIT 1; PUSH;", InstructionSet::Am0).unwrap_err();
        assert_eq!(
            err.kind(),
            instruction::parse::ParseErrorKind::UnsupportedOpcode {
                instruction_set: InstructionSet::Am0
            }
        );

        Ok(())
    }
}
