//! Human readable views of a machine: the status listing and the
//! configuration tuple of the formal machine notation, e.g.
//! `(4, 2 : 1, [0/8, 1/42], ε, 42)` for AM0 or
//! `(31, ε, 1 : 0 : 3 : 0, 4, ε, ε)` for AM1.

use std::collections::VecDeque;
use std::fmt;

use crate::instruction::InstructionSet;
use crate::memory::Value;
use crate::processor::{Fault, Processor, Step};
use crate::program::Program;

/// Writes `values` joined by ` : `, or `ε` if there are none
fn write_sequence<I>(f: &mut fmt::Formatter<'_>, values: I) -> fmt::Result
where
    I: IntoIterator<Item = Value>,
{
    let mut values = values.into_iter().peekable();
    if values.peek().is_none() {
        return f.write_str("ε");
    }
    let mut first = true;
    for value in values {
        if !first {
            f.write_str(" : ")?;
        }
        write!(f, "{}", value)?;
        first = false;
    }
    Ok(())
}

/// Multi-line status report. The stack is listed bottom to top.
pub struct Status<'a> {
    processor: &'a Processor,
}

impl fmt::Display for Status<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = &self.processor.state;

        writeln!(f, "Counter: {}", state.counter)?;
        writeln!(f, "Stack: {:?}", state.stack.as_slice())?;

        match self.processor.instruction_set() {
            InstructionSet::Am0 => {
                writeln!(f, "Memory:")?;
                for (address, value) in state.memory.iter() {
                    writeln!(f, "\t{} := {}", address, value)?;
                }
            }
            InstructionSet::Am1 => {
                writeln!(f, "Runtime Stack:")?;
                for (address, value) in state.memory.iter() {
                    writeln!(f, "\t{} := {}", address, value)?;
                }
                writeln!(f, "Reference Pointer: {}", state.base)?;
            }
        }

        Ok(())
    }
}

/// Configuration tuple including the remaining input and the produced output
pub struct Configuration<'a> {
    processor: &'a Processor,
    input: &'a [Value],
    output: &'a [Value],
}

impl fmt::Display for Configuration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = &self.processor.state;

        write!(f, "({}, ", state.counter)?;
        write_sequence(f, state.stack.as_slice().iter().rev().copied())?;
        f.write_str(", ")?;

        match self.processor.instruction_set() {
            InstructionSet::Am0 => {
                f.write_str("[")?;
                for (index, (address, value)) in state.memory.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}/{}", address, value)?;
                }
                f.write_str("], ")?;
            }
            InstructionSet::Am1 => {
                write_sequence(f, state.memory.values())?;
                write!(f, ", {}, ", state.base)?;
            }
        }

        write_sequence(f, self.input.iter().copied())?;
        f.write_str(", ")?;
        write_sequence(f, self.output.iter().copied())?;
        f.write_str(")")
    }
}

impl Processor {
    pub fn status(&self) -> Status<'_> {
        Status { processor: self }
    }

    pub fn configuration<'a>(&'a self, input: &'a [Value], output: &'a [Value]) -> Configuration<'a> {
        Configuration {
            processor: self,
            input,
            output,
        }
    }
}

/// Runs `program` on `inputs` and records the configuration before the
/// first and after every executed instruction
pub fn trace(program: &Program, inputs: &[Value]) -> (Vec<String>, Result<(), Fault>) {
    let mut processor = Processor::new(program.instruction_set());
    let mut input: VecDeque<Value> = inputs.iter().copied().collect();
    let mut output: Vec<Value> = Vec::new();

    let mut lines = vec![processor.configuration(inputs, &output).to_string()];
    loop {
        match processor.step(program, &mut input, &mut output) {
            Ok(Step::Continue) => {
                let remaining: Vec<Value> = input.iter().copied().collect();
                lines.push(processor.configuration(&remaining, &output).to_string());
            }
            Ok(Step::Halted) => return (lines, Ok(())),
            Err(fault) => return (lines, Err(fault)),
        }
    }
}
