use std::error;
use std::fmt;

use crate::instruction::{Instruction, InstructionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    StackUnderflow { required: usize, available: usize },
    DivisionByZero,
    InvalidAddress { address: i64 },
    UnsupportedOpcode { instruction_set: InstructionSet },
    JumpOutOfRange { target: i64 },
    InputExhausted,
    NoActiveFrame,
    MemoryExhausted { cells: usize },
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::StackUnderflow {
                required,
                available,
            } => write!(
                f,
                "stack underflow, {} values required but {} available",
                required, available
            ),
            FaultKind::DivisionByZero => f.write_str("division by zero"),
            FaultKind::InvalidAddress { address } => {
                write!(f, "invalid memory address `{}`", address)
            }
            FaultKind::UnsupportedOpcode { instruction_set } => {
                write!(f, "opcode is not part of `{}`", instruction_set)
            }
            FaultKind::JumpOutOfRange { target } => {
                write!(f, "jump target `{}` is outside of the program", target)
            }
            FaultKind::InputExhausted => f.write_str("no input left"),
            FaultKind::NoActiveFrame => f.write_str("return without an active call frame"),
            FaultKind::MemoryExhausted { cells } => {
                write!(f, "runtime stack cannot grow by `{}` cells", cells)
            }
        }
    }
}

/// Runtime error raised while executing an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    kind: FaultKind,
    counter: usize,
    instruction: Option<Instruction>,
}

impl Fault {
    pub(crate) fn new(kind: FaultKind, counter: usize, instruction: Option<Instruction>) -> Self {
        Self {
            kind,
            counter,
            instruction,
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Counter of the faulting instruction
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// The faulting instruction, `None` if the fetch itself failed
    pub fn instruction(&self) -> Option<Instruction> {
        self.instruction
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(instruction) = &self.instruction {
            write!(
                f,
                "fault [pc: {}]: {} - `{}`",
                self.counter, self.kind, instruction
            )
        } else {
            write!(f, "fault [pc: {}]: {}", self.counter, self.kind)
        }
    }
}

impl error::Error for Fault {}
