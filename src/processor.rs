use std::convert::TryFrom;

use crate::instruction::{Context, Instruction, InstructionSet, Opcode};
use crate::io::{Input, Output};
use crate::memory::{Address, Memory, Stack, Value};
use crate::program::Program;
use log::*;

pub mod fault;

pub use fault::{Fault, FaultKind};

pub type Result<T, E = Fault> = std::result::Result<T, E>;

/// Registers and storage of the machine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineState {
    /// Program counter, 1-based
    pub counter: usize,
    /// Base pointer of the current call frame (AM1)
    pub base: usize,
    /// Operand stack
    pub stack: Stack,
    /// Memory cells. In AM1 this is the runtime stack.
    pub memory: Memory,
}

impl Default for MachineState {
    /// Initializes the state at the first instruction
    fn default() -> Self {
        Self {
            counter: 1,
            base: 0,
            stack: Stack::default(),
            memory: Memory::default(),
        }
    }
}

impl MachineState {
    /// Splits the runtime stack into call frames, latest first.
    /// Parameters are part of the calling frame.
    pub fn frames(&self) -> Vec<Vec<Value>> {
        let cells: Vec<Value> = self.memory.values().collect();
        let mut frames = Vec::new();
        let mut previous = cells.len() + 2;
        let mut reference = self.base;

        while reference > 0 {
            if reference < 2 || reference > cells.len() || reference >= previous {
                break;
            }
            frames.push(cells[reference - 2..previous - 2].to_vec());
            previous = reference;
            reference = match usize::try_from(cells[reference - 1]) {
                Ok(reference) => reference,
                Err(_) => break,
            };
        }
        if previous > 2 {
            frames.push(cells[..previous - 2].to_vec());
        }

        frames
    }
}

/// Outcome of a successful step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// An instruction was executed
    Continue,
    /// The counter left the program, nothing was executed
    Halted,
}

/// How the counter moves after an instruction
enum Flow {
    Next,
    Jump(usize),
}

/// Executes instructions of one instruction set against a [`MachineState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processor {
    instruction_set: InstructionSet,
    pub state: MachineState,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(InstructionSet::default())
    }
}

impl Processor {
    /// Initializes a new machine
    pub fn new(instruction_set: InstructionSet) -> Self {
        Self::with_state(instruction_set, MachineState::default())
    }

    /// Resumes from an existing state
    pub fn with_state(instruction_set: InstructionSet, state: MachineState) -> Self {
        Self {
            instruction_set,
            state,
        }
    }

    pub fn instruction_set(&self) -> InstructionSet {
        self.instruction_set
    }

    pub fn into_state(self) -> MachineState {
        self.state
    }

    /// Resets the machine to its initial state
    pub fn reset(&mut self) {
        self.state = MachineState::default();
    }

    /// Executes a single instruction at the current counter.
    ///
    /// # Errors
    ///
    /// On a fault the state is left untouched.
    pub fn execute_instruction<I, O>(
        &mut self,
        instruction: Instruction,
        input: &mut I,
        output: &mut O,
    ) -> Result<()>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        let counter = self.state.counter;
        let flow = self
            .apply(instruction, input, output)
            .map_err(|kind| Fault::new(kind, counter, Some(instruction)))?;

        self.state.counter = match flow {
            Flow::Next => counter + 1,
            Flow::Jump(target) => target,
        };

        Ok(())
    }

    /// Checks whether the counter has left `program` normally
    pub fn is_halted(&self, program: &Program) -> bool {
        self.state.counter == 0 || self.state.counter == program.len() + 1
    }

    /// Runs one execution step
    pub fn step<I, O>(&mut self, program: &Program, input: &mut I, output: &mut O) -> Result<Step>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        if self.is_halted(program) {
            return Ok(Step::Halted);
        }

        let counter = self.state.counter;
        let instruction = *program.fetch(counter).ok_or_else(|| {
            Fault::new(
                FaultKind::JumpOutOfRange {
                    target: counter as i64,
                },
                counter,
                None,
            )
        })?;

        self.execute_instruction(instruction, input, output)?;
        trace!("{}", self.configuration(&[], &[]));

        Ok(Step::Continue)
    }

    /// Runs `program` until the counter leaves it
    pub fn run<I, O>(&mut self, program: &Program, input: &mut I, output: &mut O) -> Result<()>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        while self.step(program, input, output)? == Step::Continue {}

        info!("Program terminated. Counter: {}", self.state.counter);

        Ok(())
    }

    /// Runs at most `steps` instructions. Returns [`Step::Continue`] if the
    /// program has not terminated yet.
    pub fn run_for<I, O>(
        &mut self,
        program: &Program,
        steps: usize,
        input: &mut I,
        output: &mut O,
    ) -> Result<Step>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        for _ in 0..steps {
            if self.step(program, input, output)? == Step::Halted {
                return Ok(Step::Halted);
            }
        }

        if self.is_halted(program) {
            Ok(Step::Halted)
        } else {
            Ok(Step::Continue)
        }
    }

    /// Applies the rule of `instruction`. Every check runs before the first mutation.
    fn apply<I, O>(
        &mut self,
        instruction: Instruction,
        input: &mut I,
        output: &mut O,
    ) -> Result<Flow, FaultKind>
    where
        I: Input + ?Sized,
        O: Output + ?Sized,
    {
        let opcode = instruction.opcode();
        if !self.instruction_set.supports(opcode) {
            return Err(FaultKind::UnsupportedOpcode {
                instruction_set: self.instruction_set,
            });
        }

        let context = instruction.context();
        let operand = instruction.operand().unwrap_or_default();

        match opcode {
            Opcode::ADD => self.binary(opcode, Value::wrapping_add)?,
            Opcode::MUL => self.binary(opcode, Value::wrapping_mul)?,
            Opcode::SUB => self.binary(opcode, Value::wrapping_sub)?,
            Opcode::DIV => {
                self.check_divisor()?;
                self.binary(opcode, floor_div)?;
            }
            Opcode::MOD => {
                self.check_divisor()?;
                self.binary(opcode, floor_mod)?;
            }
            Opcode::EQ => self.binary(opcode, |a, b| (a == b) as Value)?,
            Opcode::NE => self.binary(opcode, |a, b| (a != b) as Value)?,
            Opcode::LT => self.binary(opcode, |a, b| (a < b) as Value)?,
            Opcode::GT => self.binary(opcode, |a, b| (a > b) as Value)?,
            Opcode::LE => self.binary(opcode, |a, b| (a <= b) as Value)?,
            Opcode::GE => self.binary(opcode, |a, b| (a >= b) as Value)?,
            Opcode::NEG => {
                let value = self.pop()?;
                let result = value.wrapping_neg();
                self.state.stack.push(result);

                debug!("NEG {}: {}", value, result);
            }
            Opcode::LOAD => {
                let address = self.resolve(context, operand)?;
                let value = self.read(address)?;
                self.state.stack.push(value);

                debug!("LOAD {}: {}", address, value);
            }
            Opcode::LOADA => {
                let address = self.resolve(context, operand)?;
                self.state.stack.push(address as Value);

                debug!("LOADA {}", address);
            }
            Opcode::LOADI => {
                let address = self.indirect(operand)?;
                let value = self.read(address)?;
                self.state.stack.push(value);

                debug!("LOADI {}: {}", address, value);
            }
            Opcode::STORE => {
                let address = self.writable(self.resolve(context, operand)?)?;
                let value = self.pop()?;
                self.state.memory.write(address, value);

                debug!("STORE {}: {}", address, value);
            }
            Opcode::STOREI => {
                let address = self.writable(self.indirect(operand)?)?;
                let value = self.pop()?;
                self.state.memory.write(address, value);

                debug!("STOREI {}: {}", address, value);
            }
            Opcode::LIT => {
                self.state.stack.push(operand);

                debug!("LIT {}", operand);
            }
            Opcode::JMP => {
                let target = jump_target(operand)?;

                debug!("JMP {}", target);
                return Ok(Flow::Jump(target));
            }
            Opcode::JMC => {
                let value = self.peek()?;
                let target = if value == 0 {
                    Some(jump_target(operand)?)
                } else {
                    None
                };
                self.pop()?;

                debug!("JMC {}: {}", operand, value);
                if let Some(target) = target {
                    return Ok(Flow::Jump(target));
                }
            }
            Opcode::WRITE => {
                let address = self.resolve(context, operand)?;
                let value = self.read(address)?;
                output.write_output(value);

                debug!("WRITE {}: {}", address, value);
            }
            Opcode::WRITEI => {
                let address = self.indirect(operand)?;
                let value = self.read(address)?;
                output.write_output(value);

                debug!("WRITEI {}: {}", address, value);
            }
            Opcode::READ => {
                let address = self.writable(self.resolve(context, operand)?)?;
                let value = input.next_input().ok_or(FaultKind::InputExhausted)?;
                self.state.memory.write(address, value);

                debug!("READ {}: {}", address, value);
            }
            Opcode::READI => {
                let address = self.writable(self.indirect(operand)?)?;
                let value = input.next_input().ok_or(FaultKind::InputExhausted)?;
                self.state.memory.write(address, value);

                debug!("READI {}: {}", address, value);
            }
            Opcode::PUSH => {
                let value = self.pop()?;
                let address = self.state.memory.push(value);

                debug!("PUSH {}: {}", address, value);
            }
            Opcode::CALL => {
                let target = jump_target(operand)?;
                let return_counter = self.state.counter + 1;
                self.state.memory.push(return_counter as Value);
                self.state.base = self.state.memory.push(self.state.base as Value);

                debug!("CALL {}: base {}", target, self.state.base);
                return Ok(Flow::Jump(target));
            }
            Opcode::INIT => {
                // negative counts allocate nothing
                let cells = usize::try_from(operand).unwrap_or_default();
                if cells > Memory::CAPACITY.saturating_sub(self.state.memory.len()) {
                    return Err(FaultKind::MemoryExhausted { cells });
                }
                for _ in 0..cells {
                    self.state.memory.push(0);
                }

                debug!("INIT {}", cells);
            }
            Opcode::RET => return self.ret(operand),
            Opcode::RETURN => return self.ret(0),
        }

        Ok(Flow::Next)
    }

    /// Pops two operands and pushes `operation(second, top)`
    fn binary<F>(&mut self, opcode: Opcode, operation: F) -> Result<(), FaultKind>
    where
        F: FnOnce(Value, Value) -> Value,
    {
        self.require(2)?;
        let b = self.pop()?;
        let a = self.pop()?;
        let result = operation(a, b);
        self.state.stack.push(result);

        debug!("{} {} {}: {}", opcode, a, b, result);

        Ok(())
    }

    fn check_divisor(&self) -> Result<(), FaultKind> {
        self.require(2)?;
        match self.state.stack.peek(0) {
            Some(0) => Err(FaultKind::DivisionByZero),
            _ => Ok(()),
        }
    }

    fn require(&self, required: usize) -> Result<(), FaultKind> {
        let available = self.state.stack.len();
        if available < required {
            Err(FaultKind::StackUnderflow {
                required,
                available,
            })
        } else {
            Ok(())
        }
    }

    fn peek(&self) -> Result<Value, FaultKind> {
        self.require(1)?;
        self.state
            .stack
            .peek(0)
            .ok_or(FaultKind::StackUnderflow {
                required: 1,
                available: 0,
            })
    }

    fn pop(&mut self) -> Result<Value, FaultKind> {
        self.state.stack.pop().ok_or(FaultKind::StackUnderflow {
            required: 1,
            available: 0,
        })
    }

    /// Lowest valid memory address
    fn first_address(&self) -> i64 {
        match self.instruction_set {
            InstructionSet::Am0 => 0,
            InstructionSet::Am1 => 1,
        }
    }

    /// Turns an address operand into an absolute address
    fn resolve(&self, context: Context, address: i64) -> Result<Address, FaultKind> {
        let absolute = match context {
            Context::Global => address,
            Context::Local => address.saturating_add(self.state.base as i64),
        };

        if absolute < self.first_address() {
            return Err(FaultKind::InvalidAddress { address: absolute });
        }
        Address::try_from(absolute).map_err(|_| FaultKind::InvalidAddress { address: absolute })
    }

    /// Follows the pointer stored in local cell `address`
    fn indirect(&self, address: i64) -> Result<Address, FaultKind> {
        let pointer = self.read(self.resolve(Context::Local, address)?)?;
        self.resolve(Context::Global, pointer)
    }

    /// Reads a cell, unwritten cells are invalid
    fn read(&self, address: Address) -> Result<Value, FaultKind> {
        self.state
            .memory
            .read(address)
            .ok_or(FaultKind::InvalidAddress {
                address: address as i64,
            })
    }

    /// AM1 only writes cells already on the runtime stack
    fn writable(&self, address: Address) -> Result<Address, FaultKind> {
        match self.instruction_set {
            InstructionSet::Am1 if !self.state.memory.contains(address) => {
                Err(FaultKind::InvalidAddress {
                    address: address as i64,
                })
            }
            _ => Ok(address),
        }
    }

    /// Leaves the current frame, dropping it and `parameters` cells below it
    fn ret(&mut self, parameters: i64) -> Result<Flow, FaultKind> {
        let base = self.state.base;
        if base < 2 {
            return Err(FaultKind::NoActiveFrame);
        }

        let return_counter = self.read(base - 1)?;
        let previous_base = self.read(base)?;
        let target = jump_target(return_counter)?;
        let previous_base = usize::try_from(previous_base).map_err(|_| {
            FaultKind::InvalidAddress {
                address: previous_base,
            }
        })?;
        let keep = (base as i64 - 2).saturating_sub(parameters);
        let keep = usize::try_from(keep).map_err(|_| FaultKind::InvalidAddress { address: keep })?;

        self.state.memory.truncate(keep);
        self.state.base = previous_base;

        debug!("RET {}: {} base {}", parameters, target, previous_base);

        Ok(Flow::Jump(target))
    }
}

fn jump_target(target: i64) -> Result<usize, FaultKind> {
    usize::try_from(target).map_err(|_| FaultKind::JumpOutOfRange { target })
}

/// Quotient rounded towards negative infinity
fn floor_div(a: Value, b: Value) -> Value {
    let quotient = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        quotient - 1
    } else {
        quotient
    }
}

/// Remainder with the sign of the divisor
fn floor_mod(a: Value, b: Value) -> Value {
    let remainder = a.wrapping_rem(b);
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        remainder + b
    } else {
        remainder
    }
}
