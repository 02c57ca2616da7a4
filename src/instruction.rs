use std::fmt;
use std::str::FromStr;

use num_enum::IntoPrimitive;

pub mod parse;

/// First code of the opcodes carrying an operand
const FIRST_UNARY_CODE: u8 = 0x20;

/// Selects which catalog of opcodes is available for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionSet {
    /// Flat memory stack machine
    Am0,
    /// AM0 plus call frames addressed relative to a base pointer
    Am1,
}

impl InstructionSet {
    pub const ALL: &'static [Self] = &[Self::Am0, Self::Am1];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Am0 => "AM0",
            Self::Am1 => "AM1",
        }
    }

    /// Checks whether `opcode` belongs to this catalog
    pub fn supports(&self, opcode: Opcode) -> bool {
        match self {
            Self::Am0 => !opcode.is_am1_only(),
            Self::Am1 => true,
        }
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::Am0
    }
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInstructionSet(pub String);

impl fmt::Display for UnknownInstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown instruction set `{}`", self.0)
    }
}

impl std::error::Error for UnknownInstructionSet {}

impl FromStr for InstructionSet {
    type Err = UnknownInstructionSet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|set| set.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| UnknownInstructionSet(s.to_owned()))
    }
}

macro_rules! opcodes {
    ( $( $( #[doc = $doc:expr] )+ $name:ident $( | $alias:literal )* = $repr:literal , )+ ) => {
        /// Defines the opcodes of both instruction sets.
        /// The numeric code groups them: codes below `0x20` take no operand,
        /// `0x10..0x20` and `0x30..` are only part of AM1.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(IntoPrimitive)]
        pub enum Opcode {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Opcode {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }

            /// Resolves a mnemonic (or one of its aliases). Mnemonics are case-sensitive.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $( stringify!($name) $( | $alias )* => Some(Self::$name) , )+
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Display for Opcode {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

opcodes! {
    /// Pop two values and push their sum
    ADD = 0x01,
    /// Pop two values and push their product
    MUL = 0x02,
    /// Pop two values and push their difference
    SUB = 0x03,
    /// Pop two values and push the floored quotient
    DIV = 0x04,
    /// Pop two values and push the floored remainder
    MOD = 0x05,
    /// Pop two values and push 1 if they are equal, 0 otherwise
    EQ = 0x06,
    /// Pop two values and push 1 if they differ, 0 otherwise
    NE = 0x07,
    /// Push 1 if the second value is less than the top value
    LT = 0x08,
    /// Push 1 if the second value is greater than the top value
    GT = 0x09,
    /// Push 1 if the second value is less than or equal to the top value
    LE = 0x0A,
    /// Push 1 if the second value is greater than or equal to the top value
    GE = 0x0B,
    /// Negate the top value
    NEG = 0x0C,
    /// Move the top value onto the runtime stack
    PUSH = 0x10,
    /// Return from a call without dropping parameters
    RETURN = 0x11,
    /// Push the value of a memory cell
    /// @param address The cell to read
    LOAD = 0x20,
    /// Pop a value into a memory cell
    /// @param address The cell to write
    STORE = 0x21,
    /// Push a literal
    /// @param value The value to push
    LIT = 0x22,
    /// Jump to an instruction
    /// @param target The counter to continue at
    JMP = 0x23,
    /// Pop a value and jump if it is zero
    /// @param target The counter to continue at
    JMC = 0x24,
    /// Emit the value of a memory cell
    /// @param address The cell to emit
    WRITE = 0x25,
    /// Read the next input into a memory cell
    /// @param address The cell to write
    READ = 0x26,
    /// Push the absolute address of a memory cell
    /// @param address The cell to resolve
    LOADA = 0x30,
    /// Push the value of the cell a local pointer refers to
    /// @param address The local cell holding the pointer
    LOADI = 0x31,
    /// Pop a value into the cell a local pointer refers to
    /// @param address The local cell holding the pointer
    STOREI = 0x32,
    /// Emit the value of the cell a local pointer refers to
    /// @param address The local cell holding the pointer
    WRITEI = 0x33,
    /// Read the next input into the cell a local pointer refers to
    /// @param address The local cell holding the pointer
    READI = 0x34,
    /// Save return counter and base on the runtime stack and jump
    /// @param target The counter of the procedure
    CALL = 0x35,
    /// Extend the runtime stack by zeroed cells
    /// @param cells The number of cells
    INIT | "ALLOC" = 0x36,
    /// Return from a call and drop its parameters
    /// @param parameters The number of parameter cells to drop
    RET = 0x37,
}

impl Opcode {
    pub fn code(&self) -> u8 {
        Into::<u8>::into(*self)
    }

    /// Number of operands the opcode requires
    pub fn arity(&self) -> usize {
        if self.code() < FIRST_UNARY_CODE {
            0
        } else {
            1
        }
    }

    pub fn is_am1_only(&self) -> bool {
        matches!(self.code(), 0x10..=0x1F | 0x30..=0xFF)
    }

    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Self::JMP | Self::JMC | Self::CALL | Self::RET | Self::RETURN
        )
    }

    /// Whether the operand may be qualified with a memory context in AM1
    pub fn has_context(&self) -> bool {
        matches!(
            self,
            Self::LOAD | Self::LOADA | Self::STORE | Self::READ | Self::WRITE
        )
    }
}

/// Memory context an address operand is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Absolute address
    Global,
    /// Offset from the current base pointer
    Local,
}

impl Default for Context {
    fn default() -> Self {
        Self::Local
    }
}

impl Context {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "lokal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "global" => Some(Self::Global),
            "lokal" | "local" => Some(Self::Local),
            _ => None,
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded instruction. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    context: Context,
    operand: Option<i64>,
}

impl Instruction {
    /// Builds an instruction without operand
    pub fn nullary(opcode: Opcode) -> Self {
        Self {
            opcode,
            context: Context::Local,
            operand: None,
        }
    }

    /// Builds an instruction with an operand in the default (local) context
    pub fn unary(opcode: Opcode, operand: i64) -> Self {
        Self::with_context(opcode, Context::Local, operand)
    }

    pub fn with_context(opcode: Opcode, context: Context, operand: i64) -> Self {
        Self {
            opcode,
            context,
            operand: Some(operand),
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn operand(&self) -> Option<i64> {
        self.operand
    }
}

impl fmt::Display for Instruction {
    /// Writes the canonical text form, which decodes back to the same instruction
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.context, self.operand) {
            (_, None) => write!(f, "{}", self.opcode),
            (Context::Global, Some(operand)) => {
                write!(f, "{}({}, {})", self.opcode, self.context, operand)
            }
            (Context::Local, Some(operand)) => write!(f, "{} {}", self.opcode, operand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_arity() -> Result<()> {
        let unary = [
            Opcode::LIT,
            Opcode::LOAD,
            Opcode::LOADA,
            Opcode::LOADI,
            Opcode::STORE,
            Opcode::STOREI,
            Opcode::JMP,
            Opcode::JMC,
            Opcode::READ,
            Opcode::READI,
            Opcode::WRITE,
            Opcode::WRITEI,
            Opcode::CALL,
            Opcode::RET,
            Opcode::INIT,
        ];
        for opcode in Opcode::ALL {
            let expected = if unary.contains(opcode) { 1 } else { 0 };
            assert_eq!(opcode.arity(), expected, "invalid arity for {}", opcode);
        }

        Ok(())
    }

    #[test]
    fn test_catalogs() -> Result<()> {
        let am0 = [
            "ADD", "MUL", "SUB", "DIV", "MOD", "EQ", "NE", "LT", "GT", "LE", "GE", "NEG", "LOAD",
            "STORE", "LIT", "JMP", "JMC", "WRITE", "READ",
        ];
        for opcode in Opcode::ALL {
            assert_eq!(
                InstructionSet::Am0.supports(*opcode),
                am0.contains(&opcode.name()),
                "invalid AM0 membership for {}",
                opcode
            );
            assert!(InstructionSet::Am1.supports(*opcode));
        }

        Ok(())
    }

    #[test]
    fn test_mnemonics() -> Result<()> {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(opcode.name()), Some(*opcode));
        }
        assert_eq!(Opcode::from_mnemonic("ALLOC"), Some(Opcode::INIT));
        assert_eq!(Opcode::from_mnemonic("add"), None);
        assert_eq!(Opcode::from_mnemonic("NOP"), None);

        Ok(())
    }

    #[test]
    fn test_is_jump() -> Result<()> {
        let jumps: Vec<_> = Opcode::ALL.iter().filter(|op| op.is_jump()).collect();
        assert_eq!(
            jumps,
            [
                &Opcode::RETURN,
                &Opcode::JMP,
                &Opcode::JMC,
                &Opcode::CALL,
                &Opcode::RET
            ]
        );

        Ok(())
    }

    #[test]
    fn test_instruction_set_from_str() -> Result<()> {
        assert_eq!("AM0".parse::<InstructionSet>()?, InstructionSet::Am0);
        assert_eq!("am1".parse::<InstructionSet>()?, InstructionSet::Am1);
        assert!("AM2".parse::<InstructionSet>().is_err());

        Ok(())
    }

    #[test]
    fn test_display() -> Result<()> {
        assert_eq!(Instruction::nullary(Opcode::ADD).to_string(), "ADD");
        assert_eq!(Instruction::unary(Opcode::JMP, 42).to_string(), "JMP 42");
        assert_eq!(
            Instruction::with_context(Opcode::LOAD, Context::Global, 1).to_string(),
            "LOAD(global, 1)"
        );
        assert_eq!(
            Instruction::with_context(Opcode::LOAD, Context::Local, -3).to_string(),
            "LOAD -3"
        );

        Ok(())
    }
}
