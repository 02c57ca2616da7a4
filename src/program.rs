//! Program text is a sequence of `;` terminated statements:
//!
//! ```text
//! # max(a, b)
//! READ 0; READ 1;
//! LOAD 0;
//! LOAD 1;
//! GT;
//! JMC 10;
//! ...
//! ```

use std::fmt;
use std::ops::Deref;

use crate::instruction::parse::{self, ParseError, ParseErrorKind};
use crate::instruction::{Instruction, InstructionSet};

/// Ordered instructions of one instruction set. Addresses start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Program {
    instruction_set: InstructionSet,
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instruction_set: InstructionSet, instructions: Vec<Instruction>) -> Self {
        Self {
            instruction_set,
            instructions,
        }
    }

    /// Parses `text` statement by statement.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed statement. A non-blank rest of a line
    /// without a terminating `;` is an error as well.
    pub fn parse(text: &str, instruction_set: InstructionSet) -> parse::Result<Self> {
        let mut instructions = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_nr = index + 1;
            let line = match line.find('#') {
                Some(comment) => &line[..comment],
                None => line,
            };

            let mut statements = line.split(';');
            // the part after the last `;` is never a complete statement
            let rest = statements.next_back().unwrap_or_default().trim();

            for statement in statements.map(str::trim).filter(|s| !s.is_empty()) {
                match parse::decode(statement, instruction_set, line_nr) {
                    Ok(instruction) => instructions.push(instruction),
                    Err(err) => {
                        log::error!("{}", err);
                        return Err(err);
                    }
                }
            }

            if !rest.is_empty() {
                let err = ParseError::new(
                    ParseErrorKind::MissingTerminator,
                    format!("`{}`", rest),
                    line_nr,
                );
                log::error!("{}", err);
                return Err(err);
            }
        }

        log::debug!(
            "Loaded {} {} instructions",
            instructions.len(),
            instruction_set
        );

        Ok(Self::new(instruction_set, instructions))
    }

    pub fn instruction_set(&self) -> InstructionSet {
        self.instruction_set
    }

    /// Fetches the instruction at 1-based `counter`
    pub fn fetch(&self, counter: usize) -> Option<&Instruction> {
        counter
            .checked_sub(1)
            .and_then(|index| self.instructions.get(index))
    }
}

impl Deref for Program {
    type Target = [Instruction];

    fn deref(&self) -> &Self::Target {
        &self.instructions
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{};", instruction)?;
        }
        Ok(())
    }
}

/// Builds a [`Program`](crate::program::Program) from opcodes
///
/// ```
/// use amn::program;
///
/// let program = program!(Am0 => LIT(3), LIT(4), ADD, STORE(0), WRITE(0));
/// assert_eq!(program.len(), 5);
/// ```
#[macro_export]
macro_rules! program {
    ( $set:ident => $( $opcode:ident $( ( $( $arg:tt )+ ) )? ),* $(,)? ) => {
        $crate::program::Program::new(
            $crate::instruction::InstructionSet::$set,
            vec![
                $(
                    $crate::program!(@instruction $opcode $( ( $( $arg )+ ) )?),
                )*
            ],
        )
    };
    ( @instruction $opcode:ident ) => {
        $crate::instruction::Instruction::nullary($crate::instruction::Opcode::$opcode)
    };
    ( @instruction $opcode:ident ( $context:ident , $operand:expr ) ) => {
        $crate::instruction::Instruction::with_context(
            $crate::instruction::Opcode::$opcode,
            $crate::instruction::Context::$context,
            $operand,
        )
    };
    ( @instruction $opcode:ident ( $operand:expr ) ) => {
        $crate::instruction::Instruction::unary($crate::instruction::Opcode::$opcode, $operand)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{Context, Opcode};
    use color_eyre::eyre::Result;

    // do not remove trailing whitespace!
    const SUM_OF_SQUARES: &str = "
READ 2;
LIT 1;
STORE 1;
LIT 0;

STORE 3;
LOAD 1;
LOAD 2;
LE;
JMC 21;
LOAD 3;
LOAD 1;
LOAD 1;
MUL;
ADD;

STORE 3;
LOAD 1;
LIT 1;
ADD;
STORE 1;
JMP 6;
WRITE 3;
";

    #[test]
    fn parse_program() -> Result<()> {
        let program = Program::parse(SUM_OF_SQUARES, InstructionSet::Am0)?;

        assert_eq!(program.len(), 21);
        assert_eq!(program[0], Instruction::unary(Opcode::READ, 2));
        assert_eq!(program[7], Instruction::nullary(Opcode::LE));
        assert_eq!(program[8], Instruction::unary(Opcode::JMC, 21));
        assert_eq!(program[20], Instruction::unary(Opcode::WRITE, 3));

        Ok(())
    }

    #[test]
    fn parse_empty() -> Result<()> {
        assert!(Program::parse("", InstructionSet::Am0)?.is_empty());
        assert!(Program::parse("\n  \n# nothing\n", InstructionSet::Am1)?.is_empty());

        Ok(())
    }

    #[test]
    fn parse_several_statements_per_line() -> Result<()> {
        let program = Program::parse("LIT 1; LIT 2; ADD; # sum", InstructionSet::Am0)?;
        assert_eq!(
            program,
            program!(Am0 => LIT(1), LIT(2), ADD)
        );

        Ok(())
    }

    #[test]
    fn parse_errors_report_line() -> Result<()> {
        let err = Program::parse("LOAD 1;\nADD\nJMP 3;", InstructionSet::Am0).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::MissingTerminator);
        assert_eq!(err.line_nr(), 2);

        let err = Program::parse("LOAD 1; XXX; ADD;", InstructionSet::Am0).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::UnknownMnemonic);
        assert_eq!(err.line_nr(), 1);

        let err = Program::parse("LIT 1;\n\nLIT x;", InstructionSet::Am0).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::InvalidNumber { radix: 10 });
        assert_eq!(err.line_nr(), 3);

        Ok(())
    }

    #[test]
    fn fetch_is_one_based() -> Result<()> {
        let program = program!(Am0 => LIT(7), NEG);
        assert_eq!(program.fetch(0), None);
        assert_eq!(program.fetch(1), Some(&Instruction::unary(Opcode::LIT, 7)));
        assert_eq!(program.fetch(2), Some(&Instruction::nullary(Opcode::NEG)));
        assert_eq!(program.fetch(3), None);

        Ok(())
    }

    #[test]
    fn display_parses_back() -> Result<()> {
        let program = program!(Am1 =>
            INIT(1),
            READ(Global, 1),
            LOADA(Global, 1),
            LOAD(-2),
            RETURN
        );
        let text = program.to_string();
        assert_eq!(
            text,
            "INIT 1;\nREAD(global, 1);\nLOADA(global, 1);\nLOAD -2;\nRETURN;\n"
        );
        assert_eq!(Program::parse(&text, InstructionSet::Am1)?, program);
        assert_eq!(program[1].context(), Context::Global);

        Ok(())
    }
}
