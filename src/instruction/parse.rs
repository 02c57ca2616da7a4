//! Decodes single statements of program text:
//!
//! ```text
//! ADD
//! LIT -7
//! LOAD(global, 1)
//! STOREI(-2)
//! ```

use std::borrow::Cow;
use std::convert::TryFrom;
use std::error;
use std::fmt;

use super::{Context, Instruction, InstructionSet, Opcode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnknownMnemonic,
    UnsupportedOpcode { instruction_set: InstructionSet },
    MissingOperand,
    UnexpectedOperand,
    InvalidNumber { radix: u32 },
    InvalidContext,
    MissingTerminator,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnknownMnemonic => f.write_str("unknown mnemonic"),
            ParseErrorKind::UnsupportedOpcode { instruction_set } => {
                write!(f, "opcode is not part of `{}`", instruction_set)
            }
            ParseErrorKind::MissingOperand => f.write_str("missing operand"),
            ParseErrorKind::UnexpectedOperand => f.write_str("unexpected operand"),
            ParseErrorKind::InvalidNumber { radix } => {
                write!(f, "failed to parse number with radix `{}`", radix)
            }
            ParseErrorKind::InvalidContext => f.write_str("invalid memory context"),
            ParseErrorKind::MissingTerminator => f.write_str("missing `;`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    pub(crate) fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// 1-based line the error was found on
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Parses a signed integer with an optional `0b`, `0o` or `0x` prefix.
/// Returns the radix that was tried on failure.
fn parse_number(text: &str) -> std::result::Result<i64, u32> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes() {
        [b'-', ..] => (true, &text[1..]),
        [b'+', ..] => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, offset) = match digits.as_bytes() {
        [b'0', b'b', ..] => (2, 2),
        [b'0', b'o', ..] => (8, 2),
        [b'0', b'x', ..] => (16, 2),
        _ => (10, 0),
    };
    let digits = &digits[offset..];

    // from_str_radix would accept a second sign
    if digits.is_empty() || digits.starts_with(|c: char| c == '-' || c == '+') {
        return Err(radix);
    }

    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| radix)?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| radix)
}

/// Decodes one statement (without its `;`) for `instruction_set`.
/// `line_nr` is only used for error reporting.
pub(crate) fn decode(
    statement: &str,
    instruction_set: InstructionSet,
    line_nr: usize,
) -> Result<Instruction> {
    let statement = statement.trim();
    let statement = statement.strip_suffix(';').unwrap_or(statement).trim_end();

    let split = statement
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or_else(|| statement.len());
    let (mnemonic, arguments) = statement.split_at(split);
    let arguments = arguments.trim();

    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::UnknownMnemonic,
            format!("`{}`", mnemonic),
            line_nr,
        )
    })?;

    if !instruction_set.supports(opcode) {
        return Err(ParseError::new(
            ParseErrorKind::UnsupportedOpcode { instruction_set },
            format!("`{}`", mnemonic),
            line_nr,
        ));
    }

    let (context, operand) = split_arguments(arguments, line_nr)?;

    if let Some(context) = context {
        if instruction_set != InstructionSet::Am1 || !opcode.has_context() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidContext,
                format!("`{}` takes no memory context", opcode),
                line_nr,
            ));
        }
        if Context::from_name(context).is_none() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidContext,
                format!("`{}` is neither `global` nor `lokal`", context),
                line_nr,
            ));
        }
    }

    let instruction = match (opcode.arity(), operand) {
        (0, None) => Instruction::nullary(opcode),
        (0, Some(operand)) => {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedOperand,
                format!("`{}` takes no operand but was given `{}`", opcode, operand),
                line_nr,
            ))
        }
        (_, None) => {
            return Err(ParseError::new(
                ParseErrorKind::MissingOperand,
                format!("`{}` requires an operand", opcode),
                line_nr,
            ))
        }
        (_, Some(operand)) => {
            let value = parse_number(operand).map_err(|radix| {
                ParseError::new(
                    ParseErrorKind::InvalidNumber { radix },
                    format!("`{}`", operand),
                    line_nr,
                )
            })?;
            let context = context
                .and_then(Context::from_name)
                .unwrap_or_default();
            Instruction::with_context(opcode, context, value)
        }
    };

    log::debug!("[{}] Found instruction {}", line_nr, instruction);

    Ok(instruction)
}

/// Splits `n`, `(n)` and `(context, n)` into the optional context and operand text
fn split_arguments(arguments: &str, line_nr: usize) -> Result<(Option<&str>, Option<&str>)> {
    if arguments.is_empty() {
        return Ok((None, None));
    }

    if let Some(inner) = arguments.strip_prefix('(') {
        let inner = inner.strip_suffix(')').ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnexpectedOperand,
                format!("unclosed argument list `{}`", arguments),
                line_nr,
            )
        })?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        return match parts.as_slice() {
            [""] => Ok((None, None)),
            [operand] => Ok((None, Some(*operand))),
            [context, operand] => Ok((Some(*context), Some(*operand))),
            _ => Err(ParseError::new(
                ParseErrorKind::UnexpectedOperand,
                format!("too many arguments `{}`", arguments),
                line_nr,
            )),
        };
    }

    if arguments.split_whitespace().count() > 1 {
        return Err(ParseError::new(
            ParseErrorKind::UnexpectedOperand,
            format!("extra operand in `{}`", arguments),
            line_nr,
        ));
    }

    Ok((None, Some(arguments)))
}

impl Instruction {
    /// Decodes a single statement such as `LOAD(global, 1)` or `ADD;`
    pub fn decode(statement: &str, instruction_set: InstructionSet) -> Result<Self> {
        decode(statement, instruction_set, 1)
    }
}
