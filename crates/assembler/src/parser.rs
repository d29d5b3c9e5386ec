//! Source line parser: raw text to a parsed instruction.
//!
//! One instruction per line, mnemonic first, operands split on spaces and
//! commas. The parser owns the operand grammar (registers, immediates,
//! `N(Rk)` memory operands); range policy lives in the encoder, so any
//! integer that lexes is accepted here.

use std::fmt;

use sisa_core::Register;

use crate::mnemonic::{Mnemonic, OperandForm};

/// A `N(Rk)` memory operand: signed displacement around a base register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOperand {
    /// Displacement, as written; truncated to 6 bits at encode time.
    pub displacement: i32,
    /// Base address register.
    pub base: Register,
}

/// Operands of one parsed line, shaped by the mnemonic's [`OperandForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// `Rd, Ra, Rb`.
    ThreeReg {
        /// Destination register.
        rd: Register,
        /// First source register.
        ra: Register,
        /// Second source register.
        rb: Register,
    },
    /// `Rd, Ra`.
    TwoReg {
        /// Destination register.
        rd: Register,
        /// Source register.
        ra: Register,
    },
    /// `Rd, imm` and `imm, Rd` (the order is surface syntax only).
    RegImm {
        /// Data register.
        rd: Register,
        /// Immediate, as written.
        imm: i32,
    },
    /// `Rd, N(Ra)` and `N(Ra), Rd`.
    RegMem {
        /// Data register.
        rd: Register,
        /// Memory operand.
        mem: MemoryOperand,
    },
    /// `Rd, Ra, imm`.
    RegRegImm {
        /// Destination register.
        rd: Register,
        /// Source register.
        ra: Register,
        /// Immediate, as written.
        imm: i32,
    },
}

/// A fully parsed instruction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// Resolved mnemonic.
    pub mnemonic: Mnemonic,
    /// Operands in canonical (not surface) order.
    pub operands: Operands,
}

/// Fatal per-line parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Leading token is not in the mnemonic table.
    UnknownMnemonic(String),
    /// Register operand is not exactly `R0`..`R7`.
    InvalidRegister(String),
    /// Immediate operand is not a base-10 integer.
    InvalidImmediate(String),
    /// Fewer operands than the mnemonic's form requires.
    MissingOperand,
    /// Memory operand without an opening parenthesis.
    MissingParen(String),
    /// Memory operand without a base register after the parenthesis.
    MissingBaseRegister(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic(token) => write!(f, "unknown mnemonic: {token}"),
            Self::InvalidRegister(token) => write!(f, "invalid register: {token}"),
            Self::InvalidImmediate(token) => write!(f, "invalid immediate value: {token}"),
            Self::MissingOperand => write!(f, "missing operand"),
            Self::MissingParen(token) => {
                write!(f, "memory operand without '(': {token}")
            }
            Self::MissingBaseRegister(token) => {
                write!(f, "memory operand without a base register: {token}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one source line.
///
/// `Ok(None)` means the line carries no instruction (blank or
/// whitespace-only). Tokens past the mnemonic's operand count are ignored.
///
/// # Errors
///
/// Returns the first [`ParseError`] on the line; nothing after it is
/// examined.
pub fn parse_line(line: &str) -> Result<Option<ParsedInstruction>, ParseError> {
    let mut tokens = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty());

    let Some(first) = tokens.next() else {
        return Ok(None);
    };
    let mnemonic = Mnemonic::resolve(first)
        .ok_or_else(|| ParseError::UnknownMnemonic(first.to_string()))?;

    let operands = match mnemonic.form() {
        OperandForm::ThreeReg => Operands::ThreeReg {
            rd: parse_register(next(&mut tokens)?)?,
            ra: parse_register(next(&mut tokens)?)?,
            rb: parse_register(next(&mut tokens)?)?,
        },
        OperandForm::TwoReg => Operands::TwoReg {
            rd: parse_register(next(&mut tokens)?)?,
            ra: parse_register(next(&mut tokens)?)?,
        },
        OperandForm::RegImm => Operands::RegImm {
            rd: parse_register(next(&mut tokens)?)?,
            imm: parse_immediate(next(&mut tokens)?)?,
        },
        OperandForm::ImmReg => {
            let imm = parse_immediate(next(&mut tokens)?)?;
            let rd = parse_register(next(&mut tokens)?)?;
            Operands::RegImm { rd, imm }
        }
        OperandForm::RegMem => Operands::RegMem {
            rd: parse_register(next(&mut tokens)?)?,
            mem: parse_memory(next(&mut tokens)?)?,
        },
        OperandForm::MemReg => {
            let mem = parse_memory(next(&mut tokens)?)?;
            let rd = parse_register(next(&mut tokens)?)?;
            Operands::RegMem { rd, mem }
        }
        OperandForm::RegRegImm => Operands::RegRegImm {
            rd: parse_register(next(&mut tokens)?)?,
            ra: parse_register(next(&mut tokens)?)?,
            imm: parse_immediate(next(&mut tokens)?)?,
        },
    };

    Ok(Some(ParsedInstruction { mnemonic, operands }))
}

fn next<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<&'a str, ParseError> {
    tokens.next().ok_or(ParseError::MissingOperand)
}

fn parse_register(token: &str) -> Result<Register, ParseError> {
    let invalid = || ParseError::InvalidRegister(token.to_string());

    let mut chars = token.chars();
    if chars.next() != Some('R') {
        return Err(invalid());
    }
    let digit = chars.next().and_then(|c| c.to_digit(8)).ok_or_else(invalid)?;
    if chars.next().is_some() {
        return Err(invalid());
    }

    #[allow(clippy::cast_possible_truncation)]
    Register::from_u3(digit as u8).ok_or_else(invalid)
}

fn parse_immediate(token: &str) -> Result<i32, ParseError> {
    token
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidImmediate(token.to_string()))
}

/// Parses a `N(Rk)` memory operand.
///
/// Anything after the base register digit is ignored, including a missing
/// closing parenthesis.
fn parse_memory(token: &str) -> Result<MemoryOperand, ParseError> {
    let paren = token
        .find('(')
        .ok_or_else(|| ParseError::MissingParen(token.to_string()))?;
    let displacement = parse_immediate(&token[..paren])?;

    let mut rest = token[paren + 1..].chars();
    if rest.next() != Some('R') {
        return Err(ParseError::MissingBaseRegister(token.to_string()));
    }
    let digit = rest
        .next()
        .and_then(|c| c.to_digit(8))
        .ok_or_else(|| ParseError::InvalidRegister(token.to_string()))?;

    #[allow(clippy::cast_possible_truncation)]
    let base = Register::from_u3(digit as u8)
        .ok_or_else(|| ParseError::InvalidRegister(token.to_string()))?;

    Ok(MemoryOperand { displacement, base })
}
