//! Instruction encoding: parsed lines to packed 16-bit words.
//!
//! Immediates that do not fit their field are truncated, never rejected;
//! each truncation-prone field carries a documented range and an
//! out-of-range value produces a [`RangeWarning`] alongside the word.
//! Memory displacements are the historical exception: they truncate with
//! no warning at all.

use std::fmt;

use sisa_core::encoding::{
    encode_n6, encode_n8, encode_r3, AluFunction, CompareFunction, SELECTOR_ADDI,
    SELECTOR_BRANCH, SELECTOR_JALR, SELECTOR_LD, SELECTOR_LDB, SELECTOR_MOV, SELECTOR_PORT_IO,
    SELECTOR_R3_ARITH, SELECTOR_R3_COMPARE, SELECTOR_ST, SELECTOR_STB,
};
use sisa_core::Register;

use crate::mnemonic::Mnemonic;
use crate::parser::{MemoryOperand, Operands, ParsedInstruction};

/// Non-fatal report of an immediate that was truncated to fit its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWarning {
    /// The value as written in the source.
    pub value: i32,
    /// Smallest accepted value.
    pub min: i32,
    /// Largest accepted value.
    pub max: i32,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value {} out of range [{}, {}], truncated",
            self.value, self.min, self.max
        )
    }
}

/// An encoded word plus any range warnings raised while packing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWord {
    /// The packed instruction word.
    pub word: u16,
    /// Warnings, in field order. At most one per immediate field.
    pub warnings: Vec<RangeWarning>,
}

/// Signed 8-bit immediate range shared by every N8-format mnemonic.
const IMM8_MIN: i32 = -128;
const IMM8_MAX: i32 = 127;

/// The historical ADDI range check is asymmetric: it admits the full
/// positive field range but only half of the negative one.
const ADDI_MIN: i32 = -32;
const ADDI_MAX: i32 = 63;

/// Encodes a parsed instruction into its word.
///
/// Infallible: the parser has already rejected everything fatal, and
/// out-of-range immediates degrade to warnings.
#[must_use]
pub fn encode_instruction(instruction: &ParsedInstruction) -> EncodedWord {
    let mut warnings = Vec::new();
    let word = match (instruction.mnemonic, instruction.operands) {
        (mnemonic, Operands::ThreeReg { rd, ra, rb }) => encode_three_reg(mnemonic, rd, ra, rb),
        (Mnemonic::Not, Operands::TwoReg { rd, ra }) => encode_r3(
            SELECTOR_R3_ARITH,
            ra as u8,
            0,
            rd as u8,
            AluFunction::Not.code(),
        ),
        (_, Operands::TwoReg { rd, ra }) => encode_n6(SELECTOR_JALR, ra as u8, rd as u8, 0),
        (mnemonic, Operands::RegImm { rd, imm }) => {
            check_range(imm, IMM8_MIN, IMM8_MAX, &mut warnings);
            let (selector, flag) = match mnemonic {
                Mnemonic::Bz => (SELECTOR_BRANCH, false),
                Mnemonic::Bnz => (SELECTOR_BRANCH, true),
                Mnemonic::Movi => (SELECTOR_MOV, false),
                Mnemonic::Movhi => (SELECTOR_MOV, true),
                Mnemonic::In => (SELECTOR_PORT_IO, false),
                // Mnemonic::Out; the parser admits no other RegImm form.
                _ => (SELECTOR_PORT_IO, true),
            };
            encode_n8(selector, rd as u8, flag, truncate(imm))
        }
        (mnemonic, Operands::RegMem { rd, mem }) => encode_memory(mnemonic, rd, mem),
        (_, Operands::RegRegImm { rd, ra, imm }) => {
            check_range(imm, ADDI_MIN, ADDI_MAX, &mut warnings);
            encode_n6(SELECTOR_ADDI, ra as u8, rd as u8, truncate(imm))
        }
    };
    EncodedWord { word, warnings }
}

fn encode_three_reg(mnemonic: Mnemonic, rd: Register, ra: Register, rb: Register) -> u16 {
    let (selector, func) = match mnemonic {
        Mnemonic::And => (SELECTOR_R3_ARITH, AluFunction::And.code()),
        Mnemonic::Or => (SELECTOR_R3_ARITH, AluFunction::Or.code()),
        Mnemonic::Xor => (SELECTOR_R3_ARITH, AluFunction::Xor.code()),
        Mnemonic::Add => (SELECTOR_R3_ARITH, AluFunction::Add.code()),
        Mnemonic::Sub => (SELECTOR_R3_ARITH, AluFunction::Sub.code()),
        Mnemonic::Sha => (SELECTOR_R3_ARITH, AluFunction::Sha.code()),
        Mnemonic::Shl => (SELECTOR_R3_ARITH, AluFunction::Shl.code()),
        Mnemonic::Cmplt => (SELECTOR_R3_COMPARE, CompareFunction::Lt.code()),
        Mnemonic::Cmple => (SELECTOR_R3_COMPARE, CompareFunction::Le.code()),
        Mnemonic::Cmpeq => (SELECTOR_R3_COMPARE, CompareFunction::Eq.code()),
        Mnemonic::Cmpltu => (SELECTOR_R3_COMPARE, CompareFunction::Ltu.code()),
        // Mnemonic::Cmpleu; the parser admits no other three-register form.
        _ => (SELECTOR_R3_COMPARE, CompareFunction::Leu.code()),
    };
    encode_r3(selector, ra as u8, rb as u8, rd as u8, func)
}

fn encode_memory(mnemonic: Mnemonic, rd: Register, mem: MemoryOperand) -> u16 {
    let selector = match mnemonic {
        Mnemonic::Ld => SELECTOR_LD,
        Mnemonic::St => SELECTOR_ST,
        Mnemonic::Ldb => SELECTOR_LDB,
        // Mnemonic::Stb; the parser admits no other memory form.
        _ => SELECTOR_STB,
    };
    encode_n6(selector, mem.base as u8, rd as u8, truncate(mem.displacement))
}

fn check_range(value: i32, min: i32, max: i32, warnings: &mut Vec<RangeWarning>) {
    if value < min || value > max {
        warnings.push(RangeWarning { value, min, max });
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn truncate(value: i32) -> i16 {
    value as i16
}
