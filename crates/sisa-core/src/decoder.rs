//! Instruction decoder: raw 16-bit words to typed instructions.
//!
//! Decoding validates the selector and function-code space; reserved
//! encodings fault instead of executing arbitrary behavior. The inverse
//! [`Instruction::encode`] restores the exact word for every value the
//! decoder can produce.

use crate::encoding::{
    self, AluFunction, CompareFunction, FormatClass, SELECTOR_ADDI, SELECTOR_BRANCH,
    SELECTOR_JALR, SELECTOR_LD, SELECTOR_LDB, SELECTOR_MOV, SELECTOR_PORT_IO,
    SELECTOR_R3_ARITH, SELECTOR_R3_COMPARE, SELECTOR_ST, SELECTOR_STB,
};
use crate::fault::Fault;
use crate::state::Register;

/// A decoded instruction with sign-extended immediates.
///
/// `NOT` is split out of [`Instruction::Alu`] because its `breg` field is
/// architecturally unused and must decode as zero; the remaining ALU
/// operations all read two source registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Two-source ALU operation, `Rd := Ra <op> Rb`.
    Alu {
        /// Function code; never [`AluFunction::Not`] for decoded values.
        op: AluFunction,
        /// Destination register.
        rd: Register,
        /// First source register.
        ra: Register,
        /// Second source register.
        rb: Register,
    },
    /// Bitwise complement, `Rd := !Ra`.
    Not {
        /// Destination register.
        rd: Register,
        /// Source register.
        ra: Register,
    },
    /// Comparison, `Rd := (Ra <cmp> Rb) ? 1 : 0`.
    Compare {
        /// Comparison function code.
        op: CompareFunction,
        /// Destination register.
        rd: Register,
        /// First source register.
        ra: Register,
        /// Second source register.
        rb: Register,
    },
    /// Add-immediate, `Rd := Ra + offset`.
    Addi {
        /// Destination register.
        rd: Register,
        /// Source register.
        ra: Register,
        /// Sign-extended 6-bit immediate.
        offset: i16,
    },
    /// 16-bit load, `Rd := mem16[Ra + offset]`.
    Load {
        /// Destination register.
        rd: Register,
        /// Base address register.
        ra: Register,
        /// Sign-extended 6-bit displacement.
        offset: i16,
    },
    /// 16-bit store, `mem16[Ra + offset] := Rd`.
    Store {
        /// Source register.
        rd: Register,
        /// Base address register.
        ra: Register,
        /// Sign-extended 6-bit displacement.
        offset: i16,
    },
    /// 8-bit load, sign-extended into `Rd`.
    LoadByte {
        /// Destination register.
        rd: Register,
        /// Base address register.
        ra: Register,
        /// Sign-extended 6-bit displacement.
        offset: i16,
    },
    /// 8-bit store of `Rd`'s low byte.
    StoreByte {
        /// Source register.
        rd: Register,
        /// Base address register.
        ra: Register,
        /// Sign-extended 6-bit displacement.
        offset: i16,
    },
    /// Link-and-jump, `Rd := PC + 1; PC := Ra`.
    Jalr {
        /// Link destination register.
        rd: Register,
        /// Jump target register.
        ra: Register,
    },
    /// Conditional branch on `Rd`.
    Branch {
        /// `false` branches on zero (`BZ`), `true` on nonzero (`BNZ`).
        on_nonzero: bool,
        /// Condition register.
        rd: Register,
        /// Sign-extended 8-bit instruction-index offset.
        offset: i16,
    },
    /// Move-immediate into the low (`MOVI`) or high (`MOVHI`) half of `Rd`.
    MovImm {
        /// `false` replaces the full register sign-extended, `true`
        /// replaces only the high byte.
        high_byte: bool,
        /// Destination register.
        rd: Register,
        /// Sign-extended 8-bit immediate.
        value: i16,
    },
    /// Port access through the external port bus.
    PortIo {
        /// `false` reads the port into `Rd` (`IN`), `true` writes `Rd`
        /// to the port (`OUT`).
        output: bool,
        /// Data register.
        rd: Register,
        /// Raw 8-bit port address.
        port: u8,
    },
}

const fn reg(bits: u8) -> Register {
    Register::ALL[(bits & 0x07) as usize]
}

/// Decodes a 16-bit instruction word.
///
/// # Errors
///
/// Returns a [`Fault`] for reserved selectors (`11..=15`), reserved
/// comparison function codes (2, 6, 7), and `NOT` words whose unused
/// `breg` field is nonzero.
pub fn decode(word: u16) -> Result<Instruction, Fault> {
    let selector = encoding::selector(word);
    let Some(format) = FormatClass::from_selector(selector) else {
        return Err(Fault::ReservedSelector(selector));
    };

    match format {
        FormatClass::R3Arith => decode_r3_arith(word),
        FormatClass::R3Compare => decode_r3_compare(word),
        FormatClass::N6 => Ok(decode_n6(selector, word)),
        FormatClass::N8 => Ok(decode_n8(selector, word)),
    }
}

fn decode_r3_arith(word: u16) -> Result<Instruction, Fault> {
    let code = encoding::r3_func(word);
    let op = AluFunction::from_u3(code).ok_or(Fault::ReservedFunction(code))?;
    let rd = reg(encoding::r3_dreg(word));
    let ra = reg(encoding::r3_areg(word));
    let rb_bits = encoding::r3_breg(word);

    if op == AluFunction::Not {
        if rb_bits != 0 {
            return Err(Fault::UnusedFieldNotZero);
        }
        return Ok(Instruction::Not { rd, ra });
    }

    Ok(Instruction::Alu {
        op,
        rd,
        ra,
        rb: reg(rb_bits),
    })
}

fn decode_r3_compare(word: u16) -> Result<Instruction, Fault> {
    let code = encoding::r3_func(word);
    let op = CompareFunction::from_u3(code).ok_or(Fault::ReservedFunction(code))?;
    Ok(Instruction::Compare {
        op,
        rd: reg(encoding::r3_dreg(word)),
        ra: reg(encoding::r3_areg(word)),
        rb: reg(encoding::r3_breg(word)),
    })
}

fn decode_n6(selector: u8, word: u16) -> Instruction {
    let ra = reg(encoding::n6_areg(word));
    let rd = reg(encoding::n6_dbreg(word));
    let offset = encoding::n6_imm(word);

    match selector {
        SELECTOR_ADDI => Instruction::Addi { rd, ra, offset },
        SELECTOR_LD => Instruction::Load { rd, ra, offset },
        SELECTOR_ST => Instruction::Store { rd, ra, offset },
        SELECTOR_LDB => Instruction::LoadByte { rd, ra, offset },
        SELECTOR_STB => Instruction::StoreByte { rd, ra, offset },
        // SELECTOR_JALR; the immediate field is ignored.
        _ => Instruction::Jalr { rd, ra },
    }
}

fn decode_n8(selector: u8, word: u16) -> Instruction {
    let rd = reg(encoding::n8_reg(word));
    let flag = encoding::n8_flag(word);

    match selector {
        SELECTOR_BRANCH => Instruction::Branch {
            on_nonzero: flag,
            rd,
            offset: encoding::n8_imm(word),
        },
        SELECTOR_MOV => Instruction::MovImm {
            high_byte: flag,
            rd,
            value: encoding::n8_imm(word),
        },
        // SELECTOR_PORT_IO
        _ => Instruction::PortIo {
            output: flag,
            rd,
            port: encoding::n8_port(word),
        },
    }
}

impl Instruction {
    /// Re-encodes this instruction into its 16-bit word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
    pub const fn encode(self) -> u16 {
        match self {
            Self::Alu { op, rd, ra, rb } => encoding::encode_r3(
                SELECTOR_R3_ARITH,
                ra.index() as u8,
                rb.index() as u8,
                rd.index() as u8,
                op.code(),
            ),
            Self::Not { rd, ra } => encoding::encode_r3(
                SELECTOR_R3_ARITH,
                ra.index() as u8,
                0,
                rd.index() as u8,
                AluFunction::Not.code(),
            ),
            Self::Compare { op, rd, ra, rb } => encoding::encode_r3(
                SELECTOR_R3_COMPARE,
                ra.index() as u8,
                rb.index() as u8,
                rd.index() as u8,
                op.code(),
            ),
            Self::Addi { rd, ra, offset } => {
                encoding::encode_n6(SELECTOR_ADDI, ra.index() as u8, rd.index() as u8, offset)
            }
            Self::Load { rd, ra, offset } => {
                encoding::encode_n6(SELECTOR_LD, ra.index() as u8, rd.index() as u8, offset)
            }
            Self::Store { rd, ra, offset } => {
                encoding::encode_n6(SELECTOR_ST, ra.index() as u8, rd.index() as u8, offset)
            }
            Self::LoadByte { rd, ra, offset } => {
                encoding::encode_n6(SELECTOR_LDB, ra.index() as u8, rd.index() as u8, offset)
            }
            Self::StoreByte { rd, ra, offset } => {
                encoding::encode_n6(SELECTOR_STB, ra.index() as u8, rd.index() as u8, offset)
            }
            Self::Jalr { rd, ra } => {
                encoding::encode_n6(SELECTOR_JALR, ra.index() as u8, rd.index() as u8, 0)
            }
            Self::Branch {
                on_nonzero,
                rd,
                offset,
            } => encoding::encode_n8(SELECTOR_BRANCH, rd.index() as u8, on_nonzero, offset),
            Self::MovImm {
                high_byte,
                rd,
                value,
            } => encoding::encode_n8(SELECTOR_MOV, rd.index() as u8, high_byte, value),
            Self::PortIo { output, rd, port } => {
                encoding::encode_n8(SELECTOR_PORT_IO, rd.index() as u8, output, port as i16)
            }
        }
    }
}
