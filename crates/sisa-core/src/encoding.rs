//! Bit-level codec for the three SISA instruction word layouts.
//!
//! The 4 most-significant bits of every word (the selector) choose its
//! format. The packers and extractors here are the single source of truth
//! for field placement; the assembler and the instruction decoder are both
//! clients and never shift bits themselves.

/// Selector for the non-comparison ALU format (`R3-arith`).
pub const SELECTOR_R3_ARITH: u8 = 0;
/// Selector for the comparison format (`R3-compare`).
pub const SELECTOR_R3_COMPARE: u8 = 1;
/// Selector for `ADDI` (N6 family).
pub const SELECTOR_ADDI: u8 = 2;
/// Selector for `LD` (N6 family).
pub const SELECTOR_LD: u8 = 3;
/// Selector for `ST` (N6 family).
pub const SELECTOR_ST: u8 = 4;
/// Selector for `LDB` (N6 family).
pub const SELECTOR_LDB: u8 = 5;
/// Selector for `STB` (N6 family).
pub const SELECTOR_STB: u8 = 6;
/// Selector for `JALR` (N6 family).
pub const SELECTOR_JALR: u8 = 7;
/// Selector for `BZ`/`BNZ` (N8 family, flag picks the condition).
pub const SELECTOR_BRANCH: u8 = 8;
/// Selector for `MOVI`/`MOVHI` (N8 family, flag picks the half).
pub const SELECTOR_MOV: u8 = 9;
/// Selector for `IN`/`OUT` (N8 family, flag picks the direction).
pub const SELECTOR_PORT_IO: u8 = 10;

/// Instruction word formats, selected by bits `[15:12]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatClass {
    /// `areg[3] | breg[3] | dreg[3] | func[3]`, non-comparison ALU.
    R3Arith,
    /// `areg[3] | breg[3] | dreg[3] | func[3]`, comparisons.
    R3Compare,
    /// `areg[3] | dbreg[3] | imm6[6]`, two's-complement immediate.
    N6,
    /// `reg[3] | flag[1] | imm8[8]`, two's-complement immediate.
    N8,
}

impl FormatClass {
    /// Looks up the format assigned to a 4-bit selector.
    ///
    /// `None` means the selector is in the reserved range (`11..=15`).
    #[must_use]
    pub const fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            SELECTOR_R3_ARITH => Some(Self::R3Arith),
            SELECTOR_R3_COMPARE => Some(Self::R3Compare),
            2..=7 => Some(Self::N6),
            8..=10 => Some(Self::N8),
            _ => None,
        }
    }
}

/// Function codes of the `R3-arith` format (selector 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum AluFunction {
    And = 0,
    Or = 1,
    Xor = 2,
    Not = 3,
    Add = 4,
    Sub = 5,
    Sha = 6,
    Shl = 7,
}

impl AluFunction {
    /// Decodes a 3-bit function code. All eight codes are assigned.
    #[must_use]
    pub const fn from_u3(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::And),
            1 => Some(Self::Or),
            2 => Some(Self::Xor),
            3 => Some(Self::Not),
            4 => Some(Self::Add),
            5 => Some(Self::Sub),
            6 => Some(Self::Sha),
            7 => Some(Self::Shl),
            _ => None,
        }
    }

    /// Returns the 3-bit function code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Function codes of the `R3-compare` format (selector 1).
///
/// Codes 2, 6 and 7 are unassigned and must be rejected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CompareFunction {
    Lt = 0,
    Le = 1,
    Eq = 3,
    Ltu = 4,
    Leu = 5,
}

impl CompareFunction {
    /// Decodes a 3-bit comparison function code.
    ///
    /// `None` means the code is reserved.
    #[must_use]
    pub const fn from_u3(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Lt),
            1 => Some(Self::Le),
            3 => Some(Self::Eq),
            4 => Some(Self::Ltu),
            5 => Some(Self::Leu),
            _ => None,
        }
    }

    /// Returns the 3-bit function code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Extracts the 4-bit selector from an instruction word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn selector(word: u16) -> u8 {
    (word >> 12) as u8
}

/// Sign-extends the low `bits` bits of `value` to a full-width signed value.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub const fn sign_extend(value: u16, bits: u32) -> i16 {
    let shift = 16 - bits;
    ((value << shift) as i16) >> shift
}

/// Packs an `R3` word: `selector | areg | breg | dreg | func`.
///
/// Every field is masked to its declared width; overflow bits are silently
/// discarded.
#[must_use]
#[allow(clippy::cast_lossless)]
pub const fn encode_r3(selector: u8, areg: u8, breg: u8, dreg: u8, func: u8) -> u16 {
    ((selector as u16 & 0x0F) << 12)
        | ((areg as u16 & 0x07) << 9)
        | ((breg as u16 & 0x07) << 6)
        | ((dreg as u16 & 0x07) << 3)
        | (func as u16 & 0x07)
}

/// Packs an `N6` word: `selector | areg | dbreg | imm6`.
///
/// The immediate is truncated to 6 bits, two's complement.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_lossless)]
pub const fn encode_n6(selector: u8, areg: u8, dbreg: u8, imm: i16) -> u16 {
    ((selector as u16 & 0x0F) << 12)
        | ((areg as u16 & 0x07) << 9)
        | ((dbreg as u16 & 0x07) << 6)
        | (imm as u16 & 0x3F)
}

/// Packs an `N8` word: `selector | reg | flag | imm8`.
///
/// The immediate is truncated to 8 bits, two's complement.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_lossless)]
pub const fn encode_n8(selector: u8, reg: u8, flag: bool, imm: i16) -> u16 {
    ((selector as u16 & 0x0F) << 12)
        | ((reg as u16 & 0x07) << 9)
        | ((flag as u16) << 8)
        | (imm as u16 & 0xFF)
}

/// Extracts the `areg` field of an `R3` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn r3_areg(word: u16) -> u8 {
    ((word >> 9) & 0x07) as u8
}

/// Extracts the `breg` field of an `R3` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn r3_breg(word: u16) -> u8 {
    ((word >> 6) & 0x07) as u8
}

/// Extracts the `dreg` field of an `R3` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn r3_dreg(word: u16) -> u8 {
    ((word >> 3) & 0x07) as u8
}

/// Extracts the `func` field of an `R3` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn r3_func(word: u16) -> u8 {
    (word & 0x07) as u8
}

/// Extracts the `areg` field of an `N6` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn n6_areg(word: u16) -> u8 {
    ((word >> 9) & 0x07) as u8
}

/// Extracts the `dbreg` field of an `N6` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn n6_dbreg(word: u16) -> u8 {
    ((word >> 6) & 0x07) as u8
}

/// Extracts the sign-extended 6-bit immediate of an `N6` word.
#[must_use]
pub const fn n6_imm(word: u16) -> i16 {
    sign_extend(word & 0x3F, 6)
}

/// Extracts the `reg` field of an `N8` word.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn n8_reg(word: u16) -> u8 {
    ((word >> 9) & 0x07) as u8
}

/// Extracts the `flag` bit of an `N8` word.
#[must_use]
pub const fn n8_flag(word: u16) -> bool {
    (word >> 8) & 0x01 != 0
}

/// Extracts the sign-extended 8-bit immediate of an `N8` word.
#[must_use]
pub const fn n8_imm(word: u16) -> i16 {
    sign_extend(word & 0xFF, 8)
}

/// Extracts the raw (unsigned) low byte of an `N8` word, used as the port
/// address by `IN`/`OUT`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn n8_port(word: u16) -> u8 {
    (word & 0xFF) as u8
}

/// Splits a word into its persisted byte order, low byte first.
#[must_use]
pub const fn word_to_bytes(word: u16) -> [u8; 2] {
    word.to_le_bytes()
}

/// Reassembles a word from its persisted byte order, low byte first.
#[must_use]
pub const fn bytes_to_word(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}
