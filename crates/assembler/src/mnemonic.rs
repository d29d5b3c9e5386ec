//! Mnemonic resolution against a static name table.
//!
//! The mnemonic is resolved exactly once, from the leading token of a line,
//! into a sum type. Everything downstream (operand form, selector, function
//! code) is a lookup on the variant; no string comparison survives past this
//! module.

/// The instruction set surface, one variant per mnemonic.
///
/// Matching is case-sensitive and exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Mnemonic {
    In,
    Out,
    Movi,
    Movhi,
    Bz,
    Bnz,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Not,
    Sha,
    Shl,
    Cmplt,
    Cmple,
    Cmpeq,
    Cmpltu,
    Cmpleu,
    Ld,
    Ldb,
    St,
    Stb,
    Jalr,
    Addi,
}

/// Operand shapes accepted by the parser, one per surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandForm {
    /// `OP Rd, Ra, Rb` (three-register ALU and compare forms).
    ThreeReg,
    /// `OP Rd, Ra` (`NOT`, `JALR`).
    TwoReg,
    /// `OP Rd, imm` (`MOVI`, `MOVHI`, `BZ`, `BNZ`, `IN`).
    RegImm,
    /// `OP imm, Rd` (`OUT`).
    ImmReg,
    /// `OP Rd, N(Ra)` (`LD`, `LDB`).
    RegMem,
    /// `OP N(Ra), Rd` (`ST`, `STB`).
    MemReg,
    /// `OP Rd, Ra, imm` (`ADDI`).
    RegRegImm,
}

const MNEMONIC_TABLE: &[(&str, Mnemonic)] = &[
    ("IN", Mnemonic::In),
    ("OUT", Mnemonic::Out),
    ("MOVI", Mnemonic::Movi),
    ("MOVHI", Mnemonic::Movhi),
    ("BZ", Mnemonic::Bz),
    ("BNZ", Mnemonic::Bnz),
    ("ADD", Mnemonic::Add),
    ("SUB", Mnemonic::Sub),
    ("AND", Mnemonic::And),
    ("OR", Mnemonic::Or),
    ("XOR", Mnemonic::Xor),
    ("NOT", Mnemonic::Not),
    ("SHA", Mnemonic::Sha),
    ("SHL", Mnemonic::Shl),
    ("CMPLT", Mnemonic::Cmplt),
    ("CMPLE", Mnemonic::Cmple),
    ("CMPEQ", Mnemonic::Cmpeq),
    ("CMPLTU", Mnemonic::Cmpltu),
    ("CMPLEU", Mnemonic::Cmpleu),
    ("LD", Mnemonic::Ld),
    ("LDB", Mnemonic::Ldb),
    ("ST", Mnemonic::St),
    ("STB", Mnemonic::Stb),
    ("JALR", Mnemonic::Jalr),
    ("ADDI", Mnemonic::Addi),
];

impl Mnemonic {
    /// Resolves a source token into a mnemonic.
    #[must_use]
    pub fn resolve(token: &str) -> Option<Self> {
        MNEMONIC_TABLE
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, mnemonic)| *mnemonic)
    }

    /// Returns the operand shape this mnemonic's line must carry.
    #[must_use]
    pub const fn form(self) -> OperandForm {
        match self {
            Self::Add
            | Self::Sub
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Sha
            | Self::Shl
            | Self::Cmplt
            | Self::Cmple
            | Self::Cmpeq
            | Self::Cmpltu
            | Self::Cmpleu => OperandForm::ThreeReg,
            Self::Not | Self::Jalr => OperandForm::TwoReg,
            Self::Movi | Self::Movhi | Self::Bz | Self::Bnz | Self::In => OperandForm::RegImm,
            Self::Out => OperandForm::ImmReg,
            Self::Ld | Self::Ldb => OperandForm::RegMem,
            Self::St | Self::Stb => OperandForm::MemReg,
            Self::Addi => OperandForm::RegRegImm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mnemonic, OperandForm, MNEMONIC_TABLE};

    #[test]
    fn every_table_entry_resolves_to_itself() {
        assert_eq!(MNEMONIC_TABLE.len(), 25);
        for (name, mnemonic) in MNEMONIC_TABLE {
            assert_eq!(Mnemonic::resolve(name), Some(*mnemonic));
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(Mnemonic::resolve("ADD"), Some(Mnemonic::Add));
        assert_eq!(Mnemonic::resolve("add"), None);
        assert_eq!(Mnemonic::resolve("Add"), None);
        assert_eq!(Mnemonic::resolve("HALT"), None);
    }

    #[test]
    fn store_forms_take_the_memory_operand_first() {
        assert_eq!(Mnemonic::St.form(), OperandForm::MemReg);
        assert_eq!(Mnemonic::Stb.form(), OperandForm::MemReg);
        assert_eq!(Mnemonic::Ld.form(), OperandForm::RegMem);
        assert_eq!(Mnemonic::Out.form(), OperandForm::ImmReg);
        assert_eq!(Mnemonic::In.form(), OperandForm::RegImm);
    }
}
