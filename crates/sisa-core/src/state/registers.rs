use std::fmt;

/// Number of architecturally visible registers (`R0..R7`).
pub const REGISTER_COUNT: usize = 8;

/// Architectural register identifier, the value of a 3-bit register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    /// Ordered list of all architectural registers.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the register file index (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 3-bit register field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        if bits < 8 {
            Some(Self::ALL[bits as usize])
        } else {
            None
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// Architectural register state: the eight-entry register file and the
/// program counter.
///
/// Register cells are 16-bit two's complement; storage is unsigned and the
/// signed view is applied at operation sites. The PC is an instruction
/// index, not a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u16; REGISTER_COUNT],
    pc: u16,
}

impl ArchitecturalState {
    /// Creates a zeroed register file with `PC = 0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u16 {
        self.gpr[reg.index()]
    }

    /// Reads a register under its two's-complement interpretation.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn gpr_signed(&self, reg: Register) -> i16 {
        self.gpr[reg.index()] as i16
    }

    /// Writes a register.
    pub const fn set_gpr(&mut self, reg: Register, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }
}
