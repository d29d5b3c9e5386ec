//! Architectural state: register file, program counter, data memory.

mod memory;
mod registers;

pub use memory::{Memory, ADDRESS_SPACE_BYTES};
pub use registers::{ArchitecturalState, Register, REGISTER_COUNT};
