//! SISA one-pass assembler library.

#[cfg(test)]
use tempfile as _;

/// Top-level one-pass assembly pipeline and diagnostics.
pub mod assembler;
/// Instruction encoding and immediate range policy.
pub mod encoder;
/// Bit-pattern listing renderer.
pub mod listing;
/// Mnemonic resolution against the static name table.
pub mod mnemonic;
/// Source line parser for instructions and operands.
pub mod parser;
