//! Core library for the SISA 16-bit architecture.
//!
//! Everything below the surface syntax lives here: the bit-level codec for
//! the three instruction word layouts, the typed instruction decoder, the
//! architectural state model (registers, PC, byte-addressable memory) and
//! the virtual machine step engine. The assembler crate sits on top and
//! only ever goes through [`encoding`]'s packers; hosts embed [`Machine`]
//! and inject devices through the [`PortBus`] seam.
//!
//! The crate is `no-surprises` by construction: decoding a reserved word is
//! a [`Fault`], never undefined behavior, and every decoded instruction
//! re-encodes to the word it came from.

pub mod api;
pub mod decoder;
pub mod encoding;
pub mod execute;
mod fault;
pub mod state;

pub use api::{NullPort, PortBus, RecordingTrace, RegisterWrite, StepReport, TraceSink};
pub use decoder::{decode, Instruction};
pub use execute::{Machine, RunOutcome, StepOutcome};
pub use fault::Fault;
pub use state::{ArchitecturalState, Memory, Register, ADDRESS_SPACE_BYTES, REGISTER_COUNT};
