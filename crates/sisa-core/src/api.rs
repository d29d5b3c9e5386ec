//! Host-facing seams: port bus and execution tracing.
//!
//! The machine itself owns registers and memory; everything beyond the
//! architectural boundary (port-mapped devices, step observers) is injected
//! through the traits here so hosts can wire in real devices or test
//! doubles without touching the executor.

use crate::state::Register;

/// External bus reached by the `IN` and `OUT` instructions.
///
/// Port addresses are the raw low byte of the instruction word; the machine
/// performs no range checking or routing of its own.
pub trait PortBus {
    /// Services an `IN` from `port`, returning the value latched into the
    /// destination register.
    fn read(&mut self, port: u8) -> u16;

    /// Services an `OUT` of `value` to `port`.
    fn write(&mut self, port: u8, value: u16);
}

/// Port bus with no devices attached: reads return zero, writes are lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPort;

impl PortBus for NullPort {
    fn read(&mut self, _port: u8) -> u16 {
        0
    }

    fn write(&mut self, _port: u8, _value: u16) {}
}

/// A register update performed by one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Register that was written.
    pub reg: Register,
    /// Value held before the instruction executed.
    pub old: u16,
    /// Value held after the instruction executed.
    pub new: u16,
}

/// Observation of a single completed execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Instruction index the word was fetched from.
    pub pc: u16,
    /// Instruction index the machine moved to.
    pub next_pc: u16,
    /// Raw instruction word that executed.
    pub word: u16,
    /// Register write performed by the instruction, if any. Stores,
    /// untaken branches and `OUT` leave the register file untouched.
    pub reg_write: Option<RegisterWrite>,
}

/// Observer notified after every executed instruction.
pub trait TraceSink {
    /// Called once per completed step, after state has been updated.
    fn on_step(&mut self, report: &StepReport);
}

/// Collects step reports into a vector. Intended for tests and hosts that
/// post-process a whole run.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrace {
    /// Reports in execution order.
    pub steps: Vec<StepReport>,
}

impl TraceSink for RecordingTrace {
    fn on_step(&mut self, report: &StepReport) {
        self.steps.push(*report);
    }
}

#[cfg(test)]
mod tests {
    use super::{NullPort, PortBus, RecordingTrace, StepReport, TraceSink};

    #[test]
    fn null_port_reads_zero_and_swallows_writes() {
        let mut port = NullPort;
        port.write(0x40, 0xABCD);
        assert_eq!(port.read(0x40), 0);
    }

    #[test]
    fn recording_trace_keeps_reports_in_order() {
        let mut trace = RecordingTrace::default();
        for pc in 0..3u16 {
            trace.on_step(&StepReport {
                pc,
                next_pc: pc + 1,
                word: 0x9000,
                reg_write: None,
            });
        }
        let order: Vec<u16> = trace.steps.iter().map(|step| step.pc).collect();
        assert_eq!(order, [0, 1, 2]);
    }
}
