//! Virtual machine: fetch/decode/execute over an instruction buffer.
//!
//! The machine keeps the instruction stream separate from data memory, as
//! the original toolchain did: the PC is an index into the word buffer, not
//! a byte address, and walking past the final word is the normal
//! termination condition rather than a fault.

use crate::api::{PortBus, RegisterWrite, StepReport, TraceSink};
use crate::decoder::{decode, Instruction};
use crate::encoding::{self, AluFunction, CompareFunction};
use crate::fault::Fault;
use crate::state::{ArchitecturalState, Memory, Register};

/// Result of one [`Machine::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An instruction executed; state has been updated.
    Executed(StepReport),
    /// The PC points past the end of the instruction stream.
    Finished,
}

/// Summary of a [`Machine::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Number of instructions executed.
    pub steps: u64,
    /// `true` if the program ran off the end of the instruction stream,
    /// `false` if the step bound was exhausted first.
    pub completed: bool,
}

/// A complete machine: architectural state, data memory and the loaded
/// instruction stream.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    arch: ArchitecturalState,
    memory: Memory,
    program: Vec<u16>,
}

impl Machine {
    /// Creates a machine with zeroed state and the given instruction words.
    #[must_use]
    pub fn new(program: Vec<u16>) -> Self {
        Self {
            arch: ArchitecturalState::new(),
            memory: Memory::new(),
            program,
        }
    }

    /// Creates a machine from a little-endian binary image.
    ///
    /// A trailing odd byte is not a whole word and is ignored.
    #[must_use]
    pub fn from_image(image: &[u8]) -> Self {
        let program = image
            .chunks_exact(2)
            .map(|pair| encoding::bytes_to_word([pair[0], pair[1]]))
            .collect();
        Self::new(program)
    }

    /// Architectural register state.
    #[must_use]
    pub const fn state(&self) -> &ArchitecturalState {
        &self.arch
    }

    /// Mutable architectural register state.
    pub const fn state_mut(&mut self) -> &mut ArchitecturalState {
        &mut self.arch
    }

    /// Data memory.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable data memory.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Loaded instruction words.
    #[must_use]
    pub fn program(&self) -> &[u16] {
        &self.program
    }

    /// Executes the instruction at the current PC.
    ///
    /// # Errors
    ///
    /// Returns the decode [`Fault`] of the fetched word; no state changes
    /// in that case.
    #[allow(clippy::too_many_lines, clippy::cast_sign_loss)]
    pub fn step(&mut self, port: &mut dyn PortBus) -> Result<StepOutcome, Fault> {
        let pc = self.arch.pc();
        let Some(&word) = self.program.get(usize::from(pc)) else {
            return Ok(StepOutcome::Finished);
        };
        let instruction = decode(word)?;

        let mut next_pc = pc.wrapping_add(1);
        let mut write: Option<(Register, u16)> = None;

        match instruction {
            Instruction::Alu { op, rd, ra, rb } => {
                write = Some((rd, self.alu(op, ra, rb)));
            }
            Instruction::Not { rd, ra } => {
                write = Some((rd, !self.arch.gpr(ra)));
            }
            Instruction::Compare { op, rd, ra, rb } => {
                write = Some((rd, u16::from(self.compare(op, ra, rb))));
            }
            Instruction::Addi { rd, ra, offset } => {
                write = Some((rd, self.arch.gpr(ra).wrapping_add(offset as u16)));
            }
            Instruction::Load { rd, ra, offset } => {
                let ea = self.effective_address(ra, offset);
                write = Some((rd, self.memory.read_word(ea)));
            }
            Instruction::Store { rd, ra, offset } => {
                let ea = self.effective_address(ra, offset);
                self.memory.write_word(ea, self.arch.gpr(rd));
            }
            Instruction::LoadByte { rd, ra, offset } => {
                let ea = self.effective_address(ra, offset);
                write = Some((rd, self.memory.read_byte_signed(ea) as u16));
            }
            Instruction::StoreByte { rd, ra, offset } => {
                let ea = self.effective_address(ra, offset);
                #[allow(clippy::cast_possible_truncation)]
                self.memory.write_byte(ea, self.arch.gpr(rd) as u8);
            }
            Instruction::Jalr { rd, ra } => {
                // Read the target before the link write so JALR Rx, Rx
                // still jumps to the old value.
                let target = self.arch.gpr(ra);
                write = Some((rd, pc.wrapping_add(1)));
                next_pc = target;
            }
            Instruction::Branch {
                on_nonzero,
                rd,
                offset,
            } => {
                let taken = (self.arch.gpr(rd) != 0) == on_nonzero;
                if taken {
                    // Instruction-index arithmetic relative to the
                    // branch's own PC.
                    next_pc = pc.wrapping_add(offset as u16);
                }
            }
            Instruction::MovImm {
                high_byte,
                rd,
                value,
            } => {
                let value = if high_byte {
                    (self.arch.gpr(rd) & 0x00FF) | ((value as u16) << 8)
                } else {
                    value as u16
                };
                write = Some((rd, value));
            }
            Instruction::PortIo {
                output,
                rd,
                port: addr,
            } => {
                if output {
                    port.write(addr, self.arch.gpr(rd));
                } else {
                    write = Some((rd, port.read(addr)));
                }
            }
        }

        let reg_write = write.map(|(reg, new)| {
            let old = self.arch.gpr(reg);
            self.arch.set_gpr(reg, new);
            RegisterWrite { reg, old, new }
        });
        self.arch.set_pc(next_pc);

        Ok(StepOutcome::Executed(StepReport {
            pc,
            next_pc,
            word,
            reg_write,
        }))
    }

    /// Runs until the program walks off the end of the instruction stream
    /// or `max_steps` instructions have executed.
    ///
    /// # Errors
    ///
    /// Propagates the first decode [`Fault`].
    pub fn run(
        &mut self,
        port: &mut dyn PortBus,
        max_steps: u64,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> Result<RunOutcome, Fault> {
        let mut steps = 0u64;
        while steps < max_steps {
            match self.step(port)? {
                StepOutcome::Finished => return Ok(RunOutcome {
                    steps,
                    completed: true,
                }),
                StepOutcome::Executed(report) => {
                    if let Some(sink) = trace.as_deref_mut() {
                        sink.on_step(&report);
                    }
                    steps += 1;
                }
            }
        }
        Ok(RunOutcome {
            steps,
            completed: false,
        })
    }

    #[allow(clippy::cast_sign_loss)]
    fn effective_address(&self, ra: Register, offset: i16) -> u16 {
        self.arch.gpr(ra).wrapping_add(offset as u16)
    }

    fn alu(&self, op: AluFunction, ra: Register, rb: Register) -> u16 {
        let a = self.arch.gpr(ra);
        let b = self.arch.gpr(rb);
        match op {
            AluFunction::And => a & b,
            AluFunction::Or => a | b,
            AluFunction::Xor => a ^ b,
            AluFunction::Add => a.wrapping_add(b),
            AluFunction::Sub => a.wrapping_sub(b),
            // SHA and SHL are literal multiplications by 2^(Rb & 0xF),
            // not true shifts; the quirk is part of the architecture.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            AluFunction::Sha => {
                (i32::from(self.arch.gpr_signed(ra)) << (b & 0xF)) as u16
            }
            #[allow(clippy::cast_possible_truncation)]
            AluFunction::Shl => (u32::from(a) << (b & 0xF)) as u16,
            // Decoded ALU instructions never carry the NOT code.
            AluFunction::Not => !a,
        }
    }

    fn compare(&self, op: CompareFunction, ra: Register, rb: Register) -> bool {
        let signed = (self.arch.gpr_signed(ra), self.arch.gpr_signed(rb));
        let unsigned = (self.arch.gpr(ra), self.arch.gpr(rb));
        match op {
            CompareFunction::Lt => signed.0 < signed.1,
            CompareFunction::Le => signed.0 <= signed.1,
            CompareFunction::Eq => unsigned.0 == unsigned.1,
            CompareFunction::Ltu => unsigned.0 < unsigned.1,
            CompareFunction::Leu => unsigned.0 <= unsigned.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Machine, RunOutcome, StepOutcome};
    use crate::api::{NullPort, PortBus, RecordingTrace};
    use crate::decoder::Instruction;
    use crate::encoding::{AluFunction, CompareFunction};
    use crate::fault::Fault;
    use crate::state::Register;

    fn machine(program: &[Instruction]) -> Machine {
        Machine::new(program.iter().map(|i| i.encode()).collect())
    }

    fn run_to_end(machine: &mut Machine) {
        let outcome = machine
            .run(&mut NullPort, 10_000, None)
            .expect("program executes without faulting");
        assert!(outcome.completed);
    }

    #[rstest]
    #[case(AluFunction::And, 0x00FF, 0x0F0F, 0x000F)]
    #[case(AluFunction::Or, 0x00FF, 0x0F0F, 0x0FFF)]
    #[case(AluFunction::Xor, 0x00FF, 0x0F0F, 0x0FF0)]
    #[case(AluFunction::Add, 0x7FFF, 0x0001, 0x8000)]
    #[case(AluFunction::Sub, 0x0000, 0x0001, 0xFFFF)]
    #[case(AluFunction::Sha, 0xFFFF, 0x0002, 0xFFFC)]
    #[case(AluFunction::Shl, 0x00FF, 0x0008, 0xFF00)]
    fn alu_operations(
        #[case] op: AluFunction,
        #[case] a: u16,
        #[case] b: u16,
        #[case] expected: u16,
    ) {
        let mut m = machine(&[Instruction::Alu {
            op,
            rd: Register::R2,
            ra: Register::R0,
            rb: Register::R1,
        }]);
        m.state_mut().set_gpr(Register::R0, a);
        m.state_mut().set_gpr(Register::R1, b);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R2), expected);
    }

    #[test]
    fn signed_overflow_wraps_without_trapping() {
        let mut m = machine(&[Instruction::Alu {
            op: AluFunction::Add,
            rd: Register::R1,
            ra: Register::R1,
            rb: Register::R2,
        }]);
        m.state_mut().set_gpr(Register::R1, 32767);
        m.state_mut().set_gpr(Register::R2, 1);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr_signed(Register::R1), -32768);
    }

    #[test]
    fn shift_amount_uses_only_the_low_nibble() {
        let mut m = machine(&[Instruction::Alu {
            op: AluFunction::Shl,
            rd: Register::R2,
            ra: Register::R0,
            rb: Register::R1,
        }]);
        m.state_mut().set_gpr(Register::R0, 1);
        m.state_mut().set_gpr(Register::R1, 0x11);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R2), 2);
    }

    #[test]
    fn not_complements_the_source() {
        let mut m = machine(&[Instruction::Not {
            rd: Register::R1,
            ra: Register::R0,
        }]);
        m.state_mut().set_gpr(Register::R0, 0x00FF);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R1), 0xFF00);
    }

    #[rstest]
    #[case(CompareFunction::Lt, 1)]
    #[case(CompareFunction::Le, 1)]
    #[case(CompareFunction::Eq, 0)]
    #[case(CompareFunction::Ltu, 0)]
    #[case(CompareFunction::Leu, 0)]
    fn signed_and_unsigned_compares_disagree_on_0xffff(
        #[case] op: CompareFunction,
        #[case] expected: u16,
    ) {
        let mut m = machine(&[Instruction::Compare {
            op,
            rd: Register::R5,
            ra: Register::R3,
            rb: Register::R4,
        }]);
        m.state_mut().set_gpr(Register::R3, 0xFFFF);
        m.state_mut().set_gpr(Register::R4, 1);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R5), expected);
    }

    #[test]
    fn movi_sign_extends_and_movhi_keeps_the_low_byte() {
        let mut m = machine(&[
            Instruction::MovImm {
                high_byte: false,
                rd: Register::R0,
                value: -1,
            },
            Instruction::MovImm {
                high_byte: true,
                rd: Register::R0,
                value: 0x12,
            },
        ]);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R0), 0x12FF);
    }

    #[test]
    fn addi_adds_a_signed_displacement() {
        let mut m = machine(&[Instruction::Addi {
            rd: Register::R1,
            ra: Register::R0,
            offset: -2,
        }]);
        m.state_mut().set_gpr(Register::R0, 1);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R1), 0xFFFF);
    }

    #[test]
    fn word_store_and_load_roundtrip_through_memory() {
        let mut m = machine(&[
            Instruction::Store {
                rd: Register::R1,
                ra: Register::R0,
                offset: 4,
            },
            Instruction::Load {
                rd: Register::R2,
                ra: Register::R0,
                offset: 4,
            },
        ]);
        m.state_mut().set_gpr(Register::R0, 0x1000);
        m.state_mut().set_gpr(Register::R1, 0xBEEF);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R2), 0xBEEF);
        assert_eq!(m.memory().read_byte(0x1004), 0xEF);
        assert_eq!(m.memory().read_byte(0x1005), 0xBE);
    }

    #[test]
    fn byte_load_sign_extends_the_cell() {
        let mut m = machine(&[
            Instruction::StoreByte {
                rd: Register::R1,
                ra: Register::R0,
                offset: 0,
            },
            Instruction::LoadByte {
                rd: Register::R2,
                ra: Register::R0,
                offset: 0,
            },
        ]);
        m.state_mut().set_gpr(Register::R0, 0x0200);
        m.state_mut().set_gpr(Register::R1, 0x1280);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R2), 0xFF80);
    }

    #[test]
    fn jalr_links_and_redirects() {
        // 0: JALR R6, R0   (R0 = 2, skip the next word)
        // 1: MOVI R1, 1    (skipped)
        // 2: MOVI R2, 2
        let mut m = machine(&[
            Instruction::Jalr {
                rd: Register::R6,
                ra: Register::R0,
            },
            Instruction::MovImm {
                high_byte: false,
                rd: Register::R1,
                value: 1,
            },
            Instruction::MovImm {
                high_byte: false,
                rd: Register::R2,
                value: 2,
            },
        ]);
        m.state_mut().set_gpr(Register::R0, 2);
        run_to_end(&mut m);
        assert_eq!(m.state().gpr(Register::R6), 1);
        assert_eq!(m.state().gpr(Register::R1), 0);
        assert_eq!(m.state().gpr(Register::R2), 2);
    }

    #[test]
    fn jalr_reads_the_target_before_the_link_write() {
        let mut m = machine(&[Instruction::Jalr {
            rd: Register::R0,
            ra: Register::R0,
        }]);
        m.state_mut().set_gpr(Register::R0, 5);
        let outcome = m.step(&mut NullPort).expect("decodes");
        assert!(matches!(outcome, StepOutcome::Executed(_)));
        assert_eq!(m.state().pc(), 5);
        assert_eq!(m.state().gpr(Register::R0), 1);
    }

    #[rstest]
    #[case(false, 0, true)]
    #[case(false, 7, false)]
    #[case(true, 7, true)]
    #[case(true, 0, false)]
    fn branches_test_the_condition_register(
        #[case] on_nonzero: bool,
        #[case] condition: u16,
        #[case] taken: bool,
    ) {
        // A taken branch with offset 2 skips the following MOVI.
        let mut m = machine(&[
            Instruction::Branch {
                on_nonzero,
                rd: Register::R3,
                offset: 2,
            },
            Instruction::MovImm {
                high_byte: false,
                rd: Register::R4,
                value: 1,
            },
        ]);
        m.state_mut().set_gpr(Register::R3, condition);
        run_to_end(&mut m);
        let expected = if taken { 0 } else { 1 };
        assert_eq!(m.state().gpr(Register::R4), expected);
    }

    #[test]
    fn backward_branches_loop_until_the_condition_clears() {
        // R0 counts down from 3; the BNZ at index 2 jumps back to the
        // ADDI at index 1.
        let mut m = machine(&[
            Instruction::MovImm {
                high_byte: false,
                rd: Register::R0,
                value: 3,
            },
            Instruction::Addi {
                rd: Register::R0,
                ra: Register::R0,
                offset: -1,
            },
            Instruction::Branch {
                on_nonzero: true,
                rd: Register::R0,
                offset: -1,
            },
        ]);
        let outcome = m
            .run(&mut NullPort, 100, None)
            .expect("loop executes cleanly");
        assert_eq!(m.state().gpr(Register::R0), 0);
        assert_eq!(
            outcome,
            RunOutcome {
                steps: 7,
                completed: true,
            }
        );
    }

    #[test]
    fn the_step_bound_stops_infinite_loops() {
        // BZ R0, 0 with R0 = 0 branches to itself forever.
        let mut m = machine(&[Instruction::Branch {
            on_nonzero: false,
            rd: Register::R0,
            offset: 0,
        }]);
        let outcome = m.run(&mut NullPort, 50, None).expect("steps decode");
        assert_eq!(
            outcome,
            RunOutcome {
                steps: 50,
                completed: false,
            }
        );
    }

    struct EchoPort {
        last_write: Option<(u8, u16)>,
    }

    impl PortBus for EchoPort {
        fn read(&mut self, port: u8) -> u16 {
            u16::from(port) + 0x100
        }

        fn write(&mut self, port: u8, value: u16) {
            self.last_write = Some((port, value));
        }
    }

    #[test]
    fn port_io_goes_through_the_bus() {
        let mut m = machine(&[
            Instruction::PortIo {
                output: false,
                rd: Register::R1,
                port: 7,
            },
            Instruction::PortIo {
                output: true,
                rd: Register::R1,
                port: 9,
            },
        ]);
        let mut bus = EchoPort { last_write: None };
        let outcome = m.run(&mut bus, 10, None).expect("ports decode");
        assert!(outcome.completed);
        assert_eq!(m.state().gpr(Register::R1), 0x107);
        assert_eq!(bus.last_write, Some((9, 0x107)));
    }

    #[test]
    fn reserved_words_fault_without_changing_state() {
        let mut m = Machine::new(vec![0xF000]);
        assert_eq!(m.step(&mut NullPort), Err(Fault::ReservedSelector(15)));
        assert_eq!(m.state().pc(), 0);
    }

    #[test]
    fn trace_reports_register_transitions() {
        let mut m = Machine::from_image(&[0x05, 0x90, 0x0C, 0x00]);
        let mut trace = RecordingTrace::default();
        let outcome = m
            .run(&mut NullPort, 10, Some(&mut trace))
            .expect("program executes");
        assert!(outcome.completed);
        assert_eq!(m.state().gpr(Register::R0), 5);
        assert_eq!(m.state().gpr(Register::R1), 10);

        assert_eq!(trace.steps.len(), 2);
        let first = trace.steps[0].reg_write.expect("MOVI writes R0");
        assert_eq!(first.reg, Register::R0);
        assert_eq!((first.old, first.new), (0, 5));
        let second = trace.steps[1].reg_write.expect("ADD writes R1");
        assert_eq!(second.reg, Register::R1);
        assert_eq!((second.old, second.new), (0, 10));
    }
}
