//! Top-level one-pass assembly pipeline.
//!
//! No symbol table and no second pass: every line encodes on sight. The
//! [`Assembler`] context carries the two counters the translation needs,
//! the output write cursor and the source line number. Warnings stream to a
//! [`DiagnosticSink`] as they are found; the first fatal error aborts the
//! whole run.

use std::fmt;

use sisa_core::encoding::word_to_bytes;

use crate::encoder::encode_instruction;
use crate::parser::{parse_line, ParseError};

/// Diagnostic severity. Errors are fatal to the run; warnings are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Non-fatal; the word is still emitted.
    Warning,
    /// Fatal; the run stops at this line.
    Error,
}

/// One diagnostic message tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-indexed source line, counting blank lines.
    pub line: usize,
    /// Severity of the message.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "Warning (line {}): {}", self.line, self.message),
            Severity::Error => write!(f, "Error parsing (line {}): {}", self.line, self.message),
        }
    }
}

/// Consumer of diagnostics, injected by the driver.
pub trait DiagnosticSink {
    /// Receives one diagnostic as soon as it is raised.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Fatal assembly failure: the parse error and the line that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    /// 1-indexed source line.
    pub line: usize,
    /// The underlying parse error.
    pub error: ParseError,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error parsing (line {}): {}", self.line, self.error)
    }
}

impl std::error::Error for AssembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// One-pass assembler context.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    pc: u16,
    line: usize,
}

impl Assembler {
    /// Creates a fresh context: write cursor at 0, no lines consumed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte offset the next emitted word will land at.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Number of source lines consumed so far, blank lines included.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Assembles one source line.
    ///
    /// `Ok(None)` for blank lines, which still advance the line counter but
    /// not the write cursor. Range warnings go to `sink`; the word is
    /// emitted regardless.
    ///
    /// # Errors
    ///
    /// Returns an [`AssembleError`] carrying the line number of the first
    /// fatal parse error.
    pub fn assemble_line(
        &mut self,
        text: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<u16>, AssembleError> {
        self.line += 1;
        let parsed = parse_line(text).map_err(|error| AssembleError {
            line: self.line,
            error,
        })?;
        let Some(instruction) = parsed else {
            return Ok(None);
        };

        let encoded = encode_instruction(&instruction);
        for warning in &encoded.warnings {
            sink.report(Diagnostic {
                line: self.line,
                severity: Severity::Warning,
                message: warning.to_string(),
            });
        }
        self.pc = self.pc.wrapping_add(2);
        Ok(Some(encoded.word))
    }
}

/// Output of a whole-source assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleResult {
    /// Encoded instruction words, in source order.
    pub words: Vec<u16>,
    /// The words serialized little-endian, low byte first.
    pub binary: Vec<u8>,
}

/// Assembles a complete source text, one instruction per line.
///
/// # Errors
///
/// Returns the [`AssembleError`] of the first fatal line; earlier warnings
/// have already reached `sink` by then.
pub fn assemble_source(
    source: &str,
    sink: &mut dyn DiagnosticSink,
) -> Result<AssembleResult, AssembleError> {
    let mut assembler = Assembler::new();
    let mut words = Vec::new();
    for line in source.lines() {
        if let Some(word) = assembler.assemble_line(line, sink)? {
            words.push(word);
        }
    }
    let binary = words.iter().copied().flat_map(word_to_bytes).collect();
    Ok(AssembleResult { words, binary })
}
