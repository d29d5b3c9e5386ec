//! CLI entry point for the SISA assembler binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use sisa_assembler::assembler::{assemble_source, AssembleResult, Diagnostic, DiagnosticSink};
use sisa_assembler::listing::render_bits;
use sisa_core::{Machine, NullPort, Register, StepReport, TraceSink};
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: sisa-asm <command> [options]

Commands:
  build <input> [-o <output>] [--bits]  Assemble source to binary
  run   <input> [--trace]               Assemble and execute

Options:
  -o, --output <file>  Output file path (default: input stem + .bin)
  --bits               Print bit-pattern listing to stderr (build only)
  --trace              Print per-step register transitions (run only)
  -h, --help           Show this help message

Examples:
  sisa-asm build program.sisa
  sisa-asm build program.sisa -o program.bin --bits
  sisa-asm run program.sisa --trace
";

/// Step bound for the `run` command; a taken backward branch must not hang
/// the CLI.
const MAX_STEPS: u64 = 1_000_000;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Run(RunArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    bits: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    trace: bool,
}

#[derive(Debug)]
enum ParsedArgs {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParsedArgs, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParsedArgs::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "build" => parse_build_args(args)
            .map(Command::Build)
            .map(ParsedArgs::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParsedArgs::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut bits = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--bits" {
            bits = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        bits,
    })
}

fn parse_run_args(args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut trace = false;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--trace" {
            trace = true;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs { input, trace })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.bin"))
}

/// Prints diagnostics to stderr as they are raised.
struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        eprintln!("{diagnostic}");
    }
}

fn assemble_file(input: &Path) -> Result<AssembleResult, i32> {
    let source = match fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: failed to read {}: {e}", input.display());
            return Err(1);
        }
    };

    match assemble_source(&source, &mut StderrSink) {
        Ok(result) => Ok(result),
        Err(e) => {
            eprintln!("{e}");
            Err(1)
        }
    }
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let result = assemble_file(&args.input)?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    if let Err(e) = fs::write(&output_path, &result.binary) {
        eprintln!("error: failed to write output: {e}");
        return Err(1);
    }

    if args.bits {
        for word in &result.words {
            eprintln!("{}", render_bits(*word));
        }
    }

    println!(
        "Assembled {} ({} bytes) -> {}",
        args.input.display(),
        result.binary.len(),
        output_path.display()
    );

    Ok(())
}

/// Prints one line per executed instruction in the historical tracer's
/// shape: register transition, raw word, post-step PC.
struct StdoutTrace;

impl TraceSink for StdoutTrace {
    fn on_step(&mut self, report: &StepReport) {
        if let Some(write) = report.reg_write {
            println!(
                "{} (0x{:04X} -> 0x{:04X}): ({:04X}) (PC: {:04X})",
                write.reg, write.old, write.new, report.word, report.next_pc
            );
        } else {
            println!("({:04X}) (PC: {:04X})", report.word, report.next_pc);
        }
    }
}

fn run_program(args: &RunArgs) -> Result<(), i32> {
    let result = assemble_file(&args.input)?;

    let mut machine = Machine::new(result.words);
    let mut trace = StdoutTrace;
    let trace_sink: Option<&mut dyn TraceSink> = if args.trace {
        Some(&mut trace)
    } else {
        None
    };

    let outcome = match machine.run(&mut NullPort, MAX_STEPS, trace_sink) {
        Ok(outcome) => outcome,
        Err(fault) => {
            eprintln!(
                "fault at PC {:04X}: {fault}",
                machine.state().pc()
            );
            return Err(1);
        }
    };

    if !outcome.completed {
        eprintln!("error: step limit reached after {MAX_STEPS} instructions");
        return Err(1);
    }

    for reg in Register::ALL {
        println!("{reg}: 0x{:04X}", machine.state().gpr(reg));
    }

    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParsedArgs::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParsedArgs::Command(Command::Build(args))) => match run_build(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParsedArgs::Command(Command::Run(args))) => match run_program(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
