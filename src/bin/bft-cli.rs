//! Command-line front end for the `bft` toolkit.
//!
//! Everything that is deliberately outside the library's scope lives
//! here: reading the source file, stripping a leading `#!` shebang line,
//! and parsing arguments.

use std::fs;
use std::process::ExitCode;

use bft::config::{Configuration, EndOfInputPolicy};
use bft::instruction::{Instruction, InstructionKind};
use bft::loader::load;
use clap::{Parser, Subcommand};
use colored::Colorize as _;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "bft", version, about = "A Brainfuck loader and interpreter.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Loads and runs a Brainfuck source file.
    Run(RunArgs),
    /// Loads a source file and prints its folded instruction tree, one
    /// operation per line.
    Pretty(FileArgs),
    /// Loads a source file and prints the shortest equivalent source: the
    /// glyphs implied by the folded instruction tree, with no separators.
    Minify(FileArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Path to the Brainfuck source file.
    file_path: String,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to the Brainfuck source file.
    file_path: String,

    /// What the current cell becomes on end-of-input: `zero`, `eof`, or
    /// `nothing`.
    #[arg(long, default_value = "zero")]
    on_eof: EofPolicyArg,

    /// Enables `#` as a debug instruction, dumping the tape to stderr.
    #[arg(long, short, default_value_t = false)]
    debug: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum EofPolicyArg {
    Zero,
    Eof,
    Nothing,
}

impl From<EofPolicyArg> for EndOfInputPolicy {
    fn from(arg: EofPolicyArg) -> EndOfInputPolicy {
        match arg {
            EofPolicyArg::Zero => EndOfInputPolicy::StoreZero,
            EofPolicyArg::Eof => EndOfInputPolicy::StoreEof,
            EofPolicyArg::Nothing => EndOfInputPolicy::DoNothing,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Pretty(args) => pretty(args),
        Command::Minify(args) => minify(args),
    };

    if let Err(message) = result {
        eprintln!("{} {}", "error:".red().bold(), message);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(args: RunArgs) -> Result<(), String> {
    let source = read_source(&args.file_path)?;
    let program = load(&source).map_err(|e| e.to_string())?;
    let config = Configuration::new(args.on_eof.into(), args.debug);
    let mut interp = bft::InterpreterBuilder::new()
        .with_config(config)
        .build(Rc::new(program));
    interp.run().map_err(|e| e.to_string())
}

fn pretty(args: FileArgs) -> Result<(), String> {
    let source = read_source(&args.file_path)?;
    let program = load(&source).map_err(|e| e.to_string())?;
    print_tree(program.root(), 0);
    Ok(())
}

fn print_tree(mut current: Option<&Instruction>, depth: usize) {
    let indent = "  ".repeat(depth);
    while let Some(ins) = current {
        match ins.kind() {
            InstructionKind::LoopBegin => {
                println!("{indent}loop {{");
                print_tree(ins.body(), depth + 1);
                println!("{indent}}}");
            }
            InstructionKind::LoopEnd | InstructionKind::Nop => {}
            kind => println!("{indent}{}", describe(kind, ins.quantity())),
        }
        current = ins.next();
    }
}

fn describe(kind: InstructionKind, quantity: u64) -> String {
    match kind {
        InstructionKind::MoveRight => format!("move right {quantity}"),
        InstructionKind::MoveLeft => format!("move left {quantity}"),
        InstructionKind::Increase => format!("increase {quantity}"),
        InstructionKind::Decrease => format!("decrease {quantity}"),
        InstructionKind::Print => format!("print x{quantity}"),
        InstructionKind::Read => format!("read x{quantity}"),
        InstructionKind::Debug => format!("debug x{quantity}"),
        InstructionKind::Nop | InstructionKind::LoopBegin | InstructionKind::LoopEnd => {
            unreachable!("handled by print_tree")
        }
    }
}

fn minify(args: FileArgs) -> Result<(), String> {
    let source = read_source(&args.file_path)?;
    let program = load(&source).map_err(|e| e.to_string())?;
    let mut out = String::new();
    write_glyphs(program.root(), &mut out);
    println!("{out}");
    Ok(())
}

fn write_glyphs(mut current: Option<&Instruction>, out: &mut String) {
    while let Some(ins) = current {
        let quantity = ins.quantity() as usize;
        match ins.kind() {
            InstructionKind::MoveRight => out.push_str(&">".repeat(quantity)),
            InstructionKind::MoveLeft => out.push_str(&"<".repeat(quantity)),
            InstructionKind::Increase => out.push_str(&"+".repeat(quantity)),
            InstructionKind::Decrease => out.push_str(&"-".repeat(quantity)),
            InstructionKind::Print => out.push_str(&".".repeat(quantity)),
            InstructionKind::Read => out.push_str(&",".repeat(quantity)),
            InstructionKind::Debug => out.push_str(&"#".repeat(quantity)),
            InstructionKind::Nop => {}
            InstructionKind::LoopBegin => {
                out.push('[');
                write_glyphs(ins.body(), out);
                out.push(']');
            }
            InstructionKind::LoopEnd => {}
        }
        current = ins.next();
    }
}

/// Reads `path`, stripping a leading `#!...` shebang line if present.
fn read_source(path: &str) -> Result<Vec<u8>, String> {
    let contents = fs::read(path).map_err(|e| format!("{path}: {e}"))?;
    if contents.starts_with(b"#!") {
        let after_newline = contents
            .iter()
            .position(|&b| b == b'\n')
            .map(|pos| pos + 1)
            .unwrap_or(contents.len());
        Ok(contents[after_newline..].to_vec())
    } else {
        Ok(contents)
    }
}
