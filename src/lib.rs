//! A loader, tape, and interpreter toolkit for the Brainfuck esoteric
//! language.
//!
//! [`loader::load`] turns source bytes into a [`program::Program`]: an
//! owned instruction tree with adjacent `+`/`-`/`<`/`>` runs folded into
//! counts, plus whatever input the source embedded after a `!`. A
//! [`program::Program`] is then driven by an [`interpreter::Interpreter`]
//! against a [`tape::Tape`], with I/O and debugging routed through
//! pluggable hooks rather than hard-wired to stdin/stdout.
//!
//! Reading source from a file, stripping a shebang line, and parsing
//! command-line arguments are left to callers (see `bft-cli` for one
//! such caller) — this crate only concerns itself with loading and
//! running already-in-memory source bytes.

pub mod buffer;
pub mod config;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod loader;
pub mod program;
pub mod tape;

pub use buffer::ByteBuffer;
pub use config::{Configuration, EndOfInputPolicy};
pub use error::{BufferError, Error};
pub use instruction::{Instruction, InstructionKind};
pub use interpreter::{DebugHook, Interpreter, InterpreterBuilder, InputHook, OutputHook};
pub use loader::load;
pub use program::Program;
pub use tape::Tape;
