//! The tree-walking interpreter, and the hooks it drives I/O and
//! debugging through.
//!
//! An [`Interpreter`] owns a [`Tape`] and a shared handle on a
//! [`Program`], and walks the program's instruction tree without
//! recursion: entering a loop pushes the `LoopBegin` node itself onto an
//! explicit stack, and a matching `LoopEnd` pops back to it so the
//! condition can be re-tested through the same code path.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

use colored::Colorize as _;

use crate::buffer::ByteBuffer;
use crate::config::{Configuration, EndOfInputPolicy};
use crate::error::Error;
use crate::instruction::{Instruction, InstructionKind};
use crate::program::Program;
use crate::tape::Tape;

/// Receives bytes written by a running program's `.` instructions.
pub trait OutputHook {
    /// Handles one output byte. An `Err` aborts the run with
    /// [`Error::Io`].
    fn handle_output(&mut self, value: i8) -> Result<(), String>;
}

impl<F> OutputHook for F
where
    F: FnMut(i8) -> Result<(), String> + 'static,
{
    fn handle_output(&mut self, value: i8) -> Result<(), String> {
        self(value)
    }
}

/// Supplies bytes for a running program's `,` instructions once the
/// program's embedded input (if any) is exhausted.
///
/// An implementation hands bytes over by calling [`Interpreter::feed`]
/// before returning `Ok(())`. Not calling `feed`, or feeding a
/// zero-length buffer, reports a permanent end-of-input: the hook is
/// never consulted again for the rest of the run. Returning `Err` aborts
/// the run with [`Error::Io`].
pub trait InputHook {
    /// Attempts to supply more input, calling back into `interpreter` to
    /// hand it over.
    fn provide_input(&mut self, interpreter: &mut Interpreter) -> Result<(), String>;
}

impl<F> InputHook for F
where
    F: FnMut(&mut Interpreter) -> Result<(), String> + 'static,
{
    fn provide_input(&mut self, interpreter: &mut Interpreter) -> Result<(), String> {
        self(interpreter)
    }
}

/// Invoked by a running program's `#` instructions (when debug
/// instructions are enabled) to inspect the tape mid-run.
pub trait DebugHook {
    /// Handles one debug checkpoint. An `Err` aborts the run with
    /// [`Error::Io`].
    fn handle_debug(&mut self, tape: &Tape) -> Result<(), String>;
}

impl<F> DebugHook for F
where
    F: FnMut(&Tape) -> Result<(), String> + 'static,
{
    fn handle_debug(&mut self, tape: &Tape) -> Result<(), String> {
        self(tape)
    }
}

/// Writes each output byte to stdout, as a raw byte.
struct StdoutOutputHook;

impl OutputHook for StdoutOutputHook {
    fn handle_output(&mut self, value: i8) -> Result<(), String> {
        io::stdout()
            .write_all(&[value as u8])
            .map_err(|e| e.to_string())
    }
}

fn default_output_hook() -> Box<dyn OutputHook> {
    Box::new(StdoutOutputHook)
}

/// Reads up to 256 bytes from stdin and feeds them to the interpreter;
/// feeds a zero-length buffer once stdin is drained, reporting permanent
/// end-of-input.
fn default_input_hook(interpreter: &mut Interpreter) -> Result<(), String> {
    let mut chunk = [0u8; 256];
    let read = io::stdin().read(&mut chunk).map_err(|e| e.to_string())?;
    interpreter.feed(ByteBuffer::from(&chunk[..read]));
    Ok(())
}

/// Writes a coloured window of the tape around the cursor to standard
/// error, the cell under the cursor highlighted.
struct TapeDumpDebugHook;

impl DebugHook for TapeDumpDebugHook {
    fn handle_debug(&mut self, tape: &Tape) -> Result<(), String> {
        const WINDOW: i64 = 8;
        let cursor = tape.cursor();
        let mut line = String::new();
        for offset in -WINDOW..=WINDOW {
            let index = cursor + offset;
            let value = tape.get_value_at(index);
            let cell = format!("{:>4}", value);
            if offset == 0 {
                line.push_str(&format!("{}", cell.on_yellow().black()));
            } else {
                line.push_str(&cell);
            }
        }
        eprintln!("{}", line);
        Ok(())
    }
}

fn default_debug_hook() -> Box<dyn DebugHook> {
    Box::new(TapeDumpDebugHook)
}

/// Builds an [`Interpreter`], fluently overriding its hooks and
/// configuration before attaching it to a program.
pub struct InterpreterBuilder {
    config: Configuration,
    output_hook: Option<Box<dyn OutputHook>>,
    input_hook: Option<Box<dyn InputHook>>,
    debug_hook: Option<Box<dyn DebugHook>>,
}

impl Default for InterpreterBuilder {
    fn default() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }
}

impl InterpreterBuilder {
    /// A builder with the default configuration ([`EndOfInputPolicy::StoreZero`],
    /// debug instructions disabled) and stock hooks (stdin/stdout, a
    /// coloured tape dump on stderr for debug checkpoints).
    pub fn new() -> InterpreterBuilder {
        InterpreterBuilder {
            config: Configuration::default(),
            output_hook: None,
            input_hook: None,
            debug_hook: None,
        }
    }

    /// Overrides the configuration.
    pub fn with_config(mut self, config: Configuration) -> InterpreterBuilder {
        self.config = config;
        self
    }

    /// Overrides the output hook.
    pub fn with_output_hook(mut self, hook: impl OutputHook + 'static) -> InterpreterBuilder {
        self.output_hook = Some(Box::new(hook));
        self
    }

    /// Overrides the input hook.
    pub fn with_input_hook(mut self, hook: impl InputHook + 'static) -> InterpreterBuilder {
        self.input_hook = Some(Box::new(hook));
        self
    }

    /// Overrides the debug hook.
    pub fn with_debug_hook(mut self, hook: impl DebugHook + 'static) -> InterpreterBuilder {
        self.debug_hook = Some(Box::new(hook));
        self
    }

    /// Attaches the builder's settings to `program`, producing a ready
    /// to run [`Interpreter`].
    pub fn build(self, program: Rc<Program>) -> Interpreter {
        let had_embedded_input = program.embedded_input().size() > 0;
        Interpreter {
            program,
            tape: Tape::new(),
            config: self.config,
            output_hook: self.output_hook.unwrap_or_else(default_output_hook),
            input_hook: self.input_hook,
            debug_hook: self.debug_hook.unwrap_or_else(default_debug_hook),
            runtime_input: ByteBuffer::new(0),
            runtime_offset: 0,
            embedded_pos: 0,
            had_embedded_input,
            end_of_input: false,
        }
    }
}

/// One outcome of a single read-protocol iteration.
enum ReadOutcome {
    Byte(i8),
    Eof,
}

/// Runs a loaded [`Program`] against a [`Tape`], driving I/O and
/// debugging through a set of pluggable hooks.
pub struct Interpreter {
    program: Rc<Program>,
    tape: Tape,
    config: Configuration,
    output_hook: Box<dyn OutputHook>,
    input_hook: Option<Box<dyn InputHook>>,
    debug_hook: Box<dyn DebugHook>,
    runtime_input: ByteBuffer,
    runtime_offset: u64,
    embedded_pos: u64,
    had_embedded_input: bool,
    end_of_input: bool,
}

impl Interpreter {
    /// Attaches a fresh interpreter (stock hooks, default configuration)
    /// to `program`. Equivalent to `InterpreterBuilder::new().build(program)`.
    pub fn new(program: Rc<Program>) -> Interpreter {
        InterpreterBuilder::new().build(program)
    }

    /// The tape as it stands, for introspection between or after runs.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Replaces the tape outright, discarding whatever the interpreter
    /// held before.
    pub fn set_tape(&mut self, tape: Tape) {
        self.tape = tape;
    }

    /// The program currently attached to this interpreter.
    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    /// Attaches a different program to this interpreter. Since a fresh
    /// program has its own embedded input, this also resets the embedded
    /// input cursor and clears `end_of_input`, as a newly built
    /// interpreter would; the runtime input buffer set by [`Self::feed`]
    /// is left untouched.
    pub fn set_program(&mut self, program: Rc<Program>) {
        self.had_embedded_input = program.embedded_input().size() > 0;
        self.embedded_pos = 0;
        self.end_of_input = false;
        self.program = program;
    }

    /// The configuration currently in effect.
    pub fn configuration(&self) -> Configuration {
        self.config
    }

    /// Overrides the configuration.
    pub fn set_configuration(&mut self, config: Configuration) {
        self.config = config;
    }

    /// Replaces the interpreter's runtime input buffer with `buffer` and
    /// resets its read cursor, clearing any recorded end-of-input. Called
    /// by [`InputHook`] implementations (including the stock stdin hook)
    /// to hand over newly available data; a zero-length `buffer` reports
    /// that no more input is available.
    pub fn feed(&mut self, buffer: ByteBuffer) {
        self.runtime_input = buffer;
        self.runtime_offset = 0;
        self.end_of_input = false;
    }

    /// Runs the program to completion: either it falls off the end of
    /// its instruction chain with no loop left open, or a hook reports
    /// failure.
    ///
    /// The instruction tree is walked without recursion, using an
    /// explicit stack of `LoopBegin` nodes to return to once their
    /// bodies run out.
    pub fn run(&mut self) -> Result<(), Error> {
        let program = Rc::clone(&self.program);
        let mut current = program.root();
        let mut stack: Vec<&Instruction> = Vec::new();

        loop {
            let ins = match current {
                Some(ins) => ins,
                None => {
                    if stack.is_empty() {
                        return Ok(());
                    } else {
                        return Err(Error::UnbalancedBrackets);
                    }
                }
            };

            match ins.kind() {
                InstructionKind::Nop => {
                    current = ins.next();
                }
                InstructionKind::MoveRight => {
                    self.tape.move_right_by(ins.quantity());
                    current = ins.next();
                }
                InstructionKind::MoveLeft => {
                    self.tape.move_left_by(ins.quantity());
                    current = ins.next();
                }
                InstructionKind::Increase => {
                    self.tape.increase_current_value_by(ins.quantity());
                    current = ins.next();
                }
                InstructionKind::Decrease => {
                    self.tape.decrease_current_value_by(ins.quantity());
                    current = ins.next();
                }
                InstructionKind::Print => {
                    let value = self.tape.get_current_value();
                    for _ in 0..ins.quantity() {
                        self.output_hook.handle_output(value).map_err(Error::Io)?;
                    }
                    current = ins.next();
                }
                InstructionKind::Read => {
                    let mut last = None;
                    for _ in 0..ins.quantity() {
                        last = Some(self.read_protocol_iteration()?);
                    }
                    match last {
                        Some(ReadOutcome::Byte(value)) => self.tape.set_current_value(value),
                        Some(ReadOutcome::Eof) => {
                            if let Some(value) = self.eof_value() {
                                self.tape.set_current_value(value);
                            }
                        }
                        None => {}
                    }
                    current = ins.next();
                }
                InstructionKind::Debug => {
                    if self.config.debug_enabled() {
                        for _ in 0..ins.quantity() {
                            self.debug_hook.handle_debug(&self.tape).map_err(Error::Io)?;
                        }
                    }
                    current = ins.next();
                }
                InstructionKind::LoopBegin => {
                    if self.tape.get_current_value() != 0 {
                        stack.push(ins);
                        current = ins.body();
                    } else {
                        current = ins.next();
                    }
                }
                InstructionKind::LoopEnd => match stack.pop() {
                    Some(loop_begin) => current = Some(loop_begin),
                    None => return Err(Error::UnbalancedBrackets),
                },
            }
        }
    }

    /// Runs one iteration of the read protocol: embedded input first,
    /// then the runtime input buffer, pulling from the input hook if
    /// that buffer is exhausted.
    fn read_protocol_iteration(&mut self) -> Result<ReadOutcome, Error> {
        if self.embedded_pos < self.program.embedded_input().size() {
            let value = self
                .program
                .embedded_input()
                .get_value(self.embedded_pos)
                .expect("embedded_pos was checked against embedded_input().size()");
            self.embedded_pos += 1;
            return Ok(ReadOutcome::Byte(value));
        }

        if self.had_embedded_input {
            self.end_of_input = true;
            return Ok(ReadOutcome::Eof);
        }

        if self.end_of_input {
            return Ok(ReadOutcome::Eof);
        }

        if let Some(value) = self.take_runtime_byte() {
            return Ok(ReadOutcome::Byte(value));
        }

        self.pull_from_hook()?;

        match self.take_runtime_byte() {
            Some(value) => Ok(ReadOutcome::Byte(value)),
            None => {
                self.end_of_input = true;
                Ok(ReadOutcome::Eof)
            }
        }
    }

    fn take_runtime_byte(&mut self) -> Option<i8> {
        if self.runtime_offset < self.runtime_input.size() {
            let value = self
                .runtime_input
                .get_value(self.runtime_offset)
                .expect("runtime_offset was checked against runtime_input.size()");
            self.runtime_offset += 1;
            Some(value)
        } else {
            None
        }
    }

    /// Calls the input hook (or the stock stdin hook, if none is set) to
    /// try to obtain more bytes, taking it out of `self` first so it can
    /// be handed `&mut self` without aliasing.
    fn pull_from_hook(&mut self) -> Result<(), Error> {
        let mut hook = self.input_hook.take();
        let result = match hook.as_mut() {
            Some(hook) => hook.provide_input(self),
            None => default_input_hook(self),
        };
        self.input_hook = hook;
        result.map_err(Error::Io)
    }

    fn eof_value(&self) -> Option<i8> {
        match self.config.on_end_of_input() {
            EndOfInputPolicy::DoNothing => None,
            EndOfInputPolicy::StoreZero => Some(0),
            EndOfInputPolicy::StoreEof => Some(-1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;

    fn program(source: &[u8]) -> Rc<Program> {
        Rc::new(load(source).unwrap())
    }

    #[test]
    fn increments_cell() {
        let mut interp = Interpreter::new(program(b"+++"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), 3);
    }

    #[test]
    fn loop_clears_cell() {
        let mut interp = Interpreter::new(program(b"+++++[-]"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), 0);
    }

    #[test]
    fn configuration_is_readable_and_replaceable() {
        let mut interp = Interpreter::new(program(b""));
        assert_eq!(interp.configuration(), Configuration::default());

        let replacement = Configuration::new(EndOfInputPolicy::StoreEof, true);
        interp.set_configuration(replacement);
        assert_eq!(interp.configuration(), replacement);
    }

    #[test]
    fn set_tape_replaces_it_outright() {
        let mut interp = Interpreter::new(program(b"+++"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), 3);

        interp.set_tape(Tape::new());
        assert_eq!(interp.tape().get_current_value(), 0);
    }

    #[test]
    fn set_program_swaps_the_attached_program_and_resets_embedded_input() {
        let mut interp = Interpreter::new(program(b",.!A"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), b'A' as i8);

        let replacement = program(b",.!B");
        interp.set_program(Rc::clone(&replacement));
        assert!(Rc::ptr_eq(interp.program(), &replacement));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), b'B' as i8);
    }

    #[test]
    fn double_nested_loop_multiplies() {
        // cell 0 = 3, cell 1 = 0; copy 3 * 2 = 6 into cell 1.
        let mut interp = Interpreter::new(program(b"+++[>++<-]"));
        interp.run().unwrap();
        interp.tape_for_test().move_right_by(1);
        assert_eq!(interp.tape_for_test().get_current_value(), 6);
    }

    #[test]
    fn output_hook_receives_bytes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let mut interp = Interpreter::new(program(b"+++."))
            .with_test_output_hook(move |value| {
                seen_clone.borrow_mut().push(value);
                Ok(())
            });
        interp.run().unwrap();
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn print_with_quantity_calls_hook_that_many_times() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let mut interp = Interpreter::new(program(b"++..."))
            .with_test_output_hook(move |value| {
                seen_clone.borrow_mut().push(value);
                Ok(())
            });
        interp.run().unwrap();
        assert_eq!(*seen.borrow(), vec![2, 2, 2]);
    }

    #[test]
    fn output_hook_failure_aborts_run() {
        let mut interp =
            Interpreter::new(program(b".")).with_test_output_hook(|_| Err("disk full".to_string()));
        let err = interp.run().unwrap_err();
        assert_eq!(err, Error::Io("disk full".to_string()));
    }

    #[test]
    fn embedded_input_feeds_comma() {
        let out = Rc::new(RefCell::new(Vec::new()));
        let out_clone = Rc::clone(&out);
        let mut interp = InterpreterBuilder::new()
            .with_output_hook(move |value: i8| {
                out_clone.borrow_mut().push(value);
                Ok(())
            })
            .build(program(b",.!A"));
        interp.run().unwrap();
        assert_eq!(*out.borrow(), vec![b'A' as i8]);
    }

    #[test]
    fn embedded_input_exhaustion_is_permanent_even_with_a_hook_present() {
        // The hook below would happily feed `z`, but since this program
        // carries embedded input, once it is drained the hook must never
        // be consulted.
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::StoreEof, false))
            .with_input_hook(|interp: &mut Interpreter| {
                interp.feed(ByteBuffer::from(&b"z"[..]));
                Ok(())
            })
            .build(program(b",,!A"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), -1);
    }

    #[test]
    fn end_of_input_store_zero() {
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::StoreZero, false))
            .with_input_hook(|_: &mut Interpreter| Ok(()))
            .build(program(b"+,"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), 0);
    }

    #[test]
    fn end_of_input_store_eof() {
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::StoreEof, false))
            .with_input_hook(|_: &mut Interpreter| Ok(()))
            .build(program(b"+,"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), -1);
    }

    #[test]
    fn end_of_input_do_nothing_leaves_cell() {
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::DoNothing, false))
            .with_input_hook(|_: &mut Interpreter| Ok(()))
            .build(program(b"+++,"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), 3);
    }

    #[test]
    fn hook_fed_buffer_is_consumed_before_asking_again() {
        let mut interp = InterpreterBuilder::new()
            .with_input_hook(|interp: &mut Interpreter| {
                interp.feed(ByteBuffer::from(&b"xy"[..]));
                Ok(())
            })
            .build(program(b",>,"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), b'y' as i8);
    }

    #[test]
    fn read_with_quantity_keeps_only_the_last_value() {
        let mut interp = InterpreterBuilder::new()
            .with_input_hook(|interp: &mut Interpreter| {
                interp.feed(ByteBuffer::from(&b"abc"[..]));
                Ok(())
            })
            .build(program(b",,,"));
        interp.run().unwrap();
        assert_eq!(interp.tape().get_current_value(), b'c' as i8);
    }

    #[test]
    fn debug_hook_runs_on_hash_when_enabled() {
        let count = Rc::new(RefCell::new(0u32));
        let count_clone = Rc::clone(&count);
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::DoNothing, true))
            .with_debug_hook(move |_: &Tape| {
                *count_clone.borrow_mut() += 1;
                Ok(())
            })
            .build(program(b"+#+#"));
        interp.run().unwrap();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn debug_hook_does_not_run_when_disabled() {
        let count = Rc::new(RefCell::new(0u32));
        let count_clone = Rc::clone(&count);
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::DoNothing, false))
            .with_debug_hook(move |_: &Tape| {
                *count_clone.borrow_mut() += 1;
                Ok(())
            })
            .build(program(b"+#+#"));
        interp.run().unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn debug_with_quantity_runs_once_per_folded_hash() {
        let count = Rc::new(RefCell::new(0u32));
        let count_clone = Rc::clone(&count);
        let mut interp = InterpreterBuilder::new()
            .with_config(Configuration::new(EndOfInputPolicy::DoNothing, true))
            .with_debug_hook(move |_: &Tape| {
                *count_clone.borrow_mut() += 1;
                Ok(())
            })
            .build(program(b"###"));
        interp.run().unwrap();
        assert_eq!(*count.borrow(), 3);
    }

    // Test-only helpers that don't belong on the public surface.
    impl Interpreter {
        fn with_test_output_hook(self, hook: impl OutputHook + 'static) -> Interpreter {
            InterpreterBuilder::new()
                .with_output_hook(hook)
                .build(self.program)
        }

        fn tape_for_test(&mut self) -> &mut Tape {
            &mut self.tape
        }
    }
}
