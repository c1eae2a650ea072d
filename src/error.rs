//! The error taxonomy surfaced at the loader/interpreter boundary.

use thiserror::Error;

/// Failures that can escape [`crate::loader::load`] or
/// [`crate::interpreter::Interpreter::run`].
///
/// Only two kinds exist, per the contract: a structurally invalid source
/// (or a runtime bracket mismatch), and an I/O failure reported by a hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Brackets in the source did not balance, or a `]` was reached at
    /// runtime with an empty return stack (or the program ended with one
    /// still open).
    #[error("unbalanced brackets")]
    UnbalancedBrackets,

    /// A hook reported failure. Carries the hook's message if it provided
    /// one, otherwise a generic message synthesised by the interpreter.
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Builds an [`Error::Io`] with the generic message used when a hook
    /// fails without describing why.
    pub fn unknown_io() -> Error {
        Error::Io("Unknown I/O error".to_string())
    }
}

/// Failures from misusing a [`crate::buffer::ByteBuffer`] directly.
///
/// This is deliberately a separate enum from [`Error`]: it describes a
/// programmer error at the buffer layer (an out-of-range index, a
/// mismatched bulk-copy length), not a failure in the loader/interpreter
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// `get_value`/`set_value` was called with a position outside
    /// `0..size()`.
    #[error("index {index} is out of bounds for a buffer of size {size}")]
    OutOfBounds {
        /// The offending position.
        index: u64,
        /// The buffer's fixed size.
        size: u64,
    },

    /// `set_contents` was called with a slice whose length does not equal
    /// the buffer's size.
    #[error("expected {expected} bytes to fill the buffer, got {got}")]
    SizeMismatch {
        /// The buffer's fixed size.
        expected: u64,
        /// The length of the slice that was passed in.
        got: usize,
    },
}
