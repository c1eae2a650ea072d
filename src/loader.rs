//! Turns raw source bytes into a [`crate::program::Program`].
//!
//! Loading is two passes over the code prefix (everything before a `!`
//! delimiter, or the whole buffer if there is none): a bracket-balance
//! check, then a recursive-descent parse that folds adjacent runs of the
//! same operator into one instruction carrying a `quantity`.

use crate::error::Error;
use crate::instruction::{Instruction, InstructionKind};
use crate::program::Program;

const OPEN: u8 = b'[';
const CLOSE: u8 = b']';
const PLUS: u8 = b'+';
const MINUS: u8 = b'-';
const LEFT: u8 = b'<';
const RIGHT: u8 = b'>';
const DOT: u8 = b'.';
const COMMA: u8 = b',';
const HASH: u8 = b'#';
const EMBED: u8 = b'!';

/// Parses `source` into a [`Program`].
///
/// If `source` contains a `!` byte, everything before it is parsed as
/// code and everything after becomes the program's embedded input; code
/// with no `!` has an empty embedded input buffer. Bytes outside the ten
/// recognised glyphs are comments and are skipped.
///
/// Returns [`Error::UnbalancedBrackets`] if `[`/`]` nesting in the code
/// prefix does not close exactly.
pub fn load(source: &[u8]) -> Result<Program, Error> {
    let (code, input_bytes) = match source.iter().position(|&b| b == EMBED) {
        Some(idx) => (&source[..idx], &source[idx + 1..]),
        None => (source, &source[0..0]),
    };

    check_balance(code)?;

    let mut cursor = Cursor { bytes: code, pos: 0 };
    let (nodes, closed) = parse_sequence(&mut cursor);
    debug_assert!(!closed, "a balanced code prefix never closes at the top level");

    Ok(Program::new(link(nodes), input_bytes.into()))
}

/// Step 1: scans `code` counting `[` as +1 and `]` as -1. Fails if the
/// running count ever goes negative, or isn't exactly zero at the end.
fn check_balance(code: &[u8]) -> Result<(), Error> {
    let mut depth: i64 = 0;
    for &b in code {
        match b {
            OPEN => depth += 1,
            CLOSE => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::UnbalancedBrackets);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::UnbalancedBrackets);
    }
    Ok(())
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// Chains a flat list of (as yet unlinked) instructions into the owned
/// `next`-linked tree, last to first.
fn link(mut nodes: Vec<Instruction>) -> Option<Box<Instruction>> {
    let mut tail: Option<Box<Instruction>> = None;
    while let Some(mut node) = nodes.pop() {
        if let Some(next) = tail.take() {
            node.set_next(next);
        }
        tail = Some(Box::new(node));
    }
    tail
}

/// Step 2: parses a flat run of instructions until EOF or a `]`.
///
/// Having already passed the balance check, a `]` always has a matching
/// `[` above it, so this never needs to report failure itself. Returns
/// the instructions in program order, unlinked, and `true` if a `]` was
/// found and consumed (appended as a trailing `LoopEnd`), or `false` if
/// it ran to EOF (only possible at the top level).
fn parse_sequence(cursor: &mut Cursor) -> (Vec<Instruction>, bool) {
    let mut nodes = Vec::new();

    loop {
        match cursor.peek() {
            None => {
                if nodes.is_empty() {
                    nodes.push(Instruction::new(InstructionKind::Nop, 1));
                }
                return (nodes, false);
            }
            Some(CLOSE) => {
                cursor.advance();
                nodes.push(Instruction::new(InstructionKind::LoopEnd, 1));
                return (nodes, true);
            }
            Some(OPEN) => {
                cursor.advance();
                let (body, _closed) = parse_sequence(cursor);
                nodes.push(Instruction::new_loop_begin(link(body)));
            }
            Some(PLUS) => nodes.push(fold(cursor, PLUS, InstructionKind::Increase)),
            Some(MINUS) => nodes.push(fold(cursor, MINUS, InstructionKind::Decrease)),
            Some(RIGHT) => nodes.push(fold(cursor, RIGHT, InstructionKind::MoveRight)),
            Some(LEFT) => nodes.push(fold(cursor, LEFT, InstructionKind::MoveLeft)),
            Some(DOT) => nodes.push(fold(cursor, DOT, InstructionKind::Print)),
            Some(COMMA) => nodes.push(fold(cursor, COMMA, InstructionKind::Read)),
            Some(HASH) => nodes.push(fold(cursor, HASH, InstructionKind::Debug)),
            Some(_) => {
                cursor.advance();
            }
        }
    }
}

/// Consumes the maximal run of adjacent `glyph` bytes at the cursor and
/// builds one instruction of `kind` with that count as its quantity.
fn fold(cursor: &mut Cursor, glyph: u8, kind: InstructionKind) -> Instruction {
    let mut quantity: u64 = 0;
    while cursor.peek() == Some(glyph) {
        quantity += 1;
        cursor.advance();
    }
    Instruction::new(kind, quantity)
}
