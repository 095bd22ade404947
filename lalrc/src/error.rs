//! Source positions and runtime error types shared by the lexer and parser
//! engines.
//!
//! Construction-time failures (bad grammars, table conflicts) live in the
//! generator crate; everything here describes what can go wrong while a
//! generated parser consumes a concrete input. Every runtime error carries
//! the position at which the input became unusable, so a caller can point
//! at the offending spot and retry with corrected input; the tables
//! themselves are immutable and survive any number of failed parses.

use smartstring::alias::String;
use std::fmt;
use thiserror::Error;

/// An absolute location in the input: byte offset plus 1-based line/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// Byte offset from the start of the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, counted in characters.
    pub column: usize,
}

impl Position {
    #[inline]
    pub const fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// The position of the first input byte.
    #[inline]
    pub const fn start() -> Self {
        Self::new(0, 1, 1)
    }

    /// Advances this position over `bytes`, counting newlines and treating
    /// UTF-8 continuation bytes as zero-width so columns stay
    /// character-based.
    pub fn advance(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.offset += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (offset {})", self.line, self.column, self.offset)
    }
}

/// Errors produced while lexing or parsing one concrete input.
///
/// `Lexical` and `Io` originate in the lexer engine; the rest come from the
/// shift-reduce driver. `Table` indicates an inconsistency in the parse
/// tables themselves and is surfaced rather than silently accepted, since it
/// points at a construction bug rather than bad input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No token pattern matches the accumulated text.
    #[error("unrecognized character sequence at {0}")]
    Lexical(Position),

    /// The underlying byte source failed.
    #[error("read failed at {position}")]
    Io {
        position: Position,
        #[source]
        source: std::io::Error,
    },

    /// No action exists for the current token in the current state.
    #[error("unexpected token {token:?} at {position}")]
    Syntax { token: String, position: Position },

    /// The lexer was exhausted after already delivering end-of-input.
    #[error("unexpected end of input at {0}")]
    UnexpectedEnd(Position),

    /// Accept fired with more than one value left on the value stack.
    #[error("trailing unconsumed structure at {0}")]
    Trailing(Position),

    /// A user semantic action returned an error.
    #[error("semantic action failed at {position}")]
    Semantic {
        position: Position,
        #[source]
        source: anyhow::Error,
    },

    /// The parse tables are internally inconsistent.
    #[error("parse table is inconsistent: {0}")]
    Table(String),
}

impl ParseError {
    /// The input position the error refers to, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::Lexical(p)
            | ParseError::UnexpectedEnd(p)
            | ParseError::Trailing(p) => Some(*p),
            ParseError::Io { position, .. }
            | ParseError::Syntax { position, .. }
            | ParseError::Semantic { position, .. } => Some(*position),
            ParseError::Table(_) => None,
        }
    }
}
