//! # lalrc
//!
//! Runtime engines for parsers produced by the `lalrc-gen` grammar
//! compiler:
//!
//! - [`lexer`]: a maximal-munch tokenizer driven by one anchored DFA
//!   compiled from the grammar's token patterns, with skip-token handling
//!   and byte/line/column position tracking.
//! - [`parser`]: a table-driven shift-reduce driver over the immutable
//!   [`ParseTables`] the generator emits, invoking caller-supplied
//!   [`Semantics`] actions by production index on every reduce.
//! - [`error`]: the runtime error taxonomy ([`ParseError`]) and source
//!   positions ([`Position`]).
//!
//! Everything here is read-only after construction: a failed parse reports
//! its position and leaves both the tables and the lexer definitions
//! reusable for a corrected input.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{ParseError, Position};
pub use lexer::{str_input, Lexer, LexerStats, Token, TokenDef};
pub use parser::{Action, ParseTables, Parser, ParserStats, Prod, Semantics};
