//! Construction-time error taxonomy.
//!
//! Grammar errors are detected by validation before any automaton work
//! starts; conflict errors are detected while the ACTION/GOTO table is
//! filled. All of them are fatal: no partial tables are ever produced.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// A production references a name that is neither a terminal nor
    /// defined by any production.
    #[error("symbol {symbol:?} referenced by rule {rule:?} cannot be found")]
    UndefinedSymbol { rule: String, symbol: String },

    /// No production defines the declared start rule.
    #[error("no production defines start rule {start:?}")]
    MissingStartRule { start: String },

    /// Two alternatives of the same nonterminal declare different result
    /// types.
    #[error("alternatives of {rule:?} declare different result types: {first:?} vs {second:?}")]
    InconsistentReturnType {
        rule: String,
        first: String,
        second: String,
    },

    /// A production has no semantic-action code.
    #[error("production for {rule:?} has no semantic action")]
    EmptyAction { rule: String },

    /// A token name was declared more than once.
    #[error("token name collision: {name:?}")]
    DuplicateToken { name: String },

    /// A declaration uses one of the reserved names (`!Start`, `!EPSILON`,
    /// `!EOF`), the reserved `!` prefix, or a declaration keyword of the
    /// textual format (`token`, `skip`, `start`).
    #[error("name {name:?} is reserved")]
    ReservedName { name: String },

    /// A token or rule name is not a plain identifier.
    #[error("name {name:?} is not an identifier")]
    InvalidName { name: String },

    /// A grammar rule and a token share a name.
    #[error("{name:?} names both a token and a grammar rule")]
    SymbolCollision { name: String },

    /// A token pattern failed to compile.
    #[error("token {name:?} has an invalid pattern")]
    BadPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// A token pattern can match the empty string. Such a match consumes
    /// no input, so the lexer could never get past it.
    #[error("token {name:?} matches the empty string")]
    EmptyMatchPattern { name: String },

    /// `!EPSILON` must stand alone as a production's whole right-hand side.
    #[error("!EPSILON must be the only symbol of its production in rule {rule:?}")]
    EpsilonPlacement { rule: String },

    /// A state admits both a shift and a reduce on the same lookahead.
    #[error("shift/reduce conflict in state {state} on {symbol:?}")]
    ShiftReduceConflict { state: usize, symbol: String },

    /// A state admits two different reductions on the same lookahead.
    #[error("reduce/reduce conflict in state {state} on {symbol:?}")]
    ReduceReduceConflict { state: usize, symbol: String },

    /// A line of the textual grammar description was not understood.
    #[error("unrecognized grammar line {line}: {text:?}")]
    Input { line: usize, text: String },

    /// The textual grammar description never declares a start rule.
    #[error("grammar description declares no start rule")]
    NoStartDeclaration,
}
