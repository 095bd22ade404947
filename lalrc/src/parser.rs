//! Table-driven shift-reduce parser engine.
//!
//! The driver owns two parallel stacks: state indices and semantic values.
//! Every step looks up `ACTION[top state][current terminal]`: `Shift` pushes
//! the token's value and advances the lexer, `Reduce` pops one production's
//! worth of values, hands them to the caller's [`Semantics`] implementation,
//! and follows the `Goto` for the production's nonterminal, `Accept` stops
//! with the single remaining value as the parse result. Semantic actions are
//! dispatched by production index: the binding is fixed when the tables are
//! built, there is no name-based lookup at parse time.
//!
//! The tables are read-only; a failed parse leaves them intact and the
//! driver resets its stacks on the next [`Parser::parse`] call.

use crate::error::ParseError;
use crate::lexer::{Lexer, Token};
use anyhow::Result;
use smartstring::alias::String;
use std::io;

/// One cell of the ACTION/GOTO table.
///
/// `Shift` and `Goto` carry a destination state, `Reduce` the index of the
/// production to apply. `Error` marks cells for which the grammar defines no
/// continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Error,
    Accept,
    Shift(usize),
    Reduce(usize),
    Goto(usize),
}

/// Production metadata the driver needs at reduce time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prod {
    /// Symbol id of the nonterminal this production defines.
    pub lhs: usize,
    /// Number of right-hand-side symbols (0 for epsilon productions).
    pub len: usize,
}

/// The immutable data product of table construction.
///
/// Rows are states, columns are symbol ids: nonterminals first, then
/// terminals, with the reserved end-of-input terminal in the last column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTables {
    pub actions: Vec<Vec<Action>>,
    pub prods: Vec<Prod>,
    /// Symbol names indexed by symbol id, for diagnostics.
    pub symbols: Vec<String>,
    /// Symbol id of the end-of-input terminal.
    pub eof: usize,
}

impl ParseTables {
    #[inline]
    pub fn action(&self, state: usize, symbol: usize) -> Action {
        self.actions[state][symbol]
    }

    pub fn symbol_name(&self, symbol: usize) -> &str {
        self.symbols.get(symbol).map(|s| s.as_str()).unwrap_or("?")
    }

    pub fn n_states(&self) -> usize {
        self.actions.len()
    }

    /// Structural consistency check: every state referenced by an action
    /// exists, every reduced production exists, and rows are as wide as the
    /// symbol table.
    pub fn check(&self) -> Result<(), ParseError> {
        let n_states = self.actions.len();
        for (state, row) in self.actions.iter().enumerate() {
            if row.len() != self.symbols.len() {
                return Err(ParseError::Table(
                    format!("state {} row width {} != {} symbols", state, row.len(), self.symbols.len()).into(),
                ));
            }
            for (symbol, action) in row.iter().enumerate() {
                match *action {
                    Action::Shift(s) | Action::Goto(s) if s >= n_states => {
                        return Err(ParseError::Table(
                            format!("state {} on {:?}: target {} out of range", state, self.symbol_name(symbol), s).into(),
                        ));
                    }
                    Action::Reduce(p) if p >= self.prods.len() => {
                        return Err(ParseError::Table(
                            format!("state {} on {:?}: production {} out of range", state, self.symbol_name(symbol), p).into(),
                        ));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Caller-supplied semantic actions, dispatched by production index.
///
/// `reduce` receives the popped values in grammar order (index 0 is the
/// leftmost right-hand-side symbol); for epsilon productions `args` is
/// empty. Failures are wrapped in [`ParseError::Semantic`] with the
/// position of the current lookahead.
pub trait Semantics {
    type Value;

    /// Converts a shifted token into a stack value.
    fn shift(&mut self, token: Token) -> Result<Self::Value>;

    /// Applies the semantic action of production `prod` to `args`.
    fn reduce(&mut self, prod: usize, args: Vec<Self::Value>) -> Result<Self::Value>;
}

#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
}

/// The shift-reduce driver. Reusable: each [`Parser::parse`] call starts
/// from a clean stack pair over the same tables.
pub struct Parser<'t, S: Semantics> {
    tables: &'t ParseTables,
    states: Vec<usize>,
    values: Vec<S::Value>,
    stats: ParserStats,
}

impl<'t, S: Semantics> Parser<'t, S> {
    pub fn new(tables: &'t ParseTables) -> Self {
        Self {
            tables,
            states: Vec::new(),
            values: Vec::new(),
            stats: ParserStats::default(),
        }
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    /// Parses one complete input to its semantic result.
    pub fn parse<I>(&mut self, lexer: &mut Lexer<I>, semantics: &mut S) -> Result<S::Value, ParseError>
    where
        I: Iterator<Item = io::Result<u8>>,
    {
        self.states.clear();
        self.values.clear();
        self.states.push(0);

        let mut token = self.next_token(lexer)?;
        loop {
            let state = self.states[self.states.len() - 1];
            let action = self.tables.action(state, token.terminal);
            log::trace!(
                "state {} on {:?} at {}: {:?}",
                state,
                self.tables.symbol_name(token.terminal),
                token.position,
                action,
            );
            match action {
                Action::Shift(next) => {
                    let position = token.position;
                    let value = semantics
                        .shift(token)
                        .map_err(|source| ParseError::Semantic { position, source })?;
                    self.values.push(value);
                    self.states.push(next);
                    self.stats.shifts += 1;
                    token = self.next_token(lexer)?;
                }

                Action::Reduce(prod) => {
                    let Prod { lhs, len } = self.tables.prods[prod].clone();
                    if self.values.len() < len {
                        return Err(ParseError::Table("value stack underflow".into()));
                    }
                    let args = self.values.split_off(self.values.len() - len);
                    self.states.truncate(self.states.len() - len);
                    let value = semantics.reduce(prod, args).map_err(|source| {
                        ParseError::Semantic {
                            position: token.position,
                            source,
                        }
                    })?;
                    self.values.push(value);
                    let top = self.states[self.states.len() - 1];
                    match self.tables.action(top, lhs) {
                        Action::Goto(next) => self.states.push(next),
                        _ => {
                            return Err(ParseError::Table(
                                format!(
                                    "no goto for {:?} in state {}",
                                    self.tables.symbol_name(lhs),
                                    top
                                )
                                .into(),
                            ));
                        }
                    }
                    self.stats.reductions += 1;
                }

                Action::Accept => {
                    if self.values.len() != 1 {
                        return Err(ParseError::Trailing(token.position));
                    }
                    return self
                        .values
                        .pop()
                        .ok_or_else(|| ParseError::Table("empty value stack on accept".into()));
                }

                Action::Error | Action::Goto(_) => {
                    return Err(ParseError::Syntax {
                        token: self.tables.symbol_name(token.terminal).into(),
                        position: token.position,
                    });
                }
            }
        }
    }

    fn next_token<I>(&mut self, lexer: &mut Lexer<I>) -> Result<Token, ParseError>
    where
        I: Iterator<Item = io::Result<u8>>,
    {
        match lexer.try_next()? {
            Some(token) => {
                self.stats.tokens += 1;
                Ok(token)
            }
            None => Err(ParseError::UnexpectedEnd(lexer.position())),
        }
    }
}
