//! Maximal-munch lexer engine.
//!
//! The engine is driven by one anchored DFA compiled from the full list of
//! token patterns. A token is recognized by feeding bytes one at a time and
//! remembering the last state in which the DFA reported a match; when the
//! DFA dies (or input ends), the bytes past that match are pushed back and
//! the matched pattern wins. Among patterns matching the same lexeme the
//! first declared one wins, so callers keep their patterns order-sensitive.
//!
//! Tokens whose [`TokenDef::terminal`] is `None` are skip tokens: they are
//! consumed, positions advance over them, and scanning continues with the
//! next token. End of input yields one reserved end-of-input token instead
//! of an error.

use crate::error::{ParseError, Position};
use anyhow::{Context, Result};
use regex_automata::{
    Anchored, HalfMatch, Input,
    dfa::{Automaton, StartKind, dense},
    util::{primitives::StateID, syntax},
    MatchKind,
};
use smartstring::alias::String;
use std::io;
use std::mem;

/// One entry of the token table the lexer is built from.
#[derive(Debug, Clone)]
pub struct TokenDef {
    pub name: String,
    /// Regular expression for the lexeme, compiled anchored.
    pub pattern: String,
    /// Terminal column in the parse tables, or `None` for skip tokens.
    pub terminal: Option<usize>,
}

/// A recognized token: terminal id, lexeme text, and start position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub terminal: usize,
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone, Default)]
pub struct LexerStats {
    pub bytes: usize,
    pub matches: usize,
    pub unreads: usize,
}

/// Maximal-munch scanner over a byte source.
///
/// The input is any iterator of `io::Result<u8>` (e.g. `Read::bytes()`), read
/// synchronously and exactly once; bytes read past the end of a token are
/// kept in a pushback stack rather than re-read.
pub struct Lexer<I> {
    defs: Vec<TokenDef>,
    dfa: dense::DFA<Vec<u32>>,
    start: StateID,
    eof_terminal: usize,

    input: I,
    unread: Vec<u8>,
    buffer: Vec<u8>,
    position: Position,
    end_flag: bool,

    stats: LexerStats,
}

impl<I> Lexer<I>
where
    I: Iterator<Item = io::Result<u8>>,
{
    /// Compiles the combined token DFA and wraps `input`.
    ///
    /// `eof_terminal` is the terminal id reported for the reserved
    /// end-of-input token. Pattern compilation failures are reported here,
    /// before any input is read.
    pub fn try_new(defs: Vec<TokenDef>, eof_terminal: usize, input: I) -> Result<Self> {
        let patterns: Vec<&str> = defs.iter().map(|d| d.pattern.as_str()).collect();
        let dfa = dense::Builder::new()
            .configure(
                dense::DFA::config()
                    .match_kind(MatchKind::All)
                    .start_kind(StartKind::Anchored),
            )
            .syntax(syntax::Config::new().utf8(false))
            .build_many(&patterns)
            .context("failed to compile token patterns")?;
        let start = dfa
            .start_state_forward(&Input::new(&[]).anchored(Anchored::Yes))
            .context("failed to compute DFA start state")?;
        Ok(Self {
            defs,
            dfa,
            start,
            eof_terminal,
            input,
            unread: Vec::new(),
            buffer: Vec::new(),
            position: Position::start(),
            end_flag: false,
            stats: LexerStats::default(),
        })
    }

    pub fn stats(&self) -> LexerStats {
        self.stats.clone()
    }

    /// Position of the next byte the lexer will look at.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Produces the next non-skip token.
    ///
    /// Returns the reserved end-of-input token exactly once when the source
    /// is exhausted, then `None`. Fails with [`ParseError::Lexical`] when
    /// bytes remain but no pattern matches, positioned at the start of the
    /// unrecognized sequence.
    pub fn try_next(&mut self) -> Result<Option<Token>, ParseError> {
        loop {
            if self.end_flag {
                return Ok(None);
            }
            let start = self.position;
            match self.try_match()? {
                Some(pattern) => {
                    let bytes = mem::take(&mut self.buffer);
                    self.position.advance(&bytes);
                    let def = &self.defs[pattern];
                    log::trace!(
                        "matched {:?} at {}: {:?}",
                        def.name,
                        start,
                        std::string::String::from_utf8_lossy(&bytes),
                    );
                    if let Some(terminal) = def.terminal {
                        let text: String = match std::str::from_utf8(&bytes) {
                            Ok(s) => s.into(),
                            Err(_) => return Err(ParseError::Lexical(start)),
                        };
                        return Ok(Some(Token {
                            terminal,
                            text,
                            position: start,
                        }));
                    }
                    // skip token: keep scanning
                }
                None => {
                    self.end_flag = true;
                    return Ok(Some(Token {
                        terminal: self.eof_terminal,
                        text: String::new(),
                        position: start,
                    }));
                }
            }
        }
    }

    /// Runs the DFA for one lexeme. `Ok(Some(i))` leaves the lexeme in
    /// `self.buffer` and identifies the winning pattern; `Ok(None)` means
    /// clean end of input.
    ///
    /// Zero-length matches are rejected as lexical errors: a pattern that
    /// matches the empty string consumes no input, so accepting it would
    /// scan the same position forever.
    fn try_match(&mut self) -> Result<Option<usize>, ParseError> {
        self.stats.matches += 1;
        self.buffer.clear();
        let dfa = &self.dfa;
        let mut state = self.start;
        let mut last_match: Option<HalfMatch> = None;
        let mut i = 0;

        loop {
            let b = match self.unread.pop() {
                Some(b) => b,
                None => match self.input.next() {
                    Some(Ok(b)) => {
                        self.stats.bytes += 1;
                        b
                    }
                    Some(Err(source)) => {
                        return Err(ParseError::Io {
                            position: self.position,
                            source,
                        });
                    }
                    None => break,
                },
            };
            self.buffer.push(b);
            state = dfa.next_state(state, b);
            if dfa.is_special_state(state) {
                if dfa.is_match_state(state) {
                    last_match = Some(HalfMatch::new(dfa.match_pattern(state, 0), i));
                } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                    return match last_match {
                        Some(m) if m.offset() > 0 => {
                            self.pushback(i - m.offset() + 1);
                            Ok(Some(m.pattern().as_usize()))
                        }
                        _ => Err(ParseError::Lexical(self.position)),
                    };
                }
            }
            i += 1;
        }

        state = dfa.next_eoi_state(state);
        if dfa.is_match_state(state) {
            last_match = Some(HalfMatch::new(dfa.match_pattern(state, 0), i));
        }
        match last_match {
            Some(m) if m.offset() > 0 => {
                self.pushback(i - m.offset());
                Ok(Some(m.pattern().as_usize()))
            }
            _ if self.buffer.is_empty() => Ok(None),
            _ => Err(ParseError::Lexical(self.position)),
        }
    }

    /// Returns the trailing `n` buffered bytes to the pushback stack.
    fn pushback(&mut self, n: usize) {
        for _ in 0..n {
            match self.buffer.pop() {
                Some(b) => {
                    self.stats.unreads += 1;
                    self.unread.push(b);
                }
                None => break,
            }
        }
    }
}

/// Wraps an in-memory string as a lexer input.
pub fn str_input(s: &str) -> impl Iterator<Item = io::Result<u8>> + '_ {
    s.bytes().map(Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn defs() -> Vec<TokenDef> {
        vec![
            TokenDef {
                name: "int".into(),
                pattern: "int".into(),
                terminal: Some(0),
            },
            TokenDef {
                name: "ident".into(),
                pattern: "[a-zA-Z_][a-zA-Z0-9_]*".into(),
                terminal: Some(1),
            },
            TokenDef {
                name: "ws".into(),
                pattern: "[ \\t\\n]+".into(),
                terminal: None,
            },
        ]
    }

    fn collect(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::try_new(defs(), 99, str_input(input)).unwrap();
        let mut out = Vec::new();
        while let Some(t) = lexer.try_next().unwrap() {
            out.push(t);
        }
        out
    }

    #[test]
    fn maximal_munch_prefers_longest_lexeme() {
        init_logger();
        let toks = collect("integer");
        // one identifier, not `int` + `eger`
        assert_eq!(toks.len(), 2); // ident + eof
        assert_eq!(toks[0].terminal, 1);
        assert_eq!(toks[0].text, "integer");
        assert_eq!(toks[1].terminal, 99);
    }

    #[test]
    fn first_declared_pattern_wins_on_ties() {
        let toks = collect("int");
        assert_eq!(toks[0].terminal, 0);
        assert_eq!(toks[0].text, "int");
    }

    #[test]
    fn skip_tokens_never_surface() {
        let toks = collect("int  integer\nint");
        let ids: Vec<usize> = toks.iter().map(|t| t.terminal).collect();
        assert_eq!(ids, vec![0, 1, 0, 99]);
        // positions advanced over the skipped whitespace
        assert_eq!(toks[2].position.line, 2);
        assert_eq!(toks[2].position.column, 1);
    }

    #[test]
    fn eof_token_is_delivered_once() {
        let mut lexer = Lexer::try_new(defs(), 99, str_input("")).unwrap();
        let t = lexer.try_next().unwrap().unwrap();
        assert_eq!(t.terminal, 99);
        assert!(lexer.try_next().unwrap().is_none());
    }

    #[test]
    fn unrecognized_sequence_reports_start_position() {
        let mut lexer = Lexer::try_new(defs(), 99, str_input("int ?")).unwrap();
        assert_eq!(lexer.try_next().unwrap().unwrap().text, "int");
        let err = lexer.try_next().unwrap_err();
        match err {
            ParseError::Lexical(pos) => assert_eq!(pos.offset, 4),
            other => panic!("expected lexical error, got {other:?}"),
        }
    }

    #[test]
    fn zero_length_matches_are_a_lexical_error() {
        // A pattern matching the empty string consumes nothing, so the
        // scanner must fail instead of spinning on the same position.
        let defs = vec![
            TokenDef {
                name: "maybe".into(),
                pattern: "x*".into(),
                terminal: None,
            },
            TokenDef {
                name: "y".into(),
                pattern: "y".into(),
                terminal: Some(0),
            },
        ];
        let mut lexer = Lexer::try_new(defs, 99, str_input("zy")).unwrap();
        let err = lexer.try_next().unwrap_err();
        assert!(matches!(err, ParseError::Lexical(_)));
    }

    #[test]
    fn io_errors_are_propagated() {
        let input = std::iter::once(Err(io::Error::new(io::ErrorKind::Other, "boom")));
        let mut lexer = Lexer::try_new(defs(), 99, input).unwrap();
        assert!(matches!(
            lexer.try_next().unwrap_err(),
            ParseError::Io { .. }
        ));
    }
}
