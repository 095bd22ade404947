//! ACTION/GOTO table construction.
//!
//! Shift and goto entries come straight from the automaton's transition
//! edges: terminal columns shift, nonterminal columns goto. Reduce entries
//! are placed per extended rule, in the state its completed item lives in,
//! on every terminal in its group's FOLLOW set. The synthetic start rule
//! reduces as Accept on end of input instead.
//!
//! Conflicts abort construction. Two reduces of the same production in one
//! cell are the normal LALR merge of indistinguishable instances; anything
//! else (shift against reduce, or two different productions) means the
//! grammar is not LALR(1) and no table is produced.

use crate::automaton::Automaton;
use crate::error::CompileError;
use crate::extend::ExtendedRule;
use crate::grammar::Grammar;
use crate::sets::FollowSets;
use lalrc::{Action, ParseTables, Prod};
use std::io::{self, Write};

pub fn build(
    grammar: &Grammar,
    automaton: &Automaton,
    extended: &[ExtendedRule],
    follows: &FollowSets,
) -> Result<ParseTables, CompileError> {
    let n_states = automaton.states.len();
    let n_symbols = grammar.n_symbols();
    let mut actions = vec![vec![Action::Error; n_symbols]; n_states];

    for (state, row) in automaton.transitions.iter().enumerate() {
        for (&sym, &to) in row {
            actions[state][sym] = if grammar.is_terminal(sym) {
                Action::Shift(to)
            } else {
                Action::Goto(to)
            };
        }
    }

    for (i, rule) in extended.iter().enumerate() {
        let state = rule.reduce_from();
        let wanted = if rule.prod == 0 {
            Action::Accept
        } else {
            Action::Reduce(rule.prod)
        };
        for &terminal in &follows.follow[follows.of_rule[i]] {
            let current = actions[state][terminal];
            match current {
                Action::Error => actions[state][terminal] = wanted,
                _ if current == wanted => {} // merged instances
                Action::Shift(_) | Action::Goto(_) => {
                    return Err(CompileError::ShiftReduceConflict {
                        state,
                        symbol: grammar.name(terminal).to_owned(),
                    });
                }
                Action::Reduce(_) | Action::Accept => {
                    return Err(CompileError::ReduceReduceConflict {
                        state,
                        symbol: grammar.name(terminal).to_owned(),
                    });
                }
            }
        }
    }

    let prods = grammar
        .prods
        .iter()
        .map(|p| Prod {
            lhs: p.lhs,
            len: p.rhs.len(),
        })
        .collect();
    let symbols = (0..n_symbols)
        .map(|s| grammar.name(s).into())
        .collect();

    Ok(ParseTables {
        actions,
        prods,
        symbols,
        eof: grammar.eof(),
    })
}

/// Writes the table as one row per state, blank cells elided.
pub fn write_table<W: Write>(out: &mut W, tables: &ParseTables) -> io::Result<()> {
    writeln!(out, "{} states x {} symbols", tables.n_states(), tables.symbols.len())?;
    for state in 0..tables.n_states() {
        write!(out, "state {:4}:", state)?;
        for (sym, name) in tables.symbols.iter().enumerate() {
            match tables.action(state, sym) {
                Action::Error => {}
                Action::Shift(to) => write!(out, " {}:s{}", name, to)?,
                Action::Reduce(p) => write!(out, " {}:r{}", name, p)?,
                Action::Goto(to) => write!(out, " {}:g{}", name, to)?,
                Action::Accept => write!(out, " {}:acc", name)?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
