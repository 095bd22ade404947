//! Grammar extender: re-expresses each production as one instance per
//! state context it can be recognized through.
//!
//! Every item with dot 0 in every state spawns an [`ExtendedRule`] whose
//! `path` replays the shift sequence through the transition table:
//! `[entry, after sym 1, .., after sym n, goto(entry, lhs)]`, i.e.
//! production length + 2 indices. Epsilon instances get the degenerate
//! `[entry, goto(entry, lhs)]`. FIRST/FOLLOW are computed over these
//! instances, which is what makes the resulting table LALR rather than
//! SLR: the same nonterminal in two contexts gets two independent FOLLOW
//! sets.

use crate::automaton::Automaton;
use crate::grammar::Grammar;
use std::io::{self, Write};

/// One state-indexed instance of a production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRule {
    /// Index into [`Grammar::prods`].
    pub prod: usize,
    /// State path: entry, one state per shifted symbol, then the goto
    /// target of the left-hand side from the entry state.
    pub path: Vec<usize>,
}

impl ExtendedRule {
    /// State the instance starts recognition in.
    #[inline]
    pub fn entry(&self) -> usize {
        self.path[0]
    }

    /// Goto destination of the left-hand side, i.e. where recognition of
    /// this instance lands after the reduce.
    #[inline]
    pub fn target(&self) -> usize {
        self.path[self.path.len() - 1]
    }

    /// State holding the completed item, i.e. the state the reduce fires from.
    #[inline]
    pub fn reduce_from(&self) -> usize {
        self.path[self.path.len() - 2]
    }
}

/// Emits one instance per (state, dot-0 item) pair.
pub fn extend(grammar: &Grammar, automaton: &Automaton) -> Vec<ExtendedRule> {
    let mut extended = Vec::new();
    for (index, state) in automaton.states.iter().enumerate() {
        for &item in state {
            if item.dot != 0 {
                continue;
            }
            let prod = &grammar.prods[item.prod];
            let mut path = Vec::with_capacity(prod.rhs.len() + 2);
            let mut current = index;
            path.push(current);
            for &sym in &prod.rhs {
                current = *automaton.transitions[current]
                    .get(&sym)
                    .unwrap_or_else(|| unreachable!("transition exists for every shifted symbol"));
                path.push(current);
            }
            // The synthetic start never appears right of a dot, so it has
            // no goto edge; its target slot is unused.
            let target = if item.prod == 0 {
                index
            } else {
                *automaton.transitions[index]
                    .get(&prod.lhs)
                    .unwrap_or_else(|| {
                        unreachable!("closure guarantees a goto edge for every dot-0 lhs")
                    })
            };
            path.push(target);
            extended.push(ExtendedRule {
                prod: item.prod,
                path,
            });
        }
    }
    extended
}

/// Renders one instance, e.g. `0 n 4 -> 0 v 2 assign 3 e`.
pub fn display_rule(grammar: &Grammar, rule: &ExtendedRule) -> String {
    let prod = &grammar.prods[rule.prod];
    let mut out = format!(
        "{} {} {} ->",
        rule.entry(),
        grammar.name(prod.lhs),
        rule.target()
    );
    for (i, &sym) in prod.rhs.iter().enumerate() {
        out.push_str(&format!(" {} {}", rule.path[i], grammar.name(sym)));
    }
    if prod.rhs.is_empty() {
        out.push_str(" !EPSILON");
    }
    out
}

pub fn write_extended<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    extended: &[ExtendedRule],
) -> io::Result<()> {
    writeln!(out, "{} extended rules", extended.len())?;
    for rule in extended {
        writeln!(out, "    {}", display_rule(grammar, rule))?;
    }
    Ok(())
}
