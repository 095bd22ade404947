//! FIRST and FOLLOW computation.
//!
//! FIRST is the usual per-symbol fixed point, with nullability tracked in a
//! parallel vector instead of an epsilon member. FOLLOW is computed over the
//! extended rules, with instances pooled into groups keyed by
//! `(lhs, entry, target)`; instances in one group are indistinguishable to
//! the table builder, and pooling them keeps the dependency graph small.
//! Trailing-position inheritance (`FOLLOW(B) ⊇ FOLLOW(A)` when `A -> .. B t`
//! with `t` nullable) is resolved by iterating the inheritance edges to a
//! fixed point, which handles inheritance cycles without any special casing:
//! every group in a cycle converges to the union of the cycle's sets.

use crate::extend::ExtendedRule;
use crate::grammar::Grammar;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// FIRST sets and nullability, indexed by symbol id. Terminals are their own
/// FIRST and never nullable.
#[derive(Debug, Clone)]
pub struct FirstSets {
    pub first: Vec<BTreeSet<usize>>,
    pub nullable: Vec<bool>,
}

impl FirstSets {
    /// FIRST of a symbol sequence, plus whether the whole sequence can
    /// derive the empty string.
    pub fn seq(&self, syms: &[usize]) -> (BTreeSet<usize>, bool) {
        let mut first = BTreeSet::new();
        for &sym in syms {
            first.extend(self.first[sym].iter().copied());
            if !self.nullable[sym] {
                return (first, false);
            }
        }
        (first, true)
    }
}

pub fn first_sets(grammar: &Grammar) -> FirstSets {
    let n = grammar.n_symbols();
    let mut first = vec![BTreeSet::new(); n];
    let mut nullable = vec![false; n];
    for sym in 0..n {
        if grammar.is_terminal(sym) {
            first[sym].insert(sym);
        }
    }
    loop {
        let mut changed = false;
        for prod in &grammar.prods {
            let mut all_nullable = true;
            for &sym in &prod.rhs {
                let add: Vec<usize> = first[sym]
                    .iter()
                    .copied()
                    .filter(|t| !first[prod.lhs].contains(t))
                    .collect();
                if !add.is_empty() {
                    first[prod.lhs].extend(add);
                    changed = true;
                }
                if !nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[prod.lhs] {
                nullable[prod.lhs] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    FirstSets { first, nullable }
}

/// FOLLOW sets over extended-rule groups.
#[derive(Debug, Clone)]
pub struct FollowSets {
    /// `(lhs, entry, target)` to group index.
    pub groups: IndexMap<(usize, usize, usize), usize>,
    /// FOLLOW terminals per group.
    pub follow: Vec<BTreeSet<usize>>,
    /// Group index of each extended rule, parallel to the extended list.
    pub of_rule: Vec<usize>,
}

pub fn follow_sets(
    grammar: &Grammar,
    extended: &[ExtendedRule],
    firsts: &FirstSets,
) -> FollowSets {
    let mut groups: IndexMap<(usize, usize, usize), usize> = IndexMap::new();
    let mut of_rule = Vec::with_capacity(extended.len());
    for rule in extended {
        let key = (grammar.prods[rule.prod].lhs, rule.entry(), rule.target());
        let next = groups.len();
        of_rule.push(*groups.entry(key).or_insert(next));
    }

    let mut follow = vec![BTreeSet::new(); groups.len()];

    // End of input follows every instance of the synthetic start.
    for (i, rule) in extended.iter().enumerate() {
        if rule.prod == 0 {
            follow[of_rule[i]].insert(grammar.eof());
        }
    }

    // Direct contributions from the suffix after each nonterminal
    // occurrence; inheritance edges where the suffix is nullable.
    // `inherits[g]` lists the groups whose FOLLOW must include FOLLOW(g).
    let mut inherits: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    for (i, rule) in extended.iter().enumerate() {
        let prod = &grammar.prods[rule.prod];
        for (pos, &sym) in prod.rhs.iter().enumerate() {
            if grammar.is_terminal(sym) {
                continue;
            }
            // The occurrence is recognized from path[pos] and lands in
            // path[pos + 1], which identifies its instance group.
            let sub = *groups
                .get(&(sym, rule.path[pos], rule.path[pos + 1]))
                .unwrap_or_else(|| {
                    unreachable!("closure spawns dot-0 items for every pointed nonterminal")
                });
            let (tail_first, tail_nullable) = firsts.seq(&prod.rhs[pos + 1..]);
            follow[sub].extend(tail_first);
            if tail_nullable && sub != of_rule[i] {
                inherits[of_rule[i]].push(sub);
            }
        }
    }

    loop {
        let mut changed = false;
        for g in 0..inherits.len() {
            for k in 0..inherits[g].len() {
                let sub = inherits[g][k];
                let add: Vec<usize> = follow[g]
                    .iter()
                    .copied()
                    .filter(|t| !follow[sub].contains(t))
                    .collect();
                if !add.is_empty() {
                    follow[sub].extend(add);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    FollowSets {
        groups,
        follow,
        of_rule,
    }
}

pub fn write_first<W: Write>(out: &mut W, grammar: &Grammar, firsts: &FirstSets) -> io::Result<()> {
    for sym in 0..grammar.n_nonterminals {
        let names: Vec<&str> = firsts.first[sym].iter().map(|&t| grammar.name(t)).collect();
        let mark = if firsts.nullable[sym] { " (nullable)" } else { "" };
        writeln!(
            out,
            "FIRST({}) = {{ {} }}{}",
            grammar.name(sym),
            names.join(" "),
            mark
        )?;
    }
    Ok(())
}

pub fn write_follow<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    follows: &FollowSets,
) -> io::Result<()> {
    for (&(lhs, entry, target), &g) in &follows.groups {
        let names: Vec<&str> = follows.follow[g].iter().map(|&t| grammar.name(t)).collect();
        writeln!(
            out,
            "FOLLOW({} {} {}) = {{ {} }}",
            entry,
            grammar.name(lhs),
            target,
            names.join(" ")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton;
    use crate::extend;
    use crate::grammar::{GrammarSpec, RuleSpec, TokenSpec, EPSILON};

    fn pipeline(
        rules: Vec<RuleSpec>,
        tokens: Vec<TokenSpec>,
        start: &str,
    ) -> (Grammar, Vec<ExtendedRule>, FirstSets, FollowSets) {
        let grammar = Grammar::try_new(&GrammarSpec {
            tokens,
            rules,
            start: start.to_owned(),
        })
        .unwrap();
        let automaton = automaton::build(&grammar);
        let extended = extend::extend(&grammar, &automaton);
        let firsts = first_sets(&grammar);
        let follows = follow_sets(&grammar, &extended, &firsts);
        (grammar, extended, firsts, follows)
    }

    #[test]
    fn first_handles_nullable_heads() {
        let (g, _, firsts, _) = pipeline(
            vec![
                RuleSpec::new("s", &["list", "y"], "$0", "S"),
                RuleSpec::new("list", &["x", "list"], "$0", "L"),
                RuleSpec::new("list", &[EPSILON], "0", "L"),
            ],
            vec![TokenSpec::new("x", "x"), TokenSpec::new("y", "y")],
            "s",
        );
        let list = g.symbols.idx("list").unwrap();
        let s = g.symbols.idx("s").unwrap();
        let x = g.symbols.idx("x").unwrap();
        let y = g.symbols.idx("y").unwrap();
        assert!(firsts.nullable[list]);
        assert!(!firsts.nullable[s]);
        assert_eq!(firsts.first[list], BTreeSet::from([x]));
        // the nullable head lets `y` through
        assert_eq!(firsts.first[s], BTreeSet::from([x, y]));
    }

    #[test]
    fn follow_distinguishes_contexts() {
        // The classic grammar that is LALR(1) but not SLR(1): whether `=`
        // may follow a reduced `v` depends on which state the instance was
        // entered from.
        let (g, _, _, follows) = pipeline(
            vec![
                RuleSpec::new("n", &["v", "assign", "e"], "$0", "N"),
                RuleSpec::new("n", &["e"], "$0", "N"),
                RuleSpec::new("e", &["v"], "$0", "E"),
                RuleSpec::new("v", &["x"], "$0", "V"),
                RuleSpec::new("v", &["star", "e"], "$0", "V"),
            ],
            vec![
                TokenSpec::new("x", "x"),
                TokenSpec::new("assign", "="),
                TokenSpec::new("star", "\\*"),
            ],
            "n",
        );
        let v = g.symbols.idx("v").unwrap();
        let assign = g.symbols.idx("assign").unwrap();
        let v_follows: Vec<&BTreeSet<usize>> = follows
            .groups
            .iter()
            .filter(|(&(lhs, _, _), _)| lhs == v)
            .map(|(_, &grp)| &follows.follow[grp])
            .collect();
        assert!(v_follows.len() >= 2);
        assert!(v_follows.iter().any(|f| f.contains(&assign)));
        // at least one instance of `v` must NOT admit `=`; a single pooled
        // FOLLOW(v) would contain it everywhere
        assert!(v_follows.iter().any(|f| !f.contains(&assign)));
    }

    #[test]
    fn inheritance_cycles_converge() {
        let (g, _, _, follows) = pipeline(
            vec![
                RuleSpec::new("s", &["a"], "$0", "S"),
                RuleSpec::new("a", &["b"], "$0", "A"),
                RuleSpec::new("b", &["a"], "$0", "B"),
                RuleSpec::new("b", &["x"], "$0", "B"),
            ],
            vec![TokenSpec::new("x", "x")],
            "s",
        );
        let eof = g.eof();
        for (&(lhs, _, _), &grp) in &follows.groups {
            if lhs != 0 {
                assert_eq!(follows.follow[grp], BTreeSet::from([eof]));
            }
        }
    }

    #[test]
    fn start_instances_are_followed_by_end_of_input() {
        let (g, extended, _, follows) = pipeline(
            vec![RuleSpec::new("s", &["x"], "$0", "S")],
            vec![TokenSpec::new("x", "x")],
            "s",
        );
        for (i, rule) in extended.iter().enumerate() {
            if rule.prod == 0 {
                assert!(follows.follow[follows.of_rule[i]].contains(&g.eof()));
            }
        }
    }
}
