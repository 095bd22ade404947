//! LR(0) item-set automaton.
//!
//! States are discovered breadth-first from the closure of
//! `{!Start -> . start}`. Items within a state are grouped by the symbol
//! right of the dot; each group's advanced item set is closed and either
//! matched against an existing state (set equality) or appended as a new
//! one. Discovery order is FIFO and item sets iterate in `BTreeSet` order,
//! so state indices are reproducible run to run for the same grammar.
//!
//! Epsilon productions produce items that are complete at dot 0; they are
//! never advanced and never create transitions.

use crate::grammar::Grammar;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::io::{self, Write};

/// A production with a progress dot. Items compare structurally, so two
/// states holding the same items are the same state.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    /// Index into [`Grammar::prods`].
    pub prod: usize,
    /// Dot position, `0..=rhs.len()`.
    pub dot: usize,
}

impl Item {
    /// The copy of this item with the dot moved one symbol right.
    #[inline]
    pub fn advanced(self) -> Item {
        Item {
            prod: self.prod,
            dot: self.dot + 1,
        }
    }

    /// Symbol right of the dot, or `None` for a complete item.
    pub fn pointed(self, grammar: &Grammar) -> Option<usize> {
        grammar.prods[self.prod].rhs.get(self.dot).copied()
    }
}

pub type ItemSet = BTreeSet<Item>;

/// The item-set automaton: states and the per-state transition rows.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub states: Vec<ItemSet>,
    /// `transitions[s][sym]` is the destination state for shifting `sym`
    /// in state `s`. Insertion-ordered for reproducible iteration.
    pub transitions: Vec<IndexMap<usize, usize>>,
}

/// Closes `items` under "a nonterminal right of the dot contributes all its
/// productions at dot 0". Worklist-based: closure depth is bounded by the
/// production count, not the call stack.
fn close(grammar: &Grammar, items: ItemSet) -> ItemSet {
    let mut closed = items;
    let mut queue: VecDeque<Item> = closed.iter().copied().collect();
    while let Some(item) = queue.pop_front() {
        let Some(sym) = item.pointed(grammar) else {
            continue;
        };
        if grammar.is_terminal(sym) {
            continue;
        }
        for &prod in &grammar.prods_by_lhs[sym] {
            let fresh = Item { prod, dot: 0 };
            if closed.insert(fresh) {
                queue.push_back(fresh);
            }
        }
    }
    closed
}

/// Builds the full automaton for `grammar`.
pub fn build(grammar: &Grammar) -> Automaton {
    let mut states: Vec<ItemSet> = Vec::new();
    let mut transitions: Vec<IndexMap<usize, usize>> = Vec::new();
    let mut index_of: HashMap<ItemSet, usize> = HashMap::new();

    // (kernel, source state, shifted symbol); the root has no source edge.
    let mut queue: VecDeque<(ItemSet, Option<(usize, usize)>)> = VecDeque::new();
    queue.push_back((ItemSet::from([Item { prod: 0, dot: 0 }]), None));

    while let Some((kernel, edge)) = queue.pop_front() {
        let state = close(grammar, kernel);
        let index = match index_of.get(&state) {
            Some(&index) => index,
            None => {
                let index = states.len();
                index_of.insert(state.clone(), index);
                transitions.push(IndexMap::new());

                let mut groups: IndexMap<usize, ItemSet> = IndexMap::new();
                for item in &state {
                    if let Some(sym) = item.pointed(grammar) {
                        groups.entry(sym).or_default().insert(item.advanced());
                    }
                }
                for (sym, kernel) in groups {
                    queue.push_back((kernel, Some((index, sym))));
                }

                states.push(state);
                index
            }
        };
        if let Some((from, sym)) = edge {
            transitions[from].insert(sym, index);
        }
    }

    Automaton {
        states,
        transitions,
    }
}

/// Renders one item, e.g. `E -> V . = E`.
pub fn display_item(grammar: &Grammar, item: Item) -> String {
    let prod = &grammar.prods[item.prod];
    let mut parts: Vec<&str> = prod.rhs.iter().map(|&s| grammar.name(s)).collect();
    parts.insert(item.dot, ".");
    format!("{} -> {}", grammar.name(prod.lhs), parts.join(" "))
}

/// Writes every state with its items, then the transition edges.
pub fn write_states<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    automaton: &Automaton,
) -> io::Result<()> {
    writeln!(out, "{} states", automaton.states.len())?;
    for (index, state) in automaton.states.iter().enumerate() {
        writeln!(out, "state {}", index)?;
        for &item in state {
            writeln!(out, "    {}", display_item(grammar, item))?;
        }
        for (&sym, &to) in &automaton.transitions[index] {
            writeln!(out, "    --{}--> {}", grammar.name(sym), to)?;
        }
    }
    Ok(())
}
