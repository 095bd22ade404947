//! Interned symbol table.
//!
//! Symbol ids are dense indices in insertion order; the grammar model relies
//! on that to lay out nonterminals first, then terminals, with the reserved
//! end-of-input symbol last.

use std::collections::HashMap;
use std::slice::Iter;

#[derive(Default, Debug, Clone)]
pub struct Symtab {
    map: HashMap<String, usize>,
    vec: Vec<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `sym`, returning its id; re-adding returns the existing id.
    pub fn add(&mut self, sym: &str) -> usize {
        if let Some(&idx) = self.map.get(sym) {
            return idx;
        }
        let idx = self.vec.len();
        let owned = sym.to_owned();
        self.vec.push(owned.clone());
        self.map.insert(owned, idx);
        idx
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.map.get(sym).copied()
    }

    pub fn name(&self, idx: usize) -> &str {
        self.vec.get(idx).map(|s| s.as_str()).unwrap_or("?")
    }

    pub fn iter(&self) -> Iter<'_, String> {
        self.vec.iter()
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
}
