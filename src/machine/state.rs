//! Machine states and moves.
//!
//! A state is the set of inner state sentences (the `X` of each holding
//! `(true X)`), kept in an `im::OrdSet` so clones are cheap structural
//! shares and equal states hash equally regardless of construction order.
//! Playout trees and transposition tables key on that.

use im::OrdSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gdl::{SymbolTable, Term};

/// One game state: the set of sentences currently true.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineState {
    contents: OrdSet<Term>,
}

impl MachineState {
    #[must_use]
    pub fn new() -> Self {
        Self { contents: OrdSet::new() }
    }

    #[must_use]
    pub fn contains(&self, sentence: &Term) -> bool {
        self.contents.contains(sentence)
    }

    pub fn insert(&mut self, sentence: Term) {
        self.contents.insert(sentence);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.contents.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// KIF rendering, sentences in order.
    #[must_use]
    pub fn display(&self, symbols: &SymbolTable) -> String {
        use fmt::Write as _;
        let mut out = String::from("(");
        for (i, sentence) in self.contents.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}", sentence.display(symbols));
        }
        out.push(')');
        out
    }
}

impl FromIterator<Term> for MachineState {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self { contents: iter.into_iter().collect() }
    }
}

/// One move for one role, as the move term from a `legal` sentence.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Move(pub Term);

impl Move {
    #[must_use]
    pub const fn new(term: Term) -> Self {
        Self(term)
    }

    #[must_use]
    pub fn term(&self) -> &Term {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_hash_by_content() {
        let mut symbols = SymbolTable::new();
        let a = Term::Const(symbols.intern("a"));
        let b = Term::Const(symbols.intern("b"));

        let one: MachineState = [a.clone(), b.clone()].into_iter().collect();
        let two: MachineState = [b, a].into_iter().collect();
        assert_eq!(one, two);

        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        one.hash(&mut h1);
        two.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn test_display_is_sorted_kif() {
        let mut symbols = SymbolTable::new();
        let cell = symbols.intern("cell");
        let one = symbols.intern("1");
        let state: MachineState = [
            Term::Func(cell, vec![Term::Const(one)]),
            Term::Const(one),
        ]
        .into_iter()
        .collect();
        let rendered = state.display(&symbols);
        assert!(rendered.starts_with('('));
        assert!(rendered.contains("(cell 1)"));
    }
}
