//! Symbol interning for GDL descriptions.
//!
//! Every constant and variable name in a description is interned once into
//! a `SymbolTable`, and the rest of the engine works with `u32` handles.
//! Structural equality on handles is reference equality on names, which is
//! what makes terms cheap to hash and index during grounding.
//!
//! The table is built by the reader and frozen afterwards: every constant
//! that can ever occur in play already occurs in the description text, so
//! nothing needs to be interned at evaluation time.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interned constant name (functor or leaf constant).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned variable name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interning table for one game description.
///
/// The GDL keywords are interned first, in a fixed order, so the engine can
/// refer to them through the associated constants below without ever
/// comparing strings at evaluation time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    names: Vec<String>,
    index: FxHashMap<String, SymbolId>,
    var_names: Vec<String>,
    var_index: FxHashMap<String, VarId>,
}

impl SymbolTable {
    pub const ROLE: SymbolId = SymbolId(0);
    pub const TRUE: SymbolId = SymbolId(1);
    pub const DOES: SymbolId = SymbolId(2);
    pub const NEXT: SymbolId = SymbolId(3);
    pub const INIT: SymbolId = SymbolId(4);
    pub const LEGAL: SymbolId = SymbolId(5);
    pub const GOAL: SymbolId = SymbolId(6);
    pub const TERMINAL: SymbolId = SymbolId(7);
    pub const BASE: SymbolId = SymbolId(8);

    const KEYWORDS: [&'static str; 9] = [
        "role", "true", "does", "next", "init", "legal", "goal", "terminal", "base",
    ];

    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::new(),
            index: FxHashMap::default(),
            var_names: Vec::new(),
            var_index: FxHashMap::default(),
        };
        for kw in Self::KEYWORDS {
            table.intern(kw);
        }
        table
    }

    /// Intern a constant name, returning its handle.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Intern a variable name (without the leading `?`).
    pub fn intern_var(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.var_index.get(name) {
            return id;
        }
        let id = VarId(self.var_names.len() as u32);
        self.var_names.push(name.to_string());
        self.var_index.insert(name.to_string(), id);
        id
    }

    /// Look up a constant without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.index.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }

    /// Variable name for display. Fresh variables minted by the prover lie
    /// past the frozen table and render positionally.
    #[must_use]
    pub fn var_name(&self, id: VarId) -> String {
        match self.var_names.get(id.index()) {
            Some(name) => format!("?{name}"),
            None => format!("?v{}", id.0),
        }
    }

    /// Number of interned constants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of interned variables. Ids at or past this bound are fresh
    /// variables minted during proving.
    #[must_use]
    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_fixed() {
        let table = SymbolTable::new();
        assert_eq!(table.lookup("role"), Some(SymbolTable::ROLE));
        assert_eq!(table.lookup("true"), Some(SymbolTable::TRUE));
        assert_eq!(table.lookup("does"), Some(SymbolTable::DOES));
        assert_eq!(table.lookup("next"), Some(SymbolTable::NEXT));
        assert_eq!(table.lookup("init"), Some(SymbolTable::INIT));
        assert_eq!(table.lookup("legal"), Some(SymbolTable::LEGAL));
        assert_eq!(table.lookup("goal"), Some(SymbolTable::GOAL));
        assert_eq!(table.lookup("terminal"), Some(SymbolTable::TERMINAL));
        assert_eq!(table.lookup("base"), Some(SymbolTable::BASE));
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("cell");
        let b = table.intern("cell");
        assert_eq!(a, b);
        assert_eq!(table.name(a), "cell");
    }

    #[test]
    fn test_vars_are_separate_namespace() {
        let mut table = SymbolTable::new();
        let _sym = table.intern("x");
        let var = table.intern_var("x");
        assert_eq!(table.var_name(var), "?x");
        assert_eq!(table.intern_var("x"), var);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut table = SymbolTable::new();
        table.intern("cell");
        table.intern_var("x");
        let json = serde_json::to_string(&table).unwrap();
        let restored: SymbolTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.lookup("cell"), table.lookup("cell"));
        assert_eq!(restored.var_count(), 1);
    }
}
