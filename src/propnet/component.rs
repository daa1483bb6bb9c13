//! Circuit components.
//!
//! The network owns every component in a `Vec` arena; edges are `u32`
//! indices into it, never pointers, so the one transition back edge per
//! base proposition is just an index that propagation declines to follow.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::gdl::Term;

/// Index of a component in the network arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl ComponentId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a gate computes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    /// A named proposition. Value comes from its single input gate, or is
    /// set externally for base / input / init propositions.
    Proposition(Term),
    And,
    Or,
    Not,
    /// The one-ply delay: holds the value its base proposition takes next.
    Transition,
    Constant(bool),
}

/// One node of the circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,
    pub inputs: SmallVec<[ComponentId; 4]>,
    pub outputs: SmallVec<[ComponentId; 4]>,
}

impl Component {
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl::{SymbolTable, Term};

    #[test]
    fn test_component_serde_round_trip() {
        let mut symbols = SymbolTable::new();
        let open = symbols.intern("open");
        let mut gate = Component::new(ComponentKind::Proposition(Term::Const(open)));
        gate.inputs.push(ComponentId(3));
        let bytes = bincode::serialize(&gate).unwrap();
        let restored: Component = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, gate);
    }
}
