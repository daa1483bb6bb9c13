//! The proposition network.
//!
//! A compiled game: a gate arena plus the indices the state machine reads
//! from. Built once by the compiler, immutable afterwards; evaluation
//! state lives in a caller-owned value buffer, so the structure is safe to
//! share read-only (and cheap to snapshot with bincode).
//!
//! The graph is a DAG except for the transition-to-base-proposition edge,
//! which means "value at t+1". The stored evaluation order excludes those
//! edges; after propagation the transitions hold the next state.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::gdl::{SymbolTable, Term};
use super::component::{Component, ComponentId, ComponentKind};

/// One base proposition: the state sentence, its proposition, and the
/// transition feeding it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEntry {
    pub sentence: Term,
    pub proposition: ComponentId,
    pub transition: ComponentId,
}

/// The compiled circuit and its typed indices.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropNet {
    pub(super) components: Vec<Component>,
    /// Topological evaluation order, transition back edges excluded.
    pub(super) order: Vec<ComponentId>,
    /// Propositions whose value is set externally before propagation:
    /// bases, inputs, and init. Propagation leaves them untouched.
    pub(super) preset: Vec<bool>,
    pub(super) bases: Vec<BaseEntry>,
    pub(super) inputs: FxHashMap<Term, ComponentId>,
    /// Per role (declaration order): legal propositions with their moves.
    pub(super) legals: Vec<Vec<(Term, ComponentId)>>,
    /// Per role: goal propositions with their parsed values.
    pub(super) goals: Vec<Vec<(u8, ComponentId)>>,
    pub(super) terminal: ComponentId,
    pub(super) init: ComponentId,
}

impl PropNet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.index()]
    }

    #[must_use]
    pub fn bases(&self) -> &[BaseEntry] {
        &self.bases
    }

    /// The input proposition for a full `(does role move)` sentence.
    #[must_use]
    pub fn input(&self, does_sentence: &Term) -> Option<ComponentId> {
        self.inputs.get(does_sentence).copied()
    }

    #[must_use]
    pub fn input_propositions(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.inputs.values().copied()
    }

    #[must_use]
    pub fn legals(&self, role_index: usize) -> &[(Term, ComponentId)] {
        &self.legals[role_index]
    }

    #[must_use]
    pub fn goals(&self, role_index: usize) -> &[(u8, ComponentId)] {
        &self.goals[role_index]
    }

    #[must_use]
    pub fn terminal(&self) -> ComponentId {
        self.terminal
    }

    #[must_use]
    pub fn init(&self) -> ComponentId {
        self.init
    }

    /// Forward-propagate gate values in topological order. Preset
    /// propositions (bases, inputs, init) keep the values the caller wrote
    /// into `values`; everything else is a pure function of its inputs.
    pub fn propagate(&self, values: &mut [bool]) {
        for &cid in &self.order {
            let component = &self.components[cid.index()];
            let value = match &component.kind {
                ComponentKind::Constant(b) => *b,
                ComponentKind::And => component
                    .inputs
                    .iter()
                    .all(|input| values[input.index()]),
                ComponentKind::Or => component
                    .inputs
                    .iter()
                    .any(|input| values[input.index()]),
                ComponentKind::Not => !values[component.inputs[0].index()],
                ComponentKind::Transition => values[component.inputs[0].index()],
                ComponentKind::Proposition(_) => {
                    if self.preset[cid.index()] {
                        continue;
                    }
                    match component.inputs.first() {
                        Some(input) => values[input.index()],
                        // No deriving rule: permanently false.
                        None => false,
                    }
                }
            };
            values[cid.index()] = value;
        }
    }

    /// GraphViz rendering for debugging.
    #[must_use]
    pub fn to_dot(&self, symbols: &SymbolTable) -> String {
        use std::fmt::Write as _;
        let mut dot = String::from("digraph propnet {\n");
        for (idx, component) in self.components.iter().enumerate() {
            let label = match &component.kind {
                ComponentKind::Proposition(sentence) => {
                    format!("{}", sentence.display(symbols))
                }
                ComponentKind::And => "AND".into(),
                ComponentKind::Or => "OR".into(),
                ComponentKind::Not => "NOT".into(),
                ComponentKind::Transition => "TRANSITION".into(),
                ComponentKind::Constant(b) => format!("{b}"),
            };
            let _ = writeln!(dot, "  c{idx} [label=\"{label}\"];");
            for input in &component.inputs {
                let _ = writeln!(dot, "  c{} -> c{idx};", input.index());
            }
        }
        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl::Game;
    use crate::ground::{flatten, GroundingConfig};
    use crate::propnet::compiler;

    const PUZZLE: &str = "
        (role robot)
        (init off)
        (<= (legal robot proceed) (true off))
        (<= (next on) (does robot proceed))
        (goal robot 100)
        (<= terminal (true on))
    ";

    fn network() -> (PropNet, Game) {
        let game = Game::from_kif(PUZZLE).unwrap();
        let flattened = flatten(&game, &GroundingConfig::default()).unwrap();
        let net = compiler::compile(&game, &flattened.ground_rules).unwrap();
        (net, game)
    }

    #[test]
    fn test_indices_cover_the_puzzle() {
        let (net, _) = network();
        assert_eq!(net.bases().len(), 2); // off and on
        assert_eq!(net.legals(0).len(), 1);
        assert_eq!(net.goals(0).len(), 1);
        assert_eq!(net.goals(0)[0].0, 100);
    }

    #[test]
    fn test_propagation_from_init() {
        let (net, _) = network();
        let mut values = vec![false; net.len()];
        values[net.init().index()] = true;
        net.propagate(&mut values);
        let next: Vec<_> = net
            .bases()
            .iter()
            .filter(|b| values[b.transition.index()])
            .collect();
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_to_dot_mentions_sentences() {
        let (net, game) = network();
        let dot = net.to_dot(&game.symbols);
        assert!(dot.contains("(true off)"));
        assert!(dot.contains("TRANSITION"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (net, _) = network();
        let bytes = bincode::serialize(&net).unwrap();
        let restored: PropNet = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.len(), net.len());
        assert_eq!(restored.bases().len(), net.bases().len());
    }
}
