//! Ground rules to circuit.
//!
//! Every distinct head sentence gets one `Or` gate fed by one `And` gate
//! per deriving ground rule; `And` inputs are the body literal components.
//! `next` and `init` heads share a single `Or -> Transition -> base
//! proposition` chain per state sentence, with `init`-derived conjuncts
//! additionally gated on the INIT proposition, so the initial state falls
//! out of ordinary propagation.
//!
//! Reserved functors are resolved here, once, into the network's typed
//! indices; evaluation never matches names again.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::EngineError;
use crate::gdl::{Game, SymbolId, SymbolTable, Term};
use crate::ground::{GroundLiteral, GroundRule};
use super::component::{Component, ComponentId, ComponentKind};
use super::network::{BaseEntry, PropNet};

/// Compile a flattened description into a network.
pub fn compile(game: &Game, ground_rules: &[GroundRule]) -> Result<PropNet, EngineError> {
    let mut builder = Builder::new();

    for rule in ground_rules {
        builder.convert_rule(rule);
    }
    builder.add_missing_inputs();

    let net = builder.finish(game)?;
    debug!(
        components = net.len(),
        bases = net.bases().len(),
        "circuit compiled"
    );
    Ok(net)
}

struct Builder {
    components: Vec<Component>,
    props: FxHashMap<Term, ComponentId>,
    prop_order: Vec<Term>,
    const_true: ComponentId,
    init: ComponentId,
    /// Inner state sentence -> (base proposition, transition, or).
    base_chains: FxHashMap<Term, (ComponentId, ComponentId, ComponentId)>,
    base_order: Vec<Term>,
    /// Non-base head sentence -> its or gate.
    head_ors: FxHashMap<Term, ComponentId>,
    inputs: FxHashMap<Term, ComponentId>,
}

impl Builder {
    fn new() -> Self {
        let mut builder = Self {
            components: Vec::new(),
            props: FxHashMap::default(),
            prop_order: Vec::new(),
            const_true: ComponentId(0),
            init: ComponentId(0),
            base_chains: FxHashMap::default(),
            base_order: Vec::new(),
            head_ors: FxHashMap::default(),
            inputs: FxHashMap::default(),
        };
        builder.const_true = builder.add(ComponentKind::Constant(true));
        builder.init = builder.proposition(&Term::Const(SymbolTable::INIT));
        builder
    }

    fn add(&mut self, kind: ComponentKind) -> ComponentId {
        let id = ComponentId(self.components.len() as u32);
        self.components.push(Component::new(kind));
        id
    }

    fn link(&mut self, source: ComponentId, target: ComponentId) {
        self.components[source.index()].outputs.push(target);
        self.components[target.index()].inputs.push(source);
    }

    fn proposition(&mut self, sentence: &Term) -> ComponentId {
        if let Some(&id) = self.props.get(sentence) {
            return id;
        }
        let id = self.add(ComponentKind::Proposition(sentence.clone()));
        self.props.insert(sentence.clone(), id);
        self.prop_order.push(sentence.clone());
        id
    }

    /// Get or create the `Or -> Transition -> base proposition` chain for
    /// a state sentence. A `true X` reference that nothing derives gets an
    /// empty or, leaving the base permanently false.
    fn base_chain(&mut self, inner: &Term) -> (ComponentId, ComponentId, ComponentId) {
        if let Some(&chain) = self.base_chains.get(inner) {
            return chain;
        }
        let prop = self.proposition(&Term::Func(SymbolTable::TRUE, vec![inner.clone()]));
        let or = self.add(ComponentKind::Or);
        let transition = self.add(ComponentKind::Transition);
        self.link(or, transition);
        self.link(transition, prop);
        self.base_chains.insert(inner.clone(), (prop, transition, or));
        self.base_order.push(inner.clone());
        (prop, transition, or)
    }

    fn input_prop(&mut self, does_sentence: &Term) -> ComponentId {
        let id = self.proposition(does_sentence);
        self.inputs.insert(does_sentence.clone(), id);
        id
    }

    fn convert_rule(&mut self, rule: &GroundRule) {
        let head_name = rule.head.name();
        let or = if head_name == Some(SymbolTable::NEXT) || head_name == Some(SymbolTable::INIT) {
            let inner = rule.head.args()[0].clone();
            self.base_chain(&inner).2
        } else {
            let prop = self.proposition(&rule.head);
            match self.head_ors.get(&rule.head) {
                Some(&or) => or,
                None => {
                    let or = self.add(ComponentKind::Or);
                    self.link(or, prop);
                    self.head_ors.insert(rule.head.clone(), or);
                    or
                }
            }
        };

        let and = self.add(ComponentKind::And);
        if rule.body.is_empty() {
            let constant = self.const_true;
            self.link(constant, and);
        }
        if head_name == Some(SymbolTable::INIT) {
            let init = self.init;
            self.link(init, and);
        }
        for literal in &rule.body {
            let component = match literal {
                GroundLiteral::Pos(t) => self.convert_sentence(t),
                GroundLiteral::Not(t) => {
                    let inner = self.convert_sentence(t);
                    let not = self.add(ComponentKind::Not);
                    self.link(inner, not);
                    not
                }
            };
            self.link(component, and);
        }
        self.link(and, or);
    }

    fn convert_sentence(&mut self, sentence: &Term) -> ComponentId {
        match sentence.name() {
            Some(name) if name == SymbolTable::TRUE => {
                self.base_chain(&sentence.args()[0].clone()).0
            }
            Some(name) if name == SymbolTable::DOES => self.input_prop(sentence),
            _ => self.proposition(sentence),
        }
    }

    /// Create the input proposition for every legal proposition, whether
    /// or not any body mentions it.
    fn add_missing_inputs(&mut self) {
        let legal_sentences: Vec<Term> = self
            .prop_order
            .iter()
            .filter(|s| s.name() == Some(SymbolTable::LEGAL))
            .cloned()
            .collect();
        for legal in legal_sentences {
            let does = Term::Func(SymbolTable::DOES, legal.args().to_vec());
            self.input_prop(&does);
        }
    }

    fn finish(self, game: &Game) -> Result<PropNet, EngineError> {
        let role_index: FxHashMap<SymbolId, usize> = game
            .roles
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name(), i))
            .collect();

        let mut legals = vec![Vec::new(); game.roles.len()];
        let mut goals = vec![Vec::new(); game.roles.len()];
        let mut terminal = None;

        for sentence in &self.prop_order {
            let id = self.props[sentence];
            match sentence.name() {
                Some(name) if name == SymbolTable::LEGAL => {
                    if let [Term::Const(role), mv] = sentence.args() {
                        if let Some(&idx) = role_index.get(role) {
                            legals[idx].push((mv.clone(), id));
                        }
                    }
                }
                Some(name) if name == SymbolTable::GOAL => {
                    if let [Term::Const(role), Term::Const(value)] = sentence.args() {
                        if let Some(&idx) = role_index.get(role) {
                            let parsed = parse_goal_value(game, *value)?;
                            goals[idx].push((parsed, id));
                        }
                    }
                }
                Some(name) if name == SymbolTable::TERMINAL => {
                    terminal = Some(id);
                }
                _ => {}
            }
        }

        let terminal = terminal.ok_or_else(|| EngineError::Compilation {
            reason: "no terminal proposition in the network".into(),
        })?;

        let bases: Vec<BaseEntry> = self
            .base_order
            .iter()
            .map(|inner| {
                let (proposition, transition, _) = self.base_chains[inner];
                BaseEntry {
                    sentence: inner.clone(),
                    proposition,
                    transition,
                }
            })
            .collect();

        let mut preset = vec![false; self.components.len()];
        preset[self.init.index()] = true;
        for base in &bases {
            preset[base.proposition.index()] = true;
        }
        for &input in self.inputs.values() {
            preset[input.index()] = true;
        }

        let order = topological_order(&self.components)?;

        Ok(PropNet {
            components: self.components,
            order,
            preset,
            bases,
            inputs: self.inputs,
            legals,
            goals,
            terminal,
            init: self.init,
        })
    }
}

fn parse_goal_value(game: &Game, value: SymbolId) -> Result<u8, EngineError> {
    let text = game.symbols.name(value);
    match text.parse::<u8>() {
        Ok(v) if v <= 100 => Ok(v),
        _ => Err(EngineError::Compilation {
            reason: format!("goal value {text} is not an integer in 0..=100"),
        }),
    }
}

/// Kahn's algorithm over the arena, skipping edges out of transitions
/// (those are the one-ply-delayed back edges). A cycle through ordinary
/// gates means the grounded description is not circuit-expressible.
fn topological_order(components: &[Component]) -> Result<Vec<ComponentId>, EngineError> {
    let mut indegree = vec![0usize; components.len()];
    for (idx, component) in components.iter().enumerate() {
        indegree[idx] = component
            .inputs
            .iter()
            .filter(|input| {
                !matches!(components[input.index()].kind, ComponentKind::Transition)
            })
            .count();
    }

    let mut queue: Vec<usize> = (0..components.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(components.len());
    let mut cursor = 0;
    while cursor < queue.len() {
        let idx = queue[cursor];
        cursor += 1;
        order.push(ComponentId(idx as u32));
        for output in &components[idx].outputs {
            if matches!(components[idx].kind, ComponentKind::Transition) {
                continue;
            }
            indegree[output.index()] -= 1;
            if indegree[output.index()] == 0 {
                queue.push(output.index());
            }
        }
    }

    if order.len() != components.len() {
        return Err(EngineError::Compilation {
            reason: "cyclic dependency through non-transition gates".into(),
        });
    }
    Ok(order)
}
