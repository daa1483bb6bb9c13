//! Flattening: from rules to the complete ground rule set.
//!
//! Phase A is the semi-naive domain fixpoint: seed domains from the
//! description's ground facts and ground positive body literals, then
//! repeatedly join rule bodies against the current domains and add each
//! satisfying head tuple, revisiting only rules whose bodies touch a form
//! that changed last round. Termination is a monotone set-growth argument:
//! every slot is bounded by the finite constant universe of the text.
//!
//! Phase B emits: one ground rule per satisfying assignment against the
//! final domains, with functional-dependency shortcuts enabled (the maps
//! are only valid once domains are stable). Satisfied `distinct` literals
//! and statically settled negations are dropped at emission;
//! state-dependent negations survive for the circuit compiler.
//!
//! `GroundingConfig` bounds the fixpoint so that descriptions this
//! approach cannot ground (effectively infinite domains) are rejected with
//! a structural error instead of spinning.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::gdl::{expand_disjunctions, Game, Literal, SymbolTable, Term};
use super::domain::{DomainTable, FunctionIndex};
use super::form::FormId;
use super::planner::{self, Assignment, JoinContext, PlannedRule, StaticFacts};

/// Budgets for the grounding fixpoint. Defaults are generous; hitting one
/// means the description is out of this grounder's reach and the caller
/// should fall back to the prover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingConfig {
    /// Maximum fixpoint rounds before giving up.
    pub max_rounds: usize,
    /// Maximum total domain tuples across all forms.
    pub max_tuples: usize,
    /// Maximum emitted ground rules.
    pub max_ground_rules: usize,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4096,
            max_tuples: 2_000_000,
            max_ground_rules: 4_000_000,
        }
    }
}

impl GroundingConfig {
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    #[must_use]
    pub fn with_max_tuples(mut self, max_tuples: usize) -> Self {
        self.max_tuples = max_tuples;
        self
    }

    #[must_use]
    pub fn with_max_ground_rules(mut self, max_ground_rules: usize) -> Self {
        self.max_ground_rules = max_ground_rules;
        self
    }
}

/// A fully instantiated body literal. Disjunctions were expanded away and
/// `distinct` literals were settled during planning, so only sentences and
/// state-dependent negations remain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroundLiteral {
    Pos(Term),
    Not(Term),
}

/// A rule with every variable replaced per one satisfying assignment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroundRule {
    pub head: Term,
    pub body: Vec<GroundLiteral>,
}

impl GroundRule {
    #[must_use]
    pub fn fact(head: Term) -> Self {
        Self { head, body: Vec::new() }
    }
}

/// Output of flattening: the ground rules plus the final domains (kept for
/// soundness checks and diagnostics).
#[derive(Debug)]
pub struct Flattened {
    pub ground_rules: Vec<GroundRule>,
    pub domains: DomainTable,
}

/// Ground an entire game description.
pub fn flatten(game: &Game, config: &GroundingConfig) -> Result<Flattened, EngineError> {
    let expanded = expand_disjunctions(&game.rules);
    let mut domains = DomainTable::new();
    let mut statics = StaticFacts::default();

    // Seed: ground facts (minus `base` declarations) and ground positive
    // body literals.
    let mut facts = Vec::new();
    for rule in &expanded {
        if rule.is_fact() {
            if rule.head.name() == Some(SymbolTable::BASE) {
                continue;
            }
            let form = domains.register_form(&rule.head);
            let tuple = rule.head.leaf_constants().ok_or_else(|| {
                EngineError::MalformedRule {
                    rule: rule.display(&game.symbols).to_string(),
                    reason: "facts must be ground".into(),
                }
            })?;
            domains.insert(form, tuple);
            statics.facts.insert(rule.head.clone());
            facts.push(rule.head.clone());
        } else {
            for lit in &rule.body {
                if let Literal::Pos(t) = lit {
                    if t.is_ground() {
                        let form = domains.register_form(t);
                        if let Some(tuple) = t.leaf_constants() {
                            domains.insert(form, tuple);
                        }
                    }
                }
            }
        }
    }

    let mut planned = Vec::new();
    for rule in &expanded {
        if rule.is_fact() {
            continue;
        }
        let p = PlannedRule::new(rule, &mut domains);
        check_plannable(&p, game)?;
        statics.rule_produced.insert(p.head_form);
        planned.push(p);
    }

    grow_domains(&planned, &mut domains, config)?;

    emit(game, &facts, &planned, &domains, &statics, config)
}

/// A head variable (or `not`/`distinct` variable) missing from every
/// positive condition can never be bounded. Loading validates this too,
/// but flattening is callable on hand-built games.
fn check_plannable(rule: &PlannedRule, game: &Game) -> Result<(), EngineError> {
    let mut bound = Vec::new();
    for cond in &rule.conditions {
        for slot in &cond.template {
            if let super::form::Slot::Var(v) = slot {
                if !bound.contains(v) {
                    bound.push(*v);
                }
            }
        }
    }
    let mut needed = Vec::new();
    rule.source.head.collect_vars(&mut needed);
    for neg in &rule.negations {
        neg.collect_vars(&mut needed);
    }
    for (a, b) in &rule.distincts {
        a.collect_vars(&mut needed);
        b.collect_vars(&mut needed);
    }
    for var in needed {
        if !bound.contains(&var) {
            return Err(EngineError::UnboundedVariable {
                variable: game.symbols.var_name(var),
                rule: rule.source.display(&game.symbols).to_string(),
            });
        }
    }
    Ok(())
}

/// Phase A: the semi-naive fixpoint over head tuples.
fn grow_domains(
    planned: &[PlannedRule],
    domains: &mut DomainTable,
    config: &GroundingConfig,
) -> Result<(), EngineError> {
    let mut changed: Option<FxHashSet<FormId>> = None;
    let mut round = 0usize;
    loop {
        round += 1;
        if round > config.max_rounds {
            return Err(EngineError::GroundingBudget {
                limit: "round".into(),
                value: config.max_rounds,
            });
        }

        let mut now_changed = FxHashSet::default();
        let mut considered = 0usize;
        for rule in planned {
            if let Some(prev) = &changed {
                if !rule.references(prev) {
                    continue;
                }
            }
            considered += 1;
            let ctx = JoinContext { domains, functions: None, statics: None };
            let found = planner::assignments(rule, &ctx, &Assignment::default());
            for assignment in found {
                let Some(tuple) = rule.head_tuple(&assignment) else { continue };
                if domains.insert(rule.head_form, tuple) {
                    now_changed.insert(rule.head_form);
                }
            }
        }

        if domains.total_tuples() > config.max_tuples {
            return Err(EngineError::GroundingBudget {
                limit: "tuple".into(),
                value: config.max_tuples,
            });
        }

        debug!(
            round,
            considered,
            changed_forms = now_changed.len(),
            tuples = domains.total_tuples(),
            "domain fixpoint round"
        );
        if now_changed.is_empty() {
            return Ok(());
        }
        changed = Some(now_changed);
    }
}

/// Phase B: deterministic emission against the final domains.
fn emit(
    game: &Game,
    facts: &[Term],
    planned: &[PlannedRule],
    domains: &DomainTable,
    statics: &StaticFacts,
    config: &GroundingConfig,
) -> Result<Flattened, EngineError> {
    let functions = FunctionIndex::build(domains);
    let ctx = JoinContext {
        domains,
        functions: Some(&functions),
        statics: Some(statics),
    };

    let mut out: Vec<GroundRule> = Vec::new();
    let mut seen: FxHashSet<GroundRule> = FxHashSet::default();
    let mut push = |ground: GroundRule, out: &mut Vec<GroundRule>| -> Result<(), EngineError> {
        if seen.insert(ground.clone()) {
            out.push(ground);
        }
        if out.len() > config.max_ground_rules {
            return Err(EngineError::GroundingBudget {
                limit: "ground rule".into(),
                value: config.max_ground_rules,
            });
        }
        Ok(())
    };

    for fact in facts {
        push(GroundRule::fact(fact.clone()), &mut out)?;
    }

    for rule in planned {
        let found = planner::assignments(rule, &ctx, &Assignment::default());
        for assignment in found {
            let lookup = |v| assignment.get(&v).copied();
            let head = rule.source.head.instantiate(&lookup);
            if !head.is_ground() {
                return Err(EngineError::UnboundedVariable {
                    variable: "?".into(),
                    rule: rule.source.display(&game.symbols).to_string(),
                });
            }
            let mut body = Vec::new();
            for lit in &rule.source.body {
                match lit {
                    Literal::Pos(t) => body.push(GroundLiteral::Pos(t.instantiate(&lookup))),
                    Literal::Not(t) => {
                        let ground = t.instantiate(&lookup);
                        // Fact-only negations were filtered by the planner;
                        // the survivors are statically true and drop out.
                        if !statics.is_fact_only(domains, &ground) {
                            body.push(GroundLiteral::Not(ground));
                        }
                    }
                    Literal::Distinct(_, _) => {}
                    Literal::Or(_) => {}
                }
            }
            push(GroundRule { head, body }, &mut out)?;
        }
    }

    debug!(ground_rules = out.len(), forms = domains.forms.len(), "flattening complete");
    Ok(Flattened {
        ground_rules: out,
        domains: domains.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(text: &str) -> Flattened {
        let game = Game::from_kif(text).unwrap();
        flatten(&game, &GroundingConfig::default()).unwrap()
    }

    const CHAIN: &str = "
        (role robot)
        (succ 1 2) (succ 2 3)
        (init (at 1))
        (<= (legal robot advance) (true (at ?x)) (succ ?x ?y))
        (<= (next (at ?y)) (does robot advance) (true (at ?x)) (succ ?x ?y))
        (<= (goal robot 100) (true (at 3)))
        (<= terminal (true (at 3)))
    ";

    #[test]
    fn test_chain_grounds_completely() {
        let flattened = flat(CHAIN);
        // (at 2) and (at 3) only exist after domain propagation through next
        assert!(flattened
            .ground_rules
            .iter()
            .any(|r| r.head.name() == Some(SymbolTable::NEXT)));
        let next_count = flattened
            .ground_rules
            .iter()
            .filter(|r| r.head.name() == Some(SymbolTable::NEXT))
            .count();
        assert_eq!(next_count, 2);
    }

    #[test]
    fn test_flattening_is_deterministic() {
        let a = flat(CHAIN);
        let b = flat(CHAIN);
        assert_eq!(a.ground_rules, b.ground_rules);
    }

    #[test]
    fn test_heads_lie_within_domains() {
        let flattened = flat(CHAIN);
        for rule in &flattened.ground_rules {
            assert!(
                flattened.domains.contains_sentence(&rule.head),
                "head escaped its domain"
            );
        }
    }

    #[test]
    fn test_zero_derivation_relation_is_absent() {
        let text = "
            (role robot)
            (init off)
            (<= (legal robot proceed) (true off) (not ghost))
            (<= (next on) (does robot proceed))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let flattened = flat(text);
        // `ghost` has no derivation: no ground rule heads it, and the
        // negation survives into the legal rule for the circuit to settle.
        let ghost = {
            let game = Game::from_kif(text).unwrap();
            Term::Const(game.symbols.lookup("ghost").unwrap())
        };
        assert!(!flattened.ground_rules.iter().any(|r| r.head == ghost));
        let legal = flattened
            .ground_rules
            .iter()
            .find(|r| r.head.name() == Some(SymbolTable::LEGAL))
            .unwrap();
        assert!(legal.body.iter().any(|l| matches!(l, GroundLiteral::Not(_))));
    }

    #[test]
    fn test_round_budget_rejects() {
        let game = Game::from_kif(CHAIN).unwrap();
        let config = GroundingConfig::default().with_max_rounds(1);
        let err = flatten(&game, &config).unwrap_err();
        assert!(matches!(err, EngineError::GroundingBudget { .. }));
    }

    #[test]
    fn test_base_declarations_are_skipped() {
        let text = "
            (role robot)
            (base (at 1))
            (init (at 1))
            (<= (legal robot noop) (true (at 1)))
            (<= (next (at 1)) (does robot noop))
            (goal robot 100)
            (<= terminal (true (at 1)))
        ";
        let flattened = flat(text);
        assert!(!flattened
            .ground_rules
            .iter()
            .any(|r| r.head.name() == Some(SymbolTable::BASE)));
    }

    #[test]
    fn test_or_bodies_expand_to_multiple_ground_rules() {
        let text = "
            (role robot)
            (p 1) (q 2)
            (init off)
            (<= (legal robot noop) (true off))
            (<= (next on) (or (p 1) (q 2)))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let flattened = flat(text);
        let next_rules: Vec<_> = flattened
            .ground_rules
            .iter()
            .filter(|r| r.head.name() == Some(SymbolTable::NEXT))
            .collect();
        assert_eq!(next_rules.len(), 2);
    }
}
