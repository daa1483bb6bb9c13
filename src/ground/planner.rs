//! Assignment planner: the indexed join over a rule body.
//!
//! A rule body is a join query over one virtual relation per positive
//! literal, each backed by its form's domain. The planner walks the
//! conditions in body order, carrying a partial assignment of variables to
//! constants:
//!
//! - all slots bound: a membership test against the form's tuple set;
//! - one unbound variable in one slot with a valid functional dependency:
//!   a direct lookup keyed by the bound slots;
//! - otherwise: intersect the per-slot postings of every bound slot and
//!   extend the assignment from the surviving tuples, requiring repeated
//!   variables to agree.
//!
//! `distinct` literals filter exactly once the assignment is complete.
//! Negations filter only against fact-only forms; a negation over a
//! rule-produced form is state dependent and survives into the circuit.
//!
//! The planner is pure: same inputs, same assignment set.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::gdl::{Literal, Rule, SymbolId, Term, VarId};
use super::domain::{DomainTable, FunctionIndex, Tuple};
use super::form::{self, FormId, Slot};

/// One constant per rule variable.
pub type Assignment = FxHashMap<VarId, SymbolId>;

/// A positive body literal reduced to its form and leaf template.
#[derive(Clone, Debug)]
pub struct Condition {
    pub form: FormId,
    pub template: SmallVec<[Slot; 8]>,
}

/// A rule prepared for joining: or-free, body split by literal kind.
#[derive(Clone, Debug)]
pub struct PlannedRule {
    pub source: Rule,
    pub head_form: FormId,
    pub head_template: SmallVec<[Slot; 8]>,
    pub conditions: Vec<Condition>,
    pub negations: Vec<Term>,
    pub distincts: Vec<(Term, Term)>,
}

impl PlannedRule {
    /// Prepare an or-free rule, registering every referenced form.
    #[must_use]
    pub fn new(rule: &Rule, domains: &mut DomainTable) -> Self {
        let head_form = domains.register_form(&rule.head);
        let head_template = form::template(&rule.head);
        let mut conditions = Vec::new();
        let mut negations = Vec::new();
        let mut distincts = Vec::new();
        for lit in &rule.body {
            match lit {
                Literal::Pos(t) => conditions.push(Condition {
                    form: domains.register_form(t),
                    template: form::template(t),
                }),
                Literal::Not(t) => {
                    domains.register_form(t);
                    negations.push(t.clone());
                }
                Literal::Distinct(a, b) => distincts.push((a.clone(), b.clone())),
                Literal::Or(_) => {
                    debug_assert!(false, "disjunctions must be expanded before planning");
                }
            }
        }
        Self {
            source: rule.clone(),
            head_form,
            head_template,
            conditions,
            negations,
            distincts,
        }
    }

    /// Whether any condition reads a form that changed last round.
    #[must_use]
    pub fn references(&self, changed: &FxHashSet<FormId>) -> bool {
        self.conditions.iter().any(|c| changed.contains(&c.form))
    }

    /// The head tuple under an assignment; `None` if a head variable is
    /// unassigned (an unsatisfiable or unsafe rule).
    #[must_use]
    pub fn head_tuple(&self, assignment: &Assignment) -> Option<Tuple> {
        let mut tuple = Tuple::new();
        for slot in &self.head_template {
            match slot {
                Slot::Const(c) => tuple.push(*c),
                Slot::Var(v) => tuple.push(*assignment.get(v)?),
            }
        }
        Some(tuple)
    }
}

/// Description-level facts used for exact negation filtering: the ground
/// facts themselves plus the set of forms some rule head produces.
#[derive(Clone, Debug, Default)]
pub struct StaticFacts {
    pub facts: FxHashSet<Term>,
    pub rule_produced: FxHashSet<FormId>,
}

impl StaticFacts {
    /// A negation over a fact-only form is statically decidable.
    #[must_use]
    pub fn is_fact_only(&self, domains: &DomainTable, sentence: &Term) -> bool {
        match domains.forms.lookup(sentence) {
            Some(form) => !self.rule_produced.contains(&form),
            None => true,
        }
    }
}

/// Everything a join runs against.
pub struct JoinContext<'a> {
    pub domains: &'a DomainTable,
    pub functions: Option<&'a FunctionIndex>,
    pub statics: Option<&'a StaticFacts>,
}

/// Enumerate every assignment consistent with the rule body, starting from
/// an optional preassignment. Deterministic: output follows condition
/// order and tuple insertion order.
#[must_use]
pub fn assignments(rule: &PlannedRule, ctx: &JoinContext, pre: &Assignment) -> Vec<Assignment> {
    let mut out = Vec::new();
    solve(rule, ctx, 0, pre.clone(), &mut out);
    out
}

fn solve(
    rule: &PlannedRule,
    ctx: &JoinContext,
    idx: usize,
    current: Assignment,
    out: &mut Vec<Assignment>,
) {
    if idx == rule.conditions.len() {
        if passes_filters(rule, ctx, &current) {
            out.push(current);
        }
        return;
    }

    let cond = &rule.conditions[idx];
    let domain = ctx.domains.domain(cond.form);

    // Resolve each slot against constants and prior bindings.
    let resolved: SmallVec<[Option<SymbolId>; 8]> = cond
        .template
        .iter()
        .map(|slot| match slot {
            Slot::Const(c) => Some(*c),
            Slot::Var(v) => current.get(v).copied(),
        })
        .collect();

    if resolved.iter().all(Option::is_some) {
        let tuple: Tuple = resolved.iter().map(|c| c.unwrap_or(SymbolId(0))).collect();
        if domain.contains(&tuple) {
            solve(rule, ctx, idx + 1, current, out);
        }
        return;
    }

    // Functional-dependency shortcut: one unbound variable in one slot.
    if let Some(functions) = ctx.functions {
        if let Some((slot, var)) = sole_unbound_slot(cond, &resolved) {
            if functions.is_functional(cond.form, slot) {
                let others: Tuple = resolved
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != slot)
                    .filter_map(|(_, c)| *c)
                    .collect();
                if let Some(value) = functions.lookup(cond.form, slot, &others) {
                    let mut extended = current;
                    extended.insert(var, value);
                    solve(rule, ctx, idx + 1, extended, out);
                }
                return;
            }
        }
    }

    // Hash join: intersect the postings of every bound slot.
    let mut candidates: Option<Vec<u32>> = None;
    for (slot, constant) in resolved.iter().enumerate() {
        let Some(constant) = constant else { continue };
        let posting = domain.posting(slot, *constant);
        candidates = Some(match candidates {
            None => posting.to_vec(),
            Some(prior) => {
                let keep: FxHashSet<u32> = posting.iter().copied().collect();
                prior.into_iter().filter(|id| keep.contains(id)).collect()
            }
        });
    }

    match candidates {
        Some(ids) => {
            for id in ids {
                extend_and_recurse(rule, ctx, idx, &current, domain.tuple(id), cond, out);
            }
        }
        None => {
            for tuple in domain.tuples() {
                extend_and_recurse(rule, ctx, idx, &current, tuple, cond, out);
            }
        }
    }
}

fn sole_unbound_slot(
    cond: &Condition,
    resolved: &SmallVec<[Option<SymbolId>; 8]>,
) -> Option<(usize, VarId)> {
    let mut found: Option<(usize, VarId)> = None;
    for (slot, value) in resolved.iter().enumerate() {
        if value.is_some() {
            continue;
        }
        let Slot::Var(var) = cond.template[slot] else { return None };
        match found {
            None => found = Some((slot, var)),
            Some(_) => return None,
        }
    }
    found
}

fn extend_and_recurse(
    rule: &PlannedRule,
    ctx: &JoinContext,
    idx: usize,
    current: &Assignment,
    tuple: &Tuple,
    cond: &Condition,
    out: &mut Vec<Assignment>,
) {
    let mut extended = current.clone();
    for (slot, &constant) in tuple.iter().enumerate() {
        match cond.template[slot] {
            Slot::Const(c) => {
                if c != constant {
                    return;
                }
            }
            Slot::Var(v) => match extended.get(&v) {
                Some(&bound) if bound != constant => return,
                Some(_) => {}
                None => {
                    extended.insert(v, constant);
                }
            },
        }
    }
    solve(rule, ctx, idx + 1, extended, out);
}

fn passes_filters(rule: &PlannedRule, ctx: &JoinContext, assignment: &Assignment) -> bool {
    for (a, b) in &rule.distincts {
        let lookup = |v| assignment.get(&v).copied();
        if a.instantiate(&lookup) == b.instantiate(&lookup) {
            return false;
        }
    }
    if let Some(statics) = ctx.statics {
        for negation in &rule.negations {
            let ground = negation.instantiate(&|v| assignment.get(&v).copied());
            if statics.is_fact_only(ctx.domains, &ground) && statics.facts.contains(&ground) {
                return false;
            }
        }
    }
    true
}
