//! Body transforms shared by the flattener and the prover.
//!
//! - `expand_rule` / `expand_disjunctions`: disjunctive-normal expansion.
//!   Each `or` in a body splits the rule into one copy per disjunct, with
//!   the same head; nested disjunctions are handled by running to a
//!   fixpoint.
//! - `reorder_negations`: move `not` and `distinct` literals after the
//!   positive literals that bind their variables, so negation as failure
//!   and inequality only ever see bound values during proving.

use super::rule::{Literal, Rule};
use super::symbol::VarId;

/// Expand every `or` in a rule body, one disjunct per copy.
#[must_use]
pub fn expand_rule(rule: &Rule) -> Vec<Rule> {
    let mut pending = vec![rule.clone()];
    let mut done = Vec::new();
    while let Some(current) = pending.pop() {
        match current.body.iter().position(|lit| matches!(lit, Literal::Or(_))) {
            None => done.push(current),
            Some(idx) => {
                let disjuncts = match &current.body[idx] {
                    Literal::Or(disjuncts) => disjuncts.clone(),
                    _ => unreachable!("position matched an or literal"),
                };
                for disjunct in disjuncts {
                    let mut body = current.body.clone();
                    body[idx] = disjunct;
                    pending.push(Rule { head: current.head.clone(), body });
                }
            }
        }
    }
    // Stack order reversed the disjuncts; keep declaration order stable.
    done.reverse();
    done
}

/// Expand disjunctions across a whole rule set.
#[must_use]
pub fn expand_disjunctions(rules: &[Rule]) -> Vec<Rule> {
    rules.iter().flat_map(expand_rule).collect()
}

/// Reorder one (already `or`-free) body so negative literals follow their
/// binders. A literal whose variables never bind stays at the end; rule
/// safety validation at load time makes that case unreachable for games
/// that loaded successfully.
#[must_use]
pub fn reorder_negations(rule: &Rule) -> Rule {
    let mut bound: Vec<VarId> = Vec::new();
    let mut deferred: Vec<Literal> = Vec::new();
    let mut body = Vec::with_capacity(rule.body.len());

    for lit in &rule.body {
        match lit {
            Literal::Pos(t) => {
                body.push(lit.clone());
                t.collect_vars(&mut bound);
                deferred.retain(|waiting| {
                    if is_bound(waiting, &bound) {
                        body.push(waiting.clone());
                        false
                    } else {
                        true
                    }
                });
            }
            Literal::Not(_) | Literal::Distinct(_, _) => {
                if is_bound(lit, &bound) {
                    body.push(lit.clone());
                } else {
                    deferred.push(lit.clone());
                }
            }
            Literal::Or(_) => body.push(lit.clone()),
        }
    }
    body.extend(deferred);
    Rule { head: rule.head.clone(), body }
}

fn is_bound(lit: &Literal, bound: &[VarId]) -> bool {
    let mut vars = Vec::new();
    lit.collect_vars(&mut vars);
    vars.iter().all(|v| bound.contains(v))
}
