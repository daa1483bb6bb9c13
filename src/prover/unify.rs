//! Unification over terms.
//!
//! Substitutions are binding chains: a variable maps to a term that may
//! itself be a variable bound elsewhere, and `walk` follows the chain to
//! the representative. `BTreeMap` keeps substitutions hashable and their
//! iteration order stable, which the prover relies on for deterministic
//! answers.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::gdl::{Rule, Term, VarId};

pub type Substitution = BTreeMap<VarId, Term>;

/// Follow variable bindings to the representative term. Stops at the
/// first unbound variable or non-variable.
#[must_use]
pub fn walk<'a>(term: &'a Term, subst: &'a Substitution) -> &'a Term {
    let mut current = term;
    while let Term::Var(v) = current {
        match subst.get(v) {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Extend `subst` so that `x` and `y` become equal, or return false
/// leaving `subst` partially extended. Callers clone before trying.
pub fn unify(x: &Term, y: &Term, subst: &mut Substitution) -> bool {
    let x = walk(x, subst).clone();
    let y = walk(y, subst).clone();
    match (x, y) {
        (Term::Var(a), Term::Var(b)) if a == b => true,
        (Term::Var(a), t) | (t, Term::Var(a)) => {
            subst.insert(a, t);
            true
        }
        (Term::Const(a), Term::Const(b)) => a == b,
        (Term::Func(f, fa), Term::Func(g, ga)) => {
            f == g
                && fa.len() == ga.len()
                && fa.iter().zip(ga.iter()).all(|(a, b)| unify(a, b, subst))
        }
        _ => false,
    }
}

/// Deep-apply a substitution, chasing every binding.
#[must_use]
pub fn substitute(term: &Term, subst: &Substitution) -> Term {
    match walk(term, subst) {
        Term::Const(c) => Term::Const(*c),
        Term::Var(v) => Term::Var(*v),
        Term::Func(f, args) => Term::Func(
            *f,
            args.iter().map(|arg| substitute(arg, subst)).collect(),
        ),
    }
}

/// Rename variables to 0, 1, 2.. in first-occurrence order. Two goals
/// that differ only in variable names get the same canonical form, which
/// is what the prover's caches and recursion guard key on.
#[must_use]
pub fn canonicalize(term: &Term) -> Term {
    fn go(term: &Term, map: &mut FxHashMap<VarId, VarId>) -> Term {
        match term {
            Term::Const(c) => Term::Const(*c),
            Term::Var(v) => {
                let next = VarId(map.len() as u32);
                Term::Var(*map.entry(*v).or_insert(next))
            }
            Term::Func(f, args) => {
                Term::Func(*f, args.iter().map(|a| go(a, map)).collect())
            }
        }
    }
    go(term, &mut FxHashMap::default())
}

/// Replaces every variable with a fresh one, consistently within one
/// `rename_*` call. The counter lives past the symbol table's interned
/// variables, so renamed rules never capture query variables.
pub struct Renamer {
    next: u32,
}

impl Renamer {
    #[must_use]
    pub fn new(first_free: u32) -> Self {
        Self { next: first_free }
    }

    pub fn rename_term(&mut self, term: &Term) -> Term {
        let mut map = FxHashMap::default();
        self.rename_with(term, &mut map)
    }

    pub fn rename_rule(&mut self, rule: &Rule) -> Rule {
        let mut map = FxHashMap::default();
        let head = self.rename_with(&rule.head, &mut map);
        let body = rule
            .body
            .iter()
            .map(|lit| self.rename_literal(lit, &mut map))
            .collect();
        Rule { head, body }
    }

    fn rename_literal(
        &mut self,
        literal: &crate::gdl::Literal,
        map: &mut FxHashMap<VarId, VarId>,
    ) -> crate::gdl::Literal {
        use crate::gdl::Literal;
        match literal {
            Literal::Pos(t) => Literal::Pos(self.rename_with(t, map)),
            Literal::Not(t) => Literal::Not(self.rename_with(t, map)),
            Literal::Distinct(a, b) => {
                Literal::Distinct(self.rename_with(a, map), self.rename_with(b, map))
            }
            Literal::Or(ds) => {
                Literal::Or(ds.iter().map(|d| self.rename_literal(d, map)).collect())
            }
        }
    }

    fn rename_with(&mut self, term: &Term, map: &mut FxHashMap<VarId, VarId>) -> Term {
        match term {
            Term::Const(c) => Term::Const(*c),
            Term::Var(v) => {
                let fresh = *map.entry(*v).or_insert_with(|| {
                    let id = VarId(self.next);
                    self.next += 1;
                    id
                });
                Term::Var(fresh)
            }
            Term::Func(f, args) => Term::Func(
                *f,
                args.iter().map(|a| self.rename_with(a, map)).collect(),
            ),
        }
    }
}
