//! First-order terms.
//!
//! A `Term` is a constant, a variable, or a function of terms. Sentences
//! (facts and rule heads) are just terms used in literal position: a bare
//! constant is a zero-arity proposition, a function is a relation.
//!
//! Terms have structural equality, ordering, and hashing, which the
//! grounding layer relies on for its indices and which `im::OrdSet` relies
//! on for machine states.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use super::symbol::{SymbolId, SymbolTable, VarId};

/// A GDL term: constant, variable, or function application.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Const(SymbolId),
    Var(VarId),
    Func(SymbolId, Vec<Term>),
}

impl Term {
    /// Build a relation sentence `(name args...)`.
    #[must_use]
    pub fn relation(name: SymbolId, args: Vec<Term>) -> Self {
        Term::Func(name, args)
    }

    /// The sentence name: the functor of a relation, or the constant itself
    /// for a zero-arity proposition. `None` for variables.
    #[must_use]
    pub fn name(&self) -> Option<SymbolId> {
        match self {
            Term::Const(s) => Some(*s),
            Term::Func(f, _) => Some(*f),
            Term::Var(_) => None,
        }
    }

    /// Arguments of a relation; empty for propositions and variables.
    #[must_use]
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Func(_, args) => args,
            _ => &[],
        }
    }

    /// True iff no variable occurs transitively.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Const(_) => true,
            Term::Var(_) => false,
            Term::Func(_, args) => args.iter().all(Term::is_ground),
        }
    }

    /// Collect every variable in first-occurrence order.
    pub fn collect_vars(&self, out: &mut Vec<VarId>) {
        match self {
            Term::Const(_) => {}
            Term::Var(v) => {
                if !out.contains(v) {
                    out.push(*v);
                }
            }
            Term::Func(_, args) => {
                for arg in args {
                    arg.collect_vars(out);
                }
            }
        }
    }

    /// The leaf constants of a ground sentence, in left-to-right order.
    /// For a proposition this is the proposition name itself; for a
    /// relation the function names are part of the shape, not the tuple.
    ///
    /// Returns `None` if a variable occurs anywhere.
    #[must_use]
    pub fn leaf_constants(&self) -> Option<SmallVec<[SymbolId; 8]>> {
        let mut out = SmallVec::new();
        if self.collect_leaves(&mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn collect_leaves(&self, out: &mut SmallVec<[SymbolId; 8]>) -> bool {
        match self {
            Term::Const(s) => {
                out.push(*s);
                true
            }
            Term::Var(_) => false,
            Term::Func(_, args) => args.iter().all(|arg| arg.collect_leaves(out)),
        }
    }

    /// Replace every variable with the constant a grounding assignment
    /// chose for it. Callers guarantee the assignment covers all variables;
    /// an uncovered variable is left in place and caught by the emitter's
    /// groundness check.
    #[must_use]
    pub fn instantiate(&self, lookup: &impl Fn(VarId) -> Option<SymbolId>) -> Term {
        match self {
            Term::Const(_) => self.clone(),
            Term::Var(v) => match lookup(*v) {
                Some(c) => Term::Const(c),
                None => self.clone(),
            },
            Term::Func(f, args) => Term::Func(
                *f,
                args.iter().map(|arg| arg.instantiate(lookup)).collect(),
            ),
        }
    }

    /// KIF rendering against a symbol table.
    #[must_use]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> TermDisplay<'a> {
        TermDisplay { term: self, symbols }
    }
}

/// Borrowed display adapter; `Term` itself carries no names.
pub struct TermDisplay<'a> {
    term: &'a Term,
    symbols: &'a SymbolTable,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term {
            Term::Const(s) => write!(f, "{}", self.symbols.name(*s)),
            Term::Var(v) => write!(f, "{}", self.symbols.var_name(*v)),
            Term::Func(name, args) => {
                write!(f, "({}", self.symbols.name(*name))?;
                for arg in args {
                    write!(f, " {}", arg.display(self.symbols))?;
                }
                write!(f, ")")
            }
        }
    }
}
