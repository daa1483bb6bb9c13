//! Sentence forms: the generic shape of a sentence.
//!
//! Two sentences share a form when they have the same functor skeleton
//! with every constant or variable leaf replaced by a placeholder. Forms
//! are the grouping key for domains and join indices: a domain holds one
//! tuple of leaf constants per ground sentence of its form.
//!
//! Aliasing is applied to the outer functor when forms are computed:
//! `legal` registers under `does` (one produces what the other consumes)
//! and `next` / `init` register under `true` (whatever they can produce,
//! `true` can hold).
//!
//! Zero-arity propositions all share one degenerate form whose single slot
//! holds the proposition name, so proposition-headed rules go through the
//! same domain machinery as relations.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::gdl::{SymbolId, SymbolTable, Term, VarId};

/// Interned sentence form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormId(pub u32);

impl FormId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Placeholder leaf in a form skeleton.
const FILLER: Term = Term::Var(VarId(u32::MAX));

/// One leaf position of a sentence: a constant or a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Const(SymbolId),
    Var(VarId),
}

/// Interning table from skeleton terms to `FormId`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FormTable {
    skeletons: Vec<Term>,
    index: FxHashMap<Term, FormId>,
    slot_counts: Vec<usize>,
}

impl FormTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern the form of a sentence (aliasing applied).
    pub fn intern(&mut self, sentence: &Term) -> FormId {
        let skeleton = generic_form(sentence);
        if let Some(&id) = self.index.get(&skeleton) {
            return id;
        }
        let id = FormId(self.skeletons.len() as u32);
        self.slot_counts.push(slot_count(&skeleton));
        self.index.insert(skeleton.clone(), id);
        self.skeletons.push(skeleton);
        id
    }

    /// Look up the form of a sentence without interning it.
    #[must_use]
    pub fn lookup(&self, sentence: &Term) -> Option<FormId> {
        self.index.get(&generic_form(sentence)).copied()
    }

    #[must_use]
    pub fn slot_count(&self, form: FormId) -> usize {
        self.slot_counts[form.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }
}

/// The skeleton of a sentence: leaves replaced by a placeholder, function
/// structure kept, outer functor aliased.
#[must_use]
pub fn generic_form(sentence: &Term) -> Term {
    match sentence {
        Term::Const(_) | Term::Var(_) => FILLER,
        Term::Func(name, args) => {
            let aliased = alias(*name);
            Term::Func(aliased, args.iter().map(generic_form_inner).collect())
        }
    }
}

fn generic_form_inner(term: &Term) -> Term {
    match term {
        Term::Const(_) | Term::Var(_) => FILLER,
        Term::Func(name, args) => {
            Term::Func(*name, args.iter().map(generic_form_inner).collect())
        }
    }
}

/// `legal` pairs with `does`; `next` and `init` pair with `true`.
#[must_use]
pub fn alias(functor: SymbolId) -> SymbolId {
    if functor == SymbolTable::LEGAL {
        SymbolTable::DOES
    } else if functor == SymbolTable::NEXT || functor == SymbolTable::INIT {
        SymbolTable::TRUE
    } else {
        functor
    }
}

fn slot_count(skeleton: &Term) -> usize {
    match skeleton {
        Term::Const(_) | Term::Var(_) => 1,
        Term::Func(_, args) => args.iter().map(slot_count).sum(),
    }
}

/// The leaf template of a sentence: its constants and variables in
/// left-to-right order, function names skipped.
#[must_use]
pub fn template(sentence: &Term) -> smallvec::SmallVec<[Slot; 8]> {
    let mut out = smallvec::SmallVec::new();
    fill_template(sentence, &mut out);
    out
}

fn fill_template(term: &Term, out: &mut smallvec::SmallVec<[Slot; 8]>) {
    match term {
        Term::Const(s) => out.push(Slot::Const(*s)),
        Term::Var(v) => out.push(Slot::Var(*v)),
        Term::Func(_, args) => {
            for arg in args {
                fill_template(arg, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(text: &str) -> (Term, SymbolTable) {
        let mut symbols = SymbolTable::new();
        let rules = crate::gdl::reader::read_rules(text, &mut symbols).unwrap();
        (rules[0].head.clone(), symbols)
    }

    #[test]
    fn test_constants_and_variables_share_forms() {
        let mut table = FormTable::new();
        let (a, _) = sentence("(cell 1 1 b)");
        let (b, _) = sentence("(<= (cell ?x ?y b) (p ?x ?y))");
        assert_eq!(table.intern(&a), table.intern(&b));
        assert_eq!(table.slot_count(FormId(0)), 3);
    }

    #[test]
    fn test_nested_functions_split_forms() {
        let mut table = FormTable::new();
        let (flat, _) = sentence("(does x noop)");
        let (nested, _) = sentence("(does x (mark 1 1))");
        assert_ne!(table.intern(&flat), table.intern(&nested));
    }

    #[test]
    fn test_legal_aliases_to_does() {
        let mut table = FormTable::new();
        let (legal, _) = sentence("(legal x (mark 1 1))");
        let (does, _) = sentence("(does x (mark 1 1))");
        assert_eq!(table.intern(&legal), table.intern(&does));
    }

    #[test]
    fn test_next_and_init_alias_to_true() {
        let mut table = FormTable::new();
        let (next, _) = sentence("(next (cell 1 1 b))");
        let (init, _) = sentence("(init (cell 1 1 b))");
        let (tr, _) = sentence("(true (cell 1 1 b))");
        let id = table.intern(&tr);
        assert_eq!(table.intern(&next), id);
        assert_eq!(table.intern(&init), id);
    }

    #[test]
    fn test_propositions_share_the_degenerate_form() {
        let mut table = FormTable::new();
        let (open, _) = sentence("open");
        let (terminal, _) = sentence("terminal");
        assert_eq!(table.intern(&open), table.intern(&terminal));
        assert_eq!(table.slot_count(FormId(0)), 1);
    }

    #[test]
    fn test_template_slots() {
        let (s, symbols) = sentence("(<= (legal ?p (mark ?x 1)) (p ?p ?x))");
        let tmpl = template(&s);
        assert_eq!(tmpl.len(), 3);
        assert!(matches!(tmpl[0], Slot::Var(_)));
        assert!(matches!(tmpl[1], Slot::Var(_)));
        match tmpl[2] {
            Slot::Const(c) => assert_eq!(symbols.name(c), "1"),
            Slot::Var(_) => panic!("expected constant slot"),
        }
    }
}
