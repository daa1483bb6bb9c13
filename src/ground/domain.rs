//! Per-form domains and join indices.
//!
//! A domain holds every leaf-constant tuple derived so far for one
//! sentence form, plus one index per slot from constant to the tuples
//! carrying that constant there. The planner intersects these postings to
//! enumerate only tuples consistent with already-bound slots.
//!
//! `FunctionIndex` adds functional-dependency maps: for a slot whose value
//! is always uniquely determined by the other slots of the same tuple, the
//! planner can compute the value directly instead of enumerating
//! candidates. The maps are built once against stable domains; building
//! them mid-fixpoint would leave them stale tuple by tuple.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::gdl::{SymbolId, Term};
use super::form::{FormId, FormTable};

/// One ground sentence of a form, reduced to its leaf constants.
pub type Tuple = SmallVec<[SymbolId; 8]>;

/// Tuples and per-slot postings for one form.
#[derive(Clone, Debug, Default)]
pub struct Domain {
    tuples: Vec<Tuple>,
    seen: FxHashSet<Tuple>,
    indices: Vec<FxHashMap<SymbolId, Vec<u32>>>,
}

impl Domain {
    /// Insert a tuple, returning true if it is new. Insertion order is
    /// preserved, which keeps grounding output deterministic.
    pub fn insert(&mut self, tuple: Tuple) -> bool {
        if self.seen.contains(&tuple) {
            return false;
        }
        let id = self.tuples.len() as u32;
        if self.indices.len() < tuple.len() {
            self.indices.resize_with(tuple.len(), FxHashMap::default);
        }
        for (slot, &constant) in tuple.iter().enumerate() {
            self.indices[slot].entry(constant).or_default().push(id);
        }
        self.seen.insert(tuple.clone());
        self.tuples.push(tuple);
        true
    }

    #[must_use]
    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.seen.contains(tuple)
    }

    #[must_use]
    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Tuple ids whose `slot` holds `constant`; empty when none do.
    #[must_use]
    pub fn posting(&self, slot: usize, constant: SymbolId) -> &[u32] {
        self.indices
            .get(slot)
            .and_then(|index| index.get(&constant))
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn tuple(&self, id: u32) -> &Tuple {
        &self.tuples[id as usize]
    }
}

/// All domains, parallel to the form table.
#[derive(Clone, Debug, Default)]
pub struct DomainTable {
    pub forms: FormTable,
    domains: Vec<Domain>,
}

impl DomainTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a sentence's form, growing the domain vector as needed.
    pub fn register_form(&mut self, sentence: &Term) -> FormId {
        let form = self.forms.intern(sentence);
        if self.domains.len() <= form.index() {
            self.domains.resize_with(form.index() + 1, Domain::default);
        }
        form
    }

    /// Insert one tuple under a form. Returns true if the tuple is new.
    pub fn insert(&mut self, form: FormId, tuple: Tuple) -> bool {
        self.domains[form.index()].insert(tuple)
    }

    #[must_use]
    pub fn domain(&self, form: FormId) -> &Domain {
        &self.domains[form.index()]
    }

    /// Whether a ground sentence lies within its form's domain. Sentences
    /// whose form was never registered have an empty domain.
    #[must_use]
    pub fn contains_sentence(&self, sentence: &Term) -> bool {
        let Some(form) = self.forms.lookup(sentence) else {
            return false;
        };
        let Some(tuple) = sentence.leaf_constants() else {
            return false;
        };
        self.domains[form.index()].contains(&tuple)
    }

    /// Total tuple count across all forms, for budget enforcement.
    #[must_use]
    pub fn total_tuples(&self) -> usize {
        self.domains.iter().map(Domain::len).sum()
    }
}

/// Functional-dependency maps, one candidate per (form, dependent slot).
///
/// `Some(map)` means the slot's value is a function of the remaining
/// slots; `None` means two tuples disagreed and the slot cannot be used
/// as a shortcut.
#[derive(Clone, Debug, Default)]
pub struct FunctionIndex {
    per_form: Vec<Vec<Option<FxHashMap<Tuple, SymbolId>>>>,
}

impl FunctionIndex {
    /// Build dependency maps for every slot of every form.
    #[must_use]
    pub fn build(domains: &DomainTable) -> Self {
        let mut per_form = Vec::with_capacity(domains.forms.len());
        for form_idx in 0..domains.forms.len() {
            let domain = domains.domain(FormId(form_idx as u32));
            let slots = domains.forms.slot_count(FormId(form_idx as u32));
            let mut maps: Vec<Option<FxHashMap<Tuple, SymbolId>>> =
                (0..slots).map(|_| Some(FxHashMap::default())).collect();
            for tuple in domain.tuples() {
                for slot in 0..slots {
                    let Some(map) = maps[slot].as_mut() else { continue };
                    let key = key_without(tuple, slot);
                    match map.get(&key) {
                        Some(&value) if value != tuple[slot] => maps[slot] = None,
                        Some(_) => {}
                        None => {
                            map.insert(key, tuple[slot]);
                        }
                    }
                }
            }
            per_form.push(maps);
        }
        Self { per_form }
    }

    /// Direct lookup of a dependent slot's value from the other slots.
    /// `None` when the slot carries no valid dependency or the key tuple
    /// was never seen.
    #[must_use]
    pub fn lookup(&self, form: FormId, slot: usize, others: &Tuple) -> Option<SymbolId> {
        self.per_form
            .get(form.index())?
            .get(slot)?
            .as_ref()?
            .get(others)
            .copied()
    }

    /// Whether the slot carries a valid functional dependency at all.
    #[must_use]
    pub fn is_functional(&self, form: FormId, slot: usize) -> bool {
        matches!(
            self.per_form.get(form.index()).and_then(|maps| maps.get(slot)),
            Some(Some(_))
        )
    }
}

fn key_without(tuple: &Tuple, slot: usize) -> Tuple {
    tuple
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != slot)
        .map(|(_, &c)| c)
        .collect()
}
