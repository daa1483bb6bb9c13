//! SLD resolution over a game description.
//!
//! The prover answers sentence queries against the rule set plus a context
//! of `true` and `does` facts. Rules are renamed apart before each use, a
//! per-functor index keeps candidate fetching cheap, and an already-asking
//! guard cuts recursive re-entry so self-referential descriptions
//! terminate.
//!
//! Two caches, keyed by canonically renamed goals: a fixed cache for goals
//! whose derivation can never reach `true` or `does` (valid for the life
//! of the prover) and a per-query cache for everything else. Results found
//! under a recursion cut are never cached; they may be incomplete for that
//! entry point.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::gdl::{
    expand_disjunctions, reorder_negations, Game, Literal, Rule, SymbolId, SymbolTable, Term,
};
use super::unify::{canonicalize, substitute, unify, Renamer, Substitution};

/// Rules indexed by head functor.
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    rules: FxHashMap<SymbolId, Vec<Rule>>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn new(rules: &[Rule]) -> Self {
        let mut index: FxHashMap<SymbolId, Vec<Rule>> = FxHashMap::default();
        for rule in rules {
            if let Some(functor) = rule.head.name() {
                index.entry(functor).or_default().push(rule.clone());
            }
        }
        Self { rules: index }
    }

    #[must_use]
    pub fn fetch(&self, functor: SymbolId) -> &[Rule] {
        self.rules.get(&functor).map_or(&[], Vec::as_slice)
    }
}

/// Resolution engine for one game. Queries share the fixed cache; scratch
/// state is per query.
#[derive(Clone, Debug)]
pub struct Prover {
    kb: KnowledgeBase,
    /// Functors whose derivation may reach `true` or `does`.
    state_dependent: FxHashSet<SymbolId>,
    fixed: FxHashMap<Term, Vec<Term>>,
    first_free_var: u32,
}

impl Prover {
    #[must_use]
    pub fn new(game: &Game) -> Self {
        // Literals are proven in body order, so negations and distincts
        // must sit after the positive literals that bind their variables.
        // Disjunctions are expanded first; a negation nested in an `or`
        // is invisible to the reorderer otherwise.
        let expanded = expand_disjunctions(&game.rules);
        let reordered: Vec<Rule> = expanded.iter().map(reorder_negations).collect();
        Self {
            kb: KnowledgeBase::new(&reordered),
            state_dependent: state_dependent_functors(&game.rules),
            fixed: FxHashMap::default(),
            first_free_var: game.symbols.var_count() as u32,
        }
    }

    /// All ground answers to `query` under `context`, deduplicated, in
    /// derivation order.
    pub fn ask(&mut self, query: &Term, context: &FxHashSet<Term>) -> Vec<Term> {
        let mut search = Query {
            kb: &self.kb,
            context,
            state_dependent: &self.state_dependent,
            fixed: &mut self.fixed,
            cache: FxHashMap::default(),
            asking: FxHashSet::default(),
            renamer: Renamer::new(self.first_free_var),
            cut: false,
        };
        let mut thetas = Vec::new();
        search.ask_sentence(query, &Substitution::new(), &mut thetas);

        let mut seen = FxHashSet::default();
        let mut answers = Vec::new();
        for theta in thetas {
            let answer = substitute(query, &theta);
            if answer.is_ground() && seen.insert(answer.clone()) {
                answers.push(answer);
            }
        }
        answers
    }

    /// Whether at least one answer exists.
    pub fn prove(&mut self, query: &Term, context: &FxHashSet<Term>) -> bool {
        !self.ask(query, context).is_empty()
    }
}

/// Reachability to `true` / `does` in the functor dependency graph.
fn state_dependent_functors(rules: &[Rule]) -> FxHashSet<SymbolId> {
    fn body_functors(literal: &Literal, out: &mut Vec<SymbolId>) {
        match literal {
            Literal::Pos(t) | Literal::Not(t) => {
                if let Some(f) = t.name() {
                    out.push(f);
                }
            }
            Literal::Or(lits) => {
                for lit in lits {
                    body_functors(lit, out);
                }
            }
            Literal::Distinct(_, _) => {}
        }
    }

    let mut dependent: FxHashSet<SymbolId> =
        [SymbolTable::TRUE, SymbolTable::DOES].into_iter().collect();
    loop {
        let mut changed = false;
        for rule in rules {
            let Some(head) = rule.head.name() else { continue };
            if dependent.contains(&head) {
                continue;
            }
            let mut deps = Vec::new();
            for lit in &rule.body {
                body_functors(lit, &mut deps);
            }
            if deps.iter().any(|f| dependent.contains(f)) {
                dependent.insert(head);
                changed = true;
            }
        }
        if !changed {
            return dependent;
        }
    }
}

struct Query<'a> {
    kb: &'a KnowledgeBase,
    context: &'a FxHashSet<Term>,
    state_dependent: &'a FxHashSet<SymbolId>,
    fixed: &'a mut FxHashMap<Term, Vec<Term>>,
    cache: FxHashMap<Term, Vec<Term>>,
    asking: FxHashSet<Term>,
    renamer: Renamer,
    cut: bool,
}

impl Query<'_> {
    fn ask_sentence(
        &mut self,
        sentence: &Term,
        theta: &Substitution,
        out: &mut Vec<Substitution>,
    ) {
        let grounded = substitute(sentence, theta);
        let Some(functor) = grounded.name() else { return };

        // State facts come from the context, never from rules.
        if functor == SymbolTable::TRUE || functor == SymbolTable::DOES {
            for fact in self.context {
                if fact.name() == Some(functor) {
                    let mut th = theta.clone();
                    if unify(sentence, fact, &mut th) {
                        out.push(th);
                    }
                }
            }
            return;
        }

        let key = canonicalize(&grounded);
        let cached = self
            .fixed
            .get(&key)
            .or_else(|| self.cache.get(&key))
            .cloned();
        let answers = match cached {
            Some(answers) => answers,
            None => {
                if !self.asking.insert(key.clone()) {
                    // Recursive re-entry: contribute nothing here; the
                    // outer expansion of the same goal carries on.
                    self.cut = true;
                    return;
                }
                let outer_cut = std::mem::replace(&mut self.cut, false);

                let mut found = Vec::new();
                let mut seen = FxHashSet::default();
                let candidates = self.kb.fetch(functor).to_vec();
                for rule in &candidates {
                    let renamed = self.renamer.rename_rule(rule);
                    let mut th = Substitution::new();
                    if unify(&renamed.head, &grounded, &mut th) {
                        let mut sub = Vec::new();
                        self.ask_literals(&renamed.body, th, &mut sub);
                        for result in sub {
                            let answer = substitute(&renamed.head, &result);
                            if seen.insert(answer.clone()) {
                                found.push(answer);
                            }
                        }
                    }
                }

                self.asking.remove(&key);
                let had_cut = self.cut;
                self.cut = outer_cut || had_cut;
                if !had_cut {
                    if self.state_dependent.contains(&functor) {
                        self.cache.insert(key, found.clone());
                    } else {
                        self.fixed.insert(key, found.clone());
                    }
                }
                found
            }
        };

        for answer in &answers {
            // Cached answers may carry free variables from an earlier
            // renaming; rename apart before unifying with the query.
            let fresh = self.renamer.rename_term(answer);
            let mut th = theta.clone();
            if unify(sentence, &fresh, &mut th) {
                out.push(th);
            }
        }
    }

    fn ask_literals(
        &mut self,
        goals: &[Literal],
        theta: Substitution,
        out: &mut Vec<Substitution>,
    ) {
        let Some((first, rest)) = goals.split_first() else {
            out.push(theta);
            return;
        };
        match first {
            Literal::Pos(sentence) => {
                let mut answers = Vec::new();
                self.ask_sentence(sentence, &theta, &mut answers);
                for th in answers {
                    self.ask_literals(rest, th, out);
                }
            }
            Literal::Not(sentence) => {
                let mut answers = Vec::new();
                self.ask_sentence(sentence, &theta, &mut answers);
                if answers.is_empty() {
                    self.ask_literals(rest, theta, out);
                }
            }
            Literal::Distinct(a, b) => {
                if substitute(a, &theta) != substitute(b, &theta) {
                    self.ask_literals(rest, theta, out);
                }
            }
            Literal::Or(disjuncts) => {
                for disjunct in disjuncts {
                    let mut goals = Vec::with_capacity(rest.len() + 1);
                    goals.push(disjunct.clone());
                    goals.extend_from_slice(rest);
                    self.ask_literals(&goals, theta.clone(), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdl::VarId;

    const PUZZLE: &str = "
        (role robot)
        (init off)
        (<= (legal robot proceed) (true off))
        (<= (next on) (does robot proceed))
        (goal robot 100)
        (<= terminal (true on))
    ";

    fn prover(text: &str) -> (Prover, Game) {
        let game = Game::from_kif(text).unwrap();
        (Prover::new(&game), game)
    }

    fn var(game: &Game, id: u32) -> Term {
        let _ = game;
        Term::Var(VarId(id + 1000))
    }

    fn query1(game: &Game, functor: SymbolId) -> Term {
        Term::Func(functor, vec![var(game, 0)])
    }

    #[test]
    fn test_init_query() {
        let (mut prover, game) = prover(PUZZLE);
        let answers = prover.ask(&query1(&game, SymbolTable::INIT), &FxHashSet::default());
        let off = game.symbols.lookup("off").unwrap();
        assert_eq!(
            answers,
            vec![Term::Func(SymbolTable::INIT, vec![Term::Const(off)])]
        );
    }

    #[test]
    fn test_legal_depends_on_context() {
        let (mut prover, game) = prover(PUZZLE);
        let robot = game.symbols.lookup("robot").unwrap();
        let off = game.symbols.lookup("off").unwrap();
        let query = Term::Func(
            SymbolTable::LEGAL,
            vec![Term::Const(robot), var(&game, 0)],
        );

        let empty = FxHashSet::default();
        assert!(prover.ask(&query, &empty).is_empty());

        let mut context = FxHashSet::default();
        context.insert(Term::Func(SymbolTable::TRUE, vec![Term::Const(off)]));
        let answers = prover.ask(&query, &context);
        assert_eq!(answers.len(), 1);
        let proceed = game.symbols.lookup("proceed").unwrap();
        assert_eq!(answers[0].args()[1], Term::Const(proceed));
    }

    #[test]
    fn test_next_from_does() {
        let (mut prover, game) = prover(PUZZLE);
        let robot = game.symbols.lookup("robot").unwrap();
        let proceed = game.symbols.lookup("proceed").unwrap();
        let on = game.symbols.lookup("on").unwrap();

        let mut context = FxHashSet::default();
        context.insert(Term::Func(
            SymbolTable::DOES,
            vec![Term::Const(robot), Term::Const(proceed)],
        ));
        let answers = prover.ask(&query1(&game, SymbolTable::NEXT), &context);
        assert_eq!(
            answers,
            vec![Term::Func(SymbolTable::NEXT, vec![Term::Const(on)])]
        );
    }

    #[test]
    fn test_negation_as_failure() {
        let text = "
            (role robot)
            (init off)
            (cell a)
            (cell b)
            (blocked a)
            (<= (open ?x) (cell ?x) (not (blocked ?x)))
            (<= (legal robot noop) (true off))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let (mut prover, game) = prover(text);
        let open = game.symbols.lookup("open").unwrap();
        let b = game.symbols.lookup("b").unwrap();
        let answers = prover.ask(&query1(&game, open), &FxHashSet::default());
        assert_eq!(answers, vec![Term::Func(open, vec![Term::Const(b)])]);
    }

    #[test]
    fn test_distinct_filters_bindings() {
        let text = "
            (role robot)
            (init off)
            (thing a)
            (thing b)
            (<= (pair ?x ?y) (thing ?x) (thing ?y) (distinct ?x ?y))
            (<= (legal robot noop) (true off))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let (mut prover, game) = prover(text);
        let pair = game.symbols.lookup("pair").unwrap();
        let query = Term::Func(pair, vec![var(&game, 0), var(&game, 1)]);
        let answers = prover.ask(&query, &FxHashSet::default());
        assert_eq!(answers.len(), 2);
        for answer in answers {
            assert_ne!(answer.args()[0], answer.args()[1]);
        }
    }

    #[test]
    fn test_recursive_rules_terminate() {
        let text = "
            (role robot)
            (init off)
            (edge a b)
            (edge b c)
            (<= (path ?x ?y) (edge ?x ?y))
            (<= (path ?x ?z) (edge ?x ?y) (path ?y ?z))
            (<= (legal robot noop) (true off))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let (mut prover, game) = prover(text);
        let path = game.symbols.lookup("path").unwrap();
        let a = game.symbols.lookup("a").unwrap();
        let query = Term::Func(path, vec![Term::Const(a), var(&game, 0)]);
        let answers = prover.ask(&query, &FxHashSet::default());
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn test_disjunction_in_body() {
        let text = "
            (role robot)
            (init off)
            (p a)
            (q b)
            (<= (either ?x) (or (p ?x) (q ?x)))
            (<= (legal robot noop) (true off))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let (mut prover, game) = prover(text);
        let either = game.symbols.lookup("either").unwrap();
        let answers = prover.ask(&query1(&game, either), &FxHashSet::default());
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn test_negation_inside_disjunction_waits_for_its_binder() {
        let text = "
            (role robot)
            (init off)
            (r a)
            (q b)
            (<= p (or (not (r ?x)) (s ?x)) (q ?x))
            (<= (legal robot noop) (true off))
            (goal robot 100)
            (<= terminal (true on))
        ";
        let (mut prover, game) = prover(text);
        let p = game.symbols.lookup("p").unwrap();
        // The disjunct (not (r ?x)) must only be tested after (q ?x)
        // binds ?x to b; (r b) is not a fact, so p holds.
        assert!(prover.prove(&Term::Const(p), &FxHashSet::default()));
    }

    #[test]
    fn test_fixed_cache_reused_across_queries() {
        let (mut prover, game) = prover(PUZZLE);
        let first = prover.ask(&query1(&game, SymbolTable::INIT), &FxHashSet::default());
        let second = prover.ask(&query1(&game, SymbolTable::INIT), &FxHashSet::default());
        assert_eq!(first, second);
        assert!(!prover.fixed.is_empty());
    }
}
