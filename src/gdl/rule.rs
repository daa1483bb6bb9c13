//! Rules, literals, roles, and the loaded `Game`.
//!
//! A rule is a head sentence with a conjunctive body of literals; a fact is
//! a rule with an empty body. `Game` is the frozen result of loading a
//! description: the interning table, the rules, and the roles in
//! declaration order. Role order matters because a joint move is an ordered
//! move-per-role vector.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;
use super::symbol::{SymbolId, SymbolTable, VarId};
use super::term::Term;

/// One body literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// A positive sentence.
    Pos(Term),
    /// Negation of a sentence (negation as failure).
    Not(Term),
    /// A disjunction of literals; removed before grounding or proving.
    Or(Vec<Literal>),
    /// Syntactic inequality of two terms.
    Distinct(Term, Term),
}

impl Literal {
    /// Collect every variable in first-occurrence order.
    pub fn collect_vars(&self, out: &mut Vec<VarId>) {
        match self {
            Literal::Pos(t) | Literal::Not(t) => t.collect_vars(out),
            Literal::Or(lits) => {
                for lit in lits {
                    lit.collect_vars(out);
                }
            }
            Literal::Distinct(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
        }
    }

    #[must_use]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> LiteralDisplay<'a> {
        LiteralDisplay { literal: self, symbols }
    }
}

pub struct LiteralDisplay<'a> {
    literal: &'a Literal,
    symbols: &'a SymbolTable,
}

impl fmt::Display for LiteralDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal {
            Literal::Pos(t) => write!(f, "{}", t.display(self.symbols)),
            Literal::Not(t) => write!(f, "(not {})", t.display(self.symbols)),
            Literal::Or(lits) => {
                write!(f, "(or")?;
                for lit in lits {
                    write!(f, " {}", lit.display(self.symbols))?;
                }
                write!(f, ")")
            }
            Literal::Distinct(a, b) => write!(
                f,
                "(distinct {} {})",
                a.display(self.symbols),
                b.display(self.symbols)
            ),
        }
    }
}

/// A Horn clause: head sentence, conjunctive body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub head: Term,
    pub body: Vec<Literal>,
}

impl Rule {
    #[must_use]
    pub fn fact(head: Term) -> Self {
        Self { head, body: Vec::new() }
    }

    #[must_use]
    pub fn is_fact(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> RuleDisplay<'a> {
        RuleDisplay { rule: self, symbols }
    }
}

pub struct RuleDisplay<'a> {
    rule: &'a Rule,
    symbols: &'a SymbolTable,
}

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rule.is_fact() {
            return write!(f, "{}", self.rule.head.display(self.symbols));
        }
        write!(f, "(<= {}", self.rule.head.display(self.symbols))?;
        for lit in &self.rule.body {
            write!(f, " {}", lit.display(self.symbols))?;
        }
        write!(f, ")")
    }
}

/// One player of the game, identified by its declared name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Role(pub SymbolId);

impl Role {
    #[must_use]
    pub const fn new(name: SymbolId) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn name(self) -> SymbolId {
        self.0
    }
}

/// A loaded game description, immutable for the life of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    pub symbols: SymbolTable,
    pub rules: Vec<Rule>,
    pub roles: Vec<Role>,
}

impl Game {
    /// Parse a KIF-subset description and validate it.
    ///
    /// Validation covers: at least one role, ground constant role names,
    /// rule safety (every head / `not` / `distinct` variable must occur in
    /// a positive body literal), and a defined `terminal` sentence.
    pub fn from_kif(text: &str) -> Result<Game, EngineError> {
        let mut symbols = SymbolTable::new();
        let rules = super::reader::read_rules(text, &mut symbols)?;
        let roles = compute_roles(&rules, &symbols)?;
        validate_rules(&rules, &symbols)?;
        Ok(Game { symbols, rules, roles })
    }

    /// Position of a role in declaration order.
    #[must_use]
    pub fn role_index(&self, role: Role) -> Option<usize> {
        self.roles.iter().position(|r| *r == role)
    }
}

/// Roles come from the ground `(role X)` facts, in declaration order.
fn compute_roles(rules: &[Rule], symbols: &SymbolTable) -> Result<Vec<Role>, EngineError> {
    let mut roles = Vec::new();
    for rule in rules {
        if rule.head.name() != Some(SymbolTable::ROLE) {
            continue;
        }
        if !rule.is_fact() {
            return Err(EngineError::MalformedRule {
                rule: rule.display(symbols).to_string(),
                reason: "role sentences must be facts".into(),
            });
        }
        match rule.head.args() {
            [Term::Const(name)] => {
                let role = Role::new(*name);
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            _ => {
                return Err(EngineError::MalformedRule {
                    rule: rule.display(symbols).to_string(),
                    reason: "role names must be single constants".into(),
                })
            }
        }
    }
    if roles.is_empty() {
        return Err(EngineError::MalformedRule {
            rule: "(role ...)".into(),
            reason: "description declares no roles".into(),
        });
    }
    Ok(roles)
}

/// Rule safety plus the `terminal` definition check.
fn validate_rules(rules: &[Rule], symbols: &SymbolTable) -> Result<(), EngineError> {
    let mut has_terminal = false;
    for rule in rules {
        if rule.head.name() == Some(SymbolTable::TERMINAL) {
            has_terminal = true;
        }
        check_safety(rule, symbols)?;
    }
    if !has_terminal {
        return Err(EngineError::MalformedRule {
            rule: "terminal".into(),
            reason: "no rule or fact defines terminal".into(),
        });
    }
    Ok(())
}

/// Every variable in the head, in a negation, or in a `distinct` must also
/// occur in a positive body literal; otherwise its domain is unbounded.
/// Disjunctions are checked disjunct by disjunct after expansion.
fn check_safety(rule: &Rule, symbols: &SymbolTable) -> Result<(), EngineError> {
    for expanded in super::transform::expand_rule(rule) {
        let mut bound = Vec::new();
        for lit in &expanded.body {
            if let Literal::Pos(t) = lit {
                t.collect_vars(&mut bound);
            }
        }
        let mut needed = Vec::new();
        expanded.head.collect_vars(&mut needed);
        for lit in &expanded.body {
            match lit {
                Literal::Not(t) => t.collect_vars(&mut needed),
                Literal::Distinct(a, b) => {
                    a.collect_vars(&mut needed);
                    b.collect_vars(&mut needed);
                }
                _ => {}
            }
        }
        for var in needed {
            if !bound.contains(&var) {
                return Err(EngineError::UnboundedVariable {
                    variable: symbols.var_name(var),
                    rule: expanded.display(symbols).to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = "
        (role robot)
        (init off)
        (<= (legal robot proceed) (true off))
        (<= (next on) (does robot proceed))
        (goal robot 100)
        (<= terminal (true on))
    ";

    #[test]
    fn test_from_kif_roles_in_order() {
        let game = Game::from_kif(TINY).unwrap();
        assert_eq!(game.roles.len(), 1);
        assert_eq!(game.symbols.name(game.roles[0].name()), "robot");
    }

    #[test]
    fn test_missing_roles_rejected() {
        let err = Game::from_kif("(<= terminal (true on))").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_missing_terminal_rejected() {
        let err = Game::from_kif("(role robot) (init off)").unwrap_err();
        assert!(matches!(err, EngineError::MalformedRule { .. }));
    }

    #[test]
    fn test_unsafe_head_variable_rejected() {
        let text = "
            (role robot)
            (<= (next (value ?x)) (true off))
            (<= terminal (true on))
        ";
        let err = Game::from_kif(text).unwrap_err();
        assert!(matches!(err, EngineError::UnboundedVariable { .. }));
    }

    #[test]
    fn test_unsafe_negation_variable_rejected() {
        let text = "
            (role robot)
            (<= (legal robot proceed) (not (blocked ?x)))
            (<= terminal (true on))
        ";
        let err = Game::from_kif(text).unwrap_err();
        assert!(matches!(err, EngineError::UnboundedVariable { .. }));
    }

    #[test]
    fn test_rule_display_round_trips_shape() {
        let game = Game::from_kif(TINY).unwrap();
        let printed = game.rules[2].display(&game.symbols).to_string();
        assert_eq!(printed, "(<= (legal robot proceed) (true off))");
    }
}
