//! KIF-subset reader.
//!
//! Descriptions arrive as s-expressions: `;` comments run to end of line,
//! `(<= head body...)` builds a rule, any other top-level sentence is a
//! fact, `?name` atoms are variables, and `not` / `or` / `distinct` are the
//! only special body functors.
//!
//! `(not (or a b))` is rewritten by De Morgan into the conjoined negations
//! `(not a) (not b)`; doubled negations and negated `distinct` are rejected
//! as parse errors rather than mishandled downstream.

use crate::error::EngineError;
use super::rule::{Literal, Rule};
use super::symbol::SymbolTable;
use super::term::Term;

#[derive(Debug)]
enum Expr {
    Atom(String, usize),
    List(Vec<Expr>, usize),
}

impl Expr {
    fn line(&self) -> usize {
        match self {
            Expr::Atom(_, line) | Expr::List(_, line) => *line,
        }
    }
}

/// Parse a description into rules, interning names as they appear.
pub fn read_rules(text: &str, symbols: &mut SymbolTable) -> Result<Vec<Rule>, EngineError> {
    let tokens = tokenize(text);
    let exprs = parse_exprs(&tokens)?;
    let mut rules = Vec::new();
    for expr in &exprs {
        rules.push(read_rule(expr, symbols)?);
    }
    Ok(rules)
}

fn tokenize(text: &str) -> Vec<(String, usize)> {
    let mut tokens = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let code = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let padded = code.replace('(', " ( ").replace(')', " ) ");
        for word in padded.split_whitespace() {
            tokens.push((word.to_string(), lineno + 1));
        }
    }
    tokens
}

fn parse_exprs(tokens: &[(String, usize)]) -> Result<Vec<Expr>, EngineError> {
    let mut exprs = Vec::new();
    let mut pos = 0;
    while pos < tokens.len() {
        let (expr, next) = parse_expr(tokens, pos)?;
        exprs.push(expr);
        pos = next;
    }
    Ok(exprs)
}

fn parse_expr(tokens: &[(String, usize)], pos: usize) -> Result<(Expr, usize), EngineError> {
    let (token, line) = &tokens[pos];
    if token == "(" {
        let mut items = Vec::new();
        let mut cursor = pos + 1;
        loop {
            match tokens.get(cursor) {
                Some((t, _)) if t == ")" => return Ok((Expr::List(items, *line), cursor + 1)),
                Some(_) => {
                    let (item, next) = parse_expr(tokens, cursor)?;
                    items.push(item);
                    cursor = next;
                }
                None => {
                    return Err(EngineError::Parse {
                        line: *line,
                        reason: "unbalanced parenthesis".into(),
                    })
                }
            }
        }
    } else if token == ")" {
        Err(EngineError::Parse {
            line: *line,
            reason: "unexpected closing parenthesis".into(),
        })
    } else {
        Ok((Expr::Atom(token.clone(), *line), pos + 1))
    }
}

fn read_rule(expr: &Expr, symbols: &mut SymbolTable) -> Result<Rule, EngineError> {
    if let Expr::List(items, line) = expr {
        if let Some(Expr::Atom(head, _)) = items.first() {
            if head == "<=" {
                if items.len() < 2 {
                    return Err(EngineError::Parse {
                        line: *line,
                        reason: "rule without a head".into(),
                    });
                }
                let head = read_sentence(&items[1], symbols)?;
                let mut body = Vec::new();
                for item in &items[2..] {
                    read_literal(item, symbols, &mut body)?;
                }
                return Ok(Rule { head, body });
            }
        }
    }
    Ok(Rule::fact(read_sentence(expr, symbols)?))
}

/// A sentence in head or fact position: no variables allowed at the functor,
/// no `not` / `or` / `distinct`.
fn read_sentence(expr: &Expr, symbols: &mut SymbolTable) -> Result<Term, EngineError> {
    let term = read_term(expr, symbols)?;
    match &term {
        Term::Var(_) => Err(EngineError::Parse {
            line: expr.line(),
            reason: "a variable cannot stand as a sentence".into(),
        }),
        _ => Ok(term),
    }
}

fn read_term(expr: &Expr, symbols: &mut SymbolTable) -> Result<Term, EngineError> {
    match expr {
        Expr::Atom(atom, _) => {
            if let Some(name) = atom.strip_prefix('?') {
                Ok(Term::Var(symbols.intern_var(name)))
            } else {
                Ok(Term::Const(symbols.intern(atom)))
            }
        }
        Expr::List(items, line) => {
            let name = match items.first() {
                Some(Expr::Atom(name, _)) if !name.starts_with('?') => symbols.intern(name),
                _ => {
                    return Err(EngineError::Parse {
                        line: *line,
                        reason: "function must start with a constant name".into(),
                    })
                }
            };
            let mut args = Vec::new();
            for item in &items[1..] {
                args.push(read_term(item, symbols)?);
            }
            if args.is_empty() {
                return Err(EngineError::Parse {
                    line: *line,
                    reason: "empty function application".into(),
                });
            }
            Ok(Term::Func(name, args))
        }
    }
}

/// Read one body literal. De Morgan on `(not (or ...))` can contribute
/// several literals, so output goes through `out`.
fn read_literal(
    expr: &Expr,
    symbols: &mut SymbolTable,
    out: &mut Vec<Literal>,
) -> Result<(), EngineError> {
    if let Expr::List(items, line) = expr {
        if let Some(Expr::Atom(head, _)) = items.first() {
            match head.as_str() {
                "not" => {
                    if items.len() != 2 {
                        return Err(EngineError::Parse {
                            line: *line,
                            reason: "not takes exactly one literal".into(),
                        });
                    }
                    return read_negation(&items[1], symbols, out);
                }
                "or" => {
                    let mut disjuncts = Vec::new();
                    for item in &items[1..] {
                        let mut inner = Vec::new();
                        read_literal(item, symbols, &mut inner)?;
                        if inner.len() == 1 {
                            disjuncts.push(inner.pop().unwrap_or(Literal::Or(Vec::new())));
                        } else {
                            // A De-Morganed (not (or ...)) inside an or has
                            // no single-literal form; nest it back up.
                            disjuncts.push(Literal::Or(inner));
                        }
                    }
                    if disjuncts.is_empty() {
                        return Err(EngineError::Parse {
                            line: *line,
                            reason: "empty disjunction".into(),
                        });
                    }
                    out.push(Literal::Or(disjuncts));
                    return Ok(());
                }
                "distinct" => {
                    if items.len() != 3 {
                        return Err(EngineError::Parse {
                            line: *line,
                            reason: "distinct takes exactly two terms".into(),
                        });
                    }
                    let a = read_term(&items[1], symbols)?;
                    let b = read_term(&items[2], symbols)?;
                    out.push(Literal::Distinct(a, b));
                    return Ok(());
                }
                _ => {}
            }
        }
    }
    out.push(Literal::Pos(read_sentence(expr, symbols)?));
    Ok(())
}

fn read_negation(
    inner: &Expr,
    symbols: &mut SymbolTable,
    out: &mut Vec<Literal>,
) -> Result<(), EngineError> {
    if let Expr::List(items, line) = inner {
        if let Some(Expr::Atom(head, _)) = items.first() {
            match head.as_str() {
                "or" => {
                    // (not (or a b)) == (not a) (not b)
                    for item in &items[1..] {
                        read_negation(item, symbols, out)?;
                    }
                    return Ok(());
                }
                "not" => {
                    return Err(EngineError::Parse {
                        line: *line,
                        reason: "doubled negation is not supported".into(),
                    });
                }
                "distinct" => {
                    return Err(EngineError::Parse {
                        line: *line,
                        reason: "negated distinct is not supported".into(),
                    });
                }
                _ => {}
            }
        }
    }
    out.push(Literal::Not(read_sentence(inner, symbols)?));
    Ok(())
}
