//! Structural validation of programs
//!
//! Checks weights, annotated disjunctions, evidence groundness, built-in heads and
//! clause safety before a program is grounded.
//!
//! # Safety
//!
//! A variable is safe when it occurs in a positive, non-built-in body literal, or is
//! bound by `X = t` / `X is e` whose other side only uses safe variables. Every head
//! variable and every variable of a negated literal must be safe; otherwise grounding
//! could produce non-ground answers or flounder.
//!
//! ```ignore
//! // Safe:   reach(X) :- edge(1, X).
//! // Unsafe: lonely(X) :- \+ friend(X).
//! ```

use crate::builtins::is_builtin;
use probalog_ast::{Atom, Literal, Program, Statement, Symbol, Term};
use std::collections::HashSet;
use thiserror::Error;

const MASS_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgramError {
    #[error("invalid probability {weight} in '{clause}'")]
    InvalidWeight { clause: String, weight: f64 },
    #[error("annotated disjunction without heads: '{clause}'")]
    EmptyDisjunction { clause: String },
    #[error("annotated disjunction '{clause}' has total probability {total} > 1")]
    DisjunctionMass { clause: String, total: f64 },
    #[error("unsafe clause '{clause}': variables {variables:?} are not bound by a positive body literal")]
    UnsafeClause {
        clause: String,
        variables: Vec<String>,
    },
    #[error("evidence atom must be ground: {atom}")]
    NonGroundEvidence { atom: String },
    #[error("built-in predicate used as clause head: '{clause}'")]
    BuiltinHead { clause: String },
}

/// Validate a program, reporting the first offending statement
pub fn validate_program(program: &Program) -> Result<(), ProgramError> {
    for statement in &program.statements {
        validate_statement(statement)?;
    }
    Ok(())
}

fn validate_statement(statement: &Statement) -> Result<(), ProgramError> {
    match statement {
        Statement::Fact(fact) => check_clause(statement, &[&fact.atom], &[]),
        Statement::Rule(rule) => check_clause(statement, &[&rule.head], &rule.body),
        Statement::Probabilistic(clause) => {
            check_weight(statement, clause.probability)?;
            check_clause(statement, &[&clause.head], &clause.body)
        }
        Statement::AnnotatedDisjunction(ad) => {
            if ad.heads.is_empty() {
                return Err(ProgramError::EmptyDisjunction {
                    clause: statement.to_string(),
                });
            }
            for head in &ad.heads {
                check_weight(statement, head.probability)?;
            }
            let total: f64 = ad.heads.iter().map(|h| h.probability).sum();
            if total > 1.0 + MASS_TOLERANCE {
                return Err(ProgramError::DisjunctionMass {
                    clause: statement.to_string(),
                    total,
                });
            }
            let heads: Vec<&Atom> = ad.heads.iter().map(|h| &h.atom).collect();
            check_clause(statement, &heads, &ad.body)
        }
        Statement::Query(_) => Ok(()),
        Statement::Evidence(evidence) => {
            if evidence.atom.is_ground() {
                Ok(())
            } else {
                Err(ProgramError::NonGroundEvidence {
                    atom: evidence.atom.to_string(),
                })
            }
        }
    }
}

fn check_weight(statement: &Statement, weight: f64) -> Result<(), ProgramError> {
    if weight.is_nan() || !(0.0..=1.0).contains(&weight) {
        return Err(ProgramError::InvalidWeight {
            clause: statement.to_string(),
            weight,
        });
    }
    Ok(())
}

fn check_clause(
    statement: &Statement,
    heads: &[&Atom],
    body: &[Literal],
) -> Result<(), ProgramError> {
    for head in heads {
        if is_builtin(&head.predicate, head.arity()) {
            return Err(ProgramError::BuiltinHead {
                clause: statement.to_string(),
            });
        }
    }

    let safe = safe_variables(body);

    let mut unsafe_vars: Vec<Symbol> = Vec::new();
    let mut note = |var: Symbol| {
        if !safe.contains(&var) && !unsafe_vars.contains(&var) {
            unsafe_vars.push(var);
        }
    };
    for head in heads {
        head.variables().into_iter().for_each(&mut note);
    }
    for literal in body {
        if let Literal::Negative(atom) = literal {
            atom.variables().into_iter().for_each(&mut note);
        }
    }

    if unsafe_vars.is_empty() {
        Ok(())
    } else {
        Err(ProgramError::UnsafeClause {
            clause: statement.to_string(),
            variables: unsafe_vars.iter().map(|v| v.to_string()).collect(),
        })
    }
}

/// Variables bound by positive literals, closed under `=` and `is` bindings
fn safe_variables(body: &[Literal]) -> HashSet<Symbol> {
    let mut safe = HashSet::new();
    for literal in body {
        if let Literal::Positive(atom) = literal {
            if !is_builtin(&atom.predicate, atom.arity()) {
                safe.extend(atom.variables());
            }
        }
    }

    // Bindings may chain (X = Y, Y is Z + 1), so iterate to a fixpoint
    loop {
        let before = safe.len();
        for literal in body {
            let Literal::Positive(atom) = literal else {
                continue;
            };
            match (atom.predicate.as_str(), atom.terms.as_slice()) {
                ("=", [left, right]) => {
                    bind_if_safe(left, right, &mut safe);
                    bind_if_safe(right, left, &mut safe);
                }
                ("is", [target, expr]) => bind_if_safe(target, expr, &mut safe),
                _ => {}
            }
        }
        if safe.len() == before {
            break;
        }
    }
    safe
}

fn bind_if_safe(target: &Term, source: &Term, safe: &mut HashSet<Symbol>) {
    if source.variables().iter().all(|v| safe.contains(v)) {
        safe.extend(target.variables());
    }
}

#[cfg(test)]
#[path = "../tests/unit/validate_tests.rs"]
mod tests;
