//! Built-in predicates and arithmetic evaluation
//!
//! Built-ins are evaluated during resolution instead of being looked up in the
//! clause database. They never create formula nodes: a built-in either extends the
//! current substitution (deterministically true) or fails.
//!
//! # Supported Built-ins
//!
//! - **Unification**: `=`, `\=`
//! - **Structural identity**: `==`, `\==`
//! - **Arithmetic comparison**: `<`, `>`, `=<`/`<=`, `>=`, `=:=`, `=\=`
//! - **Arithmetic evaluation**: `X is Expr` with `+`, `-`, `*`, `/`, `mod`
//! - **Control**: `true`, `fail`/`false`

use crate::unification::{unify, Substitution};
use probalog_ast::{Atom, Term, Value};
use thiserror::Error;

/// Arithmetic comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    Lt,    // <
    Gt,    // >
    Lte,   // =<
    Gte,   // >=
    Eq,    // =:=
    Neq,   // =\=
}

/// Built-in predicates that can be evaluated directly
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    Unify(Term, Term),
    NotUnifiable(Term, Term),
    Identical(Term, Term),
    NotIdentical(Term, Term),
    Comparison(CompOp, Term, Term),
    Is(Term, Term),
    True,
    Fail,
}

/// Why a built-in could not be evaluated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuiltinError {
    #[error("arguments are not sufficiently instantiated: {0}")]
    Instantiation(Term),
    #[error("not a number: {0}")]
    NotNumeric(Term),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(Numeric::Int(*i)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            _ => None,
        }
    }

    fn to_term(self) -> Term {
        match self {
            Numeric::Int(i) => Term::integer(i),
            Numeric::Float(f) => Term::float(f),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    fn add(self, other: Numeric) -> Result<Numeric, BuiltinError> {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => {
                l.checked_add(r).map(Numeric::Int).ok_or(BuiltinError::Overflow)
            }
            (l, r) => Ok(Numeric::Float(l.to_f64() + r.to_f64())),
        }
    }

    fn sub(self, other: Numeric) -> Result<Numeric, BuiltinError> {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => {
                l.checked_sub(r).map(Numeric::Int).ok_or(BuiltinError::Overflow)
            }
            (l, r) => Ok(Numeric::Float(l.to_f64() - r.to_f64())),
        }
    }

    fn mul(self, other: Numeric) -> Result<Numeric, BuiltinError> {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => {
                l.checked_mul(r).map(Numeric::Int).ok_or(BuiltinError::Overflow)
            }
            (l, r) => Ok(Numeric::Float(l.to_f64() * r.to_f64())),
        }
    }

    fn div(self, other: Numeric) -> Result<Numeric, BuiltinError> {
        match (self, other) {
            (Numeric::Int(_), Numeric::Int(0)) => Err(BuiltinError::DivisionByZero),
            (Numeric::Int(l), Numeric::Int(r)) => {
                l.checked_div(r).map(Numeric::Int).ok_or(BuiltinError::Overflow)
            }
            (l, r) => {
                let divisor = r.to_f64();
                if divisor == 0.0 {
                    Err(BuiltinError::DivisionByZero)
                } else {
                    Ok(Numeric::Float(l.to_f64() / divisor))
                }
            }
        }
    }

    fn modulo(self, other: Numeric) -> Result<Numeric, BuiltinError> {
        match (self, other) {
            (Numeric::Int(_), Numeric::Int(0)) => Err(BuiltinError::DivisionByZero),
            (Numeric::Int(l), Numeric::Int(r)) => {
                l.checked_rem_euclid(r).map(Numeric::Int).ok_or(BuiltinError::Overflow)
            }
            (l, r) => {
                let divisor = r.to_f64();
                if divisor == 0.0 {
                    Err(BuiltinError::DivisionByZero)
                } else {
                    Ok(Numeric::Float(l.to_f64().rem_euclid(divisor)))
                }
            }
        }
    }

    fn compare(self, op: CompOp, other: Numeric) -> bool {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => match op {
                CompOp::Lt => l < r,
                CompOp::Gt => l > r,
                CompOp::Lte => l <= r,
                CompOp::Gte => l >= r,
                CompOp::Eq => l == r,
                CompOp::Neq => l != r,
            },
            (l, r) => {
                let (l, r) = (l.to_f64(), r.to_f64());
                match op {
                    CompOp::Lt => l < r,
                    CompOp::Gt => l > r,
                    CompOp::Lte => l <= r,
                    CompOp::Gte => l >= r,
                    CompOp::Eq => l == r,
                    CompOp::Neq => l != r,
                }
            }
        }
    }
}

fn eval_numeric(term: &Term, subst: &Substitution) -> Result<Numeric, BuiltinError> {
    match subst.apply(term) {
        Term::Variable(name) => Err(BuiltinError::Instantiation(Term::Variable(name))),
        Term::Constant(value) => {
            Numeric::from_value(&value).ok_or(BuiltinError::NotNumeric(Term::Constant(value)))
        }
        Term::Compound(functor, args) => match (functor.as_str(), args.as_slice()) {
            ("+", [l, r]) => eval_numeric(l, subst)?.add(eval_numeric(r, subst)?),
            ("-", [l, r]) => eval_numeric(l, subst)?.sub(eval_numeric(r, subst)?),
            ("*", [l, r]) => eval_numeric(l, subst)?.mul(eval_numeric(r, subst)?),
            ("/", [l, r]) => eval_numeric(l, subst)?.div(eval_numeric(r, subst)?),
            ("mod", [l, r]) => eval_numeric(l, subst)?.modulo(eval_numeric(r, subst)?),
            ("-", [x]) => Numeric::Int(0).sub(eval_numeric(x, subst)?),
            _ => Err(BuiltinError::NotNumeric(Term::Compound(functor, args.clone()))),
        },
    }
}

/// Evaluate an arithmetic expression to a numeric constant
pub fn eval_arith(term: &Term, subst: &Substitution) -> Result<Term, BuiltinError> {
    eval_numeric(term, subst).map(Numeric::to_term)
}

/// Evaluate a built-in.
///
/// Returns the extended substitution on success and `None` on failure.
pub fn eval_builtin(
    builtin: &BuiltIn,
    subst: &Substitution,
) -> Result<Option<Substitution>, BuiltinError> {
    match builtin {
        BuiltIn::Unify(left, right) => {
            let mut extended = subst.clone();
            Ok(unify(left, right, &mut extended).then_some(extended))
        }
        BuiltIn::NotUnifiable(left, right) => {
            let mut scratch = subst.clone();
            Ok((!unify(left, right, &mut scratch)).then(|| subst.clone()))
        }
        BuiltIn::Identical(left, right) => {
            Ok((subst.apply(left) == subst.apply(right)).then(|| subst.clone()))
        }
        BuiltIn::NotIdentical(left, right) => {
            Ok((subst.apply(left) != subst.apply(right)).then(|| subst.clone()))
        }
        BuiltIn::Comparison(op, left, right) => {
            let l = eval_numeric(left, subst)?;
            let r = eval_numeric(right, subst)?;
            Ok(l.compare(*op, r).then(|| subst.clone()))
        }
        BuiltIn::Is(result, expr) => {
            let value = eval_arith(expr, subst)?;
            let mut extended = subst.clone();
            Ok(unify(result, &value, &mut extended).then_some(extended))
        }
        BuiltIn::True => Ok(Some(subst.clone())),
        BuiltIn::Fail => Ok(None),
    }
}

/// Does this predicate name and arity denote a built-in?
pub fn is_builtin(predicate: &str, arity: usize) -> bool {
    matches!(
        (predicate, arity),
        ("=" | "\\=" | "==" | "\\==" | "<" | ">" | "=<" | "<=" | ">=" | "=:=" | "=\\=" | "is", 2)
            | ("true" | "fail" | "false", 0)
    )
}

/// Parse an atom as a built-in predicate, or `None` if it is an ordinary atom
pub fn parse_builtin(atom: &Atom) -> Option<BuiltIn> {
    let pair = || (atom.terms[0].clone(), atom.terms[1].clone());

    match (atom.predicate.as_str(), atom.terms.len()) {
        ("=", 2) => {
            let (l, r) = pair();
            Some(BuiltIn::Unify(l, r))
        }
        ("\\=", 2) => {
            let (l, r) = pair();
            Some(BuiltIn::NotUnifiable(l, r))
        }
        ("==", 2) => {
            let (l, r) = pair();
            Some(BuiltIn::Identical(l, r))
        }
        ("\\==", 2) => {
            let (l, r) = pair();
            Some(BuiltIn::NotIdentical(l, r))
        }
        ("is", 2) => {
            let (l, r) = pair();
            Some(BuiltIn::Is(l, r))
        }
        (name, 2) => {
            let op = match name {
                "<" => CompOp::Lt,
                ">" => CompOp::Gt,
                "=<" | "<=" => CompOp::Lte,
                ">=" => CompOp::Gte,
                "=:=" => CompOp::Eq,
                "=\\=" => CompOp::Neq,
                _ => return None,
            };
            let (l, r) = pair();
            Some(BuiltIn::Comparison(op, l, r))
        }
        ("true", 0) => Some(BuiltIn::True),
        ("fail" | "false", 0) => Some(BuiltIn::Fail),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/unit/builtins_tests.rs"]
mod tests;
