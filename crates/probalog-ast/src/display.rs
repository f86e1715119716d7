//! Prolog-style rendering of terms, atoms and statements.
//!
//! The output of `Display` for ground atoms is the naming format used by the
//! formula dump, so it must stay re-parseable: floats use the shortest
//! round-trip representation and non-identifier symbols are single-quoted.

use crate::*;
use std::fmt;

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub(crate) fn write_symbol(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_identifier(name) {
        write!(f, "{}", name)
    } else {
        write_quoted(f, name, '\'')
    }
}

/// Quote `text`, escaping the delimiter, backslashes, newlines and tabs so the
/// result stays on one line
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str, delimiter: char) -> fmt::Result {
    write!(f, "{}", delimiter)?;
    for c in text.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c if c == delimiter => write!(f, "\\{}", c)?,
            other => write!(f, "{}", other)?,
        }
    }
    write!(f, "{}", delimiter)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            // Debug keeps the trailing `.0`, which distinguishes 1.0 from 1
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write_quoted(f, s, '"'),
            Value::Atom(a) => write_symbol(f, a),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{}", name),
            Term::Constant(value) => write!(f, "{}", value),
            Term::Compound(functor, args) => {
                write_symbol(f, functor)?;
                if args.is_empty() {
                    Ok(())
                } else {
                    write_args(f, args)
                }
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Term]) -> fmt::Result {
    write!(f, "(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ")")
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbol(f, &self.predicate)?;
        if self.terms.is_empty() {
            Ok(())
        } else {
            write_args(f, &self.terms)
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Positive(atom) => write!(f, "{}", atom),
            Literal::Negative(atom) => write!(f, "\\+{}", atom),
        }
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &[Literal]) -> fmt::Result {
    if body.is_empty() {
        return Ok(());
    }
    write!(f, " :- ")?;
    for (i, literal) in body.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", literal)?;
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Fact(fact) => write!(f, "{}.", fact.atom),
            Statement::Rule(rule) => {
                write!(f, "{}", rule.head)?;
                write_body(f, &rule.body)?;
                write!(f, ".")
            }
            Statement::Probabilistic(clause) => {
                write!(f, "{:?}::{}", clause.probability, clause.head)?;
                write_body(f, &clause.body)?;
                write!(f, ".")
            }
            Statement::AnnotatedDisjunction(ad) => {
                for (i, head) in ad.heads.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{:?}::{}", head.probability, head.atom)?;
                }
                write_body(f, &ad.body)?;
                write!(f, ".")
            }
            Statement::Query(query) => write!(f, "query({}).", query.atom),
            Statement::Evidence(evidence) => {
                write!(f, "evidence({}, {}).", evidence.atom, evidence.value)
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
