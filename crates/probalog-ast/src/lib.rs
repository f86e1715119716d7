// Abstract Syntax Tree (AST) definitions for Probalog
//!
//! This module defines the in-memory representation of a probabilistic logic program.
//! Programs are built directly from these types; there is no text parser in this crate.
//!
//! # Key Components
//!
//! - **Program**: An ordered list of statements
//! - **Statement**: Facts, rules, probabilistic clauses, annotated disjunctions,
//!   queries and evidence
//! - **Atom**: Predicate applied to terms (e.g., `edge(1, 2)`)
//! - **Term**: Variables, constants or compound terms
//! - **Value**: Constant values (integers, floats, strings, symbolic constants)
//! - **Literal**: Positive or negated atoms
//!
//! # Example
//!
//! ```ignore
//! // 0.6::edge(1, 2).
//! // path(X, Y) :- edge(X, Y).
//! // query(path(1, 2)).
//! let mut program = Program::new();
//! program
//!     .probabilistic_fact(0.6, Atom::new("edge", vec![Term::integer(1), Term::integer(2)]))
//!     .rule(
//!         Atom::new("path", vec![Term::variable("X"), Term::variable("Y")]),
//!         vec![Literal::Positive(Atom::new("edge", vec![Term::variable("X"), Term::variable("Y")]))],
//!     )
//!     .query(Atom::new("path", vec![Term::integer(1), Term::integer(2)]));
//! ```

mod display;

use internment::Intern;
use std::collections::HashSet;

/// Interned string for efficient storage and comparison
pub type Symbol = Intern<String>;

/// A Probalog program is an ordered list of statements
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Statement {
    Fact(Fact),
    Rule(Rule),
    Probabilistic(ProbabilisticClause),
    AnnotatedDisjunction(AnnotatedDisjunction),
    Query(Query),
    Evidence(Evidence),
}

/// A deterministic fact: `edge(1, 2).`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fact {
    pub atom: Atom,
}

/// A rule has a head and a body: `path(X, Y) :- edge(X, Y).`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    pub head: Atom,
    pub body: Vec<Literal>,
}

/// A probabilistic clause: `0.3::alarm :- burglary.`
///
/// With an empty body this is a probabilistic fact (`0.6::edge(1, 2).`).
/// Every ground instance of the clause is an independent random choice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbabilisticClause {
    pub probability: f64,
    pub head: Atom,
    pub body: Vec<Literal>,
}

/// An annotated disjunction: `0.2::colour(red); 0.5::colour(blue) :- paint.`
///
/// For each ground instance of the body at most one head holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotatedDisjunction {
    pub heads: Vec<AnnotatedHead>,
    pub body: Vec<Literal>,
}

/// One weighted alternative of an annotated disjunction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotatedHead {
    pub probability: f64,
    pub atom: Atom,
}

/// A query: `query(path(1, X)).`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Query {
    pub atom: Atom,
}

/// Evidence: `evidence(path(1, 5), false).`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evidence {
    pub atom: Atom,
    pub value: bool,
}

/// A literal is either a positive or a negated atom
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Positive(Atom),
    Negative(Atom),
}

/// An atom is a predicate applied to terms: `edge(1, 2)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    pub predicate: Symbol,
    pub terms: Vec<Term>,
}

/// A term can be a variable, a constant or a compound term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    /// Variable: uppercase or starts with underscore (X, Y, _tmp)
    Variable(Symbol),
    /// Constant: integer, float, string, or lowercase identifier
    Constant(Value),
    /// Compound term: functor with arguments (f(a, b))
    Compound(Symbol, Vec<Term>),
}

/// Constant values
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Symbol),
    Atom(Symbol),
}

// Floats compare by bit pattern so that Eq and Hash agree.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Integer(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Value::Float(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
            Value::String(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Atom(a) => {
                3u8.hash(state);
                a.hash(state);
            }
        }
    }
}

impl Program {
    /// Create a new empty program
    pub fn new() -> Self {
        Program {
            statements: Vec::new(),
        }
    }

    /// Add a statement to the program
    pub fn add_statement(&mut self, statement: Statement) -> &mut Self {
        self.statements.push(statement);
        self
    }

    /// Add a deterministic fact
    pub fn fact(&mut self, atom: Atom) -> &mut Self {
        self.add_statement(Statement::Fact(Fact { atom }))
    }

    /// Add a deterministic rule
    pub fn rule(&mut self, head: Atom, body: Vec<Literal>) -> &mut Self {
        self.add_statement(Statement::Rule(Rule { head, body }))
    }

    /// Add a probabilistic fact `p::atom.`
    pub fn probabilistic_fact(&mut self, probability: f64, atom: Atom) -> &mut Self {
        self.probabilistic_rule(probability, atom, Vec::new())
    }

    /// Add a probabilistic rule `p::head :- body.`
    pub fn probabilistic_rule(
        &mut self,
        probability: f64,
        head: Atom,
        body: Vec<Literal>,
    ) -> &mut Self {
        self.add_statement(Statement::Probabilistic(ProbabilisticClause {
            probability,
            head,
            body,
        }))
    }

    /// Add an annotated disjunction `p1::h1; ...; pn::hn :- body.`
    pub fn annotated_disjunction(
        &mut self,
        heads: Vec<(f64, Atom)>,
        body: Vec<Literal>,
    ) -> &mut Self {
        let heads = heads
            .into_iter()
            .map(|(probability, atom)| AnnotatedHead { probability, atom })
            .collect();
        self.add_statement(Statement::AnnotatedDisjunction(AnnotatedDisjunction {
            heads,
            body,
        }))
    }

    /// Declare a query
    pub fn query(&mut self, atom: Atom) -> &mut Self {
        self.add_statement(Statement::Query(Query { atom }))
    }

    /// Declare evidence
    pub fn evidence(&mut self, atom: Atom, value: bool) -> &mut Self {
        self.add_statement(Statement::Evidence(Evidence { atom, value }))
    }

    /// All declared queries, in declaration order
    pub fn queries(&self) -> impl Iterator<Item = &Atom> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Query(query) => Some(&query.atom),
            _ => None,
        })
    }

    /// All declared evidence, in declaration order
    pub fn evidence_pairs(&self) -> impl Iterator<Item = (&Atom, bool)> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Evidence(evidence) => Some((&evidence.atom, evidence.value)),
            _ => None,
        })
    }
}

impl Literal {
    /// Get the underlying atom of a literal
    pub fn atom(&self) -> &Atom {
        match self {
            Literal::Positive(atom) | Literal::Negative(atom) => atom,
        }
    }

    /// Check if the literal is positive
    pub fn is_positive(&self) -> bool {
        matches!(self, Literal::Positive(_))
    }

    /// Check if the literal is negative
    pub fn is_negative(&self) -> bool {
        matches!(self, Literal::Negative(_))
    }
}

impl Atom {
    pub fn new(predicate: &str, terms: Vec<Term>) -> Self {
        Atom {
            predicate: Intern::new(predicate.to_string()),
            terms,
        }
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// An atom is ground when none of its terms contains a variable
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_ground)
    }

    /// Collect the variables of this atom, in order of first occurrence
    pub fn variables(&self) -> Vec<Symbol> {
        let mut seen = HashSet::new();
        let mut vars = Vec::new();
        for term in &self.terms {
            term.collect_variables(&mut seen, &mut vars);
        }
        vars
    }
}

impl Term {
    pub fn variable(name: &str) -> Self {
        Term::Variable(Intern::new(name.to_string()))
    }

    pub fn constant(name: &str) -> Self {
        Term::Constant(Value::Atom(Intern::new(name.to_string())))
    }

    pub fn integer(n: i64) -> Self {
        Term::Constant(Value::Integer(n))
    }

    pub fn float(f: f64) -> Self {
        Term::Constant(Value::Float(f))
    }

    pub fn string(s: &str) -> Self {
        Term::Constant(Value::String(Intern::new(s.to_string())))
    }

    pub fn compound(functor: &str, args: Vec<Term>) -> Self {
        Term::Compound(Intern::new(functor.to_string()), args)
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(_) => true,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
        }
    }

    /// Variables of this term, in order of first occurrence
    pub fn variables(&self) -> Vec<Symbol> {
        let mut seen = HashSet::new();
        let mut vars = Vec::new();
        self.collect_variables(&mut seen, &mut vars);
        vars
    }

    pub(crate) fn collect_variables(&self, seen: &mut HashSet<Symbol>, vars: &mut Vec<Symbol>) {
        match self {
            Term::Variable(name) => {
                if seen.insert(*name) {
                    vars.push(*name);
                }
            }
            Term::Constant(_) => {}
            Term::Compound(_, args) => {
                for arg in args {
                    arg.collect_variables(seen, vars);
                }
            }
        }
    }
}

/// Collect the variables of a clause (head first, then body), in order of first occurrence
pub fn clause_variables(head: &Atom, body: &[Literal]) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    let mut vars = Vec::new();
    for term in &head.terms {
        term.collect_variables(&mut seen, &mut vars);
    }
    for literal in body {
        for term in &literal.atom().terms {
            term.collect_variables(&mut seen, &mut vars);
        }
    }
    vars
}

#[cfg(test)]
#[path = "../tests/unit/ast_tests.rs"]
mod tests;
