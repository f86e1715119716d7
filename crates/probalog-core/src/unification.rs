//! Substitutions and syntactic unification
//!
//! A [`Substitution`] maps variables to terms. Bindings may chain (`X -> Y`,
//! `Y -> 1`); [`Substitution::apply`] resolves chains fully.
//!
//! Unification performs the occurs check, so `X = f(X)` fails instead of
//! producing an infinite term.

use internment::Intern;
use probalog_ast::{Atom, Literal, Symbol, Term};
use std::collections::HashMap;

/// A mapping from variables to terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    pub(crate) bindings: HashMap<Symbol, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution {
            bindings: HashMap::new(),
        }
    }

    /// Bind a variable to a term
    pub fn bind(&mut self, var: Symbol, term: Term) {
        self.bindings.insert(var, term);
    }

    /// Get the direct binding of a variable
    pub fn get(&self, var: &Symbol) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &Symbol) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Term)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Follow variable bindings until reaching an unbound variable or a non-variable term
    fn walk<'a>(&'a self, term: &'a Term) -> &'a Term {
        let mut current = term;
        while let Term::Variable(var) = current {
            match self.bindings.get(var) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Apply the substitution to a term, resolving binding chains
    pub fn apply(&self, term: &Term) -> Term {
        match self.walk(term) {
            Term::Variable(var) => Term::Variable(*var),
            Term::Constant(value) => Term::Constant(value.clone()),
            Term::Compound(functor, args) => {
                Term::Compound(*functor, args.iter().map(|arg| self.apply(arg)).collect())
            }
        }
    }

    /// Apply the substitution to every term of an atom
    pub fn apply_atom(&self, atom: &Atom) -> Atom {
        Atom {
            predicate: atom.predicate,
            terms: atom.terms.iter().map(|t| self.apply(t)).collect(),
        }
    }

    pub fn apply_literal(&self, literal: &Literal) -> Literal {
        match literal {
            Literal::Positive(atom) => Literal::Positive(self.apply_atom(atom)),
            Literal::Negative(atom) => Literal::Negative(self.apply_atom(atom)),
        }
    }
}

/// Unify two terms, extending `subst`. Returns false if they do not unify.
///
/// On failure `subst` may hold partial bindings; callers unify into a clone.
pub fn unify(t1: &Term, t2: &Term, subst: &mut Substitution) -> bool {
    let left = subst.walk(t1).clone();
    let right = subst.walk(t2).clone();

    match (&left, &right) {
        (Term::Variable(a), Term::Variable(b)) if a == b => true,
        (Term::Variable(var), other) | (other, Term::Variable(var)) => {
            if occurs(var, other, subst) {
                false
            } else {
                subst.bind(*var, other.clone());
                true
            }
        }
        (Term::Constant(a), Term::Constant(b)) => a == b,
        (Term::Compound(f1, args1), Term::Compound(f2, args2)) => {
            f1 == f2
                && args1.len() == args2.len()
                && args1
                    .iter()
                    .zip(args2.iter())
                    .all(|(a, b)| unify(a, b, subst))
        }
        _ => false,
    }
}

/// Occurs check: does `var` appear in `term` under `subst`?
fn occurs(var: &Symbol, term: &Term, subst: &Substitution) -> bool {
    match subst.walk(term) {
        Term::Variable(other) => other == var,
        Term::Constant(_) => false,
        Term::Compound(_, args) => args.iter().any(|arg| occurs(var, arg, subst)),
    }
}

/// Unify two atoms (same predicate, same arity, pairwise unifiable terms)
pub fn unify_atoms(a1: &Atom, a2: &Atom, subst: &mut Substitution) -> bool {
    a1.predicate == a2.predicate
        && a1.terms.len() == a2.terms.len()
        && a1
            .terms
            .iter()
            .zip(a2.terms.iter())
            .all(|(t1, t2)| unify(t1, t2, subst))
}

/// Produces fresh variable names so clauses can be renamed apart from goals
#[derive(Debug, Default)]
pub struct Renamer {
    counter: usize,
}

impl Renamer {
    pub fn new() -> Self {
        Renamer { counter: 0 }
    }

    /// Build a substitution mapping each of `vars` to a fresh variable
    pub fn fresh_substitution(&mut self, vars: &[Symbol]) -> Substitution {
        let mut subst = Substitution::new();
        for var in vars {
            self.counter += 1;
            subst.bind(*var, Term::Variable(Intern::new(format!("_G{}", self.counter))));
        }
        subst
    }
}

/// Canonical representative of an atom up to variable renaming.
///
/// Two goals are variants of each other exactly when their variant keys are equal.
pub fn variant_key(atom: &Atom) -> Atom {
    let mut renaming = HashMap::new();
    Atom {
        predicate: atom.predicate,
        terms: atom
            .terms
            .iter()
            .map(|term| canonical_term(term, &mut renaming))
            .collect(),
    }
}

fn canonical_term(term: &Term, renaming: &mut HashMap<Symbol, Symbol>) -> Term {
    match term {
        Term::Variable(var) => {
            let next = renaming.len();
            let canonical = *renaming
                .entry(*var)
                .or_insert_with(|| Intern::new(format!("_V{}", next)));
            Term::Variable(canonical)
        }
        Term::Constant(value) => Term::Constant(value.clone()),
        Term::Compound(functor, args) => Term::Compound(
            *functor,
            args.iter().map(|arg| canonical_term(arg, renaming)).collect(),
        ),
    }
}

#[cfg(test)]
#[path = "../tests/unit/unification_tests.rs"]
mod tests;
