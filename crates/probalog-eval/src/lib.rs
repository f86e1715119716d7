//! Evaluation of compiled Probalog formulas
//!
//! [`Evaluator`] runs weighted model counting over a [`CompiledFormula`] in any
//! [`Semiring`]. With [`ProbabilitySemiring`] the result of a query is its marginal
//! probability conditioned on the evidence.
//!
//! ```ignore
//! let mut evaluator = Evaluator::new(&compiled, ProbabilitySemiring)?;
//! evaluator.set_evidence(&alarm, true)?;
//! let p = evaluator.probability(&burglary)?;
//! ```

pub mod error;
pub mod evaluator;
pub mod semiring;

pub use error::EvalError;
pub use evaluator::Evaluator;
pub use semiring::{ProbabilitySemiring, Semiring, SymbolicSemiring};

use probalog_ast::Atom;
use probalog_compile::CompiledFormula;
use std::fmt;

/// Query atoms with their probabilities, in query order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryProbabilities {
    entries: Vec<(Atom, f64)>,
}

impl QueryProbabilities {
    pub fn new(entries: Vec<(Atom, f64)>) -> Self {
        QueryProbabilities { entries }
    }

    pub fn get(&self, atom: &Atom) -> Option<f64> {
        self.entries
            .iter()
            .find(|(a, _)| a == atom)
            .map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Atom, f64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(Atom, f64)> {
        self.entries
    }
}

impl fmt::Display for QueryProbabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (atom, probability) in &self.entries {
            writeln!(f, "{}: {}", atom, probability)?;
        }
        Ok(())
    }
}

/// Probabilities of every query under the formula's evidence
pub fn evaluate(compiled: &CompiledFormula) -> Result<QueryProbabilities, EvalError> {
    Evaluator::new(compiled, ProbabilitySemiring)?.query_probabilities()
}

#[cfg(test)]
#[path = "../tests/unit/semiring_tests.rs"]
mod semiring_tests;

#[cfg(test)]
#[path = "../tests/unit/evaluator_tests.rs"]
mod evaluator_tests;
