//! CNF encoding for Probalog formulas
//!
//! [`Cnf::encode`] turns the reachable part of a [`probalog_formula::LogicFormula`]
//! into clauses over signed `i32` literals, together with the literal weights used
//! for weighted model counting. [`Cnf::is_satisfiable`] checks the clauses with the
//! splr CDCL solver.

pub mod cnf;
pub mod error;
mod solver;

pub use cnf::{Cnf, CnfLit, NamedLiteral, VarKind, Weight};
pub use error::SatError;

#[cfg(test)]
#[path = "../tests/unit/cnf_tests.rs"]
mod cnf_tests;

#[cfg(test)]
#[path = "../tests/unit/solver_tests.rs"]
mod solver_tests;
