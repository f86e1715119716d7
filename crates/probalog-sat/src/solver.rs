//! Satisfiability checks through splr
//!
//! splr needs every variable to appear in the initial clause set, so a solver is
//! built per check from the CNF clauses plus one unit clause per assumption.

use crate::cnf::Cnf;
use crate::error::SatError;
use splr::*;
use std::convert::TryFrom;
use tracing::trace;

impl Cnf {
    /// A model satisfying the clauses and all `assumptions`, if one exists.
    ///
    /// The model holds one signed literal per variable, in variable order.
    pub fn solve(&self, assumptions: &[i32]) -> Result<Option<Vec<i32>>, SatError> {
        let mut clauses: Vec<Vec<i32>> = self.clauses().to_vec();
        clauses.extend(assumptions.iter().map(|lit| vec![*lit]));
        if clauses.is_empty() {
            return Ok(Some((1..=self.num_vars() as i32).collect()));
        }
        if clauses.iter().any(|c| c.is_empty()) {
            return Ok(None);
        }

        let mut solver = match Solver::try_from((Config::default(), clauses.as_ref())) {
            Ok(solver) => solver,
            Err(Ok(Certificate::UNSAT)) => return Ok(None),
            Err(Ok(Certificate::SAT(model))) => return Ok(Some(self.complete_model(model))),
            Err(Err(SolverError::EmptyClause)) => return Ok(None),
            Err(Err(e)) => return Err(SatError::Solver(format!("{:?}", e))),
        };

        match solver.solve() {
            Ok(Certificate::SAT(model)) => {
                trace!(vars = model.len(), "satisfiable");
                Ok(Some(self.complete_model(model)))
            }
            Ok(Certificate::UNSAT) => Ok(None),
            Err(e) => Err(SatError::Solver(format!("{:?}", e))),
        }
    }

    /// Variables that occur in no clause are absent from splr's model; they are free
    fn complete_model(&self, mut model: Vec<i32>) -> Vec<i32> {
        let len = model.len() as i32;
        model.extend(len + 1..=self.num_vars() as i32);
        model
    }

    /// Is the CNF satisfiable together with the assumed literals?
    pub fn is_satisfiable(&self, assumptions: &[i32]) -> Result<bool, SatError> {
        Ok(self.solve(assumptions)?.is_some())
    }
}
