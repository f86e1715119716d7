//! Grounding engine
//!
//! Turns a first-order probabilistic program plus a set of queries and evidence into
//! a [`LogicFormula`] containing exactly the ground atoms touched while proving or
//! refuting them.
//!
//! Grounding runs in two phases:
//!
//! 1. **Resolution**: goal-directed SLD resolution with call tabling
//!    records a ground program (derived atoms and their derivations). Probabilistic
//!    clause instances become atom leaves as soon as they are used.
//! 2. **Formula construction**: the ground program is checked for
//!    unstratified negation and positive cycles, then turned into an acyclic,
//!    hash-consed AND/OR DAG.
//!
//! # Example
//!
//! ```ignore
//! let formula = ground_program(&program, &GroundingConfig::default())?;
//! for name in formula.queries() {
//!     println!("{} -> {}", name.atom, name.node);
//! }
//! ```

mod builder;
pub mod config;
mod engine;
pub mod error;
pub mod ground_program;

pub use config::{CyclePolicy, GroundingConfig};
pub use error::GroundingError;

use builder::FormulaBuilder;
use engine::Grounder;
use probalog_ast::{Atom, Program};
use probalog_core::{validate_program, ClauseDatabase, ProgramError};
use probalog_formula::{Label, LogicFormula, NodeRef};
use std::collections::HashSet;
use tracing::{debug, info_span};

/// Ground the queries and evidence declared in the program
pub fn ground_program(
    program: &Program,
    config: &GroundingConfig,
) -> Result<LogicFormula, GroundingError> {
    let queries: Vec<Atom> = program.queries().cloned().collect();
    let evidence: Vec<(Atom, bool)> = program
        .evidence_pairs()
        .map(|(atom, value)| (atom.clone(), value))
        .collect();
    ground_queries(program, &queries, &evidence, config)
}

/// Ground an explicit set of queries and evidence against the program's clauses.
///
/// Queries and evidence declared inside `program` are ignored.
pub fn ground_queries(
    program: &Program,
    queries: &[Atom],
    evidence: &[(Atom, bool)],
    config: &GroundingConfig,
) -> Result<LogicFormula, GroundingError> {
    let _span = info_span!("ground", queries = queries.len(), evidence = evidence.len()).entered();

    validate_program(program)?;
    for (atom, _) in evidence {
        if !atom.is_ground() {
            return Err(ProgramError::NonGroundEvidence {
                atom: atom.to_string(),
            }
            .into());
        }
    }

    let db = ClauseDatabase::from_program(program);
    let mut grounder = Grounder::new(&db, config);

    let mut query_answers = Vec::with_capacity(queries.len());
    for query in queries {
        query_answers.push((query, grounder.solve(query)?));
    }
    let mut evidence_answers = Vec::with_capacity(evidence.len());
    for (atom, value) in evidence {
        let answers = grounder.solve(atom)?;
        evidence_answers.push((atom, *value, !answers.is_empty()));
    }

    let calls = grounder.call_count();
    let (mut formula, ground) = grounder.finish();
    debug!(
        calls,
        atoms = ground.len(),
        derivations = ground.derivation_count(),
        leaves = formula.len(),
        "resolution finished"
    );

    let mut builder = FormulaBuilder::new(&ground, config)?;
    let mut named: HashSet<(Atom, Label)> = HashSet::new();

    for (query, answers) in query_answers {
        if answers.is_empty() {
            if named.insert((query.clone(), Label::Query)) {
                formula.add_name(query.clone(), NodeRef::False, Label::Query);
            }
            continue;
        }
        for answer in answers {
            if named.insert((answer.clone(), Label::Query)) {
                let node = builder.node_for(&mut formula, &answer)?;
                formula.add_name(answer, node, Label::Query);
            }
        }
    }

    for (atom, value, derived) in evidence_answers {
        let label = Label::evidence(value);
        if !named.insert((atom.clone(), label)) {
            continue;
        }
        let node = if derived {
            builder.node_for(&mut formula, atom)?
        } else {
            NodeRef::False
        };
        formula.add_name(atom.clone(), node, label);
    }

    debug!(nodes = formula.len(), names = formula.names().len(), "formula built");
    Ok(formula)
}

#[cfg(test)]
#[path = "../tests/unit/grounding_tests.rs"]
mod tests;
