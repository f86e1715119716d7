//! Probalog: exact inference for probabilistic logic programs
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`ground`] turns a [`Program`] and a query/evidence set into a ground
//!    [`LogicFormula`];
//! 2. [`compile`] encodes the formula as a weighted CNF and compiles it into a
//!    smoothed d-DNNF ([`CompiledFormula`]);
//! 3. [`evaluate`] runs weighted model counting and returns the query
//!    probabilities conditioned on the evidence.
//!
//! [`infer`] does all three for the queries and evidence declared in the program.
//! A compiled formula can be evaluated again under different evidence with an
//! [`Evaluator`].
//!
//! ```ignore
//! let mut program = Program::new();
//! program
//!     .probabilistic_fact(0.3, Atom::new("rain", vec![]))
//!     .query(Atom::new("rain", vec![]));
//! let results = probalog::infer(&program, &InferenceConfig::default())?;
//! ```

pub mod config;
pub mod error;

pub use config::InferenceConfig;
pub use error::InferenceError;

pub use probalog_ast as ast;
pub use probalog_ast::{Atom, Literal, Program, Term};
pub use probalog_compile::{Circuit, CompileConfig, CompileError, CompiledFormula};
pub use probalog_core::ProgramError;
pub use probalog_eval::{
    EvalError, Evaluator, ProbabilitySemiring, QueryProbabilities, Semiring, SymbolicSemiring,
};
pub use probalog_formula::{parse_atom, DumpError, Label, LogicFormula, NodeRef};
pub use probalog_grounding::{CyclePolicy, GroundingConfig, GroundingError};
pub use probalog_sat::{Cnf, SatError};

use probalog_sat::CnfLit;
use tracing::{debug, info_span};

/// Ground the given queries and evidence against the program's clauses
pub fn ground(
    program: &Program,
    queries: &[Atom],
    evidence: &[(Atom, bool)],
    config: &InferenceConfig,
) -> Result<LogicFormula, InferenceError> {
    Ok(probalog_grounding::ground_queries(
        program,
        queries,
        evidence,
        &config.grounding,
    )?)
}

/// Encode and compile a ground formula. The result can be evaluated any number of
/// times under different evidence.
pub fn compile(
    formula: &LogicFormula,
    config: &InferenceConfig,
) -> Result<CompiledFormula, InferenceError> {
    Ok(probalog_compile::compile_formula(formula, &config.compile)?)
}

/// Query probabilities under the evidence named in the formula
pub fn evaluate(compiled: &CompiledFormula) -> Result<QueryProbabilities, InferenceError> {
    Ok(probalog_eval::evaluate(compiled)?)
}

/// Is the evidence named in the CNF logically possible?
///
/// Impossible evidence is reported as [`EvalError::InconsistentEvidence`] before
/// any compilation work is done.
pub fn check_evidence(cnf: &Cnf) -> Result<(), InferenceError> {
    let mut assumptions = Vec::new();
    let mut possible = true;
    for name in cnf.evidence() {
        let Some(value) = name.label.evidence_value() else {
            continue;
        };
        let literal = if value { name.literal } else { name.literal.negate() };
        match literal {
            CnfLit::True => {}
            CnfLit::False => possible = false,
            CnfLit::Lit(lit) => assumptions.push(lit),
        }
    }

    if possible && cnf.is_satisfiable(&assumptions)? {
        return Ok(());
    }
    Err(EvalError::InconsistentEvidence {
        evidence: cnf
            .evidence()
            .filter_map(|name| {
                name.label
                    .evidence_value()
                    .map(|value| format!("{}={}", name.atom, value))
            })
            .collect(),
    }
    .into())
}

/// Ground, compile and evaluate the queries and evidence declared in the program
pub fn infer(
    program: &Program,
    config: &InferenceConfig,
) -> Result<QueryProbabilities, InferenceError> {
    let _span = info_span!("infer").entered();

    let formula = probalog_grounding::ground_program(program, &config.grounding)?;
    debug!(stats = ?formula.stats(), "grounded");

    let cnf = Cnf::encode(&formula);
    check_evidence(&cnf)?;

    let circuit = probalog_compile::compile(&cnf, &config.compile)?;
    let compiled = CompiledFormula::new(cnf, circuit);
    evaluate(&compiled)
}
