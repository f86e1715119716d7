//! Knowledge compilation for Probalog
//!
//! A ground [`LogicFormula`] is encoded as a weighted CNF ([`probalog_sat::Cnf`]) and
//! compiled into a smoothed d-DNNF [`Circuit`]: AND nodes are decomposable, OR nodes
//! are deterministic, and every OR child mentions the same variables. Weighted model
//! counting on such a circuit is a single bottom-up pass.
//!
//! ```ignore
//! let compiled = compile_formula(&formula, &CompileConfig::default())?;
//! assert!(compiled.circuit().check_decomposable());
//! println!("{}", compiled.circuit().to_nnf());
//! ```

pub mod circuit;
mod compiler;
pub mod config;
pub mod error;

pub use circuit::{Circuit, CircuitId, CircuitNode};
pub use compiler::compile;
pub use config::CompileConfig;
pub use error::{CompileError, Resource};

use probalog_formula::LogicFormula;
use probalog_sat::Cnf;

/// A CNF together with its compiled circuit.
///
/// Evidence is not part of the compiled artifact, so one compilation can be
/// evaluated under different evidence.
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    cnf: Cnf,
    circuit: Circuit,
}

impl CompiledFormula {
    pub fn new(cnf: Cnf, circuit: Circuit) -> Self {
        CompiledFormula { cnf, circuit }
    }

    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }
}

/// Encode and compile a ground formula
pub fn compile_formula(
    formula: &LogicFormula,
    config: &CompileConfig,
) -> Result<CompiledFormula, CompileError> {
    let cnf = Cnf::encode(formula);
    let circuit = compile(&cnf, config)?;
    Ok(CompiledFormula::new(cnf, circuit))
}

#[cfg(test)]
#[path = "../tests/unit/circuit_tests.rs"]
mod circuit_tests;

#[cfg(test)]
#[path = "../tests/unit/compiler_tests.rs"]
mod compiler_tests;
