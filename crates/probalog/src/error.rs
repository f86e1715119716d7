use probalog_compile::CompileError;
use probalog_eval::EvalError;
use probalog_formula::DumpError;
use probalog_grounding::GroundingError;
use probalog_sat::SatError;
use thiserror::Error;

/// Any failure of the inference pipeline, by stage
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Grounding(#[from] GroundingError),
    #[error(transparent)]
    Dump(#[from] DumpError),
    #[error(transparent)]
    Sat(#[from] SatError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
