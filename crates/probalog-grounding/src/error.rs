use probalog_core::ProgramError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroundingError {
    #[error(transparent)]
    InvalidProgram(#[from] ProgramError),
    #[error("negation of '{atom}' is not stratified: it depends on itself through negation")]
    UnstratifiedNegation { atom: String },
    #[error("positive cycle through '{atom}'")]
    PositiveCycle { atom: String },
    #[error("resolution depth limit {limit} exceeded at '{goal}'")]
    DepthExceeded { goal: String, limit: usize },
    #[error("negated literal '{literal}' is not ground when selected")]
    Floundering { literal: String },
    #[error("arguments of '{goal}' are not sufficiently instantiated")]
    Instantiation { goal: String },
    #[error("cannot evaluate '{goal}': {reason}")]
    Arithmetic { goal: String, reason: String },
    #[error("derived answer '{atom}' is not ground")]
    NonGroundAnswer { atom: String },
}
