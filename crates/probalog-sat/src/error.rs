use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SatError {
    #[error("SAT solver failed: {0}")]
    Solver(String),
}
