use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("evidence is inconsistent: {}", .evidence.join(", "))]
    InconsistentEvidence { evidence: Vec<String> },
    #[error("unknown atom '{atom}'")]
    UnknownAtom { atom: String },
}
