use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A bounded resource of the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Nodes,
    Decisions,
    Depth,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Nodes => write!(f, "node"),
            Resource::Decisions => write!(f, "decision"),
            Resource::Depth => write!(f, "depth"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("compilation exceeded the {resource} limit of {limit}")]
    ResourceExhausted { resource: Resource, limit: usize },
    #[error("compilation timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}
