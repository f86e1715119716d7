use std::time::Duration;

/// Bounds on the compiler's search
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompileConfig {
    /// Maximum number of circuit nodes, smoothing included
    pub max_nodes: usize,
    pub max_decisions: usize,
    /// Maximum nesting of decisions
    pub max_depth: usize,
    pub timeout: Option<Duration>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            max_nodes: 1_000_000,
            max_decisions: 10_000_000,
            max_depth: 1_000,
            timeout: None,
        }
    }
}

impl CompileConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_max_decisions(mut self, max_decisions: usize) -> Self {
        self.max_decisions = max_decisions;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
