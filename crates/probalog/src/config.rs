use probalog_compile::CompileConfig;
use probalog_grounding::{CyclePolicy, GroundingConfig};
use std::time::Duration;

/// Settings for the whole pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InferenceConfig {
    pub grounding: GroundingConfig,
    pub compile: CompileConfig,
}

impl InferenceConfig {
    pub fn with_grounding(mut self, grounding: GroundingConfig) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn with_compile(mut self, compile: CompileConfig) -> Self {
        self.compile = compile;
        self
    }

    pub fn with_cycle_policy(mut self, cycle_policy: CyclePolicy) -> Self {
        self.grounding.cycle_policy = cycle_policy;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.compile.max_nodes = max_nodes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.compile.timeout = Some(timeout);
        self
    }
}
