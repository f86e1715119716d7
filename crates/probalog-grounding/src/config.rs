/// How positive cycles in the ground program are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CyclePolicy {
    /// A re-entrant occurrence of an atom that is being expanded is false
    #[default]
    BreakAsFalse,
    /// Any positive cycle is an error
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GroundingConfig {
    /// Maximum nesting of calls during resolution and of atoms while building nodes.
    ///
    /// Resolution recurses on the native stack; the default fits a 2 MB thread
    /// stack in unoptimized builds. Raise it only on threads with a larger stack.
    pub max_depth: usize,
    pub cycle_policy: CyclePolicy,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        GroundingConfig {
            max_depth: 100,
            cycle_policy: CyclePolicy::BreakAsFalse,
        }
    }
}

impl GroundingConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cycle_policy(mut self, cycle_policy: CyclePolicy) -> Self {
        self.cycle_policy = cycle_policy;
        self
    }
}
