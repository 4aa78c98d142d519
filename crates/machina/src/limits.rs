use serde::{Deserialize, Serialize};

/// Static ceilings for the operations whose cost can blow up combinatorially.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of power-states the subset construction may allocate.
    pub max_subset_states: usize,
    /// Maximum number of state pairs the minimizer may examine, summed over the
    /// initial marking and every refinement pass. A DFA whose first pass alone
    /// would exceed it is rejected before the pair table is allocated.
    pub max_pair_checks: usize,
    /// Default number of strings the generator returns.
    pub generate_count: usize,
    /// Default maximum length of a generated string.
    pub generate_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_subset_states: 10_000,
            max_pair_checks: 100_000_000,
            generate_count: 5,
            generate_length: 15,
        }
    }
}
