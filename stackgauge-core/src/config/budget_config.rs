//! Stack budget configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_STACK_ALIGN_BYTES, DEFAULT_STATELESS_PRIVATE_MEM_BYTES};

/// Configuration for the per-kernel stack budget check.
///
/// The budget is platform- and runtime-mode-dependent and supplied by the
/// caller; the defaults match the stateless private memory size used when
/// nothing else is configured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StackBudgetConfig {
    /// Maximum stack bytes a single kernel may consume.
    pub max_stack_bytes: u64,
    /// Alignment applied to the finalized byte total before the budget
    /// comparison and before annotation.
    pub alignment_bytes: u64,
}

impl Default for StackBudgetConfig {
    fn default() -> Self {
        Self {
            max_stack_bytes: DEFAULT_STATELESS_PRIVATE_MEM_BYTES,
            alignment_bytes: DEFAULT_STACK_ALIGN_BYTES,
        }
    }
}

impl StackBudgetConfig {
    /// Returns the effective alignment, treating 0 as "no alignment".
    pub fn effective_alignment(&self) -> u64 {
        self.alignment_bytes.max(1)
    }

    /// Round `bytes` up to the nearest multiple of the effective alignment.
    pub fn align_up(&self, bytes: u64) -> u64 {
        let align = self.effective_alignment();
        bytes.div_ceil(align) * align
    }
}
