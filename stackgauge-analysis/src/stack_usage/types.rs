//! Engine working state and the per-run report.

use std::time::Duration;

use petgraph::graph::NodeIndex;
use serde::Serialize;

/// Visit status of one function during the traversal.
///
/// A strict three-state machine: `NotStarted → InProgress → Done`, never
/// reversed. Re-entering an `InProgress` function is how a call-graph
/// cycle is detected; it never transitions the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

/// Per-function working state.
///
/// Created lazily on first visit, shared across all kernels of one run so
/// functions reachable from several kernels are analyzed once, and
/// discarded when the run ends. `worst_case_bits` and `heaviest_callee`
/// are immutable once `status` is `Done`.
#[derive(Debug, Clone, Default)]
pub struct FunctionState {
    pub status: VisitState,
    /// Cumulative worst-case stack usage along the heaviest chain rooted
    /// at this function, in bits.
    pub worst_case_bits: u64,
    /// The callee responsible for `worst_case_bits`, kept only to
    /// reconstruct the diagnostic trace. Cycle edges are never chosen, so
    /// following these pointers from a `Done` node always terminates.
    pub heaviest_callee: Option<NodeIndex>,
    /// The bound is best-effort rather than guaranteed: recursion, an
    /// indirect call, or a stack-call callee exists somewhere in the
    /// reachable subgraph.
    pub uncertain: bool,
}

/// Statistics from one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub kernels_checked: usize,
    pub kernels_annotated: usize,
    pub overflow_warnings: usize,
    /// Cycle edges encountered during traversal.
    pub recursion_cycles: usize,
    /// Kernels under budget whose bound could not be trusted.
    pub uncertain_kernels: usize,
    /// Function bodies walked; each function is walked at most once per
    /// run regardless of how many kernels reach it.
    pub functions_evaluated: usize,
    pub duration: Duration,
}
