//! Stack-usage analysis engine.
//!
//! A memoized depth-first traversal of the kernel call graph that
//! computes, for every function, its own frame size plus the largest
//! contribution of any transitive callee, detects recursion cycles, and
//! reconstructs the heaviest call chain for diagnostics.

pub mod engine;
pub mod types;

pub use engine::{analyze, StackUsageEngine};
pub use types::{AnalysisReport, FunctionState, VisitState};

/// Diagnostic category shared by everything this engine emits.
pub const DIAGNOSTIC_CATEGORY: &str = "StackUsage";
