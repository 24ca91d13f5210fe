//! Static stack-usage analysis for kernel entry points.
//!
//! The target execution environment provides a small, fixed per-thread
//! stack; a kernel that overflows it corrupts memory silently at runtime.
//! This crate estimates, at compile time, the worst-case call-stack depth
//! of every kernel and warns when the estimate exceeds the configured
//! budget.
//!
//! Two subsystems:
//! - **call_graph** — read-only adjacency view over the program's
//!   functions, plus the write-once per-kernel annotation slot.
//! - **stack_usage** — memoized depth-first traversal computing each
//!   function's worst-case usage, with cycle detection and heaviest-chain
//!   reconstruction for diagnostics.

pub mod call_graph;
pub mod diagnostics;
pub mod stack_usage;
