//! Kernel call-graph view.
//!
//! Built and owned by the front end; the analysis engine only queries it,
//! except for the single write-once stack annotation per kernel.

pub mod types;

pub use types::{FunctionInfo, KernelGraph};
