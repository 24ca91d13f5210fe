//! Kernel call-graph errors.

/// Errors that can occur while building the kernel call graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Function \"{name}\" registered twice in the call graph")]
    DuplicateFunction { name: String },
}
