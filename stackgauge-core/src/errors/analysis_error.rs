//! Stack-usage analysis errors.

/// Errors that can occur during a stack-usage analysis run.
///
/// Per-function uncertainty (recursion, indirect calls, opaque stack
/// conventions) is absorbed inside the engine and never surfaces here;
/// the only hard failure is a caller contract violation.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Kernel \"{kernel}\" already carries a stack-usage annotation")]
    AlreadyAnnotated { kernel: String },
}
