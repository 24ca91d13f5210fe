//! Error types, one file per subsystem.

pub mod analysis_error;
pub mod graph_error;

pub use analysis_error::AnalysisError;
pub use graph_error::GraphError;
