//! Shared foundation for the stackgauge analysis engine.
//!
//! Holds everything the analysis crate consumes but does not own:
//! configuration, error types, collection re-exports, and tracing setup.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;
