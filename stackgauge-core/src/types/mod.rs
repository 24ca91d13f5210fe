//! Shared type aliases and collection re-exports.

pub mod collections;
