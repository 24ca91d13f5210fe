//! Configuration types.

pub mod budget_config;

pub use budget_config::StackBudgetConfig;
