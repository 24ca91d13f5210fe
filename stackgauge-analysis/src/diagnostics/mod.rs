//! Advisory diagnostics emitted by the analysis.
//!
//! Diagnostics never abort compilation; the engine reports conditions it
//! cannot bound (recursion) or bounds that exceed the budget, and the
//! caller decides what to do with them.

use serde::{Deserialize, Serialize};

/// Diagnostic severity. Only warnings are emitted today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A single advisory diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Subsystem category, `"StackUsage"` for everything in this crate.
    pub category: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
        }
    }
}

/// Sink for diagnostics produced during an analysis run.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Vec-backed sink that simply collects everything it receives.
#[derive(Debug, Default)]
pub struct CollectedDiagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectedDiagnostics {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
