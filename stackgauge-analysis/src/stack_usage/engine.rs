//! The memoized depth-first traversal.

use std::time::Instant;

use petgraph::graph::NodeIndex;
use stackgauge_core::config::StackBudgetConfig;
use stackgauge_core::constants::BYTE_BITS;
use stackgauge_core::errors::AnalysisError;
use stackgauge_core::types::collections::FxHashMap;
use tracing::debug;

use crate::call_graph::KernelGraph;
use crate::diagnostics::{Diagnostic, DiagnosticSink};

use super::types::{AnalysisReport, FunctionState, VisitState};
use super::DIAGNOSTIC_CATEGORY;

/// Run the stack-usage analysis over every kernel in the graph.
///
/// Convenience wrapper around [`StackUsageEngine`].
pub fn analyze(
    graph: &mut KernelGraph,
    config: &StackBudgetConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<AnalysisReport, AnalysisError> {
    StackUsageEngine::new(config).analyze(graph, sink)
}

/// Stack-usage analysis engine.
///
/// Owns the per-function state table for the duration of one run. The
/// table is shared across kernels, so subgraphs reachable from several
/// kernels are evaluated once; consuming `self` in [`analyze`] guarantees
/// the working state cannot outlive the run.
///
/// [`analyze`]: StackUsageEngine::analyze
pub struct StackUsageEngine<'cfg> {
    config: &'cfg StackBudgetConfig,
    states: FxHashMap<NodeIndex, FunctionState>,
    report: AnalysisReport,
}

impl<'cfg> StackUsageEngine<'cfg> {
    pub fn new(config: &'cfg StackBudgetConfig) -> Self {
        Self {
            config,
            states: FxHashMap::default(),
            report: AnalysisReport::default(),
        }
    }

    /// Analyze every kernel, emitting diagnostics to `sink` and writing
    /// the per-kernel annotation where the bound is trustworthy.
    ///
    /// Failure for one kernel never prevents analysis of the others; the
    /// only hard error is the write-once annotation contract violation.
    pub fn analyze(
        mut self,
        graph: &mut KernelGraph,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<AnalysisReport, AnalysisError> {
        let start = Instant::now();
        for kernel in graph.kernels() {
            self.check_kernel(graph, kernel, sink)?;
        }
        self.report.duration = start.elapsed();
        Ok(self.report)
    }

    /// Evaluate one kernel, apply the alignment rule, and either warn,
    /// stay silent, or persist the annotation.
    fn check_kernel(
        &mut self,
        graph: &mut KernelGraph,
        kernel: NodeIndex,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), AnalysisError> {
        let name = graph.node(kernel).name.clone();
        debug!(kernel = %name, "processing kernel");

        let (worst_case_bits, uncertain) = self.evaluate(graph, kernel, sink);
        self.report.kernels_checked += 1;

        let used_bytes = self.config.align_up(worst_case_bits / BYTE_BITS);
        if used_bytes > self.config.max_stack_bytes {
            self.report.overflow_warnings += 1;
            sink.emit(Diagnostic::warning(
                DIAGNOSTIC_CATEGORY,
                format!(
                    "Kernel \"{}\" may overflow stack. Used {} bytes of {}\nCalls: {}",
                    name,
                    used_bytes,
                    self.config.max_stack_bytes,
                    self.call_sequence(graph, kernel)
                ),
            ));
            return Ok(());
        }

        // An under-budget kernel with an untrustworthy bound gets neither
        // a diagnostic nor an annotation; downstream tooling treats the
        // absence of a message as a soft pass.
        if uncertain {
            self.report.uncertain_kernels += 1;
            debug!(kernel = %name, "recursion or unresolved call, no annotation");
            return Ok(());
        }

        graph.annotate_stack_usage(kernel, used_bytes)?;
        self.report.kernels_annotated += 1;
        debug!(kernel = %name, used_bytes, "stack amount annotated");
        Ok(())
    }

    /// Memoized recursive core: worst-case bits for `idx` plus whether
    /// the bound can be trusted.
    fn evaluate(
        &mut self,
        graph: &KernelGraph,
        idx: NodeIndex,
        sink: &mut dyn DiagnosticSink,
    ) -> (u64, bool) {
        if let Some(state) = self.states.get(&idx) {
            if state.status == VisitState::Done {
                return (state.worst_case_bits, state.uncertain);
            }
        }

        let info = graph.node(idx);
        // An indirect call or a stack-call convention makes the bound
        // untrustworthy regardless of what the callees report.
        let mut uncertain = info.has_indirect_call || info.requires_stack_call;

        self.states.entry(idx).or_default().status = VisitState::InProgress;
        self.report.functions_evaluated += 1;

        let mut heaviest_bits = 0u64;
        let mut heaviest_callee: Option<NodeIndex> = None;
        for callee in graph.direct_callees(idx) {
            let callee_info = graph.node(callee);
            if callee_info.is_declaration {
                debug!(callee = %callee_info.name, "is declaration");
                continue;
            }

            let status = self
                .states
                .get(&callee)
                .map(|s| s.status)
                .unwrap_or_default();
            let candidate_bits = match status {
                VisitState::InProgress => {
                    // Cycle edge: contributes nothing and must never be
                    // chosen as the heaviest callee.
                    sink.emit(Diagnostic::warning(
                        DIAGNOSTIC_CATEGORY,
                        format!(
                            "Recursion has been found in call graph. Called function: \
                             \"{}\" from \"{}\"\nStack overflow can occur, but cannot \
                             be diagnosed.",
                            callee_info.name, info.name
                        ),
                    ));
                    self.report.recursion_cycles += 1;
                    uncertain = true;
                    0
                }
                VisitState::NotStarted | VisitState::Done => {
                    let (bits, callee_uncertain) = self.evaluate(graph, callee, sink);
                    uncertain |= callee_uncertain;
                    bits
                }
            };

            debug!(callee = %callee_info.name, candidate_bits, "candidate size");
            if candidate_bits > heaviest_bits {
                heaviest_bits = candidate_bits;
                heaviest_callee = Some(callee);
            }
        }

        let worst_case_bits = info.frame_bits + heaviest_bits;
        debug!(function = %info.name, worst_case_bits, "size computed");

        let state = self.states.entry(idx).or_default();
        state.status = VisitState::Done;
        state.worst_case_bits = worst_case_bits;
        state.heaviest_callee = heaviest_callee;
        state.uncertain = uncertain;
        (worst_case_bits, uncertain)
    }

    /// Reconstruct the heaviest chain as `Kernel(7)->A(3)->B(1)`, with
    /// cumulative byte totals per level. Finite because cycle edges are
    /// never recorded as `heaviest_callee`.
    fn call_sequence(&self, graph: &KernelGraph, start: NodeIndex) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(start);
        while let Some(idx) = cursor {
            let state = self.states.get(&idx);
            let bits = state.map(|s| s.worst_case_bits).unwrap_or(0);
            parts.push(format!("{}({})", graph.node(idx).name, bits / BYTE_BITS));
            cursor = state.and_then(|s| s.heaviest_callee);
        }
        parts.join("->")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_graph::FunctionInfo;
    use crate::diagnostics::CollectedDiagnostics;

    fn generous_budget() -> StackBudgetConfig {
        StackBudgetConfig {
            max_stack_bytes: 1 << 20,
            alignment_bytes: 8,
        }
    }

    /// Kernel(32) -> A(16) -> B(8), no unknowns.
    fn simple_chain() -> (KernelGraph, NodeIndex) {
        let mut graph = KernelGraph::new();
        let k = graph.add_function(FunctionInfo::kernel("Kernel", 32)).unwrap();
        let a = graph.add_function(FunctionInfo::defined("A", 16)).unwrap();
        let b = graph.add_function(FunctionInfo::defined("B", 8)).unwrap();
        graph.add_call(k, a);
        graph.add_call(a, b);
        (graph, k)
    }

    #[test]
    fn simple_chain_sums_frames_and_aligns() {
        let (mut graph, k) = simple_chain();
        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        // 56 bits -> 7 bytes -> aligned to 8.
        assert_eq!(graph.stack_annotation(k), Some(8));
        assert!(sink.is_empty());
        assert_eq!(report.kernels_annotated, 1);
        assert_eq!(report.functions_evaluated, 3);
    }

    #[test]
    fn overflow_emits_trace_with_cumulative_bytes() {
        let (mut graph, k) = simple_chain();
        let config = StackBudgetConfig {
            max_stack_bytes: 4,
            alignment_bytes: 8,
        };
        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &config, &mut sink).unwrap();

        assert_eq!(graph.stack_annotation(k), None);
        assert_eq!(report.overflow_warnings, 1);
        let messages: Vec<_> = sink.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Kernel(7)->A(3)->B(1)"), "{}", messages[0]);
        assert!(messages[0].contains("Used 8 bytes of 4"), "{}", messages[0]);
    }

    #[test]
    fn self_recursion_contributes_only_own_frame() {
        let mut graph = KernelGraph::new();
        let k = graph.add_function(FunctionInfo::kernel("Kernel", 64)).unwrap();
        graph.add_call(k, k);

        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        // Cycle edge contributes 0; bound is untrustworthy, so no
        // annotation, but the recursion diagnostic is still visible.
        assert_eq!(graph.stack_annotation(k), None);
        assert_eq!(report.recursion_cycles, 1);
        assert_eq!(report.uncertain_kernels, 1);
        assert_eq!(sink.len(), 1);
        assert!(sink.iter().next().unwrap().message.contains("Recursion"));
    }

    #[test]
    fn two_function_cycle_terminates_and_is_uncertain() {
        let mut graph = KernelGraph::new();
        let k = graph.add_function(FunctionInfo::kernel("Kernel", 8)).unwrap();
        let a = graph.add_function(FunctionInfo::defined("A", 8)).unwrap();
        let b = graph.add_function(FunctionInfo::defined("B", 8)).unwrap();
        graph.add_call(k, a);
        graph.add_call(a, b);
        graph.add_call(b, a);

        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        assert_eq!(graph.stack_annotation(k), None);
        assert_eq!(report.recursion_cycles, 1);
        assert_eq!(report.uncertain_kernels, 1);
    }

    #[test]
    fn indirect_call_is_silent_when_under_budget() {
        let mut graph = KernelGraph::new();
        let k = graph.add_function(FunctionInfo::kernel("Kernel", 32)).unwrap();
        let a = graph
            .add_function(FunctionInfo {
                has_indirect_call: true,
                ..FunctionInfo::defined("A", 16)
            })
            .unwrap();
        graph.add_call(k, a);

        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        assert_eq!(graph.stack_annotation(k), None);
        assert!(sink.is_empty());
        assert_eq!(report.uncertain_kernels, 1);
    }

    #[test]
    fn declarations_are_skipped() {
        let mut graph = KernelGraph::new();
        let k = graph.add_function(FunctionInfo::kernel("Kernel", 32)).unwrap();
        let ext = graph.add_function(FunctionInfo::declaration("extern_fn")).unwrap();
        graph.add_call(k, ext);

        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        assert_eq!(graph.stack_annotation(k), Some(8));
        // Only the kernel body is walked.
        assert_eq!(report.functions_evaluated, 1);
    }

    #[test]
    fn shared_subgraph_is_evaluated_once() {
        // Two kernels calling into the same helper chain.
        let mut graph = KernelGraph::new();
        let k1 = graph.add_function(FunctionInfo::kernel("K1", 8)).unwrap();
        let k2 = graph.add_function(FunctionInfo::kernel("K2", 8)).unwrap();
        let shared = graph.add_function(FunctionInfo::defined("shared", 128)).unwrap();
        let leaf = graph.add_function(FunctionInfo::defined("leaf", 64)).unwrap();
        graph.add_call(k1, shared);
        graph.add_call(k2, shared);
        graph.add_call(shared, leaf);

        let mut sink = CollectedDiagnostics::new();
        let report = analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        assert_eq!(report.functions_evaluated, 4);
        assert_eq!(graph.stack_annotation(k1), Some(25_u64.div_ceil(8) * 8));
        assert_eq!(graph.stack_annotation(k1), graph.stack_annotation(k2));
    }

    #[test]
    fn heaviest_callee_wins_the_max() {
        let mut graph = KernelGraph::new();
        let k = graph.add_function(FunctionInfo::kernel("Kernel", 0)).unwrap();
        let light = graph.add_function(FunctionInfo::defined("light", 64)).unwrap();
        let heavy = graph.add_function(FunctionInfo::defined("heavy", 512)).unwrap();
        graph.add_call(k, light);
        graph.add_call(k, heavy);

        let mut sink = CollectedDiagnostics::new();
        analyze(&mut graph, &generous_budget(), &mut sink).unwrap();

        // 512 bits = 64 bytes, already aligned.
        assert_eq!(graph.stack_annotation(k), Some(64));
    }

    #[test]
    fn reannotation_is_a_contract_violation() {
        let (mut graph, k) = simple_chain();
        graph.annotate_stack_usage(k, 8).unwrap();

        let mut sink = CollectedDiagnostics::new();
        let err = analyze(&mut graph, &generous_budget(), &mut sink);
        assert!(matches!(
            err,
            Err(AnalysisError::AlreadyAnnotated { kernel }) if kernel == "Kernel"
        ));
    }
}
