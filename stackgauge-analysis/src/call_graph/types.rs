//! Call graph types — function nodes and the adjacency view.

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use stackgauge_core::errors::{AnalysisError, GraphError};
use stackgauge_core::types::collections::{FxHashMap, SmallVec8};

/// A function in the call graph, with the attributes the stack analysis
/// consumes. Identity is the `NodeIndex` handed out by [`KernelGraph`];
/// indices are stable for the lifetime of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Sum of all fixed-size local stack allocations, in bits.
    /// Variable-length locals are a front-end invariant violation and
    /// must not reach this stage.
    pub frame_bits: u64,
    /// Contains at least one call whose target is not statically known.
    pub has_indirect_call: bool,
    /// Uses the externally defined stack-call ABI; its stack usage is not
    /// under this analysis's model.
    pub requires_stack_call: bool,
    /// Kernel entry point — a root of one stack-usage evaluation.
    pub is_kernel: bool,
    /// Declaration without a body; contributes nothing as a callee.
    pub is_declaration: bool,
    /// Persisted worst-case stack amount in bytes, written once by the
    /// analysis. `None` means unknown.
    pub stack_annotation: Option<u64>,
}

impl FunctionInfo {
    /// A defined (non-kernel) function with the given frame size.
    pub fn defined(name: impl Into<String>, frame_bits: u64) -> Self {
        Self {
            name: name.into(),
            frame_bits,
            has_indirect_call: false,
            requires_stack_call: false,
            is_kernel: false,
            is_declaration: false,
            stack_annotation: None,
        }
    }

    /// A kernel entry point with the given frame size.
    pub fn kernel(name: impl Into<String>, frame_bits: u64) -> Self {
        Self {
            is_kernel: true,
            ..Self::defined(name, frame_bits)
        }
    }

    /// An external declaration without a body.
    pub fn declaration(name: impl Into<String>) -> Self {
        Self {
            is_declaration: true,
            ..Self::defined(name, 0)
        }
    }
}

/// The kernel call graph: a directed graph of function calls.
///
/// Nodes are function records, edges are call sites. Indirect calls have
/// no edge; they are recorded as `has_indirect_call` on the caller.
pub struct KernelGraph {
    graph: StableGraph<FunctionInfo, (), Directed>,
    /// Map from function name → NodeIndex for O(1) lookup.
    node_index: FxHashMap<String, NodeIndex>,
}

impl KernelGraph {
    /// Create an empty call graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            node_index: FxHashMap::default(),
        }
    }

    /// Number of functions (nodes) in the graph.
    pub fn function_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of call edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Register a function, returning its stable index.
    ///
    /// Every function must be registered exactly once; registering the
    /// same name twice is a front-end error.
    pub fn add_function(&mut self, info: FunctionInfo) -> Result<NodeIndex, GraphError> {
        if self.node_index.contains_key(&info.name) {
            return Err(GraphError::DuplicateFunction { name: info.name });
        }
        let name = info.name.clone();
        let idx = self.graph.add_node(info);
        self.node_index.insert(name, idx);
        Ok(idx)
    }

    /// Record a direct call from `caller` to `callee`.
    pub fn add_call(&mut self, caller: NodeIndex, callee: NodeIndex) {
        self.graph.add_edge(caller, callee, ());
    }

    /// Look up a node by function name.
    pub fn get_node(&self, name: &str) -> Option<NodeIndex> {
        self.node_index.get(name).copied()
    }

    /// The function record for a node.
    pub fn node(&self, idx: NodeIndex) -> &FunctionInfo {
        &self.graph[idx]
    }

    /// Direct callees of a function, in a stable order within one run.
    pub fn direct_callees(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// All kernel entry points, in registration order.
    pub fn kernels(&self) -> SmallVec8<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].is_kernel)
            .collect()
    }

    /// The persisted stack annotation for a function, if any.
    pub fn stack_annotation(&self, idx: NodeIndex) -> Option<u64> {
        self.graph[idx].stack_annotation
    }

    /// Write the per-kernel stack amount, in bytes.
    ///
    /// Write-once: annotating an already-annotated function is a caller
    /// contract violation.
    pub fn annotate_stack_usage(
        &mut self,
        idx: NodeIndex,
        bytes: u64,
    ) -> Result<(), AnalysisError> {
        let info = &mut self.graph[idx];
        if info.stack_annotation.is_some() {
            return Err(AnalysisError::AlreadyAnnotated {
                kernel: info.name.clone(),
            });
        }
        info.stack_annotation = Some(bytes);
        Ok(())
    }
}

impl Default for KernelGraph {
    fn default() -> Self {
        Self::new()
    }
}
