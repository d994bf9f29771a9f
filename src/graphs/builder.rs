//! `GraphBuilder`: fluent accumulation of nodes/edges plus fork/join sugar.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

use super::definition::GraphDefinition;
use super::edges::{Edge, EdgePredicate};
use crate::node::Node;
use crate::types::NodeId;

/// Builder for constructing a [`GraphDefinition`] with a fluent API.
///
/// Accumulates nodes and edges in insertion order. Argument-level checks
/// (duplicate node ids) are recorded immediately; the remaining structural
/// rules (reachability, cycles, dangling endpoints) are deferred to
/// [`GraphDefinition::validate`] so that a partially-built graph can still
/// be inspected before it is considered final.
pub struct GraphBuilder {
    id: String,
    name: String,
    nodes: FxHashMap<NodeId, Arc<dyn Node>>,
    insertion_order: Vec<NodeId>,
    edges: Vec<Edge>,
    entry_node_id: Option<NodeId>,
    exit_node_ids: Option<FxHashSet<NodeId>>,
    duplicate_node_ids: Vec<NodeId>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: FxHashMap::default(),
            insertion_order: Vec::new(),
            edges: Vec::new(),
            entry_node_id: None,
            exit_node_ids: None,
            duplicate_node_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn generated(name: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), name)
    }

    /// Registers a node, keyed by its own [`Node::id`].
    ///
    /// A duplicate id is recorded (not panicked on) and will surface as a
    /// validation error; the later registration wins, matching ordinary
    /// map-insert semantics.
    #[must_use]
    pub fn add_node<N: Node + 'static>(mut self, node: N) -> Self {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            self.duplicate_node_ids.push(id.clone());
        } else {
            self.insertion_order.push(id.clone());
        }
        self.nodes.insert(id, Arc::new(node));
        self
    }

    /// Adds an unconditional edge `source -> target`.
    #[must_use]
    pub fn add_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.edges.push(Edge::unconditional(source, target));
        self
    }

    /// Adds an edge `source -> target` gated by `predicate`.
    #[must_use]
    pub fn add_conditional_edge(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        predicate: EdgePredicate,
    ) -> Self {
        self.edges.push(Edge::conditional(source, target, predicate));
        self
    }

    /// Shorthand for one unconditional edge per target, in the order given.
    #[must_use]
    pub fn fork(mut self, source: impl Into<String>, targets: &[&str]) -> Self {
        let source = source.into();
        for target in targets {
            self.edges.push(Edge::unconditional(source.clone(), *target));
        }
        self
    }

    /// Shorthand for one unconditional edge per source into `target`.
    #[must_use]
    pub fn join(mut self, target: impl Into<String>, sources: &[&str]) -> Self {
        let target = target.into();
        for source in sources {
            self.edges.push(Edge::unconditional(*source, target.clone()));
        }
        self
    }

    /// Overrides the entry node. If never called, the entry defaults to
    /// the first node inserted (spec §4.1 rule 2).
    #[must_use]
    pub fn with_entry(mut self, node_id: impl Into<String>) -> Self {
        self.entry_node_id = Some(node_id.into());
        self
    }

    /// Overrides the exit node set. If never called, exits are derived as
    /// the nodes with zero outgoing edges (spec §4.1 rule 3).
    #[must_use]
    pub fn with_exits(mut self, node_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exit_node_ids = Some(node_ids.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Compiles the accumulated nodes/edges into a [`GraphDefinition`].
    ///
    /// This does not itself run structural validation — call
    /// [`GraphDefinition::validate`] on the result, or rely on the executor
    /// (which validates before accepting an execution request). Duplicate
    /// node ids recorded during [`Self::add_node`] are folded into the
    /// definition's validation output as synthetic errors.
    #[must_use]
    pub fn build(self) -> GraphDefinition {
        let first_inserted = self.insertion_order.first().cloned();
        let entry_node_id = self.entry_node_id.or(first_inserted).unwrap_or_default();

        let exit_node_ids = self
            .exit_node_ids
            .unwrap_or_else(|| derive_exits(&self.nodes, &self.edges));

        let mut definition = GraphDefinition::new(
            self.id,
            self.name,
            self.nodes,
            self.edges,
            entry_node_id,
            exit_node_ids,
        );
        if !self.duplicate_node_ids.is_empty() {
            definition.note_duplicate_node_ids(self.duplicate_node_ids);
        }
        definition
    }
}

/// Nodes with no outgoing edges are exits by default.
fn derive_exits(nodes: &FxHashMap<NodeId, Arc<dyn Node>>, edges: &[Edge]) -> FxHashSet<NodeId> {
    let mut with_outgoing: FxHashSet<&str> = FxHashSet::default();
    for edge in edges {
        with_outgoing.insert(edge.source_id.as_str());
    }
    nodes
        .keys()
        .filter(|id| !with_outgoing.contains(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::scheduler::cancellation::CancellationSignal;
    use crate::state::{NodeResult, WorkflowState};
    use async_trait::async_trait;

    struct Noop(&'static str);

    #[async_trait]
    impl Node for Noop {
        fn id(&self) -> &str {
            self.0
        }
        fn name(&self) -> &str {
            self.0
        }
        async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
            NodeResult::success(self.0, "e", state.clone())
        }
        fn input_keys(&self) -> &[String] {
            &[]
        }
        fn output_keys(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn fork_expands_to_one_edge_per_target() {
        let graph = GraphBuilder::new("g", "n")
            .add_node(Noop("a"))
            .add_node(Noop("b"))
            .add_node(Noop("c"))
            .fork("a", &["b", "c"])
            .with_entry("a")
            .build();
        assert_eq!(graph.outgoing("a").len(), 2);
    }

    #[test]
    fn default_entry_is_the_first_node_inserted_not_sorted_by_id() {
        let graph = GraphBuilder::new("g", "n")
            .add_node(Noop("z"))
            .add_node(Noop("a"))
            .add_edge("z", "a")
            .build();
        assert_eq!(graph.entry_node_id, "z");
    }

    #[test]
    fn default_exits_are_nodes_with_no_outgoing_edges() {
        let graph = GraphBuilder::new("g", "n")
            .add_node(Noop("a"))
            .add_node(Noop("b"))
            .add_edge("a", "b")
            .with_entry("a")
            .build();
        assert!(graph.exit_node_ids.contains("b"));
        assert!(!graph.exit_node_ids.contains("a"));
    }
}
