//! `GraphDefinition`: the compiled, read-only graph topology plus
//! structural validation.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graphs::edges::Edge;
use crate::node::Node;
use crate::types::NodeId;

/// A compiled workflow graph: nodes, ordered edges, and the entry/exit
/// node sets. Produced by [`crate::graphs::GraphBuilder::build`].
pub struct GraphDefinition {
    pub id: String,
    pub name: String,
    pub(crate) nodes: FxHashMap<NodeId, Arc<dyn Node>>,
    pub(crate) edges: Vec<Edge>,
    pub entry_node_id: NodeId,
    pub exit_node_ids: FxHashSet<NodeId>,
    validation_cache: OnceLock<Vec<String>>,
    extra_errors: Vec<String>,
}

impl GraphDefinition {
    pub(crate) fn new(
        id: String,
        name: String,
        nodes: FxHashMap<NodeId, Arc<dyn Node>>,
        edges: Vec<Edge>,
        entry_node_id: NodeId,
        exit_node_ids: FxHashSet<NodeId>,
    ) -> Self {
        Self {
            id,
            name,
            nodes,
            edges,
            entry_node_id,
            exit_node_ids,
            validation_cache: OnceLock::new(),
            extra_errors: Vec::new(),
        }
    }

    /// Records builder-time errors (e.g. duplicate node ids) that should be
    /// folded into [`Self::validate`]'s output. Must be called before the
    /// first call to `validate` — the cache is populated lazily on first
    /// access and is immutable afterward.
    pub(crate) fn note_duplicate_node_ids(&mut self, ids: Vec<NodeId>) {
        for id in ids {
            self.extra_errors
                .push(format!("duplicate node id registered: '{id}'"));
        }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Outgoing edges from `node_id`, in insertion order.
    #[must_use]
    pub fn outgoing(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source_id == node_id).collect()
    }

    /// Incoming edges to `node_id`, in insertion order.
    #[must_use]
    pub fn incoming(&self, node_id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target_id == node_id).collect()
    }

    /// Nodes reachable from `node_id` via a BFS that ignores predicates
    /// (structural reachability, per spec §4.1 rule 5).
    #[must_use]
    pub fn reachable(&self, node_id: &str) -> FxHashSet<NodeId> {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        if !self.nodes.contains_key(node_id) {
            return seen;
        }
        let mut queue = VecDeque::new();
        queue.push_back(node_id.to_string());
        seen.insert(node_id.to_string());
        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing(&current) {
                if seen.insert(edge.target_id.clone()) {
                    queue.push_back(edge.target_id.clone());
                }
            }
        }
        seen
    }

    /// Runs structural validation, collecting *all* violations (no
    /// short-circuiting), and caches the result after the first call.
    ///
    /// Rules (spec §4.1):
    /// 1. the node map must be non-empty;
    /// 2. `entry_node_id` must exist;
    /// 3. `exit_node_ids` must all exist;
    /// 4. every edge endpoint must exist;
    /// 5. every node must be reachable from the entry;
    /// 6. the graph must be acyclic after eliding edges whose predicate is
    ///    the structurally-constant-false sentinel.
    #[must_use]
    pub fn validate(&self) -> &[String] {
        self.validation_cache.get_or_init(|| self.run_validation())
    }

    fn run_validation(&self) -> Vec<String> {
        let mut errors = self.extra_errors.clone();

        if self.nodes.is_empty() {
            errors.push("graph has no nodes".to_string());
        }

        if !self.nodes.contains_key(&self.entry_node_id) {
            errors.push(format!(
                "entry node '{}' does not exist in the node map",
                self.entry_node_id
            ));
        }

        for exit_id in &self.exit_node_ids {
            if !self.nodes.contains_key(exit_id) {
                errors.push(format!("exit node '{exit_id}' does not exist in the node map"));
            }
        }

        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.source_id) {
                errors.push(format!(
                    "edge source '{}' does not exist in the node map",
                    edge.source_id
                ));
            }
            if !self.nodes.contains_key(&edge.target_id) {
                errors.push(format!(
                    "edge target '{}' does not exist in the node map",
                    edge.target_id
                ));
            }
        }

        // Rule 5: reachability from entry. Only meaningful if the entry
        // itself resolves; otherwise every node is trivially unreachable
        // and we'd just be restating rule 2's error N times.
        if self.nodes.contains_key(&self.entry_node_id) {
            let reached = self.reachable(&self.entry_node_id);
            for node_id in self.nodes.keys() {
                if !reached.contains(node_id) {
                    errors.push(format!("node '{node_id}' is not reachable from the entry node"));
                }
            }
        }

        // Rule 6: cycle detection, eliding structurally-false edges.
        if let Some(cycle) = self.find_cycle() {
            errors.push(format!("graph contains a cycle: {}", cycle.join(" -> ")));
        }

        errors
    }

    /// Iterative (explicit-stack) Tarjan-style DFS cycle detection. Returns
    /// the back-edge path of the first cycle found, or `None` if acyclic.
    /// Edges whose predicate is the constant-false sentinel are skipped:
    /// they can never fire, so they cannot contribute to a live cycle.
    fn find_cycle(&self) -> Option<Vec<NodeId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            InStack,
            Done,
        }

        let mut marks: FxHashMap<NodeId, Mark> = FxHashMap::default();
        // Explicit frame: (node, index into its outgoing-edge list already visited)
        struct Frame {
            node: NodeId,
            next_edge: usize,
        }

        for start in self.nodes.keys() {
            if marks.contains_key(start) {
                continue;
            }
            let mut stack: Vec<Frame> = vec![Frame {
                node: start.clone(),
                next_edge: 0,
            }];
            marks.insert(start.clone(), Mark::InStack);

            while let Some(frame) = stack.last_mut() {
                let outgoing = self.outgoing(&frame.node);
                if frame.next_edge >= outgoing.len() {
                    marks.insert(frame.node.clone(), Mark::Done);
                    stack.pop();
                    continue;
                }
                let edge = outgoing[frame.next_edge];
                frame.next_edge += 1;
                if edge.is_structurally_false() {
                    continue;
                }
                match marks.get(&edge.target_id) {
                    Some(Mark::InStack) => {
                        let mut path: Vec<NodeId> = stack.iter().map(|f| f.node.clone()).collect();
                        path.push(edge.target_id.clone());
                        if let Some(pos) = path.iter().position(|n| n == &edge.target_id) {
                            return Some(path[pos..].to_vec());
                        }
                        return Some(path);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(edge.target_id.clone(), Mark::InStack);
                        stack.push(Frame {
                            node: edge.target_id.clone(),
                            next_edge: 0,
                        });
                    }
                }
            }
        }
        None
    }
}
