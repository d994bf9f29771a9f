//! Optional conversion to a `petgraph::graph::DiGraph` for callers that
//! want to run petgraph's own algorithms or renderers against a compiled
//! graph. Gated behind the `petgraph-compat` feature so the dependency is
//! not paid for by default.

use petgraph::graph::DiGraph;
use rustc_hash::FxHashMap;

use super::definition::GraphDefinition;

/// Converts `graph` into a petgraph digraph. Node weights are the node id;
/// edge weights are the edge's label, if any.
#[must_use]
pub fn to_petgraph(graph: &GraphDefinition) -> DiGraph<String, String> {
    let mut pg = DiGraph::new();
    let mut index_of = FxHashMap::default();
    for node_id in graph.node_ids() {
        let idx = pg.add_node(node_id.clone());
        index_of.insert(node_id.clone(), idx);
    }
    for node_id in graph.node_ids() {
        for edge in graph.outgoing(node_id) {
            if let (Some(&from), Some(&to)) = (index_of.get(&edge.source_id), index_of.get(&edge.target_id)) {
                pg.add_edge(from, to, edge.label.clone().unwrap_or_default());
            }
        }
    }
    pg
}
