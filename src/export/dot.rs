//! DOT (Graphviz) export for a [`GraphDefinition`] (spec §6.4).

use std::fmt::Write as _;

use crate::graphs::GraphDefinition;

/// Renders `graph` as a `digraph` suitable for Graphviz (`dot -Tpng ...`).
///
/// Nodes are box-shaped, labelled by [`crate::node::Node::name`]; the
/// entry node and every exit node get a rank hint (`rank=source` /
/// `rank=sink`) so Graphviz draws them at the extremes of the layout.
/// Edge labels come from [`crate::graphs::edges::Edge::label`] when
/// present; duplicate edges (same source, target, and label) are emitted
/// once. Quotes and line breaks in labels are escaped.
#[must_use]
pub fn to_dot(graph: &GraphDefinition) -> String {
    let mut out = String::new();
    let name = dot_identifier(&graph.name);

    writeln!(out, "digraph {name} {{").unwrap();
    writeln!(out, "    rankdir=LR;").unwrap();
    writeln!(out, "    node [shape=box];").unwrap();
    writeln!(out).unwrap();

    let mut node_ids: Vec<&String> = graph.node_ids().collect();
    node_ids.sort();

    for node_id in &node_ids {
        let node = graph.node(node_id).expect("node_ids() only yields registered ids");
        writeln!(out, "    {} [label={}];", quote(node_id), quote(node.name())).unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "    {{ rank=source; {}; }}", quote(&graph.entry_node_id)).unwrap();
    if !graph.exit_node_ids.is_empty() {
        let mut exits: Vec<&String> = graph.exit_node_ids.iter().collect();
        exits.sort();
        let sinks = exits.iter().map(|id| quote(id)).collect::<Vec<_>>().join("; ");
        writeln!(out, "    {{ rank=sink; {sinks}; }}").unwrap();
    }
    writeln!(out).unwrap();

    let mut seen_edges = std::collections::HashSet::new();
    for node_id in &node_ids {
        for edge in graph.outgoing(node_id) {
            let key = (edge.source_id.clone(), edge.target_id.clone(), edge.label.clone());
            if !seen_edges.insert(key) {
                continue;
            }
            match &edge.label {
                Some(label) => {
                    writeln!(out, "    {} -> {} [label={}];", quote(&edge.source_id), quote(&edge.target_id), quote(label)).unwrap();
                }
                None => {
                    writeln!(out, "    {} -> {};", quote(&edge.source_id), quote(&edge.target_id)).unwrap();
                }
            }
        }
    }

    writeln!(out, "}}").unwrap();
    out
}

/// A graph name safe to use unquoted as a DOT graph id; falls back to a
/// quoted string if it contains characters DOT identifiers disallow.
fn dot_identifier(name: &str) -> String {
    let is_plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') && !name.chars().next().unwrap().is_ascii_digit();
    if is_plain {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Quotes `value` as a DOT string literal, escaping embedded quotes and
/// rendering line breaks as the DOT `\l`/`\n` escape rather than a literal
/// newline (which would break the statement).
fn quote(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped.push('"');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::{always_false, GraphBuilder};
    use crate::node::Node;
    use crate::state::{NodeResult, WorkflowState};
    use async_trait::async_trait;

    struct Passthrough(&'static str, &'static str);

    #[async_trait]
    impl Node for Passthrough {
        fn id(&self) -> &str {
            self.0
        }
        fn name(&self) -> &str {
            self.1
        }
        async fn execute(&self, state: &WorkflowState, _cancel: &crate::scheduler::cancellation::CancellationSignal) -> NodeResult {
            NodeResult::success(self.0, "exec", state.clone())
        }
        fn input_keys(&self) -> &[String] {
            &[]
        }
        fn output_keys(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn linear_graph_renders_ranks_and_edges() {
        let graph = GraphBuilder::new("g1", "pipeline")
            .add_node(Passthrough("a", "Step A"))
            .add_node(Passthrough("b", "Step B"))
            .add_edge("a", "b")
            .with_entry("a")
            .build();

        let dot = to_dot(&graph);
        assert!(dot.starts_with("digraph pipeline {"));
        assert!(dot.contains("\"a\" [label=\"Step A\"];"));
        assert!(dot.contains("\"a\" -> \"b\";"));
        assert!(dot.contains("rank=source"));
        assert!(dot.contains("rank=sink"));
    }

    #[test]
    fn labels_with_quotes_are_escaped() {
        let graph = GraphBuilder::new("g1", "pipeline")
            .add_node(Passthrough("a", "Say \"hi\""))
            .with_entry("a")
            .build();
        let dot = to_dot(&graph);
        assert!(dot.contains("label=\"Say \\\"hi\\\"\""));
    }

    #[test]
    fn structurally_false_self_loop_is_still_exported() {
        // Export shows the literal edge set, including edges the
        // scheduler will never traverse; only cycle detection elides them.
        let graph = GraphBuilder::new("g1", "pipeline")
            .add_node(Passthrough("a", "A"))
            .add_conditional_edge("a", "a", always_false())
            .with_entry("a")
            .build();
        let dot = to_dot(&graph);
        assert!(dot.contains("\"a\" -> \"a\";"));
    }

    #[test]
    fn duplicate_edges_are_emitted_once() {
        let graph = GraphBuilder::new("g1", "dup")
            .add_node(Passthrough("a", "A"))
            .add_node(Passthrough("b", "B"))
            .add_edge("a", "b")
            .add_edge("a", "b")
            .with_entry("a")
            .build();
        let dot = to_dot(&graph);
        assert_eq!(dot.matches("\"a\" -> \"b\";").count(), 1);
    }
}
