//! Mermaid flowchart export for a [`GraphDefinition`] (spec §6.4).
//!
//! Fixes the unbalanced-parenthesis bug noted in the design notes: the
//! entry node and every exit node render as a *balanced* stadium shape
//! (`id(["label"])`), not the mismatched `id("label"])` some generators
//! emit when mixing the round-bracket and stadium syntaxes.

use std::fmt::Write as _;

use crate::graphs::GraphDefinition;

/// Renders `graph` as a Mermaid `flowchart TD` definition.
///
/// Regular nodes render as `id("label")`; the entry node and exit nodes
/// render as the stadium shape `id(["label"])` to set them apart visually.
/// Edges carrying a [`crate::graphs::edges::Edge::label`] render as
/// `src -->|label| tgt`; unlabelled edges as `src --> tgt`. Quotes and
/// line breaks in labels are escaped, and duplicate edges (same source,
/// target, and label) are emitted once.
#[must_use]
pub fn to_mermaid(graph: &GraphDefinition) -> String {
    let mut out = String::new();
    writeln!(out, "flowchart TD").unwrap();

    let mut node_ids: Vec<&String> = graph.node_ids().collect();
    node_ids.sort();

    for node_id in &node_ids {
        let node = graph.node(node_id).expect("node_ids() only yields registered ids");
        let is_boundary = **node_id == graph.entry_node_id || graph.exit_node_ids.contains(*node_id);
        let label = escape(node.name());
        if is_boundary {
            writeln!(out, "    {}([\"{}\"])", mermaid_id(node_id), label).unwrap();
        } else {
            writeln!(out, "    {}(\"{}\")", mermaid_id(node_id), label).unwrap();
        }
    }

    let mut seen_edges = std::collections::HashSet::new();
    for node_id in &node_ids {
        for edge in graph.outgoing(node_id) {
            let key = (edge.source_id.clone(), edge.target_id.clone(), edge.label.clone());
            if !seen_edges.insert(key) {
                continue;
            }
            let source = mermaid_id(&edge.source_id);
            let target = mermaid_id(&edge.target_id);
            match &edge.label {
                Some(label) => writeln!(out, "    {source} -->|{}| {target}", escape(label)).unwrap(),
                None => writeln!(out, "    {source} --> {target}").unwrap(),
            }
        }
    }

    out
}

/// Mermaid node ids may not contain most punctuation; node ids in this
/// crate are caller-chosen strings, so sanitize rather than assume.
fn mermaid_id(node_id: &str) -> String {
    node_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Escapes characters that would otherwise break a quoted Mermaid label.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("<br/>"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::GraphBuilder;
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
    fn entry_and_exit_nodes_use_balanced_stadium_shape() {
        let graph = GraphBuilder::new("g1", "pipeline")
            .add_node(Passthrough("a", "Start"))
            .add_node(Passthrough("b", "Middle"))
            .add_node(Passthrough("c", "End"))
            .add_edge("a", "b")
            .add_edge("b", "c")
            .with_entry("a")
            .with_exits(["c"])
            .build();

        let mermaid = to_mermaid(&graph);
        assert!(mermaid.starts_with("flowchart TD\n"));
        assert!(mermaid.contains("a([\"Start\"])"));
        assert!(mermaid.contains("c([\"End\"])"));
        assert!(mermaid.contains("b(\"Middle\")"));
        assert!(mermaid.contains("a --> b"));
        assert!(mermaid.contains("b --> c"));
        // Balanced: every opening bracket/paren pair has a matching close.
        assert_eq!(mermaid.matches("([\"").count(), mermaid.matches("\"])").count());
    }

    #[test]
    fn labelled_edges_render_with_pipe_syntax() {
        // `GraphBuilder` has no public labelled-edge constructor, so build
        // the definition directly to exercise the labelled rendering path.
        use crate::graphs::{Edge, GraphDefinition};
        use rustc_hash::{FxHashMap, FxHashSet};
        use std::sync::Arc;

        let mut nodes: FxHashMap<String, Arc<dyn Node>> = FxHashMap::default();
        nodes.insert("a".to_string(), Arc::new(Passthrough("a", "A")));
        nodes.insert("b".to_string(), Arc::new(Passthrough("b", "B")));
        let edges = vec![Edge::unconditional("a", "b").with_label("go")];
        let graph = GraphDefinition::new("g1".to_string(), "fork".to_string(), nodes, edges, "a".to_string(), FxHashSet::default());

        let mermaid = to_mermaid(&graph);
        assert!(mermaid.contains("a -->|go| b"));
    }

    #[test]
    fn node_ids_with_punctuation_are_sanitized() {
        let graph = GraphBuilder::new("g1", "weird")
            .add_node(Passthrough("step-1", "Step One"))
            .with_entry("step-1")
            .build();
        let mermaid = to_mermaid(&graph);
        assert!(mermaid.contains("step_1"));
        assert!(!mermaid.contains("step-1"));
    }
}
