//! The node execution contract (spec §6.1): the external interface every
//! compute unit in a graph implements. The executor owns invocation,
//! timeout, retry, and event emission — nodes only compute.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::scheduler::cancellation::CancellationSignal;
use crate::state::{NodeResult, WorkflowState};

/// A single vertex in a workflow graph.
///
/// `input_keys`/`output_keys` are advisory metadata only — the executor
/// does not enforce them; they exist for introspection and graph-export
/// tooling (§6.1).
#[async_trait]
pub trait Node: Send + Sync {
    /// Stable identifier, unique within a graph. Also the key nodes are
    /// registered under in [`crate::graphs::GraphBuilder::add_node`].
    fn id(&self) -> &str;

    /// Human-readable name, used in traces and textual graph export.
    fn name(&self) -> &str;

    /// Executes this node against `state`, cooperating with `cancel`.
    ///
    /// Implementations that perform long-running I/O should poll
    /// `cancel.is_cancelled()` (or race against `cancel.cancelled()`) at
    /// natural suspension points and return promptly once cancellation
    /// fires — the executor will not forcibly abort the future.
    async fn execute(&self, state: &WorkflowState, cancel: &CancellationSignal) -> NodeResult;

    /// Advisory: `data` keys this node reads from the incoming state.
    fn input_keys(&self) -> &[String];

    /// Advisory: `data` keys this node writes on success.
    fn output_keys(&self) -> &[String];

    /// Advisory tag used to select timeout/circuit-breaker policy (e.g.
    /// `"llm"` for the longer `llm_node_timeout`, per spec §4.2). Nodes
    /// that don't care about differentiated policy can leave this `None`.
    fn tag(&self) -> Option<&str> {
        None
    }
}

/// Errors a node body can surface besides returning `NodeResult::Failure`
/// directly. Node implementations are free to return `Failure` themselves;
/// this type exists for collaborator nodes (e.g. LLM-backed ones) that
/// prefer `?`-propagation and convert into a `Failure` at the boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    #[error("missing required input: {what}")]
    #[diagnostic(code(graphflow::node::missing_input))]
    MissingInput { what: String },

    #[error("provider '{provider}' failed: {message}")]
    #[diagnostic(code(graphflow::node::provider_failure))]
    Provider { provider: String, message: String },

    #[error("validation failed: {0}")]
    #[diagnostic(code(graphflow::node::validation_failed))]
    ValidationFailed(String),

    #[error(transparent)]
    #[diagnostic(code(graphflow::node::serde))]
    Serde(#[from] serde_json::Error),
}

impl NodeError {
    /// Converts this error into a `NodeResult::Failure` for `node_id`.
    #[must_use]
    pub fn into_result(self, node_id: impl Into<String>, execution_id: impl Into<String>) -> NodeResult {
        NodeResult::failure(node_id, execution_id, self.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    struct Echo;

    #[async_trait]
    impl Node for Echo {
        fn id(&self) -> &str {
            "echo"
        }
        fn name(&self) -> &str {
            "echo"
        }
        async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
            NodeResult::success("echo", "exec-1", state.clone())
        }
        fn input_keys(&self) -> &[String] {
            &[]
        }
        fn output_keys(&self) -> &[String] {
            &[]
        }
    }

    #[tokio::test]
    async fn node_executes_and_returns_success() {
        let node = Echo;
        let state = WorkflowState::new("w", "t");
        let cancel = CancellationSignal::new();
        let result = node.execute(&state, &cancel).await;
        assert_eq!(result.node_id(), "echo");
    }

    #[test]
    fn node_error_converts_to_failure_result() {
        let err = NodeError::MissingInput { what: "user_id".into() };
        let result = err.into_result("n1", "exec-1");
        matches!(result, NodeResult::Failure { .. });
    }
}
