//! Crate-wide error taxonomy (spec §7).
//!
//! `ValidationError` never reaches the executor (graphs are rejected at
//! build/validate time); the remaining variants are surfaced through the
//! event stream (`NodeError`) or as the terminal `WorkflowFailed` event.

use miette::Diagnostic;
use thiserror::Error;

/// Graph structural validation failed; aggregates every rule violation
/// collected by [`crate::graphs::GraphDefinition::validate`].
#[derive(Debug, Error, Diagnostic)]
#[error("graph validation failed:\n{}", .violations.join("\n"))]
#[diagnostic(code(graphflow::validation_failed))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    #[must_use]
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }
}

/// A node's `execute` returned `Failure` or the executor classified its
/// outcome as one.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeFailure {
    #[error("node '{node_id}' failed: {reason}")]
    #[diagnostic(code(graphflow::node_failure))]
    Failed { node_id: String, reason: String },

    /// Subclass of `NodeFailure`: the node exceeded its timeout budget.
    #[error("node '{node_id}' timed out after {duration_ms}ms")]
    #[diagnostic(code(graphflow::node_timeout))]
    Timeout { node_id: String, duration_ms: u64 },

    /// Cooperative cancellation reached the node mid-execution.
    #[error("node '{node_id}' was cancelled")]
    #[diagnostic(code(graphflow::node_cancelled))]
    Cancelled { node_id: String },

    /// Retry-eligible subclass, classified by a [`crate::scheduler::retry::RetryPolicy`]
    /// when one is active.
    #[error("node '{node_id}' failed transiently: {reason}")]
    #[diagnostic(code(graphflow::node_transient_failure))]
    Transient { node_id: String, reason: String },
}

impl NodeFailure {
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            NodeFailure::Failed { node_id, .. }
            | NodeFailure::Timeout { node_id, .. }
            | NodeFailure::Cancelled { node_id, .. }
            | NodeFailure::Transient { node_id, .. } => node_id,
        }
    }

    /// Classifies a node-reported `Failure` reason into `Transient` vs
    /// `Failed` by message heuristic (spec §5/§7: "classifies exceptions as
    /// transient (timeout, connection reset, I/O) vs terminal"). A node has
    /// no structured error-kind channel of its own (§6.1's `NodeResult` only
    /// carries a free-text `reason`), so this is necessarily a substring
    /// match against the words the spec names.
    #[must_use]
    pub fn from_node_reason(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let node_id = node_id.into();
        let reason = reason.into();
        if is_transient_reason(&reason) {
            NodeFailure::Transient { node_id, reason }
        } else {
            NodeFailure::Failed { node_id, reason }
        }
    }
}

/// Substring heuristic for the transient-failure keywords named in spec §5:
/// "timeout, connection reset, I/O".
fn is_transient_reason(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    const TRANSIENT_MARKERS: &[&str] = &[
        "timeout",
        "timed out",
        "connection reset",
        "connection refused",
        "connection aborted",
        "broken pipe",
        "i/o",
        "io error",
        "temporarily unavailable",
    ];
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Top-level error surfaced by the state store.
#[derive(Debug, Error, Diagnostic)]
pub enum StateStoreError {
    #[error("no state found with id '{state_id}'")]
    #[diagnostic(code(graphflow::store::not_found))]
    NotFound { state_id: String },
}

/// Top-level error surfaced by the scheduler for conditions that are not
/// a specific node's fault (e.g. the graph has no entry node, or joining
/// a task panicked).
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error("graph failed validation")]
    #[diagnostic(code(graphflow::scheduler::invalid_graph))]
    InvalidGraph(#[from] ValidationError),

    #[error("a node task panicked: {0}")]
    #[diagnostic(code(graphflow::scheduler::join_error))]
    Join(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StateStoreError),
}

/// Aggregating crate-level error, mainly useful for callers that want a
/// single `Result<_, GraphflowError>` return type across the public API.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphflowError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Node(#[from] NodeFailure),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StateStoreError),
}
