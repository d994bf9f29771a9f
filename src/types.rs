//! Core identifier types used throughout the `graphflow` workflow engine.
//!
//! Node identity is a plain `String` rather than a closed enum: graphs are
//! defined by callers at runtime, and there is no virtual `Start`/`End`
//! sentinel node — entry and exit are explicit sets recorded on
//! [`crate::graphs::GraphDefinition`].

/// Identifier of a node within a [`crate::graphs::GraphDefinition`].
pub type NodeId = String;

/// Identifier of a logical workflow (many executions may share one).
pub type WorkflowId = String;

/// Identifier of a conversational thread grouping executions that share
/// message history.
pub type ThreadId = String;

/// Identifier of a single execution (one run of one graph).
pub type ExecutionId = String;

/// Terminal or in-progress status of a [`crate::state::WorkflowState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    /// Whether this status is one of the two terminal non-Running states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::Running => "Running",
            WorkflowStatus::Completed => "Completed",
            WorkflowStatus::Failed => "Failed",
            WorkflowStatus::Cancelled => "Cancelled",
        };
        write!(f, "{s}")
    }
}
