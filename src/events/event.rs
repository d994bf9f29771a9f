//! The event stream's element type (spec §3, §4.4): one tagged variant per
//! transition the executor can observe, chained by `previous_hash` so a
//! consumer can detect gaps or reordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::WorkflowState;
use crate::types::NodeId;

/// A single execution event, internally tagged by `eventType` (spec §6.3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum StateEvent {
    NodeEntered {
        id: String,
        execution_id: String,
        node_id: NodeId,
        state: WorkflowState,
        timestamp: DateTime<Utc>,
        previous_hash: Option<String>,
    },
    NodeExited {
        id: String,
        execution_id: String,
        node_id: NodeId,
        state: WorkflowState,
        timestamp: DateTime<Utc>,
        previous_hash: Option<String>,
    },
    NodeError {
        id: String,
        execution_id: String,
        node_id: NodeId,
        state: WorkflowState,
        timestamp: DateTime<Utc>,
        previous_hash: Option<String>,
        error: String,
        stack_trace: Option<String>,
    },
    WorkflowCompleted {
        id: String,
        execution_id: String,
        node_id: Option<NodeId>,
        state: WorkflowState,
        timestamp: DateTime<Utc>,
        previous_hash: Option<String>,
    },
    WorkflowFailed {
        id: String,
        execution_id: String,
        node_id: Option<NodeId>,
        state: WorkflowState,
        timestamp: DateTime<Utc>,
        previous_hash: Option<String>,
        error: String,
    },
}

impl StateEvent {
    #[must_use]
    pub fn node_entered(
        execution_id: impl Into<String>,
        node_id: impl Into<NodeId>,
        state: WorkflowState,
        previous_hash: Option<String>,
    ) -> Self {
        Self::NodeEntered {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            node_id: node_id.into(),
            state,
            timestamp: Utc::now(),
            previous_hash,
        }
    }

    #[must_use]
    pub fn node_exited(
        execution_id: impl Into<String>,
        node_id: impl Into<NodeId>,
        state: WorkflowState,
        previous_hash: Option<String>,
    ) -> Self {
        Self::NodeExited {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            node_id: node_id.into(),
            state,
            timestamp: Utc::now(),
            previous_hash,
        }
    }

    #[must_use]
    pub fn node_error(
        execution_id: impl Into<String>,
        node_id: impl Into<NodeId>,
        state: WorkflowState,
        previous_hash: Option<String>,
        error: impl Into<String>,
        stack_trace: Option<String>,
    ) -> Self {
        Self::NodeError {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            node_id: node_id.into(),
            state,
            timestamp: Utc::now(),
            previous_hash,
            error: error.into(),
            stack_trace,
        }
    }

    #[must_use]
    pub fn workflow_completed(
        execution_id: impl Into<String>,
        state: WorkflowState,
        previous_hash: Option<String>,
    ) -> Self {
        Self::WorkflowCompleted {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            node_id: None,
            state,
            timestamp: Utc::now(),
            previous_hash,
        }
    }

    #[must_use]
    pub fn workflow_failed(
        execution_id: impl Into<String>,
        state: WorkflowState,
        previous_hash: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::WorkflowFailed {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            node_id: None,
            state,
            timestamp: Utc::now(),
            previous_hash,
            error: error.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::NodeEntered { id, .. }
            | Self::NodeExited { id, .. }
            | Self::NodeError { id, .. }
            | Self::WorkflowCompleted { id, .. }
            | Self::WorkflowFailed { id, .. } => id,
        }
    }

    #[must_use]
    pub fn execution_id(&self) -> &str {
        match self {
            Self::NodeEntered { execution_id, .. }
            | Self::NodeExited { execution_id, .. }
            | Self::NodeError { execution_id, .. }
            | Self::WorkflowCompleted { execution_id, .. }
            | Self::WorkflowFailed { execution_id, .. } => execution_id,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeEntered { node_id, .. }
            | Self::NodeExited { node_id, .. }
            | Self::NodeError { node_id, .. } => Some(node_id.as_str()),
            Self::WorkflowCompleted { node_id, .. } | Self::WorkflowFailed { node_id, .. } => {
                node_id.as_deref()
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        match self {
            Self::NodeEntered { state, .. }
            | Self::NodeExited { state, .. }
            | Self::NodeError { state, .. }
            | Self::WorkflowCompleted { state, .. }
            | Self::WorkflowFailed { state, .. } => state,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::NodeEntered { timestamp, .. }
            | Self::NodeExited { timestamp, .. }
            | Self::NodeError { timestamp, .. }
            | Self::WorkflowCompleted { timestamp, .. }
            | Self::WorkflowFailed { timestamp, .. } => *timestamp,
        }
    }

    #[must_use]
    pub fn previous_hash(&self) -> Option<&str> {
        match self {
            Self::NodeEntered { previous_hash, .. }
            | Self::NodeExited { previous_hash, .. }
            | Self::NodeError { previous_hash, .. }
            | Self::WorkflowCompleted { previous_hash, .. }
            | Self::WorkflowFailed { previous_hash, .. } => previous_hash.as_deref(),
        }
    }

    /// Whether this variant is one of the two possible stream terminators.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WorkflowCompleted { .. } | Self::WorkflowFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_stamp_fresh_ids_and_timestamps() {
        let state = WorkflowState::new("w", "t");
        let a = StateEvent::node_entered("exec-1", "n1", state.clone(), None);
        let b = StateEvent::node_entered("exec-1", "n1", state, None);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.node_id(), Some("n1"));
    }

    #[test]
    fn terminal_events_are_recognised() {
        let state = WorkflowState::new("w", "t");
        let completed = StateEvent::workflow_completed("exec-1", state.clone(), None);
        let entered = StateEvent::node_entered("exec-1", "n1", state, None);
        assert!(completed.is_terminal());
        assert!(!entered.is_terminal());
    }

    #[test]
    fn serializes_with_internally_tagged_event_type() {
        let state = WorkflowState::new("w", "t");
        let event = StateEvent::node_error("exec-1", "n1", state, None, "boom", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "nodeError");
        assert_eq!(json["error"], "boom");
    }
}
