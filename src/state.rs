//! Immutable workflow state and the `NodeResult` sum type.
//!
//! `WorkflowState` is the central snapshot type threaded through an
//! execution. Every mutator takes `&self` and returns a fresh `WorkflowState`
//! — callers never observe in-place mutation, matching invariant I1 (no
//! further mutation is observable once a run leaves `Running`). Unchanged
//! substructures (`data`, `messages`) are shared behind `Arc` rather than
//! deep-cloned on every step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::types::{NodeId, ThreadId, WorkflowId, WorkflowStatus};

/// Arbitrary dynamically-typed values keyed by string, as specified for
/// `WorkflowState.data`. Key order is not semantic.
pub type StateData = FxHashMap<String, serde_json::Value>;

/// The immutable workflow state snapshot.
///
/// # Invariants
/// - (I1) once `status != Running`, no further mutations are produced for
///   that execution.
/// - (I2) `error.is_some()` implies `status` is `Failed` or `Cancelled`.
/// - (I3) hashing the canonical serialized form is deterministic; see
///   [`crate::utils::hashing::state_hash`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub id: String,
    pub workflow_id: WorkflowId,
    pub thread_id: ThreadId,
    pub step: u64,
    pub data: Arc<StateData>,
    pub messages: Arc<Vec<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node_id: Option<NodeId>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowState {
    /// Creates a fresh `Running` state for a new execution.
    #[must_use]
    pub fn new(workflow_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            thread_id: thread_id.into(),
            step: 0,
            data: Arc::new(FxHashMap::default()),
            messages: Arc::new(Vec::new()),
            current_node_id: None,
            status: WorkflowStatus::Running,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    /// Starts a builder for constructing an initial state with messages
    /// and data pre-populated.
    #[must_use]
    pub fn builder(workflow_id: impl Into<String>, thread_id: impl Into<String>) -> WorkflowStateBuilder {
        WorkflowStateBuilder::new(workflow_id, thread_id)
    }

    /// Returns a copy advanced to `step`. Steps are monotonically
    /// non-decreasing; callers are expected to pass `self.step + 1` on a
    /// successful node exit.
    #[must_use]
    pub fn with_step(&self, step: u64) -> Self {
        let mut next = self.clone();
        next.step = step;
        next.updated_at = Utc::now();
        next
    }

    /// Returns a copy with `key` set to `value` in `data`.
    #[must_use]
    pub fn with_data(&self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut data = (*self.data).clone();
        data.insert(key.into(), value);
        let mut next = self.clone();
        next.data = Arc::new(data);
        next.updated_at = Utc::now();
        next
    }

    /// Returns a copy with `message` appended. Message order is semantic
    /// and append-only.
    #[must_use]
    pub fn with_message(&self, message: Message) -> Self {
        let mut messages = (*self.messages).clone();
        messages.push(message);
        let mut next = self.clone();
        next.messages = Arc::new(messages);
        next.updated_at = Utc::now();
        next
    }

    /// Returns a copy with all of `messages` appended, in order.
    #[must_use]
    pub fn with_messages(&self, messages: impl IntoIterator<Item = Message>) -> Self {
        let mut all = (*self.messages).clone();
        all.extend(messages);
        let mut next = self.clone();
        next.messages = Arc::new(all);
        next.updated_at = Utc::now();
        next
    }

    /// Returns a copy with `current_node_id` updated.
    #[must_use]
    pub fn with_current_node_id(&self, node_id: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.current_node_id = Some(node_id.into());
        next.updated_at = Utc::now();
        next
    }

    /// Returns a copy with `status` updated, validating I2 by construction:
    /// a non-empty `error` always implies `Failed`/`Cancelled` because this
    /// is the only way to set `status`, and [`Self::with_error`] sets both
    /// together.
    #[must_use]
    pub fn with_status(&self, status: WorkflowStatus) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.updated_at = Utc::now();
        next
    }

    /// Returns a copy marked `Failed` (or `Cancelled`, via
    /// `status_override`) with `error` set, preserving invariant I2.
    #[must_use]
    pub fn with_error(&self, error: impl Into<String>, status_override: Option<WorkflowStatus>) -> Self {
        let mut next = self.clone();
        next.error = Some(error.into());
        next.status = status_override.unwrap_or(WorkflowStatus::Failed);
        next.updated_at = Utc::now();
        next
    }

    /// True once the run has left `Running`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Fluent constructor for an initial [`WorkflowState`].
pub struct WorkflowStateBuilder {
    workflow_id: String,
    thread_id: String,
    messages: Vec<Message>,
    data: StateData,
}

impl WorkflowStateBuilder {
    fn new(workflow_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            thread_id: thread_id.into(),
            messages: Vec::new(),
            data: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    #[must_use]
    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> WorkflowState {
        let now = Utc::now();
        WorkflowState {
            id: Uuid::new_v4().to_string(),
            workflow_id: self.workflow_id,
            thread_id: self.thread_id,
            step: 0,
            data: Arc::new(self.data),
            messages: Arc::new(self.messages),
            current_node_id: None,
            status: WorkflowStatus::Running,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }
}

/// Outcome of a single node invocation.
///
/// A closed sum type distinguished in serialized form by the internal tag
/// `"outcome"` (§6.3's "structural tag" discriminator strategy for
/// results, as distinct from `StateEvent`'s `eventType` tag).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum NodeResult {
    Success {
        node_id: NodeId,
        execution_id: String,
        timestamp: DateTime<Utc>,
        output_state: WorkflowState,
    },
    Failure {
        node_id: NodeId,
        execution_id: String,
        timestamp: DateTime<Utc>,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Skipped {
        node_id: NodeId,
        execution_id: String,
        timestamp: DateTime<Utc>,
        reason: String,
    },
}

impl NodeResult {
    #[must_use]
    pub fn success(node_id: impl Into<String>, execution_id: impl Into<String>, output_state: WorkflowState) -> Self {
        NodeResult::Success {
            node_id: node_id.into(),
            execution_id: execution_id.into(),
            timestamp: Utc::now(),
            output_state,
        }
    }

    #[must_use]
    pub fn failure(node_id: impl Into<String>, execution_id: impl Into<String>, reason: impl Into<String>, error: Option<String>) -> Self {
        NodeResult::Failure {
            node_id: node_id.into(),
            execution_id: execution_id.into(),
            timestamp: Utc::now(),
            reason: reason.into(),
            error,
        }
    }

    #[must_use]
    pub fn skipped(node_id: impl Into<String>, execution_id: impl Into<String>, reason: impl Into<String>) -> Self {
        NodeResult::Skipped {
            node_id: node_id.into(),
            execution_id: execution_id.into(),
            timestamp: Utc::now(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            NodeResult::Success { node_id, .. }
            | NodeResult::Failure { node_id, .. }
            | NodeResult::Skipped { node_id, .. } => node_id,
        }
    }
}
