//! Introspection over a finished (or in-flight) execution's event stream
//! (spec §4.5): `RunTrace` plus an analyser layer of pure statistics.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::events::StateEvent;
use crate::types::{ExecutionId, NodeId, WorkflowId};

/// Ordered event log for a single execution, plus free-form metadata a
/// caller may want to attach (e.g. request headers, user id).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTrace {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub events: Vec<StateEvent>,
    pub metadata: FxHashMap<String, serde_json::Value>,
}

/// One paired `NodeEntered`/`NodeExited` observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    pub node_id: NodeId,
    pub entered_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
}

impl NodeExecution {
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.exited_at - self.entered_at
    }
}

/// A compact view of a `NodeError` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub node_id: NodeId,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl RunTrace {
    #[must_use]
    pub fn new(execution_id: impl Into<String>, workflow_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            execution_id: execution_id.into(),
            workflow_id: workflow_id.into(),
            started_at,
            completed_at: None,
            events: Vec::new(),
            metadata: FxHashMap::default(),
        }
    }

    pub fn push(&mut self, event: StateEvent) {
        if event.is_terminal() {
            self.completed_at = Some(event.timestamp());
        }
        self.events.push(event);
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Wall-clock span of the run: `completed_at - started_at` if the run
    /// has finished, else `now - started_at`.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        end - self.started_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.events.iter().any(|e| matches!(e, StateEvent::WorkflowCompleted { .. }))
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.events.iter().any(|e| matches!(e, StateEvent::NodeError { .. } | StateEvent::WorkflowFailed { .. }))
    }

    /// True when the run finished successfully and no `NodeError` was
    /// ever observed (spec §7's "user-visible failure" clause).
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.is_completed() && !self.has_errors()
    }

    /// Pairs each `NodeEntered` with the next `NodeExited` for the same
    /// node id that follows it in the stream; entries with no matching
    /// exit (e.g. cut short by cancellation) are discarded.
    #[must_use]
    pub fn node_executions(&self) -> Vec<NodeExecution> {
        let mut open: FxHashMap<&str, DateTime<Utc>> = FxHashMap::default();
        let mut executions = Vec::new();
        for event in &self.events {
            match event {
                StateEvent::NodeEntered { node_id, timestamp, .. } => {
                    open.insert(node_id.as_str(), *timestamp);
                }
                StateEvent::NodeExited { node_id, timestamp, .. } => {
                    if let Some(entered_at) = open.remove(node_id.as_str()) {
                        executions.push(NodeExecution {
                            node_id: node_id.clone(),
                            entered_at,
                            exited_at: *timestamp,
                        });
                    }
                }
                _ => {}
            }
        }
        executions
    }

    #[must_use]
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StateEvent::NodeError { node_id, error, timestamp, .. } => Some(ErrorRecord {
                    node_id: node_id.clone(),
                    error: error.clone(),
                    timestamp: *timestamp,
                }),
                _ => None,
            })
            .collect()
    }

    /// The ordered sequence of node ids entered, i.e. the path actually
    /// taken through the graph.
    #[must_use]
    pub fn execution_path(&self) -> Vec<NodeId> {
        self.events
            .iter()
            .filter_map(|event| match event {
                StateEvent::NodeEntered { node_id, .. } => Some(node_id.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn by_node(&self, node_id: &str) -> Vec<&StateEvent> {
        self.events.iter().filter(|e| e.node_id() == Some(node_id)).collect()
    }

    #[must_use]
    pub fn by_event_type(&self, predicate: impl Fn(&StateEvent) -> bool) -> Vec<&StateEvent> {
        self.events.iter().filter(|e| predicate(e)).collect()
    }

    #[must_use]
    pub fn in_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&StateEvent> {
        self.events
            .iter()
            .filter(|e| {
                let t = e.timestamp();
                t >= start && t <= end
            })
            .collect()
    }

    #[must_use]
    pub fn statistics(&self) -> RunStatistics {
        RunStatistics::from_trace(self)
    }
}

/// Derived analytics over a [`RunTrace`]: counts and per-node timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total_events: usize,
    pub executions_per_node: FxHashMap<NodeId, usize>,
    pub average_node_duration_ms: Option<f64>,
    pub longest_node: Option<(NodeId, i64)>,
    pub shortest_node: Option<(NodeId, i64)>,
    pub error_count: usize,
}

impl RunStatistics {
    #[must_use]
    pub fn from_trace(trace: &RunTrace) -> Self {
        let executions = trace.node_executions();
        let mut executions_per_node: FxHashMap<NodeId, usize> = FxHashMap::default();
        for execution in &executions {
            *executions_per_node.entry(execution.node_id.clone()).or_insert(0) += 1;
        }

        let durations: Vec<(NodeId, i64)> = executions
            .iter()
            .map(|e| (e.node_id.clone(), e.duration().num_milliseconds()))
            .collect();

        let average_node_duration_ms = if durations.is_empty() {
            None
        } else {
            let total: i64 = durations.iter().map(|(_, ms)| ms).sum();
            Some(total as f64 / durations.len() as f64)
        };

        let longest_node = durations.iter().max_by_key(|(_, ms)| *ms).cloned();
        let shortest_node = durations.iter().min_by_key(|(_, ms)| *ms).cloned();

        Self {
            total_events: trace.events.len(),
            executions_per_node,
            average_node_duration_ms,
            longest_node,
            shortest_node,
            error_count: trace.errors().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    fn state() -> WorkflowState {
        WorkflowState::new("w1", "t1")
    }

    #[test]
    fn linear_happy_path_is_healthy_and_has_full_execution_path() {
        let mut trace = RunTrace::new("exec-1", "w1", Utc::now());
        for node in ["a", "b", "c"] {
            trace.push(StateEvent::node_entered("exec-1", node, state(), None));
            trace.push(StateEvent::node_exited("exec-1", node, state(), None));
        }
        trace.push(StateEvent::workflow_completed("exec-1", state(), None));

        assert!(trace.is_completed());
        assert!(trace.is_healthy());
        assert_eq!(trace.execution_path(), vec!["a", "b", "c"]);
        assert_eq!(trace.node_executions().len(), 3);
    }

    #[test]
    fn node_error_marks_unhealthy_even_if_run_completes() {
        let mut trace = RunTrace::new("exec-1", "w1", Utc::now());
        trace.push(StateEvent::node_entered("exec-1", "a", state(), None));
        trace.push(StateEvent::node_error("exec-1", "a", state(), None, "boom", None));
        trace.push(StateEvent::node_entered("exec-1", "b", state(), None));
        trace.push(StateEvent::node_exited("exec-1", "b", state(), None));
        trace.push(StateEvent::workflow_completed("exec-1", state(), None));

        assert!(trace.is_completed());
        assert!(trace.has_errors());
        assert!(!trace.is_healthy());
        assert_eq!(trace.errors().len(), 1);
    }

    #[test]
    fn orphaned_entered_without_exit_is_excluded_from_executions() {
        let mut trace = RunTrace::new("exec-1", "w1", Utc::now());
        trace.push(StateEvent::node_entered("exec-1", "a", state(), None));
        trace.push(StateEvent::workflow_failed("exec-1", state(), None, "cancelled"));
        assert!(trace.node_executions().is_empty());
        assert!(!trace.is_completed());
    }

    #[test]
    fn statistics_compute_counts_and_averages() {
        let mut trace = RunTrace::new("exec-1", "w1", Utc::now());
        trace.push(StateEvent::node_entered("exec-1", "a", state(), None));
        trace.push(StateEvent::node_exited("exec-1", "a", state(), None));
        trace.push(StateEvent::workflow_completed("exec-1", state(), None));
        let stats = trace.statistics();
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.executions_per_node.get("a"), Some(&1));
        assert_eq!(stats.error_count, 0);
    }
}
