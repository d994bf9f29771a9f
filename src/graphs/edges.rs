//! Edge types and routing predicates for conditional graph flow.

use std::sync::{Arc, OnceLock};

use crate::state::WorkflowState;
use crate::types::NodeId;

/// Predicate function for conditional edge enabling.
///
/// Takes a reference to the state produced by the edge's source node and
/// returns whether the edge is currently enabled. Predicates must be cheap
/// and side-effect-free: the executor may call them repeatedly and never
/// memoises results (§9).
pub type EdgePredicate = Arc<dyn Fn(&WorkflowState) -> bool + Send + Sync + 'static>;

fn always_false_predicate() -> &'static EdgePredicate {
    static SENTINEL: OnceLock<EdgePredicate> = OnceLock::new();
    SENTINEL.get_or_init(|| Arc::new(|_state: &WorkflowState| false))
}

/// Returns the shared sentinel predicate that is always false.
///
/// Graph validation recognises edges carrying this exact predicate by
/// pointer identity (see [`Edge::is_structurally_false`]) and elides them
/// from cycle detection, per spec §4.1 rule 6: a back-edge whose predicate
/// is *structurally* the constant-false predicate can never fire, so the
/// graph is acyclic from the scheduler's point of view even though the
/// literal edge set contains a cycle.
#[must_use]
pub fn always_false() -> EdgePredicate {
    Arc::clone(always_false_predicate())
}

/// A directed edge between two nodes, optionally gated by a predicate.
///
/// An edge with no predicate (`predicate: None`) is always enabled — this
/// is the "no predicate" sentinel called out in the design notes, modeled
/// as an `Option` rather than a stored always-true closure.
#[derive(Clone)]
pub struct Edge {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub label: Option<String>,
    pub predicate: Option<EdgePredicate>,
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Edge")
            .field("source_id", &self.source_id)
            .field("target_id", &self.target_id)
            .field("label", &self.label)
            .field("conditional", &self.predicate.is_some())
            .finish()
    }
}

impl Edge {
    /// An edge with no predicate: always enabled.
    #[must_use]
    pub fn unconditional(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: None,
            predicate: None,
        }
    }

    /// An edge gated by `predicate`.
    #[must_use]
    pub fn conditional(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        predicate: EdgePredicate,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: None,
            predicate: Some(predicate),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Evaluates this edge's predicate against `state`. An absent predicate
    /// is always-true.
    #[must_use]
    pub fn is_enabled(&self, state: &WorkflowState) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(state),
            None => true,
        }
    }

    /// True if this edge's predicate is the shared "structurally constant
    /// false" sentinel (see [`always_false`]).
    #[must_use]
    pub fn is_structurally_false(&self) -> bool {
        match &self.predicate {
            Some(predicate) => Arc::ptr_eq(predicate, always_false_predicate()),
            None => false,
        }
    }
}
