//! The state store abstraction and its in-memory implementation
//! (spec §4.3).
//!
//! `InMemoryStateStore` keeps one primary map keyed by `state.id` plus two
//! secondary indices (`workflow_id -> [state_id]`, `thread_id ->
//! [state_id]`) maintained in lockstep on every `save`/`delete`, mirroring
//! the teacher's `InMemoryCheckpointer` (`RwLock<FxHashMap<...>>` field,
//! async-trait contract returning a typed error).

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::StateStoreError;
use crate::state::WorkflowState;
use crate::types::{ThreadId, WorkflowId};

/// Persistence abstraction for `WorkflowState` snapshots.
///
/// All operations must be safe under concurrent invocation from an
/// unbounded number of callers (spec §4.3's concurrency contract).
/// Consistency is per-operation; no multi-operation transactions are
/// promised.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, state_id: &str) -> Result<Option<WorkflowState>, StateStoreError>;
    async fn list_by_workflow(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowState>, StateStoreError>;
    async fn list_by_thread(&self, thread_id: &ThreadId) -> Result<Vec<WorkflowState>, StateStoreError>;

    /// Idempotent by `state.id`: a re-save of the same id replaces the
    /// prior value in place without touching either secondary index
    /// (the id's membership in both indices is unchanged by a re-save).
    async fn save(&self, state: WorkflowState) -> Result<(), StateStoreError>;

    /// Removes `state_id` from the primary map and both secondary
    /// indices. A no-op (not an error) if the id is already absent.
    async fn delete(&self, state_id: &str) -> Result<(), StateStoreError>;

    async fn exists(&self, state_id: &str) -> Result<bool, StateStoreError>;
}

/// In-memory `StateStore`. `parking_lot::RwLock` rather than an async
/// lock: all critical sections are short, non-blocking map operations, so
/// holding a synchronous lock across an `await` point never happens.
#[derive(Default)]
pub struct InMemoryStateStore {
    primary: RwLock<FxHashMap<String, WorkflowState>>,
    by_workflow: RwLock<FxHashMap<WorkflowId, Vec<String>>>,
    by_thread: RwLock<FxHashMap<ThreadId, Vec<String>>>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index_insert(index: &RwLock<FxHashMap<String, Vec<String>>>, key: String, state_id: &str) {
        let mut guard = index.write();
        let entries = guard.entry(key).or_default();
        if !entries.iter().any(|id| id == state_id) {
            entries.push(state_id.to_string());
        }
    }

    fn index_remove(index: &RwLock<FxHashMap<String, Vec<String>>>, key: &str, state_id: &str) {
        let mut guard = index.write();
        if let Some(entries) = guard.get_mut(key) {
            entries.retain(|id| id != state_id);
            if entries.is_empty() {
                guard.remove(key);
            }
        }
    }

    fn collect(index: &RwLock<FxHashMap<String, Vec<String>>>, primary: &RwLock<FxHashMap<String, WorkflowState>>, key: &str) -> Vec<WorkflowState> {
        let ids = index.read().get(key).cloned().unwrap_or_default();
        let primary = primary.read();
        ids.iter().filter_map(|id| primary.get(id).cloned()).collect()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, state_id: &str) -> Result<Option<WorkflowState>, StateStoreError> {
        Ok(self.primary.read().get(state_id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn list_by_workflow(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowState>, StateStoreError> {
        Ok(Self::collect(&self.by_workflow, &self.primary, workflow_id))
    }

    #[tracing::instrument(skip(self))]
    async fn list_by_thread(&self, thread_id: &ThreadId) -> Result<Vec<WorkflowState>, StateStoreError> {
        Ok(Self::collect(&self.by_thread, &self.primary, thread_id))
    }

    #[tracing::instrument(skip(self, state), fields(state_id = %state.id))]
    async fn save(&self, state: WorkflowState) -> Result<(), StateStoreError> {
        let state_id = state.id.clone();
        let is_new = !self.primary.read().contains_key(&state_id);
        if is_new {
            Self::index_insert(&self.by_workflow, state.workflow_id.clone(), &state_id);
            Self::index_insert(&self.by_thread, state.thread_id.clone(), &state_id);
        }
        self.primary.write().insert(state_id, state);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, state_id: &str) -> Result<(), StateStoreError> {
        let removed = self.primary.write().remove(state_id);
        if let Some(state) = removed {
            Self::index_remove(&self.by_workflow, &state.workflow_id, state_id);
            Self::index_remove(&self.by_thread, &state.thread_id, state_id);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn exists(&self, state_id: &str) -> Result<bool, StateStoreError> {
        Ok(self.primary.read().contains_key(state_id))
    }
}
