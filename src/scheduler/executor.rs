//! The parallel executor (spec §4.2): a continuous-frontier scheduler
//! that traverses a [`GraphDefinition`] breadth-first, honours edge
//! predicates, enforces a concurrency ceiling, and streams
//! [`StateEvent`]s as they are produced.
//!
//! No direct teacher counterpart ships in this pack — the teacher's
//! scheduling reference (`runtimes::runner::AppRunner`, now removed) is a
//! barrier/superstep model the spec explicitly does not want. Written
//! fresh in the teacher's idiom: a concrete async driver (not
//! trait-based), `tracing::instrument`ed node tasks, `thiserror`+`miette`
//! errors, a `tokio::sync::Semaphore` concurrency gate, and the teacher's
//! `event_bus` hub/sink architecture carrying `StateEvent` instead of the
//! teacher's `Event`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_all;
use parking_lot::Mutex as SyncMutex;
use rustc_hash::FxHashSet;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use crate::errors::{NodeFailure, SchedulerError, ValidationError};
use crate::events::{EventEmitter, EventHub, EventStream, HubEmitter, StateEvent};
use crate::graphs::GraphDefinition;
use crate::node::Node;
use crate::scheduler::cancellation::CancellationSignal;
use crate::scheduler::circuit_breaker::CircuitBreakerRegistry;
use crate::scheduler::retry::RetryPolicy;
use crate::state::{NodeResult, WorkflowState};
use crate::store::StateStore;
use crate::types::{ExecutionId, NodeId, ThreadId, WorkflowId, WorkflowStatus};
use crate::utils::hashing::state_hash;

const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_NODE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LLM_NODE_TIMEOUT_SECS: u64 = 120;

/// Tag nodes advertise (via [`Node::tag`]) to request the longer LLM
/// timeout and a dedicated circuit-breaker bucket (spec §4.2).
pub const LLM_TAG: &str = "llm";

/// Tunables for one execution (spec §4.2).
#[derive(Clone)]
pub struct ExecutorOptions {
    pub max_concurrency: usize,
    pub node_timeout: Duration,
    pub llm_node_timeout: Duration,
    pub continue_on_error: bool,
    pub retry_policy: Option<RetryPolicy>,
    pub circuit_breakers: Option<Arc<CircuitBreakerRegistry>>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            node_timeout: Duration::from_secs(DEFAULT_NODE_TIMEOUT_SECS),
            llm_node_timeout: Duration::from_secs(DEFAULT_LLM_NODE_TIMEOUT_SECS),
            continue_on_error: false,
            retry_policy: None,
            circuit_breakers: None,
        }
    }
}

impl ExecutorOptions {
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_llm_node_timeout(mut self, timeout: Duration) -> Self {
        self.llm_node_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    #[must_use]
    pub fn with_circuit_breakers(mut self, registry: Arc<CircuitBreakerRegistry>) -> Self {
        self.circuit_breakers = Some(registry);
        self
    }
}

/// One execution's identifying scope, graph, and starting state.
pub struct ExecutionRequest {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub thread_id: ThreadId,
    pub graph: Arc<GraphDefinition>,
    pub initial_state: WorkflowState,
    pub options: ExecutorOptions,
}

impl ExecutionRequest {
    #[must_use]
    pub fn new(workflow_id: impl Into<String>, thread_id: impl Into<String>, graph: Arc<GraphDefinition>, initial_state: WorkflowState) -> Self {
        Self {
            execution_id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            thread_id: thread_id.into(),
            graph,
            initial_state,
            options: ExecutorOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }
}

/// Drives [`ExecutionRequest`]s to completion against a [`StateStore`].
///
/// One `Executor` can drive any number of concurrent, independent runs —
/// each `run` call spawns its own scheduling task and its own event hub;
/// nothing here is shared state across runs except the store.
pub struct Executor {
    store: Arc<dyn StateStore>,
}

impl Executor {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Validates `request.graph`, then spawns the scheduling loop and
    /// returns a live [`EventStream`] the caller can drain as events are
    /// produced. The contract is streaming, not buffering (§9): the
    /// caller observes `NodeEntered`/`NodeExited`/... as soon as the
    /// executor produces them, not all at once at the end.
    pub fn run(&self, request: ExecutionRequest) -> Result<EventStream, SchedulerError> {
        let violations = request.graph.validate();
        if !violations.is_empty() {
            return Err(SchedulerError::InvalidGraph(ValidationError::new(violations.to_vec())));
        }

        let hub = EventHub::new(1024);
        let stream = hub.subscribe();
        let store = Arc::clone(&self.store);
        tokio::spawn(run_graph(request, hub, store));
        Ok(stream)
    }

    /// Convenience wrapper (spec §4.2): drains the event stream
    /// internally and returns the final state carried on the terminal
    /// event.
    pub async fn run_to_completion(&self, request: ExecutionRequest) -> Result<WorkflowState, SchedulerError> {
        let mut stream = self.run(request)?;
        let mut last_state = None;
        loop {
            match stream.recv().await {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    last_state = Some(event.state().clone());
                    if terminal {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        last_state.ok_or_else(|| SchedulerError::Join("event stream closed before a terminal event".to_string()))
    }
}

/// Outcome of one node task, fed back into the main scheduling loop.
struct NodeTaskOutcome {
    node_id: NodeId,
    enqueue: Vec<NodeId>,
    failed: bool,
}

async fn run_graph(request: ExecutionRequest, hub: Arc<EventHub>, store: Arc<dyn StateStore>) {
    let ExecutionRequest {
        execution_id,
        graph,
        initial_state,
        options,
        ..
    } = request;

    let emitter = hub.emitter();
    let _ = store.save(initial_state.clone()).await;

    let cancel = CancellationSignal::new();
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let current_state = Arc::new(AsyncMutex::new(initial_state));
    let completed: Arc<SyncMutex<FxHashSet<NodeId>>> = Arc::new(SyncMutex::new(FxHashSet::default()));
    let last_error: Arc<SyncMutex<Option<String>>> = Arc::new(SyncMutex::new(None));

    let mut frontier: VecDeque<NodeId> = VecDeque::new();
    frontier.push_back(graph.entry_node_id.clone());

    let mut in_flight: Vec<tokio::task::JoinHandle<NodeTaskOutcome>> = Vec::new();

    loop {
        // Drain the frontier up to the concurrency cap, re-queuing the
        // tail once permits are exhausted (spec §4.2 step 2a). Once
        // cancellation has fired, stop launching new node tasks — only
        // what's already in flight is allowed to wind down.
        if !cancel.is_cancelled() {
            while let Some(node_id) = frontier.pop_front() {
                if completed.lock().contains(&node_id) {
                    continue;
                }
                let Some(node) = graph.node(&node_id) else {
                    continue;
                };
                if in_flight.len() >= options.max_concurrency {
                    frontier.push_front(node_id);
                    break;
                }
                let task = spawn_node_task(
                    Arc::clone(node),
                    Arc::clone(&graph),
                    execution_id.clone(),
                    emitter.clone(),
                    Arc::clone(&current_state),
                    Arc::clone(&completed),
                    Arc::clone(&last_error),
                    cancel.clone(),
                    Arc::clone(&semaphore),
                    options.clone(),
                    Arc::clone(&store),
                );
                in_flight.push(task);
            }
        }

        if in_flight.is_empty() {
            break;
        }

        let (result, _index, remaining) = select_all(in_flight).await;
        in_flight = remaining;

        match result {
            Ok(outcome) => {
                if !outcome.failed && !cancel.is_cancelled() {
                    frontier.extend(outcome.enqueue);
                }
            }
            Err(join_error) => {
                tracing::error!(target: "graphflow::scheduler", %join_error, "node task panicked");
                last_error.lock().get_or_insert(format!("a node task panicked: {join_error}"));
                if !options.continue_on_error {
                    cancel.cancel();
                }
            }
        }
    }

    finalize(&graph, &execution_id, &current_state, &completed, &last_error, &cancel, &emitter, &store).await;
}

#[allow(clippy::too_many_arguments)]
fn spawn_node_task(
    node: Arc<dyn Node>,
    graph: Arc<GraphDefinition>,
    execution_id: String,
    emitter: HubEmitter,
    current_state: Arc<AsyncMutex<WorkflowState>>,
    completed: Arc<SyncMutex<FxHashSet<NodeId>>>,
    last_error: Arc<SyncMutex<Option<String>>>,
    cancel: CancellationSignal,
    semaphore: Arc<Semaphore>,
    options: ExecutorOptions,
    store: Arc<dyn StateStore>,
) -> tokio::task::JoinHandle<NodeTaskOutcome> {
    tokio::spawn(async move {
        let _permit = semaphore
            .acquire_owned()
            .await
            .expect("semaphore is never closed while a run is in flight");
        run_node_task(node, graph, execution_id, emitter, current_state, completed, last_error, cancel, options, store).await
    })
}

#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(node_id = %node.id()))]
async fn run_node_task(
    node: Arc<dyn Node>,
    graph: Arc<GraphDefinition>,
    execution_id: String,
    emitter: HubEmitter,
    current_state: Arc<AsyncMutex<WorkflowState>>,
    completed: Arc<SyncMutex<FxHashSet<NodeId>>>,
    last_error: Arc<SyncMutex<Option<String>>>,
    cancel: CancellationSignal,
    options: ExecutorOptions,
    store: Arc<dyn StateStore>,
) -> NodeTaskOutcome {
    let node_id = node.id().to_string();

    if completed.lock().contains(&node_id) {
        return NodeTaskOutcome { node_id, enqueue: vec![], failed: false };
    }

    let snapshot = current_state.lock().await.clone();
    let previous_hash = state_hash(&snapshot);
    let entered_state = snapshot.with_current_node_id(node_id.clone());
    let _ = emitter.emit(StateEvent::node_entered(&execution_id, &node_id, entered_state.clone(), Some(previous_hash)));

    let timeout_duration = if node.tag() == Some(LLM_TAG) {
        options.llm_node_timeout
    } else {
        options.node_timeout
    };

    let attempt = invoke_with_retry(node.as_ref(), &entered_state, &cancel, timeout_duration, &options).await;

    match attempt {
        Ok(NodeResult::Success { output_state, .. }) => {
            let mut guard = current_state.lock().await;
            let next_step = guard.step + 1;
            let committed = output_state.with_step(next_step);
            *guard = committed.clone();
            drop(guard);

            let _ = store.save(committed.clone()).await;
            completed.lock().insert(node_id.clone());
            let hash = state_hash(&committed);
            let _ = emitter.emit(StateEvent::node_exited(&execution_id, &node_id, committed.clone(), Some(hash)));

            let completed_snapshot = completed.lock().clone();
            let enqueue = graph
                .outgoing(&node_id)
                .into_iter()
                .filter(|edge| !completed_snapshot.contains(&edge.target_id) && edge.is_enabled(&committed))
                .map(|edge| edge.target_id.clone())
                .collect();

            NodeTaskOutcome { node_id, enqueue, failed: false }
        }
        Ok(NodeResult::Skipped { reason, .. }) => {
            tracing::debug!(target: "graphflow::scheduler", %reason, "node skipped");
            let state = current_state.lock().await.clone();
            completed.lock().insert(node_id.clone());
            let hash = state_hash(&state);
            let _ = emitter.emit(StateEvent::node_exited(&execution_id, &node_id, state.clone(), Some(hash)));

            let completed_snapshot = completed.lock().clone();
            let enqueue = graph
                .outgoing(&node_id)
                .into_iter()
                .filter(|edge| !completed_snapshot.contains(&edge.target_id) && edge.is_enabled(&state))
                .map(|edge| edge.target_id.clone())
                .collect();

            NodeTaskOutcome { node_id, enqueue, failed: false }
        }
        Ok(NodeResult::Failure { .. }) => unreachable!("invoke_with_retry maps Failure into Err"),
        Err(failure) => {
            let state = current_state.lock().await.clone();
            last_error.lock().get_or_insert_with(|| failure.to_string());
            let _ = emitter.emit(StateEvent::node_error(&execution_id, &node_id, state, None, failure.to_string(), None));
            if !options.continue_on_error {
                cancel.cancel();
            }
            NodeTaskOutcome { node_id, enqueue: vec![], failed: true }
        }
    }
}

/// Invokes `node.execute` exactly once per attempt — the circuit breaker
/// only decides whether to call it at all, it never wraps a second call
/// around the one the retry loop already made (§9's explicit correction
/// of the source's double-invocation bug).
async fn invoke_with_retry(
    node: &dyn Node,
    state: &WorkflowState,
    cancel: &CancellationSignal,
    timeout_duration: Duration,
    options: &ExecutorOptions,
) -> Result<NodeResult, NodeFailure> {
    let node_id = node.id().to_string();
    let tag = node.tag().unwrap_or("default").to_string();
    let mut attempts_made: u32 = 0;

    loop {
        attempts_made += 1;

        if let Some(breaker) = &options.circuit_breakers {
            if !breaker.allow(&tag) {
                return Err(NodeFailure::Failed {
                    node_id,
                    reason: format!("circuit breaker open for tag '{tag}'"),
                });
            }
        }

        let attempt: Result<NodeResult, NodeFailure> = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(NodeFailure::Cancelled { node_id: node_id.clone() }),
            outcome = tokio::time::timeout(timeout_duration, node.execute(state, cancel)) => match outcome {
                Ok(NodeResult::Failure { reason, .. }) => Err(NodeFailure::from_node_reason(node_id.clone(), reason)),
                Ok(pass_through) => Ok(pass_through),
                Err(_elapsed) => Err(NodeFailure::Timeout {
                    node_id: node_id.clone(),
                    duration_ms: u64::try_from(timeout_duration.as_millis()).unwrap_or(u64::MAX),
                }),
            },
        };

        match &attempt {
            Ok(_) => {
                if let Some(breaker) = &options.circuit_breakers {
                    breaker.record_success(&tag);
                }
                return attempt;
            }
            Err(failure) => {
                if let Some(breaker) = &options.circuit_breakers {
                    breaker.record_failure(&tag);
                }
                let retry_delay = options
                    .retry_policy
                    .as_ref()
                    .filter(|policy| policy.should_retry(attempts_made, failure))
                    .map(|policy| policy.delay_for(attempts_made));
                match retry_delay {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => return attempt,
                }
            }
        }
    }
}

async fn finalize(
    graph: &GraphDefinition,
    execution_id: &str,
    current_state: &Arc<AsyncMutex<WorkflowState>>,
    completed: &Arc<SyncMutex<FxHashSet<NodeId>>>,
    last_error: &Arc<SyncMutex<Option<String>>>,
    cancel: &CancellationSignal,
    emitter: &HubEmitter,
    store: &Arc<dyn StateStore>,
) {
    let completed_snapshot = completed.lock().clone();
    let all_exits_completed = graph.exit_node_ids.iter().all(|id| completed_snapshot.contains(id));
    let state = current_state.lock().await.clone();

    let final_state = if all_exits_completed {
        state.with_status(WorkflowStatus::Completed)
    } else {
        let default_reason = if cancel.is_cancelled() {
            "run cancelled before every exit node completed"
        } else {
            "not all exit nodes were reached"
        };
        let reason = last_error.lock().clone().unwrap_or_else(|| default_reason.to_string());
        state.with_error(reason, Some(WorkflowStatus::Failed))
    };

    let _ = store.save(final_state.clone()).await;

    let event = if all_exits_completed {
        StateEvent::workflow_completed(execution_id, final_state, None)
    } else {
        let error = final_state.error.clone().unwrap_or_default();
        StateEvent::workflow_failed(execution_id, final_state, None, error)
    };
    let _ = emitter.emit(event);
}
