//! # graphflow: a graph-driven workflow execution engine
//!
//! `graphflow` runs directed, mostly-acyclic computation graphs whose
//! vertices are arbitrary async compute units ("nodes") and whose edges
//! carry conditional control flow driven by an evolving, immutable
//! workflow state. It is built for orchestrating agentic LLM pipelines,
//! tool invocations, and general data-transformation stages under bounded
//! concurrency, with streaming observability of every state transition.
//!
//! ## Core Concepts
//!
//! - **State**: [`state::WorkflowState`] — an immutable snapshot; every
//!   mutator returns a new value rather than mutating in place.
//! - **Nodes**: async units of work implementing [`node::Node`].
//! - **Graph**: [`graphs::GraphDefinition`], assembled fluently with
//!   [`graphs::GraphBuilder`] and validated before it ever reaches the
//!   executor.
//! - **Executor**: [`scheduler::executor::Executor`] — a continuous
//!   frontier scheduler that traverses the graph, enforces a concurrency
//!   ceiling, and streams [`events::StateEvent`]s as they happen.
//! - **Store**: [`store::StateStore`] — persists snapshots, indexed by
//!   workflow and thread, for recovery and introspection.
//! - **Trace**: [`trace::RunTrace`] — folds a buffered event stream into
//!   per-node timings, error sets, and the execution path.
//!
//! ## Quick Start
//!
//! ### Building a graph and running it to completion
//!
//! ```
//! use async_trait::async_trait;
//! use graphflow::graphs::GraphBuilder;
//! use graphflow::message::Message;
//! use graphflow::node::Node;
//! use graphflow::scheduler::cancellation::CancellationSignal;
//! use graphflow::scheduler::executor::{ExecutionRequest, Executor};
//! use graphflow::state::{NodeResult, WorkflowState};
//! use graphflow::store::InMemoryStateStore;
//! use std::sync::Arc;
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Node for Greet {
//!     fn id(&self) -> &str {
//!         "greet"
//!     }
//!     fn name(&self) -> &str {
//!         "greet"
//!     }
//!     async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
//!         let next = state.with_message(Message::assistant("hello"));
//!         NodeResult::success("greet", "exec-1", next)
//!     }
//!     fn input_keys(&self) -> &[String] {
//!         &[]
//!     }
//!     fn output_keys(&self) -> &[String] {
//!         &[]
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let graph = Arc::new(
//!     GraphBuilder::new("g1", "greeting")
//!         .add_node(Greet)
//!         .build(),
//! );
//!
//! let store = Arc::new(InMemoryStateStore::new());
//! let executor = Executor::new(store);
//! let initial = WorkflowState::new("w1", "t1");
//! let request = ExecutionRequest::new("w1", "t1", graph, initial);
//!
//! let final_state = executor.run_to_completion(request).await.unwrap();
//! assert_eq!(final_state.messages.len(), 1);
//! # }
//! ```
//!
//! ### Conditional edges
//!
//! ```
//! use graphflow::graphs::Edge;
//! use serde_json::json;
//!
//! let route_to_b = Edge::conditional("a", "b", std::sync::Arc::new(|state: &graphflow::state::WorkflowState| {
//!     state.data.get("route").map(|v| v == &json!("b")).unwrap_or(false)
//! }));
//! assert_eq!(route_to_b.source_id, "a");
//! ```
//!
//! ## Module Guide
//!
//! - [`state`] — the immutable `WorkflowState` snapshot, `NodeResult`, hashing.
//! - [`message`] — `Message` and `ToolCall`.
//! - [`graphs`] — graph definition, builder, edges, validation.
//! - [`scheduler`] — the executor, cancellation, retry, circuit breaker.
//! - [`node`] — the node execution contract.
//! - [`store`] — state persistence with workflow/thread secondary indices.
//! - [`events`] — the event taxonomy, hub/sink streaming transport, patch diffing.
//! - [`trace`] — introspection over a buffered event stream.
//! - [`export`] — DOT and Mermaid textual graph export.
//! - [`llm`] — the LLM client contract consumed by collaborator nodes.
//! - [`config`] — process-level executor defaults.
//! - [`errors`] — the error taxonomy (`ValidationError`, `NodeFailure`, ...).
//! - [`telemetry`] — pretty/plain error formatting.

pub mod config;
pub mod errors;
pub mod events;
pub mod export;
pub mod graphs;
pub mod llm;
pub mod message;
pub mod node;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod trace;
pub mod types;
pub mod utils;
