//! Introspection over a full executor run: `RunTrace` folds the buffered
//! event stream into node timings, the error set, and the execution path.

mod common;

use std::sync::Arc;

use chrono::Utc;
use common::{AlwaysFail, Passthrough};
use graphflow::graphs::GraphBuilder;
use graphflow::scheduler::executor::{ExecutionRequest, Executor};
use graphflow::state::WorkflowState;
use graphflow::store::InMemoryStateStore;
use graphflow::trace::RunTrace;

async fn run_and_trace(graph: graphflow::graphs::GraphDefinition, execution_id: &str) -> RunTrace {
    let executor = Executor::new(Arc::new(InMemoryStateStore::new()));
    let mut stream = executor
        .run(ExecutionRequest::new("w1", "t1", Arc::new(graph), WorkflowState::new("w1", "t1")))
        .unwrap();

    let mut trace = RunTrace::new(execution_id, "w1", Utc::now());
    loop {
        match stream.recv().await {
            Ok(event) => {
                let terminal = event.is_terminal();
                trace.push(event);
                if terminal {
                    break;
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
    trace
}

#[tokio::test]
async fn healthy_linear_run_has_no_errors_and_full_path() {
    let graph = GraphBuilder::new("g1", "linear")
        .add_node(Passthrough::new("a"))
        .add_node(Passthrough::new("b"))
        .add_node(Passthrough::new("c"))
        .add_edge("a", "b")
        .add_edge("b", "c")
        .with_entry("a")
        .build();

    let trace = run_and_trace(graph, "exec-1").await;

    assert!(trace.is_completed());
    assert!(!trace.has_errors());
    assert!(trace.is_healthy());
    assert_eq!(trace.execution_path(), vec!["a", "b", "c"]);

    let executions = trace.node_executions();
    assert_eq!(executions.len(), 3);
    for execution in &executions {
        assert!(execution.duration() >= chrono::Duration::zero());
    }

    let stats = trace.statistics();
    assert_eq!(stats.total_events, 7); // 3 entered + 3 exited + 1 completed
    assert_eq!(*stats.executions_per_node.get("a").unwrap(), 1);
}

#[tokio::test]
async fn failing_run_surfaces_a_compact_error_record() {
    let graph = GraphBuilder::new("g1", "fails")
        .add_node(Passthrough::new("a"))
        .add_node(AlwaysFail::new("b", "boom"))
        .add_edge("a", "b")
        .with_entry("a")
        .build();

    let trace = run_and_trace(graph, "exec-2").await;

    assert!(!trace.is_completed());
    assert!(trace.has_errors());
    assert!(!trace.is_healthy());

    let errors = trace.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].node_id, "b");
    assert!(errors[0].error.contains("boom"));
}

#[tokio::test]
async fn filters_narrow_to_a_single_node_or_event_type() {
    let graph = GraphBuilder::new("g1", "linear")
        .add_node(Passthrough::new("a"))
        .add_node(Passthrough::new("b"))
        .add_edge("a", "b")
        .with_entry("a")
        .build();

    let trace = run_and_trace(graph, "exec-3").await;

    let for_a = trace.by_node("a");
    assert_eq!(for_a.len(), 2); // entered + exited

    let entered_only = trace.by_event_type(|e| matches!(e, graphflow::events::StateEvent::NodeEntered { .. }));
    assert_eq!(entered_only.len(), 2);
}
