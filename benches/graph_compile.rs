//! Benchmarks for graph compilation and validation.
//!
//! These benchmarks measure the performance of:
//! - Graph building (`GraphBuilder`)
//! - Structural validation (reachability, cycle detection)

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use graphflow::graphs::GraphBuilder;
use graphflow::node::Node;
use graphflow::scheduler::cancellation::CancellationSignal;
use graphflow::state::{NodeResult, WorkflowState};

const CHAIN_LENGTHS: &[usize] = &[16, 128, 1024];

struct BenchNode(String);

#[async_trait]
impl Node for BenchNode {
    fn id(&self) -> &str {
        &self.0
    }
    fn name(&self) -> &str {
        &self.0
    }
    async fn execute(&self, state: &WorkflowState, _cancel: &CancellationSignal) -> NodeResult {
        NodeResult::success(self.0.clone(), "bench", state.clone())
    }
    fn input_keys(&self) -> &[String] {
        &[]
    }
    fn output_keys(&self) -> &[String] {
        &[]
    }
}

fn build_linear_chain(n: usize) -> graphflow::graphs::GraphDefinition {
    let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
    let mut builder = GraphBuilder::new("bench", "chain");
    for id in &ids {
        builder = builder.add_node(BenchNode(id.clone()));
    }
    for pair in ids.windows(2) {
        builder = builder.add_edge(pair[0].clone(), pair[1].clone());
    }
    builder.with_entry(ids[0].clone()).build()
}

fn graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");
    for &n in CHAIN_LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| build_linear_chain(n));
        });
    }
    group.finish();
}

fn graph_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_validate");
    for &n in CHAIN_LENGTHS {
        let graph = build_linear_chain(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
            b.iter(|| {
                // validate() caches after the first call; rebuild a fresh
                // definition each iteration so every call does real work.
                let fresh = build_linear_chain(n);
                let _ = fresh.validate();
                std::hint::black_box(graph.node_count());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, graph_build, graph_validate);
criterion_main!(benches);
