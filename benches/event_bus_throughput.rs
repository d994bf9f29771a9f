use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use graphflow::events::{EventBus, MemorySink, StateEvent};
use graphflow::state::WorkflowState;
use tokio::runtime::Runtime;

const BATCH_SIZES: &[usize] = &[64, 256, 1024];

async fn publish_batch(bus: &EventBus, batch: usize) {
    bus.listen_for_events();
    let emitter = bus.get_emitter();
    let state = WorkflowState::new("w1", "t1");
    for i in 0..batch {
        emitter
            .emit(StateEvent::node_entered("exec-1", format!("node-{i}"), state.clone(), None))
            .expect("emit");
    }
    bus.stop_listener().await;
}

fn event_bus_throughput(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("event_bus_publish");

    for &batch in BATCH_SIZES {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.to_async(&runtime).iter(|| async {
                let bus = EventBus::with_sink(MemorySink::new());
                publish_batch(&bus, batch).await;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, event_bus_throughput);
criterion_main!(benches);
