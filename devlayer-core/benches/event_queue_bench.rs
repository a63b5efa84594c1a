#[macro_use]
extern crate criterion;

use criterion::Criterion;

use devlayer_core::events::{ConnectivityChange, Event, EventQueue, QueueEntry};
use devlayer_core::registry::{EventHandler, EventHandlerRegistry, ForEachAction};

fn bench_event_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue_throughput");

    for capacity in [16, 256, 4096] {
        group.throughput(criterion::Throughput::Elements(1));
        group.bench_function(format!("capacity_{}", capacity), |b| {
            let queue = EventQueue::with_capacity(capacity).unwrap();
            let event = Event::WifiConnectivityChange {
                result: ConnectivityChange::Established,
            };
            b.iter(|| {
                queue.enqueue(QueueEntry::Event(event)).unwrap();
                queue.dequeue().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_application_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("application_fan_out");

    for handlers in [1, 8, 32] {
        group.throughput(criterion::Throughput::Elements(handlers as u64));
        group.bench_function(format!("handlers_{}", handlers), |b| {
            let registry = EventHandlerRegistry::with_capacity(handlers).unwrap();
            for _ in 0..handlers {
                registry
                    .add_event_handler(EventHandler::new(|event| {
                        criterion::black_box(event);
                        Ok(())
                    }))
                    .unwrap();
            }
            let event = Event::TimeSyncChange {
                is_time_synchronized: true,
            };
            b.iter(|| {
                registry.for_each(|entry| {
                    let _ = entry.handler().call(&event);
                    ForEachAction::Continue
                });
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_event_queue_push_pop, bench_application_fan_out);
criterion_main!(benches);
