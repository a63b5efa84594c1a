use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use devlayer_core::error::DeviceLayerError;
use devlayer_core::events::{Event, EventType};
use devlayer_core::registry::EventHandler;
use devlayer_engine::{HostPlatform, PlatformManager};

const PRODUCERS: u64 = 4;
const PER_PRODUCER: u64 = 100;

fn tag(producer: u64, seq: u64) -> u64 {
    (producer << 32) | seq
}

/// Retries while the queue is momentarily full.
fn submit(mut attempt: impl FnMut() -> Result<(), DeviceLayerError>) {
    loop {
        match attempt() {
            Ok(()) => return,
            Err(err) if err.is_resource_exhausted() => thread::yield_now(),
            Err(err) => panic!("submission failed: {err}"),
        }
    }
}

#[test]
fn producers_on_many_threads_feed_one_processing_context() {
    let manager = PlatformManager::builder(Arc::new(HostPlatform::new()))
        .queue_capacity(32)
        .idle_wait(Duration::from_millis(5))
        .build()
        .unwrap();
    manager.init_stack().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let handler_seen = seen.clone();
    manager
        .add_event_handler(EventHandler::new(move |event| {
            if let Event::Platform { data, .. } = event {
                handler_seen.lock().push(*data);
            }
            Ok(())
        }))
        .unwrap();

    let handle = manager.start_event_loop_task().unwrap();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let manager = manager.clone();
            let seen = seen.clone();
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    let data = tag(producer, seq);
                    if seq % 2 == 0 {
                        submit(|| {
                            let seen = seen.clone();
                            manager.schedule_work(move || seen.lock().push(data))
                        });
                    } else {
                        submit(|| {
                            manager.post_event(Event::Platform {
                                event_type: EventType::new(0x1000),
                                data,
                            })
                        });
                    }
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    handle.stop().unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len() as u64, PRODUCERS * PER_PRODUCER);

    let mut per_producer: HashMap<u64, Vec<u64>> = HashMap::new();
    for data in seen.iter() {
        per_producer.entry(data >> 32).or_default().push(data & 0xFFFF_FFFF);
    }
    for producer in 0..PRODUCERS {
        let order = &per_producer[&producer];
        assert_eq!(*order, (0..PER_PRODUCER).collect::<Vec<_>>(), "producer {producer}");
    }

    let stats = manager.stats();
    assert_eq!(stats.work_items_run + stats.events_dispatched, PRODUCERS * PER_PRODUCER);
}

#[test]
fn shutdown_drains_entries_queued_by_other_threads() {
    let manager = PlatformManager::builder(Arc::new(HostPlatform::new()))
        .idle_wait(Duration::from_millis(5))
        .build()
        .unwrap();
    manager.init_stack().unwrap();
    let handle = manager.start_event_loop_task().unwrap();

    let ran = Arc::new(Mutex::new(0u32));
    let producer = {
        let manager = manager.clone();
        let ran = ran.clone();
        thread::spawn(move || {
            for _ in 0..20 {
                let ran = ran.clone();
                submit(|| {
                    let ran = ran.clone();
                    manager.schedule_work(move || *ran.lock() += 1)
                });
            }
        })
    };
    producer.join().unwrap();

    manager.shutdown().unwrap();
    handle.stop().unwrap();

    assert_eq!(*ran.lock(), 20);
    assert!(matches!(
        manager.schedule_work(|| {}),
        Err(DeviceLayerError::InvalidState { .. })
    ));
}
