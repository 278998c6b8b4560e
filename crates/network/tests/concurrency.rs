//! Concurrent mutations on one line never duplicate or skip order keys.

mod common;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::*;
use tissea_network::prelude::*;

fn patient_policy() -> TransactionPolicy {
    TransactionPolicy {
        lock_timeout: Duration::from_secs(5),
        max_retries: 5,
        retry_backoff: Duration::from_millis(5),
    }
}

fn concurrent_attaches<S: NetworkStore + 'static>(service: Arc<NetworkService<S>>, workers: usize) {
    let line = create_line(&service, "A");
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service
                    .attach_stop(line, &NewStop::new(format!("Stop {i}"), 43.6, 1.4 + i as f64 / 1000.0))
                    .map(|attached| attached.order)
            })
        })
        .collect();

    let orders: HashSet<u32> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked").expect("attach failed"))
        .collect();

    let expected: HashSet<u32> = (1..=workers as u32).collect();
    assert_eq!(orders, expected);
    assert_gap_free(&service.line_stops(line).unwrap());
}

#[test]
fn test_two_concurrent_attaches_memory() {
    let service = NetworkService::with_policy(MemoryStore::new(), patient_policy());
    concurrent_attaches(Arc::new(service), 2);
}

#[test]
fn test_two_concurrent_attaches_sqlite() {
    let (_dir, service) = sqlite_service_with_policy(patient_policy());
    concurrent_attaches(Arc::new(service), 2);
}

#[test]
fn test_many_concurrent_attaches_sqlite() {
    let (_dir, service) = sqlite_service_with_policy(patient_policy());
    concurrent_attaches(Arc::new(service), 8);
}

fn mixed_attach_and_detach<S: NetworkStore + 'static>(service: Arc<NetworkService<S>>) {
    let line = create_line(&service, "A");
    let seed: Vec<(String, f64, f64)> = (0..8)
        .map(|i| (format!("Seed {i}"), 43.60 + i as f64 / 100.0, 1.40))
        .collect();
    for (name, lat, lon) in &seed {
        service.attach_stop(line, &NewStop::new(name.as_str(), *lat, *lon)).unwrap();
    }
    let doomed: Vec<StopId> = service
        .line_stops(line)
        .unwrap()
        .iter()
        .step_by(2)
        .map(|s| s.stop.id)
        .collect();

    let barrier = Arc::new(Barrier::new(doomed.len() + 3));
    let mut handles = Vec::new();
    for stop_id in doomed {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            service.detach_stop(line, stop_id)
        }));
    }
    for i in 0..3 {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            service
                .attach_stop(line, &NewStop::new(format!("New {i}"), 43.7, 1.5 + i as f64 / 1000.0))
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked").expect("mutation failed");
    }

    let stops = service.line_stops(line).unwrap();
    assert_eq!(stops.len(), 7);
    assert_gap_free(&stops);
    assert!(service.orders().transactions().line_locks().is_empty());
}

#[test]
fn test_mixed_attach_and_detach_stay_gap_free() {
    let service = NetworkService::with_policy(MemoryStore::new(), patient_policy());
    mixed_attach_and_detach(Arc::new(service));
}

#[test]
fn test_mixed_attach_and_detach_stay_gap_free_sqlite() {
    let (_dir, service) = sqlite_service_with_policy(patient_policy());
    mixed_attach_and_detach(Arc::new(service));
}
