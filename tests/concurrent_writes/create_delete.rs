//! Create / delete races on the same and on different slots

use crate::common::*;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

/// Exactly one concurrent create of the same slot succeeds.
#[test]
fn one_create_wins() {
    let container = shared_container();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                container.create_item(doc("A", "p"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(QuireError::is_conflict));
    assert_eq!(container.item_count(), 1);
}

/// Writers in different partitions do not interfere.
#[test]
fn independent_partitions() {
    let container = shared_container();
    let threads = 8;
    let per_thread = 100;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let partition = format!("p{}", t);
                for i in 0..per_thread {
                    container.create_item(doc(&format!("d{}", i), &partition)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(container.item_count(), threads * per_thread);
    assert_eq!(container.partition_count(), threads);
}

/// Create/delete cycles racing on one slot leave a consistent slot and
/// never repeat a token.
#[test]
fn create_delete_cycles() {
    let container = shared_container();
    let threads = 4;
    let cycles = 200;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut tokens = Vec::new();
                for _ in 0..cycles {
                    match container.create_item(doc("A", "p")) {
                        Ok(created) => tokens.push(created.etag().clone()),
                        Err(e) => assert!(e.is_conflict()),
                    }
                    match container.delete_item("A", &pk("p"), &ItemOptions::new()) {
                        Ok(()) => {}
                        Err(e) => assert!(e.is_not_found()),
                    }
                }
                tokens
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for token in handle.join().unwrap() {
            assert!(all.insert(token), "token issued twice");
        }
    }
    assert!(!all.is_empty());
    assert_eq!(container.item_count(), 0);

    let created = container.create_item(doc("A", "p")).unwrap();
    assert!(!all.contains(created.etag()));
    assert_eq!(container.read_item("A", &pk("p")).unwrap(), created);
}
