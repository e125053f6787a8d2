//! Read-modify-write with version tokens

use crate::common::*;
use std::sync::{Arc, Barrier};
use std::thread;

/// Exactly one of N writers holding the same token wins.
#[test]
fn one_winner_per_token() {
    let container = shared_container();
    let token = container.create_item(counter("A", "p", 0)).unwrap().etag().clone();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads as i64)
        .map(|i| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            let token = token.clone();
            thread::spawn(move || {
                barrier.wait();
                container.upsert_item(counter("A", "p", i), &ItemOptions::if_match(token))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(e) = result {
            assert!(e.is_precondition_failed(), "unexpected error: {:?}", e);
        }
    }
    assert_eq!(&container.read_item("A", &pk("p")).unwrap(), winners[0]);
}

/// Retry loops over tokens never lose an increment.
#[test]
fn retry_loop_counts_exactly() {
    let container = shared_container();
    container.create_item(counter("A", "p", 0)).unwrap();

    let threads = 6;
    let per_thread = 50;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_thread {
                    loop {
                        let current = container.read_item("A", &pk("p")).unwrap();
                        let value = current.get("counter").and_then(|v| v.as_i64()).unwrap();
                        let result = container.upsert_item(
                            counter("A", "p", value + 1),
                            &ItemOptions::if_match(current.etag().clone()),
                        );
                        match result {
                            Ok(_) => break,
                            Err(e) => assert!(e.is_precondition_failed()),
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = container.read_item("A", &pk("p")).unwrap();
    assert_eq!(stored.get("counter"), Some(&json!((threads * per_thread) as i64)));
}
