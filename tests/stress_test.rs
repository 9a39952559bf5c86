//! Stress tests for the worker and pool.

use trilane::prelude::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
#[ignore] // Run with --ignored flag
fn stress_many_small_tasks_one_worker() {
    let worker = Worker::new(0).unwrap();
    let handles: Vec<_> = (0u64..10_000)
        .map(|i| worker.submit(move || i * 2, Priority::Normal))
        .collect();

    let mut sum = 0u64;
    for handle in handles {
        sum += handle.get().unwrap();
    }
    assert_eq!(sum, 2 * (0..10_000u64).sum::<u64>());
    worker.shutdown();
}

#[test]
#[ignore]
fn stress_concurrent_submitters() {
    let pool = Arc::new(Pool::new(PoolConfig::builder().initial_workers(4).build().unwrap()).unwrap());
    let executed = Arc::new(AtomicU64::new(0));

    let submitters: Vec<_> = (0..8)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let executed = Arc::clone(&executed);
            thread::spawn(move || {
                let priority = match t % 3 {
                    0 => Priority::High,
                    1 => Priority::Normal,
                    _ => Priority::Low,
                };
                let handles: Vec<_> = (0..500)
                    .map(|_| {
                        let executed = Arc::clone(&executed);
                        pool.submit(
                            move || {
                                executed.fetch_add(1, Ordering::Relaxed);
                            },
                            priority,
                        )
                    })
                    .collect();
                for handle in handles {
                    handle.get().unwrap();
                }
            })
        })
        .collect();

    for submitter in submitters {
        submitter.join().unwrap();
    }
    assert_eq!(executed.load(Ordering::Relaxed), 8 * 500);
    pool.shutdown();
}

#[test]
#[ignore]
fn stress_repeated_shutdown_cycles() {
    for cycle in 0..50 {
        let worker = Worker::new(cycle).unwrap();
        let handle = worker.submit(move || cycle, Priority::High);
        assert_eq!(handle.get(), Ok(cycle));
        worker.shutdown();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }
}

#[test]
#[ignore]
fn stress_panicking_tasks_interleaved() {
    let worker = Worker::new(0).unwrap();
    let mut handles = Vec::new();
    for i in 0..1_000u32 {
        if i % 7 == 0 {
            handles.push((i, worker.submit(move || -> u32 { panic!("{}", i) }, Priority::Normal)));
        } else {
            handles.push((i, worker.submit(move || i, Priority::Normal)));
        }
    }
    for (i, handle) in handles {
        if i % 7 == 0 {
            assert!(matches!(handle.get(), Err(TaskError::Panicked(_))));
        } else {
            assert_eq!(handle.get(), Ok(i));
        }
    }
    worker.shutdown();
}
