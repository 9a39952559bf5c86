//! trilane - priority-lane thread pool
//!
//! A thread-pool execution engine built around single-threaded workers:
//! callers submit a callable tagged with a priority and get back a handle
//! that resolves to the eventual result. Each worker owns one OS thread and
//! three FIFO lanes (High, Normal, Low), sleeps on a predicate-guarded
//! condition variable when idle, and shuts down deterministically - queued
//! tasks that never ran resolve to a `Cancelled` error instead of leaving
//! readers blocked forever.
//!
//! # Quick Start
//!
//! ```no_run
//! use trilane::prelude::*;
//!
//! // One worker, driven directly.
//! let worker = Worker::new(0).unwrap();
//! let handle = worker.submit(|| 6 * 7, Priority::High);
//! assert_eq!(handle.get(), Ok(42));
//! worker.shutdown();
//!
//! // Or a pool that routes across workers.
//! let pool = Pool::new(PoolConfig::default()).unwrap();
//! let answer = pool.submit(|| "done", Priority::Normal);
//! assert_eq!(answer.get(), Ok("done"));
//! pool.shutdown();
//! ```
//!
//! # Guarantees
//!
//! - Strict priority precedence, FIFO within a lane; no aging, so a steady
//!   High stream can starve the other lanes (documented limitation).
//! - A popped task executes exactly once; a panicking payload is captured
//!   into its handle and never kills the worker thread.
//! - `shutdown()` returns only after the worker thread has been joined, and
//!   every still-queued task's handle resolves to `Err(TaskError::Cancelled)`.

// Lint configuration
#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod runtime;

pub(crate) mod scheduler;

// Re-export key types at crate root
pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::{Error, Result, TaskError};
pub use executor::{Pool, Priority, TaskHandle, TaskId, TaskState, Worker, WorkerState};
pub use runtime::{init, init_with_config, shutdown};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_smoke() {
        let worker = Worker::new(0).unwrap();
        let handle = worker.submit(|| 2 + 2, Priority::Normal);
        assert_eq!(handle.get(), Ok(4));
        worker.shutdown();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_pool_smoke() {
        let pool = Pool::new(
            PoolConfig::builder().initial_workers(2).build().unwrap(),
        )
        .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| pool.submit(move || i * 2, Priority::Normal))
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.get(), Ok(i * 2));
        }

        pool.shutdown();
    }
}
