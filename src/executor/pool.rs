//! Thin dispatcher that owns a set of workers and routes submissions.

use crate::config::PoolConfig;
use crate::error::Result;
use crate::executor::handle::TaskHandle;
use crate::executor::task::{Priority, Task};
use crate::executor::worker::Worker;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A set of [`Worker`]s plus a routing decision.
///
/// Dispatch is simple bookkeeping: prefer an idle worker, grow up to the
/// configured ceiling when all are busy, otherwise pick the shortest queue.
/// No work-stealing between workers.
pub struct Pool {
    workers: RwLock<Vec<Arc<Worker>>>,
    config: PoolConfig,
    next_id: AtomicUsize,
    shutdown: AtomicBool,
}

impl Pool {
    /// Build a pool and spawn its initial workers.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let initial = config.resolved_initial();
        let mut workers = Vec::with_capacity(initial);
        for id in 0..initial {
            workers.push(Arc::new(Worker::spawn(id, &config)?));
        }

        Ok(Self {
            workers: RwLock::new(workers),
            config,
            next_id: AtomicUsize::new(initial),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Submit a callable with an explicit priority.
    pub fn submit<F, T>(&self, f: F, priority: Priority) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = Task::new(f, priority);
        self.route(task);
        handle
    }

    /// Submit a callable at normal priority.
    pub fn execute<F, T>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(f, Priority::Normal)
    }

    fn route(&self, task: Task) {
        if self.shutdown.load(Ordering::Acquire) {
            task.cancel();
            return;
        }

        {
            let workers = self.workers.read();
            if let Some(worker) = workers.iter().find(|w| !w.is_busy()) {
                worker.enqueue(task);
                return;
            }
        }

        // All busy; grow if the ceiling allows it. The flag is re-checked
        // under the write lock: a payload that re-submits while shutdown
        // races could otherwise act on a stale read and spawn a worker the
        // shutdown pass never sees.
        let mut workers = self.workers.write();
        if self.shutdown.load(Ordering::Acquire) {
            task.cancel();
            return;
        }
        if workers.len() < self.config.resolved_max() {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if let Ok(worker) = Worker::spawn(id, &self.config) {
                let worker = Arc::new(worker);
                worker.enqueue(task);
                workers.push(worker);
                return;
            }
        }

        match workers.iter().min_by_key(|w| w.pending_count()) {
            Some(worker) => worker.enqueue(task),
            // Unreachable with a validated config (initial >= 1), but a
            // resolved handle beats a stuck one.
            None => task.cancel(),
        }
    }

    /// Number of workers currently owned by the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.read().len()
    }

    /// Tasks queued across all workers (excludes in-flight payloads).
    pub fn pending_tasks(&self) -> usize {
        self.workers.read().iter().map(|w| w.pending_count()).sum()
    }

    /// One diagnostic line per worker. For introspection and tests only.
    pub fn dump_workers(&self) -> String {
        self.workers
            .read()
            .iter()
            .map(|w| w.snapshot().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Stop accepting work and shut every worker down.
    ///
    /// Blocks until all worker threads have been joined; queued tasks
    /// resolve to `Err(TaskError::Cancelled)`. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        // Snapshot the worker list and release the guard before joining.
        // Joining under the read guard deadlocks against a worker payload
        // that re-submits and needs the write lock to route.
        let workers: Vec<Arc<Worker>> = self.workers.read().clone();
        for worker in &workers {
            worker.shutdown();
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("workers", &self.worker_count())
            .field("pending", &self.pending_tasks())
            .finish()
    }
}
