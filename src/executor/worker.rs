//! The execution unit: one thread, one lane set, one shutdown handshake.

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::executor::handle::TaskHandle;
use crate::executor::task::{Priority, Task};
use crate::scheduler::lanes::{LaneSet, Popped};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Index of a worker within its pool.
pub type WorkerId = usize;

/// Lifecycle state of a worker's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Blocked waiting for work or a shutdown request.
    Idle = 0,
    /// Executing a popped task.
    Running = 1,
    /// Exit observed; cancelling leftover queued tasks.
    ShuttingDown = 2,
    /// Thread has exited.
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            2 => WorkerState::ShuttingDown,
            _ => WorkerState::Stopped,
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Idle => "idle",
            WorkerState::Running => "running",
            WorkerState::ShuttingDown => "shutting-down",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

// per-worker counters
struct WorkerStats {
    tasks_executed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_cancelled: AtomicU64,
}

impl WorkerStats {
    fn new() -> Self {
        Self {
            tasks_executed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_cancelled: AtomicU64::new(0),
        }
    }
}

struct Shared {
    lanes: LaneSet,
    busy: AtomicBool,
    state: AtomicU8,
    stats: WorkerStats,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// One owned thread pulling from three priority lanes.
///
/// The unit a [`Pool`] schedules work onto. All methods are thread-safe;
/// [`shutdown`](Worker::shutdown) blocks until the thread has exited and
/// been joined, and is idempotent.
///
/// [`Pool`]: crate::Pool
pub struct Worker {
    id: WorkerId,
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Spawn a worker with default thread settings.
    pub fn new(id: WorkerId) -> Result<Self> {
        Self::spawn(id, &PoolConfig::default())
    }

    /// Spawn a worker using the config's thread name prefix and stack size.
    pub fn spawn(id: WorkerId, config: &PoolConfig) -> Result<Self> {
        let shared = Arc::new(Shared {
            lanes: LaneSet::new(),
            busy: AtomicBool::new(false),
            state: AtomicU8::new(WorkerState::Idle as u8),
            stats: WorkerStats::new(),
        });

        let mut builder =
            thread::Builder::new().name(format!("{}-{}", config.thread_name_prefix, id));
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread_shared = Arc::clone(&shared);
        let thread = builder
            .spawn(move || Self::run(id, &thread_shared))
            .map_err(|e| Error::executor(format!("spawn failed: {}", e)))?;

        Ok(Self {
            id,
            shared,
            thread: Mutex::new(Some(thread)),
        })
    }

    // main loop
    fn run(id: WorkerId, shared: &Shared) {
        loop {
            match shared.lanes.pop_or_wait() {
                Popped::Task(task) => {
                    shared.set_state(WorkerState::Running);
                    shared.busy.store(true, Ordering::Release);
                    Self::execute_task(id, shared, task);
                    shared.busy.store(false, Ordering::Release);
                    // Stay Running while more work is queued; Idle means
                    // the thread is about to block on the wake predicate.
                    if shared.lanes.is_empty() {
                        shared.set_state(WorkerState::Idle);
                    }
                }
                Popped::Shutdown => break,
            }
        }

        // Stop-immediately policy: anything still queued is resolved to
        // Cancelled so no reader stays blocked on an abandoned task.
        shared.set_state(WorkerState::ShuttingDown);
        for task in shared.lanes.drain() {
            task.cancel();
            shared.stats.tasks_cancelled.fetch_add(1, Ordering::Relaxed);
        }
        shared.set_state(WorkerState::Stopped);
    }

    fn execute_task(id: WorkerId, shared: &Shared, task: Task) {
        let tid = task.id;
        // run() captures any panic into the task's sink.
        let ok = task.run();
        shared.stats.tasks_executed.fetch_add(1, Ordering::Relaxed);
        if !ok {
            shared.stats.tasks_failed.fetch_add(1, Ordering::Relaxed);
            eprintln!("trilane: worker {} task {} panicked", id, tid);
        }
    }

    /// Submit a callable to this worker, returning the handle to its result.
    ///
    /// The handle is bound to the result sink before the task is enqueued.
    /// If shutdown was already requested the task is cancelled immediately,
    /// so the handle resolves to `Err(TaskError::Cancelled)` rather than
    /// staying pending forever.
    pub fn submit<F, T>(&self, f: F, priority: Priority) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = Task::new(f, priority);
        self.enqueue(task);
        handle
    }

    /// Route an already-built task into this worker's lanes.
    pub(crate) fn enqueue(&self, task: Task) {
        if let Err(rejected) = self.shared.lanes.push(task) {
            self.shared
                .stats
                .tasks_cancelled
                .fetch_add(1, Ordering::Relaxed);
            rejected.cancel();
        }
    }

    /// This worker's index.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// True while the thread is inside a task's payload.
    ///
    /// Eventually consistent with actual execution state; a load signal for
    /// dispatch, not something to linearize against queue contents.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Number of tasks queued across all three lanes.
    pub fn pending_count(&self) -> usize {
        self.shared.lanes.len()
    }

    /// Current lifecycle state of the worker thread.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Point-in-time diagnostic snapshot. No stability contract.
    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id,
            state: self.state(),
            busy: self.is_busy(),
            queued: self.shared.lanes.depths(),
            tasks_executed: self.shared.stats.tasks_executed.load(Ordering::Relaxed),
            tasks_failed: self.shared.stats.tasks_failed.load(Ordering::Relaxed),
            tasks_cancelled: self.shared.stats.tasks_cancelled.load(Ordering::Relaxed),
        }
    }

    /// Request exit, cancel whatever is still queued, and join the thread.
    ///
    /// The in-flight task (if any) runs to completion first. Returns only
    /// once the thread has fully stopped. Safe to call more than once.
    pub fn shutdown(&self) {
        self.shared.lanes.request_shutdown();
        let mut slot = self.thread.lock();
        if let Some(handle) = slot.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Human-readable snapshot of one worker, for introspection and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSnapshot {
    /// Worker index within its pool.
    pub id: WorkerId,
    /// Thread lifecycle state at sample time.
    pub state: WorkerState,
    /// Whether a payload was executing at sample time.
    pub busy: bool,
    /// Queue depths in High, Normal, Low order.
    pub queued: [usize; Priority::COUNT],
    /// Tasks executed so far (including failed ones).
    pub tasks_executed: u64,
    /// Tasks whose payload panicked.
    pub tasks_failed: u64,
    /// Tasks cancelled at or after shutdown.
    pub tasks_cancelled: u64,
}

impl std::fmt::Display for WorkerSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "worker {}: state={} busy={} queued[h/n/l]={}/{}/{} executed={} failed={} cancelled={}",
            self.id,
            self.state,
            self.busy,
            self.queued[0],
            self.queued[1],
            self.queued[2],
            self.tasks_executed,
            self.tasks_failed,
            self.tasks_cancelled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_submit_round_trip() {
        let worker = Worker::new(0).unwrap();
        let handle = worker.submit(|| 42, Priority::Normal);
        assert_eq!(handle.get(), Ok(42));
        worker.shutdown();
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let worker = Worker::new(0).unwrap();
        let bad = worker.submit(|| -> u32 { panic!("nope") }, Priority::Normal);
        let good = worker.submit(|| 7u32, Priority::Normal);
        assert!(matches!(bad.get(), Err(TaskError::Panicked(_))));
        assert_eq!(good.get(), Ok(7));
        assert_eq!(worker.snapshot().tasks_failed, 1);
        worker.shutdown();
    }

    #[test]
    fn test_idle_again_once_lanes_empty() {
        let worker = Worker::new(0).unwrap();
        worker.submit(|| (), Priority::Normal).get().unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(worker.state(), WorkerState::Idle);
        assert_eq!(worker.pending_count(), 0);
        worker.shutdown();
    }

    #[test]
    fn test_shutdown_idempotent_and_stopped() {
        let worker = Worker::new(3).unwrap();
        worker.shutdown();
        assert_eq!(worker.state(), WorkerState::Stopped);
        worker.shutdown();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_submit_after_shutdown_is_cancelled() {
        let worker = Worker::new(0).unwrap();
        worker.shutdown();
        let handle = worker.submit(|| 1, Priority::High);
        assert_eq!(handle.get(), Err(TaskError::Cancelled));
    }

    #[test]
    fn test_queued_tasks_cancelled_on_shutdown() {
        let worker = Worker::new(0).unwrap();
        let (tx, rx) = mpsc::channel::<()>();
        let blocker = worker.submit(
            move || {
                rx.recv().ok();
            },
            Priority::High,
        );
        // Let the blocker start so the rest stays queued.
        std::thread::sleep(Duration::from_millis(50));
        let queued = worker.submit(|| 9, Priority::Normal);

        let release = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            tx.send(()).ok();
        });
        worker.shutdown();
        release.join().unwrap();

        assert_eq!(blocker.get(), Ok(()));
        assert_eq!(queued.get(), Err(TaskError::Cancelled));
        assert_eq!(worker.snapshot().tasks_cancelled, 1);
    }

    #[test]
    fn test_snapshot_display() {
        let worker = Worker::new(5).unwrap();
        worker.submit(|| (), Priority::Normal).get().unwrap();
        let line = worker.snapshot().to_string();
        assert!(line.starts_with("worker 5:"));
        assert!(line.contains("executed=1"));
        worker.shutdown();
    }
}
