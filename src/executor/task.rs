//! Task representation: priority, id, and the type-erased payload.

use crate::error::TaskError;
use crate::executor::handle::{ResultCell, TaskHandle};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task, assigned at submission time.
///
/// Monotonically increasing within the process; used for lookup and
/// diagnostics only, never for ordering decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling lane for a task. Lower values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    /// Popped before anything in the other lanes.
    High = 0,
    /// The default lane.
    Normal = 1,
    /// Popped only when High and Normal are empty.
    Low = 2,
}

impl Priority {
    /// Number of lanes.
    pub const COUNT: usize = 3;

    pub(crate) fn lane(self) -> usize {
        self as usize
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Erasure seam between a typed submission and the worker loop.
///
/// Exactly one of `run` or `cancel` is ever called, and at most once:
/// both consume the job, and a task moves out of its lane exactly once.
trait Job: Send {
    /// Invoke the payload and publish its outcome. Returns `false` when the
    /// payload panicked (the panic is captured, never propagated).
    fn run(self: Box<Self>) -> bool;

    /// Publish `TaskError::Cancelled` without invoking the payload.
    fn cancel(self: Box<Self>);
}

struct Payload<F, T> {
    f: F,
    cell: Arc<ResultCell<T>>,
}

impl<F, T> Job for Payload<F, T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>) -> bool {
        let Payload { f, cell } = *self;
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                cell.complete(Ok(value));
                true
            }
            Err(payload) => {
                cell.complete(Err(TaskError::Panicked(panic_message(payload))));
                false
            }
        }
    }

    fn cancel(self: Box<Self>) {
        self.cell.complete(Err(TaskError::Cancelled));
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Internal task representation: a deferred invocation bound to its lane
/// and its result sink.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) priority: Priority,
    job: Box<dyn Job>,
}

impl Task {
    /// Build a task and the handle bound to its result sink.
    ///
    /// The handle exists before the task touches any queue, so a completion
    /// can never be missed by the submitter.
    pub(crate) fn new<F, T>(f: F, priority: Priority) -> (Self, TaskHandle<T>)
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = TaskId::next();
        let cell = Arc::new(ResultCell::new());
        let handle = TaskHandle::new(id, Arc::clone(&cell));
        let task = Task {
            id,
            priority,
            job: Box::new(Payload { f, cell }),
        };
        (task, handle)
    }

    /// Execute the payload, publishing its value or captured panic.
    /// Returns `false` when the payload panicked.
    pub(crate) fn run(self) -> bool {
        self.job.run()
    }

    /// Resolve the sink to `Cancelled` without executing.
    pub(crate) fn cancel(self) {
        self.job.cancel();
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}
