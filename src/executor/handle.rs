//! The caller-facing result handle and its one-shot sink.

use crate::error::TaskError;
use crate::executor::task::TaskId;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One-shot result sink shared between exactly one producer (the worker
/// that runs or cancels the task) and any number of handle readers.
///
/// Written once, then published to all waiters. The mutex gives the
/// acquire/release ordering; completing twice is a structural bug.
pub(crate) struct ResultCell<T> {
    slot: Mutex<Option<Result<T, TaskError>>>,
    ready: Condvar,
}

impl<T> ResultCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    pub(crate) fn complete(&self, outcome: Result<T, TaskError>) {
        {
            let mut slot = self.slot.lock();
            debug_assert!(slot.is_none(), "result cell completed twice");
            if slot.is_none() {
                *slot = Some(outcome);
            }
        }
        self.ready.notify_all();
    }
}

/// Non-blocking view of a task's progress, returned by [`TaskHandle::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState<T> {
    /// Not yet executed (or still executing).
    Pending,
    /// Terminal: the payload's value or its captured failure.
    Done(Result<T, TaskError>),
}

impl<T> TaskState<T> {
    /// True while the task has not reached a terminal state.
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskState::Pending)
    }
}

/// Handle to a submitted task's eventual outcome.
///
/// Bound to the task's result sink before the task is enqueued. Cloneable;
/// every reader (blocking or polling, on any thread) observes the same
/// terminal value, and reads after completion are idempotent.
pub struct TaskHandle<T> {
    id: TaskId,
    cell: Arc<ResultCell<T>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(id: TaskId, cell: Arc<ResultCell<T>>) -> Self {
        Self { id, cell }
    }

    /// Id of the task this handle is bound to.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// True once the task has completed, failed, or been cancelled.
    pub fn is_done(&self) -> bool {
        self.cell.slot.lock().is_some()
    }
}

impl<T: Clone> TaskHandle<T> {
    /// Block until the task reaches a terminal state, then return it.
    ///
    /// Returns immediately if already terminal. A worker shutdown that
    /// abandons the task resolves this to `Err(TaskError::Cancelled)`
    /// rather than blocking forever.
    pub fn get(&self) -> Result<T, TaskError> {
        let mut slot = self.cell.slot.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.cell.ready.wait(&mut slot);
        }
    }

    /// Bounded-wait variant of [`get`](Self::get).
    ///
    /// Returns `None` on expiry without consuming anything; a later call
    /// can still observe the result.
    pub fn get_timeout(&self, timeout: Duration) -> Option<Result<T, TaskError>> {
        // A timeout too large to represent as a deadline means "no deadline".
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.cell.slot.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return Some(outcome.clone());
            }
            match deadline {
                Some(deadline) => {
                    if self.cell.ready.wait_until(&mut slot, deadline).timed_out() {
                        return slot.as_ref().cloned();
                    }
                }
                None => self.cell.ready.wait(&mut slot),
            }
        }
    }

    /// Non-blocking read of the current state.
    pub fn poll(&self) -> TaskState<T> {
        match self.cell.slot.lock().as_ref() {
            Some(outcome) => TaskState::Done(outcome.clone()),
            None => TaskState::Pending,
        }
    }
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("done", &self.is_done())
            .finish()
    }
}
