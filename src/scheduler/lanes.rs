//! Three-lane FIFO queue set fused with the worker's wake predicate.
//!
//! All lanes, the emptiness check, and the exit flag live under one mutex,
//! so "check lanes, then sleep" and "check lanes, then pop" are each a
//! single atomic step relative to concurrent enqueues. Splitting these
//! across locks is exactly what loses wakeups or double-pops a task.

use crate::executor::task::{Priority, Task};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Outcome of a blocking pop.
pub(crate) enum Popped {
    /// The front of the highest-priority non-empty lane.
    Task(Task),
    /// Shutdown was requested; no task was removed.
    Shutdown,
}

struct Lanes {
    queues: [VecDeque<Task>; Priority::COUNT],
    shutdown: bool,
}

impl Lanes {
    fn pop_highest(&mut self) -> Option<Task> {
        // High, Normal, Low. Strict precedence, FIFO within a lane;
        // a steady stream of High can starve the rest indefinitely.
        self.queues.iter_mut().find_map(VecDeque::pop_front)
    }

    fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }
}

/// Thread-safe priority queue set owned by one worker.
pub(crate) struct LaneSet {
    lanes: Mutex<Lanes>,
    available: Condvar,
}

impl LaneSet {
    pub(crate) fn new() -> Self {
        Self {
            lanes: Mutex::new(Lanes {
                queues: Default::default(),
                shutdown: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Append to the lane matching the task's priority and wake one waiter.
    ///
    /// Once shutdown has been requested the task is handed back unqueued;
    /// the caller decides its fate (this crate cancels it). The flag check
    /// shares the lanes' mutex, so the cutover is deterministic.
    pub(crate) fn push(&self, task: Task) -> Result<(), Task> {
        {
            let mut lanes = self.lanes.lock();
            if lanes.shutdown {
                return Err(task);
            }
            lanes.queues[task.priority.lane()].push_back(task);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Remove and return the front of the highest non-empty lane, if any.
    /// Observation hook for unit tests; the worker loop pops through
    /// [`pop_or_wait`](Self::pop_or_wait).
    #[cfg(test)]
    pub(crate) fn try_pop_highest(&self) -> Option<Task> {
        self.lanes.lock().pop_highest()
    }

    /// Block until a task is available or shutdown is requested.
    ///
    /// Shutdown wins over remaining work: the exit flag is re-checked under
    /// the lock before every wait and after every wake.
    pub(crate) fn pop_or_wait(&self) -> Popped {
        let mut lanes = self.lanes.lock();
        loop {
            if lanes.shutdown {
                return Popped::Shutdown;
            }
            if let Some(task) = lanes.pop_highest() {
                return Popped::Task(task);
            }
            self.available.wait(&mut lanes);
        }
    }

    /// Set the exit flag and wake every waiter.
    pub(crate) fn request_shutdown(&self) {
        self.lanes.lock().shutdown = true;
        self.available.notify_all();
    }

    /// Remove everything still queued, in pop order.
    pub(crate) fn drain(&self) -> Vec<Task> {
        let mut lanes = self.lanes.lock();
        let mut out = Vec::with_capacity(lanes.len());
        while let Some(task) = lanes.pop_highest() {
            out.push(task);
        }
        out
    }

    /// True iff all three lanes are empty.
    pub(crate) fn is_empty(&self) -> bool {
        self.lanes.lock().is_empty()
    }

    /// Total queued tasks across lanes.
    pub(crate) fn len(&self) -> usize {
        self.lanes.lock().len()
    }

    /// Per-lane depths in High, Normal, Low order.
    pub(crate) fn depths(&self) -> [usize; Priority::COUNT] {
        let lanes = self.lanes.lock();
        [
            lanes.queues[0].len(),
            lanes.queues[1].len(),
            lanes.queues[2].len(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn dummy_task(priority: Priority) -> Task {
        let (task, _handle) = Task::new(|| (), priority);
        task
    }

    #[test]
    fn test_strict_priority_then_fifo() {
        let lanes = LaneSet::new();
        lanes.push(dummy_task(Priority::Low)).unwrap();
        lanes.push(dummy_task(Priority::Low)).unwrap();
        let high = dummy_task(Priority::High);
        let high_id = high.id;
        lanes.push(high).unwrap();

        let first = lanes.try_pop_highest().unwrap();
        assert_eq!(first.id, high_id);
        assert_eq!(first.priority, Priority::High);

        let second = lanes.try_pop_highest().unwrap();
        let third = lanes.try_pop_highest().unwrap();
        assert!(second.id.as_u64() < third.id.as_u64());
        assert!(lanes.try_pop_highest().is_none());
    }

    #[test]
    fn test_is_empty_and_depths() {
        let lanes = LaneSet::new();
        assert!(lanes.is_empty());
        lanes.push(dummy_task(Priority::Normal)).unwrap();
        lanes.push(dummy_task(Priority::High)).unwrap();
        assert!(!lanes.is_empty());
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes.depths(), [1, 1, 0]);
    }

    #[test]
    fn test_push_after_shutdown_rejected() {
        let lanes = LaneSet::new();
        lanes.request_shutdown();
        assert!(lanes.push(dummy_task(Priority::Normal)).is_err());
    }

    #[test]
    fn test_pop_or_wait_wakes_on_push() {
        let lanes = std::sync::Arc::new(LaneSet::new());
        let consumer = {
            let lanes = std::sync::Arc::clone(&lanes);
            thread::spawn(move || match lanes.pop_or_wait() {
                Popped::Task(task) => Some(task.id),
                Popped::Shutdown => None,
            })
        };
        thread::sleep(Duration::from_millis(20));
        let task = dummy_task(Priority::Normal);
        let id = task.id;
        lanes.push(task).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(id));
    }

    #[test]
    fn test_pop_or_wait_wakes_on_shutdown() {
        let lanes = std::sync::Arc::new(LaneSet::new());
        let consumer = {
            let lanes = std::sync::Arc::clone(&lanes);
            thread::spawn(move || matches!(lanes.pop_or_wait(), Popped::Shutdown))
        };
        thread::sleep(Duration::from_millis(20));
        lanes.request_shutdown();
        assert!(consumer.join().unwrap());
    }

    #[test]
    fn test_shutdown_wins_over_queued_work() {
        let lanes = LaneSet::new();
        lanes.push(dummy_task(Priority::High)).unwrap();
        lanes.request_shutdown();
        assert!(matches!(lanes.pop_or_wait(), Popped::Shutdown));
        assert_eq!(lanes.drain().len(), 1);
    }
}
