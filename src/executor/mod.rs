//! Task execution infrastructure.
//!
//! This module provides the core execution primitives: the type-erased
//! task, the caller-facing result handle, the single-threaded worker unit,
//! and the thin pool that dispatches across workers.

pub mod handle;
pub mod pool;
pub mod task;
pub mod worker;

pub use handle::{TaskHandle, TaskState};
pub use pool::Pool;
pub use task::{Priority, TaskId};
pub use worker::{Worker, WorkerId, WorkerSnapshot, WorkerState};

pub(crate) use task::Task;
