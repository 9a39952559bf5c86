//! Convenient re-exports of the types most callers need.

pub use crate::config::{PoolConfig, PoolConfigBuilder};
pub use crate::error::{Error, Result, TaskError};
pub use crate::executor::{Pool, Priority, TaskHandle, TaskState, Worker, WorkerState};
pub use crate::{init, init_with_config, shutdown};
