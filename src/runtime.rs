//! Optional process-wide pool for callers that want an implicit runtime.

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::executor::handle::TaskHandle;
use crate::executor::pool::Pool;
use crate::executor::task::Priority;
use parking_lot::RwLock;
use std::sync::Arc;

// Global pool for the simple API
static GLOBAL_POOL: RwLock<Option<Arc<Pool>>> = RwLock::new(None);

/// Initialize the global pool with default configuration.
pub fn init() -> Result<()> {
    init_with_config(PoolConfig::default())
}

/// Initialize the global pool with an explicit configuration.
///
/// Fails with [`Error::AlreadyInitialized`] if a pool is already installed.
pub fn init_with_config(config: PoolConfig) -> Result<()> {
    let mut slot = GLOBAL_POOL.write();
    if slot.is_some() {
        return Err(Error::AlreadyInitialized);
    }
    *slot = Some(Arc::new(Pool::new(config)?));
    Ok(())
}

/// Get a handle to the global pool.
pub fn handle() -> Result<Arc<Pool>> {
    GLOBAL_POOL.read().clone().ok_or(Error::NotInitialized)
}

/// Submit a callable to the global pool at normal priority.
pub fn submit<F, T>(f: F) -> Result<TaskHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    submit_with_priority(f, Priority::Normal)
}

/// Submit a callable to the global pool with an explicit priority.
pub fn submit_with_priority<F, T>(f: F, priority: Priority) -> Result<TaskHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(handle()?.submit(f, priority))
}

/// Tear down the global pool, blocking until every worker has stopped.
///
/// A no-op when the pool was never initialized.
pub fn shutdown() {
    let pool = GLOBAL_POOL.write().take();
    if let Some(pool) = pool {
        pool.shutdown();
    }
}
