//! Pool configuration and validation.

use crate::error::{Error, Result};

/// Construction-time parameters for a [`Pool`].
///
/// [`Pool`]: crate::Pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Workers spawned up front. `None` means one per logical CPU.
    pub initial_workers: Option<usize>,

    /// Upper bound the pool may grow to when every worker is busy.
    /// `None` pins the pool at its initial size.
    pub max_workers: Option<usize>,

    /// Prefix for worker thread names (`"<prefix>-<id>"`).
    pub thread_name_prefix: String,

    /// Stack size for worker threads, if overriding the platform default.
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_workers: None,
            max_workers: None,
            thread_name_prefix: "trilane-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
        }
    }
}

impl PoolConfig {
    /// Start building a config.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    /// Check bounds before the pool spends any resources on them.
    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.initial_workers {
            if n == 0 {
                return Err(Error::config("initial_workers must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("initial_workers too large (max 1024)"));
            }
        }

        if let Some(max) = self.max_workers {
            if max == 0 {
                return Err(Error::config("max_workers must be > 0"));
            }
            if max > 1024 {
                return Err(Error::config("max_workers too large (max 1024)"));
            }
            if max < self.resolved_initial() {
                return Err(Error::config("max_workers must be >= initial_workers"));
            }
        }

        Ok(())
    }

    /// Number of workers spawned at construction.
    pub fn resolved_initial(&self) -> usize {
        self.initial_workers.unwrap_or_else(num_cpus::get)
    }

    /// Ceiling the pool may grow to.
    pub fn resolved_max(&self) -> usize {
        self.max_workers.unwrap_or_else(|| self.resolved_initial())
    }
}

/// Builder for [`PoolConfig`].
#[derive(Debug, Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
        }
    }

    /// Set the number of workers spawned up front.
    pub fn initial_workers(mut self, n: usize) -> Self {
        self.config.initial_workers = Some(n);
        self
    }

    /// Set the growth ceiling.
    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = Some(n);
        self
    }

    /// Set the worker thread name prefix.
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker thread stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Validate and produce the config.
    pub fn build(self) -> Result<PoolConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
