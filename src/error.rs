//! Error types for pool lifecycle and task outcomes.

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by pool construction and lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Worker thread could not be spawned or driven.
    #[error("executor error: {0}")]
    Executor(String),

    /// The global pool has not been initialized.
    #[error("pool not initialized")]
    NotInitialized,

    /// The global pool was already initialized.
    #[error("pool already initialized")]
    AlreadyInitialized,
}

impl Error {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }
}

/// Terminal failure of a single task, observed through its [`TaskHandle`].
///
/// Cloneable so every reader of a shared handle sees the same outcome.
///
/// [`TaskHandle`]: crate::TaskHandle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The payload panicked while running; the message is the panic payload.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The task was still queued when its worker shut down and was never run.
    #[error("task cancelled before execution")]
    Cancelled,
}
