use thiserror::Error;

/// Errors raised by the task framework or surfaced through a task result
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task observed a cancellation request at a checkpoint
    #[error("the task was cancelled")]
    Cancelled,

    /// Waiting for the task result did not finish in time
    #[error("timed out waiting for the task to finish")]
    Timeout,

    /// A task can be run by exactly one owner at a time
    #[error("the task is already running")]
    RejectedExecution,

    /// The requested operation is not legal in the current task state
    #[error("illegal in the current task state: {0}")]
    InvalidState(String),

    /// The task was configured with invalid parameters
    #[error("invalid task configuration: {0}")]
    InvalidConfiguration(String),

    /// A failure the task body signalled deliberately; carries no cause chain
    #[error("{0}")]
    Failed(String),

    /// An unexpected failure captured from the task body
    #[error("the task failed")]
    Aborted(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The task body panicked; the payload is kept as text
    #[error("the task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Wraps an arbitrary error as the unexpected-failure variant
    pub fn aborted<E: std::error::Error + Send + Sync + 'static>(cause: E) -> TaskError {
        TaskError::Aborted(Box::new(cause))
    }
}
