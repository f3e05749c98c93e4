use thiserror::Error;

use tuplekit_data::errors::StorageError;
use tuplekit_io::errors::IoError;
use tuplekit_tasks::TaskError;

/// Errors that may appear while using the tuplekit-clustering crate
#[derive(Debug, Error)]
pub enum ClusteringError {
    /// The requested clustering cannot be set up, e.g. more clusters than rows
    #[error("invalid clustering configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// The data contains a value no distance can be computed from
    #[error("tuple {row} contains a non-finite value")]
    NonFiniteValue { row: usize },

    /// Error raised by the tuple storage layer
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Error raised while reading or writing tuple data
    #[error(transparent)]
    Io(#[from] IoError),

    /// Error surfaced from the hosting task, cancellation included
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl ClusteringError {
    pub(crate) fn invalid<S: Into<String>>(reason: S) -> ClusteringError {
        ClusteringError::InvalidConfiguration { reason: reason.into() }
    }
}

// A clustering failure inside a task body becomes the task's terminal error;
// a cancellation observed at a checkpoint must stay a cancellation.
impl From<ClusteringError> for TaskError {
    fn from(error: ClusteringError) -> TaskError {
        match error {
            ClusteringError::Task(task_error) => task_error,
            other => TaskError::aborted(other),
        }
    }
}
