use thiserror::Error;

/// Errors that may appear while creating or managing tuple stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// Rows of a store must all have the same length
    #[error("row {row} has {found} elements while the store holds tuples of {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    /// A store cannot be built from no data
    #[error("can't create a tuple store from empty data")]
    EmptyData,

    /// A row index points outside the store
    #[error("row index {row} out of range for a store of {count} tuples")]
    RowOutOfRange { row: usize, count: usize },

    /// A filtered view must not select the same row twice
    #[error("row index {row} selected more than once")]
    DuplicateRow { row: usize },

    /// A factory already holds a store under that name
    #[error("a tuple store named '{name}' already exists")]
    NameCollision { name: String },

    /// No store is known under that name
    #[error("no tuple store named '{name}'")]
    NotFound { name: String },

    /// The named store exists but has been closed
    #[error("the tuple store named '{name}' is not open")]
    NotOpen { name: String },

    /// General I/O error from a persistent factory backend
    #[error("I/O error while accessing stored tuples")]
    Io(#[from] std::io::Error),
}
