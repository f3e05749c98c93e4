use thiserror::Error;

/// Errors that may appear while loading or saving tuple data
#[derive(Debug, Error)]
pub enum IoError {
    /// A record could not be turned into a tuple
    #[error("can't parse record {record}: {reason}")]
    BadRecord { record: usize, reason: String },

    /// All tuples of a data set must have the same length
    #[error("record {record} has {found} columns while the first record had {expected}")]
    RaggedRecord { record: usize, expected: usize, found: usize },

    /// The input held no usable records
    #[error("the input contains no tuples")]
    EmptyInput,

    /// The caller cancelled the load
    #[error("loading was cancelled")]
    Cancelled,

    /// General I/O error occurred while reading an input file
    #[error("general I/O error occurred while reading an input file")]
    Io(#[from] std::io::Error),

    /// Error returned by the CSV parser
    #[error("error returned by the CSV parser")]
    CsvError(#[from] csv::Error),
}
