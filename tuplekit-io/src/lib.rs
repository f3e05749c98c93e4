//! Reads and writes tuple data for the tuplekit crates.
//!
//! The loaders parse delimiter-separated text into a
//! [`VecTupleStore`](tuplekit_data::VecTupleStore) and poll a
//! [`Cancelable`](tuplekit_tasks::Cancelable) while doing so, so a long load
//! started from a task stops promptly when the task is cancelled. The
//! [`open_file()`](open_file) helper transparently decompresses `.gz` inputs.

mod utils;
pub mod errors;

pub use utils::{open_file, out_writer, read_tuples_csv, read_tuples_tsv, write_tuples_csv};
