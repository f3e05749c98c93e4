use std::ffi::OsStr;
use std::fs::File;
use std::io::{stderr, stdout, BufRead, BufReader, Write};
use std::path::Path;

use flate2::read;
use log::debug;

use tuplekit_data::{TupleStore, VecTupleStore};
use tuplekit_tasks::Cancelable;

use crate::errors::IoError;

/// How many records are read between two cancellation polls.
const CANCEL_POLL_STRIDE: usize = 1024;

/// Opens a file for reading.
///
/// This function can open a regular file or a gzipped one, as determined by the
/// extension of the input file name. A boxed reader to the content is returned.
pub fn open_file(filename: &str) -> Result<Box<dyn BufRead>, IoError> {
    let path = Path::new(filename);
    let file = File::open(path)?;

    if path.extension() == Some(OsStr::new("gz")) {
        Ok(Box::new(BufReader::with_capacity(128 * 1024, read::GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::with_capacity(128 * 1024, file)))
    }
}

/// Creates a `Writer` object.
///
/// Attempts to open a file under a given name. However, if the name is `"stdout"`
/// or `"stderr"`, the returned `Writer` will be connected to either `stdout` or
/// `stderr` stream, respectively. Empty file name also results in writing to `stdout`.
///
/// # Arguments
/// * `out_fname` - file name, `"stdout"` or `"stderr"`
/// * `if_append` - existing file will be removed if false, otherwise the new content will be appended
pub fn out_writer(out_fname: &str, if_append: bool) -> Result<Box<dyn Write>, IoError> {
    match out_fname {
        "" | "stdout" => Ok(Box::new(stdout()) as Box<dyn Write>),
        "stderr" => Ok(Box::new(stderr()) as Box<dyn Write>),
        _ => {
            let path = Path::new(out_fname);
            let file = if if_append {
                File::options().append(true).create(true).open(path)?
            } else {
                File::create(path)?
            };
            Ok(Box::new(file) as Box<dyn Write>)
        }
    }
}

/// Reads tuples from a comma-separated input.
///
/// Every record must hold the same number of real values; records with any empty
/// field are skipped. The `cancel` flag is polled periodically so a task-driven
/// load can be abandoned mid-file.
///
/// # Examples
/// ```
/// use tuplekit_data::TupleStore;
/// use tuplekit_io::read_tuples_csv;
/// use tuplekit_tasks::NeverCancelled;
///
/// let text = "1.0,2.0\n3.0,4.0\n";
/// let store = read_tuples_csv(text.as_bytes(), &NeverCancelled).unwrap();
/// assert_eq!(store.tuple_count(), 2);
/// assert_eq!(store.tuple(1), vec![3.0, 4.0]);
/// ```
pub fn read_tuples_csv<R: BufRead>(reader: R, cancel: &dyn Cancelable) -> Result<VecTupleStore, IoError> {
    read_tuples(reader, b',', cancel)
}

/// Reads tuples from a tab-separated input.
///
/// This function works as [`read_tuples_csv()`](read_tuples_csv), just with another delimiter.
pub fn read_tuples_tsv<R: BufRead>(reader: R, cancel: &dyn Cancelable) -> Result<VecTupleStore, IoError> {
    read_tuples(reader, b'\t', cancel)
}

/// Writes all tuples of a store as comma-separated records.
pub fn write_tuples_csv<W: Write>(writer: &mut W, tuples: &dyn TupleStore) -> Result<(), IoError> {
    let mut buffer = vec![0.0; tuples.tuple_length()];
    for row in 0..tuples.tuple_count() {
        tuples.get_tuple(row, &mut buffer);
        let fields: Vec<String> = buffer.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Check if all fields of the given record are not empty
fn is_record_ok(rec: &csv::StringRecord) -> bool {
    rec.iter().all(|e| !e.is_empty())
}

fn read_tuples<R: BufRead>(reader: R, delimiter: u8, cancel: &dyn Cancelable) -> Result<VecTupleStore, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut store: Option<VecTupleStore> = None;
    let mut dim = 0;
    for (i, record) in rdr.records().enumerate() {
        if i % CANCEL_POLL_STRIDE == 0 && cancel.is_cancelled() {
            return Err(IoError::Cancelled);
        }
        let record = record?;
        if !is_record_ok(&record) { continue; }

        let row: Result<Vec<f64>, _> = record.iter().map(|e| e.trim().parse::<f64>()).collect();
        let row = match row {
            Ok(values) => values,
            Err(err) => {
                return Err(IoError::BadRecord { record: i, reason: err.to_string() });
            }
        };

        match store {
            None => {
                dim = row.len();
                let mut first = VecTupleStore::new(dim, 0);
                first.push_tuple(&row);
                store = Some(first);
            }
            Some(ref mut tuples) => {
                if row.len() != dim {
                    return Err(IoError::RaggedRecord { record: i, expected: dim, found: row.len() });
                }
                tuples.push_tuple(&row);
            }
        }
    }

    match store {
        Some(tuples) => {
            debug!("{} tuples of length {} loaded", tuples.tuple_count(), tuples.tuple_length());
            Ok(tuples)
        }
        None => Err(IoError::EmptyInput),
    }
}
