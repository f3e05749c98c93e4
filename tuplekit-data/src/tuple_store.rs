use crate::errors::StorageError;

/// Read access to an ordered sequence of tuples of identical length.
///
/// A *tuple* is a fixed-length vector of `f64` values; every row of a store has
/// the same length [`tuple_length()`](TupleStore::tuple_length). Reading fills
/// a caller-supplied buffer, so tight loops can scan a store without allocating.
pub trait TupleStore {
    /// Returns the length of every tuple in this store
    fn tuple_length(&self) -> usize;

    /// Returns the number of tuples held by this store
    fn tuple_count(&self) -> usize;

    /// Copies the `row`-th tuple into `buffer`
    ///
    /// # Arguments
    /// * `row` - index of the requested tuple, from `0..tuple_count()`
    /// * `buffer` - output slice of at least `tuple_length()` elements
    fn get_tuple(&self, row: usize, buffer: &mut [f64]);

    /// Returns the `row`-th tuple as a freshly allocated vector
    fn tuple(&self, row: usize) -> Vec<f64> {
        let mut buffer = vec![0.0; self.tuple_length()];
        self.get_tuple(row, &mut buffer);
        buffer
    }
}

/// A [`TupleStore`](TupleStore) whose rows may be replaced.
pub trait TupleStoreMut: TupleStore {
    /// Replaces the `row`-th tuple with `values`, which must have `tuple_length()` elements
    fn set_tuple(&mut self, row: usize, values: &[f64]);
}

/// Tuples held in a single flat vector, rows stored contiguously.
///
/// # Examples
/// ```rust
/// use tuplekit_data::{TupleStore, TupleStoreMut, VecTupleStore};
/// let mut store = VecTupleStore::new(2, 3);
/// store.set_tuple(1, &[0.5, 1.5]);
/// assert_eq!(store.tuple(1), vec![0.5, 1.5]);
/// assert_eq!(store.tuple_count(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct VecTupleStore {
    dim: usize,
    data: Vec<f64>,
}

impl VecTupleStore {
    /// Creates a store of `count` zero-filled tuples, each of `dim` elements
    ///
    /// # Arguments
    /// * `dim` - tuple length, must be at least 1
    /// * `count` - the number of rows; may be zero
    pub fn new(dim: usize, count: usize) -> VecTupleStore {
        assert!(dim > 0, "tuple length must be at least 1");
        VecTupleStore { dim, data: vec![0.0; dim * count] }
    }

    /// Creates a store from a vector of rows
    ///
    /// # Examples
    /// ```rust
    /// use tuplekit_data::{TupleStore, VecTupleStore};
    /// let store = VecTupleStore::from_rows(vec![vec![0.0, 1.0], vec![2.0, 3.0]]).unwrap();
    /// assert_eq!(store.tuple_length(), 2);
    /// ```
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<VecTupleStore, StorageError> {
        let dim = match rows.first() {
            Some(row) => row.len(),
            None => return Err(StorageError::EmptyData),
        };
        if dim == 0 { return Err(StorageError::EmptyData); }
        let mut data = Vec::with_capacity(dim * rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(StorageError::RaggedRow { row: i, expected: dim, found: row.len() });
            }
            data.extend_from_slice(row);
        }
        Ok(VecTupleStore { dim, data })
    }

    /// Appends a tuple at the end of this store
    pub fn push_tuple(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.dim);
        self.data.extend_from_slice(values);
    }

    /// Borrows the `row`-th tuple without copying it
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }
}

impl TupleStore for VecTupleStore {
    fn tuple_length(&self) -> usize { self.dim }

    fn tuple_count(&self) -> usize { self.data.len() / self.dim }

    fn get_tuple(&self, row: usize, buffer: &mut [f64]) {
        buffer[..self.dim].copy_from_slice(self.row(row));
    }
}

impl TupleStoreMut for VecTupleStore {
    fn set_tuple(&mut self, row: usize, values: &[f64]) {
        assert_eq!(values.len(), self.dim);
        self.data[row * self.dim..(row + 1) * self.dim].copy_from_slice(values);
    }
}

/// A read-only view exposing a subset of rows of another store.
///
/// The selected rows appear under contiguous local indices `0..M` in the order
/// given at construction; [`local_to_original()`](FilteredTupleStore::local_to_original)
/// recovers the index a local row has in the backing store. The backing store must
/// outlive all of its views, which the borrow enforces.
///
/// # Examples
/// ```rust
/// use tuplekit_data::{TupleStore, VecTupleStore, FilteredTupleStore};
/// let store = VecTupleStore::from_rows(vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
/// let view = FilteredTupleStore::new(&store, vec![3, 1]).unwrap();
/// assert_eq!(view.tuple_count(), 2);
/// assert_eq!(view.tuple(0), vec![3.0]);
/// assert_eq!(view.local_to_original(1), 1);
/// ```
pub struct FilteredTupleStore<'a> {
    backing: &'a (dyn TupleStore + Sync),
    selection: Vec<usize>,
}

impl<'a> FilteredTupleStore<'a> {
    /// Creates a view of `backing` restricted to the rows listed in `selection`
    ///
    /// The selection may appear in any order but must not repeat an index nor
    /// point outside the backing store.
    pub fn new(backing: &'a (dyn TupleStore + Sync), selection: Vec<usize>) -> Result<FilteredTupleStore<'a>, StorageError> {
        let n = backing.tuple_count();
        let mut seen = vec![false; n];
        for &original in &selection {
            if original >= n {
                return Err(StorageError::RowOutOfRange { row: original, count: n });
            }
            if seen[original] {
                return Err(StorageError::DuplicateRow { row: original });
            }
            seen[original] = true;
        }
        Ok(FilteredTupleStore { backing, selection })
    }

    /// Maps a local row index back to the index it has in the backing store
    pub fn local_to_original(&self, local: usize) -> usize { self.selection[local] }

    /// Returns the selected original row indices, in local order
    pub fn selection(&self) -> &[usize] { &self.selection }
}

impl<'a> TupleStore for FilteredTupleStore<'a> {
    fn tuple_length(&self) -> usize { self.backing.tuple_length() }

    fn tuple_count(&self) -> usize { self.selection.len() }

    fn get_tuple(&self, row: usize, buffer: &mut [f64]) {
        self.backing.get_tuple(self.selection[row], buffer);
    }
}
