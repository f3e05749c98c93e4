use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::errors::StorageError;
use crate::tuple_store::{TupleStore, VecTupleStore};

/// A handle under which factory-managed stores are shared with running tasks.
pub type SharedTupleStore = Arc<RwLock<VecTupleStore>>;

/// Keeps tuple stores under user-provided names.
///
/// A factory owns the persistence of its stores; the clustering engines never
/// see anything but the [`TupleStore`](crate::TupleStore) handles it gives out.
/// Which backend a factory talks to (memory, files, a database) is an
/// implementation detail.
pub trait TupleListFactory {
    /// Creates a store of `count` zero-filled tuples of length `dim` under `name`
    ///
    /// Fails with [`StorageError::NameCollision`](StorageError::NameCollision) when
    /// the name is already taken.
    fn create_new(&mut self, name: &str, dim: usize, count: usize) -> Result<SharedTupleStore, StorageError>;

    /// Opens the store kept under `name`, loading it if necessary
    fn open_existing(&mut self, name: &str) -> Result<SharedTupleStore, StorageError>;

    /// Duplicates the store named `source_name` under `new_name` and opens the copy
    fn copy(&mut self, new_name: &str, source_name: &str) -> Result<SharedTupleStore, StorageError>;

    /// Closes the open handle for `name`; the data itself is retained
    fn close(&mut self, name: &str) -> Result<(), StorageError>;

    /// Removes the store named `name` entirely
    fn delete(&mut self, name: &str) -> Result<(), StorageError>;

    /// Closes every open handle
    fn close_all(&mut self);

    /// Lists the names of all stores this factory knows, open or not
    fn names(&self) -> Vec<String>;

    /// Says whether a store exists under `name`
    fn has_name(&self, name: &str) -> bool;
}

struct Entry {
    store: SharedTupleStore,
    open: bool,
}

/// The default [`TupleListFactory`](TupleListFactory): stores live on the heap
/// and vanish with the factory.
///
/// # Examples
/// ```rust
/// use tuplekit_data::{InMemoryTupleListFactory, TupleListFactory, TupleStore};
/// let mut factory = InMemoryTupleListFactory::new();
/// factory.create_new("iris", 4, 150).unwrap();
/// assert!(factory.has_name("iris"));
/// let handle = factory.open_existing("iris").unwrap();
/// assert_eq!(handle.read().unwrap().tuple_count(), 150);
/// ```
pub struct InMemoryTupleListFactory {
    entries: HashMap<String, Entry>,
}

impl InMemoryTupleListFactory {
    pub fn new() -> InMemoryTupleListFactory {
        InMemoryTupleListFactory { entries: HashMap::new() }
    }

    /// Registers an already-built store under `name` and opens it
    pub fn insert(&mut self, name: &str, store: VecTupleStore) -> Result<SharedTupleStore, StorageError> {
        if self.entries.contains_key(name) {
            return Err(StorageError::NameCollision { name: name.to_string() });
        }
        let handle = Arc::new(RwLock::new(store));
        self.entries.insert(name.to_string(), Entry { store: handle.clone(), open: true });
        Ok(handle)
    }
}

impl Default for InMemoryTupleListFactory {
    fn default() -> Self { Self::new() }
}

impl TupleListFactory for InMemoryTupleListFactory {
    fn create_new(&mut self, name: &str, dim: usize, count: usize) -> Result<SharedTupleStore, StorageError> {
        debug!("creating tuple store '{}': {} rows of length {}", name, count, dim);
        self.insert(name, VecTupleStore::new(dim, count))
    }

    fn open_existing(&mut self, name: &str) -> Result<SharedTupleStore, StorageError> {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.open = true;
                Ok(entry.store.clone())
            }
            None => Err(StorageError::NotFound { name: name.to_string() }),
        }
    }

    fn copy(&mut self, new_name: &str, source_name: &str) -> Result<SharedTupleStore, StorageError> {
        if self.entries.contains_key(new_name) {
            return Err(StorageError::NameCollision { name: new_name.to_string() });
        }
        let source = match self.entries.get(source_name) {
            Some(entry) => entry.store.clone(),
            None => return Err(StorageError::NotFound { name: source_name.to_string() }),
        };
        let duplicate = source.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone();
        self.insert(new_name, duplicate)
    }

    fn close(&mut self, name: &str) -> Result<(), StorageError> {
        match self.entries.get_mut(name) {
            Some(entry) if entry.open => {
                entry.open = false;
                Ok(())
            }
            Some(_) => Err(StorageError::NotOpen { name: name.to_string() }),
            None => Err(StorageError::NotFound { name: name.to_string() }),
        }
    }

    fn delete(&mut self, name: &str) -> Result<(), StorageError> {
        match self.entries.remove(name) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound { name: name.to_string() }),
        }
    }

    fn close_all(&mut self) {
        for entry in self.entries.values_mut() { entry.open = false; }
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    fn has_name(&self, name: &str) -> bool { self.entries.contains_key(name) }
}
