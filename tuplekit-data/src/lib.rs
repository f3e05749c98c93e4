//! Data structures holding tuples - the fixed-length numeric vectors subjected to clustering.
//!
//! A [`TupleStore`](TupleStore) provides random access to rows of identical length;
//! a [`FilteredTupleStore`](FilteredTupleStore) narrows a store to a subset of its rows
//! without copying them. Named stores are managed by a [`TupleListFactory`](TupleListFactory).

mod tuple_store;
mod factory;
pub mod errors;

// re-export symbols to the top-most level of the module's name space
pub use tuple_store::{TupleStore, TupleStoreMut, VecTupleStore, FilteredTupleStore};
pub use factory::{TupleListFactory, InMemoryTupleListFactory, SharedTupleStore};
