//! Clustering of fixed-length numeric tuples.
//!
//! The `tuplekit` crate is an umbrella over the member crates of this
//! workspace; it re-exports their public APIs so applications can depend on
//! a single crate:
//!
//!  - [`tuplekit_data`] - tuple stores, filtered views and the named-store factory
//!  - [`tuplekit_io`] - reading and writing tuple data in CSV/TSV formats
//!  - [`tuplekit_statistics`] - descriptive statistics and the Anderson-Darling test
//!  - [`tuplekit_tasks`] - cancellable, pausable long-running tasks
//!  - [`tuplekit_clustering`] - seeding, the k-means engine and the G-means controller

pub use tuplekit_clustering;
pub use tuplekit_data;
pub use tuplekit_io;
pub use tuplekit_statistics;
pub use tuplekit_tasks;
