//! Partitions numeric tuples into groups of mutually similar rows.
//!
//! The crate provides two cooperating engines. [`KMeansEngine`](KMeansEngine)
//! runs a single k-means refinement pass for a caller-chosen cluster count;
//! [`GMeansController`](GMeansController) discovers the cluster count itself by
//! recursively splitting clusters whose one-dimensional projection onto the
//! axis between two trial sub-centers fails a normality test.
//!
//! Both engines cooperate with the task framework: they poll for cancellation
//! and pausing at iteration boundaries and report progress, so a run wrapped
//! with [`kmeans_task()`](kmeans_task) or [`gmeans_task()`](gmeans_task) can be
//! controlled from another thread while it grinds through a large data set.

// functions and types used by more than one clustering approach
mod cluster;
mod metric;
mod seeding;

// each clustering method is placed in its own module
pub mod kmeans;
pub mod gmeans;

mod runners;
pub mod errors;

// re-export symbols to the top-most level of the module's name space
pub use cluster::{mean_and_variance, Cluster};
pub use gmeans::{GMeansConfig, GMeansController};
pub use kmeans::{KMeansConfig, KMeansEngine};
pub use metric::{euclidean_metric, DistanceFn};
pub use runners::{gmeans_task, kmeans_task};
pub use seeding::{KMeansPlusPlusSeeder, PreassignedSeeder, RandomSeeder, Seeder};
