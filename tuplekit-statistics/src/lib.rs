//! Statistical kernels for clustering calculations.
//!
//! The crate provides the numeric building blocks the clustering engines rest
//! on: distance and dot-product kernels, an online accumulator of per-column
//! statistics, and the Anderson-Darling normality test used by the G-means
//! split criterion.

mod descriptive;
mod kernels;
mod normality;

// re-export symbols to the top-most level of the module's name space
pub use descriptive::ColumnStatistics;
pub use kernels::{dot, euclidean_distance, euclidean_distance_squared};
pub use normality::{anderson_darling_statistic, is_gaussian, DEFAULT_CRITICAL_VALUE};
