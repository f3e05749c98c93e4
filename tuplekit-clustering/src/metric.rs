use std::sync::Arc;

use tuplekit_statistics::euclidean_distance;

/// A pluggable distance over tuples of equal length.
///
/// A metric must be symmetric, non-negative and total over finite inputs; the
/// engines share it across worker threads.
pub type DistanceFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// The default metric: Euclidean distance.
pub fn euclidean_metric() -> DistanceFn {
    Arc::new(|a: &[f64], b: &[f64]| euclidean_distance(a, b))
}
