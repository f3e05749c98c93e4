//! K-means clustering: iterative refinement of a fixed number of clusters.

use std::num::NonZeroUsize;
use std::thread;

use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use tuplekit_data::TupleStore;
use tuplekit_tasks::{run_detached, TaskContext};

use crate::cluster::Cluster;
use crate::errors::ClusteringError;
use crate::metric::{euclidean_metric, DistanceFn};
use crate::seeding::{KMeansPlusPlusSeeder, Seeder};

/// Tunable parameters of a k-means pass.
///
/// Only the cluster count is required; every other field has a usable default.
#[derive(Clone, Debug)]
pub struct KMeansConfig {
    /// The number of clusters to be created
    pub cluster_count: usize,
    /// Stop after this many refinement iterations; `None` iterates to a fixed point
    pub max_iterations: Option<usize>,
    /// Converge early once fewer than this many rows changed clusters in an iteration
    pub moves_goal: usize,
    /// How many threads share the assignment step
    pub worker_threads: usize,
    /// Re-seat the center of a cluster that lost all members instead of leaving it empty
    pub replace_empty_clusters: bool,
    /// Seeds the random generator, making the run reproducible
    pub rng_seed: Option<u64>,
}

impl KMeansConfig {
    /// A configuration with defaults for everything but the cluster count
    pub fn new(cluster_count: usize) -> KMeansConfig {
        KMeansConfig {
            cluster_count,
            max_iterations: None,
            moves_goal: 0,
            worker_threads: thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1),
            replace_empty_clusters: false,
            rng_seed: None,
        }
    }
}

/// Provides the k-means clustering algorithm.
///
/// K-means partitions a set of unlabeled rows into clusters, where each row
/// belongs to the cluster with the nearest center. Starting from seeded
/// centers, the engine alternates recomputing each center as the mean of its
/// members with reassigning every row to its nearest center, until an
/// iteration moves no row (or few enough, see
/// [`moves_goal`](KMeansConfig::moves_goal)). Since the result depends on the
/// seeding, it's advised to either seed with
/// [`KMeansPlusPlusSeeder`](crate::KMeansPlusPlusSeeder) (the default) or
/// repeat the procedure and keep the best partition.
///
/// The assignment step is shared by
/// [`worker_threads`](KMeansConfig::worker_threads) over disjoint row ranges;
/// the result does not depend on the thread count.
///
/// # Examples
/// ```rust
/// use tuplekit_data::VecTupleStore;
/// use tuplekit_clustering::{KMeansConfig, KMeansEngine};
/// let store = VecTupleStore::from_rows(vec![
///     vec![0.0, 0.0], vec![0.0, 1.0], vec![10.0, 0.0], vec![10.0, 1.0],
/// ]).unwrap();
/// let mut config = KMeansConfig::new(2);
/// config.rng_seed = Some(0);
/// let clusters = KMeansEngine::new(config).cluster(&store).unwrap();
/// assert_eq!(clusters.len(), 2);
/// ```
pub struct KMeansEngine {
    config: KMeansConfig,
    metric: DistanceFn,
    seeder: Option<Box<dyn Seeder>>,
}

impl KMeansEngine {
    /// Creates an engine with the Euclidean metric and k-means++ seeding
    pub fn new(config: KMeansConfig) -> KMeansEngine {
        KMeansEngine { config, metric: euclidean_metric(), seeder: None }
    }

    /// Replaces the distance metric
    pub fn with_metric(mut self, metric: DistanceFn) -> KMeansEngine {
        self.metric = metric;
        self
    }

    /// Replaces the seeding strategy
    pub fn with_seeder(mut self, seeder: Box<dyn Seeder>) -> KMeansEngine {
        self.seeder = Some(seeder);
        self
    }

    /// Runs the pass inside a task, observing its checkpoints and reporting
    /// progress and per-iteration messages through `context`
    pub fn run(&self, tuples: &(dyn TupleStore + Sync), context: &TaskContext)
            -> Result<Vec<Cluster>, ClusteringError> {
        self.run_pass(tuples, context, true)
    }

    /// As [`run()`](KMeansEngine::run), but without progress and message
    /// reports - for embedding in an outer algorithm that reports its own
    pub fn run_silent(&self, tuples: &(dyn TupleStore + Sync), context: &TaskContext)
            -> Result<Vec<Cluster>, ClusteringError> {
        self.run_pass(tuples, context, false)
    }

    /// Runs the pass synchronously, outside any task
    pub fn cluster(&self, tuples: &(dyn TupleStore + Sync)) -> Result<Vec<Cluster>, ClusteringError> {
        run_detached(|context| self.run_pass(tuples, context, false))
    }

    fn run_pass(&self, tuples: &(dyn TupleStore + Sync), context: &TaskContext, report: bool)
            -> Result<Vec<Cluster>, ClusteringError> {
        let n = tuples.tuple_count();
        let dim = tuples.tuple_length();
        let k = self.config.cluster_count;
        if k == 0 {
            return Err(ClusteringError::invalid("at least one cluster is required"));
        }
        if k > n {
            return Err(ClusteringError::invalid(format!("{k} clusters requested from {n} rows")));
        }

        // --- every coordinate must be finite, or no distance is meaningful
        let mut buffer = vec![0.0; dim];
        for row in 0..n {
            tuples.get_tuple(row, &mut buffer);
            if buffer.iter().any(|v| !v.is_finite()) {
                return Err(ClusteringError::NonFiniteValue { row });
            }
        }

        let mut rng = match self.config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let default_seeder;
        let seeder: &dyn Seeder = match &self.seeder {
            Some(seeder) => seeder.as_ref(),
            None => {
                default_seeder = KMeansPlusPlusSeeder::new(self.metric.clone());
                &default_seeder
            }
        };
        let seeds = seeder.seed(tuples, k, &mut rng)?;
        if seeds.tuple_length() != dim {
            return Err(ClusteringError::invalid(format!(
                "seed tuples have length {} while the data has length {}", seeds.tuple_length(), dim
            )));
        }
        if seeds.tuple_count() != k {
            return Err(ClusteringError::invalid(format!(
                "the seeder produced {} centers where {} were requested", seeds.tuple_count(), k
            )));
        }
        let mut centers: Vec<Vec<f64>> = (0..k).map(|c| seeds.tuple(c)).collect();

        // --- initial assignment: every row moves to its nearest seeded center
        let mut assignment = vec![usize::MAX; n];
        let mut pass = self.assignment_pass(tuples, &centers, &mut assignment);
        debug_assert_eq!(pass.moves, n);

        let mut iteration = 0;
        loop {
            context.checkpoint()?;
            // --- a fixed point moves nothing; moves_goal lets a caller stop earlier
            if pass.moves == 0 || pass.moves < self.config.moves_goal { break; }
            if let Some(max) = self.config.max_iterations {
                if iteration >= max { break; }
            }

            self.recompute_centers(tuples, &assignment, &pass, &mut centers);
            pass = self.assignment_pass(tuples, &centers, &mut assignment);
            iteration += 1;

            if report {
                // --- the slower of the two signals drives the bar: the iteration
                // --- budget, and how close the pass is to a fixed point
                let convergence = (n - pass.moves) as f64 / n as f64;
                let fraction = match self.config.max_iterations {
                    Some(max) => convergence.min(iteration as f64 / max as f64),
                    None => convergence,
                };
                context.set_progress(fraction);
                context.post_message(&format!("iteration {}: {} rows changed clusters", iteration, pass.moves));
            }
        }
        debug!("k-means pass converged after {} iterations, {} moves in the last one", iteration, pass.moves);

        // --- emit the final partition; a cluster that lost all members keeps
        // --- the center it was last assigned
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (row, &cluster) in assignment.iter().enumerate() {
            members[cluster].push(row);
        }
        let clusters = members.into_iter().enumerate().map(|(c, rows)| {
            let centroid = if rows.is_empty() {
                centers[c].clone()
            } else {
                let count = pass.counts[c] as f64;
                pass.sums[c].iter().map(|s| s / count).collect()
            };
            Cluster::new(rows, centroid)
        }).collect();
        Ok(clusters)
    }

    /// Assigns every row to its nearest center, counting how many rows changed
    /// cluster and reducing per-cluster sums for the next center update.
    ///
    /// The rows are partitioned into contiguous ranges, one per worker; each
    /// worker keeps its own scratch buffer and partial sums, merged after the
    /// barrier. Ties between equidistant centers go to the lowest center index.
    fn assignment_pass(&self, tuples: &(dyn TupleStore + Sync), centers: &[Vec<f64>],
                       assignment: &mut [usize]) -> PassResult {
        let n = assignment.len();
        let dim = tuples.tuple_length();
        let k = centers.len();
        let workers = self.config.worker_threads.max(1).min(n.max(1));
        let chunk = n.div_ceil(workers);

        let metric: &(dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync) = self.metric.as_ref();
        let mut partials: Vec<PassResult> = Vec::with_capacity(workers);
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for (index, rows) in assignment.chunks_mut(chunk).enumerate() {
                let first_row = index * chunk;
                handles.push(scope.spawn(move || {
                    let mut partial = PassResult::new(k, dim);
                    let mut buffer = vec![0.0; dim];
                    let mut distances = vec![0.0; k];
                    for (offset, assigned) in rows.iter_mut().enumerate() {
                        let row = first_row + offset;
                        tuples.get_tuple(row, &mut buffer);
                        for (c, center) in centers.iter().enumerate() {
                            distances[c] = metric(center, &buffer);
                        }
                        let mut nearest = 0;
                        for c in 1..k {
                            if distances[c] < distances[nearest] { nearest = c; }
                        }
                        if *assigned != nearest {
                            partial.moves += 1;
                            *assigned = nearest;
                        }
                        partial.counts[nearest] += 1;
                        for d in 0..dim { partial.sums[nearest][d] += buffer[d]; }
                    }
                    partial
                }));
            }
            for handle in handles {
                match handle.join() {
                    Ok(partial) => partials.push(partial),
                    Err(payload) => std::panic::resume_unwind(payload),
                }
            }
        });

        let mut merged = PassResult::new(k, dim);
        for partial in partials {
            merged.moves += partial.moves;
            for c in 0..k {
                merged.counts[c] += partial.counts[c];
                for d in 0..dim { merged.sums[c][d] += partial.sums[c][d]; }
            }
        }
        merged
    }

    /// Moves each center to the mean of its members; a cluster without members
    /// either keeps its center or, with
    /// [`replace_empty_clusters`](KMeansConfig::replace_empty_clusters), is
    /// re-seated on the row farthest from its currently assigned center.
    fn recompute_centers(&self, tuples: &(dyn TupleStore + Sync), assignment: &[usize],
                         pass: &PassResult, centers: &mut [Vec<f64>]) {
        let dim = tuples.tuple_length();
        for (c, center) in centers.iter_mut().enumerate() {
            if pass.counts[c] == 0 { continue; }
            let count = pass.counts[c] as f64;
            for d in 0..dim { center[d] = pass.sums[c][d] / count; }
        }

        if !self.config.replace_empty_clusters { return; }
        let empty: Vec<usize> = (0..centers.len()).filter(|&c| pass.counts[c] == 0).collect();
        if empty.is_empty() { return; }

        // --- distance of every row to its assigned center; each empty cluster
        // --- in turn takes the farthest row still available
        let metric = self.metric.as_ref();
        let mut buffer = vec![0.0; dim];
        let mut distances: Vec<f64> = (0..assignment.len()).map(|row| {
            tuples.get_tuple(row, &mut buffer);
            metric(&centers[assignment[row]], &buffer)
        }).collect();
        for c in empty {
            let mut farthest = 0;
            for row in 1..distances.len() {
                if distances[row] > distances[farthest] { farthest = row; }
            }
            tuples.get_tuple(farthest, &mut centers[c]);
            distances[farthest] = f64::MIN;
            debug!("empty cluster {} re-seated on row {}", c, farthest);
        }
    }
}

/// What one assignment sweep produced: the move count and per-cluster
/// reductions for the following center update.
struct PassResult {
    moves: usize,
    counts: Vec<usize>,
    sums: Vec<Vec<f64>>,
}

impl PassResult {
    fn new(k: usize, dim: usize) -> PassResult {
        PassResult { moves: 0, counts: vec![0; k], sums: vec![vec![0.0; dim]; k] }
    }
}
