//! G-means clustering: discovers the cluster count by normality testing.

use std::collections::VecDeque;

use log::debug;

use tuplekit_data::{FilteredTupleStore, TupleStore, TupleStoreMut, VecTupleStore};
use tuplekit_statistics::{dot, is_gaussian, ColumnStatistics, DEFAULT_CRITICAL_VALUE};
use tuplekit_tasks::{run_detached, TaskContext};

use crate::cluster::Cluster;
use crate::errors::ClusteringError;
use crate::kmeans::{KMeansConfig, KMeansEngine};
use crate::metric::{euclidean_metric, DistanceFn};
use crate::seeding::PreassignedSeeder;

/// Tunable parameters of a G-means run.
#[derive(Clone, Debug)]
pub struct GMeansConfig {
    /// The adjusted Anderson-Darling threshold above which a projection is
    /// considered non-normal and the cluster is split
    pub critical_value: f64,
    /// Clusters smaller than this are emitted without a split attempt
    pub min_cluster_size: usize,
    /// Stop splitting once this many clusters exist; `None` keeps splitting
    /// until every cluster looks normal
    pub max_clusters: Option<usize>,
    /// Settings inherited by the inner two-center refinement passes; the
    /// controller overrides the cluster count, the seeding, the thread count
    /// and the convergence fields itself
    pub kmeans: KMeansConfig,
}

impl Default for GMeansConfig {
    fn default() -> GMeansConfig {
        GMeansConfig {
            critical_value: DEFAULT_CRITICAL_VALUE,
            min_cluster_size: 8,
            max_clusters: None,
            kmeans: KMeansConfig::new(2),
        }
    }
}

/// Provides the G-means clustering algorithm.
///
/// G-means decides the number of clusters on its own. It starts from a single
/// cluster spanning the whole data set and keeps a FIFO queue of candidates:
/// each candidate is tentatively split in two by a k-means pass seeded on the
/// principal spread of its members, and the members are projected onto the
/// axis between the two trial centers. When the projected sample looks normal
/// (Anderson-Darling), the candidate was one cluster after all and is emitted;
/// otherwise the two halves go back on the queue.
///
/// Runs are deterministic: given identical data and configuration the
/// controller emits identical clusters in identical order.
///
/// # Examples
/// ```rust
/// use tuplekit_data::VecTupleStore;
/// use tuplekit_clustering::{GMeansConfig, GMeansController};
/// let store = VecTupleStore::from_rows(vec![
///     vec![0.0], vec![0.1], vec![0.2], vec![9.0], vec![9.1], vec![9.2],
/// ]).unwrap();
/// let mut config = GMeansConfig::default();
/// config.min_cluster_size = 2;
/// // --- six rows are too few for the normality test, so they stay together
/// let clusters = GMeansController::new(config).cluster(&store).unwrap();
/// assert_eq!(clusters.len(), 1);
/// ```
pub struct GMeansController {
    config: GMeansConfig,
    metric: DistanceFn,
}

impl GMeansController {
    /// Creates a controller with the Euclidean metric
    pub fn new(config: GMeansConfig) -> GMeansController {
        GMeansController { config, metric: euclidean_metric() }
    }

    /// Replaces the distance metric, for the inner passes included
    pub fn with_metric(mut self, metric: DistanceFn) -> GMeansController {
        self.metric = metric;
        self
    }

    /// Runs the controller inside a task, observing its checkpoints at every
    /// queue step and reporting progress through `context`
    pub fn run(&self, tuples: &(dyn TupleStore + Sync), context: &TaskContext)
            -> Result<Vec<Cluster>, ClusteringError> {
        let n = tuples.tuple_count();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut queue: VecDeque<Cluster> = VecDeque::new();
        queue.push_back(Cluster::from_members(tuples, (0..n).collect()));

        // a split needs at least one row per child
        let min_size = self.config.min_cluster_size.max(2);
        let mut finished: Vec<Cluster> = Vec::new();
        while let Some(cluster) = queue.pop_front() {
            context.checkpoint()?;
            let total = finished.len() + queue.len() + 1;
            context.set_progress(finished.len() as f64 / total as f64);

            let splittable = cluster.size() >= min_size
                && self.config.max_clusters.map_or(true, |max| total < max);
            if !splittable {
                finished.push(cluster);
                continue;
            }

            match self.propose_split(tuples, &cluster, context)? {
                Some((left, right)) => {
                    context.post_message(&format!(
                        "cluster of {} rows split into {} + {}", cluster.size(), left.size(), right.size()
                    ));
                    queue.push_back(left);
                    queue.push_back(right);
                }
                None => {
                    context.post_message(&format!("cluster of {} rows accepted", cluster.size()));
                    finished.push(cluster);
                }
            }
        }
        debug!("g-means finished with {} clusters", finished.len());
        Ok(finished)
    }

    /// Runs the controller synchronously, outside any task
    pub fn cluster(&self, tuples: &(dyn TupleStore + Sync)) -> Result<Vec<Cluster>, ClusteringError> {
        run_detached(|context| self.run(tuples, context))
    }

    /// Splits `cluster` in two tentatively and accepts the split when the
    /// members, projected onto the axis between the two child centers, do not
    /// look normally distributed.
    ///
    /// Returns the children under original row indices, or `None` when the
    /// cluster should stay whole.
    fn propose_split(&self, tuples: &(dyn TupleStore + Sync), cluster: &Cluster, context: &TaskContext)
            -> Result<Option<(Cluster, Cluster)>, ClusteringError> {
        let dim = tuples.tuple_length();

        // --- trial centers one standard deviation away from the mean, on
        // --- either side along every column
        let mut stats = ColumnStatistics::new(dim);
        let mut buffer = vec![0.0; dim];
        for &row in cluster.members() {
            tuples.get_tuple(row, &mut buffer);
            stats.accumulate(&buffer);
        }
        let mean = stats.avg();
        let sdev = stats.sdev_population();
        let mut seeds = VecTupleStore::new(dim, 2);
        let lower: Vec<f64> = mean.iter().zip(&sdev).map(|(m, s)| m - s).collect();
        let upper: Vec<f64> = mean.iter().zip(&sdev).map(|(m, s)| m + s).collect();
        seeds.set_tuple(0, &lower);
        seeds.set_tuple(1, &upper);

        let view = FilteredTupleStore::new(tuples, cluster.members().to_vec())?;
        let mut inner_config = self.config.kmeans.clone();
        inner_config.cluster_count = 2;
        inner_config.worker_threads = 1;
        inner_config.max_iterations = None;
        inner_config.moves_goal = 0;
        let engine = KMeansEngine::new(inner_config)
            .with_metric(self.metric.clone())
            .with_seeder(Box::new(PreassignedSeeder::new(seeds)));
        let children = engine.run_silent(&view, context)?;

        if children.iter().any(|child| child.is_empty()) {
            return Ok(None);
        }

        // --- project every member onto the axis between the child centers and
        // --- test the projections for normality
        let axis: Vec<f64> = children[0].centroid().iter()
            .zip(children[1].centroid())
            .map(|(a, b)| a - b)
            .collect();
        let mut projected = Vec::with_capacity(cluster.size());
        for &row in cluster.members() {
            tuples.get_tuple(row, &mut buffer);
            projected.push(dot(&buffer, &axis));
        }
        if is_gaussian(&projected, self.config.critical_value) {
            return Ok(None);
        }

        let left = reindex(&children[0], &view);
        let right = reindex(&children[1], &view);
        Ok(Some((left, right)))
    }
}

/// Translates a child cluster from view-local row indices back to the indices
/// of the backing store.
fn reindex(child: &Cluster, view: &FilteredTupleStore) -> Cluster {
    let members = child.members().iter().map(|&local| view.local_to_original(local)).collect();
    Cluster::new(members, child.centroid().to_vec())
}
