//! Strategies choosing the initial cluster centers.

use rand::rngs::SmallRng;
use rand::seq::index::sample;
use rand::Rng;

use tuplekit_data::{TupleStore, VecTupleStore};

use crate::errors::ClusteringError;
use crate::metric::DistanceFn;

/// Produces `k` initial centers from a data set.
pub trait Seeder: Send + Sync {
    /// Returns a store of `k` rows, each an initial center for one cluster
    fn seed(&self, tuples: &(dyn TupleStore + Sync), k: usize, rng: &mut SmallRng)
        -> Result<VecTupleStore, ClusteringError>;
}

fn check_request(tuples: &(dyn TupleStore + Sync), k: usize) -> Result<(), ClusteringError> {
    if k == 0 {
        return Err(ClusteringError::invalid("at least one cluster center is required"));
    }
    if k > tuples.tuple_count() {
        return Err(ClusteringError::invalid(format!(
            "{} centers requested from {} rows", k, tuples.tuple_count()
        )));
    }
    Ok(())
}

/// Selects `k` distinct rows uniformly, without replacement.
pub struct RandomSeeder;

impl Seeder for RandomSeeder {
    fn seed(&self, tuples: &(dyn TupleStore + Sync), k: usize, rng: &mut SmallRng)
            -> Result<VecTupleStore, ClusteringError> {
        check_request(tuples, k)?;
        let mut centers = VecTupleStore::new(tuples.tuple_length(), 0);
        for row in sample(rng, tuples.tuple_count(), k) {
            centers.push_tuple(&tuples.tuple(row));
        }
        Ok(centers)
    }
}

/// The k-means++ strategy: each next center is drawn with probability
/// proportional to the squared distance from the nearest center chosen so far.
///
/// Spreading the centers this way makes the subsequent refinement much less
/// sensitive to the draw than uniform selection. Ties are resolved towards the
/// lowest row index.
pub struct KMeansPlusPlusSeeder {
    metric: DistanceFn,
}

impl KMeansPlusPlusSeeder {
    pub fn new(metric: DistanceFn) -> KMeansPlusPlusSeeder {
        KMeansPlusPlusSeeder { metric }
    }
}

impl Seeder for KMeansPlusPlusSeeder {
    fn seed(&self, tuples: &(dyn TupleStore + Sync), k: usize, rng: &mut SmallRng)
            -> Result<VecTupleStore, ClusteringError> {
        check_request(tuples, k)?;
        let n = tuples.tuple_count();
        let dim = tuples.tuple_length();
        let mut centers = VecTupleStore::new(dim, 0);
        let mut chosen = vec![false; n];

        // ------ select the first cluster center randomly and push it to the list
        let first = rng.gen_range(0..n);
        chosen[first] = true;
        centers.push_tuple(&tuples.tuple(first));

        let mut buffer = vec![0.0; dim];
        let mut closest_sq = vec![f64::MAX; n];
        for _ in 1..k {
            // --- squared distance between each point and its nearest center so far;
            // --- only the freshly added center can lower it
            let newest = centers.row(centers.tuple_count() - 1).to_vec();
            let metric = self.metric.as_ref();
            let mut sum_d = 0.0;
            for i in 0..n {
                tuples.get_tuple(i, &mut buffer);
                let d = metric(&newest, &buffer);
                closest_sq[i] = closest_sq[i].min(d * d);
                if !chosen[i] { sum_d += closest_sq[i]; }
            }
            // ------ select the next center proportionally to D(x)^2
            let which = if sum_d > 0.0 {
                let w = rng.gen_range(0.0..sum_d);
                let mut cumulative = 0.0;
                let mut which = None;
                for i in 0..n {
                    if chosen[i] { continue; }
                    cumulative += closest_sq[i];
                    if cumulative > w {
                        which = Some(i);
                        break;
                    }
                }
                // --- rounding may leave the walk short of the last candidate
                which.unwrap_or_else(|| (0..n).rfind(|&i| !chosen[i]).unwrap_or(n - 1))
            } else {
                // --- every remaining row coincides with a center; take the lowest index
                match (0..n).find(|&i| !chosen[i]) {
                    Some(i) => i,
                    None => break,
                }
            };
            chosen[which] = true;
            centers.push_tuple(&tuples.tuple(which));
        }
        Ok(centers)
    }
}

/// Returns the centers the caller supplied, unchanged.
///
/// Used where the centers are dictated by an outer algorithm, such as the
/// trial sub-centers of a G-means split.
pub struct PreassignedSeeder {
    seeds: VecTupleStore,
}

impl PreassignedSeeder {
    pub fn new(seeds: VecTupleStore) -> PreassignedSeeder {
        PreassignedSeeder { seeds }
    }
}

impl Seeder for PreassignedSeeder {
    fn seed(&self, tuples: &(dyn TupleStore + Sync), k: usize, _rng: &mut SmallRng)
            -> Result<VecTupleStore, ClusteringError> {
        check_request(tuples, k)?;
        if self.seeds.tuple_count() != k {
            return Err(ClusteringError::invalid(format!(
                "{} centers requested but {} were preassigned", k, self.seeds.tuple_count()
            )));
        }
        if self.seeds.tuple_length() != tuples.tuple_length() {
            return Err(ClusteringError::invalid(format!(
                "preassigned centers have length {} while the data has length {}",
                self.seeds.tuple_length(), tuples.tuple_length()
            )));
        }
        Ok(self.seeds.clone())
    }
}
