use tuplekit_data::TupleStore;
use tuplekit_statistics::ColumnStatistics;

/// A group of rows together with its centroid.
///
/// A cluster is a value: once created it never changes. Member indices refer to
/// rows of the store the cluster was computed from; they are kept sorted and
/// unique. The centroid is the elementwise arithmetic mean of the members at
/// the moment of construction - or, for a cluster that lost all its members,
/// the last center it was assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    members: Vec<usize>,
    centroid: Vec<f64>,
}

impl Cluster {
    /// Creates a cluster from member row indices and a precomputed centroid.
    ///
    /// The indices are sorted and deduplicated.
    pub fn new(mut members: Vec<usize>, centroid: Vec<f64>) -> Cluster {
        members.sort_unstable();
        members.dedup();
        Cluster { members, centroid }
    }

    /// Creates a cluster over `members`, computing the centroid from the store
    ///
    /// # Examples
    /// ```rust
    /// use tuplekit_data::VecTupleStore;
    /// use tuplekit_clustering::Cluster;
    /// let store = VecTupleStore::from_rows(vec![vec![0.0, 0.0], vec![2.0, 4.0]]).unwrap();
    /// let cluster = Cluster::from_members(&store, vec![0, 1]);
    /// assert_eq!(cluster.centroid(), &[1.0, 2.0]);
    /// ```
    pub fn from_members(tuples: &dyn TupleStore, members: Vec<usize>) -> Cluster {
        let dim = tuples.tuple_length();
        let mut stats = ColumnStatistics::new(dim);
        let mut buffer = vec![0.0; dim];
        for &row in &members {
            tuples.get_tuple(row, &mut buffer);
            stats.accumulate(&buffer);
        }
        let centroid = if members.is_empty() { vec![0.0; dim] } else { stats.avg().clone() };
        Cluster::new(members, centroid)
    }

    /// Returns the member row indices, sorted ascending
    pub fn members(&self) -> &[usize] { &self.members }

    /// Returns the centroid of this cluster
    pub fn centroid(&self) -> &[f64] { &self.centroid }

    /// Returns the number of members
    pub fn size(&self) -> usize { self.members.len() }

    /// Says whether the cluster has no members
    pub fn is_empty(&self) -> bool { self.members.is_empty() }
}

/// Per-column mean and variance over the members of a cluster.
///
/// Returns one `[mean, variance]` pair per column; the variance is the
/// population variance (denominator `n`). An empty cluster yields all zeros.
///
/// # Examples
/// ```rust
/// use tuplekit_data::VecTupleStore;
/// use tuplekit_clustering::{mean_and_variance, Cluster};
/// let store = VecTupleStore::from_rows(vec![vec![0.0], vec![2.0], vec![4.0]]).unwrap();
/// let cluster = Cluster::from_members(&store, vec![0, 1, 2]);
/// let stats = mean_and_variance(&store, &cluster);
/// assert_eq!(stats[0], [2.0, 8.0 / 3.0]);
/// ```
pub fn mean_and_variance(tuples: &dyn TupleStore, cluster: &Cluster) -> Vec<[f64; 2]> {
    let dim = tuples.tuple_length();
    if cluster.is_empty() {
        return vec![[0.0, 0.0]; dim];
    }
    let mut stats = ColumnStatistics::new(dim);
    let mut buffer = vec![0.0; dim];
    for &row in cluster.members() {
        tuples.get_tuple(row, &mut buffer);
        stats.accumulate(&buffer);
    }
    let variance = stats.var_population();
    stats.avg().iter().zip(variance).map(|(&m, v)| [m, v]).collect()
}
