use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use tuplekit_clustering::{GMeansConfig, GMeansController};
use tuplekit_data::{TupleStore, VecTupleStore};

/// Appends `count` samples of an isotropic Gaussian blob around `center`.
fn add_blob(store: &mut VecTupleStore, center: &[f64], sdev: f64, count: usize, rng: &mut SmallRng) {
    let normal = Normal::new(0.0, sdev).unwrap();
    let mut row = vec![0.0; center.len()];
    for _ in 0..count {
        for (value, mu) in row.iter_mut().zip(center) {
            *value = mu + normal.sample(rng);
        }
        store.push_tuple(&row);
    }
}

#[test]
fn test_single_gaussian_stays_whole() {
    let mut rng = SmallRng::seed_from_u64(0);
    let mut store = VecTupleStore::new(3, 0);
    add_blob(&mut store, &[0.0, 0.0, 0.0], 1.0, 1000, &mut rng);

    let clusters = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].size(), 1000);
}

#[test]
fn test_two_gaussians_are_separated() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut store = VecTupleStore::new(2, 0);
    add_blob(&mut store, &[-5.0, 0.0], 1.0, 500, &mut rng);
    add_blob(&mut store, &[5.0, 0.0], 1.0, 500, &mut rng);

    let clusters = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    assert_eq!(clusters.len(), 2);

    // --- rows 0..500 were drawn around -5, the rest around +5; allow 1% of
    // --- the rows to land on the wrong side
    let mislabeled: usize = clusters.iter().map(|cluster| {
        let left = cluster.members().iter().filter(|&&row| row < 500).count();
        let right = cluster.size() - left;
        left.min(right)
    }).sum();
    assert!(mislabeled <= 10, "{} rows mislabeled", mislabeled);
}

#[test]
fn test_four_well_separated_blobs() {
    let mut rng = SmallRng::seed_from_u64(2);
    let mut store = VecTupleStore::new(2, 0);
    for center in [[-8.0, -8.0], [-8.0, 8.0], [8.0, -8.0], [8.0, 8.0]] {
        add_blob(&mut store, &center, 1.0, 250, &mut rng);
    }

    let clusters = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    assert_eq!(clusters.len(), 4);
}

#[test]
fn test_partition_is_complete() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut store = VecTupleStore::new(2, 0);
    add_blob(&mut store, &[-4.0, 0.0], 1.0, 300, &mut rng);
    add_blob(&mut store, &[4.0, 0.0], 1.0, 300, &mut rng);

    let clusters = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    let mut all: Vec<usize> = clusters.iter().flat_map(|c| c.members().to_vec()).collect();
    all.sort_unstable();
    let expected: Vec<usize> = (0..600).collect();
    assert_eq!(all, expected);

    // --- each emitted centroid is the mean of its members
    for cluster in &clusters {
        let mut mean = vec![0.0; 2];
        for &row in cluster.members() {
            for (m, v) in mean.iter_mut().zip(store.tuple(row)) { *m += v; }
        }
        for m in mean.iter_mut() { *m /= cluster.size() as f64; }
        for (computed, kept) in mean.iter().zip(cluster.centroid()) {
            assert!((computed - kept).abs() <= 1e-9 * kept.abs().max(1.0));
        }
    }
}

#[test]
fn test_min_cluster_size_blocks_splitting() {
    let mut rng = SmallRng::seed_from_u64(4);
    let mut store = VecTupleStore::new(1, 0);
    add_blob(&mut store, &[-10.0], 0.5, 20, &mut rng);
    add_blob(&mut store, &[10.0], 0.5, 20, &mut rng);

    let mut config = GMeansConfig::default();
    config.min_cluster_size = 50;
    let clusters = GMeansController::new(config).cluster(&store).unwrap();
    assert_eq!(clusters.len(), 1);
}

#[test]
fn test_max_clusters_caps_the_partition() {
    let mut rng = SmallRng::seed_from_u64(5);
    let mut store = VecTupleStore::new(2, 0);
    add_blob(&mut store, &[-6.0, 0.0], 1.0, 200, &mut rng);
    add_blob(&mut store, &[0.0, 6.0], 1.0, 200, &mut rng);
    add_blob(&mut store, &[6.0, 0.0], 1.0, 200, &mut rng);

    let mut config = GMeansConfig::default();
    config.max_clusters = Some(2);
    let clusters = GMeansController::new(config).cluster(&store).unwrap();
    assert!(clusters.len() <= 2);

    config = GMeansConfig::default();
    config.max_clusters = Some(1);
    let clusters = GMeansController::new(config).cluster(&store).unwrap();
    assert_eq!(clusters.len(), 1);
}

#[test]
fn test_runs_are_deterministic() {
    let mut rng = SmallRng::seed_from_u64(6);
    let mut store = VecTupleStore::new(2, 0);
    add_blob(&mut store, &[-5.0, -5.0], 1.0, 400, &mut rng);
    add_blob(&mut store, &[5.0, 5.0], 1.0, 400, &mut rng);

    let first = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    let second = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_input_yields_no_clusters() {
    let store = VecTupleStore::new(2, 0);
    let clusters = GMeansController::new(GMeansConfig::default()).cluster(&store).unwrap();
    assert!(clusters.is_empty());
}
