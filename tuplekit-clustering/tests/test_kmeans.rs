use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tuplekit_clustering::errors::ClusteringError;
use tuplekit_clustering::{
    Cluster, KMeansConfig, KMeansEngine, KMeansPlusPlusSeeder, PreassignedSeeder, RandomSeeder,
    Seeder, euclidean_metric,
};
use tuplekit_data::{TupleStore, VecTupleStore};
use tuplekit_statistics::euclidean_distance_squared;

fn uniform_store(n: usize, dim: usize, seed: u64) -> VecTupleStore {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut store = VecTupleStore::new(dim, 0);
    let mut row = vec![0.0; dim];
    for _ in 0..n {
        for value in row.iter_mut() { *value = rng.gen_range(-10.0..10.0); }
        store.push_tuple(&row);
    }
    store
}

/// Within-cluster sum of squared distances of members to their centroid.
fn wcss(tuples: &VecTupleStore, clusters: &[Cluster]) -> f64 {
    let mut total = 0.0;
    for cluster in clusters {
        for &row in cluster.members() {
            total += euclidean_distance_squared(&tuples.tuple(row), cluster.centroid());
        }
    }
    total
}

fn preassigned(rows: Vec<Vec<f64>>) -> Box<PreassignedSeeder> {
    Box::new(PreassignedSeeder::new(VecTupleStore::from_rows(rows).unwrap()))
}

#[test]
fn test_two_well_separated_pairs() {
    let store = VecTupleStore::from_rows(vec![
        vec![0.0, 0.0], vec![0.0, 1.0], vec![10.0, 0.0], vec![10.0, 1.0],
    ]).unwrap();
    let engine = KMeansEngine::new(KMeansConfig::new(2))
        .with_seeder(preassigned(vec![vec![0.0, 0.0], vec![10.0, 0.0]]));
    let clusters = engine.cluster(&store).unwrap();

    assert_eq!(clusters[0].members(), &[0, 1]);
    assert_eq!(clusters[0].centroid(), &[0.0, 0.5]);
    assert_eq!(clusters[1].members(), &[2, 3]);
    assert_eq!(clusters[1].centroid(), &[10.0, 0.5]);
}

#[test]
fn test_empty_cluster_keeps_its_center() {
    let store = VecTupleStore::from_rows(vec![vec![0.0], vec![1.0], vec![2.0]]).unwrap();
    let engine = KMeansEngine::new(KMeansConfig::new(3))
        .with_seeder(preassigned(vec![vec![0.0], vec![5.0], vec![10.0]]));
    let clusters = engine.cluster(&store).unwrap();

    assert_eq!(clusters[0].members(), &[0, 1, 2]);
    assert_eq!(clusters[0].centroid(), &[1.0]);
    assert!(clusters[1].is_empty());
    assert_eq!(clusters[1].centroid(), &[5.0]);
    assert!(clusters[2].is_empty());
    assert_eq!(clusters[2].centroid(), &[10.0]);
}

#[test]
fn test_empty_cluster_is_reseated() {
    let store = VecTupleStore::from_rows(vec![vec![0.0], vec![1.0], vec![2.0]]).unwrap();
    let mut config = KMeansConfig::new(3);
    config.replace_empty_clusters = true;
    let engine = KMeansEngine::new(config)
        .with_seeder(preassigned(vec![vec![0.0], vec![5.0], vec![10.0]]));
    let clusters = engine.cluster(&store).unwrap();

    assert_eq!(clusters.len(), 3);
    assert!(clusters.iter().all(|c| !c.is_empty()));
    let mut all: Vec<usize> = clusters.iter().flat_map(|c| c.members().to_vec()).collect();
    all.sort_unstable();
    assert_eq!(all, vec![0, 1, 2]);
}

#[test]
fn test_equidistant_rows_go_to_the_lowest_center() {
    let store = VecTupleStore::from_rows(vec![vec![0.0], vec![1.0]]).unwrap();
    let engine = KMeansEngine::new(KMeansConfig::new(2))
        .with_seeder(preassigned(vec![vec![0.0], vec![2.0]]));
    let clusters = engine.cluster(&store).unwrap();

    // --- row 1 is equidistant from both seeds and must join center 0
    assert_eq!(clusters[0].members(), &[0, 1]);
    assert!(clusters[1].is_empty());
}

#[test]
fn test_partition_is_complete_and_centroids_are_means() {
    let store = uniform_store(200, 3, 11);
    let mut config = KMeansConfig::new(4);
    config.rng_seed = Some(7);
    let clusters = KMeansEngine::new(config).cluster(&store).unwrap();

    // --- every row belongs to exactly one cluster
    let mut all: Vec<usize> = clusters.iter().flat_map(|c| c.members().to_vec()).collect();
    all.sort_unstable();
    let expected: Vec<usize> = (0..200).collect();
    assert_eq!(all, expected);

    // --- each centroid is the mean of its members
    for cluster in &clusters {
        if cluster.is_empty() { continue; }
        let mut mean = vec![0.0; 3];
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
fn test_runs_are_deterministic() {
    let store = uniform_store(300, 2, 5);
    let mut config = KMeansConfig::new(5);
    config.rng_seed = Some(13);
    let first = KMeansEngine::new(config.clone()).cluster(&store).unwrap();
    let second = KMeansEngine::new(config).cluster(&store).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_worker_count_does_not_change_the_result() {
    let store = uniform_store(500, 3, 3);
    let mut config = KMeansConfig::new(6);
    config.rng_seed = Some(17);
    config.worker_threads = 1;
    let serial = KMeansEngine::new(config.clone()).cluster(&store).unwrap();
    config.worker_threads = 4;
    let parallel = KMeansEngine::new(config).cluster(&store).unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn test_objective_never_increases() {
    let store = uniform_store(400, 2, 23);
    let seeds = vec![store.tuple(0), store.tuple(1), store.tuple(2)];

    let mut previous = f64::MAX;
    for iterations in 0..8 {
        let mut config = KMeansConfig::new(3);
        config.max_iterations = Some(iterations);
        let engine = KMeansEngine::new(config).with_seeder(preassigned(seeds.clone()));
        let objective = wcss(&store, &engine.cluster(&store).unwrap());
        assert!(objective <= previous + 1e-9);
        previous = objective;
    }
}

#[test]
fn test_moves_goal_stops_early() {
    let store = uniform_store(400, 2, 29);
    let mut config = KMeansConfig::new(4);
    config.rng_seed = Some(1);
    config.moves_goal = 400;            // --- any iteration satisfies the goal
    let clusters = KMeansEngine::new(config).cluster(&store).unwrap();
    let total: usize = clusters.iter().map(|c| c.size()).sum();
    assert_eq!(total, 400);
}

#[test]
fn test_invalid_configurations_are_rejected() {
    let store = VecTupleStore::from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();

    let none = KMeansEngine::new(KMeansConfig::new(0)).cluster(&store);
    assert!(matches!(none, Err(ClusteringError::InvalidConfiguration { .. })));

    let too_many = KMeansEngine::new(KMeansConfig::new(3)).cluster(&store);
    assert!(matches!(too_many, Err(ClusteringError::InvalidConfiguration { .. })));

    // --- preassigned centers of the wrong length
    let bad_seeds = KMeansEngine::new(KMeansConfig::new(1))
        .with_seeder(preassigned(vec![vec![0.0, 0.0, 0.0]]))
        .cluster(&store);
    assert!(matches!(bad_seeds, Err(ClusteringError::InvalidConfiguration { .. })));
}

#[test]
fn test_non_finite_rows_are_rejected() {
    let store = VecTupleStore::from_rows(vec![vec![0.0], vec![f64::NAN], vec![2.0]]).unwrap();
    let result = KMeansEngine::new(KMeansConfig::new(1)).cluster(&store);
    assert!(matches!(result, Err(ClusteringError::NonFiniteValue { row: 1 })));
}

#[test]
fn test_random_seeder_picks_distinct_rows() {
    let store = uniform_store(50, 2, 31);
    let mut rng = SmallRng::seed_from_u64(0);
    let seeds = RandomSeeder.seed(&store, 10, &mut rng).unwrap();
    assert_eq!(seeds.tuple_count(), 10);
    assert_eq!(seeds.tuple_length(), 2);

    // --- each seed is one of the rows; no row is used twice
    let mut used: Vec<usize> = Vec::new();
    for s in 0..10 {
        let seed = seeds.tuple(s);
        let row = (0..50).find(|&r| store.tuple(r) == seed).unwrap();
        assert!(!used.contains(&row));
        used.push(row);
    }
}

#[test]
fn test_plus_plus_seeder_is_deterministic() {
    let store = uniform_store(100, 3, 37);
    let seeder = KMeansPlusPlusSeeder::new(euclidean_metric());
    let first = seeder.seed(&store, 5, &mut SmallRng::seed_from_u64(2)).unwrap();
    let second = seeder.seed(&store, 5, &mut SmallRng::seed_from_u64(2)).unwrap();
    for s in 0..5 {
        assert_eq!(first.tuple(s), second.tuple(s));
    }
}

#[test]
fn test_seeders_reject_bad_requests() {
    let store = uniform_store(5, 2, 41);
    let mut rng = SmallRng::seed_from_u64(0);
    assert!(RandomSeeder.seed(&store, 0, &mut rng).is_err());
    assert!(RandomSeeder.seed(&store, 6, &mut rng).is_err());

    let two = PreassignedSeeder::new(VecTupleStore::from_rows(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap());
    assert!(two.seed(&store, 3, &mut rng).is_err());
}
