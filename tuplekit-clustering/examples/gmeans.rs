use std::env;

use clap::Parser;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use tuplekit_clustering::errors::ClusteringError;
use tuplekit_clustering::{GMeansConfig, GMeansController};
use tuplekit_data::VecTupleStore;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// Samples a mixture of Gaussian blobs and lets G-means recover them
/// say gmeans -h to see options
struct Args {
    /// number of blobs to sample
    #[clap(short, long, default_value = "3")]
    blobs: usize,
    /// number of points per blob
    #[clap(short, long, default_value = "500")]
    points: usize,
    /// random generator seed
    #[clap(short, long, default_value = "0")]
    seed: u64,
}

fn main() -> Result<(), ClusteringError> {
    if env::var("RUST_LOG").is_err() { env::set_var("RUST_LOG", "info") }
    env_logger::init();

    let args = Args::parse();

    // --- blobs on a circle, far enough apart to be clearly distinct
    let mut rng = SmallRng::seed_from_u64(args.seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut store = VecTupleStore::new(2, 0);
    for blob in 0..args.blobs {
        let angle = blob as f64 / args.blobs as f64 * std::f64::consts::TAU;
        let (cx, cy) = (10.0 * angle.cos(), 10.0 * angle.sin());
        for _ in 0..args.points {
            store.push_tuple(&[cx + noise.sample(&mut rng), cy + noise.sample(&mut rng)]);
        }
    }

    let clusters = GMeansController::new(GMeansConfig::default()).cluster(&store)?;
    info!("{} blobs sampled, {} clusters found", args.blobs, clusters.len());
    for (c, cluster) in clusters.iter().enumerate() {
        println!("cluster {}: {} rows, centroid ({:.2}, {:.2})",
                 c, cluster.size(), cluster.centroid()[0], cluster.centroid()[1]);
    }
    Ok(())
}
