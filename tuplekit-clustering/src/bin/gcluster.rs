use std::env;
use std::io::Write;
use std::time::Instant;

use clap::Parser;
use log::info;

use tuplekit_clustering::errors::ClusteringError;
use tuplekit_clustering::{
    Cluster, GMeansConfig, GMeansController, KMeansConfig, KMeansEngine,
};
use tuplekit_data::{TupleStore, VecTupleStore};
use tuplekit_io::errors::IoError;
use tuplekit_io::{open_file, out_writer, read_tuples_csv, read_tuples_tsv};
use tuplekit_tasks::NeverCancelled;

#[derive(Parser, Debug)]
#[clap(name = "gcluster")]
#[clap(about = "Clusters rows of numeric data with k-means or adaptive G-means.", long_about = None)]
struct Args {
    /// input file with tuples to cluster: CSV format, or TSV with --tsv; may be gzipped
    #[clap(long, short = 'i')]
    infile: String,
    /// the input file is tab-separated rather than comma-separated
    #[clap(long)]
    tsv: bool,
    /// number of clusters for a single k-means pass; omit to let G-means decide
    #[clap(long, short = 'k')]
    clusters: Option<usize>,
    /// maximum number of refinement iterations of a k-means pass
    #[clap(long)]
    max_iterations: Option<usize>,
    /// re-seat centers of clusters that lost all their members
    #[clap(long)]
    replace_empty: bool,
    /// seed for the random generator; runs with the same seed are identical
    #[clap(long)]
    seed: Option<u64>,
    /// number of worker threads of the assignment step
    #[clap(long)]
    threads: Option<usize>,
    /// clusters smaller than this are never split by G-means
    #[clap(long, default_value = "8")]
    min_size: usize,
    /// G-means stops splitting once this many clusters exist
    #[clap(long)]
    max_clusters: Option<usize>,
    /// writes row-to-cluster assignments to a file; "stdout" by default
    #[clap(long, short = 'o', default_value = "stdout")]
    outfile: String,
}

pub fn main() -> Result<(), ClusteringError> {
    if env::var("RUST_LOG").is_err() { env::set_var("RUST_LOG", "info") }
    env_logger::init();
    let args = Args::parse();

    // ---------- load the tuples to be clustered ----------
    let reader = open_file(&args.infile)?;
    let tuples = if args.tsv {
        read_tuples_tsv(reader, &NeverCancelled)?
    } else {
        read_tuples_csv(reader, &NeverCancelled)?
    };
    info!("{} rows loaded, data dimension is {}", tuples.tuple_count(), tuples.tuple_length());

    // ---------- cluster them ----------
    let start = Instant::now();
    let clusters = match args.clusters {
        Some(k) => {
            let mut config = KMeansConfig::new(k);
            config.max_iterations = args.max_iterations;
            config.replace_empty_clusters = args.replace_empty;
            config.rng_seed = args.seed;
            if let Some(threads) = args.threads { config.worker_threads = threads; }
            KMeansEngine::new(config).cluster(&tuples)?
        }
        None => {
            let mut config = GMeansConfig::default();
            config.min_cluster_size = args.min_size;
            config.max_clusters = args.max_clusters;
            config.kmeans.replace_empty_clusters = args.replace_empty;
            config.kmeans.rng_seed = args.seed;
            GMeansController::new(config).cluster(&tuples)?
        }
    };
    info!("{} rows clustered into {} clusters in {:?}", tuples.tuple_count(), clusters.len(), start.elapsed());

    // ---------- report the partition ----------
    for (c, cluster) in clusters.iter().enumerate() {
        info!("cluster {}: {} rows, centroid {:?}", c, cluster.size(), cluster.centroid());
    }
    let mut out_file = out_writer(&args.outfile, false)?;
    write_assignments(&mut out_file, &tuples, &clusters)?;

    Ok(())
}

fn write_assignments(out: &mut Box<dyn Write>, tuples: &VecTupleStore, clusters: &[Cluster])
        -> Result<(), IoError> {
    let mut assigned = vec![0; tuples.tuple_count()];
    for (c, cluster) in clusters.iter().enumerate() {
        for &row in cluster.members() { assigned[row] = c; }
    }
    for row in 0..tuples.tuple_count() {
        writeln!(out, "{:?} {}", tuples.tuple(row), assigned[row])?;
    }
    out.flush()?;
    Ok(())
}
