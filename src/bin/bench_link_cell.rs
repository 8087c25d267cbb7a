//! Benchmark for cell-list build and pair passes through the driver.
//!
//! Build/run:
//!   cargo run --release --features bench --bin bench_link_cell -- 1m --r-max 1.2
//!   cargo run --release --features bench --bin bench_link_cell -- 200k -k 16 --threads 8

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use cell_locality::{KdTreeQuery, LinkCell, PairCompute, ParallelConfig, QueryArgs, SimBox};
use clap::Parser;
use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Parser, Debug)]
#[command(about = "Benchmark cell-list ball and k-nearest passes")]
struct Args {
    /// Number of points to generate (e.g., 100k, 1m).
    #[arg(value_parser = parse_count, default_value = "100k")]
    n: usize,

    /// Number density; sets the cube side as (n / density)^(1/3).
    #[arg(long, default_value_t = 1.0)]
    density: f32,

    /// Ball query cutoff.
    #[arg(long, default_value_t = 1.0)]
    r_max: f32,

    /// Neighbors per point for the k-nearest pass.
    #[arg(short = 'k', long, default_value_t = 12)]
    num_neighbors: usize,

    /// Minimum cell width. Defaults to `r_max`.
    #[arg(long)]
    cell_width: Option<f32>,

    /// Worker threads (rayon default if omitted).
    #[arg(long)]
    threads: Option<usize>,

    /// Random seed.
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Iterations to run (useful for profiling).
    #[arg(short = 'n', long, default_value_t = 5)]
    repeat: usize,

    /// Also time the k-d tree fallback.
    #[arg(long)]
    kd_tree: bool,
}

fn random_cube_points<R: Rng>(n: usize, side: f32, rng: &mut R) -> Vec<Vec3> {
    let half = 0.5 * side;
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
            )
        })
        .collect()
}

fn time_pass<S: cell_locality::PointSource + ?Sized>(
    label: &str,
    compute: &PairCompute,
    source: &S,
    points: &[Vec3],
    args: &QueryArgs,
    repeat: usize,
) {
    let mut times = Vec::with_capacity(repeat);
    let mut pairs = 0;
    for _ in 0..repeat {
        let count = AtomicU64::new(0);
        let t0 = Instant::now();
        let result = compute.for_each_pair(source, points, args, |_, _, _, _| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        times.push(t0.elapsed().as_secs_f64() * 1000.0);
        if let Err(err) = result {
            eprintln!("{label}: {err}");
            return;
        }
        pairs = count.into_inner();
    }
    let mean = times.iter().sum::<f64>() / times.len().max(1) as f64;
    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    println!(
        "{:<16} pairs={:>12} mean={:>9.2}ms min={:>9.2}ms",
        label, pairs, mean, min
    );
}

fn main() {
    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let side = (args.n as f32 / args.density).cbrt();
    let sim_box = SimBox::cube(side);
    let points = random_cube_points(args.n, side, &mut rng);
    let cell_width = args.cell_width.unwrap_or(args.r_max);

    let compute = match PairCompute::new(ParallelConfig {
        num_threads: args.threads,
    }) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    println!(
        "points={} side={:.2} cell_width={} r_max={} k={} threads={} repeat={}",
        args.n,
        side,
        cell_width,
        args.r_max,
        args.num_neighbors,
        compute.num_threads(),
        args.repeat
    );

    let t0 = Instant::now();
    let index = match LinkCell::new(sim_box, cell_width, &points) {
        Ok(index) => index,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    println!(
        "link cell build: {:.2}ms ({:?} cells)",
        t0.elapsed().as_secs_f64() * 1000.0,
        index.grid().dims().to_array()
    );

    let ball = QueryArgs::ball(args.r_max).exclude_self();
    let knn = QueryArgs::nearest(args.num_neighbors).exclude_self();
    time_pass("ball/link-cell", &compute, &index, &points, &ball, args.repeat);
    time_pass("knn/link-cell", &compute, &index, &points, &knn, args.repeat);

    if args.kd_tree {
        let t0 = Instant::now();
        let tree = match KdTreeQuery::new(sim_box, &points) {
            Ok(tree) => tree,
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        };
        println!("kd tree build: {:.2}ms", t0.elapsed().as_secs_f64() * 1000.0);
        time_pass("ball/kd-tree", &compute, &tree, &points, &ball, args.repeat);
        time_pass("knn/kd-tree", &compute, &tree, &points, &knn, args.repeat);
    }
}
