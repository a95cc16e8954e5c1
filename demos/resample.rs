//! CCR on a small 2D dataset, with and without region scoring.

use ccr::{Ccr, Gamma, Resampler, ScoringScope, Strategy};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Majority class spread over a grid, minority class in a tight cluster inside it.
    let mut points: Vec<Vec<f64>> = Vec::new();
    let mut labels: Vec<&str> = Vec::new();
    for i in 0..5 {
        for j in 0..4 {
            points.push(vec![i as f64, j as f64]);
            labels.push("negative");
        }
    }
    for p in [[1.4, 1.5], [1.6, 1.4], [1.5, 1.7], [2.6, 1.5]] {
        points.push(p.to_vec());
        labels.push("positive");
    }

    // --- Uniform sampling (L1) ---
    let ccr = Ccr::new(0.5).with_seed(42);
    let out = ccr.fit_sample(&points, &labels).unwrap();
    println!("=== CCR (energy=0.5, p=1) ===");
    for (i, (r, k)) in out.radii.iter().zip(&out.engulfed).enumerate() {
        println!(
            "  minority {i}: radius {r:.3}, engulfed {k}, synthetic {}",
            out.n_synthetic[i]
        );
    }
    println!("  {} points out ({} synthetic)", out.points.len(), out.synthetic_count());

    // --- Region scoring (L2, equal-density candidates only) ---
    let ccr = Ccr::new(0.5)
        .with_p_norm(2.0)
        .with_strategy(Strategy::RegionScored)
        .with_gamma(Gamma::Auto)
        .with_regions("E".parse().unwrap())
        .with_scope(ScoringScope::PerSeed)
        .with_seed(42);
    let out = ccr.fit_sample(&points, &labels).unwrap();
    println!("\n=== RB-CCR (energy=0.5, p=2, regions=E) ===");
    for (point, label) in out.into_pairs().iter().rev().take(5) {
        println!("  ({:5.2}, {:5.2}) => {}", point[0], point[1], label);
    }
}
