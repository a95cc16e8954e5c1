//! Oversampling for class-imbalanced data.
//!
//! This module implements Combined Cleaning and Resampling (CCR) for dense
//! two-class datasets.
//!
//! ## Cleaning vs Resampling
//!
//! **Resampling** alone (random oversampling, SMOTE) adds minority points but
//! leaves majority points wherever they sit, including deep inside minority
//! regions. Classifiers then learn a boundary that still cuts through the
//! minority class.
//!
//! **Cleaning** moves (or removes) majority points that crowd the minority
//! class. CCR does both at once: each minority point clears a sphere whose
//! size is set by an energy budget, majority points inside are pushed out to
//! its boundary, and synthetic minority points are drawn inside the cleared
//! spheres.
//!
//! ## Energy
//!
//! Growing a sphere by `Δr` while `k` majority points are inside costs
//! `Δr · (k + 1)`. Minority points surrounded by majority points therefore
//! end up with small spheres, and small spheres receive more synthetic
//! points:
//!
//! ```text
//! n_i ∝ 1 / r_i
//! ```
//!
//! ## Region scoring
//!
//! With [`Strategy::RegionScored`], candidates are scored with an RBF kernel
//! density against the majority class and only those in the allowed density
//! regions (low, equal, high) are kept.
//!
//! ## Usage
//!
//! ```rust
//! use ccr::resample::{Ccr, Resampler};
//!
//! let points = vec![
//!     vec![0.0, 0.0],
//!     vec![1.0, 0.0],
//!     vec![2.0, 0.0],
//! ];
//! let labels = vec![1, 0, 0];
//!
//! let out = Ccr::new(1.0).with_seed(42).fit_sample(&points, &labels).unwrap();
//!
//! // Two majority points, one minority point, one synthetic point.
//! assert_eq!(out.points.len(), 4);
//! assert_eq!(out.labels, vec![0, 0, 1, 1]);
//! ```

mod ccr;
mod radius;
mod sphere;
mod synthetic;
mod traits;
mod translate;
mod util;

pub use ccr::{Ccr, CcrParams, Cleaning, Gamma, ScoringScope, Strategy};
pub use radius::{solve_radius, RadiusAssignment, RadiusSolution};
pub use sphere::{sample_inside_sphere, sample_inside_taxicab, SphereKind};
pub use synthetic::{
    allocate_counts, check_radii, rbf_score, silverman_gamma, Region, RegionSet, Thresholds,
};
pub use traits::{Resampled, Resampler};
pub use translate::{
    accumulate_translations, claim_engulfed, TranslationField, DEGENERATE_DISTANCE, MAX_JITTER_ATTEMPTS,
};
pub use util::{distance, DistanceMatrix};
