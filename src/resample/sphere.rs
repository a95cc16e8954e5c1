//! Sampling inside Lp balls.
//!
//! Two samplers are provided:
//!
//! - [`SphereKind::Lp`]: pick a direction with each coordinate uniform in `[-1, 1]`,
//!   normalize it to unit Lp length, then scale by `radius * u` with `u ~ U[0, 1]`.
//!   This is a direction-then-radius construction; it does not draw uniformly
//!   over the ball's volume (samples concentrate near the center as the
//!   dimension grows).
//! - [`SphereKind::Taxicab`]: draw coordinates one at a time, each uniform in
//!   `[-spread, spread]` where `spread` is the L1 budget left over by the
//!   coordinates already drawn, then shuffle the coordinate order.

use super::util::lp_norm;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Which ball sampler to use when generating synthetic points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SphereKind {
    /// Direction-then-radius sampler under the configured p-norm.
    #[default]
    Lp,
    /// Coordinate-wise L1 ball sampler (ignores the configured p-norm).
    Taxicab,
}

impl SphereKind {
    /// Draw one offset vector (relative to the ball center).
    pub fn sample<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        dimensionality: usize,
        radius: f64,
        p_norm: f64,
    ) -> Vec<f64> {
        match self {
            SphereKind::Lp => sample_inside_sphere(rng, dimensionality, radius, p_norm),
            SphereKind::Taxicab => sample_inside_taxicab(rng, dimensionality, radius),
        }
    }
}

/// Offset vector inside the Lp ball of the given radius (see the module docs).
pub fn sample_inside_sphere<R: Rng + ?Sized>(
    rng: &mut R,
    dimensionality: usize,
    radius: f64,
    p_norm: f64,
) -> Vec<f64> {
    let mut direction: Vec<f64> = (0..dimensionality)
        .map(|_| 2.0 * rng.random::<f64>() - 1.0)
        .collect();

    let norm = lp_norm(&direction, p_norm);
    let scale = rng.random::<f64>() * radius;

    // An all-zero direction has probability zero; map it to the center.
    if norm <= 0.0 {
        return vec![0.0; dimensionality];
    }
    for x in &mut direction {
        *x = *x / norm * scale;
    }
    direction
}

/// Offset vector inside the L1 ball of the given radius (see the module docs).
pub fn sample_inside_taxicab<R: Rng + ?Sized>(
    rng: &mut R,
    dimensionality: usize,
    radius: f64,
) -> Vec<f64> {
    let mut coords = Vec::with_capacity(dimensionality);
    let mut used = 0.0;
    for _ in 0..dimensionality {
        let spread = (radius - used).max(0.0);
        let c = (2.0 * rng.random::<f64>() - 1.0) * spread;
        used += c.abs();
        coords.push(c);
    }
    coords.shuffle(rng);
    coords
}
