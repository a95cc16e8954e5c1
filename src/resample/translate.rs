//! Pushing engulfed majority points out to the sphere boundary.

use super::radius::RadiusAssignment;
use super::util::{lp_distance, DistanceMatrix};
use crate::error::{Error, Result};
use rand::prelude::*;
use tracing::warn;

/// Distances below this are treated as coincident points.
pub const DEGENERATE_DISTANCE: f64 = 1e-20;

/// Jitter attempts before a coincident pair is reported as an error.
pub const MAX_JITTER_ATTEMPTS: usize = 64;

/// Accumulated displacement for every majority point.
///
/// Displacements from different minority spheres add up; nothing moves until
/// [`TranslationField::apply`] is called.
#[derive(Debug, Clone)]
pub struct TranslationField {
    displacements: Vec<Vec<f64>>,
    claims: Vec<usize>,
}

impl TranslationField {
    /// Zero field for `n` majority points of dimension `dim`.
    pub fn zeros(n: usize, dim: usize) -> Self {
        Self {
            displacements: vec![vec![0.0; dim]; n],
            claims: vec![0; n],
        }
    }

    /// Accumulated displacement of majority point `j`.
    pub fn displacement(&self, j: usize) -> &[f64] {
        &self.displacements[j]
    }

    /// Number of minority spheres that engulfed majority point `j`.
    pub fn claims(&self, j: usize) -> usize {
        self.claims[j]
    }

    /// Number of majority points engulfed by at least one sphere.
    pub fn n_claimed(&self) -> usize {
        self.claims.iter().filter(|&&c| c > 0).count()
    }

    fn add(&mut self, j: usize, delta: impl Iterator<Item = f64>) {
        for (acc, d) in self.displacements[j].iter_mut().zip(delta) {
            *acc += d;
        }
        self.claims[j] += 1;
    }

    /// Move every majority point by its accumulated displacement.
    pub fn apply(&self, majority: &mut [Vec<f64>]) {
        for (point, delta) in majority.iter_mut().zip(&self.displacements) {
            for (x, d) in point.iter_mut().zip(delta) {
                *x += d;
            }
        }
    }

    /// Drop every claimed majority point, keeping the rest in order.
    pub fn remove_claimed(&self, majority: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
        majority
            .into_iter()
            .zip(&self.claims)
            .filter_map(|(point, &c)| (c == 0).then_some(point))
            .collect()
    }
}

/// Record which majority points each sphere engulfs, without any displacement.
///
/// Used when engulfed points are dropped instead of moved: coincident pairs
/// need no separation and no randomness is consumed.
pub fn claim_engulfed(n_majority: usize, assignments: &[RadiusAssignment]) -> TranslationField {
    let mut field = TranslationField::zeros(n_majority, 0);
    for assignment in assignments {
        for &j in assignment.engulfed_indices() {
            field.claims[j] += 1;
        }
    }
    field
}

/// Build the translation field for all minority spheres.
///
/// `majority` is the working copy of the majority points. It is only modified
/// by jitter, for pairs that sit closer than [`DEGENERATE_DISTANCE`]; the
/// displacements themselves are accumulated and left for the caller to apply.
pub fn accumulate_translations<R: Rng + ?Sized>(
    rng: &mut R,
    minority: &[Vec<f64>],
    majority: &mut [Vec<f64>],
    assignments: &[RadiusAssignment],
    distances: &DistanceMatrix,
    p_norm: f64,
) -> Result<TranslationField> {
    let dim = minority.first().map_or(0, Vec::len);
    let mut field = TranslationField::zeros(majority.len(), dim);

    for (i, (center, assignment)) in minority.iter().zip(assignments).enumerate() {
        let radius = assignment.radius();
        for &j in assignment.engulfed_indices() {
            let point = &mut majority[j];
            let mut d = distances.get(i, j);

            let mut attempts = 0;
            while d < DEGENERATE_DISTANCE {
                if attempts == MAX_JITTER_ATTEMPTS {
                    return Err(Error::DegenerateDistance {
                        minority: i,
                        majority: j,
                        attempts,
                    });
                }
                jitter(rng, point);
                d = lp_distance(center, point, p_norm);
                attempts += 1;
            }
            if attempts > 0 {
                warn!(minority = i, majority = j, attempts, "jittered coincident majority point");
            }

            let scale = (radius - d) / d;
            field.add(j, point.iter().zip(center).map(|(m, c)| scale * (m - c)));
        }
    }

    Ok(field)
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, point: &mut [f64]) {
    for x in point.iter_mut() {
        let magnitude = 1e-6 * rng.random::<f64>() + 1e-6;
        let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
        *x += magnitude * sign;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::util::lp_distance;

    fn setup(
        minority: &[Vec<f64>],
        majority: &[Vec<f64>],
        energy: f64,
        p: f64,
    ) -> (DistanceMatrix, Vec<RadiusAssignment>) {
        let m = DistanceMatrix::compute(minority, majority, p);
        let a = (0..m.rows())
            .map(|i| RadiusAssignment::from_row(m.row(i), energy))
            .collect();
        (m, a)
    }

    #[test]
    fn single_claim_lands_on_the_boundary() {
        for &p in &[1.0, 2.0, 3.0] {
            let minority = vec![vec![0.0, 0.0]];
            let mut majority = vec![vec![0.3, 0.1], vec![-0.2, 0.4], vec![5.0, 5.0]];
            let (m, a) = setup(&minority, &majority, 2.0, p);
            let mut rng = StdRng::seed_from_u64(1);

            let field =
                accumulate_translations(&mut rng, &minority, &mut majority, &a, &m, p).unwrap();
            field.apply(&mut majority);

            let r = a[0].radius();
            for &j in a[0].engulfed_indices() {
                assert_eq!(field.claims(j), 1);
                let d = lp_distance(&minority[0], &majority[j], p);
                assert!((d - r).abs() < 1e-9, "p={p}: d={d}, r={r}");
            }
            assert_eq!(majority[2], vec![5.0, 5.0]);
        }
    }

    #[test]
    fn displacements_from_two_spheres_add_up() {
        let minority = vec![vec![-1.0, 0.0], vec![1.0, 0.0]];
        let mut majority = vec![vec![0.0, 0.5]];
        let (m, a) = setup(&minority, &majority, 4.0, 2.0);
        assert_eq!(a[0].solution.engulfed, 1);
        assert_eq!(a[1].solution.engulfed, 1);

        let mut rng = StdRng::seed_from_u64(2);
        let field =
            accumulate_translations(&mut rng, &minority, &mut majority, &a, &m, 2.0).unwrap();
        assert_eq!(field.claims(0), 2);
        assert_eq!(field.n_claimed(), 1);

        // Symmetric pushes cancel horizontally and add vertically.
        let delta = field.displacement(0);
        assert!(delta[0].abs() < 1e-12);
        assert!(delta[1] > 0.0);
    }

    #[test]
    fn coincident_points_are_jittered_apart() {
        let minority = vec![vec![1.0, 1.0]];
        let mut majority = vec![vec![1.0, 1.0]];
        let (m, a) = setup(&minority, &majority, 1.0, 2.0);
        let mut rng = StdRng::seed_from_u64(3);

        let field =
            accumulate_translations(&mut rng, &minority, &mut majority, &a, &m, 2.0).unwrap();
        assert_ne!(majority[0], vec![1.0, 1.0]);
        field.apply(&mut majority);

        let d = lp_distance(&minority[0], &majority[0], 2.0);
        assert!((d - a[0].radius()).abs() < 1e-9);
    }

    #[test]
    fn unseparable_pair_fails_after_bounded_retries() {
        // Jitter of ~1e-6 is below the spacing of f64 values near 1e12.
        let minority = vec![vec![1e12]];
        let mut majority = vec![vec![1e12], vec![0.0]];
        let (m, a) = setup(&minority, &majority, 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(6);

        let err = accumulate_translations(&mut rng, &minority, &mut majority, &a, &m, 1.0)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DegenerateDistance {
                minority: 0,
                majority: 0,
                attempts: MAX_JITTER_ATTEMPTS,
            }
        ));
    }

    #[test]
    fn claim_only_pass_counts_without_moving() {
        let minority = vec![vec![1e12], vec![1e12 + 0.5]];
        let majority = vec![vec![1e12], vec![0.0]];
        let (_, a) = setup(&minority, &majority, 1.0, 1.0);

        let field = claim_engulfed(majority.len(), &a);
        assert_eq!(field.claims(0), 2);
        assert_eq!(field.claims(1), 0);
        assert_eq!(field.remove_claimed(majority), vec![vec![0.0]]);
    }

    #[test]
    fn remove_claimed_keeps_untouched_points() {
        let minority = vec![vec![0.0]];
        let majority = vec![vec![0.1], vec![9.0], vec![-0.2]];
        let (m, a) = setup(&minority, &majority, 1.0, 1.0);
        let mut work = majority.clone();
        let mut rng = StdRng::seed_from_u64(4);

        let field = accumulate_translations(&mut rng, &minority, &mut work, &a, &m, 1.0).unwrap();
        assert_eq!(field.remove_claimed(majority), vec![vec![9.0]]);
    }
}
