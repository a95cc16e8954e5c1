use crate::error::{Error, Result};
use rayon::prelude::*;

/// Lp distance between two points: `(Σ|x_i - y_i|^p)^(1/p)`.
///
/// `p = 1` is the taxicab (Manhattan) distance and `p = 2` the Euclidean one.
/// Points of different length are rejected with [`Error::DimensionMismatch`].
pub fn distance(x: &[f64], y: &[f64], p_norm: f64) -> Result<f64> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }
    Ok(lp_distance(x, y, p_norm))
}

/// Unchecked variant of [`distance`] for callers that validated shapes up front.
#[inline]
pub(crate) fn lp_distance(x: &[f64], y: &[f64], p_norm: f64) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let diffs = x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs());
    if p_norm == 1.0 {
        diffs.sum()
    } else if p_norm == 2.0 {
        diffs.map(|d| d * d).sum::<f64>().sqrt()
    } else {
        diffs.map(|d| d.powf(p_norm)).sum::<f64>().powf(1.0 / p_norm)
    }
}

/// Lp norm of a vector (its distance to the origin).
#[inline]
pub(crate) fn lp_norm(v: &[f64], p_norm: f64) -> f64 {
    if p_norm == 1.0 {
        v.iter().map(|x| x.abs()).sum()
    } else if p_norm == 2.0 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    } else {
        v.iter()
            .map(|x| x.abs().powf(p_norm))
            .sum::<f64>()
            .powf(1.0 / p_norm)
    }
}

/// Check that every point has the same, non-zero dimensionality and finite
/// coordinates, and return the dimensionality.
pub(crate) fn check_dimensions(points: &[Vec<f64>]) -> Result<usize> {
    let first = points.first().ok_or(Error::EmptyInput)?;
    let d = first.len();
    if d == 0 {
        return Err(Error::InvalidParameter {
            name: "dimension",
            message: "must be at least 1",
        });
    }
    for point in points.iter().skip(1) {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
    }
    if points.iter().flatten().any(|x| !x.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "points",
            message: "coordinates must be finite",
        });
    }
    Ok(d)
}

/// Dense `rows x cols` table of distances from each minority point (row) to
/// each majority point (column). Computed once per run and read-only afterwards.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute all minority-to-majority distances under the given Lp norm.
    ///
    /// Rows are computed in parallel; the layout is row-major and independent
    /// of scheduling.
    pub fn compute(minority: &[Vec<f64>], majority: &[Vec<f64>], p_norm: f64) -> Self {
        let rows = minority.len();
        let cols = majority.len();
        let data: Vec<f64> = minority
            .par_iter()
            .flat_map_iter(|x| majority.iter().map(move |y| lp_distance(x, y, p_norm)))
            .collect();
        Self { rows, cols, data }
    }

    /// Number of minority points.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of majority points.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Distances from minority point `i` to every majority point.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Distance between minority point `i` and majority point `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }
}

/// Indices of `row` sorted by ascending distance (stable, so equal distances keep index order).
pub(crate) fn argsort(row: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_matches_known_norms() {
        let x = [0.0, 0.0];
        let y = [3.0, -4.0];
        assert_eq!(distance(&x, &y, 1.0).unwrap(), 7.0);
        assert!((distance(&x, &y, 2.0).unwrap() - 5.0).abs() < 1e-12);

        let d3 = distance(&x, &y, 3.0).unwrap();
        assert!((d3 - (27.0f64 + 64.0).powf(1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn distance_rejects_mismatched_points() {
        let err = distance(&[0.0, 1.0], &[0.0], 2.0).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn norm_is_distance_to_origin() {
        let v = [1.0, -2.0, 2.0];
        assert_eq!(lp_norm(&v, 1.0), 5.0);
        assert!((lp_norm(&v, 2.0) - 3.0).abs() < 1e-12);
        let p = 1.5;
        assert!((lp_norm(&v, p) - lp_distance(&v, &[0.0; 3], p)).abs() < 1e-12);
    }

    #[test]
    fn check_dimensions_catches_ragged_input() {
        assert!(matches!(check_dimensions(&[]), Err(Error::EmptyInput)));
        assert!(check_dimensions(&[vec![]]).is_err());
        let ragged = vec![vec![0.0, 1.0], vec![2.0]];
        assert!(matches!(
            check_dimensions(&ragged),
            Err(Error::DimensionMismatch { .. })
        ));
        assert_eq!(check_dimensions(&[vec![1.0, 2.0, 3.0]]).unwrap(), 3);
    }

    #[test]
    fn check_dimensions_rejects_non_finite_coordinates() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let points = vec![vec![0.0, 1.0], vec![bad, 0.0]];
            assert!(matches!(
                check_dimensions(&points),
                Err(Error::InvalidParameter { name: "points", .. })
            ));
        }
    }

    #[test]
    fn matrix_layout_is_row_major() {
        let minority = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        let majority = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![0.0, 3.0]];
        let m = DistanceMatrix::compute(&minority, &majority, 1.0);

        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.get(1, 0), 1.0);
        assert_eq!(m.get(1, 2), 3.0);
    }

    #[test]
    fn argsort_is_stable_on_ties() {
        assert_eq!(argsort(&[2.0, 1.0, 2.0, 0.5]), vec![3, 1, 0, 2]);
    }
}
