use crate::error::Result;

/// Output of a resampling run.
///
/// Points are laid out as cleaned majority points, then the original minority
/// points, then the synthetic minority points; `labels` follows the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled<L> {
    /// Resampled points.
    pub points: Vec<Vec<f64>>,
    /// One label per resampled point.
    pub labels: Vec<L>,
    /// The label treated as the minority class.
    pub minority_label: L,
    /// Solved sphere radius per minority point (input order).
    pub radii: Vec<f64>,
    /// Number of majority points engulfed by each minority sphere.
    pub engulfed: Vec<usize>,
    /// Number of synthetic points generated around each minority point.
    pub n_synthetic: Vec<usize>,
}

impl<L> Resampled<L> {
    /// Total number of synthetic points.
    pub fn synthetic_count(&self) -> usize {
        self.n_synthetic.iter().sum()
    }

    /// Zip points with their labels.
    pub fn into_pairs(self) -> Vec<(Vec<f64>, L)> {
        self.points.into_iter().zip(self.labels).collect()
    }
}

/// Common interface for binary oversamplers.
pub trait Resampler<L> {
    /// Resample a two-class dataset given as parallel point/label slices.
    fn fit_sample(&self, points: &[Vec<f64>], labels: &[L]) -> Result<Resampled<L>>;

    /// Resample a dataset given as `(point, label)` pairs.
    fn fit_sample_pairs(&self, data: &[(Vec<f64>, L)]) -> Result<Resampled<L>>
    where
        L: Clone,
    {
        let (points, labels): (Vec<Vec<f64>>, Vec<L>) = data.iter().cloned().unzip();
        self.fit_sample(&points, &labels)
    }
}
