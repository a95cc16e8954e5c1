//! Combined Cleaning and Resampling.
//!
//! # The Algorithm (Koziarski & Woźniak, 2017)
//!
//! 1. **Solve**: every minority point grows a sphere with a fixed energy
//!    budget; the sphere stops where pushing the majority points it has
//!    swallowed gets too expensive (see [`solve_radius`](super::solve_radius)).
//! 2. **Translate**: each engulfed majority point is pushed radially out to
//!    the boundary of every sphere that swallowed it. Pushes are summed and
//!    applied in one batch, so every sphere sees the original coordinates.
//! 3. **Generate**: synthetic minority points are drawn inside the spheres,
//!    more of them around minority points with small spheres.
//!
//! The three phases run strictly in order. Solving is independent per
//! minority point and runs on the rayon pool; translation jitter and sample
//! generation share one seeded RNG and run sequentially, so a fixed seed
//! reproduces the output bit for bit.

use super::radius::RadiusAssignment;
use super::sphere::SphereKind;
use super::synthetic::{
    allocate_counts, check_radii, silverman_gamma, RegionFilter, RegionSet, SyntheticGenerator,
};
use super::traits::{Resampled, Resampler};
use super::translate::{accumulate_translations, claim_engulfed};
use super::util::{check_dimensions, DistanceMatrix};
use crate::error::{Error, Result};
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How synthetic points are placed inside the spheres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every drawn candidate is kept.
    #[default]
    Uniform,
    /// Candidates are filtered by RBF density region.
    ///
    /// Falls back to [`Strategy::Uniform`] when no gamma is set or every
    /// region is allowed.
    RegionScored,
}

/// Where the region-scored candidate pool and its thresholds come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringScope {
    /// One pool over all spheres; thresholds around the mean pool score.
    #[default]
    Global,
    /// One pool per minority point; thresholds around the seed's own score.
    PerSeed,
}

/// What happens to engulfed majority points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleaning {
    /// Push them to the sphere boundary.
    #[default]
    Translate,
    /// Drop them from the output.
    Remove,
}

/// RBF kernel coefficient for region scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// Silverman's rule over the majority coordinates.
    Auto,
    /// Fixed value.
    Fixed(f64),
}

/// CCR parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcrParams {
    /// Energy budget per minority point. Must be positive.
    pub energy: f64,
    /// Exponent of the Lp distance. Must be at least 1.
    pub p_norm: f64,
    /// Number of synthetic points; defaults to `majority - minority`.
    pub n: Option<usize>,
    /// Placement strategy.
    pub strategy: Strategy,
    /// Ball sampler.
    pub sphere: SphereKind,
    /// RBF coefficient; `None` disables region filtering.
    pub gamma: Option<Gamma>,
    /// Candidates drawn per minority point for region scoring.
    pub n_samples: usize,
    /// Fraction in `[0, 1]` placing the region thresholds between center and extremes.
    pub threshold: f64,
    /// Regions whose candidates are kept.
    pub regions: RegionSet,
    /// Candidate pool layout for region scoring.
    pub scope: ScoringScope,
    /// Treatment of engulfed majority points.
    pub cleaning: Cleaning,
    /// Optional RNG seed for reproducibility.
    #[serde(alias = "random_seed")]
    pub seed: Option<u64>,
}

impl Default for CcrParams {
    fn default() -> Self {
        Self {
            energy: 0.25,
            p_norm: 1.0,
            n: None,
            strategy: Strategy::Uniform,
            sphere: SphereKind::Lp,
            gamma: None,
            n_samples: 100,
            threshold: 0.33,
            regions: RegionSet::default(),
            scope: ScoringScope::Global,
            cleaning: Cleaning::Translate,
            seed: None,
        }
    }
}

impl CcrParams {
    /// Whether region filtering actually applies with these settings.
    pub fn filters_regions(&self) -> bool {
        self.strategy == Strategy::RegionScored && self.gamma.is_some() && !self.regions.is_all()
    }

    fn validate(&self) -> Result<()> {
        if !(self.energy.is_finite() && self.energy > 0.0) {
            return Err(Error::InvalidParameter {
                name: "energy",
                message: "must be positive and finite",
            });
        }
        if !(self.p_norm.is_finite() && self.p_norm >= 1.0) {
            return Err(Error::InvalidParameter {
                name: "p_norm",
                message: "must be finite and at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidParameter {
                name: "threshold",
                message: "must be in [0, 1]",
            });
        }
        if let Some(Gamma::Fixed(g)) = self.gamma {
            if !(g.is_finite() && g > 0.0) {
                return Err(Error::InvalidParameter {
                    name: "gamma",
                    message: "must be positive and finite",
                });
            }
        }
        if self.filters_regions() {
            if self.n_samples == 0 {
                return Err(Error::InvalidParameter {
                    name: "n_samples",
                    message: "must be at least 1",
                });
            }
            if self.regions.is_empty() {
                return Err(Error::InvalidParameter {
                    name: "regions",
                    message: "must allow at least one region",
                });
            }
        }
        Ok(())
    }
}

/// CCR oversampler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ccr {
    params: CcrParams,
}

impl Ccr {
    /// Create a CCR oversampler with the given energy and default settings.
    pub fn new(energy: f64) -> Self {
        Self::from_params(CcrParams {
            energy,
            ..CcrParams::default()
        })
    }

    /// Create a CCR oversampler from a full parameter set.
    pub fn from_params(params: CcrParams) -> Self {
        Self { params }
    }

    /// Current parameters.
    pub fn params(&self) -> &CcrParams {
        &self.params
    }

    /// Set the energy budget.
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.params.energy = energy;
        self
    }

    /// Set the Lp exponent.
    pub fn with_p_norm(mut self, p_norm: f64) -> Self {
        self.params.p_norm = p_norm;
        self
    }

    /// Set the number of synthetic points.
    pub fn with_n(mut self, n: usize) -> Self {
        self.params.n = Some(n);
        self
    }

    /// Set the placement strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.params.strategy = strategy;
        self
    }

    /// Set the ball sampler.
    pub fn with_sphere(mut self, sphere: SphereKind) -> Self {
        self.params.sphere = sphere;
        self
    }

    /// Set the RBF coefficient.
    pub fn with_gamma(mut self, gamma: Gamma) -> Self {
        self.params.gamma = Some(gamma);
        self
    }

    /// Set the candidate pool size per minority point.
    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.params.n_samples = n_samples;
        self
    }

    /// Set the region threshold fraction.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.params.threshold = threshold;
        self
    }

    /// Set the allowed regions.
    pub fn with_regions(mut self, regions: RegionSet) -> Self {
        self.params.regions = regions;
        self
    }

    /// Set the scoring scope.
    pub fn with_scope(mut self, scope: ScoringScope) -> Self {
        self.params.scope = scope;
        self
    }

    /// Set the cleaning mode.
    pub fn with_cleaning(mut self, cleaning: Cleaning) -> Self {
        self.params.cleaning = cleaning;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = Some(seed);
        self
    }
}

/// Points of one class split out of the input, in input order.
struct Split<L> {
    minority_label: L,
    minority: Vec<Vec<f64>>,
    majority: Vec<Vec<f64>>,
    majority_labels: Vec<L>,
}

fn split_classes<L: Clone + Ord>(points: &[Vec<f64>], labels: &[L]) -> Result<Split<L>> {
    let mut counts: BTreeMap<&L, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    if counts.len() != 2 {
        return Err(Error::ClassCount {
            found: counts.len(),
        });
    }

    // Ties go to the smaller label: `min_by_key` keeps the first minimum.
    let minority_label = counts
        .iter()
        .min_by_key(|(_, &count)| count)
        .map(|(&label, _)| label.clone())
        .ok_or(Error::EmptyInput)?;

    let mut split = Split {
        minority_label,
        minority: Vec::new(),
        majority: Vec::new(),
        majority_labels: Vec::new(),
    };
    for (point, label) in points.iter().zip(labels) {
        if *label == split.minority_label {
            split.minority.push(point.clone());
        } else {
            split.majority.push(point.clone());
            split.majority_labels.push(label.clone());
        }
    }
    Ok(split)
}

impl<L: Clone + Ord> Resampler<L> for Ccr {
    fn fit_sample(&self, points: &[Vec<f64>], labels: &[L]) -> Result<Resampled<L>> {
        let params = &self.params;
        if points.len() != labels.len() {
            return Err(Error::LengthMismatch {
                points: points.len(),
                labels: labels.len(),
            });
        }
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }
        params.validate()?;
        let dim = check_dimensions(points)?;

        let Split {
            minority_label,
            minority,
            majority,
            mut majority_labels,
        } = split_classes(points, labels)?;
        let n = params
            .n
            .unwrap_or_else(|| majority.len().saturating_sub(minority.len()));

        debug!(
            minority = minority.len(),
            majority = majority.len(),
            dim,
            n,
            energy = params.energy,
            p_norm = params.p_norm,
            "starting CCR"
        );

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        // Solve.
        let distances = DistanceMatrix::compute(&minority, &majority, params.p_norm);
        let assignments: Vec<RadiusAssignment> = (0..distances.rows())
            .into_par_iter()
            .map(|i| RadiusAssignment::from_row(distances.row(i), params.energy))
            .collect();
        let radii: Vec<f64> = assignments.iter().map(RadiusAssignment::radius).collect();
        let engulfed: Vec<usize> = assignments.iter().map(|a| a.solution.engulfed).collect();
        check_radii(&radii)?;

        debug!(
            min_radius = radii.iter().copied().fold(f64::INFINITY, f64::min),
            max_radius = radii.iter().copied().fold(0.0, f64::max),
            engulfed = engulfed.iter().sum::<usize>(),
            "solved radii"
        );

        // Translate.
        let mut cleaned = majority.clone();
        let field = match params.cleaning {
            Cleaning::Translate => {
                let field = accumulate_translations(
                    &mut rng,
                    &minority,
                    &mut cleaned,
                    &assignments,
                    &distances,
                    params.p_norm,
                )?;
                field.apply(&mut cleaned);
                field
            }
            Cleaning::Remove => {
                let field = claim_engulfed(majority.len(), &assignments);
                majority_labels = majority_labels
                    .into_iter()
                    .enumerate()
                    .filter_map(|(j, label)| (field.claims(j) == 0).then_some(label))
                    .collect();
                cleaned = field.remove_claimed(cleaned);
                field
            }
        };
        debug!(
            claimed = field.n_claimed(),
            kept = cleaned.len(),
            cleaning = ?params.cleaning,
            "cleaned majority"
        );

        // Generate.
        let generator = SyntheticGenerator {
            minority: &minority,
            radii: &radii,
            sphere: params.sphere,
            p_norm: params.p_norm,
        };
        let (synthetic, n_synthetic) = match (params.filters_regions(), params.gamma) {
            (true, Some(gamma)) => {
                let gamma = match gamma {
                    Gamma::Auto => silverman_gamma(&majority),
                    Gamma::Fixed(g) => g,
                };
                let filter = RegionFilter {
                    majority: &majority,
                    gamma,
                    threshold: params.threshold,
                    regions: params.regions,
                    n_samples: params.n_samples,
                };
                match params.scope {
                    ScoringScope::Global => generator.global(&mut rng, n, &filter),
                    ScoringScope::PerSeed => {
                        let counts = allocate_counts(n, &radii)?;
                        (generator.per_seed(&mut rng, &counts, &filter), counts)
                    }
                }
            }
            _ => {
                let counts = allocate_counts(n, &radii)?;
                (generator.uniform(&mut rng, &counts), counts)
            }
        };
        debug!(synthetic = synthetic.len(), "generated synthetic points");

        let n_out = cleaned.len() + minority.len() + synthetic.len();
        let mut out_labels = Vec::with_capacity(n_out);
        out_labels.extend(majority_labels);
        out_labels.extend(
            std::iter::repeat(minority_label.clone()).take(minority.len() + synthetic.len()),
        );

        let mut out_points = cleaned;
        out_points.reserve(minority.len() + synthetic.len());
        out_points.extend(minority);
        out_points.extend(synthetic);

        Ok(Resampled {
            points: out_points,
            labels: out_labels,
            minority_label,
            radii,
            engulfed,
            n_synthetic,
        })
    }
}
