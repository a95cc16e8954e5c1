//! Synthetic minority generation.
//!
//! Each minority point receives a share of the `n` synthetic points in inverse
//! proportion to its radius: small spheres mark crowded, hard minority points.
//! Shares are rounded with the largest-remainder method so they always sum to
//! exactly `n`.
//!
//! ## Region scoring
//!
//! Candidates can be filtered by how close they sit to the majority class,
//! measured with an RBF kernel density estimate
//!
//! ```text
//! score(x) = Σ_j exp(-γ · d(x, majority_j)²)
//! ```
//!
//! and classified against a pair of thresholds into low (`L`), equal (`E`) or
//! high (`H`) density regions. Only candidates whose region is allowed survive.

use super::sphere::SphereKind;
use super::util::lp_distance;
use crate::error::{Error, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Split `n` synthetic points across minority points, weighting each by `1 / radius`.
///
/// Counts always sum to `n`. A radius that is zero, negative, or so small that
/// its weight overflows is rejected with [`Error::DegenerateRadius`].
pub fn allocate_counts(n: usize, radii: &[f64]) -> Result<Vec<usize>> {
    check_radii(radii)?;
    if radii.is_empty() {
        return Ok(Vec::new());
    }
    let weights: Vec<f64> = radii.iter().map(|r| 1.0 / r).collect();

    let total: f64 = weights.iter().sum();
    let quotas: Vec<f64> = weights.iter().map(|w| n as f64 * w / total).collect();
    let mut counts: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();

    let assigned: usize = counts.iter().sum();
    // Floating error can push the floors past `n` by one in extreme cases.
    if assigned > n {
        let mut order: Vec<usize> = (0..counts.len()).collect();
        order.sort_by(|&a, &b| {
            let ra = quotas[a] - counts[a] as f64;
            let rb = quotas[b] - counts[b] as f64;
            ra.total_cmp(&rb)
        });
        let mut excess = assigned - n;
        for i in order {
            if excess == 0 {
                break;
            }
            if counts[i] > 0 {
                counts[i] -= 1;
                excess -= 1;
            }
        }
        return Ok(counts);
    }

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = quotas[a] - counts[a] as f64;
        let rb = quotas[b] - counts[b] as f64;
        rb.total_cmp(&ra)
    });
    for &i in order.iter().cycle().take(n - assigned) {
        counts[i] += 1;
    }
    Ok(counts)
}

/// Reject radii that cannot be inverted into a finite allocation weight.
pub fn check_radii(radii: &[f64]) -> Result<()> {
    for (index, &radius) in radii.iter().enumerate() {
        if !(radius > 0.0) || !(1.0 / radius).is_finite() {
            return Err(Error::DegenerateRadius { index, radius });
        }
    }
    Ok(())
}

/// RBF kernel density of `x` against the majority points.
pub fn rbf_score(x: &[f64], majority: &[Vec<f64>], gamma: f64, p_norm: f64) -> f64 {
    majority
        .iter()
        .map(|m| {
            let d = lp_distance(x, m, p_norm);
            (-gamma * d * d).exp()
        })
        .sum()
}

/// Silverman's rule of thumb over all majority coordinates:
/// `1.06 · σ · m^(-1/5)` with σ the population standard deviation.
pub fn silverman_gamma(majority: &[Vec<f64>]) -> f64 {
    let values = majority.iter().flatten();
    let count = majority.iter().map(Vec::len).sum::<usize>();
    if count == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / count as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
    1.06 * var.sqrt() * (majority.len() as f64).powf(-0.2)
}

/// Density region of a scored candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Score at or below the lower threshold.
    Low,
    /// Score strictly between the thresholds.
    Equal,
    /// Score at or above the upper threshold.
    High,
}

impl Region {
    /// One-letter code (`L`, `E`, `H`).
    pub fn symbol(self) -> char {
        match self {
            Region::Low => 'L',
            Region::Equal => 'E',
            Region::High => 'H',
        }
    }
}

/// A subset of {L, E, H}; parsed from and displayed as strings like `"LE"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionSet {
    low: bool,
    equal: bool,
    high: bool,
}

impl RegionSet {
    /// All three regions (disables filtering).
    pub const ALL: RegionSet = RegionSet {
        low: true,
        equal: true,
        high: true,
    };

    /// Set containing the given regions.
    pub fn new(regions: &[Region]) -> Self {
        let mut set = RegionSet {
            low: false,
            equal: false,
            high: false,
        };
        for r in regions {
            match r {
                Region::Low => set.low = true,
                Region::Equal => set.equal = true,
                Region::High => set.high = true,
            }
        }
        set
    }

    /// Whether `region` is allowed.
    pub fn contains(&self, region: Region) -> bool {
        match region {
            Region::Low => self.low,
            Region::Equal => self.equal,
            Region::High => self.high,
        }
    }

    /// Whether every region is allowed.
    pub fn is_all(&self) -> bool {
        self.low && self.equal && self.high
    }

    /// Whether no region is allowed.
    pub fn is_empty(&self) -> bool {
        !(self.low || self.equal || self.high)
    }
}

impl Default for RegionSet {
    fn default() -> Self {
        RegionSet::new(&[Region::Equal])
    }
}

impl FromStr for RegionSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut regions = Vec::with_capacity(3);
        for c in s.chars() {
            regions.push(match c.to_ascii_uppercase() {
                'L' => Region::Low,
                'E' => Region::Equal,
                'H' => Region::High,
                _ => {
                    return Err(Error::InvalidParameter {
                        name: "regions",
                        message: "expected a combination of L, E and H",
                    })
                }
            });
        }
        Ok(RegionSet::new(&regions))
    }
}

impl TryFrom<String> for RegionSet {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RegionSet> for String {
    fn from(set: RegionSet) -> Self {
        set.to_string()
    }
}

impl fmt::Display for RegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for region in [Region::Low, Region::Equal, Region::High] {
            if self.contains(region) {
                write!(f, "{}", region.symbol())?;
            }
        }
        Ok(())
    }
}

/// Lower and upper score thresholds separating L, E and H.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Scores at or below this are [`Region::Low`].
    pub lower: f64,
    /// Scores at or above this are [`Region::High`].
    pub upper: f64,
}

impl Thresholds {
    /// Thresholds a `fraction` of the way from the mean toward the min and max score.
    pub fn around_mean(scores: &[f64], fraction: f64) -> Self {
        let (min, max) = min_max(scores.iter().copied());
        let mean = scores.iter().sum::<f64>() / scores.len().max(1) as f64;
        Self::around(mean, min, max, fraction)
    }

    /// Thresholds anchored at a seed's own score; the seed score counts toward min and max.
    pub fn around_seed(seed: f64, scores: &[f64], fraction: f64) -> Self {
        let (min, max) = min_max(scores.iter().copied().chain(std::iter::once(seed)));
        Self::around(seed, min, max, fraction)
    }

    fn around(center: f64, min: f64, max: f64, fraction: f64) -> Self {
        Self {
            lower: center - fraction * (center - min),
            upper: center + fraction * (max - center),
        }
    }

    /// Region of a score. Low wins when the thresholds coincide.
    pub fn classify(&self, score: f64) -> Region {
        if score <= self.lower {
            Region::Low
        } else if score >= self.upper {
            Region::High
        } else {
            Region::Equal
        }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Region filter configuration resolved for one run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegionFilter<'a> {
    pub majority: &'a [Vec<f64>],
    pub gamma: f64,
    pub threshold: f64,
    pub regions: RegionSet,
    pub n_samples: usize,
}

impl RegionFilter<'_> {
    fn score(&self, x: &[f64], p_norm: f64) -> f64 {
        rbf_score(x, self.majority, self.gamma, p_norm)
    }
}

/// Draws synthetic points inside the solved minority spheres.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SyntheticGenerator<'a> {
    pub minority: &'a [Vec<f64>],
    pub radii: &'a [f64],
    pub sphere: SphereKind,
    pub p_norm: f64,
}

impl SyntheticGenerator<'_> {
    fn candidate<R: Rng + ?Sized>(&self, rng: &mut R, i: usize) -> Vec<f64> {
        let center = &self.minority[i];
        let offset = self
            .sphere
            .sample(rng, center.len(), self.radii[i], self.p_norm);
        center.iter().zip(offset).map(|(c, o)| c + o).collect()
    }

    /// `counts[i]` unfiltered points around each minority point.
    pub fn uniform<R: Rng + ?Sized>(&self, rng: &mut R, counts: &[usize]) -> Vec<Vec<f64>> {
        let mut out = Vec::with_capacity(counts.iter().sum());
        for (i, &count) in counts.iter().enumerate() {
            for _ in 0..count {
                out.push(self.candidate(rng, i));
            }
        }
        out
    }

    /// `counts[i]` points per minority point, each drawn from that point's own
    /// filtered candidate pool. The seed itself is always an accepted candidate.
    pub fn per_seed<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        counts: &[usize],
        filter: &RegionFilter<'_>,
    ) -> Vec<Vec<f64>> {
        let mut out = Vec::with_capacity(counts.iter().sum());
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pool: Vec<Vec<f64>> = (0..filter.n_samples)
                .map(|_| self.candidate(rng, i))
                .collect();
            let scores: Vec<f64> = pool.iter().map(|x| filter.score(x, self.p_norm)).collect();
            let seed_score = filter.score(&self.minority[i], self.p_norm);
            let thresholds = Thresholds::around_seed(seed_score, &scores, filter.threshold);

            let mut accepted: Vec<&Vec<f64>> = vec![&self.minority[i]];
            accepted.extend(
                pool.iter()
                    .zip(&scores)
                    .filter(|(_, &s)| filter.regions.contains(thresholds.classify(s)))
                    .map(|(x, _)| x),
            );

            for k in draw_indices(rng, accepted.len(), count) {
                out.push(accepted[k].clone());
            }
        }
        out
    }

    /// Exactly `n` points drawn from one pool shared by all minority points.
    ///
    /// Returns the points and how many came from each minority sphere.
    pub fn global<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        filter: &RegionFilter<'_>,
    ) -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut per_seed = vec![0; self.minority.len()];
        if n == 0 {
            return (Vec::new(), per_seed);
        }

        let mut pool = Vec::with_capacity(self.minority.len() * filter.n_samples);
        for i in 0..self.minority.len() {
            for _ in 0..filter.n_samples {
                pool.push((i, self.candidate(rng, i)));
            }
        }
        let scores: Vec<f64> = pool
            .iter()
            .map(|(_, x)| filter.score(x, self.p_norm))
            .collect();
        let thresholds = Thresholds::around_mean(&scores, filter.threshold);

        let mut accepted: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, &s)| filter.regions.contains(thresholds.classify(s)))
            .map(|(k, _)| k)
            .collect();
        if accepted.is_empty() {
            warn!(
                regions = %filter.regions,
                pool = pool.len(),
                "no candidate fell in an allowed region; drawing from the unfiltered pool"
            );
            accepted = (0..pool.len()).collect();
        }

        let mut out = Vec::with_capacity(n);
        for k in draw_indices(rng, accepted.len(), n) {
            let (seed, x) = &pool[accepted[k]];
            per_seed[*seed] += 1;
            out.push(x.clone());
        }
        (out, per_seed)
    }
}

/// `amount` indices below `len`: distinct when possible, with replacement otherwise.
fn draw_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, amount: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    if amount <= len {
        rand::seq::index::sample(rng, len, amount).into_vec()
    } else {
        (0..amount).map(|_| rng.random_range(0..len)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_sums_to_n() {
        let radii = [0.1, 0.2, 0.3, 0.7, 1.9];
        for n in [0, 1, 2, 7, 13, 100, 1001] {
            let counts = allocate_counts(n, &radii).unwrap();
            assert_eq!(counts.iter().sum::<usize>(), n, "n={n}");
        }
    }

    #[test]
    fn smaller_radius_gets_more_points() {
        let counts = allocate_counts(30, &[1.0, 2.0]).unwrap();
        assert_eq!(counts, vec![20, 10]);

        let counts = allocate_counts(10, &[0.5, 1.0, 4.0]).unwrap();
        assert!(counts[0] >= counts[1] && counts[1] >= counts[2]);
        assert_eq!(counts.iter().sum::<usize>(), 10);
    }

    #[test]
    fn equal_radii_split_remainder_by_index() {
        let counts = allocate_counts(5, &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn zero_radius_is_reported() {
        let err = allocate_counts(3, &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::DegenerateRadius { index: 1, .. }));
        assert!(allocate_counts(3, &[f64::MIN_POSITIVE / 1e6]).is_err());
    }

    #[test]
    fn rbf_score_decays_with_distance() {
        let majority = vec![vec![0.0, 0.0]];
        let near = rbf_score(&[0.1, 0.0], &majority, 1.0, 2.0);
        let far = rbf_score(&[3.0, 0.0], &majority, 1.0, 2.0);
        assert!(near > far);
        assert!((rbf_score(&[0.0, 0.0], &majority, 1.0, 2.0) - 1.0).abs() < 1e-12);
        assert!((rbf_score(&[2.0, 0.0], &majority, 0.5, 2.0) - (-2.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn silverman_matches_hand_computation() {
        // Coordinates {0, 2, 0, 2}: mean 1, population std 1, m = 2.
        let majority = vec![vec![0.0, 2.0], vec![0.0, 2.0]];
        let g = silverman_gamma(&majority);
        assert!((g - 1.06 * 2f64.powf(-0.2)).abs() < 1e-12);
    }

    #[test]
    fn thresholds_classify_three_regions() {
        let t = Thresholds::around_mean(&[0.0, 1.0, 2.0], 0.5);
        assert_eq!(t, Thresholds { lower: 0.5, upper: 1.5 });
        assert_eq!(t.classify(0.2), Region::Low);
        assert_eq!(t.classify(1.0), Region::Equal);
        assert_eq!(t.classify(1.9), Region::High);

        let t = Thresholds::around_seed(3.0, &[1.0, 2.0], 0.5);
        assert_eq!(t, Thresholds { lower: 2.0, upper: 3.0 });
    }

    #[test]
    fn flat_scores_classify_as_low() {
        let t = Thresholds::around_mean(&[0.4, 0.4], 0.33);
        assert_eq!(t.classify(0.4), Region::Low);
    }

    #[test]
    fn region_set_parses_and_displays() {
        let set: RegionSet = "le".parse().unwrap();
        assert!(set.contains(Region::Low) && set.contains(Region::Equal));
        assert!(!set.contains(Region::High));
        assert_eq!(set.to_string(), "LE");
        assert!("HEL".parse::<RegionSet>().unwrap().is_all());
        assert!("".parse::<RegionSet>().unwrap().is_empty());
        assert!("LX".parse::<RegionSet>().is_err());
    }

    #[test]
    fn draw_indices_switches_to_replacement() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut distinct = draw_indices(&mut rng, 5, 5);
        distinct.sort_unstable();
        assert_eq!(distinct, vec![0, 1, 2, 3, 4]);

        let with_replacement = draw_indices(&mut rng, 2, 7);
        assert_eq!(with_replacement.len(), 7);
        assert!(with_replacement.iter().all(|&k| k < 2));
    }

    #[test]
    fn per_seed_pool_always_contains_the_seed() {
        // Only high-density candidates allowed, and the seed sits on the majority point.
        let minority = vec![vec![0.0, 0.0]];
        let majority = vec![vec![0.0, 0.0]];
        let radii = [1.0];
        let generator = SyntheticGenerator {
            minority: &minority,
            radii: &radii,
            sphere: SphereKind::Lp,
            p_norm: 2.0,
        };
        let filter = RegionFilter {
            majority: &majority,
            gamma: 1.0,
            threshold: 0.0,
            regions: RegionSet::new(&[Region::High]),
            n_samples: 20,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let out = generator.per_seed(&mut rng, &[3], &filter);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|x| x == &minority[0]));
    }

    #[test]
    fn global_pool_draws_exactly_n() {
        let minority = vec![vec![0.0, 0.0], vec![4.0, 0.0]];
        let majority = vec![vec![1.0, 0.0], vec![5.0, 1.0]];
        let radii = [0.5, 1.5];
        let generator = SyntheticGenerator {
            minority: &minority,
            radii: &radii,
            sphere: SphereKind::Taxicab,
            p_norm: 1.0,
        };
        let filter = RegionFilter {
            majority: &majority,
            gamma: 0.5,
            threshold: 0.33,
            regions: RegionSet::new(&[Region::Low, Region::Equal]),
            n_samples: 25,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let (out, per_seed) = generator.global(&mut rng, 12, &filter);
        assert_eq!(out.len(), 12);
        assert_eq!(per_seed.iter().sum::<usize>(), 12);
    }
}
