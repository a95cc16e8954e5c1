//! Energy-bounded radius growth.
//!
//! Each minority point owns a sphere that starts at radius zero and grows
//! outward. Growing by `step` while `k` majority points are already inside
//! costs `step * (k + 1)` energy: every engulfed majority point has to be
//! pushed along with the boundary. The sphere absorbs majority points in
//! order of distance until the budget cannot pay for the next segment; the
//! leftover energy then widens the sphere by `remaining / (k + 1)`.
//!
//! ```text
//! energy ─┬─ step_0 * 1 ─┬─ step_1 * 2 ─┬─ ... ─┬─ remaining / (k + 1)
//! radius  0 ──────────── d_0 ─────────── d_1 ── ... ── d_{k-1} ───────── r
//! ```
//!
//! A majority point exactly at the stopping boundary is not engulfed: it
//! would need a strictly positive push that the budget no longer covers.

use super::util::argsort;

/// Outcome of growing one minority point's sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusSolution {
    /// Final sphere radius.
    pub radius: f64,
    /// Number of majority points strictly inside the sphere.
    pub engulfed: usize,
    /// Energy spent on segments that ended at a majority point (`Σ step_k * (k + 1)`).
    pub engulfing_cost: f64,
}

/// Grow a sphere over `sorted_distances` (ascending) with the given energy.
pub fn solve_radius(sorted_distances: &[f64], energy: f64) -> RadiusSolution {
    let mut remaining = energy;
    let mut radius = 0.0;
    let mut engulfed = 0;
    let mut engulfing_cost = 0.0;

    loop {
        if engulfed == sorted_distances.len() {
            // Everything is inside: spread the rest over all engulfed points.
            radius += remaining / engulfed.max(1) as f64;
            break;
        }

        let change = remaining / (engulfed + 1) as f64;
        let next = sorted_distances[engulfed];
        if next >= radius + change {
            radius += change;
            break;
        }

        let last = if engulfed == 0 {
            0.0
        } else {
            sorted_distances[engulfed - 1]
        };
        let cost = (next - last) * (engulfed + 1) as f64;
        radius = next;
        remaining = (remaining - cost).max(0.0);
        engulfing_cost += cost;
        engulfed += 1;
    }

    RadiusSolution {
        radius,
        engulfed,
        engulfing_cost,
    }
}

/// A solved sphere together with the majority indices it engulfs.
#[derive(Debug, Clone)]
pub struct RadiusAssignment {
    /// Radius and engulfment count.
    pub solution: RadiusSolution,
    order: Vec<usize>,
}

impl RadiusAssignment {
    /// Solve one row of the distance matrix (distances from one minority point).
    pub fn from_row(row: &[f64], energy: f64) -> Self {
        let order = argsort(row);
        let sorted: Vec<f64> = order.iter().map(|&j| row[j]).collect();
        let solution = solve_radius(&sorted, energy);
        Self { solution, order }
    }

    /// Sphere radius.
    pub fn radius(&self) -> f64 {
        self.solution.radius
    }

    /// Majority indices inside the sphere, nearest first.
    pub fn engulfed_indices(&self) -> &[usize] {
        &self.order[..self.solution.engulfed]
    }
}
