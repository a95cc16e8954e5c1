//! Combined Cleaning and Resampling.
//!
//! `ccr` oversamples the minority class of a two-class dataset of dense
//! vectors. Majority points are pushed out of energy-bounded spheres around
//! minority points, and synthetic minority points are drawn inside those
//! spheres.
//!
//! The primary public API is under [`resample`], which provides:
//! - [`Ccr`] with its [`CcrParams`] (energy, p-norm, sampler, region scoring)
//! - the building blocks: Lp distances, the radius solver, the translation
//!   field, and the ball samplers

#![forbid(unsafe_code)]

pub mod error;
pub mod resample;

pub use error::{Error, Result};
pub use resample::{
    Ccr, CcrParams, Cleaning, Gamma, Region, RegionSet, Resampled, Resampler, ScoringScope,
    SphereKind, Strategy,
};
