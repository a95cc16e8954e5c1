use thiserror::Error;

/// Errors returned by the resampling routines in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Points and labels have different lengths.
    #[error("input shape: {points} points but {labels} labels")]
    LengthMismatch {
        /// Number of points.
        points: usize,
        /// Number of labels.
        labels: usize,
    },

    /// The dataset does not contain exactly two classes.
    #[error("input shape: expected exactly two classes, found {found}")]
    ClassCount {
        /// Number of distinct labels found.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Points have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A minority point ended up with a radius that cannot weight the synthetic allocation.
    #[error("degenerate radius {radius} for minority point {index}")]
    DegenerateRadius {
        /// Index of the minority point (within the minority subset).
        index: usize,
        /// The offending radius.
        radius: f64,
    },

    /// A minority/majority pair stayed coincident after jittering.
    #[error(
        "degenerate distance between minority point {minority} and majority point {majority} \
         after {attempts} jitter attempts"
    )]
    DegenerateDistance {
        /// Index of the minority point (within the minority subset).
        minority: usize,
        /// Index of the majority point (within the majority subset).
        majority: usize,
        /// Number of jitter attempts made.
        attempts: usize,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
