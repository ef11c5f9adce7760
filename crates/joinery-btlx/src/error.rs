//! Error types for processing derivation.

use joinery_kernel_blank::BlankError;
use joinery_kernel_geom::{Line, Plane};
use joinery_kernel_math::Point3;
use std::path::PathBuf;
use thiserror::Error;

/// A parameter value rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Numeric value outside its closed interval.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Parameter key.
        field: &'static str,
        /// Rejected value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// Numeric value inside an excluded open interval.
    #[error("{field} = {value} lies in the excluded interval ({min}, {max})")]
    Excluded {
        /// Parameter key.
        field: &'static str,
        /// Rejected value.
        value: f64,
        /// Lower bound of the excluded interval (exclusive).
        min: f64,
        /// Upper bound of the excluded interval (exclusive).
        max: f64,
    },

    /// Text value that is not one of the allowed literals.
    #[error("{field}: '{value}' is not one of {allowed}")]
    InvalidChoice {
        /// Parameter key.
        field: &'static str,
        /// Rejected literal.
        value: String,
        /// Allowed literals.
        allowed: &'static str,
    },

    /// Reference side index outside `0..6`.
    #[error("invalid reference side index {0} (expected 0..=5)")]
    InvalidRefSide(usize),

    /// Neither step depth nor heel depth is set.
    #[error("step depth and heel depth are both zero")]
    InconsistentStepShape,

    /// Stored step shape disagrees with the step and heel depths.
    #[error("step shape '{stored}' does not match step/heel depths (expected '{expected}')")]
    StepShapeMismatch {
        /// Shape carried by the processing.
        stored: &'static str,
        /// Shape implied by the depths.
        expected: &'static str,
    },

    /// A required text value is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// An update replaced the feature with another kind.
    #[error("update changed processing kind from {from} to {to}")]
    KindChanged {
        /// Kind before the update.
        from: &'static str,
        /// Kind after the update.
        to: &'static str,
    },
}

/// Errors from deriving or applying a processing.
#[derive(Debug, Clone, Error)]
pub enum ProcessingError {
    /// A parameter failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The blank rejected a reference side query.
    #[error(transparent)]
    Blank(#[from] BlankError),

    /// A required line/plane intersection does not exist.
    #[error("{context}: line {line:?} does not intersect plane {plane:?}")]
    LinePlaneParallel {
        /// Line that was intersected.
        line: Line,
        /// Plane it runs parallel to.
        plane: Plane,
        /// What was being computed.
        context: &'static str,
    },

    /// Two planes that must intersect are parallel.
    #[error("planes are parallel: {hint}")]
    ParallelPlanes {
        /// The offending planes.
        planes: [Plane; 2],
        /// Suggested remedy.
        hint: &'static str,
    },

    /// An intersection lies outside the bounded reference surface.
    #[error("{context}: point {point:?} lies outside reference side {ref_side}")]
    OutsideSurface {
        /// Reference side that was tested.
        ref_side: usize,
        /// Offending point.
        point: Point3,
        /// What was being computed.
        context: &'static str,
    },

    /// Input geometry is degenerate for the requested feature.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Input geometry does not fit the feature's shape requirements.
    #[error("invalid input for {kind}: {reason}")]
    InvalidInput {
        /// Feature kind name.
        kind: &'static str,
        /// Explanation.
        reason: String,
    },

    /// The geometry kernel could not realize one element of a feature.
    #[error("{kind}: failed to apply {element}: {reason}")]
    Application {
        /// Feature kind name.
        kind: &'static str,
        /// Label of the geometry element that failed.
        element: String,
        /// Explanation from the geometry kernel.
        reason: String,
    },
}

/// Errors from loading [`BtlxSettings`](crate::BtlxSettings).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings text is not valid TOML for the settings schema.
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting value is out of range.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Setting name.
        field: &'static str,
        /// Explanation.
        reason: String,
    },
}

/// Result type for processing derivations.
pub type Result<T> = std::result::Result<T, ProcessingError>;
