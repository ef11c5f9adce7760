//! Start/end orientation of a feature relative to its reference side.

use crate::ValidationError;
use joinery_kernel_geom::{Frame, Plane};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which end of the blank a feature is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// The feature removes material toward the start of the blank.
    Start,
    /// The feature removes material toward the end of the blank.
    End,
}

impl Orientation {
    /// BTLx literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Start => "start",
            Orientation::End => "end",
        }
    }

    /// The opposite orientation.
    pub fn flipped(&self) -> Self {
        match self {
            Orientation::Start => Orientation::End,
            Orientation::End => Orientation::Start,
        }
    }

    /// `+1.0` for end, `-1.0` for start.
    pub fn sign(&self) -> f64 {
        match self {
            Orientation::Start => -1.0,
            Orientation::End => 1.0,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Orientation::Start),
            "end" => Ok(Orientation::End),
            other => Err(ValidationError::InvalidChoice {
                field: "Orientation",
                value: other.to_string(),
                allowed: "start, end",
            }),
        }
    }
}

/// How a feature maps "reference point behind the cutting plane" to an orientation.
///
/// Feature kinds disagree on this mapping and each keeps its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationConvention {
    /// Point behind the plane means [`Orientation::End`].
    BehindIsEnd,
    /// Point behind the plane means [`Orientation::Start`].
    BehindIsStart,
}

/// Classify a cutting plane against a reference side's origin.
pub fn classify(ref_side: &Frame, plane: &Plane, convention: OrientationConvention) -> Orientation {
    let behind = plane.is_point_behind(&ref_side.point);
    match (convention, behind) {
        (OrientationConvention::BehindIsEnd, true) | (OrientationConvention::BehindIsStart, false) => {
            Orientation::End
        }
        (OrientationConvention::BehindIsEnd, false) | (OrientationConvention::BehindIsStart, true) => {
            Orientation::Start
        }
    }
}
