//! Drilling: a cylindrical hole along a single axis.
//!
//! The axis enters the blank through the reference side. Its direction is
//! given by a horizontal angle measured from the side's x axis toward its y
//! axis, and an inclination measured from the side surface into the blank.

use super::common::SideContext;
use crate::params::{Interval, ParameterMap, ParameterMapBuilder, ANGLE, DEPTH, JOINT_SIZE, START_X, START_Y};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::{Beam, REF_SIDE_COUNT};
use joinery_kernel_geom::{intersection_line_plane_parameter, Line};
use joinery_kernel_math::{normalize_degrees, Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Horizontal direction of the drill axis.
const DRILL_ANGLE: Interval = Interval::new(0.0, 360.0);

/// A drilled hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drilling {
    /// Entry point along the blank.
    pub start_x: f64,
    /// Entry point across the side.
    pub start_y: f64,
    /// Horizontal direction in degrees, from x toward y.
    pub angle: f64,
    /// Angle between the side surface and the axis in degrees.
    pub inclination: f64,
    /// The hole stops inside the blank.
    pub depth_limited: bool,
    /// Length of the hole along its axis (0 when through).
    pub depth: f64,
    /// Hole diameter.
    pub diameter: f64,
}

/// Axis of a drilled hole, from the entry point to where it stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrillingGeometry {
    /// Hole axis.
    pub axis: Line,
    /// Hole diameter.
    pub diameter: f64,
}

impl Drilling {
    /// BTLx element name.
    pub const NAME: &'static str = "Drilling";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "StartX",
        "StartY",
        "Angle",
        "Inclination",
        "DepthLimited",
        "Depth",
        "Diameter",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        DRILL_ANGLE.check("Angle", self.angle)?;
        ANGLE.check("Inclination", self.inclination)?;
        DEPTH.check("Depth", self.depth)?;
        JOINT_SIZE.check("Diameter", self.diameter)
    }

    /// Derive a drilling from its axis.
    ///
    /// Without `ref_side` the side the line enters first is chosen. With an
    /// explicit side the line is reversed if it points out of that side.
    pub fn from_line(
        line: &Line,
        diameter: f64,
        beam: &Beam,
        ref_side: Option<usize>,
        tol: &Tolerance,
    ) -> Result<Processing> {
        let (side, line) = match ref_side {
            Some(index) => {
                let side = SideContext::new(beam, index)?;
                let line = if line.vector().dot(&side.n()) > 0.0 {
                    line.reversed()
                } else {
                    *line
                };
                (side, line)
            }
            None => (entry_side(line, beam, tol)?, *line),
        };
        let t = intersection_line_plane_parameter(&line, &side.plane()).ok_or(
            ProcessingError::LinePlaneParallel {
                line,
                plane: side.plane(),
                context: "drilling axis",
            },
        )?;
        let entry = line.point_at(t);
        side.require_on_surface(&entry, tol, "drilling entry point")?;

        let d = line.direction();
        let dn = d.dot(&side.n());
        let inclination = (-dn).clamp(-1.0, 1.0).asin().to_degrees();
        let horizontal = d - side.n() * dn;
        let angle = if horizontal.norm() < tol.angular {
            0.0
        } else {
            normalize_degrees(horizontal.dot(&side.y()).atan2(horizontal.dot(&side.x())).to_degrees())
        };

        let depth_limited = beam.contains_strictly(&line.end, tol);
        let depth = if depth_limited {
            (line.end - entry).dot(&d).max(0.0)
        } else {
            0.0
        };
        let (start_x, start_y, _) = side.coordinates(&entry);
        debug!(
            kind = Self::NAME,
            ref_side = side.index,
            start_x,
            start_y,
            angle,
            inclination,
            depth_limited,
            depth,
            "derived processing"
        );
        Ok(Processing::new(
            Self {
                start_x,
                start_y,
                angle,
                inclination,
                depth_limited,
                depth,
                diameter,
            },
            side.index,
        )?)
    }

    /// Unit direction of the axis into the blank.
    fn direction(&self, side: &SideContext) -> Vec3 {
        let (sa, ca) = self.angle.to_radians().sin_cos();
        let (si, ci) = self.inclination.to_radians().sin_cos();
        (side.x() * ca + side.y() * sa) * ci - side.n() * si
    }

    /// The hole axis on the given blank.
    ///
    /// A through hole runs until the axis leaves the blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<DrillingGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let entry = side.point(self.start_x, self.start_y, 0.0);
        let d = self.direction(&side);
        let length = if self.depth_limited {
            self.depth
        } else {
            beam.ray_exit_distance(&entry, &d).ok_or_else(|| {
                ProcessingError::DegenerateGeometry(format!(
                    "drilling axis from {entry:?} along {d:?} does not pass through the blank"
                ))
            })?
        };
        Ok(DrillingGeometry {
            axis: Line::from_point_and_vector(entry, d * length),
            diameter: self.diameter,
        })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("Angle", self.angle)
            .float("Inclination", self.inclination)
            .flag("DepthLimited", self.depth_limited)
            .float("Depth", self.depth)
            .float("Diameter", self.diameter)
            .build()
    }
}

/// The side the line enters first, measured along the line.
fn entry_side(line: &Line, beam: &Beam, tol: &Tolerance) -> Result<SideContext> {
    let mut best: Option<(f64, SideContext)> = None;
    for index in 0..REF_SIDE_COUNT {
        let side = SideContext::new(beam, index)?;
        if line.vector().dot(&side.n()) >= -tol.angular {
            continue;
        }
        let Some(t) = intersection_line_plane_parameter(line, &side.plane()) else {
            continue;
        };
        let (u, v, _) = side.coordinates(&line.point_at(t));
        if !side.surface.contains_uv(u, v, tol) {
            continue;
        }
        if best.as_ref().map_or(true, |(bt, _)| t < *bt) {
            best = Some((t, side));
        }
    }
    best.map(|(_, side)| side).ok_or_else(|| {
        debug!(kind = Drilling::NAME, ?line, "drilling axis enters no reference side");
        ProcessingError::InvalidInput {
            kind: Drilling::NAME,
            reason: format!("line {line:?} does not enter the blank through any reference side"),
        }
    })
}
