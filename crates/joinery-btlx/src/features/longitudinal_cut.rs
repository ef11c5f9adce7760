//! Longitudinal cut: a rip along the blank, optionally stopped at both ends
//! and at a depth.

use super::common::SideContext;
use crate::params::{
    Interval, ParameterMap, ParameterMapBuilder, ToolPosition, ANGLE, DEPTH, LENGTH, START_X, START_Y,
};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{intersection_line_plane_parameter, Line, Plane};
use joinery_kernel_math::{Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tilt of the cut away from the side normal.
const INCLINATION: Interval = Interval::new(-89.9, 89.9);

/// Optional bounds of a longitudinal cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongitudinalCutOptions {
    /// Plane stopping the cut toward the start of the blank.
    pub start_plane: Option<Plane>,
    /// Plane stopping the cut toward the end of the blank.
    pub end_plane: Option<Plane>,
    /// Plane at the bottom of the cut.
    pub depth_plane: Option<Plane>,
    /// Blade position relative to the cut line.
    pub tool_position: ToolPosition,
}

/// A rip cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalCut {
    /// Start of the cut along the blank.
    pub start_x: f64,
    /// Where the cut meets the reference side.
    pub start_y: f64,
    /// Tilt from the side normal in degrees, positive toward the side's y axis.
    pub inclination: f64,
    /// The cut stops before the start of the blank.
    pub start_limited: bool,
    /// The cut stops before the end of the blank.
    pub end_limited: bool,
    /// Length along the blank.
    pub length: f64,
    /// The cut stops at `depth`.
    pub depth_limited: bool,
    /// Depth below the reference side (0 when through).
    pub depth: f64,
    /// Horizontal angle of the start face in degrees.
    pub angle_start: f64,
    /// Horizontal angle of the end face in degrees.
    pub angle_end: f64,
    /// Blade position.
    pub tool_position: ToolPosition,
}

/// Cutting plane and the planes that bound it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalCutGeometry {
    /// The cut. The waste lies on the side its normal points to.
    pub cut_plane: Plane,
    /// Start bound, normal away from the cut.
    pub start_plane: Option<Plane>,
    /// End bound, normal away from the cut.
    pub end_plane: Option<Plane>,
    /// Bottom bound, normal into the blank.
    pub depth_plane: Option<Plane>,
}

impl LongitudinalCut {
    /// BTLx element name.
    pub const NAME: &'static str = "LongitudinalCut";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "StartX",
        "StartY",
        "Inclination",
        "StartLimited",
        "EndLimited",
        "Length",
        "DepthLimited",
        "Depth",
        "AngleStart",
        "AngleEnd",
        "ToolPosition",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        INCLINATION.check("Inclination", self.inclination)?;
        LENGTH.check("Length", self.length)?;
        DEPTH.check("Depth", self.depth)?;
        ANGLE.check("AngleStart", self.angle_start)?;
        ANGLE.check("AngleEnd", self.angle_end)
    }

    /// Derive a rip cut from a plane containing the blank direction.
    pub fn from_plane(
        plane: &Plane,
        beam: &Beam,
        ref_side: usize,
        options: &LongitudinalCutOptions,
        tol: &Tolerance,
    ) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        if plane.normal.dot(&side.x()).abs() > tol.linear {
            return Err(ProcessingError::InvalidInput {
                kind: Self::NAME,
                reason: format!("cutting plane {plane:?} does not run along the blank"),
            });
        }
        let mut normal = plane.normal;
        if normal.cross(&side.x()).dot(&-side.n()) < 0.0 {
            normal = -normal;
        }
        let down = normal.cross(&side.x());
        let inclination = down.dot(&side.y()).atan2(down.dot(&-side.n())).to_degrees();

        let cross_edge = Line::from_point_and_vector(side.point(0.0, 0.0, 0.0), side.y());
        let start_y = intersection_line_plane_parameter(&cross_edge, plane).ok_or(
            ProcessingError::LinePlaneParallel {
                line: cross_edge,
                plane: *plane,
                context: "longitudinal cut position",
            },
        )?;

        let (start_x, angle_start) = match &options.start_plane {
            Some(bound) => (
                side.edge_position(start_y, bound, "longitudinal cut start")?,
                bound_angle(&side, bound),
            ),
            None => (0.0, 90.0),
        };
        let (length, angle_end) = match &options.end_plane {
            Some(bound) => (
                side.edge_position(start_y, bound, "longitudinal cut end")? - start_x,
                bound_angle(&side, bound),
            ),
            None => (beam.length - start_x, 90.0),
        };
        let depth = match &options.depth_plane {
            Some(bottom) => {
                let line = Line::from_point_and_vector(side.point(start_x, start_y, 0.0), -side.n());
                Some(intersection_line_plane_parameter(&line, bottom).ok_or(
                    ProcessingError::LinePlaneParallel {
                        line,
                        plane: *bottom,
                        context: "longitudinal cut depth",
                    },
                )?)
            }
            None => None,
        };
        debug!(
            kind = Self::NAME,
            ref_side,
            start_x,
            start_y,
            inclination,
            length,
            ?depth,
            "derived processing"
        );
        Ok(Processing::new(
            Self {
                start_x,
                start_y,
                inclination,
                start_limited: options.start_plane.is_some(),
                end_limited: options.end_plane.is_some(),
                length,
                depth_limited: depth.is_some(),
                depth: depth.unwrap_or(0.0),
                angle_start,
                angle_end,
                tool_position: options.tool_position,
            },
            ref_side,
        )?)
    }

    /// Cutting plane and bounds on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<LongitudinalCutGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let (si, ci) = self.inclination.to_radians().sin_cos();
        let down = side.y() * si - side.n() * ci;
        let normal = side.x().cross(&down);
        let at = |x: f64, depth: f64| -> Point3 { side.point(x, self.start_y, depth) };
        Ok(LongitudinalCutGeometry {
            cut_plane: Plane::new(at(0.0, 0.0), normal),
            start_plane: self
                .start_limited
                .then(|| Plane::new(at(self.start_x, 0.0), -bound_direction(&side, self.angle_start))),
            end_plane: self.end_limited.then(|| {
                Plane::new(
                    at(self.start_x + self.length, 0.0),
                    bound_direction(&side, self.angle_end),
                )
            }),
            depth_plane: self
                .depth_limited
                .then(|| Plane::new(at(self.start_x, self.depth), -side.n())),
        })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("Inclination", self.inclination)
            .flag("StartLimited", self.start_limited)
            .flag("EndLimited", self.end_limited)
            .float("Length", self.length)
            .flag("DepthLimited", self.depth_limited)
            .float("Depth", self.depth)
            .float("AngleStart", self.angle_start)
            .float("AngleEnd", self.angle_end)
            .text("ToolPosition", self.tool_position.as_str())
            .build()
    }
}

/// Horizontal normal of an end bound, pointing along +x for angles in `(0, 180)`.
fn bound_direction(side: &SideContext, angle: f64) -> Vec3 {
    let (s, c) = angle.to_radians().sin_cos();
    side.x() * s + side.y() * c
}

fn bound_angle(side: &SideContext, bound: &Plane) -> f64 {
    let v = side.toward_x(&bound.normal);
    v.dot(&side.x()).atan2(v.dot(&side.y())).to_degrees()
}
