//! Lap: a volume removed from the reference side, bounded by up to six planes.
//!
//! The lap is laid out from the corner where its start, front and top faces
//! meet. Its length runs along the blank (away from the start face), its width
//! across the side and its depth below it.

use super::common::{facing_side, machining_limits, snap_unlimited, volume_corners, SideContext};
use crate::orientation::{classify, Orientation, OrientationConvention};
use crate::params::{
    Interval, MachiningLimits, ParameterMap, ParameterMapBuilder, ANGLE, DEPTH, LENGTH, START_X, START_Y, WIDTH,
};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{intersection_line_plane_parameter, intersection_plane_plane_plane, Hexahedron, Line, Plane};
use joinery_kernel_math::{Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Slope of the lap bottom.
const SLOPE: Interval = Interval::new(-89.9, 89.9);

/// Directions the lap is laid out in.
struct LapAxes {
    e_x: Vec3,
    e_y: Vec3,
    n: Vec3,
}

impl LapAxes {
    fn new(side: &SideContext, orientation: Orientation) -> Self {
        Self {
            e_x: side.x() * orientation.flipped().sign(),
            e_y: side.y() * orientation.flipped().sign(),
            n: side.n(),
        }
    }

    /// Direction of a face normal given in lap angles.
    fn direction(&self, angle: f64, inclination: f64) -> Vec3 {
        let (sa, ca) = angle.to_radians().sin_cos();
        let (si, ci) = inclination.to_radians().sin_cos();
        self.e_x * (si * sa) + self.e_y * (si * ca) + self.n * ci
    }

    fn angles(&self, v: &Vec3) -> (f64, f64) {
        let v = v.normalize();
        (
            v.dot(&self.e_x).atan2(v.dot(&self.e_y)).to_degrees(),
            v.dot(&self.n).clamp(-1.0, 1.0).acos().to_degrees(),
        )
    }
}

/// A lap joint cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Direction the lap is laid out from its start face.
    pub orientation: Orientation,
    /// Start corner along the blank.
    pub start_x: f64,
    /// Start corner across the side.
    pub start_y: f64,
    /// Horizontal angle of the start face in degrees.
    pub angle: f64,
    /// Vertical angle of the start face in degrees.
    pub inclination: f64,
    /// Slope of the bottom along the lap in degrees.
    pub slope: f64,
    /// Length along the blank.
    pub length: f64,
    /// Width across the side.
    pub width: f64,
    /// Depth below the side at the start corner.
    pub depth: f64,
    /// End face parallel to the start face horizontally.
    pub lead_angle_parallel: bool,
    /// Horizontal angle of the end face in degrees.
    pub lead_angle: f64,
    /// End face parallel to the start face vertically.
    pub lead_inclination_parallel: bool,
    /// Vertical angle of the end face in degrees.
    pub lead_inclination: f64,
    /// Faces that stop inside the blank.
    pub machining_limits: MachiningLimits,
}

impl Lap {
    /// BTLx element name.
    pub const NAME: &'static str = "Lap";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StartY",
        "Angle",
        "Inclination",
        "Slope",
        "Length",
        "Width",
        "Depth",
        "LeadAngleParallel",
        "LeadAngle",
        "LeadInclinationParallel",
        "LeadInclination",
        "MachiningLimits",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        ANGLE.check("Angle", self.angle)?;
        ANGLE.check("Inclination", self.inclination)?;
        SLOPE.check("Slope", self.slope)?;
        LENGTH.check("Length", self.length)?;
        WIDTH.check("Width", self.width)?;
        DEPTH.check("Depth", self.depth)?;
        ANGLE.check("LeadAngle", self.lead_angle)?;
        ANGLE.check("LeadInclination", self.lead_inclination)
    }

    /// Derive a lap from a volume with outward face normals.
    ///
    /// The top face is taken to be the reference side. Without an explicit
    /// side, the side whose outward normal lies closest to the top face normal
    /// is used. A face is limited when it stops inside the blank.
    pub fn from_volume(
        volume: &Hexahedron,
        beam: &Beam,
        ref_side: Option<usize>,
        tol: &Tolerance,
    ) -> Result<Processing> {
        let side = match ref_side {
            Some(index) => SideContext::new(beam, index)?,
            None => facing_side(beam, &volume.top.normal, tol, Self::NAME)?,
        };
        let ref_side = side.index;
        let orientation = classify(&side.frame, &volume.start, OrientationConvention::BehindIsEnd);
        let axes = LapAxes::new(&side, orientation);

        let corner = intersection_plane_plane_plane(&volume.start, &volume.front, &side.plane()).ok_or_else(|| {
            ProcessingError::DegenerateGeometry("lap start, front and reference side do not meet in a point".to_string())
        })?;
        let (start_x, start_y, _) = side.coordinates(&corner);
        let (angle, inclination) = axes.angles(&-volume.start.normal);

        let distance_to = |direction: Vec3, plane: &Plane, context: &'static str| -> Result<f64> {
            let line = Line::from_point_and_vector(corner, direction);
            intersection_line_plane_parameter(&line, plane).ok_or(ProcessingError::LinePlaneParallel {
                line,
                plane: *plane,
                context,
            })
        };
        let length = distance_to(axes.e_x, &volume.end, "lap length")?;
        let width = distance_to(axes.e_y, &volume.back, "lap width")?;
        let depth = distance_to(-axes.n, &volume.bottom, "lap depth")?;

        let bottom = volume.bottom.normal;
        let slope = (-bottom.dot(&axes.e_x)).atan2(-bottom.dot(&axes.n)).to_degrees();

        let (lead_angle, lead_inclination) = axes.angles(&volume.end.normal);
        let lead_angle_parallel = (lead_angle - angle).abs() < tol.linear;
        let lead_inclination_parallel = (lead_inclination - inclination).abs() < tol.linear;

        let machining_limits = machining_limits(volume, beam, tol, Self::NAME)?;
        debug!(
            kind = Self::NAME,
            ref_side,
            %orientation,
            start_x,
            start_y,
            length,
            width,
            depth,
            "derived processing"
        );
        let lap = Self {
            orientation,
            start_x,
            start_y,
            angle,
            inclination,
            slope,
            length,
            width,
            depth,
            lead_angle_parallel,
            lead_angle,
            lead_inclination_parallel,
            lead_inclination,
            machining_limits,
        };
        Ok(Processing::new(lap, ref_side)?)
    }

    /// The lap volume as described by the parameters, before limits are applied.
    pub fn volume(&self, beam: &Beam, ref_side: usize) -> Result<Hexahedron> {
        let side = SideContext::new(beam, ref_side)?;
        let axes = LapAxes::new(&side, self.orientation);
        let corner = side.point(self.start_x, self.start_y, 0.0);

        let start_normal = axes.direction(self.angle, self.inclination);
        let lead_angle = if self.lead_angle_parallel {
            self.angle
        } else {
            self.lead_angle
        };
        let lead_inclination = if self.lead_inclination_parallel {
            self.inclination
        } else {
            self.lead_inclination
        };
        let (ss, cs) = self.slope.to_radians().sin_cos();

        Ok(Hexahedron {
            start: Plane::new(corner, -start_normal),
            end: Plane::new(
                corner + axes.e_x * self.length,
                axes.direction(lead_angle, lead_inclination),
            ),
            front: Plane::new(corner, -axes.e_y),
            back: Plane::new(corner + axes.e_y * self.width, axes.e_y),
            top: side.plane(),
            bottom: Plane::new(corner - axes.n * self.depth, -(axes.n * cs + axes.e_x * ss)),
        })
    }

    /// Cutting volume with every unlimited face moved out to the blank boundary.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<Hexahedron> {
        let volume = self.volume(beam, ref_side)?;
        volume_corners(&volume, Self::NAME)?;
        snap_unlimited(&volume, &self.machining_limits, beam)
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("Angle", self.angle)
            .float("Inclination", self.inclination)
            .float("Slope", self.slope)
            .float("Length", self.length)
            .float("Width", self.width)
            .float("Depth", self.depth)
            .flag("LeadAngleParallel", self.lead_angle_parallel)
            .float("LeadAngle", self.lead_angle)
            .flag("LeadInclinationParallel", self.lead_inclination_parallel)
            .float("LeadInclination", self.lead_inclination)
            .limits("MachiningLimits", &self.machining_limits)
            .build()
    }
}
