//! Pocket: a four-sided recess with a planar, freely oriented bottom.
//!
//! The bottom is a parallelogram spanned from its start corner by `length`
//! along the bottom x axis and by `width` at `internal_angle` to it. Each wall
//! tilts against the bottom by its own angle.

use super::common::{facing_side, machining_limits, snap_unlimited, volume_corners, SideContext};
use crate::params::{
    MachiningLimits, ParameterMap, ParameterMapBuilder, ANGLE, LENGTH, SIGNED_ANGLE_OPEN, START_DEPTH, START_X,
    START_Y, WIDTH,
};
use crate::{Processing, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Frame, Hexahedron, Plane};
use joinery_kernel_math::{Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A pocket cut into the reference side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    /// Start corner along the blank.
    pub start_x: f64,
    /// Start corner across the side.
    pub start_y: f64,
    /// Start corner below the side.
    pub start_depth: f64,
    /// Rotation of the bottom about the side normal in degrees.
    pub angle: f64,
    /// Tilt of the bottom x axis below the side in degrees.
    pub inclination: f64,
    /// Roll of the bottom about its x axis in degrees.
    pub slope: f64,
    /// Angle between the length and width edges in degrees.
    pub internal_angle: f64,
    /// Tilt of the wall on the reference edge in degrees.
    pub tilt_ref_side: f64,
    /// Tilt of the wall at the end in degrees.
    pub tilt_end_side: f64,
    /// Tilt of the wall opposite the reference edge in degrees.
    pub tilt_opp_side: f64,
    /// Tilt of the wall at the start in degrees.
    pub tilt_start_side: f64,
    /// Faces that stop inside the blank.
    pub machining_limits: MachiningLimits,
    /// Length of the bottom.
    pub length: f64,
    /// Width of the bottom.
    pub width: f64,
}

/// Bottom axes of a pocket.
struct BottomAxes {
    x: Vec3,
    y: Vec3,
    z: Vec3,
}

impl BottomAxes {
    fn from_angles(side: &SideContext, angle: f64, inclination: f64, slope: f64) -> Self {
        let (sa, ca) = angle.to_radians().sin_cos();
        let (si, ci) = inclination.to_radians().sin_cos();
        let (ss, cs) = slope.to_radians().sin_cos();
        let x1 = side.x() * ca + side.y() * sa;
        let y1 = side.y() * ca - side.x() * sa;
        let z1 = side.n();
        let x2 = x1 * ci - z1 * si;
        let z2 = x1 * si + z1 * ci;
        Self {
            x: x2,
            y: y1 * cs + z2 * ss,
            z: z2 * cs - y1 * ss,
        }
    }

    /// `(angle, inclination, slope)` in degrees.
    fn angles(&self, side: &SideContext) -> (f64, f64, f64) {
        let n = side.n();
        (
            self.x.dot(&side.y()).atan2(self.x.dot(&side.x())).to_degrees(),
            (-self.x.dot(&n)).clamp(-1.0, 1.0).asin().to_degrees(),
            self.y.dot(&n).atan2(self.z.dot(&n)).to_degrees(),
        )
    }
}

fn wall_normal(outward: Vec3, up: Vec3, tilt: f64) -> Vec3 {
    let (st, ct) = tilt.to_radians().sin_cos();
    outward * st + up * ct
}

impl Pocket {
    /// BTLx element name.
    pub const NAME: &'static str = "Pocket";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "StartX",
        "StartY",
        "StartDepth",
        "Angle",
        "Inclination",
        "Slope",
        "InternalAngle",
        "TiltRefSide",
        "TiltEndSide",
        "TiltOppSide",
        "TiltStartSide",
        "MachiningLimits",
        "Length",
        "Width",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        START_DEPTH.check("StartDepth", self.start_depth)?;
        SIGNED_ANGLE_OPEN.check("Angle", self.angle)?;
        SIGNED_ANGLE_OPEN.check("Inclination", self.inclination)?;
        SIGNED_ANGLE_OPEN.check("Slope", self.slope)?;
        ANGLE.check("InternalAngle", self.internal_angle)?;
        ANGLE.check("TiltRefSide", self.tilt_ref_side)?;
        ANGLE.check("TiltEndSide", self.tilt_end_side)?;
        ANGLE.check("TiltOppSide", self.tilt_opp_side)?;
        ANGLE.check("TiltStartSide", self.tilt_start_side)?;
        LENGTH.check("Length", self.length)?;
        WIDTH.check("Width", self.width)
    }

    /// Derive a pocket from a volume with outward face normals.
    ///
    /// The bottom corners at start/front, end/front and start/back span the
    /// pocket; the top face is taken to be the reference side. Without an
    /// explicit side, the side facing the top face is used.
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
        let corners = volume_corners(volume, Self::NAME)?;
        let (c0, c1, c3) = (corners[0], corners[1], corners[3]);

        let along = c1 - c0;
        let across = c3 - c0;
        let length = along.norm();
        let width = across.norm();
        let z = -volume.bottom.normal;
        let x = along / length;
        let axes = BottomAxes {
            x,
            y: z.cross(&x),
            z,
        };
        let internal_angle = across.dot(&axes.y).atan2(across.dot(&axes.x)).to_degrees();
        let (angle, inclination, slope) = axes.angles(&side);
        let tilt = |plane: &Plane| plane.normal.dot(&axes.z).clamp(-1.0, 1.0).acos().to_degrees();
        let (start_x, start_y, start_depth) = side.coordinates(&c0);
        let machining_limits = machining_limits(volume, beam, tol, Self::NAME)?;
        debug!(
            kind = Self::NAME,
            ref_side,
            start_x,
            start_y,
            start_depth,
            angle,
            inclination,
            slope,
            "derived processing"
        );
        let pocket = Self {
            start_x,
            start_y,
            start_depth,
            angle,
            inclination,
            slope,
            internal_angle,
            tilt_ref_side: tilt(&volume.front),
            tilt_end_side: tilt(&volume.end),
            tilt_opp_side: tilt(&volume.back),
            tilt_start_side: tilt(&volume.start),
            machining_limits,
            length,
            width,
        };
        Ok(Processing::new(pocket, ref_side)?)
    }

    /// Frame of the pocket bottom at its start corner.
    pub fn bottom_frame(&self, beam: &Beam, ref_side: usize) -> Result<Frame> {
        let side = SideContext::new(beam, ref_side)?;
        let axes = BottomAxes::from_angles(&side, self.angle, self.inclination, self.slope);
        Ok(Frame::new(
            side.point(self.start_x, self.start_y, self.start_depth),
            axes.x,
            axes.y,
        ))
    }

    /// The pocket volume as described by the parameters, before limits are applied.
    pub fn volume(&self, beam: &Beam, ref_side: usize) -> Result<Hexahedron> {
        let side = SideContext::new(beam, ref_side)?;
        let bottom = self.bottom_frame(beam, ref_side)?;
        let (bx, by, bz) = (bottom.xaxis, bottom.yaxis, bottom.zaxis);
        let (st, ct) = self.internal_angle.to_radians().sin_cos();
        let p0 = bottom.point;
        let p1 = p0 + bx * self.length;
        let p3 = p0 + (bx * ct + by * st) * self.width;
        let start_out = by * ct - bx * st;

        Ok(Hexahedron {
            start: Plane::new(p0, wall_normal(start_out, bz, self.tilt_start_side)),
            end: Plane::new(p1, wall_normal(-start_out, bz, self.tilt_end_side)),
            front: Plane::new(p0, wall_normal(-by, bz, self.tilt_ref_side)),
            back: Plane::new(p3, wall_normal(by, bz, self.tilt_opp_side)),
            top: side.plane(),
            bottom: Plane::new(p0, -bz),
        })
    }

    /// Cutting volume with every unlimited face moved out to the blank boundary.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<Hexahedron> {
        let volume = self.volume(beam, ref_side)?;
        snap_unlimited(&volume, &self.machining_limits, beam)
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("StartDepth", self.start_depth)
            .float("Angle", self.angle)
            .float("Inclination", self.inclination)
            .float("Slope", self.slope)
            .float("InternalAngle", self.internal_angle)
            .float("TiltRefSide", self.tilt_ref_side)
            .float("TiltEndSide", self.tilt_end_side)
            .float("TiltOppSide", self.tilt_opp_side)
            .float("TiltStartSide", self.tilt_start_side)
            .limits("MachiningLimits", &self.machining_limits)
            .float("Length", self.length)
            .float("Width", self.width)
            .build()
    }
}
