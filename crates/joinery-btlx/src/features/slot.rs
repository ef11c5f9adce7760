//! Slot: a saw kerf of given thickness cut into an end of the blank.
//!
//! The slot's outline is a quadrilateral in its mid plane. `P1` is the
//! reference point, `P4` lies `length` along the reference side from it, and
//! the remaining corners follow from the depth and the corner angles:
//!
//! ```text
//!   P1 ------------- P4     reference side
//!    \  ref        opp \
//!     \                 \
//!      P2 -------------- P3
//! ```

use super::common::{facing_side, machining_limits, EndCut, SideContext};
use crate::orientation::{classify, Orientation, OrientationConvention};
use crate::params::{
    Interval, MachiningLimits, ParameterMap, ParameterMapBuilder, ANGLE, DEPTH, LENGTH, SIGNED_ANGLE_OPEN,
    START_DEPTH, START_X, START_Y, WIDTH,
};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{intersection_lines, Hexahedron, Plane};
use joinery_kernel_math::{Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Horizontal angle of the slot plane, measured from a square cut.
const SLOT_ANGLE: Interval = Interval::new(-89.9, 89.9);

/// A slot cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// End of the blank the slot opens toward.
    pub orientation: Orientation,
    /// Reference point along the blank.
    pub start_x: f64,
    /// Reference point across the side.
    pub start_y: f64,
    /// Reference point below the side.
    pub start_depth: f64,
    /// Horizontal angle of the slot plane in degrees.
    pub angle: f64,
    /// Vertical angle of the slot plane in degrees.
    pub inclination: f64,
    /// Length of the edge along the reference side.
    pub length: f64,
    /// Depth of `P3` below the reference edge.
    pub depth: f64,
    /// Kerf thickness.
    pub thickness: f64,
    /// Angle at `P1` between the reference edge and `P1 -> P2`.
    pub angle_ref_point: f64,
    /// Angle at `P4` between the reference edge and `P4 -> P3`.
    pub angle_opp_point: f64,
    /// Turn of the bottom edge `P3 -> P2` away from the reference edge direction.
    pub add_angle_opp_point: f64,
    /// Faces that stop inside the blank.
    pub machining_limits: MachiningLimits,
}

/// Mid plane, outline and removal volume of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotGeometry {
    /// Mid plane, normal toward the slot's end of the blank.
    pub plane: Plane,
    /// Corners `[P1, P2, P3, P4]`.
    pub outline: [Point3; 4],
    /// Removal volume: start edge `P1P2`, end edge `P4P3`, top `P1P4`, bottom `P2P3`.
    pub volume: Hexahedron,
}

/// In-plane axes of a slot: `u` along the reference edge, `v` toward the bottom.
struct SlotAxes {
    normal: Vec3,
    u: Vec3,
    v: Vec3,
}

impl SlotAxes {
    fn new(side: &SideContext, normal: Vec3) -> Self {
        let u = side.n().cross(&normal).normalize();
        let v = u.cross(&normal);
        Self { normal, u, v }
    }

    fn along(&self, angle: f64) -> Vec3 {
        let (s, c) = angle.to_radians().sin_cos();
        self.u * c + self.v * s
    }

    fn angle_of(&self, d: &Vec3) -> f64 {
        d.dot(&self.v).atan2(d.dot(&self.u)).to_degrees()
    }
}

impl Slot {
    /// BTLx element name.
    pub const NAME: &'static str = "Slot";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StartY",
        "StartDepth",
        "Angle",
        "Inclination",
        "Length",
        "Depth",
        "Thickness",
        "AngleRefPoint",
        "AngleOppPoint",
        "AddAngleOppPoint",
        "MachiningLimits",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        START_DEPTH.check("StartDepth", self.start_depth)?;
        SLOT_ANGLE.check("Angle", self.angle)?;
        ANGLE.check("Inclination", self.inclination)?;
        LENGTH.check("Length", self.length)?;
        DEPTH.check("Depth", self.depth)?;
        WIDTH.check("Thickness", self.thickness)?;
        ANGLE.check("AngleRefPoint", self.angle_ref_point)?;
        ANGLE.check("AngleOppPoint", self.angle_opp_point)?;
        SIGNED_ANGLE_OPEN.check("AddAngleOppPoint", self.add_angle_opp_point)
    }

    /// Derive a slot from its outline `[P1, P2, P3, P4]`.
    ///
    /// The outline must be planar and its edge `P1P4` must run parallel to
    /// the reference side. Walking `P1 -> P4 -> P3` turns toward the slot's
    /// end of the blank. Without an explicit side, the side facing from the
    /// edge `P2P3` toward the edge `P1P4` is used.
    pub fn from_outline(
        outline: &[Point3; 4],
        thickness: f64,
        beam: &Beam,
        ref_side: Option<usize>,
        tol: &Tolerance,
    ) -> Result<Processing> {
        let [p1, p2, p3, p4] = *outline;
        let side = match ref_side {
            Some(index) => SideContext::new(beam, index)?,
            None => facing_side(beam, &((p1 - p2) + (p4 - p3)), tol, Self::NAME)?,
        };
        let ref_side = side.index;
        let plane = Plane::from_three_points(&p1, &p4, &p3).ok_or_else(|| {
            ProcessingError::DegenerateGeometry(format!("slot corners {p1:?}, {p4:?}, {p3:?} are collinear"))
        })?;
        if plane.signed_distance(&p2).abs() > tol.linear {
            return Err(invalid("outline is not planar"));
        }
        let normal = -plane.normal;
        if tol.vectors_parallel(&normal, &side.n()) {
            return Err(invalid("slot plane is parallel to the reference side"));
        }
        let axes = SlotAxes::new(&side, normal);
        if (p4 - p1).dot(&axes.v).abs() > tol.linear {
            return Err(invalid("edge P1P4 does not run along the reference side"));
        }

        let orientation = classify(&side.frame, &Plane::new(p1, normal), OrientationConvention::BehindIsEnd);
        let (jack_angle, inclination) = side.cut_angles(&side.toward_x(&normal));
        let (start_x, start_y, start_depth) = side.coordinates(&p1);
        let mut slot = Self {
            orientation,
            start_x,
            start_y,
            start_depth,
            angle: jack_angle - 90.0,
            inclination,
            length: (p4 - p1).dot(&axes.u),
            depth: (p3 - p1).dot(&axes.v),
            thickness,
            angle_ref_point: axes.angle_of(&(p2 - p1)),
            angle_opp_point: (p3 - p4).dot(&axes.v).atan2(-(p3 - p4).dot(&axes.u)).to_degrees(),
            add_angle_opp_point: (-(p2 - p3).dot(&axes.v)).atan2(-(p2 - p3).dot(&axes.u)).to_degrees(),
            machining_limits: MachiningLimits::all(),
        };
        slot.validate()?;
        let volume = slot.to_geometry(beam, ref_side)?.volume;
        slot.machining_limits = machining_limits(&volume, beam, tol, Self::NAME)?;
        debug!(
            kind = Self::NAME,
            ref_side,
            %orientation,
            start_x,
            start_y,
            angle = slot.angle,
            inclination,
            length = slot.length,
            depth = slot.depth,
            "derived processing"
        );
        Ok(Processing::new(slot, ref_side)?)
    }

    fn axes(&self, side: &SideContext) -> SlotAxes {
        let cut = EndCut {
            orientation: self.orientation,
            start_x: self.start_x,
            angle: self.angle + 90.0,
            inclination: self.inclination,
        };
        SlotAxes::new(side, cut.normal(side))
    }

    /// Outline corners `[P1, P2, P3, P4]`, built `P1 -> P4 -> P3 -> P2`.
    fn outline(&self, side: &SideContext, axes: &SlotAxes) -> Result<[Point3; 4]> {
        let p1 = side.point(self.start_x, self.start_y, self.start_depth);
        let p4 = p1 + axes.u * self.length;
        let opp = self.angle_opp_point.to_radians();
        let p3 = p4 + (-axes.u * opp.cos() + axes.v * opp.sin()) * (self.depth / opp.sin());
        let add = self.add_angle_opp_point.to_radians();
        let bottom = -axes.u * add.cos() - axes.v * add.sin();
        let p2 = intersection_lines(&p1, &axes.along(self.angle_ref_point), &p3, &bottom).ok_or_else(|| {
            ProcessingError::DegenerateGeometry(format!(
                "slot edges from P1 and P3 are parallel (AngleRefPoint {:.3}, AddAngleOppPoint {:.3})",
                self.angle_ref_point, self.add_angle_opp_point
            ))
        })?;
        Ok([p1, p2, p3, p4])
    }

    /// Mid plane, outline and removal volume on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<SlotGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let axes = self.axes(&side);
        let outline = self.outline(&side, &axes)?;
        let [p1, p2, p3, p4] = outline;
        let centre = Point3::from((p1.coords + p2.coords + p3.coords + p4.coords) / 4.0);
        let half = self.thickness * 0.5;
        let volume = Hexahedron {
            start: edge_face(&p1, &p2, &axes.normal, &centre),
            end: edge_face(&p4, &p3, &axes.normal, &centre),
            front: Plane::new(p1 - axes.normal * half, -axes.normal),
            back: Plane::new(p1 + axes.normal * half, axes.normal),
            top: edge_face(&p1, &p4, &axes.normal, &centre),
            bottom: edge_face(&p2, &p3, &axes.normal, &centre),
        };
        Ok(SlotGeometry {
            plane: Plane::new(p1, axes.normal),
            outline,
            volume,
        })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("StartDepth", self.start_depth)
            .float("Angle", self.angle)
            .float("Inclination", self.inclination)
            .float("Length", self.length)
            .float("Depth", self.depth)
            .float("Thickness", self.thickness)
            .float("AngleRefPoint", self.angle_ref_point)
            .float("AngleOppPoint", self.angle_opp_point)
            .float("AddAngleOppPoint", self.add_angle_opp_point)
            .limits("MachiningLimits", &self.machining_limits)
            .build()
    }
}

/// Plane through the edge `a -> b`, perpendicular to the slot plane, facing away from `inside`.
fn edge_face(a: &Point3, b: &Point3, normal: &Vec3, inside: &Point3) -> Plane {
    let n = normal.cross(&(b - a));
    let n = if n.dot(&(inside - a)) > 0.0 { -n } else { n };
    Plane::new(*a, n)
}

fn invalid(reason: &str) -> ProcessingError {
    ProcessingError::InvalidInput {
        kind: Slot::NAME,
        reason: reason.to_string(),
    }
}
