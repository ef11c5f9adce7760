//! Step joint: the end of a strut shaped to bear in a notch.
//!
//! Geometry is built in a vertical section through the reference side: `X`
//! runs along the blank toward the removed end, `Z` into the blank. The
//! strut's reference plane (the face of the main beam it bears on) crosses the
//! section on a line through `A` (reference edge) and `B` (opposite edge) at
//! the strut inclination. Profiles for inclinations above 90 degrees are
//! built for the supplementary angle and mirrored through the mid depth.

use super::common::{frame_box, Section, SideContext};
use crate::orientation::{classify, Orientation, OrientationConvention};
use crate::params::{ParameterMap, ParameterMapBuilder, StepShape, ANGLE, DEPTH, JOINT_SIZE, START_X};
use crate::{Feature, Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Frame, Hexahedron, Plane};
use joinery_kernel_math::{Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

impl StepShape {
    /// Shape implied by the step depth, heel depth and tapered-heel flag.
    pub fn classify(
        step_depth: f64,
        heel_depth: f64,
        tapered_heel: bool,
    ) -> std::result::Result<StepShape, ValidationError> {
        match (step_depth > 0.0, heel_depth > 0.0) {
            (true, false) => Ok(StepShape::Step),
            (false, true) if tapered_heel => Ok(StepShape::TaperedHeel),
            (false, true) => Ok(StepShape::Heel),
            (true, true) => Ok(StepShape::Double),
            (false, false) => Err(ValidationError::InconsistentStepShape),
        }
    }
}

/// Strut inclinations within this open interval around 90 degrees are rejected.
pub(crate) const STRUT_INCLINATION_GAP: (f64, f64) = (89.9, 90.1);

pub(crate) fn check_strut_inclination(value: f64) -> std::result::Result<(), ValidationError> {
    ANGLE.check("StrutInclination", value)?;
    let (min, max) = STRUT_INCLINATION_GAP;
    if value > min && value < max {
        return Err(ValidationError::Excluded {
            field: "StrutInclination",
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_step_shape(
    shape: StepShape,
    step_depth: f64,
    heel_depth: f64,
) -> std::result::Result<(), ValidationError> {
    let expected = StepShape::classify(step_depth, heel_depth, shape == StepShape::TaperedHeel)?;
    if expected != shape {
        return Err(ValidationError::StepShapeMismatch {
            stored: shape.as_str(),
            expected: expected.as_str(),
        });
    }
    Ok(())
}

/// Orientation, start and inclination of a strut plane.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StrutCut {
    pub orientation: Orientation,
    pub start_x: f64,
    pub strut_inclination: f64,
}

/// Read a strut plane that contains the side's y axis.
pub(crate) fn derive_strut_cut(
    side: &SideContext,
    plane: &Plane,
    kind: &'static str,
) -> Result<StrutCut> {
    if plane.normal.dot(&side.y()).abs() > Tolerance::DEFAULT.linear {
        debug!(kind, ref_side = side.index, "strut plane is skewed across the side");
        return Err(ProcessingError::InvalidInput {
            kind,
            reason: "strut plane must contain the reference side's y axis".to_string(),
        });
    }
    let orientation = classify(&side.frame, plane, OrientationConvention::BehindIsEnd);
    let start_x = side.edge_position(0.0, plane, "strut plane reference edge")?;
    let e_x = removal_direction(side, orientation);
    let u_x = plane.normal.dot(&e_x);
    let u_z = plane.normal.dot(&-side.n());
    Ok(StrutCut {
        orientation,
        start_x,
        strut_inclination: u_x.atan2(-u_z).to_degrees(),
    })
}

/// Direction along the blank toward the removed end.
pub(crate) fn removal_direction(side: &SideContext, orientation: Orientation) -> Vec3 {
    side.x() * orientation.sign()
}

/// Section through the reference edge at `start_x`.
pub(crate) fn strut_section(side: &SideContext, orientation: Orientation, start_x: f64) -> Section {
    Section::new(
        side.point(start_x, 0.0, 0.0),
        removal_direction(side, orientation),
        side.n(),
    )
}

/// Strut plane through the section origin, normal toward the removed end.
pub(crate) fn strut_plane(section: &Section, strut_inclination: f64) -> Plane {
    let (sin, cos) = strut_inclination.to_radians().sin_cos();
    Plane::new(section.origin, section.vector((sin, -cos)))
}

/// Maps profiles built for an acute inclination onto the real section.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AcuteProfile {
    /// Acute inclination in radians.
    pub phi: f64,
    /// Section depth.
    pub depth: f64,
    /// Offset along X applied after mirroring.
    shift: f64,
    mirrored: bool,
}

impl AcuteProfile {
    pub fn new(strut_inclination: f64, depth: f64) -> Self {
        let theta = strut_inclination.to_radians();
        let mirrored = strut_inclination > 90.0;
        let phi = if mirrored {
            std::f64::consts::PI - theta
        } else {
            theta
        };
        Self {
            phi,
            depth,
            shift: if mirrored { depth / theta.tan() } else { 0.0 },
            mirrored,
        }
    }

    fn to_real(self, p: (f64, f64)) -> (f64, f64) {
        if self.mirrored {
            (p.0 + self.shift, self.depth - p.1)
        } else {
            p
        }
    }

    /// Planes through consecutive profile points, normals on the waste side.
    pub fn planes(&self, section: &Section, profile: &[(f64, f64)]) -> Result<Vec<Plane>> {
        let mut real: Vec<_> = profile.iter().map(|p| self.to_real(*p)).collect();
        if self.mirrored {
            real.reverse();
        }
        let mut planes = section.profile_planes(&real)?;
        if self.mirrored {
            planes.reverse();
        }
        Ok(planes)
    }
}

/// A step joint cut on the end of a strut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepJoint {
    /// End of the strut that is shaped.
    pub orientation: Orientation,
    /// Reference point along the blank.
    pub start_x: f64,
    /// Angle between strut and main beam in degrees.
    pub strut_inclination: f64,
    /// Depth of the front step.
    pub step_depth: f64,
    /// Depth of the heel.
    pub heel_depth: f64,
    /// Profile of the joint.
    pub step_shape: StepShape,
    /// Whether a tenon is cut on the step.
    pub tenon: bool,
    /// Tenon width across the side.
    pub tenon_width: f64,
    /// Tenon height beyond the strut plane.
    pub tenon_height: f64,
}

/// Cutting geometry of a step joint.
#[derive(Debug, Clone, PartialEq)]
pub struct StepJointGeometry {
    /// The main beam face the strut bears on, normal toward the removed end.
    pub reference_plane: Plane,
    /// Profile cuts, normals toward the removed material.
    pub cuts: Vec<Plane>,
    /// Tenon volume, if any.
    pub tenon: Option<Hexahedron>,
}

impl StepJoint {
    /// BTLx element name.
    pub const NAME: &'static str = "StepJoint";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StrutInclination",
        "StepDepth",
        "HeelDepth",
        "StepShape",
        "Tenon",
        "TenonWidth",
        "TenonHeight",
    ];

    /// Check every field against its interval and the shape against the depths.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        check_strut_inclination(self.strut_inclination)?;
        DEPTH.check("StepDepth", self.step_depth)?;
        DEPTH.check("HeelDepth", self.heel_depth)?;
        check_step_shape(self.step_shape, self.step_depth, self.heel_depth)?;
        JOINT_SIZE.check("TenonWidth", self.tenon_width)?;
        JOINT_SIZE.check("TenonHeight", self.tenon_height)
    }

    /// Derive the joint from the plane of the main beam face, normal toward the removed end.
    ///
    /// The plane must contain the reference side's y axis.
    pub fn from_plane(
        plane: &Plane,
        beam: &Beam,
        ref_side: usize,
        step_depth: f64,
        heel_depth: f64,
        tapered_heel: bool,
    ) -> Result<Processing> {
        let step_shape = StepShape::classify(step_depth, heel_depth, tapered_heel)?;
        let side = SideContext::new(beam, ref_side)?;
        let cut = derive_strut_cut(&side, plane, Self::NAME)?;
        debug!(
            kind = Self::NAME,
            ref_side,
            orientation = %cut.orientation,
            start_x = cut.start_x,
            strut_inclination = cut.strut_inclination,
            %step_shape,
            "derived processing"
        );
        let joint = Self {
            orientation: cut.orientation,
            start_x: cut.start_x,
            strut_inclination: cut.strut_inclination,
            step_depth,
            heel_depth,
            step_shape,
            tenon: false,
            tenon_width: 0.0,
            tenon_height: 0.0,
        };
        Ok(Processing::new(joint, ref_side)?)
    }

    /// Add a tenon to an existing step joint processing.
    ///
    /// The width is bounded to the width of the reference side.
    pub fn add_tenon(processing: &Processing, beam: &Beam, width: f64, height: f64) -> Result<Processing> {
        if !matches!(processing.feature(), Feature::StepJoint(_)) {
            return Err(ProcessingError::InvalidInput {
                kind: processing.name(),
                reason: "only a step joint carries a step joint tenon".to_string(),
            });
        }
        let side = SideContext::new(beam, processing.ref_side_index())?;
        let bounded = width.min(side.face_width);
        if bounded < width {
            warn!(kind = Self::NAME, width, bounded, "tenon width bounded to the side width");
        }
        Ok(processing.update(|feature| {
            if let Feature::StepJoint(joint) = feature {
                joint.tenon = true;
                joint.tenon_width = bounded;
                joint.tenon_height = height;
            }
        })?)
    }

    /// Profile points in acute section coordinates.
    fn profile(&self, acute: &AcuteProfile) -> Vec<(f64, f64)> {
        let (sin, cos) = acute.phi.sin_cos();
        let (s, h, d) = (self.step_depth, self.heel_depth, acute.depth);
        let u = (sin, -cos);
        let a = (0.0, 0.0);
        let b = (d * cos / sin, d);
        let toe = (s / sin, 0.0);
        let toe_root = (toe.0 - s * u.0, toe.1 - s * u.1);
        let heel = (b.0 + h * u.0, b.1 + h * u.1);
        match self.step_shape {
            StepShape::Step => vec![toe, toe_root, b],
            StepShape::Heel => vec![a, heel, b],
            StepShape::TaperedHeel => vec![a, (b.0 + h / sin, d)],
            StepShape::Double => vec![toe, toe_root, heel, b],
        }
    }

    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<StepJointGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let section = strut_section(&side, self.orientation, self.start_x);
        let reference_plane = strut_plane(&section, self.strut_inclination);
        let acute = AcuteProfile::new(self.strut_inclination, side.depth);
        let cuts = acute.planes(&section, &self.profile(&acute))?;

        let tenon = self.tenon.then(|| {
            let (sin, cos) = self.strut_inclination.to_radians().sin_cos();
            let along = section.vector((cos, sin));
            let origin = section.origin + side.y() * (side.face_width * 0.5);
            let frame = Frame::new(origin, along, reference_plane.normal.cross(&along));
            let half = self.tenon_width * 0.5;
            frame_box(
                &frame,
                (0.0, side.depth / sin),
                (-half, half),
                (0.0, self.tenon_height),
            )
        });
        Ok(StepJointGeometry {
            reference_plane,
            cuts,
            tenon,
        })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("StrutInclination", self.strut_inclination)
            .float("StepDepth", self.step_depth)
            .float("HeelDepth", self.heel_depth)
            .text("StepShape", self.step_shape.as_str())
            .flag("Tenon", self.tenon)
            .float("TenonWidth", self.tenon_width)
            .float("TenonHeight", self.tenon_height)
            .build()
    }
}
