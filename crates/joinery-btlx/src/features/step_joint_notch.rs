//! Step joint notch: the seat cut into a main beam for a strut.

use super::common::{frame_box, Section, SideContext};
use super::step_joint::{check_step_shape, check_strut_inclination, derive_strut_cut, strut_plane, strut_section};
use crate::orientation::Orientation;
use crate::params::{
    Interval, ParameterMap, ParameterMapBuilder, StepShape, DEPTH, JOINT_SIZE, START_X, START_Y, WIDTH,
};
use crate::{Feature, Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Frame, Hexahedron, Plane};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Strut height; the notch footprint must have a length.
pub(crate) const STRUT_HEIGHT: Interval = Interval::new(0.1, 50_000.0);

/// A notch seating the end of a strut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepJointNotch {
    /// Direction along the blank in which the strut leans.
    pub orientation: Orientation,
    /// Front edge of the strut footprint along the blank.
    pub start_x: f64,
    /// Start of the notch across the side.
    pub start_y: f64,
    /// Angle between strut and main beam in degrees.
    pub strut_inclination: f64,
    /// Whether the notch stops short of the side edges.
    pub notch_limited: bool,
    /// Width of a limited notch.
    pub notch_width: f64,
    /// Depth of the front step.
    pub step_depth: f64,
    /// Depth of the heel.
    pub heel_depth: f64,
    /// Height of the strut measured perpendicular to its axis.
    pub strut_height: f64,
    /// Profile of the notch.
    pub step_shape: StepShape,
    /// Whether a mortise is cut below the notch.
    pub mortise: bool,
    /// Mortise width across the side.
    pub mortise_width: f64,
    /// Mortise height below the notch.
    pub mortise_height: f64,
}

/// Cutting geometry of a step joint notch.
#[derive(Debug, Clone, PartialEq)]
pub struct StepJointNotchGeometry {
    /// Front face of the strut, normal toward the strut's removed side.
    pub reference_plane: Plane,
    /// Notch faces, normals into the notch.
    pub cuts: Vec<Plane>,
    /// Side faces of a limited notch, normals into the notch.
    pub side_cuts: Option<[Plane; 2]>,
    /// Mortise volume, if any.
    pub mortise: Option<Hexahedron>,
}

impl StepJointNotch {
    /// BTLx element name.
    pub const NAME: &'static str = "StepJointNotch";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StartY",
        "StrutInclination",
        "NotchLimited",
        "NotchWidth",
        "StepDepth",
        "HeelDepth",
        "StrutHeight",
        "StepShape",
        "Mortise",
        "MortiseWidth",
        "MortiseHeight",
    ];

    /// Check every field against its interval and the shape against the depths.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        check_strut_inclination(self.strut_inclination)?;
        WIDTH.check("NotchWidth", self.notch_width)?;
        DEPTH.check("StepDepth", self.step_depth)?;
        DEPTH.check("HeelDepth", self.heel_depth)?;
        STRUT_HEIGHT.check("StrutHeight", self.strut_height)?;
        check_step_shape(self.step_shape, self.step_depth, self.heel_depth)?;
        JOINT_SIZE.check("MortiseWidth", self.mortise_width)?;
        JOINT_SIZE.check("MortiseHeight", self.mortise_height)
    }

    /// Derive the notch from the strut's front face where it meets the reference side.
    ///
    /// The plane must contain the reference side's y axis. A notch is limited
    /// when `notch_width` is given. `strut_height` must be positive.
    #[allow(clippy::too_many_arguments)]
    pub fn from_plane(
        plane: &Plane,
        beam: &Beam,
        ref_side: usize,
        start_y: f64,
        notch_width: Option<f64>,
        strut_height: f64,
        step_depth: f64,
        heel_depth: f64,
        tapered_heel: bool,
    ) -> Result<Processing> {
        let step_shape = StepShape::classify(step_depth, heel_depth, tapered_heel)?;
        let side = SideContext::new(beam, ref_side)?;
        let cut = derive_strut_cut(&side, plane, Self::NAME)?;
        let (notch_limited, notch_width) = match notch_width {
            Some(width) => (true, width),
            None => (false, side.face_width),
        };
        debug!(
            kind = Self::NAME,
            ref_side,
            orientation = %cut.orientation,
            start_x = cut.start_x,
            strut_inclination = cut.strut_inclination,
            notch_limited,
            %step_shape,
            "derived processing"
        );
        let notch = Self {
            orientation: cut.orientation,
            start_x: cut.start_x,
            start_y,
            strut_inclination: cut.strut_inclination,
            notch_limited,
            notch_width,
            step_depth,
            heel_depth,
            strut_height,
            step_shape,
            mortise: false,
            mortise_width: 0.0,
            mortise_height: 0.0,
        };
        Ok(Processing::new(notch, ref_side)?)
    }

    /// Add a mortise below an existing notch.
    ///
    /// Height is bounded by the material left below the notch, width by the notch.
    pub fn add_mortise(processing: &Processing, beam: &Beam, width: f64, height: f64) -> Result<Processing> {
        let Feature::StepJointNotch(notch) = processing.feature() else {
            return Err(ProcessingError::InvalidInput {
                kind: processing.name(),
                reason: "only a step joint notch carries a notch mortise".to_string(),
            });
        };
        let side = SideContext::new(beam, processing.ref_side_index())?;
        let max_height = (side.depth - notch.step_depth.max(notch.heel_depth)).max(0.0);
        let max_width = if notch.notch_limited {
            notch.notch_width
        } else {
            side.face_width
        };
        let (bounded_width, bounded_height) = (width.min(max_width), height.min(max_height));
        if bounded_width < width || bounded_height < height {
            warn!(
                kind = Self::NAME,
                width,
                height,
                bounded_width,
                bounded_height,
                "mortise bounded to the notch"
            );
        }
        Ok(processing.update(|feature| {
            if let Feature::StepJointNotch(notch) = feature {
                notch.mortise = true;
                notch.mortise_width = bounded_width;
                notch.mortise_height = bounded_height;
            }
        })?)
    }

    fn footprint(&self) -> f64 {
        self.strut_height / self.strut_inclination.to_radians().sin()
    }

    /// Profile points in section coordinates, walked so the notch lies on the right.
    fn profile(&self) -> Vec<(f64, f64)> {
        let (sin, cos) = self.strut_inclination.to_radians().sin_cos();
        let length = self.footprint();
        let (s, h) = (self.step_depth, self.heel_depth);
        let a = (0.0, 0.0);
        let b = (length, 0.0);
        let along = |p: (f64, f64), t: f64| (p.0 + cos * t / sin, p.1 + t);
        match self.step_shape {
            StepShape::Step => vec![a, along(a, s), b],
            StepShape::Heel => vec![a, along(b, h), b],
            StepShape::TaperedHeel => vec![a, (length, h), b],
            StepShape::Double => vec![a, along(a, s), (length * 0.5, 0.0), along(b, h), b],
        }
    }

    /// Centre of the notch across the side.
    fn centre_y(&self, side: &SideContext) -> f64 {
        if self.notch_limited {
            self.start_y + self.notch_width * 0.5
        } else {
            side.face_width * 0.5
        }
    }

    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<StepJointNotchGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let strut = strut_section(&side, self.orientation, self.start_x);
        let reference_plane = strut_plane(&strut, self.strut_inclination);
        let cuts = strut.profile_planes(&self.profile())?;

        let side_cuts = self.notch_limited.then(|| {
            [
                Plane::new(side.point(self.start_x, self.start_y, 0.0), side.y()),
                Plane::new(
                    side.point(self.start_x, self.start_y + self.notch_width, 0.0),
                    -side.y(),
                ),
            ]
        });

        let mortise = self.mortise.then(|| {
            let section = Section::new(
                side.point(self.start_x, self.centre_y(&side), 0.0),
                strut.e_x,
                side.n(),
            );
            let frame = Frame::new(section.origin, section.e_x, side.n().cross(&section.e_x));
            let floor = self.step_depth.max(self.heel_depth);
            let half = self.mortise_width * 0.5;
            frame_box(
                &frame,
                (0.0, self.footprint()),
                (-half, half),
                (-(floor + self.mortise_height), -floor),
            )
        });

        Ok(StepJointNotchGeometry {
            reference_plane,
            cuts,
            side_cuts,
            mortise,
        })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("StrutInclination", self.strut_inclination)
            .flag("NotchLimited", self.notch_limited)
            .float("NotchWidth", self.notch_width)
            .float("StepDepth", self.step_depth)
            .float("HeelDepth", self.heel_depth)
            .float("StrutHeight", self.strut_height)
            .text("StepShape", self.step_shape.as_str())
            .flag("Mortise", self.mortise)
            .float("MortiseWidth", self.mortise_width)
            .float("MortiseHeight", self.mortise_height)
            .build()
    }
}
