//! Dovetail mortise: the socket for a dovetail tenon.

use super::common::{dovetail_box, SideContext};
use super::dovetail_tenon::{effective_flank_angle, DovetailOptions, CONE_ANGLE, FLANK_ANGLE};
use super::mortise::{MortiseAngles, MortiseGeometry, MortiseOptions, SLOPE};
use crate::params::{
    LimitationTop, ParameterMap, ParameterMapBuilder, TenonShape, DEPTH, JOINT_LENGTH, JOINT_SIZE, SIGNED_ANGLE,
    START_DEPTH, START_X, START_Y,
};
use crate::{DovetailTool, Processing, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::Frame;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A dovetail socket cut from the reference side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DovetailMortise {
    /// Origin along the blank.
    pub start_x: f64,
    /// Origin across the side.
    pub start_y: f64,
    /// Origin below the side.
    pub start_depth: f64,
    /// Rotation about the side normal in degrees.
    pub angle: f64,
    /// Slope of the mortise axis in degrees.
    pub slope: f64,
    /// How the socket is bounded at the reference side.
    pub limitation_top: LimitationTop,
    /// Bottom limited.
    pub length_limited_bottom: bool,
    /// Length along the axis.
    pub length: f64,
    /// Width at the mouth.
    pub width: f64,
    /// Depth into the blank.
    pub depth: f64,
    /// Taper along the length in degrees.
    pub cone_angle: f64,
    /// Whether `flank_angle` is used.
    pub use_flank_angle: bool,
    /// Flank angle in degrees.
    pub flank_angle: f64,
    /// Corner shape.
    pub shape: TenonShape,
    /// Corner radius.
    pub shape_radius: f64,
}

impl DovetailMortise {
    /// BTLx element name.
    pub const NAME: &'static str = "DovetailMortise";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "StartX",
        "StartY",
        "StartDepth",
        "Angle",
        "Slope",
        "LimitationTop",
        "LengthLimitedBottom",
        "Length",
        "Width",
        "Depth",
        "ConeAngle",
        "UseFlankAngle",
        "FlankAngle",
        "Shape",
        "ShapeRadius",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        START_DEPTH.check("StartDepth", self.start_depth)?;
        SIGNED_ANGLE.check("Angle", self.angle)?;
        SLOPE.check("Slope", self.slope)?;
        JOINT_LENGTH.check("Length", self.length)?;
        JOINT_SIZE.check("Width", self.width)?;
        DEPTH.check("Depth", self.depth)?;
        CONE_ANGLE.check("ConeAngle", self.cone_angle)?;
        FLANK_ANGLE.check("FlankAngle", self.flank_angle)?;
        JOINT_SIZE.check("ShapeRadius", self.shape_radius)
    }

    /// Derive a dovetail mortise from its frame: x along the length, z out of the blank.
    ///
    /// Rotation about the mortise axis is not representable; only the axis is read.
    pub fn from_frame(
        frame: &Frame,
        beam: &Beam,
        ref_side: usize,
        options: &MortiseOptions,
        dovetail: &DovetailOptions,
        limitation_top: LimitationTop,
        tool: Option<&DovetailTool>,
    ) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        let angles = MortiseAngles::from_frame(&side, frame, Self::NAME)?;
        let (start_x, start_y, start_depth) = side.coordinates(&frame.point);
        let mut mortise = Self {
            start_x,
            start_y,
            start_depth,
            angle: angles.angle,
            slope: angles.slope,
            limitation_top,
            length_limited_bottom: options.length_limited_bottom,
            length: options.length,
            width: options.width,
            depth: options.depth,
            cone_angle: dovetail.cone_angle,
            use_flank_angle: dovetail.use_flank_angle,
            flank_angle: dovetail.flank_angle,
            shape: options.shape,
            shape_radius: options.shape_radius,
        };
        if let Some(tool) = tool {
            mortise.use_flank_angle = true;
            mortise.flank_angle = tool.angle;
            mortise.shape = TenonShape::Radius;
            mortise.shape_radius = tool.radius();
            if mortise.depth > tool.height {
                warn!(
                    kind = Self::NAME,
                    depth = mortise.depth,
                    bounded = tool.height,
                    "dovetail depth bounded to the cutter"
                );
                mortise.depth = tool.height;
            }
        }
        debug!(
            kind = Self::NAME,
            ref_side,
            start_x,
            start_y,
            angle = mortise.angle,
            slope = mortise.slope,
            %limitation_top,
            "derived processing"
        );
        Ok(Processing::new(mortise, ref_side)?)
    }

    /// Flank angle the socket is cut with.
    pub fn flank(&self) -> f64 {
        effective_flank_angle(self.use_flank_angle, self.flank_angle)
    }

    /// Cutting geometry on the given blank.
    ///
    /// The volume widens with depth, mirroring the dovetail tenon it receives.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<MortiseGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let angles = MortiseAngles {
            angle: self.angle,
            slope: self.slope,
            inclination: 90.0,
        };
        let frame = angles.frame(&side, side.point(self.start_x, self.start_y, self.start_depth));
        let inward = Frame::new(frame.point, frame.xaxis, -frame.yaxis);
        let volume = dovetail_box(
            &inward,
            self.length,
            self.width,
            self.depth,
            self.cone_angle,
            self.flank(),
        );
        Ok(MortiseGeometry { frame, volume })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("StartDepth", self.start_depth)
            .float("Angle", self.angle)
            .float("Slope", self.slope)
            .text("LimitationTop", self.limitation_top.as_str())
            .flag("LengthLimitedBottom", self.length_limited_bottom)
            .float("Length", self.length)
            .float("Width", self.width)
            .float("Depth", self.depth)
            .float("ConeAngle", self.cone_angle)
            .flag("UseFlankAngle", self.use_flank_angle)
            .float("FlankAngle", self.flank_angle)
            .text("Shape", self.shape.as_str())
            .float("ShapeRadius", self.shape_radius)
            .build()
    }
}
