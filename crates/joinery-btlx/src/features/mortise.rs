//! Mortise: a rectangular pocket receiving a tenon.
//!
//! A mortise frame is placed at `(start_x, start_y, start_depth)` on the
//! reference side and turned three times: about the side normal by `angle`,
//! about the turned y axis until its x axis dips by `90 - slope` into the
//! blank, and about that x axis by `90 - inclination`. The mortise occupies
//! `x in [0, length]`, `y in [-width/2, width/2]`, `z in [-depth, 0]`.

use super::common::{frame_box, SideContext};
use crate::params::{
    Interval, ParameterMap, ParameterMapBuilder, TenonShape, ANGLE, DEPTH, JOINT_LENGTH, JOINT_SIZE,
    SIGNED_ANGLE, START_DEPTH, START_X, START_Y,
};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Frame, Hexahedron};
use joinery_kernel_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Slope of the mortise axis against the side normal.
pub(crate) const SLOPE: Interval = Interval::new(0.1, 179.9);

/// Placement angles of a mortise frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MortiseAngles {
    pub angle: f64,
    pub slope: f64,
    pub inclination: f64,
}

impl MortiseAngles {
    /// Read the angles of a frame on a reference side.
    pub fn from_frame(side: &SideContext, frame: &Frame, kind: &'static str) -> Result<Self> {
        let n = side.n();
        let mx = frame.xaxis;
        let horizontal = mx - n * mx.dot(&n);
        if horizontal.norm() < 1e-9 {
            return Err(ProcessingError::InvalidInput {
                kind,
                reason: "mortise axis must not be perpendicular to the reference side".to_string(),
            });
        }
        let mx_h = horizontal.normalize();
        let my_h = n.cross(&mx_h);
        let slope = (-mx.dot(&n)).clamp(-1.0, 1.0).acos();
        let z1 = mx_h * slope.cos() + n * slope.sin();
        let my = frame.yaxis;
        Ok(Self {
            angle: mx_h.dot(&side.y()).atan2(mx_h.dot(&side.x())).to_degrees(),
            slope: slope.to_degrees(),
            inclination: my.dot(&my_h).atan2(my.dot(&z1)).to_degrees(),
        })
    }

    /// Mortise frame at `origin`.
    pub fn frame(&self, side: &SideContext, origin: Point3) -> Frame {
        let n = side.n();
        let (sa, ca) = self.angle.to_radians().sin_cos();
        let (ss, cs) = self.slope.to_radians().sin_cos();
        let (si, ci) = self.inclination.to_radians().sin_cos();
        let mx_h: Vec3 = side.x() * ca + side.y() * sa;
        let my_h = n.cross(&mx_h);
        let mx = mx_h * ss - n * cs;
        let z1 = mx_h * cs + n * ss;
        let my = my_h * si + z1 * ci;
        Frame::new(origin, mx, my)
    }
}

/// Size and edge conditions of a mortise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortiseOptions {
    /// Length along the mortise axis.
    pub length: f64,
    /// Width across the axis.
    pub width: f64,
    /// Depth into the blank.
    pub depth: f64,
    /// Corner shape.
    pub shape: TenonShape,
    /// Corner radius.
    pub shape_radius: f64,
    /// Top of the mortise limited.
    pub length_limited_top: bool,
    /// Bottom of the mortise limited.
    pub length_limited_bottom: bool,
}

impl Default for MortiseOptions {
    fn default() -> Self {
        Self {
            length: 80.0,
            width: 40.0,
            depth: 40.0,
            shape: TenonShape::Automatic,
            shape_radius: 20.0,
            length_limited_top: true,
            length_limited_bottom: true,
        }
    }
}

/// A rectangular mortise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mortise {
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
    /// Rotation about the mortise axis in degrees.
    pub inclination: f64,
    /// Top limited.
    pub length_limited_top: bool,
    /// Bottom limited.
    pub length_limited_bottom: bool,
    /// Length along the axis.
    pub length: f64,
    /// Width across the axis.
    pub width: f64,
    /// Depth into the blank.
    pub depth: f64,
    /// Corner shape.
    pub shape: TenonShape,
    /// Corner radius.
    pub shape_radius: f64,
}

/// Frame and volume of a mortise.
#[derive(Debug, Clone, PartialEq)]
pub struct MortiseGeometry {
    /// Mortise frame: x along the length, z out of the blank.
    pub frame: Frame,
    /// Mortise volume.
    pub volume: Hexahedron,
}

impl Mortise {
    /// BTLx element name.
    pub const NAME: &'static str = "Mortise";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "StartX",
        "StartY",
        "StartDepth",
        "Angle",
        "Slope",
        "Inclination",
        "LengthLimitedTop",
        "LengthLimitedBottom",
        "Length",
        "Width",
        "Depth",
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
        ANGLE.check("Inclination", self.inclination)?;
        JOINT_LENGTH.check("Length", self.length)?;
        JOINT_SIZE.check("Width", self.width)?;
        DEPTH.check("Depth", self.depth)?;
        JOINT_SIZE.check("ShapeRadius", self.shape_radius)
    }

    /// Derive a mortise from its frame: x along the length, z out of the blank.
    ///
    /// A tenon frame with its y axis reversed describes the matching mortise.
    pub fn from_frame(frame: &Frame, beam: &Beam, ref_side: usize, options: &MortiseOptions) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        let angles = MortiseAngles::from_frame(&side, frame, Self::NAME)?;
        let (start_x, start_y, start_depth) = side.coordinates(&frame.point);
        debug!(
            kind = Self::NAME,
            ref_side,
            start_x,
            start_y,
            angle = angles.angle,
            slope = angles.slope,
            inclination = angles.inclination,
            "derived processing"
        );
        let mortise = Self {
            start_x,
            start_y,
            start_depth,
            angle: angles.angle,
            slope: angles.slope,
            inclination: angles.inclination,
            length_limited_top: options.length_limited_top,
            length_limited_bottom: options.length_limited_bottom,
            length: options.length,
            width: options.width,
            depth: options.depth,
            shape: options.shape,
            shape_radius: options.shape_radius,
        };
        Ok(Processing::new(mortise, ref_side)?)
    }

    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<MortiseGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let angles = MortiseAngles {
            angle: self.angle,
            slope: self.slope,
            inclination: self.inclination,
        };
        let frame = angles.frame(&side, side.point(self.start_x, self.start_y, self.start_depth));
        let half = self.width * 0.5;
        let volume = frame_box(&frame, (0.0, self.length), (-half, half), (-self.depth, 0.0));
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
            .float("Inclination", self.inclination)
            .flag("LengthLimitedTop", self.length_limited_top)
            .flag("LengthLimitedBottom", self.length_limited_bottom)
            .float("Length", self.length)
            .float("Width", self.width)
            .float("Depth", self.depth)
            .text("Shape", self.shape.as_str())
            .float("ShapeRadius", self.shape_radius)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::common::testing::{assert_closed_bounds, beam};
    use crate::features::tenon::{Tenon, TenonOptions};
    use crate::Feature;
    use approx::assert_abs_diff_eq;
    use joinery_kernel_geom::{Line, Plane};

    fn mortise(p: &Processing) -> &Mortise {
        match p.feature() {
            Feature::Mortise(m) => m,
            other => panic!("unexpected feature {other:?}"),
        }
    }

    #[test]
    fn test_upright_mortise_on_top_side() {
        let b = beam();
        let m = Mortise {
            start_x: 500.0,
            start_y: 50.0,
            start_depth: 0.0,
            angle: 0.0,
            slope: 90.0,
            inclination: 90.0,
            length_limited_top: true,
            length_limited_bottom: true,
            length: 80.0,
            width: 40.0,
            depth: 50.0,
            shape: TenonShape::Square,
            shape_radius: 0.0,
        };
        let g = m.to_geometry(&b, 2).unwrap();
        // side 2 frame: x = X, y = Y, n = Z
        assert!((g.frame.xaxis - Vec3::x()).norm() < 1e-12);
        assert!((g.frame.zaxis - Vec3::z()).norm() < 1e-12);
        assert_abs_diff_eq!(g.volume.bottom.point.z, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g.volume.end.point.x, 580.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frame_round_trip() {
        let b = beam();
        let side = SideContext::new(&b, 1).unwrap();
        for (angle, slope, inclination) in [(0.0, 90.0, 90.0), (30.0, 60.0, 75.0), (-120.0, 130.0, 40.0)] {
            let angles = MortiseAngles {
                angle,
                slope,
                inclination,
            };
            let frame = angles.frame(&side, side.point(300.0, 20.0, 5.0));
            let back = MortiseAngles::from_frame(&side, &frame, Mortise::NAME).unwrap();
            assert_abs_diff_eq!(back.angle, angle, epsilon = 1e-9);
            assert_abs_diff_eq!(back.slope, slope, epsilon = 1e-9);
            assert_abs_diff_eq!(back.inclination, inclination, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_from_frame_reads_origin() {
        let b = beam();
        let side = SideContext::new(&b, 2).unwrap();
        let frame = Frame::new(side.point(400.0, 30.0, 0.0), Vec3::x(), Vec3::y());
        let p = Mortise::from_frame(&frame, &b, 2, &MortiseOptions::default()).unwrap();
        let m = mortise(&p);
        assert_abs_diff_eq!(m.start_x, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.start_y, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.angle, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.slope, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.inclination, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_vertical_axis_rejected() {
        let b = beam();
        let side = SideContext::new(&b, 2).unwrap();
        let frame = Frame::new(side.point(400.0, 30.0, 0.0), -Vec3::z(), Vec3::y());
        let err = Mortise::from_frame(&frame, &b, 2, &MortiseOptions::default()).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidInput { .. }));
    }

    #[test]
    fn test_mortise_matches_tenon() {
        // a tenon on the end of one blank and a mortise in a blank standing on it
        let b = beam();
        let end = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let opts = TenonOptions {
            start_y: 50.0,
            length: 80.0,
            width: 40.0,
            height: 30.0,
            ..TenonOptions::default()
        };
        let tenon = match Tenon::from_plane(&end, &b, 2, &opts).unwrap().feature() {
            Feature::Tenon(t) => t.clone(),
            other => panic!("unexpected feature {other:?}"),
        };
        let tg = tenon.to_geometry(&b, 2).unwrap();

        let post_line = Line::new(Point3::new(1550.0, 0.0, -1000.0), Point3::new(1550.0, 0.0, 1000.0));
        let post = Beam::from_centerline(&post_line, 100.0, 100.0, None).unwrap();
        // the post face touching the tenon's cut plane
        let face = (0..6)
            .find(|&i| {
                let f = post.ref_side(i).unwrap();
                (f.zaxis + Vec3::x()).norm() < 1e-9
            })
            .unwrap();
        let mortise_frame = Frame::new(tg.frame.point, tg.frame.xaxis, -tg.frame.yaxis);
        let mopts = MortiseOptions {
            length: 80.0,
            width: 40.0,
            depth: 30.0,
            ..MortiseOptions::default()
        };
        let p = Mortise::from_frame(&mortise_frame, &post, face, &mopts).unwrap();
        let mg = mortise(&p).to_geometry(&post, face).unwrap();
        let tenon_corners = tg.volume.corners().unwrap();
        let mut mortise_corners = mg.volume.corners().unwrap().to_vec();
        for c in tenon_corners {
            let hit = mortise_corners
                .iter()
                .position(|m| (m - c).norm() < 1e-6)
                .expect("tenon corner inside mortise");
            mortise_corners.remove(hit);
        }
    }

    #[test]
    fn test_interval_bounds() {
        let base = Mortise {
            start_x: 500.0,
            start_y: 50.0,
            start_depth: 0.0,
            angle: 0.0,
            slope: 90.0,
            inclination: 90.0,
            length_limited_top: true,
            length_limited_bottom: true,
            length: 80.0,
            width: 40.0,
            depth: 50.0,
            shape: TenonShape::Square,
            shape_radius: 0.0,
        };
        assert!(base.validate().is_ok());
        let check = Mortise::validate;
        assert_closed_bounds(&base, "StartX", START_X, check, |m, v| m.start_x = v);
        assert_closed_bounds(&base, "StartY", START_Y, check, |m, v| m.start_y = v);
        assert_closed_bounds(&base, "StartDepth", START_DEPTH, check, |m, v| m.start_depth = v);
        assert_closed_bounds(&base, "Angle", SIGNED_ANGLE, check, |m, v| m.angle = v);
        assert_closed_bounds(&base, "Slope", SLOPE, check, |m, v| m.slope = v);
        assert_closed_bounds(&base, "Inclination", ANGLE, check, |m, v| m.inclination = v);
        assert_closed_bounds(&base, "Length", JOINT_LENGTH, check, |m, v| m.length = v);
        assert_closed_bounds(&base, "Width", JOINT_SIZE, check, |m, v| m.width = v);
        assert_closed_bounds(&base, "Depth", DEPTH, check, |m, v| m.depth = v);
        assert_closed_bounds(&base, "ShapeRadius", JOINT_SIZE, check, |m, v| m.shape_radius = v);
    }
}
