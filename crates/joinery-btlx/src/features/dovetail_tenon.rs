//! Dovetail tenon: a tapered tenon milled with a dovetail cutter.

use super::common::{dovetail_box, EndCut, SideContext};
use super::tenon::{bounded_tenon_length, tenon_frame, TenonGeometry, TenonOptions};
use crate::orientation::Orientation;
use crate::params::{
    Interval, ParameterMap, ParameterMapBuilder, TenonShape, ANGLE, JOINT_LENGTH, JOINT_SIZE, START_DEPTH,
    START_X, START_Y,
};
use crate::{DovetailTool, Processing, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::Plane;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Flank angle used when no explicit angle is requested.
pub(crate) const DEFAULT_FLANK_ANGLE: f64 = 15.0;
/// Taper of the dovetail along its length.
pub(crate) const CONE_ANGLE: Interval = Interval::new(0.0, 30.0);
/// Flank angle of the dovetail cutter.
pub(crate) const FLANK_ANGLE: Interval = Interval::new(5.0, 35.0);

/// The flank angle a dovetail is actually cut with.
pub(crate) fn effective_flank_angle(use_flank_angle: bool, flank_angle: f64) -> f64 {
    if use_flank_angle {
        flank_angle
    } else {
        DEFAULT_FLANK_ANGLE
    }
}

/// Dovetail taper and flank settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DovetailOptions {
    /// Taper along the length in degrees.
    pub cone_angle: f64,
    /// Whether `flank_angle` overrides the default flank.
    pub use_flank_angle: bool,
    /// Flank angle in degrees.
    pub flank_angle: f64,
}

impl Default for DovetailOptions {
    fn default() -> Self {
        Self {
            cone_angle: 0.0,
            use_flank_angle: false,
            flank_angle: DEFAULT_FLANK_ANGLE,
        }
    }
}

/// A dovetail tenon on a cut end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DovetailTenon {
    /// End of the blank that carries the tenon.
    pub orientation: Orientation,
    /// Cut position along the reference edge.
    pub start_x: f64,
    /// Tenon centre across the side.
    pub start_y: f64,
    /// Tenon root below the side.
    pub start_depth: f64,
    /// Horizontal angle of the cut in degrees.
    pub angle: f64,
    /// Vertical angle of the cut in degrees.
    pub inclination: f64,
    /// Rotation of the tenon in the cut plane in degrees.
    pub rotation: f64,
    /// Top of the tenon limited.
    pub length_limited_top: bool,
    /// Bottom of the tenon limited.
    pub length_limited_bottom: bool,
    /// Length in the cut plane.
    pub length: f64,
    /// Width at the root.
    pub width: f64,
    /// Height out of the cut plane.
    pub height: f64,
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

impl DovetailTenon {
    /// BTLx element name.
    pub const NAME: &'static str = "DovetailTenon";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StartY",
        "StartDepth",
        "Angle",
        "Inclination",
        "Rotation",
        "LengthLimitedTop",
        "LengthLimitedBottom",
        "Length",
        "Width",
        "Height",
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
        ANGLE.check("Angle", self.angle)?;
        ANGLE.check("Inclination", self.inclination)?;
        ANGLE.check("Rotation", self.rotation)?;
        JOINT_LENGTH.check("Length", self.length)?;
        JOINT_SIZE.check("Width", self.width)?;
        JOINT_SIZE.check("Height", self.height)?;
        CONE_ANGLE.check("ConeAngle", self.cone_angle)?;
        FLANK_ANGLE.check("FlankAngle", self.flank_angle)?;
        JOINT_SIZE.check("ShapeRadius", self.shape_radius)
    }

    /// Derive a dovetail tenon from the end cut plane, normal toward the removed end.
    ///
    /// With a `tool`, the flank angle, corner radius and maximum height follow
    /// the cutter.
    pub fn from_plane(
        plane: &Plane,
        beam: &Beam,
        ref_side: usize,
        options: &TenonOptions,
        dovetail: &DovetailOptions,
        tool: Option<&DovetailTool>,
    ) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        let cut = EndCut::from_plane(&side, plane, "dovetail tenon cut reference edge")?;
        let length = bounded_tenon_length(Self::NAME, &side, &cut, options);

        let mut tenon = Self {
            orientation: cut.orientation,
            start_x: cut.start_x,
            start_y: options.start_y,
            start_depth: options.start_depth,
            angle: cut.angle,
            inclination: cut.inclination,
            rotation: options.rotation,
            length_limited_top: options.length_limited_top,
            length_limited_bottom: options.length_limited_bottom,
            length,
            width: options.width,
            height: options.height,
            cone_angle: dovetail.cone_angle,
            use_flank_angle: dovetail.use_flank_angle,
            flank_angle: dovetail.flank_angle,
            shape: options.shape,
            shape_radius: options.shape_radius,
        };
        if let Some(tool) = tool {
            tenon.apply_tool(tool);
        }
        debug!(
            kind = Self::NAME,
            ref_side,
            orientation = %tenon.orientation,
            start_x = tenon.start_x,
            angle = tenon.angle,
            inclination = tenon.inclination,
            flank_angle = tenon.flank(),
            "derived processing"
        );
        Ok(Processing::new(tenon, ref_side)?)
    }

    fn apply_tool(&mut self, tool: &DovetailTool) {
        self.use_flank_angle = true;
        self.flank_angle = tool.angle;
        self.shape = TenonShape::Radius;
        self.shape_radius = tool.radius();
        if self.height > tool.height {
            warn!(
                kind = Self::NAME,
                height = self.height,
                bounded = tool.height,
                "dovetail height bounded to the cutter"
            );
            self.height = tool.height;
        }
    }

    /// Flank angle the tenon is cut with.
    pub fn flank(&self) -> f64 {
        effective_flank_angle(self.use_flank_angle, self.flank_angle)
    }

    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<TenonGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let cut = EndCut {
            orientation: self.orientation,
            start_x: self.start_x,
            angle: self.angle,
            inclination: self.inclination,
        };
        let (cut_plane, frame) = tenon_frame(&side, &cut, self.start_y, self.start_depth, self.rotation)?;
        let volume = dovetail_box(
            &frame,
            self.length,
            self.width,
            self.height,
            self.cone_angle,
            self.flank(),
        );
        Ok(TenonGeometry {
            cut_plane,
            frame,
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
            .float("Rotation", self.rotation)
            .flag("LengthLimitedTop", self.length_limited_top)
            .flag("LengthLimitedBottom", self.length_limited_bottom)
            .float("Length", self.length)
            .float("Width", self.width)
            .float("Height", self.height)
            .float("ConeAngle", self.cone_angle)
            .flag("UseFlankAngle", self.use_flank_angle)
            .float("FlankAngle", self.flank_angle)
            .text("Shape", self.shape.as_str())
            .float("ShapeRadius", self.shape_radius)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::common::testing::{assert_closed_bounds, beam, planes_match};
    use crate::Feature;
    use approx::assert_abs_diff_eq;
    use joinery_kernel_math::{Point3, Vec3};

    fn dovetail(p: &Processing) -> &DovetailTenon {
        match p.feature() {
            Feature::DovetailTenon(t) => t,
            other => panic!("unexpected feature {other:?}"),
        }
    }

    fn square_end() -> Plane {
        Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x())
    }

    fn options() -> TenonOptions {
        TenonOptions {
            start_y: 50.0,
            length: 80.0,
            width: 40.0,
            height: 35.0,
            ..TenonOptions::default()
        }
    }

    #[test]
    fn test_default_flank_without_tool() {
        let p = DovetailTenon::from_plane(&square_end(), &beam(), 2, &options(), &DovetailOptions::default(), None)
            .unwrap();
        let t = dovetail(&p);
        assert!(!t.use_flank_angle);
        assert_abs_diff_eq!(t.flank(), 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t.height, 35.0, epsilon = 1e-12);
        assert_eq!(t.shape, TenonShape::Automatic);
    }

    #[test]
    fn test_tool_sets_flank_radius_and_height() {
        let tool = DovetailTool {
            angle: 10.0,
            diameter: 50.0,
            height: 28.0,
        };
        let p = DovetailTenon::from_plane(
            &square_end(),
            &beam(),
            2,
            &options(),
            &DovetailOptions::default(),
            Some(&tool),
        )
        .unwrap();
        let t = dovetail(&p);
        assert!(t.use_flank_angle);
        assert_abs_diff_eq!(t.flank(), 10.0, epsilon = 1e-12);
        assert_eq!(t.shape, TenonShape::Radius);
        assert_abs_diff_eq!(t.shape_radius, 25.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t.height, 28.0, epsilon = 1e-12);
        let map = p.to_parameter_map();
        assert_eq!(map.get_str("UseFlankAngle"), Some("yes"));
        assert_eq!(map.get_str("Shape"), Some("radius"));
    }

    #[test]
    fn test_volume_widens_away_from_root() {
        let b = beam();
        let p = DovetailTenon::from_plane(&square_end(), &b, 2, &options(), &DovetailOptions::default(), None)
            .unwrap();
        let g = dovetail(&p).to_geometry(&b, 2).unwrap();
        let c = g.volume.corners().unwrap();
        let root = (c[3] - c[0]).norm();
        let tip = (c[7] - c[4]).norm();
        assert_abs_diff_eq!(root, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tip, 40.0 + 2.0 * 35.0 * 15f64.to_radians().tan(), epsilon = 1e-9);
        // the tip face lies height beyond the cut plane
        assert_abs_diff_eq!(g.cut_plane.signed_distance(&c[4]), 35.0, epsilon = 1e-9);
    }

    #[test]
    fn test_flank_angle_bounds() {
        let p = DovetailTenon::from_plane(&square_end(), &beam(), 2, &options(), &DovetailOptions::default(), None)
            .unwrap();
        let mut t = dovetail(&p).clone();
        t.flank_angle = 40.0;
        assert!(matches!(
            t.validate(),
            Err(ValidationError::OutOfRange { field: "FlankAngle", .. })
        ));
        t.flank_angle = 20.0;
        t.cone_angle = 31.0;
        assert!(matches!(
            t.validate(),
            Err(ValidationError::OutOfRange { field: "ConeAngle", .. })
        ));
    }

    #[test]
    fn test_oblique_cut_round_trip() {
        let b = beam();
        let plane = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::new(1.0, 0.3, -0.2).normalize());
        let opts = TenonOptions {
            rotation: 70.0,
            ..options()
        };
        let dove = DovetailOptions {
            cone_angle: 5.0,
            use_flank_angle: true,
            flank_angle: 12.0,
        };
        let p = DovetailTenon::from_plane(&plane, &b, 1, &opts, &dove, None).unwrap();
        let t = dovetail(&p).clone();
        assert_eq!(t.orientation, Orientation::End);
        assert_abs_diff_eq!(t.start_x, 1497.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.angle, 78.690_067_525_979_79, epsilon = 1e-9);
        assert_abs_diff_eq!(t.inclination, 73.607_477_305_290_57, epsilon = 1e-9);
        assert_abs_diff_eq!(t.rotation, 70.0, epsilon = 1e-12);
        let map = p.to_parameter_map();
        assert_eq!(map.get_str("StartX"), Some("1497.000"));
        assert_eq!(map.get_str("Angle"), Some("78.690"));
        assert_eq!(map.get_str("Inclination"), Some("73.607"));

        let g = t.to_geometry(&b, 1).unwrap();
        assert!(planes_match(&g.cut_plane, &plane));
        // root where the side 1 line at y = 50 meets the cut
        assert!((g.frame.point - Point3::new(1487.0, 50.0, 10.0)).norm() < 1e-9);
        assert!((g.frame.zaxis - plane.normal).norm() < 1e-9);

        let again = DovetailTenon::from_plane(&g.cut_plane, &b, 1, &opts, &dove, None).unwrap();
        let t2 = dovetail(&again);
        assert_eq!(t2.orientation, t.orientation);
        assert_abs_diff_eq!(t2.start_x, t.start_x, epsilon = 1e-9);
        assert_abs_diff_eq!(t2.angle, t.angle, epsilon = 1e-9);
        assert_abs_diff_eq!(t2.inclination, t.inclination, epsilon = 1e-9);
        assert_eq!(again.to_parameter_map(), p.to_parameter_map());
    }

    #[test]
    fn test_start_end_round_trip() {
        let b = beam();
        for (orientation, angle, inclination) in [
            (Orientation::End, 65.0, 80.0),
            (Orientation::Start, 120.0, 100.0),
        ] {
            let original = DovetailTenon {
                orientation,
                start_x: 800.0,
                start_y: 50.0,
                start_depth: 20.0,
                angle,
                inclination,
                rotation: 90.0,
                length_limited_top: true,
                length_limited_bottom: true,
                length: 60.0,
                width: 30.0,
                height: 25.0,
                cone_angle: 0.0,
                use_flank_angle: false,
                flank_angle: DEFAULT_FLANK_ANGLE,
                shape: TenonShape::Automatic,
                shape_radius: 20.0,
            };
            let g = original.to_geometry(&b, 2).unwrap();
            let opts = TenonOptions {
                start_y: 50.0,
                start_depth: 20.0,
                rotation: 90.0,
                length: 60.0,
                width: 30.0,
                height: 25.0,
                shape_radius: 20.0,
                ..TenonOptions::default()
            };
            let p = DovetailTenon::from_plane(&g.cut_plane, &b, 2, &opts, &DovetailOptions::default(), None)
                .unwrap();
            let t = dovetail(&p);
            assert_eq!(t.orientation, orientation);
            assert_abs_diff_eq!(t.start_x, 800.0, epsilon = 1e-9);
            assert_abs_diff_eq!(t.angle, angle, epsilon = 1e-9);
            assert_abs_diff_eq!(t.inclination, inclination, epsilon = 1e-9);
            let g2 = t.to_geometry(&b, 2).unwrap();
            assert!((g2.frame.point - g.frame.point).norm() < 1e-9);
        }
    }

    #[test]
    fn test_interval_bounds() {
        let p = DovetailTenon::from_plane(&square_end(), &beam(), 2, &options(), &DovetailOptions::default(), None)
            .unwrap();
        let base = dovetail(&p).clone();
        let check = DovetailTenon::validate;
        assert_closed_bounds(&base, "StartX", START_X, check, |t, v| t.start_x = v);
        assert_closed_bounds(&base, "StartY", START_Y, check, |t, v| t.start_y = v);
        assert_closed_bounds(&base, "StartDepth", START_DEPTH, check, |t, v| t.start_depth = v);
        assert_closed_bounds(&base, "Angle", ANGLE, check, |t, v| t.angle = v);
        assert_closed_bounds(&base, "Inclination", ANGLE, check, |t, v| t.inclination = v);
        assert_closed_bounds(&base, "Rotation", ANGLE, check, |t, v| t.rotation = v);
        assert_closed_bounds(&base, "Length", JOINT_LENGTH, check, |t, v| t.length = v);
        assert_closed_bounds(&base, "Width", JOINT_SIZE, check, |t, v| t.width = v);
        assert_closed_bounds(&base, "Height", JOINT_SIZE, check, |t, v| t.height = v);
        assert_closed_bounds(&base, "ConeAngle", CONE_ANGLE, check, |t, v| t.cone_angle = v);
        assert_closed_bounds(&base, "FlankAngle", FLANK_ANGLE, check, |t, v| t.flank_angle = v);
        assert_closed_bounds(&base, "ShapeRadius", JOINT_SIZE, check, |t, v| t.shape_radius = v);
    }
}
