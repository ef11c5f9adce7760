//! Tenon: a rectangular stub left on a cut end of the blank.

use super::common::{frame_box, EndCut, SideContext};
use crate::orientation::Orientation;
use crate::params::{
    ParameterMap, ParameterMapBuilder, TenonShape, ANGLE, JOINT_LENGTH, JOINT_SIZE, START_DEPTH, START_X,
    START_Y,
};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{intersection_line_plane, Frame, Hexahedron, Line, Plane};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Placement and size of a tenon on its cut plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenonOptions {
    /// Centre of the tenon across the reference side.
    pub start_y: f64,
    /// Depth of the tenon root below the reference side.
    pub start_depth: f64,
    /// Rotation of the tenon length in the cut plane, degrees.
    pub rotation: f64,
    /// Length in the cut plane.
    pub length: f64,
    /// Width in the cut plane.
    pub width: f64,
    /// Height out of the cut plane.
    pub height: f64,
    /// Corner shape.
    pub shape: TenonShape,
    /// Corner radius for [`TenonShape::Radius`].
    pub shape_radius: f64,
    /// Whether the top of the tenon is limited.
    pub length_limited_top: bool,
    /// Whether the bottom of the tenon is limited.
    pub length_limited_bottom: bool,
    /// Whether the tenon edges are chamfered.
    pub chamfer: bool,
}

impl Default for TenonOptions {
    fn default() -> Self {
        Self {
            start_y: 0.0,
            start_depth: 0.0,
            rotation: 90.0,
            length: 80.0,
            width: 40.0,
            height: 40.0,
            shape: TenonShape::Automatic,
            shape_radius: 20.0,
            length_limited_top: true,
            length_limited_bottom: true,
            chamfer: false,
        }
    }
}

/// Cut plane and local frame of a tenon.
///
/// The frame's x axis runs along the tenon length, z out of the cut face.
pub(crate) fn tenon_frame(
    side: &SideContext,
    cut: &EndCut,
    start_y: f64,
    start_depth: f64,
    rotation: f64,
) -> Result<(Plane, Frame)> {
    let cut_plane = cut.plane(side);
    let line = Line::from_point_and_vector(side.point(0.0, start_y, start_depth), side.x());
    let root = intersection_line_plane(&line, &cut_plane).ok_or(ProcessingError::LinePlaneParallel {
        line,
        plane: cut_plane,
        context: "tenon root",
    })?;
    let turned = side.cut_frame(root, cut.angle, cut.inclination);
    let (sin, cos) = rotation.to_radians().sin_cos();
    let along = turned.yaxis * cos - turned.zaxis * sin;
    let across = cut_plane.normal.cross(&along);
    Ok((cut_plane, Frame::new(root, along, across)))
}

/// Longest tenon that stays above the far side of the blank.
pub(crate) fn max_tenon_length(side: &SideContext, cut: &EndCut, start_depth: f64, rotation: f64) -> Option<f64> {
    let rate = rotation.to_radians().sin() * cut.inclination.to_radians().sin();
    (rate > 1e-9).then(|| ((side.depth - start_depth) / rate).max(0.0))
}

/// Bound a requested tenon length to the blank, logging when it shrinks.
pub(crate) fn bounded_tenon_length(
    kind: &'static str,
    side: &SideContext,
    cut: &EndCut,
    options: &TenonOptions,
) -> f64 {
    match max_tenon_length(side, cut, options.start_depth, options.rotation) {
        Some(max) if options.length > max => {
            warn!(kind, length = options.length, bounded = max, "tenon length bounded to the blank");
            max
        }
        _ => options.length,
    }
}

/// A tenon on a cut end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenon {
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
    /// Edges chamfered.
    pub chamfer: bool,
    /// Length in the cut plane.
    pub length: f64,
    /// Width in the cut plane.
    pub width: f64,
    /// Height out of the cut plane.
    pub height: f64,
    /// Corner shape.
    pub shape: TenonShape,
    /// Corner radius.
    pub shape_radius: f64,
}

/// Cut plane, frame and volume of a tenon or dovetail tenon.
#[derive(Debug, Clone, PartialEq)]
pub struct TenonGeometry {
    /// The end cut, normal toward the removed end.
    pub cut_plane: Plane,
    /// Tenon frame: x along the length, z out of the cut face.
    pub frame: Frame,
    /// Tenon volume.
    pub volume: Hexahedron,
}

impl Tenon {
    /// BTLx element name.
    pub const NAME: &'static str = "Tenon";

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
        "Chamfer",
        "Length",
        "Width",
        "Height",
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
        JOINT_SIZE.check("ShapeRadius", self.shape_radius)
    }

    /// Derive a tenon from the end cut plane, normal toward the removed end.
    ///
    /// The length is bounded so the tenon does not run out of the blank.
    pub fn from_plane(plane: &Plane, beam: &Beam, ref_side: usize, options: &TenonOptions) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        let cut = EndCut::from_plane(&side, plane, "tenon cut reference edge")?;
        let length = bounded_tenon_length(Self::NAME, &side, &cut, options);
        debug!(
            kind = Self::NAME,
            ref_side,
            orientation = %cut.orientation,
            start_x = cut.start_x,
            angle = cut.angle,
            inclination = cut.inclination,
            length,
            "derived processing"
        );
        let tenon = Self {
            orientation: cut.orientation,
            start_x: cut.start_x,
            start_y: options.start_y,
            start_depth: options.start_depth,
            angle: cut.angle,
            inclination: cut.inclination,
            rotation: options.rotation,
            length_limited_top: options.length_limited_top,
            length_limited_bottom: options.length_limited_bottom,
            chamfer: options.chamfer,
            length,
            width: options.width,
            height: options.height,
            shape: options.shape,
            shape_radius: options.shape_radius,
        };
        Ok(Processing::new(tenon, ref_side)?)
    }

    fn end_cut(&self) -> EndCut {
        EndCut {
            orientation: self.orientation,
            start_x: self.start_x,
            angle: self.angle,
            inclination: self.inclination,
        }
    }

    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<TenonGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        let (cut_plane, frame) = tenon_frame(
            &side,
            &self.end_cut(),
            self.start_y,
            self.start_depth,
            self.rotation,
        )?;
        let half = self.width * 0.5;
        let volume = frame_box(&frame, (0.0, self.length), (-half, half), (0.0, self.height));
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
            .flag("Chamfer", self.chamfer)
            .float("Length", self.length)
            .float("Width", self.width)
            .float("Height", self.height)
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

    fn tenon(p: &Processing) -> &Tenon {
        match p.feature() {
            Feature::Tenon(t) => t,
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
            height: 30.0,
            ..TenonOptions::default()
        }
    }

    #[test]
    fn test_square_tenon_on_top_side() {
        let b = beam();
        let p = Tenon::from_plane(&square_end(), &b, 2, &options()).unwrap();
        let t = tenon(&p);
        assert_eq!(t.orientation, Orientation::End);
        assert_abs_diff_eq!(t.start_x, 1500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.angle, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.inclination, 90.0, epsilon = 1e-9);

        let g = t.to_geometry(&b, 2).unwrap();
        // root on the centre of the top edge, length running down, height along +X
        assert!((g.frame.point - Point3::new(1500.0, 0.0, 60.0)).norm() < 1e-9);
        assert!((g.frame.xaxis + Vec3::z()).norm() < 1e-12);
        assert!((g.frame.zaxis - Vec3::x()).norm() < 1e-12);
        assert_abs_diff_eq!(g.volume.top.point.x, 1530.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g.volume.end.point.z, -20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g.volume.front.point.y, -20.0, epsilon = 1e-9);
        assert!(planes_match(&g.cut_plane, &square_end()));
    }

    #[test]
    fn test_length_bounded_to_blank() {
        let opts = TenonOptions {
            length: 150.0,
            ..options()
        };
        let p = Tenon::from_plane(&square_end(), &beam(), 2, &opts).unwrap();
        assert_abs_diff_eq!(tenon(&p).length, 120.0, epsilon = 1e-9);

        let opts = TenonOptions {
            length: 150.0,
            start_depth: 30.0,
            rotation: 30.0,
            ..options()
        };
        let p = Tenon::from_plane(&square_end(), &beam(), 2, &opts).unwrap();
        assert_abs_diff_eq!(tenon(&p).length, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_through_cut_plane() {
        let b = beam();
        for (orientation, angle, inclination) in [
            (Orientation::End, 70.0, 80.0),
            (Orientation::Start, 110.0, 60.0),
        ] {
            let original = Tenon {
                orientation,
                start_x: 900.0,
                start_y: 50.0,
                start_depth: 10.0,
                angle,
                inclination,
                rotation: 90.0,
                length_limited_top: true,
                length_limited_bottom: false,
                chamfer: true,
                length: 60.0,
                width: 30.0,
                height: 40.0,
                shape: TenonShape::Round,
                shape_radius: 15.0,
            };
            let g = original.to_geometry(&b, 2).unwrap();
            let opts = TenonOptions {
                start_y: 50.0,
                start_depth: 10.0,
                rotation: 90.0,
                length: 60.0,
                width: 30.0,
                height: 40.0,
                shape: TenonShape::Round,
                shape_radius: 15.0,
                length_limited_top: true,
                length_limited_bottom: false,
                chamfer: true,
            };
            let p = Tenon::from_plane(&g.cut_plane, &b, 2, &opts).unwrap();
            let t = tenon(&p);
            assert_eq!(t.orientation, orientation);
            assert_abs_diff_eq!(t.start_x, 900.0, epsilon = 1e-9);
            assert_abs_diff_eq!(t.angle, angle, epsilon = 1e-9);
            assert_abs_diff_eq!(t.inclination, inclination, epsilon = 1e-9);
            assert_eq!(t.shape, original.shape);
            assert_eq!(t.length_limited_bottom, original.length_limited_bottom);
            assert_abs_diff_eq!(t.length, original.length, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_volume_grows_out_of_cut_face() {
        let b = beam();
        let p = Tenon::from_plane(&square_end().flipped(), &b, 2, &options()).unwrap();
        let t = tenon(&p);
        assert_eq!(t.orientation, Orientation::Start);
        let g = t.to_geometry(&b, 2).unwrap();
        assert!((g.frame.zaxis + Vec3::x()).norm() < 1e-12);
        assert!((g.volume.bottom.normal - Vec3::x()).norm() < 1e-12);
        assert_abs_diff_eq!(g.volume.top.point.x, 1470.0, epsilon = 1e-9);
    }

    #[test]
    fn test_parameter_map() {
        let p = Tenon::from_plane(&square_end(), &beam(), 2, &options()).unwrap();
        let map = p.to_parameter_map();
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, Tenon::PARAMETER_KEYS.to_vec());
        assert_eq!(map.get_str("Shape"), Some("automatic"));
        assert_eq!(map.get_str("Chamfer"), Some("no"));
        assert_eq!(map.get_str("Rotation"), Some("90.000"));
    }

    #[test]
    fn test_interval_bounds() {
        let p = Tenon::from_plane(&square_end(), &beam(), 2, &options()).unwrap();
        let base = tenon(&p).clone();
        assert_closed_bounds(&base, "StartX", START_X, Tenon::validate, |t, v| t.start_x = v);
        assert_closed_bounds(&base, "StartY", START_Y, Tenon::validate, |t, v| t.start_y = v);
        assert_closed_bounds(&base, "StartDepth", START_DEPTH, Tenon::validate, |t, v| t.start_depth = v);
        assert_closed_bounds(&base, "Angle", ANGLE, Tenon::validate, |t, v| t.angle = v);
        assert_closed_bounds(&base, "Inclination", ANGLE, Tenon::validate, |t, v| t.inclination = v);
        assert_closed_bounds(&base, "Rotation", ANGLE, Tenon::validate, |t, v| t.rotation = v);
        assert_closed_bounds(&base, "Length", JOINT_LENGTH, Tenon::validate, |t, v| t.length = v);
        assert_closed_bounds(&base, "Width", JOINT_SIZE, Tenon::validate, |t, v| t.width = v);
        assert_closed_bounds(&base, "Height", JOINT_SIZE, Tenon::validate, |t, v| t.height = v);
        assert_closed_bounds(&base, "ShapeRadius", JOINT_SIZE, Tenon::validate, |t, v| t.shape_radius = v);
    }
}
