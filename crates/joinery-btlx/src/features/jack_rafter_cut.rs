//! Jack rafter cut: one plane cutting off an end of the blank.

use super::common::{EndCut, SideContext};
use crate::orientation::Orientation;
use crate::params::{ParameterMap, ParameterMapBuilder, ANGLE, START_DEPTH, START_X, START_Y};
use crate::{Processing, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::Plane;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single planar end cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JackRafterCut {
    /// End of the blank that is removed.
    pub orientation: Orientation,
    /// Reference point along the blank.
    pub start_x: f64,
    /// Reference point across the side.
    pub start_y: f64,
    /// Reference point below the side.
    pub start_depth: f64,
    /// Horizontal angle in degrees.
    pub angle: f64,
    /// Vertical angle in degrees.
    pub inclination: f64,
}

impl JackRafterCut {
    /// BTLx element name.
    pub const NAME: &'static str = "JackRafterCut";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StartY",
        "StartDepth",
        "Angle",
        "Inclination",
    ];

    /// Cut through a point on the reference edge.
    pub fn new(orientation: Orientation, start_x: f64, angle: f64, inclination: f64) -> Self {
        Self {
            orientation,
            start_x,
            start_y: 0.0,
            start_depth: 0.0,
            angle,
            inclination,
        }
    }

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        START_DEPTH.check("StartDepth", self.start_depth)?;
        ANGLE.check("Angle", self.angle)?;
        ANGLE.check("Inclination", self.inclination)
    }

    /// Derive the cut from a plane whose normal points toward the removed end.
    pub fn from_plane(plane: &Plane, beam: &Beam, ref_side: usize) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        let EndCut {
            orientation,
            start_x,
            angle,
            inclination,
        } = EndCut::from_plane(&side, plane, "jack rafter cut reference edge")?;
        debug!(
            kind = Self::NAME,
            ref_side,
            %orientation,
            start_x,
            angle,
            inclination,
            "derived processing"
        );
        Ok(Processing::new(
            Self::new(orientation, start_x, angle, inclination),
            ref_side,
        )?)
    }

    /// The cutting plane, normal toward the removed end.
    pub fn to_plane(&self, beam: &Beam, ref_side: usize) -> Result<Plane> {
        let side = SideContext::new(beam, ref_side)?;
        let cut = EndCut {
            orientation: self.orientation,
            start_x: self.start_x,
            angle: self.angle,
            inclination: self.inclination,
        };
        let origin = side.point(self.start_x, self.start_y, self.start_depth);
        Ok(Plane::new(origin, cut.normal(&side)))
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
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::common::testing::{beam, planes_match};
    use crate::{Feature, ProcessingError};
    use approx::assert_abs_diff_eq;
    use joinery_kernel_math::{Point3, Vec3};

    fn cut(p: &Processing) -> &JackRafterCut {
        match p.feature() {
            Feature::JackRafterCut(c) => c,
            other => panic!("unexpected feature {other:?}"),
        }
    }

    #[test]
    fn test_square_end_cut() {
        let plane = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let p = JackRafterCut::from_plane(&plane, &beam(), 1).unwrap();
        let c = cut(&p);
        assert_eq!(c.orientation, Orientation::End);
        assert_abs_diff_eq!(c.start_x, 1500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.angle, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.inclination, 90.0, epsilon = 1e-9);
        let map = p.to_parameter_map();
        assert_eq!(map.get_str("Orientation"), Some("end"));
        assert_eq!(map.get_str("StartX"), Some("1500.000"));
        assert_eq!(map.get_str("Inclination"), Some("90.000"));
    }

    #[test]
    fn test_angled_cut_on_top_side() {
        // side 2: origin (0, -50, 60), x = X, y = Y, n = Z
        let normal = Vec3::new(30f64.to_radians().cos(), 0.5, 0.0);
        let plane = Plane::new(Point3::new(1000.0, 0.0, 0.0), normal);
        let p = JackRafterCut::from_plane(&plane, &beam(), 2).unwrap();
        let c = cut(&p);
        assert_abs_diff_eq!(c.angle, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.inclination, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.start_x, 1000.0 + 25.0 / 30f64.to_radians().cos(), epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let b = beam();
        for (orientation, a, i) in [
            (Orientation::End, 60.0, 70.0),
            (Orientation::Start, 120.0, 45.0),
            (Orientation::End, 90.0, 135.0),
        ] {
            let original = JackRafterCut::new(orientation, 700.0, a, i);
            let plane = original.to_plane(&b, 1).unwrap();
            let p = JackRafterCut::from_plane(&plane, &b, 1).unwrap();
            let c = cut(&p);
            assert_eq!(c.orientation, orientation);
            assert_abs_diff_eq!(c.start_x, 700.0, epsilon = 1e-9);
            assert_abs_diff_eq!(c.angle, a, epsilon = 1e-9);
            assert_abs_diff_eq!(c.inclination, i, epsilon = 1e-9);
            assert!(planes_match(&c.to_plane(&b, 1).unwrap(), &plane));
        }
    }

    #[test]
    fn test_flipped_plane_flips_orientation() {
        let b = beam();
        let plane = Plane::new(Point3::new(800.0, 0.0, 0.0), Vec3::new(1.0, 0.2, 0.1));
        let a = JackRafterCut::from_plane(&plane, &b, 1).unwrap();
        let f = JackRafterCut::from_plane(&plane.flipped(), &b, 1).unwrap();
        assert_eq!(cut(&a).orientation, cut(&f).orientation.flipped());
        assert_abs_diff_eq!(cut(&a).angle, cut(&f).angle, epsilon = 1e-12);
        assert_abs_diff_eq!(cut(&a).start_x, cut(&f).start_x, epsilon = 1e-9);
    }

    #[test]
    fn test_plane_along_blank_is_rejected() {
        let plane = Plane::new(Point3::new(800.0, 0.0, 0.0), Vec3::y());
        let err = JackRafterCut::from_plane(&plane, &beam(), 2).unwrap_err();
        assert!(matches!(err, ProcessingError::LinePlaneParallel { .. }));
    }

    #[test]
    fn test_angle_bounds() {
        let mut c = JackRafterCut::new(Orientation::End, 0.0, 0.1, 179.9);
        assert!(c.validate().is_ok());
        c.angle = 0.0;
        assert!(matches!(
            c.validate(),
            Err(ValidationError::OutOfRange { field: "Angle", .. })
        ));
        c.angle = 90.0;
        c.start_x = 100_000.5;
        assert!(c.validate().is_err());
    }
}
