//! French ridge lap: a half-depth end lap behind a vertical shoulder.

use super::common::{EndCut, SideContext};
use super::drilling::DrillingGeometry;
use crate::orientation::Orientation;
use crate::params::{ParameterMap, ParameterMapBuilder, RefPosition, ANGLE, JOINT_SIZE, START_X};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Hexahedron, Line, Plane};
use joinery_kernel_math::Tolerance;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A French ridge lap at one end of the blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrenchRidgeLap {
    /// End of the blank that is lapped.
    pub orientation: Orientation,
    /// Shoulder position on the edge named by `ref_position`.
    pub start_x: f64,
    /// Horizontal angle of the shoulder in degrees.
    pub angle: f64,
    /// Edge `start_x` is measured on.
    pub ref_position: RefPosition,
    /// Whether the lap is drilled for a peg.
    pub drillhole: bool,
    /// Peg hole diameter.
    pub drillhole_diam: f64,
}

/// Shoulder, removal volume and optional peg hole of a French ridge lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrenchRidgeLapGeometry {
    /// Shoulder plane, normal toward the lapped end.
    pub shoulder: Plane,
    /// Material removed above half depth.
    pub volume: Hexahedron,
    /// Peg hole through the lap.
    pub drill_hole: Option<DrillingGeometry>,
}

impl FrenchRidgeLap {
    /// BTLx element name.
    pub const NAME: &'static str = "FrenchRidgeLap";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "Angle",
        "RefPosition",
        "Drillhole",
        "DrillholeDiam",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        ANGLE.check("Angle", self.angle)?;
        JOINT_SIZE.check("DrillholeDiam", self.drillhole_diam)
    }

    /// Derive the lap from its shoulder plane, normal toward the lapped end.
    ///
    /// Acute shoulders are measured on the reference edge, obtuse ones on the
    /// opposite edge, so `start_x` always names the shoulder corner nearer
    /// the blank's middle.
    pub fn from_plane(
        plane: &Plane,
        beam: &Beam,
        ref_side: usize,
        drillhole_diam: Option<f64>,
        tol: &Tolerance,
    ) -> Result<Processing> {
        let side = long_side(beam, ref_side)?;
        if plane.normal.dot(&side.n()).abs() > tol.linear {
            return Err(ProcessingError::InvalidInput {
                kind: Self::NAME,
                reason: format!("shoulder plane {plane:?} is not perpendicular to reference side {ref_side}"),
            });
        }
        let cut = EndCut::from_plane(&side, plane, "french ridge lap shoulder")?;
        let ref_position = if cut.angle <= 90.0 {
            RefPosition::RefEdge
        } else {
            RefPosition::OppEdge
        };
        let start_x = side.edge_position(edge_offset(&side, ref_position), plane, "french ridge lap shoulder")?;
        debug!(
            kind = Self::NAME,
            ref_side,
            orientation = %cut.orientation,
            start_x,
            angle = cut.angle,
            %ref_position,
            "derived processing"
        );
        Ok(Processing::new(
            Self {
                orientation: cut.orientation,
                start_x,
                angle: cut.angle,
                ref_position,
                drillhole: drillhole_diam.is_some(),
                drillhole_diam: drillhole_diam.unwrap_or(0.0),
            },
            ref_side,
        )?)
    }

    /// Shoulder, volume and peg hole on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<FrenchRidgeLapGeometry> {
        let side = long_side(beam, ref_side)?;
        let cut = EndCut {
            orientation: self.orientation,
            start_x: self.start_x,
            angle: self.angle,
            inclination: 90.0,
        };
        let shoulder = Plane::new(
            side.point(self.start_x, edge_offset(&side, self.ref_position), 0.0),
            cut.normal(&side),
        );
        let e_x = side.x() * self.orientation.sign();
        let blank_end = match self.orientation {
            Orientation::End => side.point(side.surface.xsize, 0.0, 0.0),
            Orientation::Start => side.point(0.0, 0.0, 0.0),
        };
        let volume = Hexahedron {
            start: shoulder.flipped(),
            end: Plane::new(blank_end, e_x),
            front: Plane::new(side.point(0.0, 0.0, 0.0), -side.y()),
            back: Plane::new(side.point(0.0, side.face_width, 0.0), side.y()),
            top: side.plane(),
            bottom: Plane::new(side.point(0.0, 0.0, side.depth * 0.5), -side.n()),
        };
        let drill_hole = if self.drillhole {
            let middle = side.face_width * 0.5;
            let x = side.edge_position(middle, &shoulder, "french ridge lap peg hole")?;
            let top = side.point(x, middle, 0.0) + e_x * middle;
            Some(DrillingGeometry {
                axis: Line::from_point_and_vector(top, -side.n() * side.depth),
                diameter: self.drillhole_diam,
            })
        } else {
            None
        };
        Ok(FrenchRidgeLapGeometry {
            shoulder,
            volume,
            drill_hole,
        })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("Angle", self.angle)
            .text("RefPosition", self.ref_position.as_str())
            .flag("Drillhole", self.drillhole)
            .float("DrillholeDiam", self.drillhole_diam)
            .build()
    }
}

/// The lap runs along the blank, so only sides 0-3 carry it.
fn long_side(beam: &Beam, ref_side: usize) -> Result<SideContext> {
    if ref_side > 3 {
        return Err(ProcessingError::InvalidInput {
            kind: FrenchRidgeLap::NAME,
            reason: format!("reference side {ref_side} is an end face"),
        });
    }
    SideContext::new(beam, ref_side)
}

fn edge_offset(side: &SideContext, position: RefPosition) -> f64 {
    match position {
        RefPosition::RefEdge => 0.0,
        RefPosition::OppEdge => side.face_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::common::testing::{beam, planes_match};
    use crate::Feature;
    use approx::assert_abs_diff_eq;
    use joinery_kernel_math::{Point3, Vec3};

    fn lap(p: &Processing) -> &FrenchRidgeLap {
        match p.feature() {
            Feature::FrenchRidgeLap(l) => l,
            other => panic!("unexpected feature {other:?}"),
        }
    }

    fn shoulder(angle: f64) -> Plane {
        let a = angle.to_radians();
        Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::new(a.sin(), a.cos(), 0.0))
    }

    #[test]
    fn test_square_shoulder() {
        let b = beam();
        let plane = Plane::new(Point3::new(1700.0, 0.0, 0.0), Vec3::x());
        let p = FrenchRidgeLap::from_plane(&plane, &b, 2, None, &Tolerance::DEFAULT).unwrap();
        let l = lap(&p);
        assert_eq!(l.orientation, Orientation::End);
        assert_eq!(l.ref_position, RefPosition::RefEdge);
        assert_abs_diff_eq!(l.start_x, 1700.0, epsilon = 1e-9);
        assert_abs_diff_eq!(l.angle, 90.0, epsilon = 1e-9);
        let map = p.to_parameter_map();
        assert_eq!(map.get_str("RefPosition"), Some("refedge"));
        assert_eq!(map.get_str("Drillhole"), Some("no"));
    }

    #[test]
    fn test_acute_and_obtuse_measure_nearer_corner() {
        let b = beam();
        let acute = FrenchRidgeLap::from_plane(&shoulder(60.0), &b, 2, None, &Tolerance::DEFAULT).unwrap();
        let obtuse = FrenchRidgeLap::from_plane(&shoulder(120.0), &b, 2, None, &Tolerance::DEFAULT).unwrap();
        let expected = 1500.0 + 25.0 / 60f64.to_radians().sin();
        assert_eq!(lap(&acute).ref_position, RefPosition::RefEdge);
        assert_abs_diff_eq!(lap(&acute).angle, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lap(&acute).start_x, expected, epsilon = 1e-9);
        assert_eq!(lap(&obtuse).ref_position, RefPosition::OppEdge);
        assert_abs_diff_eq!(lap(&obtuse).angle, 120.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lap(&obtuse).start_x, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_shoulder() {
        let b = beam();
        for angle in [60.0, 120.0] {
            let plane = shoulder(angle);
            let p = FrenchRidgeLap::from_plane(&plane, &b, 2, None, &Tolerance::DEFAULT).unwrap();
            let g = lap(&p).to_geometry(&b, 2).unwrap();
            assert!(planes_match(&g.shoulder, &plane));
        }
    }

    #[test]
    fn test_half_depth_volume_and_peg() {
        let b = beam();
        let plane = Plane::new(Point3::new(1700.0, 0.0, 0.0), Vec3::x());
        let p = FrenchRidgeLap::from_plane(&plane, &b, 2, Some(20.0), &Tolerance::DEFAULT).unwrap();
        let g = lap(&p).to_geometry(&b, 2).unwrap();
        let c = g.volume.corners().unwrap();
        assert!((c[0] - Point3::new(1700.0, -50.0, 0.0)).norm() < 1e-9);
        assert!((c[6] - Point3::new(2000.0, 50.0, 60.0)).norm() < 1e-9);
        let hole = g.drill_hole.unwrap();
        assert!((hole.axis.start - Point3::new(1750.0, 0.0, 60.0)).norm() < 1e-9);
        assert!((hole.axis.end - Point3::new(1750.0, 0.0, -60.0)).norm() < 1e-9);
        assert_abs_diff_eq!(hole.diameter, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_start_lap_volume() {
        let b = beam();
        let plane = Plane::new(Point3::new(300.0, 0.0, 0.0), -Vec3::x());
        let p = FrenchRidgeLap::from_plane(&plane, &b, 2, None, &Tolerance::DEFAULT).unwrap();
        assert_eq!(lap(&p).orientation, Orientation::Start);
        let g = lap(&p).to_geometry(&b, 2).unwrap();
        assert!(g.volume.contains(&Point3::new(100.0, 0.0, 30.0), &Tolerance::DEFAULT));
        assert!(!g.volume.contains(&Point3::new(400.0, 0.0, 30.0), &Tolerance::DEFAULT));
    }

    #[test]
    fn test_inclined_shoulder_is_rejected() {
        let plane = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.5));
        let err = FrenchRidgeLap::from_plane(&plane, &beam(), 2, None, &Tolerance::DEFAULT).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidInput { kind: "FrenchRidgeLap", .. }));
    }

    #[test]
    fn test_end_face_side_is_rejected() {
        let plane = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let err = FrenchRidgeLap::from_plane(&plane, &beam(), 4, None, &Tolerance::DEFAULT).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidInput { .. }));
    }
}
