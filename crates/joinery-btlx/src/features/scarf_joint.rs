//! Scarf joint: a sloped lap joining two blanks end to end.
//!
//! In the section along the blank (`X` from the shoulder toward the removed
//! end, `Z` into the blank) the kept profile is
//!
//! ```text
//!   Q1 (0, 0)
//!   Q2 (0, DepthRefSide)          shoulder
//!   Q3 (Length, D - DepthOppSide) scarf face
//!   Q4 (Length, D)                end face
//! ```
//!
//! Everything above the profile and beyond `Q3Q4` is removed.

use super::common::{EndCut, Section, SideContext};
use super::drilling::DrillingGeometry;
use crate::orientation::Orientation;
use crate::params::{Interval, ParameterMap, ParameterMapBuilder, DEPTH, JOINT_LENGTH, JOINT_SIZE, START_X};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Line, Plane};
use joinery_kernel_math::Tolerance;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of drill holes through the joint.
const DRILL_HOLES: Interval = Interval::new(0.0, 2.0);

/// Scarf dimensions supplied with the shoulder plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScarfJointOptions {
    /// Length of the scarf along the blank.
    pub length: f64,
    /// Shoulder depth at the reference side.
    pub depth_ref_side: f64,
    /// Step height at the opposite side.
    pub depth_opp_side: f64,
    /// Drill holes through the joint (0, 1 or 2).
    pub num_drill_hole: u8,
    /// Diameter of the first hole.
    pub drill_hole_diam_1: f64,
    /// Diameter of the second hole.
    pub drill_hole_diam_2: f64,
}

impl Default for ScarfJointOptions {
    fn default() -> Self {
        Self {
            length: 300.0,
            depth_ref_side: 20.0,
            depth_opp_side: 20.0,
            num_drill_hole: 0,
            drill_hole_diam_1: 20.0,
            drill_hole_diam_2: 20.0,
        }
    }
}

/// A scarf joint at one end of the blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScarfJoint {
    /// End of the blank that is removed.
    pub orientation: Orientation,
    /// Shoulder position along the blank.
    pub start_x: f64,
    /// Length of the scarf.
    pub length: f64,
    /// Shoulder depth at the reference side.
    pub depth_ref_side: f64,
    /// Step height at the opposite side.
    pub depth_opp_side: f64,
    /// Drill holes through the joint.
    pub num_drill_hole: u8,
    /// Diameter of the first hole.
    pub drill_hole_diam_1: f64,
    /// Diameter of the second hole.
    pub drill_hole_diam_2: f64,
}

/// Cutting planes and drill axes of a scarf joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScarfJointGeometry {
    /// Shoulder, scarf face and end face, normals toward the removed material.
    ///
    /// A zero depth drops the shoulder or the end face.
    pub cuts: Vec<Plane>,
    /// Drill holes through the joint.
    pub drill_holes: Vec<DrillingGeometry>,
}

impl ScarfJoint {
    /// BTLx element name.
    pub const NAME: &'static str = "ScarfJoint";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "Length",
        "DepthRefSide",
        "DepthOppSide",
        "NumDrillHole",
        "DrillHoleDiam1",
        "DrillHoleDiam2",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        JOINT_LENGTH.check("Length", self.length)?;
        DEPTH.check("DepthRefSide", self.depth_ref_side)?;
        DEPTH.check("DepthOppSide", self.depth_opp_side)?;
        DRILL_HOLES.check("NumDrillHole", f64::from(self.num_drill_hole))?;
        JOINT_SIZE.check("DrillHoleDiam1", self.drill_hole_diam_1)?;
        JOINT_SIZE.check("DrillHoleDiam2", self.drill_hole_diam_2)
    }

    /// Derive a scarf joint from its shoulder plane, normal toward the removed end.
    ///
    /// The shoulder must be square to the blank.
    pub fn from_plane(
        plane: &Plane,
        beam: &Beam,
        ref_side: usize,
        options: &ScarfJointOptions,
        tol: &Tolerance,
    ) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        if !tol.vectors_parallel(&plane.normal, &side.x()) {
            return Err(ProcessingError::InvalidInput {
                kind: Self::NAME,
                reason: format!("shoulder plane {plane:?} is not square to the blank"),
            });
        }
        let cut = EndCut::from_plane(&side, plane, "scarf joint shoulder")?;
        let joint = Self {
            orientation: cut.orientation,
            start_x: cut.start_x,
            length: options.length,
            depth_ref_side: options.depth_ref_side,
            depth_opp_side: options.depth_opp_side,
            num_drill_hole: options.num_drill_hole,
            drill_hole_diam_1: options.drill_hole_diam_1,
            drill_hole_diam_2: options.drill_hole_diam_2,
        };
        joint.check_depths(side.depth)?;
        debug!(
            kind = Self::NAME,
            ref_side,
            orientation = %joint.orientation,
            start_x = joint.start_x,
            length = joint.length,
            "derived processing"
        );
        Ok(Processing::new(joint, ref_side)?)
    }

    fn check_depths(&self, depth: f64) -> Result<()> {
        if self.depth_ref_side + self.depth_opp_side >= depth {
            return Err(ProcessingError::InvalidInput {
                kind: Self::NAME,
                reason: format!(
                    "DepthRefSide {:.3} and DepthOppSide {:.3} leave no scarf face in a depth of {depth:.3}",
                    self.depth_ref_side, self.depth_opp_side
                ),
            });
        }
        Ok(())
    }

    fn section(&self, side: &SideContext) -> Section {
        Section::new(
            side.point(self.start_x, 0.0, 0.0),
            side.x() * self.orientation.sign(),
            side.n(),
        )
    }

    /// Cutting planes and drill axes on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<ScarfJointGeometry> {
        let side = SideContext::new(beam, ref_side)?;
        self.check_depths(side.depth)?;
        let section = self.section(&side);
        let d = side.depth;
        let mut profile = Vec::with_capacity(4);
        if self.depth_ref_side > 0.0 {
            profile.push((0.0, 0.0));
        }
        profile.push((0.0, self.depth_ref_side));
        profile.push((self.length, d - self.depth_opp_side));
        if self.depth_opp_side > 0.0 {
            profile.push((self.length, d));
        }
        let cuts = section.profile_planes(&profile)?;

        let positions: &[f64] = match self.num_drill_hole {
            0 => &[],
            1 => &[0.5],
            _ => &[1.0 / 3.0, 2.0 / 3.0],
        };
        let diameters = [self.drill_hole_diam_1, self.drill_hole_diam_2];
        let half_width = side.face_width * 0.5;
        let drill_holes = positions
            .iter()
            .zip(diameters)
            .map(|(&f, diameter)| {
                let top = section.point((self.length * f, 0.0)) + side.y() * half_width;
                DrillingGeometry {
                    axis: Line::from_point_and_vector(top, -side.n() * d),
                    diameter,
                }
            })
            .collect();
        Ok(ScarfJointGeometry { cuts, drill_holes })
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("Length", self.length)
            .float("DepthRefSide", self.depth_ref_side)
            .float("DepthOppSide", self.depth_opp_side)
            .int("NumDrillHole", i64::from(self.num_drill_hole))
            .float("DrillHoleDiam1", self.drill_hole_diam_1)
            .float("DrillHoleDiam2", self.drill_hole_diam_2)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::common::testing::{beam, planes_match};
    use crate::Feature;
    use approx::assert_abs_diff_eq;
    use joinery_kernel_math::{Point3, Vec3};

    fn scarf(p: &Processing) -> &ScarfJoint {
        match p.feature() {
            Feature::ScarfJoint(s) => s,
            other => panic!("unexpected feature {other:?}"),
        }
    }

    fn options() -> ScarfJointOptions {
        ScarfJointOptions {
            length: 300.0,
            depth_ref_side: 30.0,
            depth_opp_side: 40.0,
            ..ScarfJointOptions::default()
        }
    }

    #[test]
    fn test_end_scarf_planes() {
        let b = beam();
        let shoulder = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let p = ScarfJoint::from_plane(&shoulder, &b, 2, &options(), &Tolerance::DEFAULT).unwrap();
        let s = scarf(&p);
        assert_eq!(s.orientation, Orientation::End);
        assert_abs_diff_eq!(s.start_x, 1500.0, epsilon = 1e-9);

        let g = s.to_geometry(&b, 2).unwrap();
        assert_eq!(g.cuts.len(), 3);
        assert!((g.cuts[0].normal - Vec3::x()).norm() < 1e-12);
        assert_abs_diff_eq!(g.cuts[0].signed_distance(&Point3::new(1500.0, 0.0, 0.0)), 0.0, epsilon = 1e-9);
        // scarf face from (1500, z = 30) to (1800, z = -20), facing up
        let face = &g.cuts[1];
        assert_abs_diff_eq!(face.signed_distance(&Point3::new(1500.0, 10.0, 30.0)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(face.signed_distance(&Point3::new(1800.0, -10.0, -20.0)), 0.0, epsilon = 1e-9);
        assert!(face.normal.z > 0.0 && face.normal.x > 0.0);
        assert!((g.cuts[2].normal - Vec3::x()).norm() < 1e-12);
        assert_abs_diff_eq!(g.cuts[2].signed_distance(&Point3::new(1800.0, 0.0, 0.0)), 0.0, epsilon = 1e-9);
        assert!(g.drill_holes.is_empty());
    }

    #[test]
    fn test_start_scarf_runs_toward_origin() {
        let b = beam();
        let shoulder = Plane::new(Point3::new(500.0, 0.0, 0.0), -Vec3::x());
        let p = ScarfJoint::from_plane(&shoulder, &b, 2, &options(), &Tolerance::DEFAULT).unwrap();
        let s = scarf(&p);
        assert_eq!(s.orientation, Orientation::Start);
        let g = s.to_geometry(&b, 2).unwrap();
        assert!((g.cuts[0].normal + Vec3::x()).norm() < 1e-12);
        assert_abs_diff_eq!(g.cuts[2].signed_distance(&Point3::new(200.0, 0.0, 0.0)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_drill_holes_split_the_scarf() {
        let b = beam();
        let shoulder = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let opts = ScarfJointOptions {
            num_drill_hole: 2,
            drill_hole_diam_1: 16.0,
            drill_hole_diam_2: 12.0,
            ..options()
        };
        let p = ScarfJoint::from_plane(&shoulder, &b, 2, &opts, &Tolerance::DEFAULT).unwrap();
        let g = scarf(&p).to_geometry(&b, 2).unwrap();
        assert_eq!(g.drill_holes.len(), 2);
        assert!((g.drill_holes[0].axis.start - Point3::new(1600.0, 0.0, 60.0)).norm() < 1e-9);
        assert!((g.drill_holes[1].axis.end - Point3::new(1700.0, 0.0, -60.0)).norm() < 1e-9);
        assert_abs_diff_eq!(g.drill_holes[1].diameter, 12.0, epsilon = 1e-12);
        assert_eq!(p.to_parameter_map().get_str("NumDrillHole"), Some("2"));
    }

    #[test]
    fn test_zero_shoulder_drops_a_cut() {
        let b = beam();
        let shoulder = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let opts = ScarfJointOptions {
            depth_ref_side: 0.0,
            ..options()
        };
        let p = ScarfJoint::from_plane(&shoulder, &b, 2, &opts, &Tolerance::DEFAULT).unwrap();
        assert_eq!(scarf(&p).to_geometry(&b, 2).unwrap().cuts.len(), 2);
    }

    #[test]
    fn test_depths_exceeding_blank_are_rejected() {
        let shoulder = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x());
        let opts = ScarfJointOptions {
            depth_ref_side: 60.0,
            depth_opp_side: 60.0,
            ..options()
        };
        let err = ScarfJoint::from_plane(&shoulder, &beam(), 2, &opts, &Tolerance::DEFAULT).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidInput { kind: "ScarfJoint", .. }));
    }

    #[test]
    fn test_skewed_shoulder_is_rejected() {
        let shoulder = Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::new(1.0, 0.2, 0.0));
        let err = ScarfJoint::from_plane(&shoulder, &beam(), 2, &options(), &Tolerance::DEFAULT).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidInput { .. }));
    }

    #[test]
    fn test_hole_count_interval() {
        let mut s = ScarfJoint {
            orientation: Orientation::End,
            start_x: 0.0,
            length: 5000.0,
            depth_ref_side: 0.0,
            depth_opp_side: 0.0,
            num_drill_hole: 2,
            drill_hole_diam_1: 0.0,
            drill_hole_diam_2: 1000.0,
        };
        assert!(s.validate().is_ok());
        s.num_drill_hole = 3;
        assert!(matches!(
            s.validate(),
            Err(ValidationError::OutOfRange { field: "NumDrillHole", .. })
        ));
    }

    #[test]
    fn test_round_trip_both_orientations() {
        let b = beam();
        for (orientation, start_x, ref_side) in [
            (Orientation::End, 1600.0, 2),
            (Orientation::Start, 400.0, 2),
            (Orientation::End, 1250.0, 1),
            (Orientation::Start, 700.0, 3),
        ] {
            let original = ScarfJoint {
                orientation,
                start_x,
                length: 250.0,
                depth_ref_side: 25.0,
                depth_opp_side: 15.0,
                num_drill_hole: 1,
                drill_hole_diam_1: 18.0,
                drill_hole_diam_2: 20.0,
            };
            let g = original.to_geometry(&b, ref_side).unwrap();
            let shoulder = g.cuts[0];
            let opts = ScarfJointOptions {
                length: original.length,
                depth_ref_side: original.depth_ref_side,
                depth_opp_side: original.depth_opp_side,
                num_drill_hole: original.num_drill_hole,
                drill_hole_diam_1: original.drill_hole_diam_1,
                drill_hole_diam_2: original.drill_hole_diam_2,
            };
            let p = ScarfJoint::from_plane(&shoulder, &b, ref_side, &opts, &Tolerance::DEFAULT).unwrap();
            let s = scarf(&p);
            assert_eq!(s.orientation, orientation);
            assert_abs_diff_eq!(s.start_x, start_x, epsilon = 1e-9);
            assert_eq!(p.to_parameter_map(), original.parameter_map(3));

            let again = s.to_geometry(&b, ref_side).unwrap();
            assert_eq!(again.cuts.len(), 3);
            for (x, y) in g.cuts.iter().zip(again.cuts.iter()) {
                assert!(planes_match(x, y));
            }
            assert!((again.drill_holes[0].axis.start - g.drill_holes[0].axis.start).norm() < 1e-9);
        }
    }
}

