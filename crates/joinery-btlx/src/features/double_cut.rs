//! Double cut: two planes meeting in a ridge on the reference side.

use super::common::SideContext;
use crate::orientation::{classify, Orientation, OrientationConvention};
use crate::params::{ParameterMap, ParameterMapBuilder, ANGLE, START_X, START_Y};
use crate::{Processing, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{intersection_line_plane_parameter, intersection_plane_plane, Plane};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Two bevel cuts sharing a point on the reference side.
///
/// The plane normals point toward the part that is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleCut {
    /// End of the blank that is removed.
    pub orientation: Orientation,
    /// Ridge point along the blank.
    pub start_x: f64,
    /// Ridge point across the side.
    pub start_y: f64,
    /// Horizontal angle of the first plane.
    pub angle_1: f64,
    /// Vertical angle of the first plane.
    pub inclination_1: f64,
    /// Horizontal angle of the second plane.
    pub angle_2: f64,
    /// Vertical angle of the second plane.
    pub inclination_2: f64,
}

impl DoubleCut {
    /// BTLx element name.
    pub const NAME: &'static str = "DoubleCut";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "Orientation",
        "StartX",
        "StartY",
        "Angle1",
        "Inclination1",
        "Angle2",
        "Inclination2",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        ANGLE.check("Angle1", self.angle_1)?;
        ANGLE.check("Inclination1", self.inclination_1)?;
        ANGLE.check("Angle2", self.angle_2)?;
        ANGLE.check("Inclination2", self.inclination_2)
    }

    /// Derive the cut from two non-parallel planes, normals toward the kept part.
    pub fn from_planes(planes: &[Plane; 2], beam: &Beam, ref_side: usize) -> Result<Processing> {
        let [first, second] = planes;
        if first.is_parallel_to(second) {
            debug!(kind = Self::NAME, ref_side, "parallel cutting planes");
            return Err(ProcessingError::ParallelPlanes {
                planes: *planes,
                hint: "use a jack rafter cut for a single cutting plane",
            });
        }
        let side = SideContext::new(beam, ref_side)?;
        let orientation = classify(&side.frame, first, OrientationConvention::BehindIsStart);

        let ridge = intersection_plane_plane(first, second).ok_or(ProcessingError::ParallelPlanes {
            planes: *planes,
            hint: "use a jack rafter cut for a single cutting plane",
        })?;
        let t = intersection_line_plane_parameter(&ridge, &side.plane()).ok_or(
            ProcessingError::LinePlaneParallel {
                line: ridge,
                plane: side.plane(),
                context: "double cut ridge",
            },
        )?;
        let (start_x, start_y, _) = side.coordinates(&ridge.point_at(t));

        let toward_removed = |p: &Plane| match orientation {
            Orientation::End => -p.normal,
            Orientation::Start => p.normal,
        };
        let (angle_1, inclination_1) = side.cut_angles(&toward_removed(first));
        let (angle_2, inclination_2) = side.cut_angles(&toward_removed(second));
        debug!(
            kind = Self::NAME,
            ref_side,
            %orientation,
            start_x,
            start_y,
            angle_1,
            inclination_1,
            angle_2,
            inclination_2,
            "derived processing"
        );
        let cut = Self {
            orientation,
            start_x,
            start_y,
            angle_1,
            inclination_1,
            angle_2,
            inclination_2,
        };
        Ok(Processing::new(cut, ref_side)?)
    }

    /// Both cutting planes, normals toward the kept part.
    pub fn to_planes(&self, beam: &Beam, ref_side: usize) -> Result<[Plane; 2]> {
        let side = SideContext::new(beam, ref_side)?;
        let origin = side.point(self.start_x, self.start_y, 0.0);
        let plane = |angle: f64, inclination: f64| {
            let normal = side.cut_direction(angle, inclination);
            match self.orientation {
                Orientation::End => Plane::new(origin, -normal),
                Orientation::Start => Plane::new(origin, normal),
            }
        };
        Ok([
            plane(self.angle_1, self.inclination_1),
            plane(self.angle_2, self.inclination_2),
        ])
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .text("Orientation", self.orientation.as_str())
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("Angle1", self.angle_1)
            .float("Inclination1", self.inclination_1)
            .float("Angle2", self.angle_2)
            .float("Inclination2", self.inclination_2)
            .build()
    }
}
