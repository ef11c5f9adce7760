#![warn(missing_docs)]

//! Rectangular timber blanks and their reference sides.
//!
//! A [`Beam`] is the rectangular blank every machining feature is expressed
//! against. It exposes six numbered reference sides: the four long faces
//! (0-3) wrap around the beam axis, and 4-5 are the start and end faces.
//! Each side yields a frame whose x axis runs along the blank, whose normal
//! points out of the material, and whose origin sits on a known corner.
//!
//! ```text
//!        side 2 (+z)
//!      +-----------+
//!      |           |
//! side 3    axis    side 1      side 4 at x = 0, side 5 at x = length
//! (-y) |     +     | (+y)
//!      +-----------+
//!        side 0 (-z)
//! ```

use joinery_kernel_geom::{Frame, Hexahedron, Line, PlanarSurface, Plane};
use joinery_kernel_math::{Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of reference sides of a blank.
pub const REF_SIDE_COUNT: usize = 6;

/// Errors from blank construction and reference-side queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlankError {
    /// Reference side index outside `0..6`.
    #[error("invalid reference side index {0} (expected 0..=5)")]
    InvalidRefSide(usize),

    /// Zero, negative or non-finite blank dimensions.
    #[error("invalid blank dimensions: length={length}, width={width}, height={height}")]
    InvalidDimensions {
        /// Blank length.
        length: f64,
        /// Cross-section width.
        width: f64,
        /// Cross-section height.
        height: f64,
    },

    /// Centerline of zero length.
    #[error("centerline has zero length")]
    DegenerateCenterline,
}

/// A rectangular beam blank.
///
/// `frame` sits at the start of the centerline: x along the centerline,
/// y across the width, z across the height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    /// Centerline frame at the start of the blank.
    pub frame: Frame,
    /// Blank length along the frame's x axis.
    pub length: f64,
    /// Cross-section size along the frame's y axis.
    pub width: f64,
    /// Cross-section size along the frame's z axis.
    pub height: f64,
}

impl Beam {
    /// Create a blank from its centerline frame and dimensions.
    pub fn new(frame: Frame, length: f64, width: f64, height: f64) -> Result<Self, BlankError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !(valid(length) && valid(width) && valid(height)) {
            return Err(BlankError::InvalidDimensions {
                length,
                width,
                height,
            });
        }
        Ok(Self {
            frame,
            length,
            width,
            height,
        })
    }

    /// Create a blank along a centerline.
    ///
    /// `z_vector` orients the height direction (world z if `None`). When it is
    /// parallel to the centerline, world x is used instead.
    pub fn from_centerline(
        centerline: &Line,
        width: f64,
        height: f64,
        z_vector: Option<Vec3>,
    ) -> Result<Self, BlankError> {
        let length = centerline.length();
        if length < Tolerance::DEFAULT.linear {
            return Err(BlankError::DegenerateCenterline);
        }
        let x = centerline.direction();
        let mut z = z_vector.unwrap_or_else(Vec3::z);
        if Tolerance::DEFAULT.vectors_parallel(&x, &z) {
            z = Vec3::x();
        }
        let y = z.cross(&x);
        Self::new(Frame::new(centerline.start, x, y), length, width, height)
    }

    /// The centerline from start to end of the blank.
    pub fn centerline(&self) -> Line {
        Line::from_point_and_vector(self.frame.point, self.frame.xaxis * self.length)
    }

    /// Reference frame for machining: origin on the corner shared by sides 0, 1 and 4.
    pub fn ref_frame(&self) -> Frame {
        let f = &self.frame;
        let point = f.point + f.yaxis * (self.width * 0.5) - f.zaxis * (self.height * 0.5);
        Frame::new(point, f.xaxis, f.zaxis)
    }

    /// All six reference side frames, normals pointing out of the blank.
    pub fn ref_sides(&self) -> [Frame; REF_SIDE_COUNT] {
        let r = self.ref_frame();
        let (x, y, z) = (r.xaxis, r.yaxis, r.zaxis);
        let (w, h, l) = (self.width, self.height, self.length);
        [
            Frame::new(r.point, x, z),
            Frame::new(r.point + y * h, x, -y),
            Frame::new(r.point + y * h + z * w, x, -z),
            Frame::new(r.point + z * w, x, y),
            Frame::new(r.point, z, y),
            Frame::new(r.point + x * l + y * h, z, -y),
        ]
    }

    /// A single reference side frame.
    pub fn ref_side(&self, index: usize) -> Result<Frame, BlankError> {
        check_ref_side(index)?;
        Ok(self.ref_sides()[index])
    }

    /// Reference side as a bounded surface with its parametric extents.
    pub fn side_as_surface(&self, index: usize) -> Result<PlanarSurface, BlankError> {
        let frame = self.ref_side(index)?;
        let (xsize, ysize) = match index {
            0 | 2 => (self.length, self.width),
            1 | 3 => (self.length, self.height),
            _ => (self.width, self.height),
        };
        Ok(PlanarSurface::new(frame, xsize, ysize))
    }

    /// `(face width, depth)` of a reference side.
    ///
    /// The face width is the side's extent along its y axis, the depth is the
    /// blank dimension measured along the side's inward normal.
    pub fn dimensions_relative_to_side(&self, index: usize) -> Result<(f64, f64), BlankError> {
        check_ref_side(index)?;
        Ok(match index {
            0 | 2 => (self.width, self.height),
            1 | 3 => (self.height, self.width),
            _ => (self.height, self.length),
        })
    }

    /// Coordinates of a point relative to the centerline frame.
    pub fn to_local(&self, p: &Point3) -> Vec3 {
        self.frame.to_local(p)
    }

    /// Whether a point lies inside the blank (boundary included).
    pub fn contains(&self, p: &Point3, tol: &Tolerance) -> bool {
        let l = self.to_local(p);
        l.x >= -tol.linear
            && l.x <= self.length + tol.linear
            && l.y.abs() <= self.width * 0.5 + tol.linear
            && l.z.abs() <= self.height * 0.5 + tol.linear
    }

    /// Whether a point lies strictly inside the blank.
    pub fn contains_strictly(&self, p: &Point3, tol: &Tolerance) -> bool {
        let l = self.to_local(p);
        l.x > tol.linear
            && l.x < self.length - tol.linear
            && l.y.abs() < self.width * 0.5 - tol.linear
            && l.z.abs() < self.height * 0.5 - tol.linear
    }

    /// Distance along a ray from `origin` until it leaves the blank.
    ///
    /// Uses the slab method in the centerline frame. Returns `None` if the ray
    /// misses the blank or the blank lies behind the origin.
    pub fn ray_exit_distance(&self, origin: &Point3, direction: &Vec3) -> Option<f64> {
        let o = self.to_local(origin);
        let d = self.frame.vector_to_local(&direction.normalize());
        let bounds = [
            (0.0, self.length),
            (-self.width * 0.5, self.width * 0.5),
            (-self.height * 0.5, self.height * 0.5),
        ];
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for (axis, (lo, hi)) in bounds.iter().enumerate() {
            let (oi, di) = (o[axis], d[axis]);
            if di.abs() < 1e-15 {
                if oi < lo - Tolerance::DEFAULT.linear || oi > hi + Tolerance::DEFAULT.linear {
                    return None;
                }
                continue;
            }
            let (t1, t2) = ((lo - oi) / di, (hi - oi) / di);
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }
        if t_max < t_min || t_max < 0.0 {
            return None;
        }
        Some(t_max)
    }

    /// The blank's bounding planes as a hexahedron (normals outward).
    pub fn as_hexahedron(&self) -> Hexahedron {
        let sides = self.ref_sides();
        let plane = |i: usize| Plane::new(sides[i].point, sides[i].zaxis);
        Hexahedron {
            start: plane(4),
            end: plane(5),
            front: plane(1),
            back: plane(3),
            top: plane(2),
            bottom: plane(0),
        }
    }
}

fn check_ref_side(index: usize) -> Result<(), BlankError> {
    if index >= REF_SIDE_COUNT {
        return Err(BlankError::InvalidRefSide(index));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn beam() -> Beam {
        let centerline = Line::new(Point3::origin(), Point3::new(1000.0, 0.0, 0.0));
        Beam::from_centerline(&centerline, 60.0, 120.0, None).unwrap()
    }

    #[test]
    fn test_from_centerline_axes() {
        let b = beam();
        assert!((b.frame.xaxis - Vec3::x()).norm() < 1e-12);
        assert!((b.frame.yaxis - Vec3::y()).norm() < 1e-12);
        assert!((b.frame.zaxis - Vec3::z()).norm() < 1e-12);
        assert_abs_diff_eq!(b.length, 1000.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_centerline_falls_back() {
        let centerline = Line::new(Point3::origin(), Point3::new(0.0, 0.0, 500.0));
        let b = Beam::from_centerline(&centerline, 60.0, 120.0, None).unwrap();
        assert!((b.frame.xaxis - Vec3::z()).norm() < 1e-12);
        assert_abs_diff_eq!(b.frame.yaxis.dot(&b.frame.xaxis), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Beam::new(Frame::world_xy(), 100.0, 0.0, 10.0),
            Err(BlankError::InvalidDimensions { .. })
        ));
        let zero = Line::new(Point3::origin(), Point3::origin());
        assert_eq!(
            Beam::from_centerline(&zero, 1.0, 1.0, None),
            Err(BlankError::DegenerateCenterline)
        );
    }

    #[test]
    fn test_ref_side_normals_point_outward() {
        let b = beam();
        let center = b.frame.point_at(b.length * 0.5, 0.0, 0.0);
        for (i, side) in b.ref_sides().iter().enumerate() {
            let to_center = center - side.point;
            assert!(to_center.dot(&side.zaxis) < 0.0, "side {i} normal points inward");
        }
    }

    #[test]
    fn test_ref_side_normals() {
        let b = beam();
        let sides = b.ref_sides();
        assert!((sides[0].zaxis + Vec3::z()).norm() < 1e-12);
        assert!((sides[1].zaxis - Vec3::y()).norm() < 1e-12);
        assert!((sides[2].zaxis - Vec3::z()).norm() < 1e-12);
        assert!((sides[3].zaxis + Vec3::y()).norm() < 1e-12);
        assert!((sides[4].zaxis + Vec3::x()).norm() < 1e-12);
        assert!((sides[5].zaxis - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_long_sides_mutually_perpendicular() {
        let sides = beam().ref_sides();
        for i in 0..4 {
            let next = &sides[(i + 1) % 4];
            assert_abs_diff_eq!(sides[i].zaxis.dot(&next.zaxis), 0.0, epsilon = 1e-12);
            assert!((sides[i].xaxis - Vec3::x()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_side_surfaces_stay_on_blank() {
        let b = beam();
        for i in 0..REF_SIDE_COUNT {
            let s = b.side_as_surface(i).unwrap();
            for (u, v) in [(0.0, 0.0), (s.xsize, 0.0), (0.0, s.ysize), (s.xsize, s.ysize)] {
                let p = s.point_at(u, v);
                assert!(b.contains(&p, &Tolerance::DEFAULT), "side {i} corner ({u}, {v}) off blank");
            }
        }
    }

    #[test]
    fn test_dimensions_relative_to_side() {
        let b = beam();
        assert_eq!(b.dimensions_relative_to_side(0).unwrap(), (60.0, 120.0));
        assert_eq!(b.dimensions_relative_to_side(1).unwrap(), (120.0, 60.0));
        assert_eq!(b.dimensions_relative_to_side(6), Err(BlankError::InvalidRefSide(6)));
    }

    #[test]
    fn test_ray_exit_distance() {
        let b = beam();
        let origin = Point3::new(100.0, 0.0, -60.0);
        let t = b.ray_exit_distance(&origin, &Vec3::z()).unwrap();
        assert_abs_diff_eq!(t, 120.0, epsilon = 1e-9);
        let miss = Point3::new(100.0, 500.0, -60.0);
        assert!(b.ray_exit_distance(&miss, &Vec3::z()).is_none());
    }

    #[test]
    fn test_as_hexahedron_corners() {
        let b = beam();
        let corners = b.as_hexahedron().corners().unwrap();
        for c in corners.iter() {
            let l = b.to_local(c);
            assert_abs_diff_eq!(l.y.abs(), 30.0, epsilon = 1e-9);
            assert_abs_diff_eq!(l.z.abs(), 60.0, epsilon = 1e-9);
        }
    }
}
