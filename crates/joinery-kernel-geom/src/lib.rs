#![warn(missing_docs)]

//! Analytic geometry types for the joinery kernel.
//!
//! Provides the handful of primitives that machining parameter derivations
//! need: orthonormal frames, oriented planes, lines, bounded planar surfaces,
//! hexahedral volumes bounded by six planes, and the intersection routines
//! that relate them.

use joinery_kernel_math::{Dir3, Point3, Tolerance, Transform, Vec3};
use serde::{Deserialize, Serialize};

// =============================================================================
// Frame
// =============================================================================

/// A right-handed orthonormal coordinate frame.
///
/// Parameterization: `P(x, y, z) = point + x * xaxis + y * yaxis + z * zaxis`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Origin of the frame.
    pub point: Point3,
    /// Unit x direction.
    pub xaxis: Vec3,
    /// Unit y direction (orthogonal to `xaxis`).
    pub yaxis: Vec3,
    /// Unit z direction (`xaxis × yaxis`).
    pub zaxis: Vec3,
}

impl Frame {
    /// Create a frame from an origin and two direction vectors.
    ///
    /// The vectors do not need to be normalized or exactly orthogonal: `yaxis`
    /// is re-orthogonalized against `xaxis`.
    pub fn new(point: Point3, xaxis: Vec3, yaxis: Vec3) -> Self {
        let x = xaxis.normalize();
        let y = (yaxis - x * yaxis.dot(&x)).normalize();
        let z = x.cross(&y);
        Self {
            point,
            xaxis: x,
            yaxis: y,
            zaxis: z,
        }
    }

    /// The world XY frame at the origin.
    pub fn world_xy() -> Self {
        Self::new(Point3::origin(), Vec3::x(), Vec3::y())
    }

    /// Create a frame on a plane. X/Y directions are chosen arbitrarily.
    pub fn from_plane(plane: &Plane) -> Self {
        let n = plane.normal;
        // Pick an arbitrary perpendicular vector
        let arbitrary = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        let x = arbitrary.cross(&n).normalize();
        let y = n.cross(&x);
        Self {
            point: plane.point,
            xaxis: x,
            yaxis: y,
            zaxis: n,
        }
    }

    /// The frame's z axis, i.e. the normal of its XY plane.
    pub fn normal(&self) -> Vec3 {
        self.zaxis
    }

    /// Evaluate local coordinates to a world point.
    pub fn point_at(&self, x: f64, y: f64, z: f64) -> Point3 {
        self.point + x * self.xaxis + y * self.yaxis + z * self.zaxis
    }

    /// Express a world point in local coordinates.
    pub fn to_local(&self, p: &Point3) -> Vec3 {
        let d = p - self.point;
        Vec3::new(d.dot(&self.xaxis), d.dot(&self.yaxis), d.dot(&self.zaxis))
    }

    /// Express a world vector in local coordinates.
    pub fn vector_to_local(&self, v: &Vec3) -> Vec3 {
        Vec3::new(v.dot(&self.xaxis), v.dot(&self.yaxis), v.dot(&self.zaxis))
    }

    /// The XY plane of this frame.
    pub fn to_plane(&self) -> Plane {
        Plane::new(self.point, self.zaxis)
    }

    /// Move the origin to a new point, keeping the axes.
    pub fn with_point(&self, point: Point3) -> Self {
        Self { point, ..*self }
    }

    /// Rotate the frame about an axis through its own origin.
    pub fn rotated(&self, axis: &Vec3, angle: f64) -> Self {
        let t = Transform::rotation_about_axis_at(&Dir3::new_normalize(*axis), angle, &self.point);
        self.transformed(&t)
    }

    /// Apply a rigid transform.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self::new(
            t.apply_point(&self.point),
            t.apply_vec(&self.xaxis),
            t.apply_vec(&self.yaxis),
        )
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::world_xy()
    }
}

// =============================================================================
// Plane
// =============================================================================

/// An infinite oriented plane defined by a point and a unit normal.
///
/// Points with a negative signed distance lie "behind" the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3,
    /// Unit normal.
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane from a point and a (not necessarily unit) normal.
    pub fn new(point: Point3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// The XY plane of a frame.
    pub fn from_frame(frame: &Frame) -> Self {
        frame.to_plane()
    }

    /// Plane through three points, normal `(b - a) × (c - a)`.
    ///
    /// Returns `None` for collinear points.
    pub fn from_three_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        if n.norm() < Tolerance::DEFAULT.linear {
            return None;
        }
        Some(Self::new(*a, n))
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.point).dot(&self.normal)
    }

    /// Whether a point lies strictly behind the plane.
    pub fn is_point_behind(&self, p: &Point3) -> bool {
        self.signed_distance(p) < 0.0
    }

    /// The same plane with the normal reversed.
    pub fn flipped(&self) -> Self {
        Self {
            point: self.point,
            normal: -self.normal,
        }
    }

    /// Whether two planes are parallel (either orientation).
    pub fn is_parallel_to(&self, other: &Plane) -> bool {
        Tolerance::DEFAULT.vectors_parallel(&self.normal, &other.normal)
    }
}

impl From<Frame> for Plane {
    fn from(frame: Frame) -> Self {
        frame.to_plane()
    }
}

impl From<&Frame> for Plane {
    fn from(frame: &Frame) -> Self {
        frame.to_plane()
    }
}

// =============================================================================
// Line
// =============================================================================

/// A line segment between two points.
///
/// Intersection routines treat it as the infinite line through both points.
/// Parameterization: `P(t) = start + t * (end - start)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point.
    pub start: Point3,
    /// End point.
    pub end: Point3,
}

impl Line {
    /// Create a line from two endpoints.
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Create a line from a start point and a vector to the end point.
    pub fn from_point_and_vector(start: Point3, vector: Vec3) -> Self {
        Self {
            start,
            end: start + vector,
        }
    }

    /// Vector from start to end.
    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    /// Unit direction from start to end.
    pub fn direction(&self) -> Vec3 {
        self.vector().normalize()
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Evaluate the line at parameter `t`.
    pub fn point_at(&self, t: f64) -> Point3 {
        self.start + t * self.vector()
    }

    /// The same segment traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }
}

// =============================================================================
// Intersections
// =============================================================================

/// Parameter `t` at which the infinite line meets the plane.
///
/// Returns `None` if the line is parallel to the plane.
pub fn intersection_line_plane_parameter(line: &Line, plane: &Plane) -> Option<f64> {
    let v = line.vector();
    let denom = plane.normal.dot(&v);
    if denom.abs() < Tolerance::DEFAULT.angular * v.norm().max(1.0) {
        return None;
    }
    Some(plane.normal.dot(&(plane.point - line.start)) / denom)
}

/// Point where the infinite line meets the plane.
pub fn intersection_line_plane(line: &Line, plane: &Plane) -> Option<Point3> {
    intersection_line_plane_parameter(line, plane).map(|t| line.point_at(t))
}

/// Intersection line of two planes, directed along `a.normal × b.normal`.
///
/// The returned line has unit length. Returns `None` for parallel planes.
pub fn intersection_plane_plane(a: &Plane, b: &Plane) -> Option<Line> {
    let dir = a.normal.cross(&b.normal);
    let len2 = dir.norm_squared();
    if len2.sqrt() < Tolerance::DEFAULT.angular {
        return None;
    }
    let da = a.normal.dot(&a.point.coords);
    let db = b.normal.dot(&b.point.coords);
    let p = (da * b.normal - db * a.normal).cross(&dir) / len2;
    let p = Point3::from(p);
    Some(Line::from_point_and_vector(p, dir / len2.sqrt()))
}

/// Common point of three planes.
///
/// Returns `None` when the planes do not meet in a single point.
pub fn intersection_plane_plane_plane(a: &Plane, b: &Plane, c: &Plane) -> Option<Point3> {
    let bc = b.normal.cross(&c.normal);
    let det = a.normal.dot(&bc);
    if det.abs() < Tolerance::DEFAULT.angular {
        return None;
    }
    let da = a.normal.dot(&a.point.coords);
    let db = b.normal.dot(&b.point.coords);
    let dc = c.normal.dot(&c.point.coords);
    let ca = c.normal.cross(&a.normal);
    let ab = a.normal.cross(&b.normal);
    Some(Point3::from((da * bc + db * ca + dc * ab) / det))
}

/// Intersection of two coplanar lines given as point + direction.
///
/// Returns the point on the first line closest to the second one, or `None`
/// when the directions are parallel.
pub fn intersection_lines(p1: &Point3, d1: &Vec3, p2: &Point3, d2: &Vec3) -> Option<Point3> {
    let cross = d1.cross(d2);
    let denom = cross.norm_squared();
    if denom.sqrt() < Tolerance::DEFAULT.angular * d1.norm() * d2.norm() {
        return None;
    }
    let s = (p2 - p1).cross(d2).dot(&cross) / denom;
    Some(p1 + s * d1)
}

// =============================================================================
// PlanarSurface
// =============================================================================

/// A bounded rectangular patch on a frame's XY plane.
///
/// The patch spans `[0, xsize] × [0, ysize]` in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarSurface {
    /// Frame at the patch corner.
    pub frame: Frame,
    /// Extent along the frame's x axis.
    pub xsize: f64,
    /// Extent along the frame's y axis.
    pub ysize: f64,
}

impl PlanarSurface {
    /// Create a bounded planar surface.
    pub fn new(frame: Frame, xsize: f64, ysize: f64) -> Self {
        Self {
            frame,
            xsize,
            ysize,
        }
    }

    /// Evaluate the patch at 2-D parameters.
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.frame.point_at(u, v, 0.0)
    }

    /// Whether the 2-D parameters lie on the patch (bounds included).
    pub fn contains_uv(&self, u: f64, v: f64, tol: &Tolerance) -> bool {
        u >= -tol.linear
            && u <= self.xsize + tol.linear
            && v >= -tol.linear
            && v <= self.ysize + tol.linear
    }

    /// The unbounded supporting plane.
    pub fn to_plane(&self) -> Plane {
        self.frame.to_plane()
    }
}

// =============================================================================
// Hexahedron
// =============================================================================

/// A convex six-sided volume bounded by planes with outward normals.
///
/// Corner layout (`s`/`e` = start/end, `f`/`b` = front/back, `t`/`b` = top/bottom):
/// ```text
///     c4----c5        top
///    /|    /|
///   c7----c6|
///   | c0--|-c1        bottom
///   |/    |/
///   c3----c2
/// ```
/// `c0 = start∩front∩bottom`, `c1 = end∩front∩bottom`, `c2 = end∩back∩bottom`,
/// `c3 = start∩back∩bottom`, `c4..c7` likewise on the top plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hexahedron {
    /// Plane bounding the volume at its start.
    pub start: Plane,
    /// Plane bounding the volume at its end.
    pub end: Plane,
    /// Front plane.
    pub front: Plane,
    /// Back plane.
    pub back: Plane,
    /// Top plane.
    pub top: Plane,
    /// Bottom plane.
    pub bottom: Plane,
}

impl Hexahedron {
    /// Labels of the bounding planes, in the order returned by [`Hexahedron::planes`].
    pub const FACE_LABELS: [&'static str; 6] = ["start", "end", "front", "back", "top", "bottom"];

    /// The six bounding planes in fixed order.
    pub fn planes(&self) -> [Plane; 6] {
        [
            self.start,
            self.end,
            self.front,
            self.back,
            self.top,
            self.bottom,
        ]
    }

    /// Build from six planes ordered like [`Hexahedron::planes`].
    pub fn from_planes(planes: [Plane; 6]) -> Self {
        let [start, end, front, back, top, bottom] = planes;
        Self {
            start,
            end,
            front,
            back,
            top,
            bottom,
        }
    }

    /// The eight corners, or `None` if some plane triple does not meet in a point.
    pub fn corners(&self) -> Option<[Point3; 8]> {
        let corner = |a: &Plane, b: &Plane, c: &Plane| intersection_plane_plane_plane(a, b, c);
        Some([
            corner(&self.start, &self.front, &self.bottom)?,
            corner(&self.end, &self.front, &self.bottom)?,
            corner(&self.end, &self.back, &self.bottom)?,
            corner(&self.start, &self.back, &self.bottom)?,
            corner(&self.start, &self.front, &self.top)?,
            corner(&self.end, &self.front, &self.top)?,
            corner(&self.end, &self.back, &self.top)?,
            corner(&self.start, &self.back, &self.top)?,
        ])
    }

    /// Whether a point lies inside or on the boundary of the volume.
    pub fn contains(&self, p: &Point3, tol: &Tolerance) -> bool {
        self.planes()
            .iter()
            .all(|plane| plane.signed_distance(p) <= tol.linear)
    }
}
