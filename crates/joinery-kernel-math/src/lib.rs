#![warn(missing_docs)]

//! Math types for the joinery machining kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for timber machining geometry: points, vectors, directions, transforms,
//! angle routines and tolerance constants.

use nalgebra::{Matrix4, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Rotation about an arbitrary axis through the origin by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula. Positive angles rotate
    /// counter-clockwise when looking against the axis.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.as_ref().x, axis.as_ref().y, axis.as_ref().z);
        let mut m = Matrix4::identity();
        m[(0, 0)] = t * x * x + c;
        m[(0, 1)] = t * x * y - s * z;
        m[(0, 2)] = t * x * z + s * y;
        m[(1, 0)] = t * x * y + s * z;
        m[(1, 1)] = t * y * y + c;
        m[(1, 2)] = t * y * z - s * x;
        m[(2, 0)] = t * x * z - s * y;
        m[(2, 1)] = t * y * z + s * x;
        m[(2, 2)] = t * z * z + c;
        Self { matrix: m }
    }

    /// Rotation about an axis passing through `point`.
    pub fn rotation_about_axis_at(axis: &Dir3, angle: f64, point: &Point3) -> Self {
        let to_origin = Self::translation(-point.x, -point.y, -point.z);
        let back = Self::translation(point.x, point.y, point.z);
        back.then(&Self::rotation_about_axis(axis, angle))
            .then(&to_origin)
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// The resulting transform applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default machining tolerances (1e-6 mm linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two vectors are parallel or anti-parallel.
    ///
    /// Zero-length vectors are treated as parallel to everything.
    pub fn vectors_parallel(&self, a: &Vec3, b: &Vec3) -> bool {
        let (na, nb) = (a.norm(), b.norm());
        if na < self.linear || nb < self.linear {
            return true;
        }
        a.cross(b).norm() / (na * nb) < self.angular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Angles
// =============================================================================

/// Unsigned angle between two vectors in radians, in `[0, PI]`.
///
/// Uses `atan2(|u x v|, u . v)`, which stays accurate near 0 and PI.
pub fn angle_vectors(u: &Vec3, v: &Vec3) -> f64 {
    u.cross(v).norm().atan2(u.dot(v))
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result.x - 11.0).abs() < 1e-12);
        assert!((result.y - 22.0).abs() < 1e-12);
        assert!((result.z - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_translation_ignored_for_vectors() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let v = t.apply_vec(&Vec3::new(1.0, 0.0, 0.0));
        assert!((v - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_about_axis() {
        // Rotate (1,0,0) by 90° about Z axis → (0,1,0)
        let axis = Dir3::new_normalize(Vec3::z());
        let t = Transform::rotation_about_axis(&axis, PI / 2.0);
        let p = Point3::new(1.0, 0.0, 0.0);
        let result = t.apply_point(&p);
        assert!(result.x.abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
        assert!(result.z.abs() < 1e-12);

        // Rotate about (1,1,0) normalized by 180° swaps x and y
        let axis2 = Dir3::new_normalize(Vec3::new(1.0, 1.0, 0.0));
        let t2 = Transform::rotation_about_axis(&axis2, PI);
        let r2 = t2.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(r2.x.abs() < 1e-12);
        assert!((r2.y - 1.0).abs() < 1e-12);
        assert!(r2.z.abs() < 1e-12);
    }

    #[test]
    fn test_rotation_about_axis_at_point() {
        let axis = Dir3::new_normalize(Vec3::z());
        let center = Point3::new(10.0, 0.0, 0.0);
        let t = Transform::rotation_about_axis_at(&axis, FRAC_PI_2, &center);
        let r = t.apply_point(&Point3::new(11.0, 0.0, 5.0));
        assert_abs_diff_eq!(r.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.z, 5.0, epsilon = 1e-12);
        // the pivot stays fixed
        assert!((t.apply_point(&center) - center).norm() < 1e-12);
    }

    #[test]
    fn test_vectors_parallel() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.vectors_parallel(&Vec3::x(), &(-3.0 * Vec3::x())));
        assert!(!tol.vectors_parallel(&Vec3::x(), &Vec3::new(1.0, 0.01, 0.0)));
    }

    #[test]
    fn test_angle_vectors() {
        assert_abs_diff_eq!(angle_vectors(&Vec3::x(), &Vec3::y()), FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_vectors(&Vec3::x(), &-Vec3::x()), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_vectors(&Vec3::x(), &(2.0 * Vec3::x())), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_abs_diff_eq!(normalize_degrees(-90.0), 270.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(450.0), 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(0.0), 0.0, epsilon = 1e-12);
    }
}
