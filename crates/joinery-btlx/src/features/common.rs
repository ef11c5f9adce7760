//! Geometry shared by the feature derivations.
//!
//! Every feature works in the frame of its reference side: `x` along the
//! blank, `y` across the side, `n` the outward side normal. Depth is measured
//! along `-n`.

use crate::orientation::{classify, Orientation, OrientationConvention};
use crate::{MachiningLimits, ProcessingError, Result};
use joinery_kernel_blank::{Beam, REF_SIDE_COUNT};
use joinery_kernel_geom::{
    intersection_line_plane_parameter, Frame, Hexahedron, Line, PlanarSurface, Plane,
};
use joinery_kernel_math::{angle_vectors, Point3, Tolerance, Vec3};
use tracing::debug;

/// A reference side together with its extents.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SideContext {
    pub index: usize,
    pub frame: Frame,
    pub surface: PlanarSurface,
    /// Extent of the side along its y axis.
    pub face_width: f64,
    /// Blank dimension along the inward normal.
    pub depth: f64,
}

impl SideContext {
    pub fn new(beam: &Beam, index: usize) -> Result<Self> {
        let surface = beam.side_as_surface(index)?;
        let (face_width, depth) = beam.dimensions_relative_to_side(index)?;
        Ok(Self {
            index,
            frame: surface.frame,
            surface,
            face_width,
            depth,
        })
    }

    pub fn x(&self) -> Vec3 {
        self.frame.xaxis
    }

    pub fn y(&self) -> Vec3 {
        self.frame.yaxis
    }

    pub fn n(&self) -> Vec3 {
        self.frame.zaxis
    }

    pub fn plane(&self) -> Plane {
        self.frame.to_plane()
    }

    /// World point from side coordinates `(x, y, depth)`.
    pub fn point(&self, x: f64, y: f64, depth: f64) -> Point3 {
        self.frame.point_at(x, y, -depth)
    }

    /// Side coordinates `(x, y, depth)` of a world point.
    pub fn coordinates(&self, p: &Point3) -> (f64, f64, f64) {
        let l = self.frame.to_local(p);
        (l.x, l.y, -l.z)
    }

    /// Edge of the side at offset `y`, running along x with unit speed.
    pub fn edge(&self, y: f64) -> Line {
        Line::from_point_and_vector(self.point(0.0, y, 0.0), self.x())
    }

    /// Position along x where the edge at `y` meets `plane`.
    pub fn edge_position(&self, y: f64, plane: &Plane, context: &'static str) -> Result<f64> {
        let line = self.edge(y);
        intersection_line_plane_parameter(&line, plane).ok_or(ProcessingError::LinePlaneParallel {
            line,
            plane: *plane,
            context,
        })
    }

    /// Reject points that fall outside the bounded side surface.
    pub fn require_on_surface(&self, p: &Point3, tol: &Tolerance, context: &'static str) -> Result<()> {
        let (u, v, _) = self.coordinates(p);
        if self.surface.contains_uv(u, v, tol) {
            Ok(())
        } else {
            Err(ProcessingError::OutsideSurface {
                ref_side: self.index,
                point: *p,
                context,
            })
        }
    }

    /// Flip a vector so that it does not point against the side's x axis.
    pub fn toward_x(&self, v: &Vec3) -> Vec3 {
        if v.dot(&self.x()) < 0.0 {
            -v
        } else {
            *v
        }
    }

    /// `(angle, inclination)` in degrees of a direction with a non-negative x component.
    ///
    /// `v = sin(i) sin(a) x + sin(i) cos(a) y + cos(i) n`
    pub fn cut_angles(&self, v: &Vec3) -> (f64, f64) {
        let v = v.normalize();
        let angle = v.dot(&self.x()).atan2(v.dot(&self.y())).to_degrees();
        let inclination = angle_vectors(&v, &self.n()).to_degrees();
        (angle, inclination)
    }

    /// Side frame moved to `origin`, turned about `n` by `90 - angle` and then
    /// about its new y axis by `inclination - 90`.
    ///
    /// The x axis of the result is the direction described by
    /// [`SideContext::cut_angles`].
    pub fn cut_frame(&self, origin: Point3, angle: f64, inclination: f64) -> Frame {
        let turned = self
            .frame
            .with_point(origin)
            .rotated(&self.n(), (90.0 - angle).to_radians());
        turned.rotated(&turned.yaxis, (inclination - 90.0).to_radians())
    }

    /// Unit direction for `(angle, inclination)` in degrees.
    pub fn cut_direction(&self, angle: f64, inclination: f64) -> Vec3 {
        self.cut_frame(self.frame.point, angle, inclination).xaxis
    }
}

/// The side whose outward normal lies closest to `normal`.
///
/// Ties go to the lower index.
pub(crate) fn facing_side(beam: &Beam, normal: &Vec3, tol: &Tolerance, kind: &'static str) -> Result<SideContext> {
    let mut best: Option<(f64, SideContext)> = None;
    for index in 0..REF_SIDE_COUNT {
        let side = SideContext::new(beam, index)?;
        let alignment = normal.dot(&side.n());
        if !(alignment > tol.angular) {
            continue;
        }
        if best.as_ref().map_or(true, |(b, _)| alignment > *b + tol.angular) {
            best = Some((alignment, side));
        }
    }
    best.map(|(_, side)| side).ok_or_else(|| {
        debug!(kind, ?normal, "no reference side faces the cut");
        ProcessingError::InvalidInput {
            kind,
            reason: format!("no reference side faces direction {normal:?}"),
        }
    })
}

// =============================================================================
// End cuts
// =============================================================================

/// A planar cut across the blank read in jack rafter terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EndCut {
    pub orientation: Orientation,
    pub start_x: f64,
    pub angle: f64,
    pub inclination: f64,
}

impl EndCut {
    /// Read a plane whose normal points toward the removed end.
    pub fn from_plane(side: &SideContext, plane: &Plane, context: &'static str) -> Result<Self> {
        let orientation = classify(&side.frame, plane, OrientationConvention::BehindIsEnd);
        let start_x = side.edge_position(0.0, plane, context)?;
        let (angle, inclination) = side.cut_angles(&side.toward_x(&plane.normal));
        Ok(Self {
            orientation,
            start_x,
            angle,
            inclination,
        })
    }

    /// Unit normal toward the removed end.
    pub fn normal(&self, side: &SideContext) -> Vec3 {
        side.cut_direction(self.angle, self.inclination) * self.orientation.sign()
    }

    /// The cutting plane through the reference edge.
    pub fn plane(&self, side: &SideContext) -> Plane {
        Plane::new(side.point(self.start_x, 0.0, 0.0), self.normal(side))
    }
}

// =============================================================================
// Section profiles
// =============================================================================

/// A vertical section through a side: `X` along `e_x`, `Z` into the blank.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Section {
    pub origin: Point3,
    pub e_x: Vec3,
    pub e_z: Vec3,
}

impl Section {
    pub fn new(origin: Point3, e_x: Vec3, side_normal: Vec3) -> Self {
        Self {
            origin,
            e_x,
            e_z: -side_normal,
        }
    }

    pub fn point(&self, p: (f64, f64)) -> Point3 {
        self.origin + self.e_x * p.0 + self.e_z * p.1
    }

    pub fn vector(&self, v: (f64, f64)) -> Vec3 {
        self.e_x * v.0 + self.e_z * v.1
    }

    /// Plane through the segment `a -> b`, normal on its right-hand side.
    ///
    /// With `Z` pointing into the blank, the right-hand side of a profile
    /// walked in `+X` direction is the side facing the surface.
    pub fn segment_plane(&self, a: (f64, f64), b: (f64, f64)) -> Result<Plane> {
        let (dx, dz) = (b.0 - a.0, b.1 - a.1);
        if (dx * dx + dz * dz).sqrt() < Tolerance::DEFAULT.linear {
            return Err(ProcessingError::DegenerateGeometry(format!(
                "profile segment ({:.3}, {:.3}) -> ({:.3}, {:.3}) has zero length",
                a.0, a.1, b.0, b.1
            )));
        }
        Ok(Plane::new(self.point(a), self.vector((dz, -dx))))
    }

    /// Planes through consecutive points of a profile.
    pub fn profile_planes(&self, points: &[(f64, f64)]) -> Result<Vec<Plane>> {
        points
            .windows(2)
            .map(|w| self.segment_plane(w[0], w[1]))
            .collect()
    }
}

// =============================================================================
// Volumes
// =============================================================================

/// Corner indices of each hexahedron face, ordered like [`Hexahedron::planes`].
const FACE_CORNERS: [[usize; 4]; 6] = [
    [0, 3, 4, 7],
    [1, 2, 5, 6],
    [0, 1, 4, 5],
    [2, 3, 6, 7],
    [4, 5, 6, 7],
    [0, 1, 2, 3],
];

/// Corners of a volume, or a degeneracy error naming the feature.
pub(crate) fn volume_corners(volume: &Hexahedron, kind: &'static str) -> Result<[Point3; 8]> {
    volume.corners().ok_or_else(|| {
        ProcessingError::DegenerateGeometry(format!(
            "{kind} volume has bounding planes that do not meet in eight corners"
        ))
    })
}

/// A face is limited when its centroid lies strictly inside the blank.
pub(crate) fn machining_limits(
    volume: &Hexahedron,
    beam: &Beam,
    tol: &Tolerance,
    kind: &'static str,
) -> Result<MachiningLimits> {
    let corners = volume_corners(volume, kind)?;
    let flags = FACE_CORNERS.map(|face| {
        let sum = face
            .iter()
            .fold(Vec3::zeros(), |acc, &i| acc + corners[i].coords);
        beam.contains_strictly(&Point3::from(sum / 4.0), tol)
    });
    Ok(MachiningLimits::from_array(flags))
}

/// Move every unlimited face out to the blank boundary along its normal.
pub(crate) fn snap_unlimited(
    volume: &Hexahedron,
    limits: &MachiningLimits,
    beam: &Beam,
) -> Result<Hexahedron> {
    let blank = volume_corners(&beam.as_hexahedron(), "blank")?;
    let mut planes = volume.planes();
    for (plane, limited) in planes.iter_mut().zip(limits.as_array()) {
        if limited {
            continue;
        }
        let support = blank
            .iter()
            .copied()
            .fold(blank[0], |best, c| {
                if plane.normal.dot(&c.coords) > plane.normal.dot(&best.coords) {
                    c
                } else {
                    best
                }
            });
        *plane = Plane::new(support, plane.normal);
    }
    Ok(Hexahedron::from_planes(planes))
}

/// Axis-aligned box in a frame: `x in [x0, x1]`, `y in [y0, y1]`, `z in [z0, z1]`.
///
/// Planes are ordered start/end along x, front/back along y, bottom/top along z.
pub(crate) fn frame_box(frame: &Frame, x: (f64, f64), y: (f64, f64), z: (f64, f64)) -> Hexahedron {
    let (ex, ey, ez) = (frame.xaxis, frame.yaxis, frame.zaxis);
    Hexahedron {
        start: Plane::new(frame.point_at(x.0, 0.0, 0.0), -ex),
        end: Plane::new(frame.point_at(x.1, 0.0, 0.0), ex),
        front: Plane::new(frame.point_at(0.0, y.0, 0.0), -ey),
        back: Plane::new(frame.point_at(0.0, y.1, 0.0), ey),
        top: Plane::new(frame.point_at(0.0, 0.0, z.1), ez),
        bottom: Plane::new(frame.point_at(0.0, 0.0, z.0), -ez),
    }
}

/// Dovetail prism in a frame: length along x, width along y, height along z.
///
/// The half width at `(x, z)` is `width / 2 - x tan(cone) + z tan(flank)`.
pub(crate) fn dovetail_box(
    frame: &Frame,
    length: f64,
    width: f64,
    height: f64,
    cone_angle: f64,
    flank_angle: f64,
) -> Hexahedron {
    let (ex, ey, ez) = (frame.xaxis, frame.yaxis, frame.zaxis);
    let (tc, tf) = (cone_angle.to_radians().tan(), flank_angle.to_radians().tan());
    let half = width * 0.5;
    Hexahedron {
        start: Plane::new(frame.point, -ex),
        end: Plane::new(frame.point_at(length, 0.0, 0.0), ex),
        front: Plane::new(frame.point_at(0.0, -half, 0.0), ex * tc - ey - ez * tf),
        back: Plane::new(frame.point_at(0.0, half, 0.0), ex * tc + ey - ez * tf),
        top: Plane::new(frame.point_at(0.0, 0.0, height), ez),
        bottom: Plane::new(frame.point, -ez),
    }
}

/// Angle in degrees of `v` measured from `from` toward `toward`.
pub(crate) fn planar_angle(v: &Vec3, from: &Vec3, toward: &Vec3) -> f64 {
    v.dot(toward).atan2(v.dot(from)).to_degrees()
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::params::Interval;
    use crate::ValidationError;
    use joinery_kernel_blank::Beam;
    use joinery_kernel_geom::{Line, Plane};
    use joinery_kernel_math::Point3;

    /// Blank along world x: length 2000, width 100 (y), height 120 (z).
    ///
    /// Side 2 is the top face with origin `(0, -50, 60)`, y = +Y, n = +Z.
    /// Side 1 has origin `(0, 50, 60)`, y = -Z, n = +Y.
    pub fn beam() -> Beam {
        let centerline = Line::new(Point3::origin(), Point3::new(2000.0, 0.0, 0.0));
        Beam::from_centerline(&centerline, 100.0, 120.0, None).unwrap()
    }

    pub fn planes_match(a: &Plane, b: &Plane) -> bool {
        (a.normal - b.normal).norm() < 1e-9 && a.signed_distance(&b.point).abs() < 1e-9
    }

    /// Check that `field` accepts both bounds of `interval` and rejects values
    /// just outside them, all other fields of `base` unchanged.
    pub fn assert_closed_bounds<T: Clone>(
        base: &T,
        field: &'static str,
        interval: Interval,
        validate: fn(&T) -> Result<(), ValidationError>,
        set: impl Fn(&mut T, f64),
    ) {
        let with = |value: f64| {
            let mut f = base.clone();
            set(&mut f, value);
            validate(&f)
        };
        for value in [interval.min, interval.max] {
            assert!(with(value).is_ok(), "{field} = {value} rejected");
        }
        for value in [interval.min - 1e-6, interval.max + 1e-6] {
            match with(value) {
                Err(ValidationError::OutOfRange { field: rejected, .. }) => assert_eq!(rejected, field),
                other => panic!("{field} = {value} gave {other:?}"),
            }
        }
    }
}
