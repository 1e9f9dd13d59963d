//! Closed-form evaluation of a single cubic Bezier segment.
//!
//! A curve segment is defined by its start anchor `p0`, the outgoing handle
//! `p1`, the incoming handle `p2` and the end anchor `p3`. Frames are built by
//! a look rotation whose forward axis is the tangent and whose up axis is the
//! normal derived from an externally supplied `up` vector, so callers control
//! twisting along the segment.

use serde::{Deserialize, Serialize};

use super::core::{Point3, Quat, Tolerance, Vec3};
use super::frame::OrientedFrame;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let u2 = u * u;
        let t2 = t * t;
        point_weighted_sum4(
            self.p0,
            u2 * u,
            self.p1,
            3.0 * u2 * t,
            self.p2,
            3.0 * u * t2,
            self.p3,
            t2 * t,
        )
    }

    #[must_use]
    pub fn derivative_at(&self, t: f64) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let a = self.p1 - self.p0;
        let b = self.p2 - self.p1;
        let c = self.p3 - self.p2;
        a * (3.0 * u * u) + b * (6.0 * u * t) + c * (3.0 * t * t)
    }

    /// Unit tangent at `t`.
    ///
    /// Where the derivative vanishes (a handle sitting on its anchor) the
    /// direction of the control polygon is used instead. `None` only when all
    /// four points coincide.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Option<Vec3> {
        if let Some(tangent) = self.derivative_at(t).normalized() {
            return Some(tangent);
        }

        let t = t.clamp(0.0, 1.0);
        let candidates = if t < 0.5 {
            [self.p1 - self.p0, self.p2 - self.p0, self.p3 - self.p0]
        } else {
            [self.p3 - self.p2, self.p3 - self.p1, self.p3 - self.p0]
        };
        candidates.into_iter().find_map(Vec3::normalized)
    }

    /// Curve normal at `t` relative to `up`. Falls back to `up` itself when the
    /// tangent is undefined or parallel to `up`.
    #[must_use]
    pub fn normal_at(&self, t: f64, up: Vec3) -> Vec3 {
        let fallback = up.normalized().unwrap_or(Vec3::Y);
        let Some(tangent) = self.tangent_at(t) else {
            return fallback;
        };
        match up.cross(tangent).normalized() {
            Some(binormal) => tangent.cross(binormal),
            None => tangent.any_orthogonal(),
        }
    }

    #[must_use]
    pub fn orientation_at(&self, t: f64, up: Vec3) -> Quat {
        let normal = self.normal_at(t, up);
        match self.tangent_at(t) {
            Some(tangent) => Quat::look_rotation(tangent, normal).unwrap_or(Quat::IDENTITY),
            None => up_only_rotation(up),
        }
    }

    #[must_use]
    pub fn frame_at(&self, t: f64, up: Vec3) -> OrientedFrame {
        OrientedFrame::new(self.point_at(t), self.orientation_at(t, up))
    }

    /// Length of the control polygon, an upper bound of the arc length.
    #[must_use]
    pub fn hull_length(&self) -> f64 {
        self.p0.distance_to(self.p1) + self.p1.distance_to(self.p2) + self.p2.distance_to(self.p3)
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.hull_length() <= Tolerance::ZERO_LENGTH.eps
    }
}

/// Rotation for a segment without a direction: keep `up`, pick any forward.
fn up_only_rotation(up: Vec3) -> Quat {
    let Some(up) = up.normalized() else {
        return Quat::IDENTITY;
    };
    let forward = up.any_orthogonal();
    Quat::look_rotation(forward, up).unwrap_or(Quat::IDENTITY)
}

#[allow(clippy::too_many_arguments)]
fn point_weighted_sum4(
    p0: Point3,
    w0: f64,
    p1: Point3,
    w1: f64,
    p2: Point3,
    w2: f64,
    p3: Point3,
    w3: f64,
) -> Point3 {
    Point3::new(
        p0.x * w0 + p1.x * w1 + p2.x * w2 + p3.x * w3,
        p0.y * w0 + p1.y * w1 + p2.y * w2 + p3.y * w3,
        p0.z * w0 + p1.z * w1 + p2.z * w2 + p3.z * w3,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> CubicBezier3 {
        CubicBezier3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 3.0),
        )
    }

    #[test]
    fn test_endpoints_and_midpoint() {
        let seg = straight();
        assert_eq!(seg.point_at(0.0), seg.p0);
        assert_eq!(seg.point_at(1.0), seg.p3);
        assert!(Tolerance::LOOSE.approx_eq_point3(seg.point_at(0.5), Point3::new(0.0, 0.0, 1.5)));
    }

    #[test]
    fn test_frame_faces_tangent_with_up() {
        let frame = straight().frame_at(0.25, Vec3::Y);
        assert!(Tolerance::LOOSE.approx_eq_vec3(frame.forward(), Vec3::Z));
        assert!(Tolerance::LOOSE.approx_eq_vec3(frame.up(), Vec3::Y));
    }

    #[test]
    fn test_collapsed_handle_uses_polygon_direction() {
        let seg = CubicBezier3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        let tangent = seg.tangent_at(0.0).unwrap();
        assert!(Tolerance::LOOSE.approx_eq_vec3(tangent, Vec3::X));
    }

    #[test]
    fn test_degenerate_segment_never_yields_nan() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let seg = CubicBezier3::new(p, p, p, p);
        assert!(seg.is_degenerate());
        assert!(seg.tangent_at(0.5).is_none());

        let frame = seg.frame_at(0.5, Vec3::Y);
        assert!(frame.is_finite());
        assert!(Tolerance::LOOSE.approx_eq_vec3(frame.up(), Vec3::Y));

        let frame = seg.frame_at(0.5, Vec3::ZERO);
        assert_eq!(frame.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_tangent_parallel_to_up_still_orthonormal() {
        let seg = CubicBezier3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        );
        let frame = seg.frame_at(0.5, Vec3::Y);
        assert!(frame.is_finite());
        assert!(Tolerance::LOOSE.approx_eq_vec3(frame.forward(), Vec3::Y));
        assert!(frame.up().dot(Vec3::Y).abs() < 1e-9);
    }
}
