use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Vec2
// ─────────────────────────────────────────────────────────────────────────────

/// Two-component vector used for profile coordinates, offsets and scales.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Component-wise product.
    #[must_use]
    pub fn scale(self, by: Self) -> Self {
        Self::new(self.x * by.x, self.y * by.y)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(self.x + (rhs.x - self.x) * t, self.y + (rhs.y - self.y) * t)
    }

    /// Lifts the vector into the XY plane of a 3D frame.
    #[must_use]
    pub const fn extend(self, z: f64) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(arr: [f64; 2]) -> Self {
        Self::new(arr[0], arr[1])
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Right.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Up.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Forward.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len.is_finite() && len > Tolerance::ZERO_LENGTH.eps {
            Some(Self::new(self.x / len, self.y / len, self.z / len))
        } else {
            None
        }
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    /// Drops the Z component.
    #[must_use]
    pub const fn truncate(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Any unit vector perpendicular to `self`.
    #[must_use]
    pub fn any_orthogonal(self) -> Self {
        let reference = if self.y.abs() < 0.9 { Self::Y } else { Self::X };
        self.cross(reference).normalized().unwrap_or(Self::X)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        rhs * self
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Position vector from the origin.
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.to_vec3().is_finite()
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        p.to_array()
    }
}

impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Self;
    fn sub(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quat
// ─────────────────────────────────────────────────────────────────────────────

/// Unit quaternion rotation. Axis convention: +Z forward, +Y up, +X right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Option<Self> {
        let axis = axis.normalized()?;
        let (s, c) = (angle * 0.5).sin_cos();
        Some(Self::new(axis.x * s, axis.y * s, axis.z * s, c))
    }

    /// Rotation whose forward axis is `forward` and whose up axis is as close
    /// to `up` as possible. Returns `None` for a zero `forward`.
    ///
    /// When `up` is parallel to `forward` an arbitrary perpendicular up is used.
    #[must_use]
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Self> {
        let z = forward.normalized()?;
        let x = up
            .cross(z)
            .normalized()
            .unwrap_or_else(|| z.any_orthogonal().cross(z).normalized().unwrap_or(Vec3::X));
        let y = z.cross(x);
        Some(Self::from_basis(x, y, z))
    }

    /// Builds a rotation from three orthonormal axes (the matrix columns).
    #[must_use]
    pub fn from_basis(x: Vec3, y: Vec3, z: Vec3) -> Self {
        let (m00, m01, m02) = (x.x, y.x, z.x);
        let (m10, m11, m12) = (x.y, y.y, z.y);
        let (m20, m21, m22) = (x.z, y.z, z.z);
        let trace = m00 + m11 + m22;

        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalized()
    }

    #[must_use]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Normalizes, falling back to identity for a zero or non-finite quaternion.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if !len.is_finite() || len <= Tolerance::ZERO_LENGTH.eps {
            return Self::IDENTITY;
        }
        Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Inverse of a unit quaternion.
    #[must_use]
    pub const fn inverse(self) -> Self {
        self.conjugate()
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    #[must_use]
    pub fn forward(self) -> Vec3 {
        self.rotate(Vec3::Z)
    }

    #[must_use]
    pub fn up(self) -> Vec3 {
        self.rotate(Vec3::Y)
    }

    #[must_use]
    pub fn right(self) -> Vec3 {
        self.rotate(Vec3::X)
    }

    /// Spherical interpolation along the shortest arc.
    #[must_use]
    pub fn slerp(self, rhs: Self, t: f64) -> Self {
        let mut end = rhs;
        let mut cos = self.dot(rhs);
        if cos < 0.0 {
            end = Self::new(-rhs.x, -rhs.y, -rhs.z, -rhs.w);
            cos = -cos;
        }

        let (k0, k1) = if cos > 1.0 - Tolerance::LOOSE.eps {
            (1.0 - t, t)
        } else {
            let angle = cos.clamp(-1.0, 1.0).acos();
            let sin = angle.sin();
            (((1.0 - t) * angle).sin() / sin, (t * angle).sin() / sin)
        };

        Self::new(
            self.x * k0 + end.x * k1,
            self.y * k0 + end.y * k1,
            self.z * k0 + end.z * k1,
            self.w * k0 + end.w * k1,
        )
        .normalized()
    }

    /// Roll about the forward axis in degrees, in `[0, 360)`.
    #[must_use]
    pub fn roll_degrees(self) -> f64 {
        let right = self.right();
        let up = self.up();
        right.y.atan2(up.y).to_degrees().rem_euclid(360.0)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 4]> for Quat {
    fn from(arr: [f64; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }
}

impl From<Quat> for [f64; 4] {
    fn from(q: Quat) -> Self {
        [q.x, q.y, q.z, q.w]
    }
}

impl Mul for Quat {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Self::Output {
        self.rotate(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rect2
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned 2D rectangle, used for profile bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect2 {
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self::new(first, first);
        for p in iter {
            rect.min.x = rect.min.x.min(p.x);
            rect.min.y = rect.min.y.min(p.y);
            rect.max.x = rect.max.x.max(p.x);
            rect.max.y = rect.max.y.max(p.y);
        }
        Some(rect)
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn center(self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    /// Scales width and height about the center.
    #[must_use]
    pub fn scaled(self, scale: Vec2) -> Self {
        let center = self.center();
        let half = Vec2::new(self.width() * scale.x * 0.5, self.height() * scale.y * 0.5);
        Self::new(center - half, center + half)
    }

    #[must_use]
    pub fn expand_by(self, amount: f64) -> Self {
        Self::new(self.min - Vec2::splat(amount), self.max + Vec2::splat(amount))
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Tolerance configuration for geometric operations.
///
/// Use the named constants rather than scattering literals:
/// - `Tolerance::DEFAULT` - General comparisons (1e-9)
/// - `Tolerance::ZERO_LENGTH` - Degenerate vector detection (1e-12)
/// - `Tolerance::LOOSE` - Coarse comparisons (1e-6)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self { eps: 1e-9 };
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        (a - b).length_squared() <= self.eps * self.eps
    }

    #[must_use]
    pub fn approx_eq_vec3(self, a: Vec3, b: Vec3) -> bool {
        (a - b).length_squared() <= self.eps * self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!(Tolerance::LOOSE.approx_eq_vec3(a, b), "{a:?} != {b:?}");
    }

    #[test]
    fn test_vec3_operators() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(2.0 * a, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_point3_operators() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let q = Point3::new(4.0, 6.0, 3.0);
        assert_eq!(q - p, Vec3::new(3.0, 4.0, 0.0));
        assert!((p.distance_to(q) - 5.0).abs() < 1e-12);
        assert_eq!(p + Vec3::Z, Point3::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn test_identity_axes() {
        assert_vec_close(Quat::IDENTITY.forward(), Vec3::Z);
        assert_vec_close(Quat::IDENTITY.up(), Vec3::Y);
        assert_vec_close(Quat::IDENTITY.right(), Vec3::X);
    }

    #[test]
    fn test_look_rotation_axes() {
        let q = Quat::look_rotation(Vec3::X, Vec3::Y).unwrap();
        assert_vec_close(q.forward(), Vec3::X);
        assert_vec_close(q.up(), Vec3::Y);
        assert_vec_close(q.right(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_look_rotation_parallel_up_still_orthonormal() {
        let q = Quat::look_rotation(Vec3::Y, Vec3::Y).unwrap();
        assert_vec_close(q.forward(), Vec3::Y);
        assert!(q.up().dot(Vec3::Y).abs() < 1e-9);
        assert!(Quat::look_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_axis_angle_rotation() {
        let q = Quat::from_axis_angle(Vec3::Y, std::f64::consts::FRAC_PI_2).unwrap();
        assert_vec_close(q * Vec3::Z, Vec3::X);
        assert_vec_close(q.inverse() * (q * Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_slerp_endpoints_and_midpoint() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2).unwrap();
        assert!(a.slerp(b, 0.0).dot(a).abs() > 1.0 - 1e-9);
        assert!(a.slerp(b, 1.0).dot(b).abs() > 1.0 - 1e-9);
        let mid = a.slerp(b, 0.5);
        assert!((mid.roll_degrees() - 45.0).abs() < 1e-6);
    }

    #[test]
    fn test_roll_degrees() {
        let q = Quat::from_axis_angle(Vec3::Z, -std::f64::consts::FRAC_PI_2).unwrap();
        assert!((q.roll_degrees() - 270.0).abs() < 1e-6);
        assert!(Quat::IDENTITY.roll_degrees().abs() < 1e-9);
    }

    #[test]
    fn test_rect_scaled_and_contains() {
        let rect = Rect2::from_points([Vec2::new(-1.0, -2.0), Vec2::new(1.0, 2.0)]).unwrap();
        assert_eq!(rect.width(), 2.0);
        assert_eq!(rect.height(), 4.0);

        let doubled = rect.scaled(Vec2::new(2.0, 0.5));
        assert_eq!(doubled.min, Vec2::new(-2.0, -1.0));
        assert_eq!(doubled.max, Vec2::new(2.0, 1.0));

        assert!(rect.contains(Vec2::new(0.0, -2.0)));
        assert!(!rect.contains(Vec2::new(0.0, -2.5)));
        assert!(rect.expand_by(0.5).contains(Vec2::new(0.0, -2.5)));
    }

    #[test]
    fn test_serde_as_arrays() {
        let q = Quat::new(0.0, 0.0, 0.0, 1.0);
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "[0.0,0.0,0.0,1.0]");
        let p: Point3 = serde_json::from_str("[1.0,2.0,3.0]").unwrap();
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
    }
}
