use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::scalar::EPSILON;
use crate::vec3::Vec3;

/// 4D vector (homogeneous points, RGBA colors).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub const fn from_vec3(xyz: Vec3, w: f32) -> Self {
        Self::new(xyz.x, xyz.y, xyz.z, w)
    }

    /// Homogeneous point (`w = 1`).
    #[inline]
    pub const fn point(p: Vec3) -> Self {
        Self::from_vec3(p, 1.0)
    }

    #[inline]
    pub const fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn dot(self, rhs: Vec4) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit-length copy, or the zero vector when the length is below `EPSILON`.
    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > EPSILON { self / len } else { Self::ZERO }
    }

    #[inline]
    pub fn distance(self, rhs: Vec4) -> f32 {
        (rhs - self).length()
    }

    #[inline]
    pub fn lerp(self, rhs: Vec4, t: f32) -> Vec4 {
        self + (rhs - self) * t
    }

    /// Divides `xyz` by `w`.
    ///
    /// The caller is responsible for `w != 0`; points behind a perspective
    /// camera's eye plane produce non-finite results.
    #[inline]
    pub fn perspective_divide(self) -> Vec3 {
        self.xyz() / self.w
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    #[inline]
    fn add(self, rhs: Vec4) -> Vec4 {
        Vec4::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    #[inline]
    fn sub(self, rhs: Vec4) -> Vec4 {
        Vec4::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: f32) -> Vec4 {
        Vec4::new(self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs)
    }
}

impl Div<f32> for Vec4 {
    type Output = Vec4;
    #[inline]
    fn div(self, rhs: f32) -> Vec4 {
        Vec4::new(self.x / rhs, self.y / rhs, self.z / rhs, self.w / rhs)
    }
}

impl Neg for Vec4 {
    type Output = Vec4;
    #[inline]
    fn neg(self) -> Vec4 {
        Vec4::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl AddAssign for Vec4 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec4) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec4 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec4) {
        *self = *self - rhs;
    }
}

impl MulAssign<f32> for Vec4 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl From<[f32; 4]> for Vec4 {
    #[inline]
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalized_zero_is_zero() {
        assert_eq!(Vec4::ZERO.normalized(), Vec4::ZERO);
    }

    #[test]
    fn normalized_has_unit_length() {
        let n = Vec4::new(1.0, 2.0, -2.0, 4.0).normalized();
        assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn lerp_blends_colors() {
        let c = Vec4::ZERO.lerp(Vec4::new(1.0, 0.5, 0.0, 1.0), 0.5);
        assert_eq!(c, Vec4::new(0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn perspective_divide_scales_by_w() {
        let p = Vec4::new(2.0, 4.0, 6.0, 2.0).perspective_divide();
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
    }
}
