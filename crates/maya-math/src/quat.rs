use core::ops::{Mul, MulAssign};

use crate::mat4::Mat4;
use crate::vec3::Vec3;

/// Rotation quaternion `(x, y, z, w)` with `w` the scalar part.
///
/// Multiplication composes right-to-left like `Mat4`: `(a * b).rotate(v)`
/// rotates by `b` first, then by `a`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Rotation of `angle` radians about `axis`. The axis is normalized first.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        let a = axis.normalized();
        Self::new(a.x * s, a.y * s, a.z * s, c)
    }

    /// Builds a rotation from Tait-Bryan angles in radians.
    ///
    /// `roll` turns about X, `pitch` about Y and `yaw` about Z, applied in
    /// that order (roll first).
    pub fn from_euler(pitch: f32, yaw: f32, roll: f32) -> Self {
        let (sy, cy) = (yaw * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sr, cr) = (roll * 0.5).sin_cos();

        Self::new(
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
            cr * cp * cy + sr * sp * sy,
        )
    }

    #[inline]
    pub fn dot(self, rhs: Quat) -> f32 {
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

    /// Unit-length copy, or identity for a zero quaternion.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Self::IDENTITY
        }
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Multiplicative inverse, or identity for a zero quaternion.
    pub fn inverse(self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > 0.0 {
            let c = self.conjugate();
            Self::new(c.x / len_sq, c.y / len_sq, c.z / len_sq, c.w / len_sq)
        } else {
            Self::IDENTITY
        }
    }

    /// Rotates `v` by this quaternion (`q * v * q̄`).
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Quat::new(v.x, v.y, v.z, 0.0);
        let r = self * p * self.conjugate();
        Vec3::new(r.x, r.y, r.z)
    }

    pub fn to_mat4(self) -> Mat4 {
        let Quat { x, y, z, w } = self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        let mut m = Mat4::IDENTITY;
        m[(0, 0)] = 1.0 - 2.0 * (yy + zz);
        m[(0, 1)] = 2.0 * (xy - wz);
        m[(0, 2)] = 2.0 * (xz + wy);

        m[(1, 0)] = 2.0 * (xy + wz);
        m[(1, 1)] = 1.0 - 2.0 * (xx + zz);
        m[(1, 2)] = 2.0 * (yz - wx);

        m[(2, 0)] = 2.0 * (xz - wy);
        m[(2, 1)] = 2.0 * (yz + wx);
        m[(2, 2)] = 1.0 - 2.0 * (xx + yy);
        m
    }

    /// Spherical interpolation along the shorter arc.
    ///
    /// Nearly parallel inputs fall back to a normalized linear blend.
    pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
        let mut cos_theta = a.dot(b);
        let mut b = b;
        if cos_theta < 0.0 {
            b = Quat::new(-b.x, -b.y, -b.z, -b.w);
            cos_theta = -cos_theta;
        }

        if cos_theta > 0.9995 {
            return Quat::new(
                a.x + t * (b.x - a.x),
                a.y + t * (b.y - a.y),
                a.z + t * (b.z - a.z),
                a.w + t * (b.w - a.w),
            )
            .normalized();
        }

        let theta = cos_theta.acos();
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;

        Quat::new(
            a.x * wa + b.x * wb,
            a.y * wa + b.y * wb,
            a.z * wa + b.z * wb,
            a.w * wa + b.w * wb,
        )
    }
}

impl Mul for Quat {
    type Output = Quat;

    /// Hamilton product.
    fn mul(self, o: Quat) -> Quat {
        Quat::new(
            self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
            self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
            self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
            self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
        )
    }
}

impl MulAssign for Quat {
    #[inline]
    fn mul_assign(&mut self, rhs: Quat) {
        *self = *self * rhs;
    }
}
