use core::ops::{Index, IndexMut, Mul, MulAssign};

use crate::scalar::EPSILON;
use crate::vec3::Vec3;
use crate::vec4::Vec4;

/// 4x4 matrix stored column-major.
///
/// `element(row, col)` is stored at `m[col * 4 + row]`, which is also the
/// layout WGSL expects for `mat4x4<f32>`, so `to_cols_array` can be uploaded
/// as-is. Products compose right-to-left: `a * b` applies `b` first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    m: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const ZERO: Self = Self { m: [0.0; 16] };
    pub const IDENTITY: Self = Self::from_diagonal(1.0);

    #[inline]
    pub const fn from_diagonal(d: f32) -> Self {
        let mut m = [0.0; 16];
        m[0] = d;
        m[5] = d;
        m[10] = d;
        m[15] = d;
        Self { m }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn to_cols_array(&self) -> [f32; 16] {
        self.m
    }

    #[inline]
    pub fn element(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    #[inline]
    pub fn set_element(&mut self, row: usize, col: usize, value: f32) {
        self.m[col * 4 + row] = value;
    }

    pub fn transposed(&self) -> Self {
        let mut out = Self::ZERO;
        for row in 0..4 {
            for col in 0..4 {
                out[(col, row)] = self[(row, col)];
            }
        }
        out
    }

    pub fn translate(t: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out[(0, 3)] = t.x;
        out[(1, 3)] = t.y;
        out[(2, 3)] = t.z;
        out
    }

    pub fn scale(s: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out[(0, 0)] = s.x;
        out[(1, 1)] = s.y;
        out[(2, 2)] = s.z;
        out
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    pub fn rotate(angle: f32, axis: Vec3) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let Vec3 { x, y, z } = axis.normalized();

        let mut out = Self::IDENTITY;
        out[(0, 0)] = c + x * x * t;
        out[(0, 1)] = x * y * t - z * s;
        out[(0, 2)] = x * z * t + y * s;

        out[(1, 0)] = y * x * t + z * s;
        out[(1, 1)] = c + y * y * t;
        out[(1, 2)] = y * z * t - x * s;

        out[(2, 0)] = z * x * t - y * s;
        out[(2, 1)] = z * y * t + x * s;
        out[(2, 2)] = c + z * z * t;
        out
    }

    /// Right-handed perspective projection with zero-to-one depth.
    ///
    /// `fov` is the vertical field of view in radians. After the divide by
    /// `w = -z`, the near plane maps to depth 0 and the far plane to depth 1.
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov * 0.5).tan();
        let range = near - far;

        let mut out = Self::ZERO;
        out[(0, 0)] = f / aspect;
        out[(1, 1)] = f;
        out[(2, 2)] = far / range;
        out[(2, 3)] = near * far / range;
        out[(3, 2)] = -1.0;
        out
    }

    /// Right-handed orthographic projection with zero-to-one depth.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut out = Self::IDENTITY;
        out[(0, 0)] = 2.0 / (right - left);
        out[(1, 1)] = 2.0 / (top - bottom);
        out[(2, 2)] = 1.0 / (near - far);
        out[(0, 3)] = -(right + left) / (right - left);
        out[(1, 3)] = -(top + bottom) / (top - bottom);
        out[(2, 3)] = near / (near - far);
        out
    }

    /// Right-handed view matrix placing `eye` at the origin looking at `target`.
    ///
    /// Degenerate input does not fail: when `eye == target` the camera looks
    /// down -Z, and when the view direction is parallel to `up` a substitute
    /// up axis is used.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut f = (target - eye).normalized();
        if f == Vec3::ZERO {
            f = -Vec3::Z;
        }

        let mut s = f.cross(up).normalized();
        if s == Vec3::ZERO {
            let alt = if f.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
            s = f.cross(alt).normalized();
        }
        let u = s.cross(f);

        let mut out = Self::IDENTITY;
        out[(0, 0)] = s.x;
        out[(0, 1)] = s.y;
        out[(0, 2)] = s.z;
        out[(1, 0)] = u.x;
        out[(1, 1)] = u.y;
        out[(1, 2)] = u.z;
        out[(2, 0)] = -f.x;
        out[(2, 1)] = -f.y;
        out[(2, 2)] = -f.z;
        out[(0, 3)] = -s.dot(eye);
        out[(1, 3)] = -u.dot(eye);
        out[(2, 3)] = f.dot(eye);
        out
    }

    /// Transforms a point (`w = 1`) and applies the perspective divide when
    /// `w` is non-zero.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let r = *self * Vec4::point(p);
        if r.w.abs() > EPSILON && r.w != 1.0 {
            r.perspective_divide()
        } else {
            r.xyz()
        }
    }

    /// Transforms a direction (`w = 0`); translation is ignored.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(v, 0.0)).xyz()
    }
}

impl Index<(usize, usize)> for Mat4 {
    type Output = f32;
    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.m[col * 4 + row]
    }
}

impl IndexMut<(usize, usize)> for Mat4 {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.m[col * 4 + row]
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = Mat4::ZERO;
        for col in 0..4 {
            for row in 0..4 {
                let mut sum = 0.0;
                for i in 0..4 {
                    sum += self[(row, i)] * rhs[(i, col)];
                }
                out[(row, col)] = sum;
            }
        }
        out
    }
}

impl MulAssign for Mat4 {
    #[inline]
    fn mul_assign(&mut self, rhs: Mat4) {
        *self = *self * rhs;
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Vec4 {
        let row = |r: usize| {
            self[(r, 0)] * v.x + self[(r, 1)] * v.y + self[(r, 2)] * v.z + self[(r, 3)] * v.w
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}
