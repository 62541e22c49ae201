pub const PI: f32 = core::f32::consts::PI;
pub const TWO_PI: f32 = PI * 2.0;
pub const HALF_PI: f32 = PI * 0.5;

/// Threshold below which a length is treated as zero.
pub const EPSILON: f32 = f32::EPSILON;

#[inline]
pub fn to_radians(degrees: f32) -> f32 {
    degrees * (PI / 180.0)
}

#[inline]
pub fn to_degrees(radians: f32) -> f32 {
    radians * (180.0 / PI)
}

#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn degree_radian_round_trip() {
        assert_abs_diff_eq!(to_radians(180.0), PI, epsilon = 1e-6);
        assert_abs_diff_eq!(to_degrees(HALF_PI), 90.0, epsilon = 1e-4);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(100.0, -89.0, 89.0), 89.0);
        assert_eq!(clamp(-100.0, -89.0, 89.0), -89.0);
        assert_eq!(clamp(3.0, -89.0, 89.0), 3.0);
    }
}
