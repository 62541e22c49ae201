//! Linear algebra for the **Maya** engine.
//!
//! This crate is intentionally dependency-free so tools and tests can use the
//! math types without pulling in GPU or windowing code.
//!
//! Conventions:
//! - `Mat4` is column-major: `element(row, col)` lives at `col * 4 + row`
//! - composition is right-to-left (`a * b` applies `b` first), for both
//!   matrices and quaternions
//! - projections use a zero-to-one depth range
//! - no operation fails; degenerate input falls back to a defined value
//!   (zero vector, identity quaternion)

mod mat4;
mod quat;
mod scalar;
mod vec2;
mod vec3;
mod vec4;

pub use mat4::Mat4;
pub use quat::Quat;
pub use scalar::{EPSILON, HALF_PI, PI, TWO_PI, clamp, lerp, to_degrees, to_radians};
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
