//! First-person fly camera producing view/projection matrices.

mod fly_camera;

pub use fly_camera::{Camera, CameraConfig};
