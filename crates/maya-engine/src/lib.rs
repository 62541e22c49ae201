//! Maya engine crate.
//!
//! A small real-time rendering core: a handle-based graphics device
//! ([`rhi`]), a fly camera, mesh/texture wrappers, an OBJ loader and a
//! winit-driven frame loop. Math lives in `maya-math`.

pub mod assets;
pub mod camera;
pub mod core;
pub mod input;
pub mod logging;
pub mod render;
pub mod rhi;
pub mod time;
pub mod window;

pub use maya_math as math;
