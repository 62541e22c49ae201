//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and feeds an [`Engine`](crate::core::Engine):
//! input events are translated, resizes reach the device, and every redraw
//! runs one frame.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
