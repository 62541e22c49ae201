use anyhow::Result;

use crate::rhi::GraphicsDevice;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Engine`](super::Engine).
///
/// Per frame the engine calls `on_update`, then `on_render` inside a
/// `begin_frame`/`end_frame` bracket. Returning `Exit` or an error from any
/// callback ends the run; `on_shutdown` is still called.
pub trait App {
    /// Called once the device is initialized, before the first frame.
    /// Create pipelines, meshes and textures here.
    fn on_initialize(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let _ = device;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl>;

    /// Issue binds and draws. The device is recording.
    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl>;

    /// Drawable size changed, in physical pixels. May be zero while minimized.
    fn on_resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called before the device shuts down.
    fn on_shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        let _ = device;
    }
}
