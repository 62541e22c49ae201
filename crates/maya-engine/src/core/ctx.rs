use crate::input::InputState;
use crate::rhi::GraphicsDevice;
use crate::time::FrameTime;

/// Per-frame context passed to [`App`](super::App) callbacks.
pub struct FrameCtx<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub input: &'a InputState,
    pub time: FrameTime,
}

impl FrameCtx<'_> {
    /// Seconds since the previous frame.
    pub fn dt(&self) -> f32 {
        self.time.dt
    }

    /// Drawable size in physical pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        self.device.surface_size()
    }

    /// Width over height, or `1.0` while the surface has no area.
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.surface_size();
        if w == 0 || h == 0 { 1.0 } else { w as f32 / h as f32 }
    }
}
