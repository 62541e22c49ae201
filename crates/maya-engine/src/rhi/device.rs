use std::sync::Arc;

use super::error::DeviceError;
use super::handle::{
    IndexBufferHandle, PipelineHandle, TextureHandle, UniformBufferHandle, VertexBufferHandle,
};

/// Native surface a device renders into.
#[derive(Debug, Clone)]
pub enum NativeWindow {
    /// No presentable surface; backends render offscreen (or not at all).
    Headless,
    Winit(Arc<winit::window::Window>),
}

impl NativeWindow {
    pub fn is_headless(&self) -> bool {
        matches!(self, NativeWindow::Headless)
    }
}

/// Device lifecycle.
///
/// `Uninitialized -> Idle <-> Recording -> Shutdown`, and `Shutdown -> Idle`
/// on re-initialization.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceState {
    Uninitialized,
    Idle,
    Recording,
    Shutdown,
}

impl DeviceState {
    pub fn is_initialized(self) -> bool {
        matches!(self, DeviceState::Idle | DeviceState::Recording)
    }
}

/// Handle-based, single-threaded, immediate-mode graphics device.
///
/// Resource creation requires an initialized device. Binds and draws must
/// happen between [`begin_frame`](Self::begin_frame) and
/// [`end_frame`](Self::end_frame). A call that returns an error leaves the
/// device exactly as it was.
///
/// Handles are never reused, including across shutdown and re-initialization,
/// so a stale handle resolves to [`DeviceError::UnknownHandle`].
pub trait GraphicsDevice {
    fn initialize(&mut self, window: NativeWindow) -> Result<(), DeviceError>;

    /// Releases every backend resource. Safe to call repeatedly.
    fn shutdown(&mut self);

    fn state(&self) -> DeviceState;

    /// Drawable size in physical pixels (`(0, 0)` before initialization).
    fn surface_size(&self) -> (u32, u32);

    /// Reconfigures surface-sized targets. A zero extent is remembered but
    /// applied only once the size becomes non-zero again.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), DeviceError>;

    fn begin_frame(&mut self) -> Result<(), DeviceError>;

    /// Submits every draw recorded since `begin_frame`, in call order.
    fn end_frame(&mut self) -> Result<(), DeviceError>;

    /// Compiles a WGSL program. The new pipeline becomes the bound one.
    fn create_pipeline(&mut self, shader_source: &str) -> Result<PipelineHandle, DeviceError>;

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> Result<(), DeviceError>;

    fn create_vertex_buffer(&mut self, data: &[u8]) -> Result<VertexBufferHandle, DeviceError>;

    /// `data` holds native-endian `u32` indices.
    fn create_index_buffer(&mut self, data: &[u8]) -> Result<IndexBufferHandle, DeviceError>;

    fn create_uniform_buffer(&mut self, size: usize) -> Result<UniformBufferHandle, DeviceError>;

    /// Overwrites the whole buffer; `data.len()` must equal its size.
    fn update_uniform_buffer(
        &mut self,
        handle: UniformBufferHandle,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Uploads tightly packed RGBA8 pixels (`width * height * 4` bytes).
    fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, DeviceError>;

    fn bind_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        slot: u32,
    ) -> Result<(), DeviceError>;

    fn bind_uniform_buffer(
        &mut self,
        handle: UniformBufferHandle,
        slot: u32,
    ) -> Result<(), DeviceError>;

    fn bind_texture(&mut self, handle: TextureHandle, slot: u32) -> Result<(), DeviceError>;

    fn draw_indexed(
        &mut self,
        index_buffer: IndexBufferHandle,
        index_count: u32,
    ) -> Result<(), DeviceError>;
}
