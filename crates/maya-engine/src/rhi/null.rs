use super::commands::DrawCall;
use super::device::{DeviceState, GraphicsDevice, NativeWindow};
use super::error::DeviceError;
use super::handle::{
    IndexBufferHandle, PipelineHandle, TextureHandle, UniformBufferHandle, VertexBufferHandle,
};
use super::shader;
use super::state::{DeviceLimits, DeviceTracker};

/// CPU-only device.
///
/// Applies the same validation, shader compilation and handle policy as the
/// GPU backend, but stores nothing beyond metadata. Submitted frames are kept
/// for inspection.
#[derive(Debug)]
pub struct NullDevice {
    tracker: DeviceTracker,
    limits: DeviceLimits,
    size: (u32, u32),
    submitted: Vec<Vec<DrawCall>>,
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl NullDevice {
    pub fn new() -> Self {
        Self::with_size(1, 1)
    }

    /// Reports `(width, height)` as the drawable size once initialized.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            tracker: DeviceTracker::new(),
            limits: DeviceLimits::default(),
            size: (width, height),
            submitted: Vec::new(),
        }
    }

    /// Enforces `limits` instead of wgpu's defaults from the next `initialize`.
    pub fn with_limits(mut self, limits: DeviceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Draws of every frame ended so far, oldest first.
    pub fn submitted_frames(&self) -> &[Vec<DrawCall>] {
        &self.submitted
    }

    pub fn last_frame(&self) -> Option<&[DrawCall]> {
        self.submitted.last().map(Vec::as_slice)
    }

    pub fn bound_pipeline(&self) -> Option<PipelineHandle> {
        self.tracker.bound_pipeline()
    }

    pub fn resource_count(&self) -> usize {
        self.tracker.resource_count()
    }
}

impl GraphicsDevice for NullDevice {
    fn initialize(&mut self, window: NativeWindow) -> Result<(), DeviceError> {
        self.tracker.check_initialize()?;
        if let NativeWindow::Winit(w) = &window {
            let size = w.inner_size();
            self.size = (size.width, size.height);
        }
        self.submitted.clear();
        self.tracker.mark_initialized(self.limits);
        log::info!("null device initialized ({}x{})", self.size.0, self.size.1);
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.tracker.shutdown() {
            log::info!("null device shut down");
        }
    }

    fn state(&self) -> DeviceState {
        self.tracker.state()
    }

    fn surface_size(&self) -> (u32, u32) {
        if self.tracker.state().is_initialized() {
            self.size
        } else {
            (0, 0)
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        self.tracker.require_initialized()?;
        self.size = (width, height);
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        self.tracker.begin_frame()
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        let draws = self.tracker.end_frame()?;
        self.submitted.push(draws);
        Ok(())
    }

    fn create_pipeline(&mut self, shader_source: &str) -> Result<PipelineHandle, DeviceError> {
        self.tracker.require_initialized()?;
        let info = shader::compile(shader_source)?;
        self.tracker.check_pipeline(&info)?;
        let handle = self.tracker.add_pipeline(info);
        log::debug!("created {handle}");
        Ok(handle)
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> Result<(), DeviceError> {
        self.tracker.bind_pipeline(pipeline)
    }

    fn create_vertex_buffer(&mut self, data: &[u8]) -> Result<VertexBufferHandle, DeviceError> {
        self.tracker.check_vertex_data(data)?;
        Ok(self.tracker.add_vertex_buffer(data.len()))
    }

    fn create_index_buffer(&mut self, data: &[u8]) -> Result<IndexBufferHandle, DeviceError> {
        let count = self.tracker.check_index_data(data)?;
        Ok(self.tracker.add_index_buffer(count))
    }

    fn create_uniform_buffer(&mut self, size: usize) -> Result<UniformBufferHandle, DeviceError> {
        self.tracker.check_uniform_size(size)?;
        Ok(self.tracker.add_uniform_buffer(size))
    }

    fn update_uniform_buffer(
        &mut self,
        handle: UniformBufferHandle,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.tracker.check_uniform_update(handle, data)
    }

    fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, DeviceError> {
        self.tracker.check_texture(rgba, width, height)?;
        Ok(self.tracker.add_texture())
    }

    fn bind_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        slot: u32,
    ) -> Result<(), DeviceError> {
        self.tracker.bind_vertex_buffer(handle, slot)
    }

    fn bind_uniform_buffer(
        &mut self,
        handle: UniformBufferHandle,
        slot: u32,
    ) -> Result<(), DeviceError> {
        self.tracker.bind_uniform_buffer(handle, slot)
    }

    fn bind_texture(&mut self, handle: TextureHandle, slot: u32) -> Result<(), DeviceError> {
        self.tracker.bind_texture(handle, slot)
    }

    fn draw_indexed(
        &mut self,
        index_buffer: IndexBufferHandle,
        index_count: u32,
    ) -> Result<(), DeviceError> {
        self.tracker.record_draw(index_buffer, index_count).map(|_| ())
    }
}
