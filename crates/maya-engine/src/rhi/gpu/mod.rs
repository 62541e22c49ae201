//! wgpu backend.
//!
//! Binds and draws are validated and recorded as they arrive, then replayed
//! in call order inside a single render pass when the frame ends.

mod context;
mod init;
mod pipeline;
mod resources;
mod surface;

pub use init::GpuInit;

use winit::dpi::PhysicalSize;

use context::Gpu;
use pipeline::GpuPipeline;
use resources::{GpuResources, UniformArena, UniformRange};

use super::device::{DeviceState, GraphicsDevice, NativeWindow};
use super::error::{DeviceError, SurfaceErrorAction};
use super::handle::{
    IndexBufferHandle, PipelineHandle, ResourceKind, TextureHandle, UniformBufferHandle,
    VertexBufferHandle,
};
use super::shader;
use super::state::{DeviceLimits, DeviceTracker};

struct Backend {
    gpu: Gpu,
    resources: GpuResources,
    /// Uniform snapshots for the frame being recorded.
    arena: UniformArena,
    /// Uniform ranges per recorded draw, parallel to the tracker's draw list.
    draw_uniforms: Vec<Vec<UniformRange>>,
}

/// Graphics device backed by wgpu.
pub struct WgpuDevice {
    init: GpuInit,
    tracker: DeviceTracker,
    backend: Option<Backend>,
}

impl WgpuDevice {
    pub fn new(init: GpuInit) -> Self {
        Self {
            init,
            tracker: DeviceTracker::new(),
            backend: None,
        }
    }

    /// Name and backend of the selected adapter, once initialized.
    pub fn adapter_info(&self) -> Option<wgpu::AdapterInfo> {
        self.backend.as_ref().map(|b| b.gpu.adapter_info())
    }

    fn backend(&mut self) -> Result<&mut Backend, DeviceError> {
        self.backend.as_mut().ok_or(DeviceError::NotInitialized)
    }
}

impl GraphicsDevice for WgpuDevice {
    fn initialize(&mut self, window: NativeWindow) -> Result<(), DeviceError> {
        self.tracker.check_initialize()?;

        let gpu = pollster::block_on(Gpu::new(&window, &self.init)).map_err(|e| {
            log::error!("wgpu initialization failed: {e:#}");
            DeviceError::Setup(format!("{e:#}"))
        })?;

        let info = gpu.adapter_info();
        log::info!(
            "wgpu device ready: {} ({:?}), {:?}, {}x{}{}",
            info.name,
            info.backend,
            gpu.color_format(),
            gpu.size().width,
            gpu.size().height,
            if window.is_headless() { " headless" } else { "" }
        );

        let resources = GpuResources::new(gpu.device(), gpu.queue());
        let limits = gpu.device().limits();
        let align = limits.min_uniform_buffer_offset_alignment;

        self.backend = Some(Backend {
            gpu,
            resources,
            arena: UniformArena::new(align),
            draw_uniforms: Vec::new(),
        });
        self.tracker.mark_initialized(DeviceLimits::from(&limits));
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.tracker.shutdown() {
            self.backend = None;
            log::info!("wgpu device shut down");
        }
    }

    fn state(&self) -> DeviceState {
        self.tracker.state()
    }

    fn surface_size(&self) -> (u32, u32) {
        self.backend
            .as_ref()
            .map(|b| (b.gpu.size().width, b.gpu.size().height))
            .unwrap_or((0, 0))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        self.tracker.require_initialized()?;
        let backend = self.backend()?;
        backend.gpu.resize(PhysicalSize::new(width, height));
        log::debug!("resized to {width}x{height}");
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), DeviceError> {
        self.tracker.begin_frame()?;
        let backend = self.backend()?;
        backend.arena.clear();
        backend.draw_uniforms.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DeviceError> {
        let draws = self.tracker.end_frame()?;
        let clear = self.init.clear_color;
        let Backend {
            gpu,
            resources,
            arena,
            draw_uniforms,
        } = self.backend.as_mut().ok_or(DeviceError::NotInitialized)?;

        let size = gpu.size();
        if size.width == 0 || size.height == 0 {
            // Minimized; nothing to present until the next resize.
            return Ok(());
        }

        let frame = match gpu.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                return match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface failure: {message}");
                        Err(DeviceError::Surface(message))
                    }
                    action => {
                        log::debug!("frame skipped ({action:?}): {message}");
                        Ok(())
                    }
                };
            }
        };

        resources.upload_uniforms(gpu.device(), gpu.queue(), arena);
        let (gpu, resources): (&Gpu, &GpuResources) = (gpu, resources);

        let bind_groups: Vec<_> = draws
            .iter()
            .zip(draw_uniforms.iter())
            .map(|(draw, uniforms)| {
                resources
                    .pipelines
                    .get(&draw.pipeline.raw())
                    .map(|p| p.bind_groups(gpu.device(), resources, &draw.bindings, uniforms))
            })
            .collect();

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("maya frame encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("maya main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (draw, groups) in draws.iter().zip(bind_groups.iter()) {
                let Some(pipeline) = resources.pipelines.get(&draw.pipeline.raw()) else {
                    continue;
                };
                let Some(index_buffer) = resources.index_buffers.get(&draw.index_buffer.raw())
                else {
                    continue;
                };

                rpass.set_pipeline(&pipeline.pipeline);
                if let Some((group0, group1)) = groups {
                    if let Some(g) = group0 {
                        rpass.set_bind_group(0, g, &[]);
                    }
                    if let Some(g) = group1 {
                        rpass.set_bind_group(1, g, &[]);
                    }
                }

                for (slot, bound) in draw.bindings.vertex_buffers.iter().enumerate() {
                    let Some(buffer) = bound.and_then(|h| resources.vertex_buffers.get(&h.raw()))
                    else {
                        continue;
                    };
                    rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }

                rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        gpu.submit(frame, encoder.finish());
        log::trace!("frame submitted with {} draws", draws.len());
        Ok(())
    }

    fn create_pipeline(&mut self, shader_source: &str) -> Result<PipelineHandle, DeviceError> {
        self.tracker.require_initialized()?;
        let info = shader::compile(shader_source)
            .and_then(|info| self.tracker.check_pipeline(&info).map(|()| info))
            .inspect_err(|e| log::warn!("{e}"))?;

        let backend = self.backend()?;
        let pipeline = GpuPipeline::new(
            backend.gpu.device(),
            backend.gpu.color_format(),
            shader_source,
            info.clone(),
        );

        let handle = self.tracker.add_pipeline(info);
        self.backend()?.resources.pipelines.insert(handle.raw(), pipeline);
        log::debug!("created {handle}");
        Ok(handle)
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> Result<(), DeviceError> {
        self.tracker.bind_pipeline(pipeline)
    }

    fn create_vertex_buffer(&mut self, data: &[u8]) -> Result<VertexBufferHandle, DeviceError> {
        self.tracker.check_vertex_data(data)?;
        let backend = self.backend()?;
        let buffer = resources::create_buffer(
            backend.gpu.device(),
            "maya vertex buffer",
            data,
            wgpu::BufferUsages::VERTEX,
        );

        let handle = self.tracker.add_vertex_buffer(data.len());
        self.backend()?.resources.vertex_buffers.insert(handle.raw(), buffer);
        log::debug!("created {handle} ({} bytes)", data.len());
        Ok(handle)
    }

    fn create_index_buffer(&mut self, data: &[u8]) -> Result<IndexBufferHandle, DeviceError> {
        let count = self.tracker.check_index_data(data)?;
        let backend = self.backend()?;
        let buffer = resources::create_buffer(
            backend.gpu.device(),
            "maya index buffer",
            data,
            wgpu::BufferUsages::INDEX,
        );

        let handle = self.tracker.add_index_buffer(count);
        self.backend()?.resources.index_buffers.insert(handle.raw(), buffer);
        log::debug!("created {handle} ({count} indices)");
        Ok(handle)
    }

    fn create_uniform_buffer(&mut self, size: usize) -> Result<UniformBufferHandle, DeviceError> {
        self.tracker.check_uniform_size(size)?;
        self.backend()?;

        let handle = self.tracker.add_uniform_buffer(size);
        self.backend()?.resources.uniforms.insert(handle.raw(), vec![0; size]);
        log::debug!("created {handle} ({size} bytes)");
        Ok(handle)
    }

    fn update_uniform_buffer(
        &mut self,
        handle: UniformBufferHandle,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.tracker.check_uniform_update(handle, data)?;
        let shadow = self
            .backend()?
            .resources
            .uniforms
            .get_mut(&handle.raw())
            .ok_or(DeviceError::UnknownHandle {
                kind: ResourceKind::UniformBuffer,
                handle: handle.raw(),
            })?;
        shadow.copy_from_slice(data);
        Ok(())
    }

    fn create_texture(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, DeviceError> {
        self.tracker.check_texture(rgba, width, height)?;
        let backend = self.backend()?;
        let texture = resources::upload_texture(
            backend.gpu.device(),
            backend.gpu.queue(),
            rgba,
            width,
            height,
        );

        let handle = self.tracker.add_texture();
        self.backend()?.resources.textures.insert(handle.raw(), texture);
        log::debug!("created {handle} ({width}x{height})");
        Ok(handle)
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
        let draw = self.tracker.record_draw(index_buffer, index_count)?.clone();
        let backend = self
            .backend
            .as_mut()
            .ok_or(DeviceError::NotInitialized)?;

        // Snapshot uniform contents so later updates do not affect this draw.
        let mut ranges = Vec::new();
        if let Some(pipeline) = backend.resources.pipelines.get(&draw.pipeline.raw()) {
            for uniform in &pipeline.info.uniforms {
                let shadow = draw
                    .bindings
                    .uniform_buffer(uniform.slot)
                    .and_then(|h| backend.resources.uniforms.get(&h.raw()));
                let range = match shadow {
                    Some(bytes) => backend.arena.push(uniform.slot, bytes),
                    None => backend.arena.push_zeroed(uniform.slot, uniform.size),
                };
                ranges.push(range);
            }
        }
        backend.draw_uniforms.push(ranges);
        Ok(())
    }
}

impl Drop for WgpuDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}
