use std::collections::HashMap;

use super::commands::{Bindings, DrawCall, MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS, MAX_VERTEX_SLOTS};
use super::device::DeviceState;
use super::error::DeviceError;
use super::handle::{
    INVALID_HANDLE, IndexBufferHandle, PipelineHandle, ResourceHandle, ResourceKind,
    TextureHandle, UniformBufferHandle, VertexBufferHandle,
};
use super::shader::ShaderInfo;

const INDEX_SIZE: usize = std::mem::size_of::<u32>();
const UNIFORM_ALIGN: usize = 4;

/// Size limits checked before any native resource is created.
///
/// wgpu treats an oversized texture, buffer or uniform binding as a
/// validation error, which is fatal by default. Checking here turns it into a
/// [`DeviceError`] and keeps the null backend's answers identical.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DeviceLimits {
    /// Largest width or height of a 2D texture.
    pub max_texture_dimension: u32,
    /// Largest uniform buffer, and largest uniform block a shader may read.
    pub max_uniform_size: usize,
    /// Largest vertex or index buffer.
    pub max_buffer_size: usize,
}

impl Default for DeviceLimits {
    /// wgpu's default limits, which every supported adapter meets.
    fn default() -> Self {
        Self::from(&wgpu::Limits::default())
    }
}

impl From<&wgpu::Limits> for DeviceLimits {
    fn from(limits: &wgpu::Limits) -> Self {
        Self {
            max_texture_dimension: limits.max_texture_dimension_2d,
            max_uniform_size: limits.max_uniform_buffer_binding_size as usize,
            max_buffer_size: usize::try_from(limits.max_buffer_size).unwrap_or(usize::MAX),
        }
    }
}

#[derive(Debug, Clone)]
enum Resource {
    Pipeline(ShaderInfo),
    VertexBuffer { size: usize },
    IndexBuffer { count: u32 },
    UniformBuffer { size: usize },
    Texture,
}

impl Resource {
    fn kind(&self) -> ResourceKind {
        match self {
            Resource::Pipeline(_) => ResourceKind::Pipeline,
            Resource::VertexBuffer { .. } => ResourceKind::VertexBuffer,
            Resource::IndexBuffer { .. } => ResourceKind::IndexBuffer,
            Resource::UniformBuffer { .. } => ResourceKind::UniformBuffer,
            Resource::Texture => ResourceKind::Texture,
        }
    }
}

/// Backend-independent device bookkeeping.
///
/// Owns the lifecycle state, the handle counter, resource metadata, slot
/// bindings and the draws recorded for the current frame. Backends call the
/// `check_*` methods before touching native resources and register the
/// result afterwards, so a failed call never has a partial effect.
#[derive(Debug)]
pub struct DeviceTracker {
    state: DeviceState,
    limits: DeviceLimits,
    next_handle: ResourceHandle,
    resources: HashMap<ResourceHandle, Resource>,
    pipeline: Option<PipelineHandle>,
    bindings: Bindings,
    draws: Vec<DrawCall>,
}

impl Default for DeviceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceTracker {
    pub fn new() -> Self {
        Self {
            state: DeviceState::Uninitialized,
            limits: DeviceLimits::default(),
            next_handle: INVALID_HANDLE + 1,
            resources: HashMap::new(),
            pipeline: None,
            bindings: Bindings::default(),
            draws: Vec::new(),
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn limits(&self) -> DeviceLimits {
        self.limits
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bound_pipeline(&self) -> Option<PipelineHandle> {
        self.pipeline
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    // ── lifecycle ──────────────────────────────────────────────────────────

    pub fn check_initialize(&self) -> Result<(), DeviceError> {
        match self.state {
            DeviceState::Uninitialized | DeviceState::Shutdown => Ok(()),
            DeviceState::Idle | DeviceState::Recording => Err(DeviceError::AlreadyInitialized),
        }
    }

    pub fn mark_initialized(&mut self, limits: DeviceLimits) {
        self.limits = limits;
        self.state = DeviceState::Idle;
    }

    /// Drops all resource metadata. Returns `false` when there was nothing
    /// to shut down. The handle counter survives.
    pub fn shutdown(&mut self) -> bool {
        if !self.state.is_initialized() {
            return false;
        }
        self.resources.clear();
        self.pipeline = None;
        self.bindings.clear();
        self.draws.clear();
        self.state = DeviceState::Shutdown;
        true
    }

    pub fn require_initialized(&self) -> Result<(), DeviceError> {
        if self.state.is_initialized() {
            Ok(())
        } else {
            Err(DeviceError::NotInitialized)
        }
    }

    pub fn require_recording(&self, op: &'static str) -> Result<(), DeviceError> {
        match self.state {
            DeviceState::Recording => Ok(()),
            DeviceState::Idle => Err(DeviceError::NotRecording { op }),
            _ => Err(DeviceError::NotInitialized),
        }
    }

    pub fn begin_frame(&mut self) -> Result<(), DeviceError> {
        match self.state {
            DeviceState::Idle => {
                self.draws.clear();
                self.state = DeviceState::Recording;
                Ok(())
            }
            DeviceState::Recording => Err(DeviceError::FrameInProgress),
            _ => Err(DeviceError::NotInitialized),
        }
    }

    /// Closes the frame and hands back its draws in call order.
    pub fn end_frame(&mut self) -> Result<Vec<DrawCall>, DeviceError> {
        self.require_recording("end_frame")?;
        self.state = DeviceState::Idle;
        Ok(std::mem::take(&mut self.draws))
    }

    // ── creation ───────────────────────────────────────────────────────────

    /// Rejects shaders whose uniform blocks no uniform buffer could fill.
    pub fn check_pipeline(&self, info: &ShaderInfo) -> Result<(), DeviceError> {
        self.require_initialized()?;
        let max = self.limits.max_uniform_size;
        match info.uniforms.iter().find(|u| u.size > max) {
            Some(u) => Err(DeviceError::Shader(format!(
                "uniform block in slot {} is {} bytes, above the device limit of {max}",
                u.slot, u.size
            ))),
            None => Ok(()),
        }
    }

    pub fn check_vertex_data(&self, data: &[u8]) -> Result<(), DeviceError> {
        self.require_initialized()?;
        if data.is_empty() {
            return Err(DeviceError::EmptyData {
                kind: ResourceKind::VertexBuffer,
            });
        }
        self.check_buffer_len(ResourceKind::VertexBuffer, data.len())
    }

    /// Returns the number of indices in `data`.
    pub fn check_index_data(&self, data: &[u8]) -> Result<u32, DeviceError> {
        self.require_initialized()?;
        if data.is_empty() {
            return Err(DeviceError::EmptyData {
                kind: ResourceKind::IndexBuffer,
            });
        }
        if data.len() % INDEX_SIZE != 0 {
            return Err(DeviceError::Misaligned {
                kind: ResourceKind::IndexBuffer,
                len: data.len(),
                align: INDEX_SIZE,
            });
        }
        self.check_buffer_len(ResourceKind::IndexBuffer, data.len())?;
        u32::try_from(data.len() / INDEX_SIZE).map_err(|_| DeviceError::TooLarge {
            kind: ResourceKind::IndexBuffer,
            len: data.len(),
            max: u32::MAX as usize * INDEX_SIZE,
        })
    }

    pub fn check_uniform_size(&self, size: usize) -> Result<(), DeviceError> {
        self.require_initialized()?;
        if size == 0 {
            return Err(DeviceError::EmptyData {
                kind: ResourceKind::UniformBuffer,
            });
        }
        if size % UNIFORM_ALIGN != 0 {
            return Err(DeviceError::Misaligned {
                kind: ResourceKind::UniformBuffer,
                len: size,
                align: UNIFORM_ALIGN,
            });
        }
        if size > self.limits.max_uniform_size {
            return Err(DeviceError::TooLarge {
                kind: ResourceKind::UniformBuffer,
                len: size,
                max: self.limits.max_uniform_size,
            });
        }
        Ok(())
    }

    pub fn check_uniform_update(
        &self,
        handle: UniformBufferHandle,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.require_initialized()?;
        let expected = self.uniform_buffer_size(handle)?;
        if data.len() != expected {
            return Err(DeviceError::SizeMismatch {
                kind: ResourceKind::UniformBuffer,
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }

    pub fn check_texture(&self, rgba: &[u8], width: u32, height: u32) -> Result<(), DeviceError> {
        self.require_initialized()?;
        if width == 0 || height == 0 {
            return Err(DeviceError::InvalidExtent { width, height });
        }
        let max = self.limits.max_texture_dimension;
        if width > max || height > max {
            return Err(DeviceError::ExtentTooLarge { width, height, max });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(DeviceError::SizeMismatch {
                kind: ResourceKind::Texture,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(())
    }

    fn check_buffer_len(&self, kind: ResourceKind, len: usize) -> Result<(), DeviceError> {
        let max = self.limits.max_buffer_size;
        if len > max {
            return Err(DeviceError::TooLarge { kind, len, max });
        }
        Ok(())
    }

    pub fn add_pipeline(&mut self, info: ShaderInfo) -> PipelineHandle {
        let handle = PipelineHandle::from_raw(self.insert(Resource::Pipeline(info)));
        self.pipeline = Some(handle);
        handle
    }

    pub fn add_vertex_buffer(&mut self, size: usize) -> VertexBufferHandle {
        VertexBufferHandle::from_raw(self.insert(Resource::VertexBuffer { size }))
    }

    pub fn add_index_buffer(&mut self, count: u32) -> IndexBufferHandle {
        IndexBufferHandle::from_raw(self.insert(Resource::IndexBuffer { count }))
    }

    pub fn add_uniform_buffer(&mut self, size: usize) -> UniformBufferHandle {
        UniformBufferHandle::from_raw(self.insert(Resource::UniformBuffer { size }))
    }

    pub fn add_texture(&mut self) -> TextureHandle {
        TextureHandle::from_raw(self.insert(Resource::Texture))
    }

    fn insert(&mut self, resource: Resource) -> ResourceHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        log::trace!("{} #{handle} registered", resource.kind());
        self.resources.insert(handle, resource);
        handle
    }

    // ── lookups ────────────────────────────────────────────────────────────

    fn lookup(&self, kind: ResourceKind, handle: ResourceHandle) -> Result<&Resource, DeviceError> {
        self.resources
            .get(&handle)
            .filter(|r| r.kind() == kind)
            .ok_or(DeviceError::UnknownHandle { kind, handle })
    }

    pub fn shader_info(&self, handle: PipelineHandle) -> Result<&ShaderInfo, DeviceError> {
        match self.lookup(ResourceKind::Pipeline, handle.raw())? {
            Resource::Pipeline(info) => Ok(info),
            _ => Err(DeviceError::UnknownHandle {
                kind: ResourceKind::Pipeline,
                handle: handle.raw(),
            }),
        }
    }

    pub fn vertex_buffer_size(&self, handle: VertexBufferHandle) -> Result<usize, DeviceError> {
        match self.lookup(ResourceKind::VertexBuffer, handle.raw())? {
            Resource::VertexBuffer { size } => Ok(*size),
            _ => Err(DeviceError::UnknownHandle {
                kind: ResourceKind::VertexBuffer,
                handle: handle.raw(),
            }),
        }
    }

    pub fn index_count(&self, handle: IndexBufferHandle) -> Result<u32, DeviceError> {
        match self.lookup(ResourceKind::IndexBuffer, handle.raw())? {
            Resource::IndexBuffer { count } => Ok(*count),
            _ => Err(DeviceError::UnknownHandle {
                kind: ResourceKind::IndexBuffer,
                handle: handle.raw(),
            }),
        }
    }

    pub fn uniform_buffer_size(&self, handle: UniformBufferHandle) -> Result<usize, DeviceError> {
        match self.lookup(ResourceKind::UniformBuffer, handle.raw())? {
            Resource::UniformBuffer { size } => Ok(*size),
            _ => Err(DeviceError::UnknownHandle {
                kind: ResourceKind::UniformBuffer,
                handle: handle.raw(),
            }),
        }
    }

    pub fn check_texture_handle(&self, handle: TextureHandle) -> Result<(), DeviceError> {
        self.lookup(ResourceKind::Texture, handle.raw()).map(|_| ())
    }

    // ── binding / drawing ──────────────────────────────────────────────────

    pub fn bind_pipeline(&mut self, handle: PipelineHandle) -> Result<(), DeviceError> {
        self.require_initialized()?;
        self.shader_info(handle)?;
        self.pipeline = Some(handle);
        Ok(())
    }

    pub fn bind_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        slot: u32,
    ) -> Result<(), DeviceError> {
        self.require_recording("bind_vertex_buffer")?;
        check_slot(ResourceKind::VertexBuffer, slot, MAX_VERTEX_SLOTS)?;
        self.vertex_buffer_size(handle)?;
        self.bindings.vertex_buffers[slot as usize] = Some(handle);
        Ok(())
    }

    pub fn bind_uniform_buffer(
        &mut self,
        handle: UniformBufferHandle,
        slot: u32,
    ) -> Result<(), DeviceError> {
        self.require_recording("bind_uniform_buffer")?;
        check_slot(ResourceKind::UniformBuffer, slot, MAX_UNIFORM_SLOTS)?;
        self.uniform_buffer_size(handle)?;
        self.bindings.uniform_buffers[slot as usize] = Some(handle);
        Ok(())
    }

    pub fn bind_texture(&mut self, handle: TextureHandle, slot: u32) -> Result<(), DeviceError> {
        self.require_recording("bind_texture")?;
        check_slot(ResourceKind::Texture, slot, MAX_TEXTURE_SLOTS)?;
        self.check_texture_handle(handle)?;
        self.bindings.textures[slot as usize] = Some(handle);
        Ok(())
    }

    /// Validates a draw against the current bindings and records it.
    pub fn record_draw(
        &mut self,
        index_buffer: IndexBufferHandle,
        index_count: u32,
    ) -> Result<&DrawCall, DeviceError> {
        self.require_recording("draw_indexed")?;

        let available = self.index_count(index_buffer)?;
        if index_count > available {
            return Err(DeviceError::IndexCountOutOfRange {
                requested: index_count,
                available,
            });
        }

        let pipeline = self.pipeline.ok_or(DeviceError::NoPipeline)?;
        if self.bindings.vertex_buffer(0).is_none() {
            return Err(DeviceError::NoVertexBuffer);
        }

        for uniform in &self.shader_info(pipeline)?.uniforms {
            let Some(bound) = self.bindings.uniform_buffer(uniform.slot) else {
                continue;
            };
            let actual = self.uniform_buffer_size(bound)?;
            if actual < uniform.size {
                return Err(DeviceError::UniformTooSmall {
                    slot: uniform.slot,
                    required: uniform.size,
                    actual,
                });
            }
        }

        self.draws.push(DrawCall {
            pipeline,
            bindings: self.bindings.clone(),
            index_buffer,
            index_count,
        });
        let index = self.draws.len() - 1;
        Ok(&self.draws[index])
    }
}

fn check_slot(kind: ResourceKind, slot: u32, limit: u32) -> Result<(), DeviceError> {
    if slot < limit {
        Ok(())
    } else {
        Err(DeviceError::SlotOutOfRange { kind, slot, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::shader::UniformBinding;

    fn ready() -> DeviceTracker {
        let mut t = DeviceTracker::new();
        t.mark_initialized(DeviceLimits::default());
        t
    }

    #[test]
    fn creation_requires_initialization() {
        let t = DeviceTracker::new();
        assert!(matches!(t.check_vertex_data(&[1]), Err(DeviceError::NotInitialized)));
        assert!(matches!(t.check_uniform_size(16), Err(DeviceError::NotInitialized)));
    }

    #[test]
    fn handles_are_shared_and_monotonic() {
        let mut t = ready();
        let a = t.add_vertex_buffer(12);
        let b = t.add_uniform_buffer(16);
        let c = t.add_texture();
        assert_eq!((a.raw(), b.raw(), c.raw()), (1, 2, 3));
    }

    #[test]
    fn counter_survives_shutdown() {
        let mut t = ready();
        let old = t.add_index_buffer(3);
        assert!(t.shutdown());
        assert!(!t.shutdown());
        t.check_initialize().unwrap();
        t.mark_initialized(DeviceLimits::default());

        let new = t.add_index_buffer(3);
        assert!(new.raw() > old.raw());
        assert!(matches!(t.index_count(old), Err(DeviceError::UnknownHandle { .. })));
    }

    #[test]
    fn wrong_kind_is_unknown() {
        let mut t = ready();
        let vb = t.add_vertex_buffer(12);
        let as_ib = IndexBufferHandle::from_raw(vb.raw());
        assert!(matches!(
            t.index_count(as_ib),
            Err(DeviceError::UnknownHandle {
                kind: ResourceKind::IndexBuffer,
                ..
            })
        ));
    }

    #[test]
    fn index_data_validation() {
        let t = ready();
        assert_eq!(t.check_index_data(&[0u8; 12]).unwrap(), 3);
        assert!(matches!(t.check_index_data(&[]), Err(DeviceError::EmptyData { .. })));
        assert!(matches!(t.check_index_data(&[0u8; 6]), Err(DeviceError::Misaligned { .. })));
    }

    #[test]
    fn texture_validation() {
        let t = ready();
        t.check_texture(&[0u8; 16], 2, 2).unwrap();
        assert!(matches!(
            t.check_texture(&[0u8; 15], 2, 2),
            Err(DeviceError::SizeMismatch { expected: 16, actual: 15, .. })
        ));
        assert!(matches!(t.check_texture(&[], 0, 4), Err(DeviceError::InvalidExtent { .. })));
    }

    #[test]
    fn limits_are_enforced_before_creation() {
        let mut t = DeviceTracker::new();
        t.mark_initialized(DeviceLimits {
            max_texture_dimension: 4,
            max_uniform_size: 64,
            max_buffer_size: 32,
        });

        assert!(matches!(
            t.check_texture(&[0u8; 80], 5, 4),
            Err(DeviceError::ExtentTooLarge { width: 5, max: 4, .. })
        ));
        t.check_texture(&[0u8; 64], 4, 4).unwrap();

        assert!(matches!(
            t.check_uniform_size(128),
            Err(DeviceError::TooLarge { kind: ResourceKind::UniformBuffer, len: 128, max: 64 })
        ));
        t.check_uniform_size(64).unwrap();

        assert!(t.check_vertex_data(&[0u8; 36]).is_err());
        assert!(matches!(
            t.check_index_data(&[0u8; 36]),
            Err(DeviceError::TooLarge { kind: ResourceKind::IndexBuffer, .. })
        ));
        assert_eq!(t.check_index_data(&[0u8; 32]).unwrap(), 8);
    }

    #[test]
    fn oversized_uniform_block_rejects_pipeline() {
        let mut t = DeviceTracker::new();
        t.mark_initialized(DeviceLimits {
            max_uniform_size: 64,
            ..DeviceLimits::default()
        });
        let info = ShaderInfo {
            uniforms: vec![UniformBinding { slot: 0, size: 80 }],
            textures: Vec::new(),
        };
        assert!(matches!(t.check_pipeline(&info), Err(DeviceError::Shader(_))));
        assert!(t.check_pipeline(&ShaderInfo::default()).is_ok());
    }

    #[test]
    fn default_limits_follow_wgpu() {
        let limits = DeviceLimits::default();
        let wgpu = wgpu::Limits::default();
        assert_eq!(limits.max_texture_dimension, wgpu.max_texture_dimension_2d);
        assert!(limits.max_uniform_size >= 16 << 10);
    }

    #[test]
    fn uniform_update_must_match() {
        let mut t = ready();
        let u = t.add_uniform_buffer(64);
        t.check_uniform_update(u, &[0u8; 64]).unwrap();
        assert!(t.check_uniform_update(u, &[0u8; 32]).is_err());
        assert!(t.check_uniform_size(6).is_err());
    }

    #[test]
    fn binds_require_recording() {
        let mut t = ready();
        let vb = t.add_vertex_buffer(48);
        assert!(matches!(
            t.bind_vertex_buffer(vb, 0),
            Err(DeviceError::NotRecording { op: "bind_vertex_buffer" })
        ));
        t.begin_frame().unwrap();
        t.bind_vertex_buffer(vb, 0).unwrap();
        assert!(matches!(
            t.bind_vertex_buffer(vb, MAX_VERTEX_SLOTS),
            Err(DeviceError::SlotOutOfRange { .. })
        ));
        assert!(matches!(t.begin_frame(), Err(DeviceError::FrameInProgress)));
    }

    #[test]
    fn draw_snapshots_bindings() {
        let mut t = ready();
        t.add_pipeline(ShaderInfo::default());
        let a = t.add_vertex_buffer(48);
        let b = t.add_vertex_buffer(48);
        let ib = t.add_index_buffer(6);

        t.begin_frame().unwrap();
        t.bind_vertex_buffer(a, 0).unwrap();
        t.record_draw(ib, 6).unwrap();
        t.bind_vertex_buffer(b, 0).unwrap();
        t.record_draw(ib, 3).unwrap();

        let draws = t.end_frame().unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].bindings.vertex_buffer(0), Some(a));
        assert_eq!(draws[1].bindings.vertex_buffer(0), Some(b));
        assert_eq!(draws[1].index_count, 3);
    }

    #[test]
    fn draw_preconditions() {
        let mut t = ready();
        let vb = t.add_vertex_buffer(48);
        let ib = t.add_index_buffer(3);
        t.begin_frame().unwrap();
        t.bind_vertex_buffer(vb, 0).unwrap();
        assert!(matches!(t.record_draw(ib, 3), Err(DeviceError::NoPipeline)));

        t.add_pipeline(ShaderInfo::default());
        assert!(matches!(
            t.record_draw(ib, 4),
            Err(DeviceError::IndexCountOutOfRange { requested: 4, available: 3 })
        ));
        t.record_draw(ib, 3).unwrap();
    }
}
