use super::handle::{
    IndexBufferHandle, PipelineHandle, TextureHandle, UniformBufferHandle, VertexBufferHandle,
};

pub const MAX_VERTEX_SLOTS: u32 = 8;
pub const MAX_UNIFORM_SLOTS: u32 = 4;
pub const MAX_TEXTURE_SLOTS: u32 = 4;

/// Slot-to-resource table. The last bind to a slot wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    pub vertex_buffers: [Option<VertexBufferHandle>; MAX_VERTEX_SLOTS as usize],
    pub uniform_buffers: [Option<UniformBufferHandle>; MAX_UNIFORM_SLOTS as usize],
    pub textures: [Option<TextureHandle>; MAX_TEXTURE_SLOTS as usize],
}

impl Bindings {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn vertex_buffer(&self, slot: u32) -> Option<VertexBufferHandle> {
        self.vertex_buffers.get(slot as usize).copied().flatten()
    }

    pub fn uniform_buffer(&self, slot: u32) -> Option<UniformBufferHandle> {
        self.uniform_buffers.get(slot as usize).copied().flatten()
    }

    pub fn texture(&self, slot: u32) -> Option<TextureHandle> {
        self.textures.get(slot as usize).copied().flatten()
    }
}

/// One recorded `draw_indexed`, with the bindings in effect at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub pipeline: PipelineHandle,
    pub bindings: Bindings,
    pub index_buffer: IndexBufferHandle,
    pub index_count: u32,
}
