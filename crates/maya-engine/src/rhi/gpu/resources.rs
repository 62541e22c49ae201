use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::pipeline::GpuPipeline;
use crate::rhi::ResourceHandle;

pub(crate) struct GpuTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Native objects behind the device's handles.
///
/// Uniform buffers live on the CPU as shadow copies; their contents are
/// snapshotted per draw into the frame's [`UniformArena`], which is what the
/// GPU actually reads. This gives every draw the value written before it.
pub(crate) struct GpuResources {
    pub pipelines: HashMap<ResourceHandle, GpuPipeline>,
    pub vertex_buffers: HashMap<ResourceHandle, wgpu::Buffer>,
    pub index_buffers: HashMap<ResourceHandle, wgpu::Buffer>,
    pub uniforms: HashMap<ResourceHandle, Vec<u8>>,
    pub textures: HashMap<ResourceHandle, GpuTexture>,

    /// Sampler paired with every texture slot.
    pub sampler: wgpu::Sampler,
    /// Bound to texture slots the pipeline reads but the caller left empty.
    pub white: GpuTexture,

    uniform_ring: Option<wgpu::Buffer>,
    uniform_ring_capacity: u64,
}

impl GpuResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("maya default sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_texture(device, queue, &[255; 4], 1, 1);

        Self {
            pipelines: HashMap::new(),
            vertex_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            uniforms: HashMap::new(),
            textures: HashMap::new(),
            sampler,
            white,
            uniform_ring: None,
            uniform_ring_capacity: 0,
        }
    }

    pub fn texture_view(&self, handle: Option<ResourceHandle>) -> &wgpu::TextureView {
        handle
            .and_then(|h| self.textures.get(&h))
            .map(|t| &t.view)
            .unwrap_or(&self.white.view)
    }

    /// Uploads the frame's uniform snapshots into the ring buffer, growing it
    /// when needed.
    pub fn upload_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        arena: &UniformArena,
    ) {
        if arena.is_empty() {
            return;
        }

        let required = arena.bytes.len() as u64;
        if required > self.uniform_ring_capacity || self.uniform_ring.is_none() {
            let capacity = required.next_power_of_two().max(4096);
            self.uniform_ring = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("maya frame uniforms"),
                size: capacity,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.uniform_ring_capacity = capacity;
            log::trace!("uniform ring grown to {capacity} bytes");
        }

        if let Some(ring) = &self.uniform_ring {
            queue.write_buffer(ring, 0, &arena.bytes);
        }
    }

    pub fn uniform_ring(&self) -> Option<&wgpu::Buffer> {
        self.uniform_ring.as_ref()
    }
}

pub(crate) fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage,
    })
}

pub(crate) fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("maya texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

/// Byte range of one uniform snapshot inside the frame arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct UniformRange {
    pub slot: u32,
    pub offset: u64,
    pub size: u64,
}

/// Per-frame staging for uniform snapshots.
///
/// Every entry starts on a multiple of the device's uniform offset alignment.
#[derive(Debug)]
pub(crate) struct UniformArena {
    bytes: Vec<u8>,
    align: usize,
}

impl UniformArena {
    pub fn new(align: u32) -> Self {
        Self {
            bytes: Vec::new(),
            align: (align as usize).max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn push(&mut self, slot: u32, data: &[u8]) -> UniformRange {
        let offset = self.bytes.len().next_multiple_of(self.align);
        self.bytes.resize(offset, 0);
        self.bytes.extend_from_slice(data);
        UniformRange {
            slot,
            offset: offset as u64,
            size: data.len() as u64,
        }
    }

    pub fn push_zeroed(&mut self, slot: u32, size: usize) -> UniformRange {
        let offset = self.bytes.len().next_multiple_of(self.align);
        self.bytes.resize(offset + size, 0);
        UniformRange {
            slot,
            offset: offset as u64,
            size: size as u64,
        }
    }
}
