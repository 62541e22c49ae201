use bytemuck::{Pod, Zeroable};
use maya_math::{Vec2, Vec3, Vec4};

/// Vertex layout every pipeline is created against.
///
/// Shader locations: 0 position, 1 normal, 2 color, 3 uv.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Highest shader input location provided by the layout.
    pub const MAX_LOCATION: u32 = 3;

    pub const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x4, // color
        3 => Float32x2  // uv
    ];

    pub fn new(position: Vec3, normal: Vec3, color: Vec4, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color: color.to_array(),
            uv: uv.to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
