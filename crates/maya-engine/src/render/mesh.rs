use maya_math::{Vec2, Vec3, Vec4};

use crate::rhi::{
    DeviceError, GraphicsDevice, IndexBufferHandle, ResourceKind, Vertex, VertexBufferHandle,
};

/// CPU-side geometry: vertices plus `u32` triangle-list indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit cube centered on the origin, 24 vertices with per-face normals
    /// and uvs, counter-clockwise winding seen from outside.
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (n, u, v) in FACES {
            let (n, u, v) = (Vec3::from(n), Vec3::from(u), Vec3::from(v));
            let base = vertices.len() as u32;
            for (su, sv) in CORNERS {
                let position = (n + u * su + v * sv) * 0.5;
                let uv = Vec2::new((su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5);
                vertices.push(Vertex::new(position, n, Vec4::ONE, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }
}

/// Uploaded geometry. Holds handles only; the device owns the buffers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Mesh {
    vertex_buffer: VertexBufferHandle,
    index_buffer: IndexBufferHandle,
    index_count: u32,
}

impl Mesh {
    /// Uploads `vertices` and `indices`. Nothing is uploaded if either is
    /// empty.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self, DeviceError> {
        if vertices.is_empty() {
            return Err(DeviceError::EmptyData {
                kind: ResourceKind::VertexBuffer,
            });
        }
        if indices.is_empty() {
            return Err(DeviceError::EmptyData {
                kind: ResourceKind::IndexBuffer,
            });
        }

        let vertex_buffer = device.create_vertex_buffer(bytemuck::cast_slice(vertices))?;
        let index_buffer = device.create_index_buffer(bytemuck::cast_slice(indices))?;

        log::debug!(
            "mesh uploaded: {} vertices, {} indices ({vertex_buffer}, {index_buffer})",
            vertices.len(),
            indices.len()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    pub fn from_data(
        device: &mut dyn GraphicsDevice,
        data: &MeshData,
    ) -> Result<Self, DeviceError> {
        Self::new(device, &data.vertices, &data.indices)
    }

    /// Binds the vertex buffer to slot 0 and draws every index.
    pub fn draw(&self, device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.bind_vertex_buffer(self.vertex_buffer, 0)?;
        device.draw_indexed(self.index_buffer, self.index_count)
    }

    pub fn vertex_buffer(&self) -> VertexBufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> IndexBufferHandle {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::{NativeWindow, NullDevice};

    #[test]
    fn cube_has_six_quads() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = MeshData::cube();
        for tri in cube.indices.chunks(3) {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| Vec3::from(cube.vertices[i as usize].position));
            let n = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn empty_indices_upload_nothing() {
        let mut device = NullDevice::new();
        device.initialize(NativeWindow::Headless).unwrap();

        let cube = MeshData::cube();
        let err = Mesh::new(&mut device, &cube.vertices, &[]).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::EmptyData {
                kind: ResourceKind::IndexBuffer
            }
        ));
        assert_eq!(device.resource_count(), 0);
    }

    #[test]
    fn draw_records_slot_zero() {
        let mut device = NullDevice::new();
        device.initialize(NativeWindow::Headless).unwrap();
        device.create_pipeline(crate::render::MESH_SHADER).unwrap();

        let mesh = Mesh::from_data(&mut device, &MeshData::cube()).unwrap();
        let transforms = crate::render::TransformBuffer::new(&mut device).unwrap();
        let white = crate::render::Texture::solid(&mut device, [255; 4]).unwrap();

        device.begin_frame().unwrap();
        transforms.bind(&mut device, 0).unwrap();
        white.bind(&mut device, 0).unwrap();
        mesh.draw(&mut device).unwrap();
        device.end_frame().unwrap();

        let frame = device.last_frame().unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].bindings.vertex_buffer(0), Some(mesh.vertex_buffer()));
        assert_eq!(frame[0].index_count, 36);
    }
}
