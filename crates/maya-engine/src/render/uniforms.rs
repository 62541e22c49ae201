use bytemuck::{Pod, Zeroable};
use maya_math::Mat4;

use crate::rhi::{DeviceError, GraphicsDevice, UniformBufferHandle};

/// Per-object transform block, column-major, matching `Transforms` in
/// `shaders/mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformUniforms {
    pub model: [f32; 16],
    pub view: [f32; 16],
    pub projection: [f32; 16],
}

impl Default for TransformUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

impl TransformUniforms {
    pub const SIZE: usize = std::mem::size_of::<TransformUniforms>();

    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model: model.to_cols_array(),
            view: view.to_cols_array(),
            projection: projection.to_cols_array(),
        }
    }
}

/// Device-side uniform buffer holding one `TransformUniforms`.
#[derive(Debug, Copy, Clone)]
pub struct TransformBuffer {
    handle: UniformBufferHandle,
}

impl TransformBuffer {
    pub fn new(device: &mut dyn GraphicsDevice) -> Result<Self, DeviceError> {
        let handle = device.create_uniform_buffer(TransformUniforms::SIZE)?;
        Ok(Self { handle })
    }

    pub fn handle(&self) -> UniformBufferHandle {
        self.handle
    }

    pub fn write(
        &self,
        device: &mut dyn GraphicsDevice,
        uniforms: &TransformUniforms,
    ) -> Result<(), DeviceError> {
        device.update_uniform_buffer(self.handle, bytemuck::bytes_of(uniforms))
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice, slot: u32) -> Result<(), DeviceError> {
        device.bind_uniform_buffer(self.handle, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maya_math::Vec3;

    #[test]
    fn block_is_three_matrices() {
        assert_eq!(TransformUniforms::SIZE, 192);
    }

    #[test]
    fn matrices_are_column_major() {
        let u = TransformUniforms::new(
            Mat4::translate(Vec3::new(1.0, 2.0, 3.0)),
            Mat4::IDENTITY,
            Mat4::IDENTITY,
        );
        assert_eq!(&u.model[12..15], &[1.0, 2.0, 3.0]);
    }
}
