//! Render hardware interface.
//!
//! Engine code talks to the GPU only through [`GraphicsDevice`] and the opaque
//! handles it mints. Two backends implement it:
//! - [`WgpuDevice`]: the platform backend
//! - [`NullDevice`]: CPU-only bookkeeping with identical validation, for tests
//!   and tools
//!
//! Both share [`DeviceTracker`], which owns the lifecycle state machine, the
//! handle counter and slot bindings, so usage errors are reported the same way
//! regardless of backend.

mod commands;
mod device;
mod error;
mod gpu;
mod handle;
mod null;
pub mod shader;
mod state;
mod vertex;

pub use commands::{Bindings, DrawCall, MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS, MAX_VERTEX_SLOTS};
pub use device::{DeviceState, GraphicsDevice, NativeWindow};
pub use error::{DeviceError, SurfaceErrorAction};
pub use gpu::{GpuInit, WgpuDevice};
pub use handle::{
    INVALID_HANDLE, IndexBufferHandle, PipelineHandle, ResourceHandle, ResourceKind,
    TextureHandle, UniformBufferHandle, VertexBufferHandle,
};
pub use null::NullDevice;
pub use state::{DeviceLimits, DeviceTracker};
pub use vertex::Vertex;

/// Creates the backend for the current build target.
pub fn create_default(init: GpuInit) -> Box<dyn GraphicsDevice> {
    Box::new(WgpuDevice::new(init))
}
