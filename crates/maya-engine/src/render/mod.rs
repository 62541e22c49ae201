//! Renderable resources built on the RHI.
//!
//! These wrappers hold handles, never the device. Every call takes the device
//! explicitly, so a mesh or texture can outlive a device shutdown (its handles
//! then resolve to `UnknownHandle`).
//!
//! Binding convention shared with the bundled shader:
//! - uniform slot 0: [`TransformUniforms`]
//! - texture slot 0: albedo
//! - vertex slot 0: [`Vertex`](crate::rhi::Vertex) stream

mod mesh;
mod texture;
mod uniforms;

pub use mesh::{Mesh, MeshData};
pub use texture::{Texture, TextureError};
pub use uniforms::{TransformBuffer, TransformUniforms};

/// Lambert-lit, textured, vertex-colored shader for [`Vertex`](crate::rhi::Vertex)
/// meshes.
pub const MESH_SHADER: &str = include_str!("shaders/mesh.wgsl");
