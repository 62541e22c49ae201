use std::fmt;

/// Raw resource identifier minted by a graphics device.
///
/// `0` is reserved and never returned by a successful creation call.
pub type ResourceHandle = u32;

/// The reserved "no resource" value.
pub const INVALID_HANDLE: ResourceHandle = 0;

/// Resource categories tracked by a device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Pipeline,
    VertexBuffer,
    IndexBuffer,
    UniformBuffer,
    Texture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Pipeline => "pipeline",
            ResourceKind::VertexBuffer => "vertex buffer",
            ResourceKind::IndexBuffer => "index buffer",
            ResourceKind::UniformBuffer => "uniform buffer",
            ResourceKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(ResourceHandle);

        impl $name {
            pub const NONE: Self = Self(INVALID_HANDLE);
            pub const KIND: ResourceKind = $kind;

            /// Wraps a raw handle. Only devices mint meaningful values.
            #[inline]
            pub const fn from_raw(raw: ResourceHandle) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> ResourceHandle {
                self.0
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != INVALID_HANDLE
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", Self::KIND, self.0)
            }
        }
    };
}

typed_handle!(
    /// Compiled shader program plus fixed-function state.
    PipelineHandle => ResourceKind::Pipeline
);
typed_handle!(VertexBufferHandle => ResourceKind::VertexBuffer);
typed_handle!(
    /// Buffer of `u32` indices.
    IndexBufferHandle => ResourceKind::IndexBuffer
);
typed_handle!(UniformBufferHandle => ResourceKind::UniformBuffer);
typed_handle!(
    /// 2D RGBA8 texture sampled with the device's default sampler.
    TextureHandle => ResourceKind::Texture
);
