use thiserror::Error;

use super::handle::{ResourceHandle, ResourceKind};

/// Errors reported by a [`GraphicsDevice`](super::GraphicsDevice).
///
/// Setup failures (`Setup`, `Surface`) are fatal to the run. Usage errors
/// leave the device untouched: no call that returns an error has a partial
/// effect.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device setup failed: {0}")]
    Setup(String),

    #[error("device is not initialized")]
    NotInitialized,

    #[error("device is already initialized")]
    AlreadyInitialized,

    #[error("`{op}` called outside of begin_frame/end_frame")]
    NotRecording { op: &'static str },

    #[error("begin_frame called while a frame is already recording")]
    FrameInProgress,

    #[error("shader rejected: {0}")]
    Shader(String),

    #[error("unknown {kind} handle {handle}")]
    UnknownHandle {
        kind: ResourceKind,
        handle: ResourceHandle,
    },

    #[error("{kind} slot {slot} out of range (limit {limit})")]
    SlotOutOfRange {
        kind: ResourceKind,
        slot: u32,
        limit: u32,
    },

    #[error("{kind} data is empty")]
    EmptyData { kind: ResourceKind },

    #[error("{kind} size {len} is not a multiple of {align} bytes")]
    Misaligned {
        kind: ResourceKind,
        len: usize,
        align: usize,
    },

    #[error("{kind} size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        kind: ResourceKind,
        expected: usize,
        actual: usize,
    },

    #[error("invalid texture extent {width}x{height}")]
    InvalidExtent { width: u32, height: u32 },

    #[error("texture extent {width}x{height} exceeds the device limit of {max}")]
    ExtentTooLarge { width: u32, height: u32, max: u32 },

    #[error("{kind} of {len} bytes exceeds the device limit of {max}")]
    TooLarge {
        kind: ResourceKind,
        len: usize,
        max: usize,
    },

    #[error("index count {requested} exceeds index buffer length {available}")]
    IndexCountOutOfRange { requested: u32, available: u32 },

    #[error("draw_indexed requires a bound pipeline")]
    NoPipeline,

    #[error("draw_indexed requires a vertex buffer in slot 0")]
    NoVertexBuffer,

    #[error("uniform slot {slot} holds {actual} bytes but the pipeline reads {required}")]
    UniformTooSmall {
        slot: u32,
        required: usize,
        actual: usize,
    },

    #[error("surface failure: {0}")]
    Surface(String),
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}
