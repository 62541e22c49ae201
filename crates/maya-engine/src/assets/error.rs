use std::path::PathBuf;

use thiserror::Error;

use crate::rhi::DeviceError;

/// Errors produced while loading a model.
///
/// Parse errors carry the 1-based source line.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {kind} index {index} out of range (have {count})")]
    IndexOutOfRange {
        line: usize,
        kind: &'static str,
        index: i64,
        count: usize,
    },

    #[error("line {line}: face has {corners} corners, only triangles are supported")]
    NonTriangle { line: usize, corners: usize },

    #[error("model contains no faces")]
    Empty,

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl ModelError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ModelError::Parse {
            line,
            message: message.into(),
        }
    }
}
