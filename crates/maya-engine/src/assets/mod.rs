//! Asset loading: file access and the OBJ model loader.

mod error;
mod fs;
mod obj;

pub use error::ModelError;
pub use fs::read_text;
pub use obj::{ObjIndex, load_obj, parse_obj};
