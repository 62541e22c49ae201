use std::io;
use std::path::Path;

/// Reads a whole UTF-8 text file.
pub fn read_text(path: impl AsRef<Path>) -> io::Result<String> {
    std::fs::read_to_string(path)
}
