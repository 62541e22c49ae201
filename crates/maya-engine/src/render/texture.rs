use std::path::Path;

use thiserror::Error;

use crate::rhi::{DeviceError, GraphicsDevice, TextureHandle};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Uploaded RGBA8 texture. Holds the handle only.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Texture {
    handle: TextureHandle,
    width: u32,
    height: u32,
}

impl Texture {
    /// Uploads tightly packed RGBA8 pixels.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        rgba: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Self, DeviceError> {
        let handle = device.create_texture(rgba, width, height)?;
        log::debug!("texture uploaded: {width}x{height} ({handle})");
        Ok(Self {
            handle,
            width,
            height,
        })
    }

    /// 1x1 texture of a single color.
    pub fn solid(device: &mut dyn GraphicsDevice, rgba: [u8; 4]) -> Result<Self, DeviceError> {
        Self::new(device, &rgba, 1, 1)
    }

    /// Two-color checkerboard with `cell`-pixel squares.
    pub fn checkerboard(
        device: &mut dyn GraphicsDevice,
        size: u32,
        cell: u32,
        a: [u8; 4],
        b: [u8; 4],
    ) -> Result<Self, DeviceError> {
        let pixels = checkerboard_pixels(size, cell, a, b);
        Self::new(device, &pixels, size, size)
    }

    /// Decodes a PNG or JPEG file and uploads it as RGBA8.
    pub fn from_image_file(
        device: &mut dyn GraphicsDevice,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self::new(device, image.as_raw(), width, height)?)
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice, slot: u32) -> Result<(), DeviceError> {
        device.bind_texture(self.handle, slot)
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn checkerboard_pixels(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let even = (x / cell + y / cell) % 2 == 0;
            pixels.extend_from_slice(if even { &a } else { &b });
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::{NativeWindow, NullDevice};

    #[test]
    fn checkerboard_alternates_cells() {
        let px = checkerboard_pixels(4, 2, [255; 4], [0, 0, 0, 255]);
        assert_eq!(px.len(), 64);
        let at = |x: usize, y: usize| &px[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(at(0, 0), &[255; 4]);
        assert_eq!(at(1, 1), &[255; 4]);
        assert_eq!(at(2, 0), &[0, 0, 0, 255]);
        assert_eq!(at(2, 2), &[255; 4]);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        let mut device = NullDevice::new();
        device.initialize(NativeWindow::Headless).unwrap();
        let err = Texture::new(&mut device, &[0; 12], 2, 2).unwrap_err();
        assert!(matches!(err, DeviceError::SizeMismatch { expected: 16, actual: 12, .. }));
    }

    #[test]
    fn missing_image_file_reports_path() {
        let mut device = NullDevice::new();
        device.initialize(NativeWindow::Headless).unwrap();
        let err = Texture::from_image_file(&mut device, "does/not/exist.png").unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
        assert!(err.to_string().contains("does/not/exist.png"));
    }
}
