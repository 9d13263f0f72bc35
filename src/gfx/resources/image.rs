//! Decoded image data and the decoding collaborator

use std::path::Path;

use crate::error::ImageLoadError;

/// Raw RGBA8 pixels plus dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    /// Wraps `pixels`, checking there are exactly `4 * width * height` bytes
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, ImageLoadError> {
        let expected = 4 * width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ImageLoadError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Image filled with a single colour
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(4 * width as usize * height as usize)
            .collect();
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Turns an image file into raw pixels
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImageData, ImageLoadError>;
}

/// Decoder backed by the `image` crate; every format is converted to RGBA8
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageDecoder;

impl ImageDecoder for FileImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImageData, ImageLoadError> {
        let image = image::open(path).map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("decoded {} ({width}x{height})", path.display());
        ImageData::new(rgba.into_raw(), width, height)
    }
}
