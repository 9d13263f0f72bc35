use std::{path::Path, rc::Rc};

use crate::{
    error::ImageLoadError,
    gfx::{
        backend::GraphicsBackend,
        resources::image::{ImageData, ImageDecoder},
    },
};

/// A 2D texture owned by the backend, created from decoded pixels
pub struct Texture<B: GraphicsBackend> {
    backend: Rc<B>,
    raw: B::Texture,
    size: (u32, u32),
}

impl<B: GraphicsBackend> Texture<B> {
    pub fn from_image(backend: &Rc<B>, image: &ImageData, label: &str) -> Self {
        Self {
            raw: backend.create_texture(image, label),
            backend: Rc::clone(backend),
            size: image.size(),
        }
    }

    /// Decodes `path` with `decoder` and uploads the pixels
    pub fn from_file(
        backend: &Rc<B>,
        decoder: &dyn ImageDecoder,
        path: impl AsRef<Path>,
    ) -> Result<Self, ImageLoadError> {
        let path = path.as_ref();
        let image = decoder.decode(path)?;
        Ok(Self::from_image(backend, &image, &path.display().to_string()))
    }

    /// Binds this texture at hardware slot `slot`
    pub fn bind(&self, slot: usize) {
        self.backend.bind_texture(&self.raw, slot);
    }

    pub fn unbind(&self, slot: usize) {
        self.backend.unbind_texture(slot);
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn raw(&self) -> &B::Texture {
        &self.raw
    }
}
