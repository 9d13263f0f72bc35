//! # GPU resource management
//!
//! RAII wrappers over backend handles plus the texture slot allocator.
//!
//! - [`Buffer`] - vertex or index buffer
//! - [`Program`] - linked shader program with memoized uniform locations
//! - [`Texture`] - 2D texture created from decoded pixels
//! - [`TextureManager`] - maps texture names onto a bounded set of binding slots
//! - [`TextureResource`] - the raw wgpu texture, view and sampler used by the wgpu backend

pub mod buffer;
pub mod image;
pub mod program;
pub mod texture;
pub mod texture_manager;
pub mod texture_resource;

pub use buffer::Buffer;
pub use image::{FileImageDecoder, ImageData, ImageDecoder};
pub use program::Program;
pub use texture::Texture;
pub use texture_manager::TextureManager;
pub use texture_resource::TextureResource;
