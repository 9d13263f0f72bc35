//! # Trellis Prelude
//!
//! Commonly used types in one import.
//!
//! ```rust
//! use trellis::prelude::*;
//! ```

// Configuration and logging
pub use crate::config::RendererConfig;
pub use crate::logging::{init_logging, LoggingConfig};

// Errors
pub use crate::error::{
    BackendError, ImageLoadError, MalformedModel, MeshLoadError, RenderError, SceneError,
    TextureError,
};

// Graphics
pub use crate::gfx::backend::{GraphicsBackend, HeadlessBackend, ShaderSource, WgpuBackend};
pub use crate::gfx::camera::{Camera, Projection};
pub use crate::gfx::device::Device;
pub use crate::gfx::resources::{
    FileImageDecoder, ImageData, ImageDecoder, Texture, TextureManager,
};
pub use crate::gfx::scene::{Mesh, NodeId, SceneNode, SceneTree};

// Re-export common external dependencies
pub use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3};
