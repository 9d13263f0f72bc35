pub mod perspective_camera;

pub use perspective_camera::{Camera, Projection, OPENGL_TO_WGPU_MATRIX};
