//! Renderer configuration

use cgmath::Point3;

use crate::gfx::backend::ShaderSource;

/// Settings read once by [`Device`](crate::gfx::device::Device).
///
/// ```
/// use trellis::config::RendererConfig;
///
/// let config = RendererConfig::default()
///     .with_texture_slots(4)
///     .with_clear_color([0.0, 0.0, 0.0, 1.0]);
/// assert_eq!(config.texture_slots, 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Upper bound on simultaneously bound textures; the backend limit wins if lower
    pub texture_slots: usize,
    pub clear_color: [f32; 4],
    pub fovy_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub shader: ShaderSource,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            texture_slots: 8,
            clear_color: [0.2, 0.0, 0.2, 1.0],
            fovy_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            eye: Point3::new(0.0, 0.0, 5.0),
            target: Point3::new(0.0, 0.0, 0.0),
            shader: ShaderSource::simple(),
        }
    }
}

impl RendererConfig {
    pub fn with_texture_slots(mut self, texture_slots: usize) -> Self {
        self.texture_slots = texture_slots;
        self
    }

    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn with_fovy(mut self, fovy_degrees: f32) -> Self {
        self.fovy_degrees = fovy_degrees;
        self
    }

    pub fn with_depth_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_eye(mut self, eye: Point3<f32>, target: Point3<f32>) -> Self {
        self.eye = eye;
        self.target = target;
        self
    }

    pub fn with_shader(mut self, shader: ShaderSource) -> Self {
        self.shader = shader;
        self
    }
}
