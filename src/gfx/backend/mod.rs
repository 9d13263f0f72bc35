//! Graphics backend abstraction
//!
//! The core never creates a context or window. It receives an
//! already-initialized backend and talks to it through [`GraphicsBackend`].
//! Every handle type owns exactly one backend resource and releases it when
//! dropped.
//!
//! Two backends ship with the crate:
//! - [`WgpuBackend`] renders through an existing `wgpu::Device`/`wgpu::Queue`
//! - [`HeadlessBackend`] records every call, for tests and GPU-less runs

pub mod headless;
pub mod wgpu_backend;

pub use headless::{Command, HeadlessBackend};
pub use wgpu_backend::WgpuBackend;

use crate::{error::BackendError, gfx::resources::image::ImageData};

/// What a buffer will be bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex attribute data
    Vertex,
    /// `u32` triangle indices
    Index,
}

/// Backend-resolved handle to a uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Type of a uniform declared by a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

/// A value uploaded to a program uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

impl From<cgmath::Matrix4<f32>> for UniformValue {
    fn from(matrix: cgmath::Matrix4<f32>) -> Self {
        UniformValue::Mat4(matrix.into())
    }
}

impl From<cgmath::Vector3<f32>> for UniformValue {
    fn from(vector: cgmath::Vector3<f32>) -> Self {
        UniformValue::Vec3(vector.into())
    }
}

/// Shader program source: one WGSL module with `vs_main`/`fs_main` entry
/// points, plus the fields of its uniform block in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub label: String,
    pub code: String,
    pub uniforms: Vec<(String, UniformKind)>,
}

impl ShaderSource {
    pub fn wgsl(label: &str, code: &str) -> Self {
        Self {
            label: label.to_owned(),
            code: code.to_owned(),
            uniforms: Vec::new(),
        }
    }

    /// Builder pattern: declare the next field of the uniform block
    pub fn with_uniform(mut self, name: &str, kind: UniformKind) -> Self {
        self.uniforms.push((name.to_owned(), kind));
        self
    }

    /// Built-in program: `projection * view * model` with slot 0 as albedo
    pub fn simple() -> Self {
        Self::wgsl("Simple", include_str!("../shaders/simple.wgsl"))
            .with_uniform("projection", UniformKind::Mat4)
            .with_uniform("view", UniformKind::Mat4)
            .with_uniform("model", UniformKind::Mat4)
    }
}

/// One per-vertex attribute stream fed from a buffer
pub struct VertexAttribute<'a, Buf> {
    pub shader_location: u32,
    /// Number of `f32` components per vertex (2 or 3)
    pub components: u32,
    pub buffer: &'a Buf,
}

/// The capability set the core consumes from a graphics API.
///
/// All methods take `&self`; backends are driven from a single rendering
/// thread and keep their mutable state behind interior mutability.
pub trait GraphicsBackend {
    type Buffer;
    type Texture;
    type Program;
    type VertexArray;

    fn create_buffer(&self, kind: BufferKind, label: &str) -> Self::Buffer;
    fn bind_buffer(&self, buffer: &Self::Buffer);
    fn unbind_buffer(&self, kind: BufferKind);
    fn upload_buffer(&self, buffer: &Self::Buffer, bytes: &[u8]);

    fn create_texture(&self, image: &ImageData, label: &str) -> Self::Texture;
    fn bind_texture(&self, texture: &Self::Texture, slot: usize);
    fn unbind_texture(&self, slot: usize);

    /// Compiles and links a program
    fn compile_program(&self, source: &ShaderSource) -> Result<Self::Program, BackendError>;
    fn use_program(&self, program: &Self::Program);
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, program: &Self::Program, location: UniformLocation, value: UniformValue);

    fn create_vertex_array(
        &self,
        attributes: &[VertexAttribute<'_, Self::Buffer>],
    ) -> Self::VertexArray;
    fn draw_indexed_triangles(
        &self,
        vertex_array: &Self::VertexArray,
        index_buffer: &Self::Buffer,
        count: u32,
    );

    fn clear_frame(&self, color: [f32; 4]);

    /// Number of texture binding slots usable at once
    fn max_texture_slots(&self) -> usize;
}
