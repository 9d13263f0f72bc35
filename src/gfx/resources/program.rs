//! Shader program wrapper with a per-program uniform location cache

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use cgmath::{Matrix4, Vector2, Vector3, Vector4};

use crate::{
    error::BackendError,
    gfx::backend::{GraphicsBackend, ShaderSource, UniformLocation, UniformValue},
};

/// A compiled and linked shader program.
///
/// Uniform locations are resolved through the backend on first use and
/// memoized for the lifetime of this program. Names the program does not
/// declare are remembered too: the first lookup logs a warning and every
/// upload to them is skipped.
pub struct Program<B: GraphicsBackend> {
    backend: Rc<B>,
    raw: B::Program,
    label: String,
    locations: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl<B: GraphicsBackend> Program<B> {
    pub fn new(backend: &Rc<B>, source: &ShaderSource) -> Result<Self, BackendError> {
        let raw = backend.compile_program(source)?;
        log::debug!("linked program `{}`", source.label);
        Ok(Self {
            backend: Rc::clone(backend),
            raw,
            label: source.label.clone(),
            locations: RefCell::new(HashMap::new()),
        })
    }

    pub fn use_program(&self) {
        self.backend.use_program(&self.raw);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &B::Program {
        &self.raw
    }

    fn location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.locations.borrow().get(name) {
            return *location;
        }

        let location = self.backend.uniform_location(&self.raw, name);
        if location.is_none() {
            log::warn!("program `{}` has no uniform named `{name}`", self.label);
        }
        self.locations
            .borrow_mut()
            .insert(name.to_owned(), location);
        location
    }

    /// Uploads `value` to the uniform called `name`
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) {
        if let Some(location) = self.location(name) {
            self.backend.set_uniform(&self.raw, location, value.into());
        }
    }

    pub fn uniform_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    pub fn uniform_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn uniform_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    pub fn uniform_vector2(&self, name: &str, value: Vector2<f32>) {
        self.set_uniform(name, UniformValue::Vec2(value.into()));
    }

    pub fn uniform_vector3(&self, name: &str, value: Vector3<f32>) {
        self.set_uniform(name, UniformValue::Vec3(value.into()));
    }

    pub fn uniform_vector4(&self, name: &str, value: Vector4<f32>) {
        self.set_uniform(name, UniformValue::Vec4(value.into()));
    }

    pub fn uniform_matrix(&self, name: &str, value: &Matrix4<f32>) {
        self.set_uniform(name, *value);
    }
}
