//! Recording backend
//!
//! Executes nothing on a GPU: every call is appended to a command log and
//! buffer uploads are kept in memory. Resource ids are sequential and
//! dropping a handle records its deletion, so resource lifetimes can be
//! asserted on directly.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{error::BackendError, gfx::resources::image::ImageData};

use super::{
    BufferKind, GraphicsBackend, ShaderSource, UniformKind, UniformLocation, UniformValue,
    VertexAttribute,
};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer { id: u32, kind: BufferKind, label: String },
    BindBuffer(u32),
    UnbindBuffer(BufferKind),
    UploadBuffer { id: u32, len: usize },
    DeleteBuffer(u32),
    CreateTexture { id: u32, width: u32, height: u32 },
    BindTexture { id: u32, slot: usize },
    UnbindTexture { slot: usize },
    DeleteTexture(u32),
    CompileProgram { id: u32, label: String },
    UseProgram(u32),
    QueryUniform { program: u32, name: String },
    SetUniform { program: u32, name: String, value: UniformValue },
    DeleteProgram(u32),
    /// `(shader_location, buffer id, components)` per attribute
    CreateVertexArray { id: u32, attributes: Vec<(u32, u32, u32)> },
    DeleteVertexArray(u32),
    DrawIndexedTriangles {
        vertex_array: u32,
        index_buffer: u32,
        count: u32,
        /// Texture id bound at each slot when the draw was issued
        textures: Vec<Option<u32>>,
    },
    ClearFrame([f32; 4]),
}

#[derive(Debug, Default)]
struct State {
    commands: Vec<Command>,
    next_id: u32,
    slots: Vec<Option<u32>>,
    buffer_contents: HashMap<u32, Vec<u8>>,
}

impl State {
    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, command: Command) {
        log::trace!("headless: {command:?}");
        self.commands.push(command);
    }
}

type SharedState = Rc<RefCell<State>>;

pub struct HeadlessBuffer {
    id: u32,
    state: SharedState,
}

impl HeadlessBuffer {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.buffer_contents.remove(&self.id);
        state.record(Command::DeleteBuffer(self.id));
    }
}

pub struct HeadlessTexture {
    id: u32,
    state: SharedState,
}

impl HeadlessTexture {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.state.borrow_mut().record(Command::DeleteTexture(self.id));
    }
}

pub struct HeadlessProgram {
    id: u32,
    uniforms: Vec<(String, UniformKind)>,
    state: SharedState,
}

impl HeadlessProgram {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for HeadlessProgram {
    fn drop(&mut self) {
        self.state.borrow_mut().record(Command::DeleteProgram(self.id));
    }
}

pub struct HeadlessVertexArray {
    id: u32,
    state: SharedState,
}

impl HeadlessVertexArray {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Drop for HeadlessVertexArray {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .record(Command::DeleteVertexArray(self.id));
    }
}

/// Backend that records instead of rendering
pub struct HeadlessBackend {
    state: SharedState,
    max_texture_slots: usize,
}

impl HeadlessBackend {
    pub fn new(max_texture_slots: usize) -> Self {
        let state = State {
            slots: vec![None; max_texture_slots],
            ..Default::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            max_texture_slots,
        }
    }

    /// Snapshot of every call recorded so far
    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Drains the command log
    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// Bytes most recently uploaded into a live buffer
    pub fn buffer_contents(&self, buffer: &HeadlessBuffer) -> Option<Vec<u8>> {
        self.state.borrow().buffer_contents.get(&buffer.id).cloned()
    }

    /// Texture id currently bound at each slot
    pub fn bound_textures(&self) -> Vec<Option<u32>> {
        self.state.borrow().slots.clone()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(8)
    }
}

impl GraphicsBackend for HeadlessBackend {
    type Buffer = HeadlessBuffer;
    type Texture = HeadlessTexture;
    type Program = HeadlessProgram;
    type VertexArray = HeadlessVertexArray;

    fn create_buffer(&self, kind: BufferKind, label: &str) -> HeadlessBuffer {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        state.record(Command::CreateBuffer {
            id,
            kind,
            label: label.to_owned(),
        });
        HeadlessBuffer {
            id,
            state: Rc::clone(&self.state),
        }
    }

    fn bind_buffer(&self, buffer: &HeadlessBuffer) {
        self.state
            .borrow_mut()
            .record(Command::BindBuffer(buffer.id));
    }

    fn unbind_buffer(&self, kind: BufferKind) {
        self.state.borrow_mut().record(Command::UnbindBuffer(kind));
    }

    fn upload_buffer(&self, buffer: &HeadlessBuffer, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.buffer_contents.insert(buffer.id, bytes.to_vec());
        state.record(Command::UploadBuffer {
            id: buffer.id,
            len: bytes.len(),
        });
    }

    fn create_texture(&self, image: &ImageData, _label: &str) -> HeadlessTexture {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        state.record(Command::CreateTexture {
            id,
            width: image.width,
            height: image.height,
        });
        HeadlessTexture {
            id,
            state: Rc::clone(&self.state),
        }
    }

    fn bind_texture(&self, texture: &HeadlessTexture, slot: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.slots.get_mut(slot) {
            *entry = Some(texture.id);
        }
        state.record(Command::BindTexture {
            id: texture.id,
            slot,
        });
    }

    fn unbind_texture(&self, slot: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.slots.get_mut(slot) {
            *entry = None;
        }
        state.record(Command::UnbindTexture { slot });
    }

    fn compile_program(&self, source: &ShaderSource) -> Result<HeadlessProgram, BackendError> {
        if source.code.trim().is_empty() {
            return Err(BackendError::ShaderCompile {
                label: source.label.clone(),
                message: "empty shader module".to_owned(),
            });
        }

        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        state.record(Command::CompileProgram {
            id,
            label: source.label.clone(),
        });
        Ok(HeadlessProgram {
            id,
            uniforms: source.uniforms.clone(),
            state: Rc::clone(&self.state),
        })
    }

    fn use_program(&self, program: &HeadlessProgram) {
        self.state
            .borrow_mut()
            .record(Command::UseProgram(program.id));
    }

    fn uniform_location(&self, program: &HeadlessProgram, name: &str) -> Option<UniformLocation> {
        self.state.borrow_mut().record(Command::QueryUniform {
            program: program.id,
            name: name.to_owned(),
        });
        program
            .uniforms
            .iter()
            .position(|(field, _)| field == name)
            .map(|index| UniformLocation(index as u32))
    }

    fn set_uniform(&self, program: &HeadlessProgram, location: UniformLocation, value: UniformValue) {
        let Some((name, kind)) = program.uniforms.get(location.0 as usize) else {
            log::warn!("headless: program {} has no uniform at {location:?}", program.id);
            return;
        };
        if *kind != value.kind() {
            log::warn!("headless: uniform `{name}` is {kind:?}, got {:?}", value.kind());
        }
        self.state.borrow_mut().record(Command::SetUniform {
            program: program.id,
            name: name.clone(),
            value,
        });
    }

    fn create_vertex_array(
        &self,
        attributes: &[VertexAttribute<'_, HeadlessBuffer>],
    ) -> HeadlessVertexArray {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        let attributes = attributes
            .iter()
            .map(|attribute| {
                (
                    attribute.shader_location,
                    attribute.buffer.id,
                    attribute.components,
                )
            })
            .collect();
        state.record(Command::CreateVertexArray { id, attributes });
        HeadlessVertexArray {
            id,
            state: Rc::clone(&self.state),
        }
    }

    fn draw_indexed_triangles(
        &self,
        vertex_array: &HeadlessVertexArray,
        index_buffer: &HeadlessBuffer,
        count: u32,
    ) {
        let mut state = self.state.borrow_mut();
        let textures = state.slots.clone();
        state.record(Command::DrawIndexedTriangles {
            vertex_array: vertex_array.id,
            index_buffer: index_buffer.id,
            count,
            textures,
        });
    }

    fn clear_frame(&self, color: [f32; 4]) {
        self.state.borrow_mut().record(Command::ClearFrame(color));
    }

    fn max_texture_slots(&self) -> usize {
        self.max_texture_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_handles_records_deletion() {
        let backend = HeadlessBackend::new(2);
        let buffer = backend.create_buffer(BufferKind::Vertex, "positions");
        let id = buffer.id();
        drop(buffer);

        let commands = backend.commands();
        assert_eq!(commands.last(), Some(&Command::DeleteBuffer(id)));
    }

    #[test]
    fn test_upload_keeps_latest_contents() {
        let backend = HeadlessBackend::new(2);
        let buffer = backend.create_buffer(BufferKind::Index, "indices");
        backend.upload_buffer(&buffer, &[1, 2, 3]);
        backend.upload_buffer(&buffer, &[4]);
        assert_eq!(backend.buffer_contents(&buffer), Some(vec![4]));
    }

    #[test]
    fn test_empty_program_fails_to_compile() {
        let backend = HeadlessBackend::new(2);
        let result = backend.compile_program(&ShaderSource::wgsl("Empty", "  "));
        assert!(matches!(result, Err(BackendError::ShaderCompile { .. })));
    }

    #[test]
    fn test_draw_snapshots_bound_slots() {
        let backend = HeadlessBackend::new(2);
        let texture = backend.create_texture(&ImageData::solid(1, 1, [255; 4]), "white");
        let index_buffer = backend.create_buffer(BufferKind::Index, "indices");
        let vertex_array = backend.create_vertex_array(&[]);
        backend.bind_texture(&texture, 1);
        backend.draw_indexed_triangles(&vertex_array, &index_buffer, 3);

        let draw = backend
            .commands()
            .into_iter()
            .find(|command| matches!(command, Command::DrawIndexedTriangles { .. }));
        assert_eq!(
            draw,
            Some(Command::DrawIndexedTriangles {
                vertex_array: vertex_array.id,
                index_buffer: index_buffer.id(),
                count: 3,
                textures: vec![None, Some(texture.id())],
            })
        );
    }
}
