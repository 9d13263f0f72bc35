use std::rc::Rc;

use crate::gfx::backend::{BufferKind, GraphicsBackend};

/// A single GPU buffer; the backend resource is released when this is dropped
pub struct Buffer<B: GraphicsBackend> {
    backend: Rc<B>,
    raw: B::Buffer,
    kind: BufferKind,
}

impl<B: GraphicsBackend> Buffer<B> {
    pub fn new(backend: &Rc<B>, kind: BufferKind, label: &str) -> Self {
        Self {
            raw: backend.create_buffer(kind, label),
            backend: Rc::clone(backend),
            kind,
        }
    }

    pub fn bind(&self) {
        self.backend.bind_buffer(&self.raw);
    }

    pub fn unbind(&self) {
        self.backend.unbind_buffer(self.kind);
    }

    /// Binds, replaces the buffer contents with `bytes`, and unbinds
    pub fn upload(&self, bytes: &[u8]) {
        self.bind();
        self.backend.upload_buffer(&self.raw, bytes);
        self.unbind();
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn raw(&self) -> &B::Buffer {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{Command, HeadlessBackend};

    #[test]
    fn test_upload_is_bracketed_by_bind_and_unbind() {
        let backend = Rc::new(HeadlessBackend::new(1));
        let buffer = Buffer::new(&backend, BufferKind::Vertex, "positions");
        backend.take_commands();

        buffer.upload(&[0u8; 12]);

        let id = buffer.raw().id();
        assert_eq!(
            backend.commands(),
            vec![
                Command::BindBuffer(id),
                Command::UploadBuffer { id, len: 12 },
                Command::UnbindBuffer(BufferKind::Vertex),
            ]
        );
    }
}
