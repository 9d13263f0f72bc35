//! # Mesh
//!
//! GPU-resident triangle geometry built once from an OBJ model, plus the
//! ordered list of texture names bound while it is drawn.

use std::{fs, path::Path, rc::Rc};

use cgmath::Matrix4;

use crate::{
    error::{MeshLoadError, TextureError},
    gfx::{
        backend::{BufferKind, GraphicsBackend, VertexAttribute},
        resources::{Buffer, Program, TextureManager},
        scene::{
            obj::parse_obj,
            vertex::{MeshAttributes, NORMAL_LOCATION, POSITION_LOCATION, TEXCOORD_LOCATION},
        },
    },
};

/// Immutable geometry in four buffers (positions, normals, texcoords, indices).
///
/// A mesh is usually shared between several scene nodes through an `Rc`; its
/// GPU resources are released when the last reference is dropped.
pub struct Mesh<B: GraphicsBackend> {
    backend: Rc<B>,
    // Dropped before the buffers it references
    vertex_array: B::VertexArray,
    positions: Buffer<B>,
    normals: Buffer<B>,
    texcoords: Buffer<B>,
    indices: Buffer<B>,
    index_count: u32,
    textures: Vec<String>,
    label: String,
}

impl<B: GraphicsBackend> Mesh<B> {
    /// Reads and parses an OBJ file
    pub fn from_file(backend: &Rc<B>, path: impl AsRef<Path>) -> Result<Self, MeshLoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| MeshLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_obj_source(backend, &path.display().to_string(), &source)
    }

    /// Parses OBJ text held in memory; `label` names the mesh in errors and logs
    pub fn from_obj_source(
        backend: &Rc<B>,
        label: &str,
        source: &str,
    ) -> Result<Self, MeshLoadError> {
        let model = parse_obj(source).map_err(|source| MeshLoadError::Malformed {
            origin: label.to_owned(),
            source,
        })?;
        Ok(Self::from_attributes(
            backend,
            label,
            &MeshAttributes::flatten(&model),
        ))
    }

    pub fn from_attributes(backend: &Rc<B>, label: &str, attributes: &MeshAttributes) -> Self {
        let positions = Buffer::new(backend, BufferKind::Vertex, &format!("{label} Positions"));
        positions.upload(bytemuck::cast_slice(&attributes.positions));

        let normals = Buffer::new(backend, BufferKind::Vertex, &format!("{label} Normals"));
        normals.upload(bytemuck::cast_slice(&attributes.normals));

        let texcoords = Buffer::new(backend, BufferKind::Vertex, &format!("{label} Texcoords"));
        texcoords.upload(bytemuck::cast_slice(&attributes.texcoords));

        let indices = Buffer::new(backend, BufferKind::Index, &format!("{label} Indices"));
        indices.upload(bytemuck::cast_slice(&attributes.indices));

        let vertex_array = backend.create_vertex_array(&[
            VertexAttribute {
                shader_location: POSITION_LOCATION,
                components: 3,
                buffer: positions.raw(),
            },
            VertexAttribute {
                shader_location: NORMAL_LOCATION,
                components: 3,
                buffer: normals.raw(),
            },
            VertexAttribute {
                shader_location: TEXCOORD_LOCATION,
                components: 2,
                buffer: texcoords.raw(),
            },
        ]);

        let index_count = attributes.indices.len() as u32;
        log::info!("loaded mesh `{label}` ({index_count} indices)");

        Self {
            backend: Rc::clone(backend),
            vertex_array,
            positions,
            normals,
            texcoords,
            indices,
            index_count,
            textures: Vec::new(),
            label: label.to_owned(),
        }
    }

    /// Replaces the texture names bound when drawing.
    ///
    /// Names are only checked against the texture manager at draw time.
    pub fn set_textures<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.textures = names.into_iter().map(Into::into).collect();
    }

    pub fn textures(&self) -> &[String] {
        &self.textures
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Draws the mesh with `model` as its world transform.
    ///
    /// Every slot of `texture_manager` is freed before and after the draw,
    /// including when enabling one of this mesh's textures fails.
    pub fn draw(
        &self,
        program: &Program<B>,
        texture_manager: &mut TextureManager<B>,
        model: &Matrix4<f32>,
    ) -> Result<(), TextureError> {
        texture_manager.disable_all();
        for name in &self.textures {
            if let Err(err) = texture_manager.enable_texture(name) {
                texture_manager.disable_all();
                return Err(err);
            }
        }

        program.uniform_matrix("model", model);
        self.backend
            .draw_indexed_triangles(&self.vertex_array, self.indices.raw(), self.index_count);

        texture_manager.disable_all();
        Ok(())
    }

    pub fn positions(&self) -> &Buffer<B> {
        &self.positions
    }

    pub fn normals(&self) -> &Buffer<B> {
        &self.normals
    }

    pub fn texcoords(&self) -> &Buffer<B> {
        &self.texcoords
    }

    pub fn indices(&self) -> &Buffer<B> {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::MalformedModel,
        gfx::{
            backend::{Command, HeadlessBackend, ShaderSource, UniformValue},
            resources::{image::ImageData, Texture},
            scene::obj::tests::QUAD,
        },
    };
    use cgmath::{SquareMatrix, Vector3};

    fn quad(backend: &Rc<HeadlessBackend>) -> Mesh<HeadlessBackend> {
        Mesh::from_obj_source(backend, "Quad", QUAD).unwrap()
    }

    fn manager(backend: &Rc<HeadlessBackend>, names: &[&str]) -> TextureManager<HeadlessBackend> {
        let mut manager = TextureManager::new(backend.max_texture_slots());
        for name in names {
            let texture = Texture::from_image(backend, &ImageData::solid(1, 1, [255; 4]), name);
            manager.add_texture(name, Rc::new(texture));
        }
        manager
    }

    fn draws(backend: &HeadlessBackend) -> Vec<Command> {
        backend
            .commands()
            .into_iter()
            .filter(|command| matches!(command, Command::DrawIndexedTriangles { .. }))
            .collect()
    }

    #[test]
    fn test_construction_uploads_flattened_streams() {
        let backend = Rc::new(HeadlessBackend::new(2));
        let mesh = quad(&backend);

        assert_eq!(mesh.index_count(), 6);
        let indices = backend.buffer_contents(mesh.indices().raw()).unwrap();
        assert_eq!(
            indices,
            bytemuck::cast_slice::<u32, u8>(&[0, 1, 2, 3, 4, 5])
        );

        let positions = backend.buffer_contents(mesh.positions().raw()).unwrap();
        assert_eq!(positions.len(), 6 * 3 * 4);
        let texcoords = backend.buffer_contents(mesh.texcoords().raw()).unwrap();
        assert_eq!(texcoords.len(), 6 * 2 * 4);

        assert!(backend.commands().contains(&Command::CreateVertexArray {
            id: mesh.vertex_array.id(),
            attributes: vec![
                (0, mesh.positions().raw().id(), 3),
                (1, mesh.normals().raw().id(), 3),
                (2, mesh.texcoords().raw().id(), 2),
            ],
        }));
    }

    #[test]
    fn test_malformed_source_names_origin() {
        let backend = Rc::new(HeadlessBackend::new(2));
        let result = Mesh::from_obj_source(&backend, "broken.obj", "v 1 2\n");
        match result {
            Err(MeshLoadError::Malformed { origin, source }) => {
                assert_eq!(origin, "broken.obj");
                assert!(matches!(source, MalformedModel::MissingComponents { .. }));
            }
            _ => panic!("expected a malformed model error"),
        }
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_unreadable_file() {
        let backend = Rc::new(HeadlessBackend::new(2));
        let result = Mesh::from_file(&backend, "does/not/exist.obj");
        assert!(matches!(result, Err(MeshLoadError::Io { .. })));
    }

    #[test]
    fn test_from_file_reads_model() {
        let path = std::env::temp_dir().join(format!("trellis-quad-{}.obj", std::process::id()));
        fs::write(&path, QUAD).unwrap();

        let backend = Rc::new(HeadlessBackend::new(2));
        let mesh = Mesh::from_file(&backend, &path);
        fs::remove_file(&path).unwrap();

        let mesh = mesh.unwrap();
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.label(), path.display().to_string());
    }

    #[test]
    fn test_draw_binds_textures_only_for_the_draw() {
        let backend = Rc::new(HeadlessBackend::new(3));
        let program = Program::new(&backend, &ShaderSource::simple()).unwrap();
        let mut textures = manager(&backend, &["albedo", "detail"]);
        let albedo = textures.get("albedo").unwrap().raw().id();
        let detail = textures.get("detail").unwrap().raw().id();

        let mut mesh = quad(&backend);
        mesh.set_textures(["albedo", "detail"]);
        let model = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        mesh.draw(&program, &mut textures, &model).unwrap();

        assert_eq!(
            draws(&backend),
            vec![Command::DrawIndexedTriangles {
                vertex_array: mesh.vertex_array.id(),
                index_buffer: mesh.indices().raw().id(),
                count: 6,
                textures: vec![Some(albedo), Some(detail), None],
            }]
        );
        assert!(backend.commands().contains(&Command::SetUniform {
            program: program.raw().id(),
            name: "model".to_owned(),
            value: UniformValue::from(model),
        }));
        assert!(textures.slots().iter().all(Option::is_none));
        assert_eq!(backend.bound_textures(), vec![None, None, None]);
    }

    #[test]
    fn test_draw_evicts_textures_left_by_others() {
        let backend = Rc::new(HeadlessBackend::new(2));
        let program = Program::new(&backend, &ShaderSource::simple()).unwrap();
        let mut textures = manager(&backend, &["stale", "own"]);
        let own = textures.get("own").unwrap().raw().id();
        textures.enable_texture("stale").unwrap();

        let mut mesh = quad(&backend);
        mesh.set_textures(vec!["own".to_owned()]);
        mesh.draw(&program, &mut textures, &Matrix4::identity()).unwrap();

        match &draws(&backend)[..] {
            [Command::DrawIndexedTriangles { textures, .. }] => {
                assert_eq!(textures, &vec![Some(own), None]);
            }
            other => panic!("unexpected draws {other:?}"),
        }
    }

    #[test]
    fn test_draw_with_unregistered_texture_fails_without_drawing() {
        let backend = Rc::new(HeadlessBackend::new(2));
        let program = Program::new(&backend, &ShaderSource::simple()).unwrap();
        let mut textures = manager(&backend, &["albedo"]);

        let mut mesh = quad(&backend);
        mesh.set_textures(["albedo", "missing"]);
        let result = mesh.draw(&program, &mut textures, &Matrix4::identity());

        assert_eq!(result, Err(TextureError::NotRegistered("missing".to_owned())));
        assert!(draws(&backend).is_empty());
        assert!(textures.slots().iter().all(Option::is_none));
    }

    #[test]
    fn test_draw_with_too_many_textures_fails() {
        let backend = Rc::new(HeadlessBackend::new(1));
        let program = Program::new(&backend, &ShaderSource::simple()).unwrap();
        let mut textures = manager(&backend, &["a", "b"]);

        let mut mesh = quad(&backend);
        mesh.set_textures(["a", "b"]);
        let result = mesh.draw(&program, &mut textures, &Matrix4::identity());

        assert!(matches!(result, Err(TextureError::SlotExhausted { capacity: 1, .. })));
        assert_eq!(backend.bound_textures(), vec![None]);
    }

    #[test]
    fn test_dropping_mesh_releases_all_resources() {
        let backend = Rc::new(HeadlessBackend::new(1));
        let mesh = quad(&backend);
        let vertex_array = mesh.vertex_array.id();
        let buffers = [
            mesh.positions().raw().id(),
            mesh.normals().raw().id(),
            mesh.texcoords().raw().id(),
            mesh.indices().raw().id(),
        ];
        backend.take_commands();
        drop(mesh);

        let mut expected = vec![Command::DeleteVertexArray(vertex_array)];
        expected.extend(buffers.into_iter().map(Command::DeleteBuffer));
        assert_eq!(backend.commands(), expected);
    }
}
