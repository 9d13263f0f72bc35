//! # Device
//!
//! Drives one frame at a time: clears the target, walks the scene tree in
//! insertion order, and draws every mesh node with its resolved world
//! transform.

use std::{path::Path, rc::Rc};

use cgmath::{Deg, Matrix4, SquareMatrix};

use crate::{
    config::RendererConfig,
    error::{MeshLoadError, RenderError},
    gfx::{
        backend::GraphicsBackend,
        camera::{Camera, Projection},
        resources::{ImageData, ImageDecoder, Program, Texture, TextureManager},
        scene::{Mesh, SceneTree},
    },
};

pub struct Device<B: GraphicsBackend> {
    backend: Rc<B>,
    config: RendererConfig,
    camera: Camera,
    projection: Option<Projection>,
    program: Option<Program<B>>,
    scene: SceneTree<Mesh<B>>,
    texture_manager: TextureManager<B>,
}

impl<B: GraphicsBackend> Device<B> {
    pub fn new(backend: Rc<B>, config: RendererConfig) -> Self {
        let slots = config.texture_slots.min(backend.max_texture_slots());
        log::info!(
            "device created with {slots} texture slots (requested {}, backend allows {})",
            config.texture_slots,
            backend.max_texture_slots()
        );

        Self {
            camera: Camera::new(config.eye, config.target),
            texture_manager: TextureManager::new(slots),
            scene: SceneTree::new(),
            projection: None,
            program: None,
            backend,
            config,
        }
    }

    /// Compiles the configured shader and uploads the initial camera uniforms
    pub fn startup(&mut self, (width, height): (u32, u32)) -> Result<(), RenderError> {
        let program = Program::new(&self.backend, &self.config.shader)?;
        program.use_program();

        let projection = Projection::new(
            Deg(self.config.fovy_degrees),
            width,
            height,
            self.config.near,
            self.config.far,
        );
        program.uniform_matrix("projection", &projection.matrix());
        program.uniform_matrix("view", &self.camera.look_at());
        program.uniform_matrix("model", &Matrix4::identity());

        log::info!("device started at {width}x{height}");
        self.projection = Some(projection);
        self.program = Some(program);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.program.is_some()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let (Some(program), Some(projection)) = (&self.program, &mut self.projection) {
            projection.resize(width, height);
            program.uniform_matrix("projection", &projection.matrix());
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        if let Some(program) = &self.program {
            program.uniform_matrix("view", &self.camera.look_at());
        }
    }

    /// Renders one frame and returns the number of meshes drawn
    pub fn draw(&mut self, dt: f32) -> Result<usize, RenderError> {
        let program = self.program.as_ref().ok_or(RenderError::NotStarted)?;
        self.backend.clear_frame(self.config.clear_color);

        let mut drawn = 0;
        for (id, node) in self.scene.iter() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let world = self.scene.resolve_world_transform(id, dt)?;
            mesh.draw(program, &mut self.texture_manager, &world)?;
            drawn += 1;
        }

        log::trace!("frame drawn: {drawn} meshes");
        Ok(drawn)
    }

    pub fn load_mesh(&self, path: impl AsRef<Path>) -> Result<Rc<Mesh<B>>, MeshLoadError> {
        Mesh::from_file(&self.backend, path).map(Rc::new)
    }

    /// Uploads `image` and registers it as `name`; `false` if the name is taken
    pub fn add_texture(&mut self, name: &str, image: &ImageData) -> bool {
        let texture = Texture::from_image(&self.backend, image, name);
        self.texture_manager.add_texture(name, Rc::new(texture))
    }

    pub fn add_texture_from_file(
        &mut self,
        name: &str,
        decoder: &dyn ImageDecoder,
        path: impl AsRef<Path>,
    ) -> Result<bool, RenderError> {
        let texture = Texture::from_file(&self.backend, decoder, path)?;
        Ok(self.texture_manager.add_texture(name, Rc::new(texture)))
    }

    pub fn backend(&self) -> &Rc<B> {
        &self.backend
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn program(&self) -> Option<&Program<B>> {
        self.program.as_ref()
    }

    pub fn scene(&self) -> &SceneTree<Mesh<B>> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneTree<Mesh<B>> {
        &mut self.scene
    }

    pub fn texture_manager(&self) -> &TextureManager<B> {
        &self.texture_manager
    }

    pub fn texture_manager_mut(&mut self) -> &mut TextureManager<B> {
        &mut self.texture_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ImageLoadError, TextureError},
        gfx::{
            backend::{Command, HeadlessBackend, ShaderSource, UniformValue},
            scene::{obj::tests::QUAD, SceneNode},
        },
    };
    use cgmath::Vector3;

    fn device(slots: usize) -> Device<HeadlessBackend> {
        Device::new(Rc::new(HeadlessBackend::new(slots)), RendererConfig::default())
    }

    fn quad(device: &Device<HeadlessBackend>) -> Rc<Mesh<HeadlessBackend>> {
        Rc::new(Mesh::from_obj_source(device.backend(), "Quad", QUAD).unwrap())
    }

    fn uploaded(backend: &HeadlessBackend, uniform: &str) -> Vec<UniformValue> {
        backend
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                Command::SetUniform { name, value, .. } if name == uniform => Some(value),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_draw_before_startup_fails() {
        let mut device = device(2);
        assert!(matches!(device.draw(0.0), Err(RenderError::NotStarted)));
        assert!(device.backend().commands().is_empty());
    }

    #[test]
    fn test_startup_uploads_camera_and_identity_model() {
        let mut device = device(2);
        device.startup((800, 600)).unwrap();
        assert!(device.is_started());

        let backend = device.backend();
        let projection = Projection::new(Deg(60.0), 800, 600, 0.1, 1000.0);
        assert_eq!(
            uploaded(backend, "projection"),
            vec![UniformValue::from(projection.matrix())]
        );
        assert_eq!(
            uploaded(backend, "view"),
            vec![UniformValue::from(device.camera().look_at())]
        );
        assert_eq!(
            uploaded(backend, "model"),
            vec![UniformValue::from(Matrix4::<f32>::identity())]
        );
    }

    #[test]
    fn test_startup_reports_shader_errors() {
        let config = RendererConfig::default().with_shader(ShaderSource::wgsl("Broken", ""));
        let mut device = Device::new(Rc::new(HeadlessBackend::new(1)), config);
        assert!(matches!(device.startup((1, 1)), Err(RenderError::Backend(_))));
        assert!(!device.is_started());
    }

    #[test]
    fn test_texture_slots_are_capped_by_backend() {
        assert_eq!(device(3).texture_manager().capacity(), 3);
        let config = RendererConfig::default().with_texture_slots(2);
        let device = Device::new(Rc::new(HeadlessBackend::new(16)), config);
        assert_eq!(device.texture_manager().capacity(), 2);
    }

    #[test]
    fn test_frame_draws_mesh_nodes_with_world_transforms() {
        let mut device = device(2);
        device.startup((640, 480)).unwrap();
        let mesh = quad(&device);

        let offset = Matrix4::from_translation(Vector3::new(0.0, 1.0, 0.0));
        let scene = device.scene_mut();
        let root = scene.add_node(SceneNode::Transform(offset), None).unwrap();
        let arm = scene.add_node(SceneNode::Transform(offset), Some(root)).unwrap();
        scene.add_node(SceneNode::Mesh(Rc::clone(&mesh)), Some(root)).unwrap();
        scene.add_node(SceneNode::Mesh(Rc::clone(&mesh)), Some(arm)).unwrap();
        device.backend().take_commands();

        assert_eq!(device.draw(0.016).unwrap(), 2);

        let backend = device.backend();
        assert_eq!(backend.commands()[0], Command::ClearFrame([0.2, 0.0, 0.2, 1.0]));
        assert_eq!(
            uploaded(backend, "model"),
            vec![UniformValue::from(offset), UniformValue::from(offset * offset)]
        );
    }

    #[test]
    fn test_missing_texture_fails_the_frame() {
        let mut device = device(2);
        device.startup((1, 1)).unwrap();

        let mut mesh = Mesh::from_obj_source(device.backend(), "Quad", QUAD).unwrap();
        mesh.set_textures(["albedo"]);
        device
            .scene_mut()
            .add_node(SceneNode::Mesh(Rc::new(mesh)), None)
            .unwrap();

        assert!(matches!(
            device.draw(0.0),
            Err(RenderError::Texture(TextureError::NotRegistered(_)))
        ));

        assert!(device.add_texture("albedo", &ImageData::solid(1, 1, [255; 4])));
        assert!(!device.add_texture("albedo", &ImageData::solid(1, 1, [0; 4])));
        assert_eq!(device.draw(0.0).unwrap(), 1);
    }

    struct FailingDecoder;

    impl ImageDecoder for FailingDecoder {
        fn decode(&self, _path: &Path) -> Result<ImageData, ImageLoadError> {
            Err(ImageLoadError::SizeMismatch {
                width: 1,
                height: 1,
                expected: 4,
                actual: 0,
            })
        }
    }

    #[test]
    fn test_texture_decode_errors_propagate() {
        let mut device = device(2);
        let result = device.add_texture_from_file("albedo", &FailingDecoder, "albedo.png");
        assert!(matches!(result, Err(RenderError::Image(_))));
        assert!(!device.texture_manager().contains("albedo"));
    }
}
