//! Renders a small scene graph into an offscreen texture.
//!
//! Run with `cargo run --example offscreen`. Set `RUST_LOG=trellis=debug` to
//! see texture slots being enabled and released per draw.

use std::rc::Rc;

use anyhow::Context;
use trellis::prelude::*;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Unit cube, one normal per face
const CUBE: &str = "\
o Cube
v -0.5 -0.5 0.5
v 0.5 -0.5 0.5
v 0.5 0.5 0.5
v -0.5 0.5 0.5
v -0.5 -0.5 -0.5
v 0.5 -0.5 -0.5
v 0.5 0.5 -0.5
v -0.5 0.5 -0.5
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 -1.0
vn 1.0 0.0 0.0
vn -1.0 0.0 0.0
vn 0.0 1.0 0.0
vn 0.0 -1.0 0.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
f 6/1/2 5/2/2 8/3/2
f 6/1/2 8/3/2 7/4/2
f 2/1/3 6/2/3 7/3/3
f 2/1/3 7/3/3 3/4/3
f 5/1/4 1/2/4 4/3/4
f 5/1/4 4/3/4 8/4/4
f 4/1/5 3/2/5 7/3/5
f 4/1/5 7/3/5 8/4/5
f 5/1/6 6/2/6 2/3/6
f 5/1/6 2/3/6 1/4/6
";

async fn create_backend(texture_slots: usize) -> anyhow::Result<WgpuBackend> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("no suitable graphics adapter")?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("WGPU Device"),
            required_features: wgpu::Features::default(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device")?;

    Ok(WgpuBackend::new(
        device,
        queue,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        texture_slots,
    ))
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RendererConfig::default()
        .with_eye(Point3::new(3.0, 2.0, 4.0), Point3::new(0.0, 0.0, 0.0));
    let backend = Rc::new(pollster::block_on(create_backend(config.texture_slots))?);

    let target = backend.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let mut device = Device::new(Rc::clone(&backend), config);
    device.startup((WIDTH, HEIGHT))?;

    device.add_texture("red", &ImageData::solid(4, 4, [220, 40, 40, 255]));
    device.add_texture("teal", &ImageData::solid(4, 4, [40, 180, 170, 255]));

    let mut red_cube = Mesh::from_obj_source(&backend, "Cube", CUBE)?;
    red_cube.set_textures(["red"]);
    let mut teal_cube = Mesh::from_obj_source(&backend, "Cube", CUBE)?;
    teal_cube.set_textures(["teal"]);
    let (red_cube, teal_cube) = (Rc::new(red_cube), Rc::new(teal_cube));

    // Root spins the whole arrangement; each arm offsets one cube
    let scene = device.scene_mut();
    let root = scene.add_node(SceneNode::Transform(Matrix4::from_angle_y(Deg(30.0))), None)?;
    let left = scene.add_node(
        SceneNode::Transform(Matrix4::from_translation(Vector3::new(-1.0, 0.0, 0.0))),
        Some(root),
    )?;
    let right = scene.add_node(
        SceneNode::Transform(Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0))),
        Some(root),
    )?;
    let small = scene.add_node(SceneNode::Transform(Matrix4::from_scale(0.5)), Some(right))?;
    scene.add_node(SceneNode::Mesh(Rc::clone(&red_cube)), Some(left))?;
    scene.add_node(SceneNode::Mesh(Rc::clone(&teal_cube)), Some(right))?;
    scene.add_node(SceneNode::Mesh(teal_cube), Some(small))?;
    scene.root()?;

    let drawn = device.draw(1.0 / 60.0)?;
    let submitted = backend.submit_frame(&target_view, WIDTH, HEIGHT);
    log::info!("drew {drawn} meshes, submitted {submitted} draw calls");

    Ok(())
}
