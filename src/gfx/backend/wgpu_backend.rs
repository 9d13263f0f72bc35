//! wgpu implementation of [`GraphicsBackend`]
//!
//! wgpu has no global binding state, so the GL-style calls the core issues
//! are replayed: `bind_texture`/`set_uniform` update a CPU-side snapshot, each
//! `draw_indexed_triangles` records a draw call carrying that snapshot, and
//! [`WgpuBackend::submit_frame`] encodes all recorded draws into one render
//! pass.
//!
//! Programs share one pipeline layout:
//! - group 0, binding 0: the program's uniform block (dynamic offset)
//! - group 1, bindings `2*slot` / `2*slot + 1`: texture and sampler per slot

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use wgpu::util::DeviceExt;

use crate::{
    error::BackendError,
    gfx::resources::{image::ImageData, texture_resource::TextureResource},
    wgpu_utils::{binding_types, DynamicUniformBuffer, UniformLayout},
};

use super::{
    BufferKind, GraphicsBackend, ShaderSource, UniformLocation, UniformValue, VertexAttribute,
};

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const TEXCOORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

/// One buffer per attribute stream: position, normal, texcoord
fn mesh_vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEXCOORD_ATTRIBUTES,
        },
    ]
}

/// Buffer handle; the GPU allocation is (re)created on every upload
pub struct WgpuBuffer {
    kind: BufferKind,
    label: String,
    raw: RefCell<Option<wgpu::Buffer>>,
}

impl WgpuBuffer {
    pub fn raw(&self) -> Option<wgpu::Buffer> {
        self.raw.borrow().clone()
    }
}

pub struct WgpuProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    layout: UniformLayout,
    block: Rc<RefCell<Vec<u8>>>,
}

/// Vertex buffers in shader-location order, captured at creation
pub struct WgpuVertexArray {
    buffers: Vec<Option<wgpu::Buffer>>,
}

struct ActiveProgram {
    pipeline: wgpu::RenderPipeline,
    block: Rc<RefCell<Vec<u8>>>,
}

struct DrawCall {
    pipeline: wgpu::RenderPipeline,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    count: u32,
    uniforms: Vec<u8>,
    textures: Vec<Option<TextureResource>>,
}

struct FrameState {
    clear_color: wgpu::Color,
    active_program: Option<ActiveProgram>,
    slots: Vec<Option<TextureResource>>,
    draws: Vec<DrawCall>,
}

/// Backend rendering through an existing wgpu device
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    texture_slots: usize,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    fallback_texture: TextureResource,
    uniform_buffer: RefCell<DynamicUniformBuffer>,
    depth_texture: RefCell<Option<TextureResource>>,
    frame: RefCell<FrameState>,
    frames_submitted: Cell<u64>,
}

impl WgpuBackend {
    /// Wraps an already-initialized device.
    ///
    /// `texture_slots` is clamped to what the device allows per shader stage.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
        texture_slots: usize,
    ) -> Self {
        let limits = device.limits();
        let texture_slots = texture_slots
            .min(limits.max_sampled_textures_per_shader_stage as usize)
            .min(limits.max_samplers_per_shader_stage as usize);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[binding_types::uniform_block_entry()],
        });

        let texture_entries = binding_types::texture_slot_entries(texture_slots);
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Slots Bind Group Layout"),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let fallback_texture = TextureResource::create_fallback(&device, &queue);
        let uniform_buffer = DynamicUniformBuffer::new(&device, 256);

        log::info!("wgpu backend ready: {texture_slots} texture slots, target {target_format:?}");

        Self {
            device,
            queue,
            target_format,
            texture_slots,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            fallback_texture,
            uniform_buffer: RefCell::new(uniform_buffer),
            depth_texture: RefCell::new(None),
            frame: RefCell::new(FrameState {
                clear_color: wgpu::Color::BLACK,
                active_program: None,
                slots: vec![None; texture_slots],
                draws: Vec::new(),
            }),
            frames_submitted: Cell::new(0),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted.get()
    }

    fn depth_view(&self, width: u32, height: u32) -> wgpu::TextureView {
        let mut depth = self.depth_texture.borrow_mut();
        match depth.as_ref() {
            Some(texture) if texture.size() == (width.max(1), height.max(1)) => {
                texture.view.clone()
            }
            _ => {
                let texture =
                    TextureResource::create_depth_texture(&self.device, width, height, "Depth Texture");
                let view = texture.view.clone();
                *depth = Some(texture);
                view
            }
        }
    }

    /// Encodes every draw recorded since the last submission into one render
    /// pass targeting `target` and submits it. Returns the number of draws.
    pub fn submit_frame(&self, target: &wgpu::TextureView, width: u32, height: u32) -> usize {
        let (clear_color, draws) = {
            let mut frame = self.frame.borrow_mut();
            (frame.clear_color, std::mem::take(&mut frame.draws))
        };

        let blocks: Vec<Vec<u8>> = draws.iter().map(|draw| draw.uniforms.clone()).collect();
        let mut uniform_buffer = self.uniform_buffer.borrow_mut();
        let (offsets, _) = uniform_buffer.write_blocks(&self.device, &self.queue, &blocks);

        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.binding_resource(),
            }],
        });

        let texture_bind_groups: Vec<wgpu::BindGroup> = draws
            .iter()
            .map(|draw| self.texture_bind_group(&draw.textures))
            .collect();

        let depth_view = self.depth_view(width, height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for ((draw, offset), textures) in draws.iter().zip(&offsets).zip(&texture_bind_groups) {
                render_pass.set_pipeline(&draw.pipeline);
                render_pass.set_bind_group(0, &uniform_bind_group, &[*offset]);
                render_pass.set_bind_group(1, textures, &[]);
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        self.frames_submitted.set(self.frames_submitted.get() + 1);
        log::trace!("submitted frame with {} draws", draws.len());
        draws.len()
    }

    fn texture_bind_group(&self, textures: &[Option<TextureResource>]) -> wgpu::BindGroup {
        let resolved: Vec<&TextureResource> = textures
            .iter()
            .map(|texture| texture.as_ref().unwrap_or(&self.fallback_texture))
            .collect();

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .enumerate()
            .flat_map(|(slot, texture)| {
                [
                    wgpu::BindGroupEntry {
                        binding: binding_types::slot_binding(slot),
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: binding_types::slot_binding(slot) + 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ]
            })
            .collect();

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Slots Bind Group"),
            layout: &self.texture_layout,
            entries: &entries,
        })
    }
}

impl GraphicsBackend for WgpuBackend {
    type Buffer = WgpuBuffer;
    type Texture = TextureResource;
    type Program = WgpuProgram;
    type VertexArray = WgpuVertexArray;

    fn create_buffer(&self, kind: BufferKind, label: &str) -> WgpuBuffer {
        WgpuBuffer {
            kind,
            label: label.to_owned(),
            raw: RefCell::new(None),
        }
    }

    // wgpu binds buffers per draw; there is no global buffer binding to change
    fn bind_buffer(&self, _buffer: &WgpuBuffer) {}

    fn unbind_buffer(&self, _kind: BufferKind) {}

    fn upload_buffer(&self, buffer: &WgpuBuffer, bytes: &[u8]) {
        let usage = match buffer.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let raw = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&buffer.label),
                contents: bytes,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            });
        *buffer.raw.borrow_mut() = Some(raw);
    }

    fn create_texture(&self, image: &ImageData, label: &str) -> TextureResource {
        TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            &image.pixels,
            image.width,
            image.height,
            label,
        )
    }

    fn bind_texture(&self, texture: &TextureResource, slot: usize) {
        if let Some(entry) = self.frame.borrow_mut().slots.get_mut(slot) {
            *entry = Some(texture.clone());
        }
    }

    fn unbind_texture(&self, slot: usize) {
        if let Some(entry) = self.frame.borrow_mut().slots.get_mut(slot) {
            *entry = None;
        }
    }

    fn compile_program(&self, source: &ShaderSource) -> Result<WgpuProgram, BackendError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.label),
                source: wgpu::ShaderSource::Wgsl(source.code.as_str().into()),
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&source.label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &mesh_vertex_layouts(),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: TextureResource::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::ShaderCompile {
                label: source.label.clone(),
                message: error.to_string(),
            });
        }

        let layout = UniformLayout::new(&source.uniforms);
        let block = vec![0u8; layout.size()];
        log::debug!(
            "compiled program `{}` ({} byte uniform block)",
            source.label,
            layout.size()
        );

        Ok(WgpuProgram {
            label: source.label.clone(),
            pipeline,
            layout,
            block: Rc::new(RefCell::new(block)),
        })
    }

    fn use_program(&self, program: &WgpuProgram) {
        self.frame.borrow_mut().active_program = Some(ActiveProgram {
            pipeline: program.pipeline.clone(),
            block: Rc::clone(&program.block),
        });
    }

    fn uniform_location(&self, program: &WgpuProgram, name: &str) -> Option<UniformLocation> {
        program
            .layout
            .index_of(name)
            .map(|index| UniformLocation(index as u32))
    }

    fn set_uniform(&self, program: &WgpuProgram, location: UniformLocation, value: UniformValue) {
        let Some((offset, kind)) = program.layout.field(location.0 as usize) else {
            log::warn!("program `{}` has no uniform at {location:?}", program.label);
            return;
        };
        if kind != value.kind() {
            log::warn!(
                "program `{}`: uniform `{}` is {kind:?}, refusing {:?}",
                program.label,
                program.layout.name(location.0 as usize).unwrap_or("?"),
                value.kind()
            );
            return;
        }
        UniformLayout::write(&mut program.block.borrow_mut(), offset, value);
    }

    fn create_vertex_array(&self, attributes: &[VertexAttribute<'_, WgpuBuffer>]) -> WgpuVertexArray {
        let mut sorted: Vec<&VertexAttribute<'_, WgpuBuffer>> = attributes.iter().collect();
        sorted.sort_by_key(|attribute| attribute.shader_location);
        WgpuVertexArray {
            buffers: sorted.iter().map(|attribute| attribute.buffer.raw()).collect(),
        }
    }

    fn draw_indexed_triangles(
        &self,
        vertex_array: &WgpuVertexArray,
        index_buffer: &WgpuBuffer,
        count: u32,
    ) {
        let mut frame = self.frame.borrow_mut();
        let Some(active) = frame.active_program.as_ref() else {
            log::warn!("draw issued without an active program, skipped");
            return;
        };
        let Some(index_buffer) = index_buffer.raw() else {
            log::warn!("draw issued with an index buffer that was never uploaded, skipped");
            return;
        };
        let Some(vertex_buffers) = vertex_array.buffers.iter().cloned().collect::<Option<Vec<_>>>()
        else {
            log::warn!("draw issued with a vertex buffer that was never uploaded, skipped");
            return;
        };

        let draw = DrawCall {
            pipeline: active.pipeline.clone(),
            vertex_buffers,
            index_buffer,
            count,
            uniforms: active.block.borrow().clone(),
            textures: frame.slots.clone(),
        };
        frame.draws.push(draw);
    }

    fn clear_frame(&self, color: [f32; 4]) {
        let mut frame = self.frame.borrow_mut();
        frame.clear_color = wgpu::Color {
            r: f64::from(color[0]),
            g: f64::from(color[1]),
            b: f64::from(color[2]),
            a: f64::from(color[3]),
        };
        frame.draws.clear();
    }

    fn max_texture_slots(&self) -> usize {
        self.texture_slots
    }
}
