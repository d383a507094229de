use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::error::AppError;
use crate::math::Mesh;
use crate::renderer::backend::{ColorMask, ModelId, RenderBackend, ShaderUniforms, TextureSlot};
use crate::renderer::texture::{GpuTexture, TextureBinder};

const MAX_DRAWS_PER_FRAME: usize = 8;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[rustfmt::skip]
const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

pub fn to_wgpu_depth(uniforms: &ShaderUniforms) -> ShaderUniforms {
    let remap = |m: &[[f32; 4]; 4]| (OPENGL_TO_WGPU * Mat4::from_cols_array_2d(m)).to_cols_array_2d();
    ShaderUniforms {
        model_view_projection: remap(&uniforms.model_view_projection),
        projection: remap(&uniforms.projection),
        ..*uniforms
    }
}

fn color_writes(mask: ColorMask) -> wgpu::ColorWrites {
    let mut writes = wgpu::ColorWrites::empty();
    if mask.red {
        writes |= wgpu::ColorWrites::RED;
    }
    if mask.green {
        writes |= wgpu::ColorWrites::GREEN;
    }
    if mask.blue {
        writes |= wgpu::ColorWrites::BLUE;
    }
    if mask.alpha {
        writes |= wgpu::ColorWrites::ALPHA;
    }
    writes
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOp {
    pub model: ModelId,
    pub vertex_count: u32,
    pub mask: ColorMask,
    pub texture: TextureSlot,
    pub uniform_slot: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub clear_color: Option<[f64; 4]>,
    pub clear_depth: bool,
    pub draws: Vec<DrawOp>,
}

#[derive(Debug, Default)]
pub struct FrameRecorder {
    passes: Vec<PassPlan>,
    snapshots: Vec<ShaderUniforms>,
    uniforms: ShaderUniforms,
    mask: ColorMask,
    texture: Option<TextureSlot>,
    dropped: usize,
}

impl FrameRecorder {
    pub fn clear(&mut self, color: [f64; 4]) {
        self.passes.push(PassPlan {
            clear_color: Some(color),
            clear_depth: true,
            draws: Vec::new(),
        });
    }

    pub fn clear_depth(&mut self) {
        self.passes.push(PassPlan {
            clear_color: None,
            clear_depth: true,
            draws: Vec::new(),
        });
    }

    pub fn set_color_mask(&mut self, mask: ColorMask) {
        self.mask = mask;
    }

    pub fn bind_texture(&mut self, slot: TextureSlot) {
        self.texture = Some(slot);
    }

    pub fn set_uniforms(&mut self, uniforms: &ShaderUniforms) {
        self.uniforms = *uniforms;
    }

    pub fn draw(&mut self, model: ModelId, vertex_count: u32) {
        if self.snapshots.len() >= MAX_DRAWS_PER_FRAME {
            self.dropped += 1;
            return;
        }
        if self.passes.is_empty() {
            self.passes.push(PassPlan {
                clear_color: None,
                clear_depth: false,
                draws: Vec::new(),
            });
        }

        let uniform_slot = self.snapshots.len();
        self.snapshots.push(self.uniforms);

        let draw = DrawOp {
            model,
            vertex_count,
            mask: self.mask,
            texture: self.texture.unwrap_or(TextureSlot::Surface),
            uniform_slot,
        };
        if let Some(pass) = self.passes.last_mut() {
            pass.draws.push(draw);
        }
    }

    pub fn finish(&mut self) -> (Vec<PassPlan>, Vec<ShaderUniforms>) {
        if self.dropped > 0 {
            log::warn!(
                "Dropped {} draws over the per-frame budget of {}",
                self.dropped,
                MAX_DRAWS_PER_FRAME
            );
            self.dropped = 0;
        }
        (
            std::mem::take(&mut self.passes),
            std::mem::take(&mut self.snapshots),
        )
    }
}

struct ModelBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    texcoords: wgpu::Buffer,
    vertex_count: u32,
}

fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn texcoord_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 8,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        }],
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<ColorMask, wgpu::RenderPipeline>,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,

    texture_binder: TextureBinder,
    camera_texture: GpuTexture,
    surface_texture: GpuTexture,

    models: HashMap<ModelId, ModelBuffers>,
    recorder: FrameRecorder,

    depth_texture: wgpu::TextureView,
}

impl GpuState {
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, AppError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| AppError::ContextUnavailable(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| AppError::ContextUnavailable("no compatible adapter".into()))?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| AppError::ContextUnavailable(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| AppError::ContextUnavailable("surface has no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Anaglyph Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let uniform_size = std::mem::size_of::<ShaderUniforms>() as u64;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = uniform_size.div_ceil(alignment) * alignment;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: uniform_stride * MAX_DRAWS_PER_FRAME as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(uniform_size),
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(uniform_size),
                }),
            }],
        });

        let texture_binder = TextureBinder::new(&device);
        let camera_texture = GpuTexture::placeholder(&device, &queue, &texture_binder, "Camera Texture");
        let surface_texture = GpuTexture::placeholder(&device, &queue, &texture_binder, "Surface Texture");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Anaglyph Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_binder.layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        pipelines.insert(
            ColorMask::ALL,
            create_pipeline(&device, &pipeline_layout, &shader, config.format, ColorMask::ALL),
        );

        if let Some(error) = device.pop_error_scope().await {
            return Err(AppError::ShaderCompile(error.to_string()));
        }

        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            shader,
            pipeline_layout,
            pipelines,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            texture_binder,
            camera_texture,
            surface_texture,
            models: HashMap::new(),
            recorder: FrameRecorder::default(),
            depth_texture,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn upload_vertex_attributes(&mut self, model: ModelId, mesh: &Mesh) {
        if mesh.is_empty() {
            self.models.remove(&model);
            return;
        }

        let buffer = |label: &str, data: &[f32]| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        let buffers = ModelBuffers {
            positions: buffer("Vertex Positions", &mesh.vertices),
            normals: buffer("Vertex Normals", &mesh.normals),
            texcoords: buffer("Vertex Texcoords", &mesh.texcoords),
            vertex_count: mesh.vertex_count(),
        };
        log::debug!("Uploaded {:?} with {} vertices", model, buffers.vertex_count);
        self.models.insert(model, buffers);
    }

    pub fn upload_texture(&mut self, slot: TextureSlot, width: u32, height: u32, rgba: &[u8]) {
        let target = match slot {
            TextureSlot::Camera => &mut self.camera_texture,
            TextureSlot::Surface => &mut self.surface_texture,
        };
        target.upload_rgba8(&self.device, &self.queue, &self.texture_binder, width, height, rgba);
    }

    fn texture(&self, slot: TextureSlot) -> &GpuTexture {
        match slot {
            TextureSlot::Camera => &self.camera_texture,
            TextureSlot::Surface => &self.surface_texture,
        }
    }

    pub fn encode_frame(&mut self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let (passes, snapshots) = self.recorder.finish();

        for (slot, uniforms) in snapshots.iter().enumerate() {
            self.queue.write_buffer(
                &self.uniform_buffer,
                slot as u64 * self.uniform_stride,
                bytemuck::bytes_of(&to_wgpu_depth(uniforms)),
            );
        }

        for pass in &passes {
            let color_load = match pass.clear_color {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = if pass.clear_depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Anaglyph Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &pass.draws {
                let Some(model) = self.models.get(&draw.model) else {
                    log::warn!("Skipping draw of {:?}: no vertex data uploaded", draw.model);
                    continue;
                };
                let Some(pipeline) = self.pipelines.get(&draw.mask) else {
                    continue;
                };

                let offset = (draw.uniform_slot as u64 * self.uniform_stride) as u32;
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                render_pass.set_bind_group(1, self.texture(draw.texture).bind_group(), &[]);
                render_pass.set_vertex_buffer(0, model.positions.slice(..));
                render_pass.set_vertex_buffer(1, model.normals.slice(..));
                render_pass.set_vertex_buffer(2, model.texcoords.slice(..));
                render_pass.draw(0..draw.vertex_count.min(model.vertex_count), 0..1);
            }
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    mask: ColorMask,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Anaglyph Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[position_layout(), normal_layout(), texcoord_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: color_writes(mask),
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl RenderBackend for GpuState {
    fn clear(&mut self, color: [f64; 4]) {
        self.recorder.clear(color);
    }

    fn clear_depth(&mut self) {
        self.recorder.clear_depth();
    }

    fn set_color_mask(&mut self, mask: ColorMask) {
        if !self.pipelines.contains_key(&mask) {
            log::debug!("Creating pipeline for {:?}", mask);
            let pipeline = create_pipeline(
                &self.device,
                &self.pipeline_layout,
                &self.shader,
                self.config.format,
                mask,
            );
            self.pipelines.insert(mask, pipeline);
        }
        self.recorder.set_color_mask(mask);
    }

    fn bind_texture(&mut self, slot: TextureSlot) {
        self.recorder.bind_texture(slot);
    }

    fn set_uniforms(&mut self, uniforms: &ShaderUniforms) {
        self.recorder.set_uniforms(uniforms);
    }

    fn draw_triangle_strip(&mut self, model: ModelId, vertex_count: u32) {
        self.recorder.draw(model, vertex_count);
    }
}
