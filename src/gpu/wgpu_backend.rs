use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::renderer::transform::orthographic_projection;

use super::{
    FilterMode, Gpu, GpuError, QuadDraw, SamplerSettings, ShaderId, ShaderKind, ShaderProgramSource,
    ShaderStage, TextureArrayDesc, TextureDesc, TextureFormat, TextureId, TextureUnit, UNIT_QUAD, WrapMode,
    to_rgba, validate_wgsl,
};

// ── Vertex layouts ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,  // position
        1 => Float32x2,  // uv
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-draw data, one instance per quad.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadInstance {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
    layer: u32,
    layer_count: u32,
}

impl QuadInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        2 => Float32x4,  // model col 0
        3 => Float32x4,  // model col 1
        4 => Float32x4,  // model col 2
        5 => Float32x4,  // model col 3
        6 => Float32x4,  // tint
        7 => Uint32,     // layer
        8 => Uint32,     // layer_count
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    fn from_draw(draw: &QuadDraw) -> Self {
        Self {
            model: draw.model.to_cols_array_2d(),
            tint: draw.tint.extend(1.0).to_array(),
            layer: draw.layer,
            layer_count: draw.layer_count,
        }
    }
}

// ── Resources ────────────────────────────────────────────────────────────────

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    is_array: bool,
}

struct GpuShader {
    pipeline: wgpu::RenderPipeline,
    kind: ShaderKind,
}

/// Consecutive instances sharing a shader and texture, drawn with one call.
struct DrawRun {
    shader: ShaderId,
    texture: TextureId,
    instances: std::ops::Range<u32>,
}

// ── WgpuGpu ──────────────────────────────────────────────────────────────────

/// [`Gpu`] backed by wgpu, presenting to a winit window.
///
/// Quads are collected between `begin_frame` and `end_frame` and submitted as
/// instanced draws in one render pass. Textures destroyed mid-frame stay
/// alive until that frame is submitted.
pub struct WgpuGpu {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    projection_buffer: wgpu::Buffer,
    projection_bind_group: wgpu::BindGroup,
    projection_bind_group_layout: wgpu::BindGroupLayout,
    sprite_bind_group_layout: wgpu::BindGroupLayout,
    array_bind_group_layout: wgpu::BindGroupLayout,
    quad_buffer: wgpu::Buffer,
    textures: HashMap<TextureId, GpuTexture>,
    shaders: HashMap<ShaderId, GpuShader>,
    bound: [Option<TextureId>; 2],
    instances: Vec<QuadInstance>,
    runs: Vec<DrawRun>,
    pending_destroy: Vec<TextureId>,
    in_frame: bool,
    next_id: u32,
}

impl WgpuGpu {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| GpuError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .map_err(|e| GpuError::Adapter(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| GpuError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| GpuError::Surface("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let projection_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("projection_bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let sprite_bind_group_layout =
            texture_bind_group_layout(&device, "sprite_bgl", wgpu::TextureViewDimension::D2);
        let array_bind_group_layout =
            texture_bind_group_layout(&device, "array_bgl", wgpu::TextureViewDimension::D2Array);

        let proj = orthographic_projection(config.width as f32, config.height as f32);
        let projection_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("projection_buffer"),
            contents: bytemuck::cast_slice(&proj.to_cols_array()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projection_bg"),
            layout: &projection_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_buffer.as_entire_binding(),
            }],
        });

        let quad: Vec<QuadVertex> = UNIT_QUAD
            .iter()
            .map(|[x, y, u, v]| QuadVertex { position: [*x, *y], uv: [*u, *v] })
            .collect();
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("unit_quad"),
            contents: bytemuck::cast_slice(&quad),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::info!(
            "[gpu] Using {} ({:?}), surface {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.width,
            config.height,
            format
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            projection_buffer,
            projection_bind_group,
            projection_bind_group_layout,
            sprite_bind_group_layout,
            array_bind_group_layout,
            quad_buffer,
            textures: HashMap::new(),
            shaders: HashMap::new(),
            bound: [None; 2],
            instances: Vec::new(),
            runs: Vec::new(),
            pending_destroy: Vec::new(),
            in_frame: false,
            next_id: 0,
        })
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn texture_bind_group(
        &self,
        texture: &wgpu::Texture,
        sampler: &SamplerSettings,
        is_array: bool,
    ) -> wgpu::BindGroup {
        let (layout, dimension) = if is_array {
            (&self.array_bind_group_layout, wgpu::TextureViewDimension::D2Array)
        } else {
            (&self.sprite_bind_group_layout, wgpu::TextureViewDimension::D2)
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(dimension),
            ..Default::default()
        });
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: address_mode(sampler.wrap_s),
            address_mode_v: address_mode(sampler.wrap_t),
            mag_filter: filter_mode(sampler.mag_filter),
            min_filter: filter_mode(sampler.min_filter),
            ..Default::default()
        });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(if is_array { "array_texture_bg" } else { "sprite_texture_bg" }),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    }

    fn release_pending(&mut self) {
        for id in std::mem::take(&mut self.pending_destroy) {
            if let Some(t) = self.textures.remove(&id) {
                t.texture.destroy();
            }
        }
    }

    fn submit_frame(&mut self) -> Result<(), GpuError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(GpuError::Frame(e.to_string())),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let instance_buffer = (!self.instances.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad_instances"),
                contents: bytemuck::cast_slice(&self.instances),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame") });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("world_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(instances) = &instance_buffer {
                pass.set_bind_group(0, &self.projection_bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                pass.set_vertex_buffer(1, instances.slice(..));

                for run in &self.runs {
                    let (Some(shader), Some(texture)) =
                        (self.shaders.get(&run.shader), self.textures.get(&run.texture))
                    else {
                        continue;
                    };
                    pass.set_pipeline(&shader.pipeline);
                    pass.set_bind_group(1, &texture.bind_group, &[]);
                    pass.draw(0..UNIT_QUAD.len() as u32, run.instances.clone());
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl Gpu for WgpuGpu {
    fn create_texture_2d(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId, GpuError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GpuError::InvalidSize { width: desc.width, height: desc.height, layers: 1 });
        }
        let size = wgpu::Extent3d { width: desc.width, height: desc.height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texture_2d"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        if let Some(data) = pixels {
            let expected = desc.width as usize * desc.height as usize * desc.pixel_format.bytes_per_pixel();
            if data.len() < expected {
                texture.destroy();
                return Err(GpuError::PixelDataSize { expected, actual: data.len() });
            }
            let mut rgba = to_rgba(&data[..expected], desc.pixel_format);
            if desc.format == TextureFormat::Bgra8 {
                for px in rgba.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
            }
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * desc.width),
                    rows_per_image: Some(desc.height),
                },
                size,
            );
        }

        let bind_group = self.texture_bind_group(&texture, &desc.sampler, false);
        let id = TextureId(self.allocate_id());
        self.textures.insert(id, GpuTexture { texture, bind_group, is_array: false });
        Ok(id)
    }

    fn create_texture_array(&mut self, desc: &TextureArrayDesc) -> Result<TextureId, GpuError> {
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            return Err(GpuError::InvalidSize { width: desc.width, height: desc.height, layers: desc.layers });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texture_array"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let bind_group = self.texture_bind_group(&texture, &desc.sampler, true);
        let id = TextureId(self.allocate_id());
        self.textures.insert(id, GpuTexture { texture, bind_group, is_array: true });
        Ok(id)
    }

    fn copy_to_layer(
        &mut self,
        src: TextureId,
        src_origin: [u32; 2],
        dst: TextureId,
        layer: u32,
        size: [u32; 2],
    ) -> Result<(), GpuError> {
        let source = self.textures.get(&src).ok_or(GpuError::UnknownTexture(src))?;
        let target = self.textures.get(&dst).ok_or(GpuError::UnknownTexture(dst))?;
        if !target.is_array {
            return Err(GpuError::NotAnArray(dst));
        }

        let [x, y] = src_origin;
        let [w, h] = size;
        let fits_source = x + w <= source.texture.width() && y + h <= source.texture.height();
        let fits_target = layer < target.texture.depth_or_array_layers()
            && w <= target.texture.width()
            && h <= target.texture.height();
        if !fits_source || !fits_target {
            return Err(GpuError::CopyOutOfRange { x, y, width: w, height: h, layer });
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("copy_to_layer") });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        for slot in &mut self.bound {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if self.in_frame {
            self.pending_destroy.push(id);
        } else if let Some(t) = self.textures.remove(&id) {
            t.texture.destroy();
        }
    }

    fn compile_shader(&mut self, source: &ShaderProgramSource) -> Result<ShaderId, GpuError> {
        validate_wgsl(&source.vertex, ShaderStage::Vertex, &source.label)?;
        validate_wgsl(&source.fragment, ShaderStage::Fragment, &source.label)?;

        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}_vert", source.label)),
            source: wgpu::ShaderSource::Wgsl(source.vertex.as_str().into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}_frag", source.label)),
            source: wgpu::ShaderSource::Wgsl(source.fragment.as_str().into()),
        });

        let texture_layout = match source.kind {
            ShaderKind::Sprite => &self.sprite_bind_group_layout,
            ShaderKind::Array => &self.array_bind_group_layout,
        };
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}_layout", source.label)),
            bind_group_layouts: &[&self.projection_bind_group_layout, texture_layout],
            ..Default::default()
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&source.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::layout(), QuadInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let id = ShaderId(self.allocate_id());
        self.shaders.insert(id, GpuShader { pipeline, kind: source.kind });
        Ok(id)
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        self.shaders.remove(&id);
    }

    fn bind_texture(&mut self, unit: TextureUnit, id: TextureId) {
        self.bound[unit.index()] = Some(id);
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.queue.write_buffer(
            &self.projection_buffer,
            0,
            bytemuck::cast_slice(&projection.to_cols_array()),
        );
    }

    fn draw_quad(&mut self, draw: &QuadDraw) {
        let Some(kind) = self.shaders.get(&draw.shader).map(|s| s.kind) else {
            log::warn!("[gpu] Draw with unknown shader {:?}", draw.shader);
            return;
        };
        let Some(texture) = self.bound[kind.unit().index()] else {
            log::warn!("[gpu] Draw with nothing bound to {:?}", kind.unit());
            return;
        };

        let index = self.instances.len() as u32;
        self.instances.push(QuadInstance::from_draw(draw));
        match self.runs.last_mut() {
            Some(run) if run.shader == draw.shader && run.texture == texture => {
                run.instances.end = index + 1;
            }
            _ => self.runs.push(DrawRun { shader: draw.shader, texture, instances: index..index + 1 }),
        }
    }

    fn begin_frame(&mut self) {
        self.instances.clear();
        self.runs.clear();
        self.in_frame = true;
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        let result = self.submit_frame();
        self.in_frame = false;
        self.release_pending();
        self.instances.clear();
        self.runs.clear();
        result
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn texture_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8 => wgpu::TextureFormat::Bgra8UnormSrgb,
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
    }
}
