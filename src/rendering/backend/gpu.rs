//! Offscreen wgpu backend
//!
//! Renders into an RGBA texture and reads the result back so the UI can show
//! it as an ordinary image. The host window keeps its own renderer.

use bytemuck::{Pod, Zeroable};
use crossbeam_channel::bounded;
use image::RgbaImage;
use std::mem;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use super::{
    Frame, GeometryHandle, MaterialHandle, RenderBackend, ResourceCounts, ResourceTable,
    TextureDesc, TextureHandle, TextureUsage,
};
use crate::rendering::camera::CameraUniform;
use crate::rendering::geometry::{Geometry, Vertex};
use crate::rendering::light::LightUniform;
use crate::rendering::material::Material;
use crate::rendering::surface::SurfaceSize;
use crate::rendering::{SceneError, SceneResult};
use crate::utils::logging::{handle_wgpu_result, log_adapter_info};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MAX_DRAWS: usize = 64;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GlobalsUniform {
    camera: CameraUniform,
    light: LightUniform,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

struct Targets {
    size: SurfaceSize,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_bytes_per_row: u32,
}

impl Targets {
    fn new(device: &wgpu::Device, size: SurfaceSize) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        };
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Preview Color Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Preview Depth Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let unpadded = size.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded.div_ceil(align) * align;
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Preview Readback Buffer"),
            size: (padded_bytes_per_row * size.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            size,
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            color_texture,
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_texture,
            readback,
            padded_bytes_per_row,
        }
    }

    fn destroy(&self) {
        self.color_texture.destroy();
        self.depth_texture.destroy();
        self.readback.destroy();
    }
}

struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    targets: Targets,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u64,
    opaque_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    image: RgbaImage,
}

pub struct WgpuBackend {
    context: Option<GpuContext>,
    meshes: ResourceTable<GpuMesh>,
    materials: ResourceTable<Material>,
    textures: ResourceTable<wgpu::Texture>,
}

impl WgpuBackend {
    pub fn new() -> Self {
        Self {
            context: None,
            meshes: ResourceTable::new(),
            materials: ResourceTable::new(),
            textures: ResourceTable::new(),
        }
    }

    fn context(&self) -> SceneResult<&GpuContext> {
        self.context
            .as_ref()
            .ok_or_else(|| SceneError::backend("no active context"))
    }

    async fn create_device() -> SceneResult<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SceneError::unsupported("no compatible graphics adapter"))?;
        log_adapter_info(&adapter);

        let (device, queue) = handle_wgpu_result(
            adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("Preview Device"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::downlevel_defaults(),
                        memory_hints: wgpu::MemoryHints::default(),
                    },
                    None,
                )
                .await,
            "request_device",
        )
        .map_err(|e| SceneError::unsupported(e.to_string()))?;

        Ok((device, queue))
    }

    fn build_context(device: wgpu::Device, queue: wgpu::Queue, size: SurfaceSize) -> GpuContext {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Avatar Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/avatar.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("globals_bind_group_layout"),
        });

        let draw_size = mem::size_of::<DrawUniform>() as u64;
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(draw_size),
                },
                count: None,
            }],
            label: Some("draw_bind_group_layout"),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[GlobalsUniform {
                camera: CameraUniform::new(),
                light: LightUniform::default(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let draw_stride = draw_size.div_ceil(alignment) * alignment;
        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: draw_stride * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(draw_size),
                }),
            }],
            label: Some("draw_bind_group"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Preview Pipeline Layout"),
            bind_group_layouts: &[&globals_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = create_pipeline(&device, &layout, &shader, "Opaque Pipeline", None, true);
        let transparent_pipeline = create_pipeline(
            &device,
            &layout,
            &shader,
            "Transparent Pipeline",
            Some(wgpu::BlendState::ALPHA_BLENDING),
            false,
        );
        info!("Preview pipelines created");

        let targets = Targets::new(&device, size);
        GpuContext {
            device,
            queue,
            targets,
            globals_buffer,
            globals_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            opaque_pipeline,
            transparent_pipeline,
            image: RgbaImage::new(size.width, size.height),
        }
    }

    /// Copy the color target into `ctx.image`
    fn read_back(ctx: &mut GpuContext) -> SceneResult<()> {
        let targets = &ctx.targets;
        let slice = targets.readback.slice(..);
        let (tx, rx) = bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| SceneError::backend(e.to_string()))?
            .map_err(|e| SceneError::backend(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            let row_bytes = (targets.size.width * 4) as usize;
            let padded = targets.padded_bytes_per_row as usize;
            let pixels: &mut [u8] = &mut ctx.image;
            for (row, chunk) in data.chunks(padded).take(targets.size.height as usize).enumerate() {
                pixels[row * row_bytes..(row + 1) * row_bytes].copy_from_slice(&chunk[..row_bytes]);
            }
        }
        targets.readback.unmap();
        Ok(())
    }
}

impl Default for WgpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(blend.unwrap_or(wgpu::BlendState::REPLACE)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
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
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn create_context(&mut self, size: SurfaceSize) -> SceneResult<()> {
        if size.is_empty() {
            return Err(SceneError::unsupported("surface has zero area"));
        }
        if self.context.is_some() {
            return Err(SceneError::backend("context already created"));
        }
        info!("Initializing wgpu preview context {}x{}", size.width, size.height);
        let (device, queue) = pollster::block_on(Self::create_device())?;
        self.context = Some(Self::build_context(device, queue, size));
        Ok(())
    }

    fn release_context(&mut self) {
        let Some(ctx) = self.context.take() else {
            return;
        };
        // Anything the scene failed to hand back goes with the device
        let leftover = self.meshes.len() + self.textures.len();
        if leftover > 0 {
            warn!("Releasing context with {} GPU resources still live", leftover);
        }
        for mesh in self.meshes.drain() {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
        for texture in self.textures.drain() {
            texture.destroy();
        }
        ctx.targets.destroy();
        ctx.globals_buffer.destroy();
        ctx.draw_buffer.destroy();
        ctx.device.destroy();
        info!("wgpu preview context released");
    }

    fn has_context(&self) -> bool {
        self.context.is_some()
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            return;
        }
        if let Some(ctx) = self.context.as_mut() {
            if ctx.targets.size == size {
                return;
            }
            debug!("Resizing preview targets to {}x{}", size.width, size.height);
            ctx.targets.destroy();
            ctx.targets = Targets::new(&ctx.device, size);
            ctx.image = RgbaImage::new(size.width, size.height);
        }
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> SceneResult<GeometryHandle> {
        let ctx = self.context()?;
        let vertex_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", geometry.label)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", geometry.label)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let mesh = GpuMesh {
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
        };
        Ok(GeometryHandle(self.meshes.insert(mesh)))
    }

    fn release_geometry(&mut self, handle: GeometryHandle) {
        if let Some(mesh) = self.meshes.remove(handle.0) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
    }

    fn create_material(&mut self, material: &Material) -> SceneResult<MaterialHandle> {
        self.context()?;
        Ok(MaterialHandle(self.materials.insert(*material)))
    }

    fn update_material(&mut self, handle: MaterialHandle, material: &Material) {
        if let Some(slot) = self.materials.get_mut(handle.0) {
            *slot = *material;
        }
    }

    fn release_material(&mut self, handle: MaterialHandle) {
        self.materials.remove(handle.0);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> SceneResult<TextureHandle> {
        let ctx = self.context()?;
        let (format, usage) = match desc.usage {
            TextureUsage::ShadowMap => (
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            ),
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        Ok(TextureHandle(self.textures.insert(texture)))
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.remove(handle.0) {
            texture.destroy();
        }
    }

    fn render(&mut self, frame: &Frame) -> SceneResult<()> {
        let draws: Vec<_> = frame.ordered_draws().collect();
        if draws.len() > MAX_DRAWS {
            return Err(SceneError::backend(format!(
                "{} draws exceed the per-frame limit of {}",
                draws.len(),
                MAX_DRAWS
            )));
        }

        let ctx = self
            .context
            .as_mut()
            .ok_or_else(|| SceneError::backend("no active context"))?;

        let globals = GlobalsUniform {
            camera: CameraUniform {
                view_proj: frame.view_proj.into(),
            },
            light: frame.lights,
        };
        ctx.queue
            .write_buffer(&ctx.globals_buffer, 0, bytemuck::cast_slice(&[globals]));

        let stride = ctx.draw_stride as usize;
        let mut draw_data = vec![0u8; stride * draws.len().max(1)];
        for (i, draw) in draws.iter().enumerate() {
            let material = self
                .materials
                .get(draw.material.0)
                .ok_or_else(|| SceneError::backend(format!("unknown material {:?}", draw.material)))?;
            let uniform = DrawUniform {
                model: draw.model.into(),
                color: material.rgba(),
            };
            let bytes = bytemuck::bytes_of(&uniform);
            draw_data[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        ctx.queue.write_buffer(&ctx.draw_buffer, 0, &draw_data);

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Preview Encoder"),
        });
        {
            let clear = frame.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Preview Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &ctx.targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_bind_group(0, &ctx.globals_bind_group, &[]);

            for (i, draw) in draws.iter().enumerate() {
                let mesh = self
                    .meshes
                    .get(draw.geometry.0)
                    .ok_or_else(|| SceneError::backend(format!("unknown geometry {:?}", draw.geometry)))?;
                let pipeline = if draw.transparent {
                    &ctx.transparent_pipeline
                } else {
                    &ctx.opaque_pipeline
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &ctx.draw_bind_group, &[(i * stride) as u32]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }
        }

        let targets = &ctx.targets;
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &targets.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &targets.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(targets.padded_bytes_per_row),
                    rows_per_image: Some(targets.size.height),
                },
            },
            wgpu::Extent3d {
                width: targets.size.width,
                height: targets.size.height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(Some(encoder.finish()));

        Self::read_back(ctx)
    }

    fn frame_image(&self) -> Option<&RgbaImage> {
        self.context.as_ref().map(|ctx| &ctx.image)
    }

    fn live_resources(&self) -> ResourceCounts {
        ResourceCounts {
            contexts: usize::from(self.context.is_some()),
            geometries: self.meshes.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }
}

impl Drop for WgpuBackend {
    fn drop(&mut self) {
        self.release_context();
    }
}
