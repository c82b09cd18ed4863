// src/rendering_lib/renderer.rs

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::backend::{RenderBackend, Viewport};
use super::texture::Texture;
use super::vertex::Vertex;
use crate::assets;
use crate::engine_lib::camera::Camera;
use crate::engine_lib::scene_types::{Entity, EntityId, Scene, Shading, Side};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
// Draw slots available per frame; a stereo frame with the modal and reticle uses eight.
const MAX_DRAWS_PER_FRAME: u64 = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    triangle_buffer: wgpu::Buffer,
    triangle_count: u32,
    line_buffer: wgpu::Buffer,
    line_count: u32,
}

/// Clears requested since the last pass; the next pass turns them into load operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PendingClears {
    color: bool,
    depth: bool,
}

impl PendingClears {
    fn request_all(&mut self) {
        self.color = true;
        self.depth = true;
    }

    fn request_depth(&mut self) {
        self.depth = true;
    }

    fn any(&self) -> bool {
        self.color || self.depth
    }

    fn take_load_ops(&mut self, clear_color: wgpu::Color) -> (wgpu::LoadOp<wgpu::Color>, wgpu::LoadOp<f32>) {
        let color = if self.color { wgpu::LoadOp::Clear(clear_color) } else { wgpu::LoadOp::Load };
        let depth = if self.depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load };
        *self = Self::default();
        (color, depth)
    }
}

struct BoundTexture {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

impl BoundTexture {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, texture: Texture, label: &str) -> Self {
        let bind_group = texture.bind_group(device, layout, label);
        Self { _texture: texture, bind_group }
    }
}

/// Shader mode, tint, and image for a material.
fn shading_params(shading: &Shading) -> (f32, [f32; 3], Option<&str>) {
    match shading {
        Shading::Normal => (0.0, [1.0, 1.0, 1.0], None),
        Shading::Basic { color } => (1.0, *color, None),
        Shading::Sprite { color, texture } => (2.0, *color, texture.as_deref()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PipelineKind {
    Front,
    Back,
    Double,
    Lines,
}

struct Pipelines {
    front: wgpu::RenderPipeline,
    back: wgpu::RenderPipeline,
    double: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
}

impl Pipelines {
    fn get(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Front => &self.front,
            PipelineKind::Back => &self.back,
            PipelineKind::Double => &self.double,
            PipelineKind::Lines => &self.lines,
        }
    }
}

struct DrawItem<'a> {
    id: EntityId,
    texture: Option<&'a str>,
    kind: PipelineKind,
    uniform_offset: u32,
    distance: f32,
    transparent: bool,
}

struct FrameTarget {
    encoder: wgpu::CommandEncoder,
    view: wgpu::TextureView,
}

/// wgpu implementation of [`RenderBackend`].
///
/// Draws are recorded between `begin_frame` and `end_frame`; each `render` call
/// becomes one render pass so per-eye viewports and partial clears map directly
/// onto pass load operations.
pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: Pipelines,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_cursor: u64,
    texture_layout: wgpu::BindGroupLayout,
    white_texture: BoundTexture,
    // `None` marks an image that failed to load; those draws use the white texture.
    textures: HashMap<String, Option<BoundTexture>>,
    depth_view: wgpu::TextureView,
    meshes: HashMap<EntityId, GpuMesh>,
    size: (u32, u32),
    viewport: Viewport,
    auto_clear: bool,
    clears: PendingClears,
    clear_color: wgpu::Color,
    frame: Option<FrameTarget>,
}

impl Renderer {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        shader_source: &str,
        width: u32,
        height: u32,
    ) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Renderer Shader Module"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let uniform_size = std::mem::size_of::<DrawUniforms>() as u64;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = uniform_size.div_ceil(alignment) * alignment;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: uniform_stride * MAX_DRAWS_PER_FRAME,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(uniform_size),
                },
                count: None,
            }],
            label: Some("draw_uniforms_bind_group_layout"),
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(uniform_size),
                }),
            }],
            label: Some("draw_uniforms_bind_group"),
        });

        let texture_layout = Texture::bind_group_layout(&device);
        let white_texture =
            BoundTexture::new(&device, &texture_layout, Texture::white(&device, &queue), "white_texture_bind_group");

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Renderer Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, topology: wgpu::PrimitiveTopology, cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader_module,
                    entry_point: "vs_main",
                    buffers: &[Vertex::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader_module,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
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
            })
        };

        let pipelines = Pipelines {
            front: make_pipeline("Mesh Pipeline (front)", wgpu::PrimitiveTopology::TriangleList, Some(wgpu::Face::Back)),
            back: make_pipeline("Mesh Pipeline (back)", wgpu::PrimitiveTopology::TriangleList, Some(wgpu::Face::Front)),
            double: make_pipeline("Mesh Pipeline (double)", wgpu::PrimitiveTopology::TriangleList, None),
            lines: make_pipeline("Wireframe Pipeline", wgpu::PrimitiveTopology::LineList, None),
        };

        let depth_view = create_depth_view(&device, width, height);

        Self {
            device,
            queue,
            pipelines,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_cursor: 0,
            texture_layout,
            white_texture,
            textures: HashMap::new(),
            depth_view,
            meshes: HashMap::new(),
            size: (width, height),
            viewport: Viewport::full(width, height),
            auto_clear: true,
            clears: PendingClears::default(),
            clear_color: wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 },
            frame: None,
        }
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Command Encoder"),
        });
        self.uniform_cursor = 0;
        self.frame = Some(FrameTarget { encoder, view });
    }

    /// Finishes the frame started by `begin_frame`. Clears requested after the last draw still land.
    pub fn end_frame(&mut self) -> Option<wgpu::CommandBuffer> {
        if self.clears.any() {
            self.record_pass(&[]);
        }
        self.frame.take().map(|frame| frame.encoder.finish())
    }

    fn upload_missing_meshes(&mut self, scene: &Scene) {
        self.meshes.retain(|id, _| scene.contains(*id));
        for (id, entity) in scene.iter() {
            if self.meshes.contains_key(&id) {
                continue;
            }
            self.meshes.insert(id, upload_mesh(&self.device, &entity.name, entity));
        }
    }

    fn load_texture(&mut self, name: &str) {
        if self.textures.contains_key(name) {
            return;
        }
        let bound = match assets::load_image(name) {
            Ok(img) => {
                log::debug!("uploading texture {name} ({}x{})", img.width(), img.height());
                let texture = Texture::from_image(&self.device, &self.queue, &img, name);
                Some(BoundTexture::new(&self.device, &self.texture_layout, texture, name))
            }
            Err(err) => {
                log::warn!("{err}; drawing without it");
                None
            }
        };
        self.textures.insert(name.to_string(), bound);
    }

    fn record_pass(&mut self, items: &[DrawItem]) {
        let (color_load, depth_load) = self.clears.take_load_ops(self.clear_color);
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass (Renderer)"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations { load: color_load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations { load: depth_load, store: wgpu::StoreOp::Store }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if items.is_empty() {
            return;
        }

        let vp = clamp_viewport(self.viewport, self.size);
        if vp.width <= 0.0 || vp.height <= 0.0 {
            return;
        }
        render_pass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);

        for item in items {
            let Some(mesh) = self.meshes.get(&item.id) else { continue };
            render_pass.set_pipeline(self.pipelines.get(item.kind));
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[item.uniform_offset]);
            render_pass.set_bind_group(1, texture_bind_group(&self.textures, &self.white_texture, item.texture), &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            if item.kind == PipelineKind::Lines {
                if mesh.line_count == 0 { continue; }
                render_pass.set_index_buffer(mesh.line_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.line_count, 0, 0..1);
            } else {
                if mesh.triangle_count == 0 { continue; }
                render_pass.set_index_buffer(mesh.triangle_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.triangle_count, 0, 0..1);
            }
        }
    }
}

impl RenderBackend for Renderer {
    fn set_size(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        self.size = (width, height);
        self.viewport = Viewport::full(width, height);
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_auto_clear(&mut self, auto_clear: bool) {
        self.auto_clear = auto_clear;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn clear(&mut self) {
        self.clears.request_all();
    }

    fn clear_depth(&mut self) {
        self.clears.request_depth();
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        if self.frame.is_none() {
            log::warn!("Renderer::render called outside begin_frame/end_frame; skipping");
            return;
        }
        if self.auto_clear {
            self.clear();
        }
        self.upload_missing_meshes(scene);

        let view_proj = camera.view_projection();
        let mut items = Vec::with_capacity(scene.len());
        for (id, entity) in scene.iter() {
            if self.uniform_cursor + self.uniform_stride > self.uniform_buffer.size() {
                log::warn!("Renderer: per-frame draw budget exhausted, dropping remaining draws");
                break;
            }
            let material = &entity.material;
            let (mode, color, texture) = shading_params(&material.shading);
            if let Some(name) = texture {
                self.load_texture(name);
            }
            let uniforms = DrawUniforms {
                view_proj: view_proj.to_cols_array_2d(),
                model: entity.world_matrix.to_cols_array_2d(),
                color: [color[0], color[1], color[2], 1.0],
                params: [mode, material.effective_opacity(), 0.0, 0.0],
            };
            let offset = self.uniform_cursor;
            self.queue.write_buffer(&self.uniform_buffer, offset, bytemuck::bytes_of(&uniforms));
            self.uniform_cursor += self.uniform_stride;

            let kind = if material.wireframe {
                PipelineKind::Lines
            } else {
                match material.side {
                    Side::Front => PipelineKind::Front,
                    Side::Back => PipelineKind::Back,
                    Side::Double => PipelineKind::Double,
                }
            };
            let center = entity.world_matrix.transform_point3(entity.geometry.bounds.center());
            let distance = (view_proj * center.extend(1.0)).w;
            items.push(DrawItem {
                id,
                texture,
                kind,
                uniform_offset: offset as u32,
                distance,
                transparent: material.transparent,
            });
        }

        // Opaque first in insertion order, then transparent far to near.
        items.sort_by(|a, b| match (a.transparent, b.transparent) {
            (false, true) => std::cmp::Ordering::Less,
            (true, false) => std::cmp::Ordering::Greater,
            (true, true) => b.distance.partial_cmp(&a.distance).unwrap_or(std::cmp::Ordering::Equal),
            (false, false) => a.id.cmp(&b.id),
        });

        self.record_pass(&items);
    }
}

fn texture_bind_group<'t>(
    textures: &'t HashMap<String, Option<BoundTexture>>,
    white: &'t BoundTexture,
    name: Option<&str>,
) -> &'t wgpu::BindGroup {
    name.and_then(|name| textures.get(name))
        .and_then(Option::as_ref)
        .map_or(&white.bind_group, |bound| &bound.bind_group)
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_mesh(device: &wgpu::Device, name: &str, entity: &Entity) -> GpuMesh {
    let geometry = &entity.geometry;
    let vertices = Vertex::from_geometry(geometry);
    // Zero-sized buffers are invalid, so empty index lists upload a single dummy index.
    let triangles: &[u32] = if geometry.indices.is_empty() { &[0] } else { &geometry.indices };
    let lines: &[u32] = if geometry.line_indices.is_empty() { &[0] } else { &geometry.line_indices };

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name} Vertex Buffer")),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let triangle_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name} Index Buffer")),
        contents: bytemuck::cast_slice(triangles),
        usage: wgpu::BufferUsages::INDEX,
    });
    let line_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name} Line Index Buffer")),
        contents: bytemuck::cast_slice(lines),
        usage: wgpu::BufferUsages::INDEX,
    });

    GpuMesh {
        vertex_buffer,
        triangle_buffer,
        triangle_count: geometry.indices.len() as u32,
        line_buffer,
        line_count: geometry.line_indices.len() as u32,
    }
}

fn clamp_viewport(viewport: Viewport, (width, height): (u32, u32)) -> Viewport {
    let (w, h) = (width as f32, height as f32);
    let x = viewport.x.clamp(0.0, w);
    let y = viewport.y.clamp(0.0, h);
    Viewport {
        x,
        y,
        width: viewport.width.clamp(0.0, w - x),
        height: viewport.height.clamp(0.0, h - y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_clamped_to_target() {
        let vp = clamp_viewport(Viewport { x: 600.0, y: 0.0, width: 600.0, height: 800.0 }, (1000, 700));
        assert_eq!(vp, Viewport { x: 600.0, y: 0.0, width: 400.0, height: 700.0 });
    }

    #[test]
    fn pending_clears_become_load_ops_once() {
        let black = wgpu::Color::BLACK;
        let mut clears = PendingClears::default();

        // clear, render: both attachments cleared.
        clears.request_all();
        assert!(clears.any());
        let (color, depth) = clears.take_load_ops(black);
        assert!(matches!(color, wgpu::LoadOp::Clear(c) if c == black));
        assert!(matches!(depth, wgpu::LoadOp::Clear(d) if d == 1.0));
        assert!(!clears.any());

        // clear_depth, render: the first eye's colour survives.
        clears.request_depth();
        let (color, depth) = clears.take_load_ops(black);
        assert!(matches!(color, wgpu::LoadOp::Load));
        assert!(matches!(depth, wgpu::LoadOp::Clear(d) if d == 1.0));

        // render with nothing requested loads both.
        let (color, depth) = clears.take_load_ops(black);
        assert!(matches!(color, wgpu::LoadOp::Load));
        assert!(matches!(depth, wgpu::LoadOp::Load));
    }

    #[test]
    fn sprites_sample_their_image() {
        let sprite = Shading::Sprite { color: [1.0, 0.5, 1.0], texture: Some("images/press-button.png".into()) };
        assert_eq!(shading_params(&sprite), (2.0, [1.0, 0.5, 1.0], Some("images/press-button.png")));
        assert_eq!(shading_params(&Shading::Basic { color: [0.2, 0.2, 0.2] }), (1.0, [0.2, 0.2, 0.2], None));
        assert_eq!(shading_params(&Shading::Normal).0, 0.0);
    }

    #[test]
    fn draw_uniforms_fit_one_aligned_slot() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 160);
        assert!(std::mem::size_of::<DrawUniforms>() as u64 <= 256);
    }
}
