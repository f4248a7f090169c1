// engine renderer

use anyhow::{anyhow, Context};
use bytemuck::{Pod, Zeroable};
use glyphon::{Attrs, Buffer, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache, TextArea, TextAtlas, TextBounds, TextRenderer as GlyphRenderer};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;
use crate::common::ShadedVertex;
use crate::controller::Controller;
use crate::terrain::{TerrainMesh, TerrainState};

// --- UNIFORMS ---

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [f32; 16],
}

// one terrain upload; replaced whole on regenerate
struct TerrainBuffers {
    fill_buf: wgpu::Buffer,
    fill_verts: u32,
    outline_v_buf: wgpu::Buffer,
    outline_i_buf: wgpu::Buffer,
    outline_inds: u32,
}

// --- RENDERER STRUCT ---

pub struct Renderer<'a> {
    pub window: &'a Window,
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,

    // --- TEXT ENGINE ---
    font_system: FontSystem,
    swash_cache: SwashCache,
    text_atlas: TextAtlas,
    text_renderer: GlyphRenderer,

    // --- CORE ---
    pipeline_fill: wgpu::RenderPipeline,
    pipeline_line: wgpu::RenderPipeline,
    global_buf: wgpu::Buffer,
    global_bind: wgpu::BindGroup,
    depth: wgpu::TextureView,

    terrain: Option<TerrainBuffers>,

    // --- FPS ---
    last_fps_time: std::time::Instant,
    frame_count: u32,
    current_fps: u32,
}

impl<'a> Renderer<'a> {
    pub async fn new(window: &'a Window) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window).context("failed to create surface")?;

        let adapter = instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }).await.ok_or_else(|| anyhow!("no compatible graphics adapter"))?;

        crate::system_diagnostics::SystemDiagnostics::log_gpu(&adapter.get_info());

        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor {
            label: None, required_features: wgpu::Features::empty(), required_limits: wgpu::Limits::default(),
        }, None).await.context("failed to open graphics device")?;

        let size = window.inner_size();
        let mut config = surface.get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;
        config.present_mode = wgpu::PresentMode::AutoVsync;
        surface.configure(&device, &config);

        let font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let mut text_atlas = TextAtlas::new(&device, &queue, config.format);
        let text_renderer = GlyphRenderer::new(&mut text_atlas, &device, wgpu::MultisampleState::default(), None);

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None },
                count: None,
            }],
            label: Some("global_layout"),
        });

        let global_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global Uniform"),
            contents: bytemuck::cast_slice(&[GlobalUniform { view_proj: glam::Mat4::IDENTITY.to_cols_array() }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let global_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: global_buf.as_entire_binding() }],
            label: None,
        });

        // --- PIPELINES ---
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor { label: None, source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()) });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor { label: None, bind_group_layouts: &[&global_layout], push_constant_ranges: &[] });

        let pipeline_fill = Self::create_pipeline(&device, &config, &layout, &shader, wgpu::PrimitiveTopology::TriangleList);
        let pipeline_line = Self::create_pipeline(&device, &config, &layout, &shader, wgpu::PrimitiveTopology::LineList);
        let depth = Self::mk_depth(&device, &config);

        Ok(Self {
            window, surface, device, queue, config,
            font_system,
            swash_cache,
            text_atlas,
            text_renderer,
            pipeline_fill, pipeline_line,
            global_buf, global_bind,
            depth,
            terrain: None,
            last_fps_time: std::time::Instant::now(),
            frame_count: 0,
            current_fps: 0,
        })
    }

    fn create_pipeline(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, layout: &wgpu::PipelineLayout, shader: &wgpu::ShaderModule, topology: wgpu::PrimitiveTopology) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None, layout: Some(layout),
            vertex: wgpu::VertexState { module: shader, entry_point: "vs_main", buffers: &[wgpu::VertexBufferLayout { array_stride: std::mem::size_of::<ShadedVertex>() as _, step_mode: wgpu::VertexStepMode::Vertex, attributes: &[wgpu::VertexAttribute { format: wgpu::VertexFormat::Float32x3, offset: 0, shader_location: 0 }, wgpu::VertexAttribute { format: wgpu::VertexFormat::Float32x3, offset: 12, shader_location: 1 }] }]},
            fragment: Some(wgpu::FragmentState { module: shader, entry_point: "fs_main", targets: &[Some(config.format.into())] }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: None,
                ..Default::default()
            },
            // outlines sit exactly on the surface, so equal depth has to pass
            depth_stencil: Some(wgpu::DepthStencilState { format: wgpu::TextureFormat::Depth32Float, depth_write_enabled: true, depth_compare: wgpu::CompareFunction::LessEqual, stencil: Default::default(), bias: Default::default() }),
            multisample: Default::default(), multiview: None,
        })
    }

    fn mk_depth(dev: &wgpu::Device, cfg: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
        dev.create_texture(&wgpu::TextureDescriptor { size: wgpu::Extent3d { width: cfg.width, height: cfg.height, depth_or_array_layers: 1 }, mip_level_count: 1, sample_count: 1, dimension: wgpu::TextureDimension::D2, format: wgpu::TextureFormat::Depth32Float, usage: wgpu::TextureUsages::RENDER_ATTACHMENT, label: Some("Depth"), view_formats: &[] }).create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 { return; } // minimised
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = Self::mk_depth(&self.device, &self.config);
        debug!("surface resized to {}x{}", width, height);
    }

    /// Replaces the gpu copy of the terrain. Called only after a regenerate.
    pub fn upload_terrain(&mut self, mesh: &TerrainMesh) {
        if mesh.vertices.is_empty() {
            self.terrain = None;
            return;
        }

        let fill = mesh.shaded_vertices();
        let outline_v = mesh.outline_vertices();
        let outline_i = mesh.outline_indices();

        let fill_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some("Terrain V"), contents: bytemuck::cast_slice(&fill), usage: wgpu::BufferUsages::VERTEX });
        let outline_v_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some("Outline V"), contents: bytemuck::cast_slice(&outline_v), usage: wgpu::BufferUsages::VERTEX });
        let outline_i_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some("Outline I"), contents: bytemuck::cast_slice(&outline_i), usage: wgpu::BufferUsages::INDEX });

        self.terrain = Some(TerrainBuffers {
            fill_buf,
            fill_verts: fill.len() as u32,
            outline_v_buf,
            outline_i_buf,
            outline_inds: outline_i.len() as u32,
        });
        debug!("uploaded {} fill vertices, {} outline indices", fill.len(), outline_i.len());
    }

    pub fn render(&mut self, controller: &Controller, state: &TerrainState) -> anyhow::Result<()> {
        let out = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(anyhow!("surface out of memory")),
            Err(e) => {
                warn!("dropped frame: {}", e);
                return Ok(());
            }
        };
        let view = out.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mvp = controller.get_matrix(self.config.width as f32, self.config.height as f32);
        self.queue.write_buffer(&self.global_buf, 0, bytemuck::cast_slice(&[GlobalUniform { view_proj: mvp.to_cols_array() }]));

        let mut enc = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

        // --- PASS 1: TERRAIN ---
        {
            let mut pass = enc.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Terrain Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::WHITE), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment { view: &self.depth, depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }), stencil_ops: None }),
                timestamp_writes: None, occlusion_query_set: None,
            });

            if let Some(t) = &self.terrain {
                pass.set_bind_group(0, &self.global_bind, &[]);

                pass.set_pipeline(&self.pipeline_fill);
                pass.set_vertex_buffer(0, t.fill_buf.slice(..));
                pass.draw(0..t.fill_verts, 0..1);

                if state.show_lines() {
                    pass.set_pipeline(&self.pipeline_line);
                    pass.set_vertex_buffer(0, t.outline_v_buf.slice(..));
                    pass.set_index_buffer(t.outline_i_buf.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..t.outline_inds, 0, 0..1);
                }
            }
        }

        // --- FPS CALCULATION ---
        self.frame_count += 1;
        let now = std::time::Instant::now();
        if now.duration_since(self.last_fps_time).as_secs_f32() >= 1.0 {
            self.current_fps = self.frame_count;
            self.frame_count = 0;
            self.last_fps_time = now;
            self.window.set_title(&format!("FPS: {}", self.current_fps));
        }

        // --- PASS 2: HUD TEXT ---
        {
            let hud = format!(
                "FPS: {}\nsize {}  seed {}  terrain #{}\nR regenerate  F outlines  Esc quit",
                self.current_fps, state.size(), state.seed(), state.generation()
            );
            let mut hud_buffer = Buffer::new(&mut self.font_system, Metrics::new(16.0, 20.0));
            hud_buffer.set_size(&mut self.font_system, self.config.width as f32, self.config.height as f32);
            hud_buffer.set_text(&mut self.font_system, &hud, Attrs::new().family(Family::Monospace).color(glyphon::Color::rgb(20, 20, 20)), Shaping::Advanced);

            let text_areas = [TextArea {
                buffer: &hud_buffer,
                left: 10.0,
                top: 10.0,
                scale: 1.0,
                bounds: TextBounds { left: 0, top: 0, right: self.config.width as i32, bottom: self.config.height as i32 },
                default_color: glyphon::Color::rgb(0, 0, 0),
            }];

            self.text_renderer.prepare(
                &self.device,
                &self.queue,
                &mut self.font_system,
                &mut self.text_atlas,
                Resolution { width: self.config.width, height: self.config.height },
                text_areas,
                &mut self.swash_cache,
            ).context("failed to prepare hud text")?;

            let mut pass = enc.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Text Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.text_renderer.render(&self.text_atlas, &mut pass).context("failed to draw hud text")?;
        }

        self.queue.submit(std::iter::once(enc.finish()));
        out.present();
        self.text_atlas.trim();
        Ok(())
    }

    pub fn log_memory(&self) {
        if let Some(t) = &self.terrain {
            let bytes = t.fill_verts as usize * std::mem::size_of::<ShadedVertex>() + t.outline_inds as usize * 4;
            info!("terrain gpu memory: {:.1} KiB", bytes as f32 / 1024.0);
        }
    }
}
