use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Mat4;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::scene::{NodeId, NodeKind, SceneRuntime};
use crate::types::{AdapterProfile, RendererConfig};

use super::context::{GpuContext, DEPTH_FORMAT};
use super::mesh::GpuGeometry;
use super::pipeline::{PipelineCache, PipelineKey, PipelineLayouts};
use super::uniforms::{FrameUniforms, NodeUniforms};

/// One node of the scene graph with its GPU resources.
struct Drawable {
    node: NodeId,
    key: PipelineKey,
    geometry: GpuGeometry,
    uniforms: NodeUniforms,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct RenderTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct FrameStats {
    frames_since_last_update: u32,
    last_update: Instant,
    frames_per_second: f32,
    frame_count: u64,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frames_since_last_update: 0,
            last_update: Instant::now(),
            frames_per_second: 60.0,
            frame_count: 0,
        }
    }

    fn record(&mut self, now: Instant, shader_time: f32) {
        self.frame_count = self.frame_count.saturating_add(1);
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                time = shader_time,
                "render stats"
            );
        }
    }

    fn frame_budget(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.frames_per_second.max(1.0))
    }
}

pub(crate) struct GpuState {
    context: GpuContext,
    pipelines: PipelineCache,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    drawables: Vec<Drawable>,
    depth_target: RenderTarget,
    multisample_target: Option<RenderTarget>,
    clear_color: wgpu::Color,
    exposure: f32,
    tone_mapping: bool,
    stats: FrameStats,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
        scene: &SceneRuntime,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(
            target,
            initial_size,
            config.antialiasing,
            config.color_space,
        )?;
        let device = &context.device;
        let layouts = PipelineLayouts::new(device);
        let mut pipelines = PipelineCache::new(context.surface_format, context.sample_count);

        let frame_uniforms = FrameUniforms::new(
            Mat4::IDENTITY,
            scene.eye(),
            0.0,
            config.scene.render.exposure,
            true,
            scene.graph().ambient(),
            &[],
        );
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame uniforms"),
            contents: bytemuck::bytes_of(&frame_uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &layouts.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let mut drawables = Vec::new();
        for (id, node) in scene.graph().iter() {
            let (key, geometry, uniforms) = match &node.kind {
                NodeKind::Mesh { geometry, material }
                | NodeKind::Billboard { geometry, material } => (
                    PipelineKey::for_material(material),
                    GpuGeometry::from_mesh(device, &node.name, &geometry.build()),
                    NodeUniforms::for_material(Mat4::IDENTITY, material),
                ),
                NodeKind::Points(cloud) => {
                    let Some(geometry) = GpuGeometry::from_points(device, &node.name, cloud)
                    else {
                        debug!(node = %node.name, "skipping empty point cloud");
                        continue;
                    };
                    (
                        PipelineKey::for_points(),
                        geometry,
                        NodeUniforms::for_points(Mat4::IDENTITY, cloud),
                    )
                }
                NodeKind::Group | NodeKind::Light(_) => continue,
            };

            pipelines.ensure(device, &layouts, key)?;
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&node.name),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&node.name),
                layout: &layouts.node_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            drawables.push(Drawable {
                node: id,
                key,
                geometry,
                uniforms,
                buffer,
                bind_group,
            });
        }
        drawables.sort_by_key(|drawable| drawable.key.draw_order());

        let size = context.size;
        let depth_target = RenderTarget::new(
            device,
            "depth target",
            DEPTH_FORMAT,
            size,
            context.sample_count,
        );
        let multisample_target = (context.sample_count > 1).then(|| {
            RenderTarget::new(
                device,
                "msaa color target",
                context.surface_format,
                size,
                context.sample_count,
            )
        });

        info!(
            drawables = drawables.len(),
            pipelines = pipelines.len(),
            sample_count = context.sample_count,
            color_space = ?context.color_space,
            "scene uploaded to GPU"
        );

        let clear = config.scene.render.clear_color;
        Ok(Self {
            context,
            pipelines,
            frame_buffer,
            frame_bind_group,
            drawables,
            depth_target,
            multisample_target,
            clear_color: wgpu::Color {
                r: clear.r as f64,
                g: clear.g as f64,
                b: clear.b as f64,
                a: 1.0,
            },
            exposure: config.scene.render.exposure,
            tone_mapping: matches!(
                config.scene.render.tone_mapping,
                sceneconfig::ToneMapping::Aces
            ),
            stats: FrameStats::new(),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        let device = &self.context.device;
        self.depth_target = RenderTarget::new(
            device,
            "depth target",
            DEPTH_FORMAT,
            new_size,
            self.context.sample_count,
        );
        if self.context.sample_count > 1 {
            self.multisample_target = Some(RenderTarget::new(
                device,
                "msaa color target",
                self.context.surface_format,
                new_size,
                self.context.sample_count,
            ));
        }
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    pub(crate) fn render(&mut self, scene: &SceneRuntime) -> Result<(), wgpu::SurfaceError> {
        let acquisition_start = Instant::now();
        let frame = self.context.surface.get_current_texture()?;
        let acquisition = acquisition_start.elapsed();
        if acquisition > self.stats.frame_budget() {
            warn!(
                "acquiring frame took {}ms, which is over the frame budget of {}ms (at {} FPS)",
                acquisition.as_millis(),
                self.stats.frame_budget().as_millis(),
                self.stats.frames_per_second.round(),
            );
        }
        self.stats.record(Instant::now(), scene.shader_time());

        let graph = scene.graph();
        let worlds = graph.world_matrices(scene.eye());
        let visibility = graph.visibility();
        let lights = graph.point_lights(&worlds);
        let frame_uniforms = FrameUniforms::new(
            scene.camera().view_projection(),
            scene.eye(),
            scene.shader_time(),
            self.exposure,
            self.tone_mapping,
            graph.ambient(),
            &lights,
        );
        let queue = &self.context.queue;
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame_uniforms));
        for drawable in &mut self.drawables {
            drawable.uniforms.set_model(worlds[drawable.node.index()]);
            queue.write_buffer(&drawable.buffer, 0, bytemuck::bytes_of(&drawable.uniforms));
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let (color_view, resolve_target) = match &self.multisample_target {
                Some(target) => (&target.view, Some(&view)),
                None => (&view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for drawable in &self.drawables {
                if !visibility[drawable.node.index()] {
                    continue;
                }
                let Some(pipeline) = self.pipelines.get(&drawable.key) else {
                    warn!(key = ?drawable.key, "no pipeline for drawable; skipping");
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &drawable.bind_group, &[]);
                drawable.geometry.draw(&mut pass);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Number of pipelines compiled for the scene; exposed for diagnostics.
    pub(crate) fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}
