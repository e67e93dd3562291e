use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::compile::{compile_fragment_shader, compile_vertex_shader, ShaderKind};
use crate::scene::{Blending, Material, Shading, Side, Vertex};

use super::context::DEPTH_FORMAT;
use super::mesh::point_layout;

/// Bind group layouts and the shared pipeline layout (set 0 = frame, set 1 = node).
pub(crate) struct PipelineLayouts {
    pub frame_layout: wgpu::BindGroupLayout,
    pub node_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame_layout = uniform_layout(device, "frame uniform layout");
        let node_layout = uniform_layout(device, "node uniform layout");
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[&frame_layout, &node_layout],
            push_constant_ranges: &[],
        });
        Self {
            frame_layout,
            node_layout,
            pipeline_layout,
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Everything that distinguishes one render pipeline from another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub shader: ShaderKind,
    pub blending: Blending,
    pub side: Side,
    pub depth_write: bool,
}

impl PipelineKey {
    pub fn for_material(material: &Material) -> Self {
        let shader = match material.shading {
            Shading::Basic { .. } => ShaderKind::Basic,
            Shading::Standard { .. } => ShaderKind::Standard,
            Shading::AccretionDisk(_) => ShaderKind::AccretionDisk,
            Shading::Lensing(_) => ShaderKind::Lensing,
        };
        Self {
            shader,
            blending: material.blending,
            side: material.side,
            depth_write: material.depth_write,
        }
    }

    pub fn for_points() -> Self {
        Self {
            shader: ShaderKind::Points,
            blending: Blending::Normal,
            side: Side::Double,
            depth_write: false,
        }
    }

    /// Opaque-ish geometry first, then the additive glow layers, so the
    /// horizon occludes whatever sits behind it.
    pub fn draw_order(&self) -> u8 {
        match (self.shader, self.blending) {
            (ShaderKind::Points, _) => 0,
            (_, Blending::Normal) => 1,
            (_, Blending::Additive) => 2,
        }
    }
}

#[derive(Default)]
struct ShaderModules {
    vertex: HashMap<ShaderKind, wgpu::ShaderModule>,
    fragment: HashMap<ShaderKind, wgpu::ShaderModule>,
}

/// Pipelines keyed by material properties, built on first use.
pub(crate) struct PipelineCache {
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
    modules: ShaderModules,
    entries: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(surface_format: wgpu::TextureFormat, sample_count: u32) -> Self {
        Self {
            surface_format,
            sample_count,
            modules: ShaderModules::default(),
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.entries.get(key)
    }

    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        key: PipelineKey,
    ) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Ok(());
        }

        if !self.modules.vertex.contains_key(&key.shader) {
            let module = compile_vertex_shader(device, key.shader)?;
            self.modules.vertex.insert(key.shader, module);
        }
        if !self.modules.fragment.contains_key(&key.shader) {
            let module = compile_fragment_shader(device, key.shader)?;
            self.modules.fragment.insert(key.shader, module);
        }
        let vertex = self
            .modules
            .vertex
            .get(&key.shader)
            .context("vertex module missing after compilation")?;
        let fragment = self
            .modules
            .fragment
            .get(&key.shader)
            .context("fragment module missing after compilation")?;

        let pipeline = build_pipeline(
            device,
            layouts,
            vertex,
            fragment,
            key,
            self.surface_format,
            self.sample_count,
        );
        tracing::debug!(?key, "built render pipeline");
        self.entries.insert(key, pipeline);
        Ok(())
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
    key: PipelineKey,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let (buffers, topology) = match key.shader {
        ShaderKind::Points => (point_layout(), wgpu::PrimitiveTopology::PointList),
        _ => (Vertex::layout(), wgpu::PrimitiveTopology::TriangleList),
    };
    let cull_mode = match key.side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(key.shader.label()),
        layout: Some(&layouts.pipeline_layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some("main"),
            buffers: &[buffers],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
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
            depth_write_enabled: key.depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend_state(key.blending)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}

pub(crate) fn blend_state(blending: Blending) -> wgpu::BlendState {
    match blending {
        Blending::Normal => wgpu::BlendState::ALPHA_BLENDING,
        Blending::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}
