use wgpu::util::DeviceExt;

use crate::scene::{MeshData, PointCloud};

/// Vertex/index buffers uploaded once at start-up.
pub(crate) enum GpuGeometry {
    Indexed {
        vertices: wgpu::Buffer,
        indices: wgpu::Buffer,
        index_count: u32,
    },
    Points {
        positions: wgpu::Buffer,
        count: u32,
    },
}

impl GpuGeometry {
    pub fn from_mesh(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self::Indexed {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }

    /// Returns `None` for an empty cloud; wgpu rejects zero-sized buffers.
    pub fn from_points(device: &wgpu::Device, label: &str, points: &PointCloud) -> Option<Self> {
        if points.positions.is_empty() {
            return None;
        }
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&points.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Some(Self::Points {
            positions,
            count: points.positions.len() as u32,
        })
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        match self {
            GpuGeometry::Indexed {
                vertices,
                indices,
                index_count,
            } => {
                pass.set_vertex_buffer(0, vertices.slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }
            GpuGeometry::Points { positions, count } => {
                pass.set_vertex_buffer(0, positions.slice(..));
                pass.draw(0..*count, 0..1);
            }
        }
    }
}

pub(crate) fn point_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}
