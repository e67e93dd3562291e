use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Procedural shape descriptors; turned into buffers once at start-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Flat annulus in the local XY plane, normal +Z.
    Ring {
        inner: f32,
        outer: f32,
        theta_segments: u32,
        theta_start: f32,
        theta_length: f32,
    },
}

impl Geometry {
    pub fn full_ring(inner: f32, outer: f32, theta_segments: u32) -> Self {
        Self::Ring {
            inner,
            outer,
            theta_segments,
            theta_start: 0.0,
            theta_length: TAU,
        }
    }

    pub fn build(&self) -> MeshData {
        match *self {
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => sphere(radius, width_segments, height_segments),
            Geometry::Ring {
                inner,
                outer,
                theta_segments,
                theta_start,
                theta_length,
            } => ring(inner, outer, theta_segments, 1, theta_start, theta_length),
        }
    }
}

/// UV sphere. Texture coordinates run u around the equator and v from the
/// north pole (1) to the south pole (0).
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width = width_segments.max(3);
    let height = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((width + 1) * (height + 1)) as usize);

    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        let u_offset = if iy == 0 {
            0.5 / width as f32
        } else if iy == height {
            -0.5 / width as f32
        } else {
            0.0
        };
        let theta = v * PI;
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let phi = u * TAU;
            let position = Vec3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let normal = position.try_normalize().unwrap_or(Vec3::Y);
            vertices.push(Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                uv: [u + u_offset, 1.0 - v],
            });
        }
    }

    let row = width + 1;
    let mut indices = Vec::new();
    for iy in 0..height {
        for ix in 0..width {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData { vertices, indices }
}

/// Annulus (or annulus sector) in the XY plane.
///
/// UVs are planar: `((x / outer + 1) / 2, (y / outer + 1) / 2)`, so they
/// carry no radial information; shaders that need the radius derive it from
/// the local position instead.
pub fn ring(
    inner: f32,
    outer: f32,
    theta_segments: u32,
    phi_segments: u32,
    theta_start: f32,
    theta_length: f32,
) -> MeshData {
    let theta_segments = theta_segments.max(3);
    let phi_segments = phi_segments.max(1);
    let radius_step = (outer - inner) / phi_segments as f32;
    let mut vertices =
        Vec::with_capacity(((theta_segments + 1) * (phi_segments + 1)) as usize);

    for j in 0..=phi_segments {
        let radius = inner + radius_step * j as f32;
        for i in 0..=theta_segments {
            let segment = theta_start + i as f32 / theta_segments as f32 * theta_length;
            let x = radius * segment.cos();
            let y = radius * segment.sin();
            vertices.push(Vertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [(x / outer + 1.0) / 2.0, (y / outer + 1.0) / 2.0],
            });
        }
    }

    let mut indices = Vec::with_capacity((theta_segments * phi_segments * 6) as usize);
    for j in 0..phi_segments {
        let level = j * (theta_segments + 1);
        for i in 0..theta_segments {
            let a = level + i;
            let b = a + theta_segments + 1;
            let c = a + theta_segments + 2;
            let d = a + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    MeshData { vertices, indices }
}
