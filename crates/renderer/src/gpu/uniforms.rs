use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use sceneconfig::{Rgb, MAX_POINT_LIGHTS};

use crate::scene::{Material, PointCloud, PointLightInstance, Shading};

/// Per-frame values shared by every draw. Mirrors `FrameBlock` in the GLSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// x = time, y = exposure, z = tone mapping on/off, w = point light count.
    pub time_exposure: [f32; 4],
    pub ambient: [f32; 4],
    pub light_positions: [[f32; 4]; MAX_POINT_LIGHTS],
    pub light_colors: [[f32; 4]; MAX_POINT_LIGHTS],
}

impl FrameUniforms {
    pub fn new(
        view_proj: Mat4,
        eye: Vec3,
        time: f32,
        exposure: f32,
        tone_mapping: bool,
        ambient: Vec3,
        lights: &[PointLightInstance],
    ) -> Self {
        let mut light_positions = [[0.0; 4]; MAX_POINT_LIGHTS];
        let mut light_colors = [[0.0; 4]; MAX_POINT_LIGHTS];
        let count = lights.len().min(MAX_POINT_LIGHTS);
        for (slot, light) in lights.iter().take(count).enumerate() {
            light_positions[slot] = light.position.extend(1.0).to_array();
            light_colors[slot] = light.color.scaled(light.intensity).with_alpha(1.0);
        }

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: eye.extend(1.0).to_array(),
            time_exposure: [
                time,
                exposure,
                if tone_mapping { 1.0 } else { 0.0 },
                count as f32,
            ],
            ambient: ambient.extend(1.0).to_array(),
            light_positions,
            light_colors,
        }
    }
}

/// Per-draw values. Mirrors `NodeBlock` in the GLSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct NodeUniforms {
    pub model: [[f32; 4]; 4],
    /// rgb + opacity.
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    pub inner_color: [f32; 4],
    /// w = 1 when the gradient has a middle stop.
    pub mid_color: [f32; 4],
    pub outer_color: [f32; 4],
    /// x/y = disk inner/outer radius, z/w = lensing radius/thickness.
    pub shape: [f32; 4],
    /// x = glow speed, y = glow frequency, z = doppler strength, w = falloff.
    pub motion: [f32; 4],
}

impl NodeUniforms {
    pub fn for_material(model: Mat4, material: &Material) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.model = model.to_cols_array_2d();
        match material.shading {
            Shading::Basic { color } => {
                uniforms.color = color.with_alpha(material.opacity);
            }
            Shading::Standard { color, emissive } => {
                uniforms.color = color.with_alpha(material.opacity);
                uniforms.emissive = emissive.with_alpha(1.0);
            }
            Shading::AccretionDisk(disk) => {
                uniforms.color = Rgb::WHITE.with_alpha(material.opacity);
                uniforms.inner_color = disk.inner_color.with_alpha(1.0);
                uniforms.outer_color = disk.outer_color.with_alpha(1.0);
                if let Some(mid) = disk.mid_color {
                    uniforms.mid_color = mid.with_alpha(1.0);
                }
                uniforms.shape = [disk.inner_radius, disk.outer_radius, 0.0, 0.0];
                uniforms.motion = [
                    disk.glow_speed,
                    disk.glow_frequency,
                    disk.doppler_strength,
                    disk.falloff,
                ];
            }
            Shading::Lensing(lensing) => {
                uniforms.color = lensing.color.with_alpha(material.opacity);
                uniforms.shape = [0.0, 0.0, lensing.radius, lensing.thickness];
                uniforms.motion = [0.0, 0.0, lensing.doppler_strength, 0.0];
            }
        }
        uniforms
    }

    pub fn for_points(model: Mat4, points: &PointCloud) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.model = model.to_cols_array_2d();
        uniforms.color = points.color.with_alpha(1.0);
        uniforms
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model.to_cols_array_2d();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DiskShading, LensingShading};

    #[test]
    fn uniform_structs_are_std140_sized() {
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<NodeUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 64 + 16 * 3 + 16 * 2 * MAX_POINT_LIGHTS);
        assert_eq!(std::mem::size_of::<NodeUniforms>(), 64 + 16 * 7);
    }

    #[test]
    fn lights_are_premultiplied_and_capped() {
        let light = PointLightInstance {
            position: Vec3::new(0.0, 2.0, 0.0),
            color: Rgb::new(1.0, 0.5, 0.0),
            intensity: 2.0,
        };
        let lights = vec![light; MAX_POINT_LIGHTS + 2];
        let frame = FrameUniforms::new(Mat4::IDENTITY, Vec3::Z, 1.5, 0.8, true, Vec3::splat(0.1), &lights);
        assert_eq!(frame.time_exposure, [1.5, 0.8, 1.0, MAX_POINT_LIGHTS as f32]);
        assert_eq!(frame.light_colors[0], [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(frame.light_positions[1], [0.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn disk_material_fills_gradient_and_motion() {
        let disk = DiskShading {
            inner_color: Rgb::from_hex(0x4444ff),
            outer_color: Rgb::from_hex(0xff4400),
            mid_color: None,
            inner_radius: 1.8,
            outer_radius: 5.4,
            glow_speed: 2.0,
            glow_frequency: 10.0,
            doppler_strength: 0.35,
            falloff: 1.0,
        };
        let material = crate::scene::Material::additive(Shading::AccretionDisk(disk), 1.0);
        let uniforms = NodeUniforms::for_material(Mat4::IDENTITY, &material);
        assert_eq!(uniforms.shape[..2], [1.8, 5.4]);
        assert_eq!(uniforms.motion, [2.0, 10.0, 0.35, 1.0]);
        assert_eq!(uniforms.mid_color[3], 0.0);
        assert_eq!(uniforms.color[3], 1.0);
    }

    #[test]
    fn lensing_material_sets_radius_and_thickness() {
        let material = crate::scene::Material::additive(
            Shading::Lensing(LensingShading {
                color: Rgb::WHITE,
                radius: 2.25,
                thickness: 0.18,
                doppler_strength: 0.35,
            }),
            0.6,
        );
        let uniforms = NodeUniforms::for_material(Mat4::IDENTITY, &material);
        assert_eq!(uniforms.shape[2..], [2.25, 0.18]);
        assert_eq!(uniforms.color, [1.0, 1.0, 1.0, 0.6]);
    }
}
