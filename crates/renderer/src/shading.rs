//! CPU mirror of the fragment shaders in [`crate::compile`].
//!
//! The GPU never calls into this module; it exists so the shading maths can be
//! unit tested and so CPU-side decisions (like the emissive tint of the lit
//! disk) use the same gradient the shader does.

use glam::{Vec2, Vec3};
use sceneconfig::Rgb;

use crate::scene::{DiskShading, LensingShading};

/// Angular speed of the doppler hot spot, per unit of shader time.
pub const DOPPLER_SWEEP: f32 = 0.3;

pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

fn rgb(color: Rgb) -> Vec3 {
    Vec3::from(color.to_array())
}

/// Inner-to-outer color ramp with an optional stop at the midpoint.
pub fn gradient(inner: Rgb, mid: Option<Rgb>, outer: Rgb, t: f32) -> Vec3 {
    let t = t.clamp(0.0, 1.0);
    match mid {
        Some(mid) if t < 0.5 => mix(rgb(inner), rgb(mid), t * 2.0),
        Some(mid) => mix(rgb(mid), rgb(outer), (t - 0.5) * 2.0),
        None => mix(rgb(inner), rgb(outer), t),
    }
}

/// Normalised radius across the disk: 0 at the inner edge, 1 at the outer.
pub fn radial(shading: &DiskShading, local: Vec2) -> f32 {
    let span = (shading.outer_radius - shading.inner_radius).max(1e-4);
    ((local.length() - shading.inner_radius) / span).clamp(0.0, 1.0)
}

pub fn doppler(strength: f32, local: Vec2, time: f32) -> f32 {
    let theta = local.y.atan2(local.x);
    1.0 + strength * (theta - time * DOPPLER_SWEEP).cos()
}

/// Accretion disk color before tone mapping. `uv_x` is the planar ring UV.
pub fn disk_color(shading: &DiskShading, local: Vec2, uv_x: f32, time: f32) -> Vec3 {
    let r = radial(shading, local);
    let color = gradient(shading.inner_color, shading.mid_color, shading.outer_color, r);
    let intensity = 1.0 - r * shading.falloff;
    let glow = 0.5 + 0.5 * (time * shading.glow_speed + uv_x * shading.glow_frequency).sin();
    color * intensity * glow * doppler(shading.doppler_strength, local, time)
}

/// Lensing band color and alpha before tone mapping.
pub fn lensing_color(shading: &LensingShading, opacity: f32, local: Vec2, time: f32) -> (Vec3, f32) {
    let d = (local.length() - shading.radius) / (shading.thickness * 0.5).max(1e-4);
    let band = (1.0 - d * d).max(0.0);
    let color = rgb(shading.color) * band * doppler(shading.doppler_strength, local, time);
    (color, opacity * band)
}

/// Narkowicz ACES filmic fit, applied after exposure.
pub fn aces(color: Vec3, exposure: f32) -> Vec3 {
    let x = color * exposure;
    let numerator = x * (x * 2.51 + Vec3::splat(0.03));
    let denominator = x * (x * 2.43 + Vec3::splat(0.59)) + Vec3::splat(0.14);
    (numerator / denominator).clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk() -> DiskShading {
        DiskShading {
            inner_color: Rgb::from_hex(0x4444ff),
            outer_color: Rgb::from_hex(0xff4400),
            mid_color: None,
            inner_radius: 1.8,
            outer_radius: 5.4,
            glow_speed: 2.0,
            glow_frequency: 10.0,
            doppler_strength: 0.35,
            falloff: 1.0,
        }
    }

    #[test]
    fn gradient_runs_inner_to_outer() {
        let shading = disk();
        let inner = gradient(shading.inner_color, None, shading.outer_color, 0.0);
        let outer = gradient(shading.inner_color, None, shading.outer_color, 1.0);
        assert!((inner - rgb(shading.inner_color)).length() < 1e-6);
        assert!((outer - rgb(shading.outer_color)).length() < 1e-6);

        let white = Rgb::WHITE;
        let mid = gradient(Rgb::BLACK, Some(white), Rgb::BLACK, 0.5);
        assert!((mid - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn disk_fades_towards_the_outer_edge() {
        let shading = disk();
        // pick a time where the glow term is at its peak for uv_x = 0
        let time = std::f32::consts::FRAC_PI_4;
        let inner = disk_color(&shading, Vec2::new(0.0, 1.8), 0.0, time);
        let outer = disk_color(&shading, Vec2::new(0.0, 5.4), 0.0, time);
        assert!(inner.length() > 0.1);
        assert!(outer.length() < 1e-5);
    }

    #[test]
    fn doppler_brightens_one_side() {
        let shading = disk();
        let approaching = doppler(shading.doppler_strength, Vec2::new(3.0, 0.0), 0.0);
        let receding = doppler(shading.doppler_strength, Vec2::new(-3.0, 0.0), 0.0);
        assert!((approaching - 1.35).abs() < 1e-5);
        assert!((receding - 0.65).abs() < 1e-5);
    }

    #[test]
    fn lensing_band_peaks_on_the_centre_line() {
        let shading = LensingShading {
            color: Rgb::WHITE,
            radius: 2.0,
            thickness: 0.2,
            doppler_strength: 0.0,
        };
        let (centre, alpha) = lensing_color(&shading, 0.6, Vec2::new(2.0, 0.0), 0.0);
        assert!((centre - Vec3::ONE).length() < 1e-5);
        assert!((alpha - 0.6).abs() < 1e-5);
        let (edge, edge_alpha) = lensing_color(&shading, 0.6, Vec2::new(2.1, 0.0), 0.0);
        assert!(edge.length() < 1e-4);
        assert!(edge_alpha < 1e-4);
    }

    #[test]
    fn aces_is_bounded_and_monotonic() {
        let low = aces(Vec3::splat(0.2), 0.8);
        let high = aces(Vec3::splat(5.0), 0.8);
        assert!(low.x < high.x);
        assert!(high.max_element() <= 1.0);
        assert!(aces(Vec3::ZERO, 0.8).length() < 1e-6);
    }
}
