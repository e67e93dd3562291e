use std::time::Duration;

use glam::Vec3;
use sceneconfig::SceneConfig;

use super::{BlackHoleRig, SceneGraph};
use crate::animation::Animator;
use crate::camera::PerspectiveCamera;
use crate::controls::OrbitControls;

/// Everything a frame needs apart from the GPU: the graph, its rig, the
/// camera with its controls, and the animator that moves them.
#[derive(Debug, Clone)]
pub struct SceneRuntime {
    graph: SceneGraph,
    rig: BlackHoleRig,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    animator: Animator,
    viewport: (u32, u32),
}

impl SceneRuntime {
    pub fn new(config: &SceneConfig, viewport: (u32, u32), seed: u64) -> Self {
        let mut graph = SceneGraph::new();
        let (rig, spins) = BlackHoleRig::build(&mut graph, config, seed);
        let camera = PerspectiveCamera::from_settings(&config.camera, viewport);
        let controls = OrbitControls::from_settings(&config.camera);
        let animator = Animator::new(config.animation.time_scale, spins, &config.camera.drift);

        let mut runtime = Self {
            graph,
            rig,
            camera,
            controls,
            animator,
            viewport: (viewport.0.max(1), viewport.1.max(1)),
        };
        runtime.sync_camera();
        runtime
    }

    /// Returns `false` (and changes nothing) for zero-sized viewports.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.viewport = (width, height);
        self.camera.set_viewport(width, height);
        true
    }

    pub fn advance(&mut self, dt: Duration) {
        self.animator.advance(&mut self.graph, dt);
        self.sync_camera();
    }

    /// Re-derives the camera from the controls; call after user input.
    pub fn sync_camera(&mut self) {
        self.camera.position = self.controls.eye() + self.animator.drift_offset();
        self.camera.target = self.controls.target();
    }

    pub fn shader_time(&self) -> f32 {
        self.animator.time()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn rig(&self) -> &BlackHoleRig {
        &self.rig
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn eye(&self) -> Vec3 {
        self.camera.position
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.starfield.count = 16;
        config
    }

    #[test]
    fn resize_updates_aspect_and_viewport() {
        let mut runtime = SceneRuntime::new(&small_config(), (1280, 720), 1);
        for (w, h) in [(1920u32, 1080u32), (300, 900), (1, 1)] {
            assert!(runtime.resize(w, h));
            assert_eq!(runtime.viewport(), (w, h));
            assert!((runtime.camera().aspect - w as f32 / h as f32).abs() < 1e-6);
        }
        assert!(!runtime.resize(0, 400));
        assert_eq!(runtime.viewport(), (1, 1));
    }

    #[test]
    fn advancing_spins_the_disk_and_moves_time() {
        let mut runtime = SceneRuntime::new(&small_config(), (800, 600), 1);
        let disk = runtime.rig().disk;
        let before = runtime.graph().node(disk).transform.rotation.z;
        runtime.advance(Duration::from_secs(1));
        let after = runtime.graph().node(disk).transform.rotation.z;
        assert!((after - before - 0.06).abs() < 1e-5);
        assert!((runtime.shader_time() - 0.6).abs() < 1e-5);
    }

    #[test]
    fn drift_offsets_the_orbit_eye() {
        let mut runtime = SceneRuntime::new(&small_config(), (800, 600), 1);
        runtime.advance(Duration::from_secs(10));
        let t = runtime.shader_time();
        let expected = Vec3::new((0.1 * t).sin() * 2.0, 8.0 + (0.15 * t).sin() * 0.5, 20.0);
        assert!((runtime.eye() - expected).length() < 1e-3);
    }

    #[test]
    fn fresh_runtime_starts_time_at_zero() {
        let mut runtime = SceneRuntime::new(&small_config(), (800, 600), 1);
        runtime.advance(Duration::from_secs(3));
        let runtime = SceneRuntime::new(&small_config(), (800, 600), 1);
        assert_eq!(runtime.shader_time(), 0.0);
    }
}
