use std::f32::consts::{PI, TAU};

use glam::Vec3;
use sceneconfig::CameraSettings;

const POLAR_EPSILON: f32 = 1e-3;
const ZOOM_BASE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Idle,
    Orbit,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct PointerState {
    position: Option<(f32, f32)>,
    mode: DragMode,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            position: None,
            mode: DragMode::Idle,
        }
    }
}

/// Orbit camera around a target: left drag rotates, right drag pans, wheel
/// zooms. Distance is clamped to `[min_distance, max_distance]` and the polar
/// angle never reaches the poles.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    radius: f32,
    azimuth: f32,
    polar: f32,
    min_distance: f32,
    max_distance: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    pan_speed: f32,
    pointer: PointerState,
}

impl OrbitControls {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let target = Vec3::from(settings.target);
        let offset = Vec3::from(settings.position) - target;
        let radius = offset
            .length()
            .clamp(settings.min_distance, settings.max_distance);
        let (azimuth, polar) = if offset.length_squared() > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / offset.length()).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        Self {
            target,
            radius,
            azimuth,
            polar: polar.clamp(POLAR_EPSILON, PI - POLAR_EPSILON),
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            pointer: PointerState::default(),
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn eye(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    /// Drag by `(dx, dy)` pixels on a viewport `height` pixels tall.
    pub fn rotate(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        self.azimuth = (self.azimuth - TAU * dx / height * self.rotate_speed).rem_euclid(TAU);
        self.polar = (self.polar - TAU * dy / height * self.rotate_speed)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
    }

    /// Positive steps move the eye closer.
    pub fn zoom(&mut self, steps: f32) {
        let factor = ZOOM_BASE.powf(steps * self.zoom_speed);
        self.radius = (self.radius * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Slide the target in the view plane so the scene follows the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, height: f32, fov_y_degrees: f32) {
        let height = height.max(1.0);
        let forward = (self.target - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let half_extent = self.radius * (fov_y_degrees.to_radians() * 0.5).tan();
        let scale = 2.0 * half_extent / height * self.pan_speed;
        self.target += (-dx * right + dy * up) * scale;
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        self.pointer.mode = match (button, pressed) {
            (PointerButton::Primary, true) => DragMode::Orbit,
            (PointerButton::Secondary, true) => DragMode::Pan,
            (_, false) => DragMode::Idle,
            (PointerButton::Other, true) => self.pointer.mode,
        };
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32, viewport: (u32, u32), fov_y_degrees: f32) {
        let previous = self.pointer.position.replace((x, y));
        let Some((last_x, last_y)) = previous else {
            return;
        };
        let (dx, dy) = (x - last_x, y - last_y);
        let height = viewport.1 as f32;
        match self.pointer.mode {
            DragMode::Orbit => self.rotate(dx, dy, height),
            DragMode::Pan => self.pan(dx, dy, height, fov_y_degrees),
            DragMode::Idle => {}
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer = PointerState::default();
    }
}
