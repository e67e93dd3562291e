use glam::{Mat4, Vec3};
use sceneconfig::CameraSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn from_settings(settings: &CameraSettings, viewport: (u32, u32)) -> Self {
        let mut camera = Self {
            fov_y: settings.fov,
            aspect: 1.0,
            near: settings.near,
            far: settings.far,
            position: Vec3::from(settings.position),
            target: Vec3::from(settings.target),
            up: Vec3::Y,
        };
        camera.set_viewport(viewport.0, viewport.1);
        camera
    }

    /// Zero-sized viewports keep the previous aspect ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
