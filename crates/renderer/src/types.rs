use sceneconfig::{AntialiasSetting, ColorSpaceSetting, SceneConfig};

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Choose a sensible default (gamma-encoded swapchain, colors used as authored).
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and use sRGB swapchains for conversion.
    Linear,
}

impl From<ColorSpaceSetting> for ColorSpaceMode {
    fn from(value: ColorSpaceSetting) -> Self {
        match value {
            ColorSpaceSetting::Auto => Self::Auto,
            ColorSpaceSetting::Gamma => Self::Gamma,
            ColorSpaceSetting::Linear => Self::Linear,
        }
    }
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface and depth formats.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl From<AntialiasSetting> for Antialiasing {
    fn from(value: AntialiasSetting) -> Self {
        match value.samples() {
            None => Self::Auto,
            Some(1) => Self::Off,
            Some(samples) => Self::Samples(samples),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags merged over the scene file and tells the
/// renderer how large the window should be and how to build the scene.
#[derive(Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Window title; hooks may append a status suffix at runtime.
    pub title: String,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Desired color handling for the swapchain.
    pub color_space: ColorSpaceMode,
    /// Optional FPS cap; None = render every vsync.
    pub target_fps: Option<f32>,
    /// Seed for the starfield scatter.
    pub seed: u64,
    /// Every tunable parameter of the scene.
    pub scene: SceneConfig,
}

impl Default for RendererConfig {
    /// Provides a 720p window with the stock scene.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "Event Horizon".to_string(),
            antialiasing: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
            target_fps: None,
            seed: 0,
            scene: SceneConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Derives window and pipeline settings from the `[render]` section.
    pub fn from_scene(scene: SceneConfig) -> Self {
        Self {
            antialiasing: scene.render.antialias.map(Antialiasing::from).unwrap_or_default(),
            color_space: scene.render.color_space.into(),
            target_fps: scene.render.fps,
            seed: scene.starfield.seed.unwrap_or_default(),
            scene,
            ..Self::default()
        }
    }
}

/// What we know about the GPU adapter backing a context.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterProfile {
    pub name: String,
    pub vendor: String,
    pub vendor_id: u32,
    pub driver: String,
    pub driver_info: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension_2d: u32,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            vendor: vendor_name(info.vendor),
            vendor_id: info.vendor,
            driver: info.driver.clone(),
            driver_info: info.driver_info.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
        }
    }

    /// CPU rasterizers (llvmpipe, SwiftShader, WARP) get lighter defaults.
    pub fn is_software(&self) -> bool {
        if matches!(self.device_type, wgpu::DeviceType::Cpu) {
            return true;
        }
        let name = self.name.to_ascii_lowercase();
        ["llvmpipe", "softpipe", "swiftshader", "lavapipe", "microsoft basic render"]
            .iter()
            .any(|needle| name.contains(needle))
    }

    /// Human readable API string, e.g. `Vulkan (NVIDIA 550.54)`.
    pub fn api_version(&self) -> String {
        let backend = format!("{:?}", self.backend);
        match (self.driver.is_empty(), self.driver_info.is_empty()) {
            (true, true) => backend,
            (false, true) => format!("{backend} ({})", self.driver),
            (true, false) => format!("{backend} ({})", self.driver_info),
            (false, false) => format!("{backend} ({} {})", self.driver, self.driver_info),
        }
    }
}

fn vendor_name(vendor_id: u32) -> String {
    match vendor_id {
        0x10de => "NVIDIA".to_string(),
        0x1002 | 0x1022 => "AMD".to_string(),
        0x8086 => "Intel".to_string(),
        0x106b => "Apple".to_string(),
        0x13b5 => "ARM".to_string(),
        0x5143 => "Qualcomm".to_string(),
        0x1010 => "Imagination".to_string(),
        0x10005 => "Mesa".to_string(),
        0 => "unknown".to_string(),
        other => format!("{other:#06x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, device_type: wgpu::DeviceType) -> AdapterProfile {
        AdapterProfile {
            name: name.to_string(),
            vendor: vendor_name(0x10de),
            vendor_id: 0x10de,
            driver: "NVIDIA".to_string(),
            driver_info: "550.54".to_string(),
            backend: wgpu::Backend::Vulkan,
            device_type,
            max_texture_dimension_2d: 16384,
        }
    }

    #[test]
    fn detects_software_rasterizers() {
        assert!(profile("llvmpipe (LLVM 17.0.6, 256 bits)", wgpu::DeviceType::Cpu).is_software());
        assert!(profile("SwiftShader Device", wgpu::DeviceType::Other).is_software());
        assert!(!profile("NVIDIA GeForce RTX 4070", wgpu::DeviceType::DiscreteGpu).is_software());
    }

    #[test]
    fn api_version_includes_driver() {
        let profile = profile("GPU", wgpu::DeviceType::DiscreteGpu);
        assert_eq!(profile.api_version(), "Vulkan (NVIDIA 550.54)");
        assert_eq!(profile.vendor, "NVIDIA");
    }

    #[test]
    fn render_section_drives_renderer_config() {
        let mut scene = SceneConfig::default();
        scene.render.fps = Some(30.0);
        scene.render.antialias = Some(AntialiasSetting::Off);
        scene.render.color_space = ColorSpaceSetting::Linear;
        scene.starfield.seed = Some(7);
        let config = RendererConfig::from_scene(scene);
        assert_eq!(config.target_fps, Some(30.0));
        assert_eq!(config.antialiasing, Antialiasing::Off);
        assert_eq!(config.color_space, ColorSpaceMode::Linear);
        assert_eq!(config.seed, 7);
        assert_eq!(config.surface_size, (1280, 720));
    }

    #[test]
    fn antialias_setting_maps_to_samples() {
        assert_eq!(Antialiasing::from(AntialiasSetting::Auto), Antialiasing::Auto);
        assert_eq!(Antialiasing::from(AntialiasSetting::Off), Antialiasing::Off);
        assert_eq!(
            Antialiasing::from(AntialiasSetting::Samples4),
            Antialiasing::Samples(4)
        );
    }
}
