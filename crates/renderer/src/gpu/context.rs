//! Surface, adapter and device setup for the window.
//!
//! Format and MSAA selection are split into pure helpers so the fallback rules can be
//! tested without a GPU.

use anyhow::{anyhow, bail, Context as _, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::TextureFormatFeatureFlags;
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, Antialiasing, ColorSpaceMode};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Sample count `Antialiasing::Auto` settles on when the adapter allows it.
const AUTO_SAMPLE_CEILING: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceColorSpace {
    Gamma,
    Linear,
}

impl From<ColorSpaceMode> for SurfaceColorSpace {
    fn from(mode: ColorSpaceMode) -> Self {
        match mode {
            ColorSpaceMode::Auto | ColorSpaceMode::Gamma => SurfaceColorSpace::Gamma,
            ColorSpaceMode::Linear => SurfaceColorSpace::Linear,
        }
    }
}

pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
    pub color_space: SurfaceColorSpace,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        color_space: ColorSpaceMode,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });
        let surface = create_surface(&instance, target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no GPU adapter can present to this window")?;
        let limits = adapter.limits();
        let adapter_profile = AdapterProfile::from_wgpu(&adapter.get_info(), &limits);
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            software = adapter_profile.is_software(),
            "selected GPU adapter"
        );

        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let max_dimension = limits.max_texture_dimension_2d;
        if size.width > max_dimension || size.height > max_dimension {
            bail!(
                "window {}x{} exceeds the adapter texture limit of {max_dimension}",
                size.width,
                size.height
            );
        }

        let caps = surface.get_capabilities(&adapter);
        let color_space = SurfaceColorSpace::from(color_space);
        let surface_format = choose_surface_format(&caps.formats, color_space)
            .ok_or_else(|| anyhow!("surface reports no supported texture formats"))?;

        let color_features = adapter.get_texture_format_features(surface_format);
        let depth_features = adapter.get_texture_format_features(DEPTH_FORMAT);
        let sample_count = if adapter_profile.is_software() {
            if antialiasing != Antialiasing::Off {
                tracing::info!("software rasterizer in use; rendering without MSAA");
            }
            1
        } else if !color_features
            .flags
            .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
        {
            tracing::warn!(?surface_format, "surface format cannot resolve MSAA; rendering without it");
            1
        } else {
            let shared = shared_sample_counts(
                &color_features.flags.supported_sample_counts(),
                &depth_features.flags.supported_sample_counts(),
            );
            choose_sample_count(antialiasing, &shared)
        };

        let mut required_features = wgpu::Features::empty();
        if sample_count > AUTO_SAMPLE_CEILING {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("eventhorizon device"),
            required_features,
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = if caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            caps.present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        };
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        tracing::debug!(?present_mode, sample_count, ?surface_format, "configuring surface");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: Vec::new(),
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
            color_space,
            adapter_profile,
        })
    }

    /// Zero-sized requests (minimised windows) keep the previous configuration.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.reconfigure();
    }

    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn create_surface<T>(instance: &wgpu::Instance, target: &T) -> Result<wgpu::Surface<'static>>
where
    T: HasDisplayHandle + HasWindowHandle,
{
    let window = target
        .window_handle()
        .map_err(|err| anyhow!("window handle unavailable: {err}"))?;
    let display = target
        .display_handle()
        .map_err(|err| anyhow!("display handle unavailable: {err}"))?;
    // SAFETY: the window outlives the surface; `WindowState` drops the GPU state first.
    unsafe {
        instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
            raw_display_handle: display.as_raw(),
            raw_window_handle: window.as_raw(),
        })
    }
    .context("failed to create rendering surface")
}

/// Linear output wants an sRGB swapchain so the hardware encodes on write.
fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    color_space: SurfaceColorSpace,
) -> Option<wgpu::TextureFormat> {
    let wants_srgb = color_space == SurfaceColorSpace::Linear;
    let preferred = formats.iter().copied().find(|f| f.is_srgb() == wants_srgb);
    if preferred.is_none() {
        if let Some(first) = formats.first() {
            tracing::warn!(fallback = ?first, wants_srgb, "preferred surface encoding unavailable");
        }
    }
    preferred.or_else(|| formats.first().copied())
}

/// Counts usable for both the color and the depth attachment, always including 1.
fn shared_sample_counts(color: &[u32], depth: &[u32]) -> Vec<u32> {
    let mut shared: Vec<u32> = color
        .iter()
        .copied()
        .filter(|count| depth.contains(count))
        .chain(std::iter::once(1))
        .collect();
    shared.sort_unstable();
    shared.dedup();
    shared
}

fn choose_sample_count(antialiasing: Antialiasing, supported: &[u32]) -> u32 {
    let best_at_most = |ceiling: u32| {
        supported
            .iter()
            .copied()
            .filter(|&count| count <= ceiling)
            .max()
            .unwrap_or(1)
    };
    match antialiasing {
        Antialiasing::Off => 1,
        Antialiasing::Auto => best_at_most(AUTO_SAMPLE_CEILING),
        Antialiasing::Samples(requested) if supported.contains(&requested) => requested,
        Antialiasing::Samples(requested) => {
            let fallback = best_at_most(requested);
            tracing::warn!(requested, fallback, ?supported, "MSAA sample count unsupported");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use wgpu::TextureFormat;

    use super::*;

    #[test]
    fn linear_output_prefers_srgb_swapchain() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(
            choose_surface_format(&formats, SurfaceColorSpace::Linear),
            Some(TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(
            choose_surface_format(&formats, SurfaceColorSpace::Gamma),
            Some(TextureFormat::Bgra8Unorm)
        );
        assert_eq!(
            choose_surface_format(&formats[..1], SurfaceColorSpace::Linear),
            Some(TextureFormat::Bgra8Unorm)
        );
        assert_eq!(choose_surface_format(&[], SurfaceColorSpace::Gamma), None);
    }

    #[test]
    fn sample_counts_must_suit_both_attachments() {
        assert_eq!(shared_sample_counts(&[1, 2, 4, 8], &[1, 4]), vec![1, 4]);
        assert_eq!(shared_sample_counts(&[4], &[]), vec![1]);
    }

    #[test]
    fn antialiasing_request_falls_back_to_nearest_lower_count() {
        let supported = [1, 2, 4, 8];
        assert_eq!(choose_sample_count(Antialiasing::Auto, &supported), 4);
        assert_eq!(choose_sample_count(Antialiasing::Off, &supported), 1);
        assert_eq!(choose_sample_count(Antialiasing::Samples(8), &supported), 8);
        assert_eq!(choose_sample_count(Antialiasing::Samples(16), &supported), 8);
        assert_eq!(choose_sample_count(Antialiasing::Auto, &[1]), 1);
    }
}
