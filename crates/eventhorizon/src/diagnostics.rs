use renderer::{Antialiasing, CapabilityReport, ColorSpaceMode, RendererConfig};
use tracing::info;

use crate::bootstrap::ConfigSource;
use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Dumps comprehensive startup diagnostics at INFO level
pub fn dump_startup_diagnostics(
    args: &RunArgs,
    paths: &AppPaths,
    source: &ConfigSource,
    config: &RendererConfig,
    report: &CapabilityReport,
) {
    info!("=== Event Horizon Startup Diagnostics ===");
    dump_global_options(args, config);
    dump_paths(paths, source);
    dump_scene(config);
    dump_adapter(report);
    info!("=== End Startup Diagnostics ===");
}

fn dump_global_options(args: &RunArgs, config: &RendererConfig) {
    info!("Global Options:");
    info!("  size: {}x{}", config.surface_size.0, config.surface_size.1);
    info!(
        "  fps: {}",
        config
            .target_fps
            .map(|fps| fps.to_string())
            .unwrap_or_else(|| "uncapped".to_string())
    );
    info!("  antialias: {}", format_antialiasing(config.antialiasing));
    info!("  color-space: {}", format_color_space(config.color_space));
    info!("  seed: {}", config.seed);
    info!("  no-drift: {}", args.no_drift);
    info!("  mute: {}", args.mute);
}

fn dump_paths(paths: &AppPaths, source: &ConfigSource) {
    info!("Paths:");
    info!("  config-dir: {}", paths.config_dir().display());
    info!("  data-dir: {}", paths.data_dir().display());
    match source {
        ConfigSource::File(path) => info!("  config: {}", path.display()),
        ConfigSource::Defaults { looked_at } => {
            info!("  config: defaults ({} not found)", looked_at.display())
        }
    }
    info!("  default-track: {}", paths.default_track().display());
}

fn dump_scene(config: &RendererConfig) {
    let scene = &config.scene;
    info!("Scene:");
    info!("  black-hole-size: {}", scene.black_hole.size);
    info!("  disk: {:?} material, {} segments", scene.disk.material, scene.disk.segments);
    info!("  stars: {}", scene.starfield.count);
    info!("  lensing-arcs: {}", scene.lensing.arcs.count);
    info!("  shells: {}", scene.shells.count);
    info!("  time-scale: {}", scene.animation.time_scale);
    match scene.animation.fixed_step {
        Some(step) => info!("  clock: fixed step {}", humantime::format_duration(step)),
        None => info!(
            "  clock: wall (max step {})",
            humantime::format_duration(scene.animation.max_step)
        ),
    }
    info!("  drift: {}", scene.camera.drift.enabled);
    info!(
        "  audio: {}",
        if scene.audio.enabled { "enabled" } else { "disabled" }
    );
}

fn dump_adapter(report: &CapabilityReport) {
    info!("GPU:");
    for line in report.to_string().lines() {
        info!("  {}", line.trim_end());
    }
}

fn format_antialiasing(mode: Antialiasing) -> String {
    match mode {
        Antialiasing::Auto => "auto".to_string(),
        Antialiasing::Off => "off".to_string(),
        Antialiasing::Samples(samples) => format!("{samples}x"),
    }
}

fn format_color_space(mode: ColorSpaceMode) -> &'static str {
    match mode {
        ColorSpaceMode::Auto => "auto",
        ColorSpaceMode::Gamma => "gamma",
        ColorSpaceMode::Linear => "linear",
    }
}
