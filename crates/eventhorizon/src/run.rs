//! Orchestrates a windowed launch by wiring CLI input, filesystem discovery, the scene
//! configuration and the GPU probe, then hands the window loop to the renderer with the
//! audio hooks attached.
//!
//! Functions:
//!
//! - `run` drives the main execution path.
//! - `initialise_tracing` configures logging.

use anyhow::Result;
use renderer::{probe, Renderer, WgpuProvider};
use tracing_subscriber::EnvFilter;

use crate::audio::AmbientHooks;
use crate::bootstrap::{
    apply_overrides, bootstrap_filesystem, load_scene_config, renderer_config,
};
use crate::cli::RunArgs;
use crate::diagnostics;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    bootstrap_filesystem(&paths)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        "resolved eventhorizon paths"
    );

    let (mut scene, source) = load_scene_config(args.config.as_deref(), &paths)?;
    apply_overrides(&mut scene, &args)?;
    let config = renderer_config(&args, scene)?;

    let report = probe(&WgpuProvider);
    diagnostics::dump_startup_diagnostics(&args, &paths, &source, &config, &report);
    if !report.supported {
        tracing::warn!(reason = ?report.failure, "no usable GPU context; not opening a window");
        println!("{report}");
        return Ok(());
    }

    let hooks = AmbientHooks::from_settings(&config.scene.audio, &paths.default_track());
    tracing::info!("starting event horizon");
    Renderer::new(config).run(hooks)
}

pub fn initialise_tracing() {
    let default_filter = "warn,eventhorizon=info,renderer=info,ambient=info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error,symphonia=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
