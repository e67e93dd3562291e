//! Prepares a launch by creating directories, loading the scene file and translating
//! CLI overrides into the `RendererConfig` the window loop expects.
//!
//! Functions:
//!
//! - `bootstrap_filesystem` readies the on-disk layout.
//! - `load_scene_config` and `apply_overrides` produce the effective scene.
//! - `renderer_config` and `parse_surface_size` interpret window-level flags.
//! - `write_default_config` backs `config init`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use renderer::RendererConfig;
use sceneconfig::{SceneConfig, MIN_FPS};
use tracing::debug;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Where the effective scene came from, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults { looked_at: PathBuf },
}

pub fn bootstrap_filesystem(paths: &AppPaths) -> Result<()> {
    for dir in [paths.config_dir(), paths.data_dir()] {
        ensure_directory(dir)?;
    }
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            debug!(path = %path.display(), "reusing existing directory");
            Ok(())
        } else {
            bail!("filesystem entry at {} is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path).with_context(|| {
            format!("failed to create eventhorizon directory at {}", path.display())
        })?;
        debug!(path = %path.display(), "created eventhorizon directory");
        Ok(())
    }
}

/// An explicit `--config` must exist; the discovered file may be absent.
pub fn load_scene_config(
    explicit: Option<&Path>,
    paths: &AppPaths,
) -> Result<(SceneConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = SceneConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let path = paths.config_file();
    if path.exists() {
        let config = SceneConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        Ok((config, ConfigSource::File(path)))
    } else {
        Ok((SceneConfig::default(), ConfigSource::Defaults { looked_at: path }))
    }
}

/// Folds scene-level CLI flags into the loaded config and re-validates it.
pub fn apply_overrides(config: &mut SceneConfig, args: &RunArgs) -> Result<()> {
    if args.no_drift {
        config.camera.drift.enabled = false;
    }
    if let Some(step) = args.fixed_step {
        config.animation.fixed_step = Some(step);
    }
    if let Some(seed) = args.seed {
        config.starfield.seed = Some(seed);
    }
    if let Some(scale) = args.scale {
        config.black_hole.size = scale;
    }
    if let Some(track) = args.audio.as_ref() {
        config.audio.track = Some(track.clone());
    }
    if args.mute {
        config.audio.enabled = false;
    }
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;
    Ok(())
}

pub fn renderer_config(args: &RunArgs, scene: SceneConfig) -> Result<RendererConfig> {
    let mut config = RendererConfig::from_scene(scene);
    if let Some(size) = args.size.as_deref() {
        config.surface_size = parse_surface_size(size)?;
    }
    if let Some(fps) = args.fps {
        if !fps.is_finite() || fps < 0.0 {
            bail!("--fps must be a finite number >= 0");
        }
        if fps > 0.0 && fps < MIN_FPS {
            bail!("--fps must be 0 (uncapped) or at least {MIN_FPS}");
        }
        config.target_fps = (fps > 0.0).then_some(fps);
    }
    if let Some(antialiasing) = args.antialias {
        config.antialiasing = antialiasing;
    }
    if let Some(color_space) = args.color_space {
        config.color_space = color_space;
    }
    Ok(config)
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("invalid size '{value}', expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width in size '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in size '{value}'"))?;
    if width == 0 || height == 0 {
        bail!("size must be greater than zero");
    }
    Ok((width, height))
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }
    let contents = SceneConfig::default().to_toml_string()?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use renderer::{Antialiasing, ColorSpaceMode};
    use tempfile::TempDir;

    use super::*;

    fn temp_paths(root: &TempDir) -> AppPaths {
        AppPaths::new(root.path().join("config"), root.path().join("data"))
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 800 X 600 ").unwrap(), (800, 600));
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("wide").is_err());
    }

    #[test]
    fn missing_discovered_file_yields_defaults() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        let (config, source) = load_scene_config(None, &paths).unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(
            source,
            ConfigSource::Defaults {
                looked_at: paths.config_file()
            }
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        let missing = root.path().join("nope.toml");
        assert!(load_scene_config(Some(&missing), &paths).is_err());
    }

    #[test]
    fn init_writes_a_loadable_file() {
        let root = TempDir::new().unwrap();
        let paths = temp_paths(&root);
        bootstrap_filesystem(&paths).unwrap();
        write_default_config(&paths.config_file()).unwrap();
        let (config, source) = load_scene_config(None, &paths).unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(source, ConfigSource::File(paths.config_file()));
    }

    #[test]
    fn flags_override_scene_values() {
        let args = RunArgs {
            no_drift: true,
            mute: true,
            seed: Some(42),
            scale: Some(2.0),
            fixed_step: Some(Duration::from_millis(16)),
            ..RunArgs::default()
        };
        let mut scene = SceneConfig::default();
        apply_overrides(&mut scene, &args).unwrap();
        assert!(!scene.camera.drift.enabled);
        assert!(!scene.audio.enabled);
        assert_eq!(scene.starfield.seed, Some(42));
        assert_eq!(scene.black_hole.size, 2.0);
        assert_eq!(scene.animation.fixed_step, Some(Duration::from_millis(16)));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = RunArgs {
            scale: Some(-1.0),
            ..RunArgs::default()
        };
        let mut scene = SceneConfig::default();
        assert!(apply_overrides(&mut scene, &args).is_err());
    }

    #[test]
    fn unusable_fps_flags_are_rejected() {
        for fps in [-1.0, 1e-20, f32::NAN, f32::INFINITY] {
            let args = RunArgs {
                fps: Some(fps),
                ..RunArgs::default()
            };
            assert!(
                renderer_config(&args, SceneConfig::default()).is_err(),
                "fps {fps}"
            );
        }
        let args = RunArgs {
            fps: Some(MIN_FPS),
            ..RunArgs::default()
        };
        let config = renderer_config(&args, SceneConfig::default()).unwrap();
        assert_eq!(config.target_fps, Some(MIN_FPS));
    }

    #[test]
    fn window_flags_override_render_section() {
        let args = RunArgs {
            size: Some("640x480".into()),
            fps: Some(0.0),
            antialias: Some(Antialiasing::Samples(4)),
            color_space: Some(ColorSpaceMode::Gamma),
            ..RunArgs::default()
        };
        let mut scene = SceneConfig::default();
        scene.render.fps = Some(30.0);
        let config = renderer_config(&args, scene).unwrap();
        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.target_fps, None);
        assert_eq!(config.antialiasing, Antialiasing::Samples(4));
        assert_eq!(config.color_space, ColorSpaceMode::Gamma);
    }
}
