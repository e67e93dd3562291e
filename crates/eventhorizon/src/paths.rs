//! Discovers the config and data directories, honouring environment variable overrides
//! so tests and packaged installs resolve the scene file and audio track consistently.
//!
//! Types:
//!
//! - `AppPaths` captures the resolved directories and derives file locations from them.

use std::env;
use std::path::{Path, PathBuf};

use ambient::DEFAULT_TRACK_FILE;
use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;
use sceneconfig::CONFIG_FILE_NAME;

pub const ENV_CONFIG_DIR: &str = "EVENTHORIZON_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "EVENTHORIZON_DATA_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "eventhorizon";
const APPLICATION: &str = "eventhorizon";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let config_override = env_override(ENV_CONFIG_DIR);
        let data_override = env_override(ENV_DATA_DIR);
        if let (Some(config_dir), Some(data_dir)) = (&config_override, &data_override) {
            return Ok(Self::new(config_dir.clone(), data_dir.clone()));
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self::new(
            config_override.unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            data_override.unwrap_or_else(|| project_dirs.data_dir().to_path_buf()),
        ))
    }

    pub fn new(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Well-known location of the looping ambient track.
    pub fn default_track(&self) -> PathBuf {
        self.data_dir.join(DEFAULT_TRACK_FILE)
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
