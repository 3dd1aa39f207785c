//! Config file discovery with local overlay merge

use std::path::{Path, PathBuf};

use super::manifest::SyncConfig;
use crate::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "course-sync.toml";

/// Locates and loads the config for a run
///
/// The base file is the first of:
/// 1. An explicit path (`--config`)
/// 2. `course-sync.toml` in the working directory
/// 3. `<config_dir>/course-sync/config.toml`
///
/// A sibling `<stem>.local.toml` next to the base file is merged over it when
/// present. The merged config is validated before it is returned.
pub struct ConfigResolver {
    working_dir: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, the platform-appropriate directory is used via `dirs::config_dir()`.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(
        working_dir: impl Into<PathBuf>,
        global_config_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            global_config_dir_override: Some(global_config_dir.into()),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("course-sync"))
    }

    /// Path of the base config file that `resolve` would load.
    pub fn locate(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let local = self.working_dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Ok(local);
        }

        if let Some(global_dir) = self.global_config_dir() {
            let global = global_dir.join("config.toml");
            if global.is_file() {
                return Ok(global);
            }
            tracing::debug!(?global, "No global config found");
        }

        Err(Error::ConfigNotFound { path: local })
    }

    pub fn resolve(&self, explicit: Option<&Path>) -> Result<SyncConfig> {
        let base_path = self.locate(explicit)?;
        tracing::debug!(?base_path, "Loading config");
        let mut config = SyncConfig::load(&base_path)?;

        let overlay_path = overlay_path(&base_path);
        if overlay_path.is_file() {
            tracing::debug!(?overlay_path, "Merging local config overlay");
            let overlay = SyncConfig::load(&overlay_path)?;
            config.merge(&overlay);
        }

        config.validate()?;
        Ok(config)
    }
}

/// `course-sync.toml` -> `course-sync.local.toml`
fn overlay_path(base: &Path) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{stem}.local.toml"))
}
