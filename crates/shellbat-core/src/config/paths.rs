use std::path::{Path, PathBuf};

use crate::store::{Result, StoreError};

pub const APP_DIRECTORY_NAME: &str = "shellbat";
pub const GLOBAL_SETTINGS_FILE: &str = "globalSettings.json";
pub const GLOBAL_HISTORY_FILE: &str = "globalHistory.json";
pub const INSTANCES_DIRECTORY: &str = "instances";

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SHELLBAT_CONFIG_DIR";

/// Locations of every settings document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub global_settings: PathBuf,
    pub global_history: PathBuf,
    pub instances_dir: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Self {
        let config_dir = std::env::var_os(CONFIG_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from(".config"))
                    .join(APP_DIRECTORY_NAME)
            });
        Self::in_dir(config_dir)
    }

    /// Paths rooted at an explicit directory
    pub fn in_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            global_settings: config_dir.join(GLOBAL_SETTINGS_FILE),
            global_history: config_dir.join(GLOBAL_HISTORY_FILE),
            instances_dir: config_dir.join(INSTANCES_DIRECTORY),
            config_dir,
        }
    }

    /// Settings document for a named instance
    pub fn instance_settings(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', ':'])
            && Path::new(name).file_name().is_some();
        if !valid {
            return Err(StoreError::InvalidPath(PathBuf::from(name)));
        }
        Ok(self.instances_dir.join(format!("{}.json", name)))
    }
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::new()
    }
}
