//! Persistent user settings
//!
//! Settings live in `~/.moircs_mask/settings.json` by default. Loading never
//! fails: a missing or unreadable file falls back to the defaults.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::path::{Path, PathBuf};

use crate::codec::sbr::SbrConfig;
use crate::grism::DEFAULT_GRISM;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display_slit_id: bool,
    pub display_comments: bool,
    pub show_excluded: bool,
    pub display_spectra: bool,
    pub grism: String,
    /// FOV centre in mask pixels
    pub fov_center: [f64; 2],
    pub show_ch1: bool,
    pub show_ch2: bool,
    pub sbr: SbrConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_slit_id: true,
            display_comments: false,
            show_excluded: false,
            display_spectra: false,
            grism: DEFAULT_GRISM.to_string(),
            fov_center: [1084.0, 1786.0],
            show_ch1: true,
            show_ch2: true,
            sbr: SbrConfig::default(),
        }
    }
}

/// Location of the settings file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    root_path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at `~/.moircs_mask`
    pub fn new() -> Result<Self, SettingsError> {
        let home = std::env::var("HOME").map_err(|_| SettingsError::NoHome)?;
        Ok(Self {
            root_path: PathBuf::from(home).join(".moircs_mask"),
        })
    }

    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn settings_file(&self) -> PathBuf {
        self.root_path.join("settings.json")
    }

    /// Load the stored settings, falling back to defaults on any error
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Using default settings, could not load {}: {e}",
                    self.settings_file().display()
                );
                Settings::default()
            }
        }
    }

    fn try_load(&self) -> Result<Settings, SettingsError> {
        let json = std::fs::read_to_string(self.settings_file())?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<PathBuf, SettingsError> {
        std::fs::create_dir_all(&self.root_path)?;
        let path = self.settings_file();
        std::fs::write(&path, serde_json::to_string_pretty(settings)?)?;
        Ok(path)
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("HOME not set")]
    NoHome,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}
