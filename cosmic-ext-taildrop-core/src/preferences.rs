//! User preferences
//!
//! Persisted as TOML under the COSMIC config directory for the application.
//! The receive directory is the only value the window writes back; the
//! tailscale settings are edited by hand.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::TailscaleCli;
use crate::error::{Result, TaildropError};
use crate::APP_ID;

const PREFERENCES_FILE: &str = "preferences.toml";

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Last directory chosen for received files
    #[serde(default)]
    pub save_directory: Option<PathBuf>,

    /// Path or name of the tailscale binary
    #[serde(default = "default_tailscale_binary")]
    pub tailscale_binary: PathBuf,

    /// Run `file cp` / `file get` through `sudo -n`
    #[serde(default)]
    pub elevate_transfers: bool,
}

fn default_tailscale_binary() -> PathBuf {
    PathBuf::from("tailscale")
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            save_directory: None,
            tailscale_binary: default_tailscale_binary(),
            elevate_transfers: false,
        }
    }
}

impl Preferences {
    /// Default location of the preferences file
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("cosmic")
            .join(APP_ID)
            .join(PREFERENCES_FILE)
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            TaildropError::Preferences(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let preferences = toml::from_str(&contents)?;
        Ok(preferences)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TaildropError::Preferences(format!(
                    "Failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| {
            TaildropError::Preferences(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!("Saved preferences to {}", path.display());
        Ok(())
    }

    /// Directory to show in the receive field: the saved one, else home
    pub fn receive_dir(&self) -> PathBuf {
        self.save_directory
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn set_save_directory(&mut self, directory: impl Into<PathBuf>) {
        self.save_directory = Some(directory.into());
    }

    pub fn cli(&self) -> TailscaleCli {
        TailscaleCli {
            binary: self.tailscale_binary.clone(),
            elevate: self.elevate_transfers,
        }
    }
}
