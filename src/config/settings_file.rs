//! JSON settings file owned by the host process

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::settings::AppSettings;

/// Location of the persisted settings record
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config_dir>/notepin/settings.json`, or the working directory if no config dir exists
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, creating the file with defaults on first run
    ///
    /// A file that does not parse is replaced by defaults. Any other read failure
    /// returns defaults without touching the file.
    pub fn load_or_create(&self) -> AppSettings {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Settings file not found, creating defaults");
                return self.write_defaults();
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read settings file, using defaults");
                return AppSettings::default();
            }
        };

        match serde_json::from_str::<AppSettings>(&contents) {
            Ok(mut settings) => {
                settings.validate_and_clamp();
                info!(path = %self.path.display(), "Loaded settings");
                settings
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Settings file corrupted, replacing with defaults");
                self.write_defaults()
            }
        }
    }

    fn write_defaults(&self) -> AppSettings {
        let defaults = AppSettings::default();
        if let Err(e) = self.save(&defaults) {
            error!(error = ?e, "Failed to write default settings");
        }
        defaults
    }

    /// Write settings as pretty-printed JSON
    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(settings)
            .context("Failed to serialize settings to JSON")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {:?}", self.path))?;

        info!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}
