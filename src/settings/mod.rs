use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Persisted renderer configuration: where the HRIR set lives and how the
/// renderer starts up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub hrir_dir: String,
    pub sample_rate: u32,
    pub azimuth_degrees: u16,
    pub passthrough: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hrir_dir: "./hrir".to_string(),
            sample_rate: 44_100,
            azimuth_degrees: 0,
            passthrough: false,
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "HRIR Directory: {}", self.hrir_dir)?;
        writeln!(f, "Sample Rate: {}", self.sample_rate)?;
        writeln!(f, "Azimuth: {}°", self.azimuth_degrees)?;
        writeln!(f, "Passthrough: {}", self.passthrough)?;
        Ok(())
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path();

        if settings_path.exists() {
            let contents =
                fs::read_to_string(&settings_path).context("Failed to read settings file")?;
            let settings: Self =
                serde_json::from_str(&contents).context("Failed to parse settings")?;
            debug!("Loaded settings from {settings_path:?}");
            Ok(settings)
        } else {
            info!("No settings file found, using defaults");
            let settings = Self::default();
            // Try to save defaults, but don't fail if we can't
            let _ = settings.save();
            Ok(settings)
        }
    }

    pub fn save(&self) -> Result<()> {
        let settings_path = Self::get_settings_path();

        if let Some(parent) = settings_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&settings_path, json).context("Failed to write settings file")?;

        debug!("Saved settings to {settings_path:?}");
        Ok(())
    }

    fn get_settings_path() -> PathBuf {
        const SETTINGS_FILENAME: &str = "settings.json";

        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir)
                .join("auralis")
                .join(SETTINGS_FILENAME)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("auralis")
                .join(SETTINGS_FILENAME)
        } else {
            PathBuf::from(".").join(SETTINGS_FILENAME)
        }
    }
}
