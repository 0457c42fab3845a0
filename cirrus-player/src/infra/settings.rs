//! Persisted user settings.
//!
//! Only the media volume is stored today, as `{"media_volume": 40}` in
//! `settings.json` under the platform config directory.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cirrus_core::model::VolumeLevel;
use cirrus_core::{SettingsError, VolumeStore};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "cirrus";
const SETTINGS_FILE: &str = "settings.json";

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media_volume: Option<VolumeLevel>,
}

/// Volume store backed by a JSON file. Every save rewrites the file.
#[derive(Debug, Clone)]
pub struct JsonVolumeStore {
    path: PathBuf,
}

impl JsonVolumeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Settings, SettingsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Settings::default());
            }
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_json::from_str(&content)
            .map_err(|err| SettingsError::Format(err.to_string()))
    }
}

impl VolumeStore for JsonVolumeStore {
    fn load(&self) -> Result<Option<VolumeLevel>, SettingsError> {
        Ok(self.read()?.media_volume)
    }

    fn save(&self, level: VolumeLevel) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let settings = Settings {
            media_volume: Some(level),
        };
        let content = serde_json::to_string_pretty(&settings)
            .map_err(|err| SettingsError::Format(err.to_string()))?;
        std::fs::write(&self.path, content)?;
        log::debug!(
            "[Settings] Saved volume {} to {}",
            level,
            self.path.display()
        );
        Ok(())
    }
}

/// Volume store that forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryVolumeStore {
    level: Mutex<Option<VolumeLevel>>,
}

impl MemoryVolumeStore {
    pub fn with_level(level: VolumeLevel) -> Self {
        Self {
            level: Mutex::new(Some(level)),
        }
    }
}

impl VolumeStore for MemoryVolumeStore {
    fn load(&self) -> Result<Option<VolumeLevel>, SettingsError> {
        Ok(*self.level.lock().unwrap_or_else(|p| p.into_inner()))
    }

    fn save(&self, level: VolumeLevel) -> Result<(), SettingsError> {
        *self.level.lock().unwrap_or_else(|p| p.into_inner()) = Some(level);
        Ok(())
    }
}
