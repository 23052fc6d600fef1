use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use crate::config::PreferenceConfig;
use crate::error::{PollenError, Result};
use crate::store::traits::{PreferenceStorage, Preferences};

/// JSON-file backend. The whole document is rewritten on every save,
/// which keeps the on-disk state consistent with memory at all times.
pub struct FilePreferenceStorage {
    path: PathBuf,
}

impl FilePreferenceStorage {
    pub fn new(config: &PreferenceConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => Self::default_path()?,
        };
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            PollenError::Store("no user config directory available on this platform".to_string())
        })?;
        Ok(base.join("rpollen").join("preferences.json"))
    }
}

#[async_trait]
impl PreferenceStorage for FilePreferenceStorage {
    async fn load(&self) -> Result<Preferences> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preference file at {}, starting fresh", self.path.display());
                return Ok(Preferences::default());
            }
            Err(e) => {
                return Err(PollenError::Store(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw).map_err(|e| {
            PollenError::Store(format!("Malformed preference file {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PollenError::Store(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let body = serde_json::to_string_pretty(preferences)
            .map_err(|e| PollenError::Store(format!("Failed to encode preferences: {}", e)))?;

        fs::write(&self.path, body).map_err(|e| {
            PollenError::Store(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
