pub mod file;
pub mod memory;
pub mod traits;

use std::sync::Arc;

use crate::config::PreferenceConfig;
use crate::error::Result;

use file::FilePreferenceStorage;
use memory::MemoryPreferenceStorage;
use traits::PreferenceStorage;

pub use traits::{PreferenceStorage as PreferenceStorageTrait, Preferences};

/// Picks a backend from config and fronts it with write-through helpers.
pub struct PreferenceStore {
    backend: Arc<dyn PreferenceStorage>,
}

impl PreferenceStore {
    pub fn new(config: &PreferenceConfig) -> Result<Self> {
        let backend: Arc<dyn PreferenceStorage> = if config.ephemeral {
            Arc::new(MemoryPreferenceStorage::new())
        } else {
            Arc::new(FilePreferenceStorage::new(config)?)
        };
        Ok(Self { backend })
    }

    pub fn storage(&self) -> &Arc<dyn PreferenceStorage> {
        &self.backend
    }

    pub async fn load(&self) -> Result<Preferences> {
        self.backend.load().await
    }

    pub async fn save(&self, preferences: &Preferences) -> Result<()> {
        self.backend.save(preferences).await
    }

    pub async fn api_key(&self) -> Result<Option<String>> {
        Ok(self.backend.load().await?.api_key)
    }

    /// Persist a new key immediately. Blank or absent input clears the
    /// stored key rather than storing an empty string.
    pub async fn set_api_key(&self, key: Option<&str>) -> Result<Option<String>> {
        let mut preferences = self.backend.load().await?;
        preferences.set_api_key(key);
        self.backend.save(&preferences).await?;
        Ok(preferences.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral_store() -> PreferenceStore {
        PreferenceStore::new(&PreferenceConfig::new().ephemeral()).unwrap()
    }

    #[tokio::test]
    async fn ephemeral_config_selects_the_memory_backend() {
        let store = ephemeral_store();
        assert!(store.api_key().await.unwrap().is_none());

        store.set_api_key(Some("pk-abc")).await.unwrap();
        assert_eq!(store.api_key().await.unwrap().as_deref(), Some("pk-abc"));
    }

    #[tokio::test]
    async fn blank_key_clears_the_stored_value() {
        let store = ephemeral_store();
        store.set_api_key(Some("pk-abc")).await.unwrap();

        let cleared = store.set_api_key(Some("   ")).await.unwrap();
        assert!(cleared.is_none());
        assert!(store.api_key().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = PreferenceConfig::new().with_path(dir.path().join("prefs.json"));

        let store = PreferenceStore::new(&config).unwrap();
        store.set_api_key(Some("pk-on-disk")).await.unwrap();

        let reopened = PreferenceStore::new(&config).unwrap();
        assert_eq!(
            reopened.api_key().await.unwrap().as_deref(),
            Some("pk-on-disk")
        );
    }
}
