use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{PollenError, Result};
use crate::store::traits::{PreferenceStorage, Preferences};

/// In-process backend for ephemeral runs and tests. Nothing touches disk.
#[derive(Default)]
pub struct MemoryPreferenceStorage {
    state: RwLock<Preferences>,
}

impl MemoryPreferenceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            state: RwLock::new(preferences),
        }
    }
}

#[async_trait]
impl PreferenceStorage for MemoryPreferenceStorage {
    async fn load(&self) -> Result<Preferences> {
        self.state
            .read()
            .map(|prefs| prefs.clone())
            .map_err(|_| PollenError::Store("preference state poisoned".to_string()))
    }

    async fn save(&self, preferences: &Preferences) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| PollenError::Store("preference state poisoned".to_string()))?;
        *state = preferences.clone();
        Ok(())
    }
}
