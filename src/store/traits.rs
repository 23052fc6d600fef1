use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Durable user preferences. Unknown fields in an existing document are
/// dropped on the next save; the document is small enough that rewriting
/// it whole is the simplest correct behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Preferences {
    /// Normalize a raw key: trimmed, with blank input treated as absent.
    pub fn set_api_key(&mut self, key: Option<&str>) {
        self.api_key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from);
    }
}

#[async_trait]
pub trait PreferenceStorage: Send + Sync {
    async fn load(&self) -> Result<Preferences>;
    async fn save(&self, preferences: &Preferences) -> Result<()>;
}
