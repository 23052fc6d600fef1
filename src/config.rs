use std::env;
use std::path::PathBuf;

/// Default API host for image generation, model listing and account info.
pub const DEFAULT_API_BASE: &str = "https://gen.pollinations.ai";

/// Legacy host that still serves the model catalog for older deployments.
pub const LEGACY_MODELS_BASE: &str = "https://image.pollinations.ai";

#[derive(Debug, Clone)]
pub struct PollinationsConfig {
    pub api_base: String,
    /// Extra hosts to try for the model catalog after `api_base` fails.
    /// An empty list disables the fallback chain.
    pub legacy_models_bases: Vec<String>,
    pub api_key: Option<String>,
}

impl Default for PollinationsConfig {
    fn default() -> Self {
        PollinationsConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            legacy_models_bases: vec![LEGACY_MODELS_BASE.to_string()],
            api_key: None,
        }
    }
}

impl PollinationsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_base = env::var("POLLINATIONS_API_BASE")
            .ok()
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_key = env::var("POLLINATIONS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        PollinationsConfig {
            api_base,
            legacy_models_bases: vec![LEGACY_MODELS_BASE.to_string()],
            api_key,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_legacy_models_base(mut self, base: impl Into<String>) -> Self {
        self.legacy_models_bases
            .push(base.into().trim_end_matches('/').to_string());
        self
    }

    pub fn without_legacy_models(mut self) -> Self {
        self.legacy_models_bases.clear();
        self
    }

    /// The configured key, trimmed; empty strings count as no key.
    pub fn trimmed_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Catalog endpoints in the order they should be tried.
    pub fn models_endpoints(&self) -> Vec<String> {
        let mut endpoints = vec![format!("{}/image/models", self.api_base)];
        for base in &self.legacy_models_bases {
            endpoints.push(format!("{}/models", base));
        }
        endpoints
    }

    pub fn balance_endpoint(&self) -> String {
        format!("{}/account/balance", self.api_base)
    }

    pub fn profile_endpoint(&self) -> String {
        format!("{}/account/profile", self.api_base)
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceConfig {
    /// Location of the preferences document. `None` resolves to
    /// `<user config dir>/rpollen/preferences.json`.
    pub path: Option<PathBuf>,
    /// Keep preferences in memory only; nothing touches disk.
    pub ephemeral: bool,
}

impl Default for PreferenceConfig {
    fn default() -> Self {
        PreferenceConfig {
            path: None,
            ephemeral: false,
        }
    }
}

impl PreferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let path = env::var("POLLINATIONS_PREFS_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        PreferenceConfig {
            path,
            ephemeral: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub pollinations: PollinationsConfig,
    pub preferences: PreferenceConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            pollinations: PollinationsConfig::from_env(),
            preferences: PreferenceConfig::from_env(),
        }
    }

    pub fn with_pollinations(mut self, config: PollinationsConfig) -> Self {
        self.pollinations = config;
        self
    }

    pub fn with_preferences(mut self, config: PreferenceConfig) -> Self {
        self.preferences = config;
        self
    }
}
