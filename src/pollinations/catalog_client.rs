use reqwest::Client;

use crate::config::PollinationsConfig;
use crate::error::{PollenError, Result};
use crate::models::{normalize_catalog, Catalog, CatalogEntry};

#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    config: PollinationsConfig,
}

impl CatalogClient {
    pub fn new(client: Client, config: PollinationsConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the model catalog. Endpoints are tried in order and the
    /// static fallback list is substituted when all of them fail, so the
    /// caller always gets a usable catalog.
    pub async fn fetch(&self) -> Catalog {
        for endpoint in self.config.models_endpoints() {
            match self.fetch_from(&endpoint).await {
                Ok(catalog) if !catalog.models.is_empty() => {
                    log::info!("Loaded {} models from {}", catalog.models.len(), endpoint);
                    return catalog;
                }
                Ok(_) => {
                    log::warn!("Model listing from {} was empty", endpoint);
                }
                Err(e) => {
                    log::warn!("Model listing from {} failed: {}", endpoint, e);
                }
            }
        }

        log::warn!("All model endpoints failed, using offline model list");
        Catalog::offline()
    }

    async fn fetch_from(&self, endpoint: &str) -> Result<Catalog> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| PollenError::Network(format!("Model listing request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollenError::Api {
                status: status.as_u16(),
                message: format!("Model listing returned {}", status),
            });
        }

        let entries: Vec<CatalogEntry> = response
            .json()
            .await
            .map_err(|e| PollenError::Response(format!("Malformed model listing: {}", e)))?;

        Ok(Catalog::remote(normalize_catalog(entries), endpoint))
    }
}
