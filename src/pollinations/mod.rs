pub mod account_client;
pub mod catalog_client;
pub mod image_client;

use crate::config::PollinationsConfig;
use reqwest::Client;

pub use account_client::AccountClient;
pub use catalog_client::CatalogClient;
pub use image_client::ImageClient;

/// Root API client. One HTTP connection pool shared across the
/// per-concern clients.
#[derive(Clone)]
pub struct PollinationsClient {
    image_client: ImageClient,
    catalog_client: CatalogClient,
    account_client: AccountClient,
}

impl PollinationsClient {
    pub fn new(config: PollinationsConfig) -> Self {
        let http = Client::new();

        Self {
            image_client: ImageClient::new(http.clone(), config.clone()),
            catalog_client: CatalogClient::new(http.clone(), config.clone()),
            account_client: AccountClient::new(http, config),
        }
    }

    pub fn from_env() -> Self {
        Self::new(PollinationsConfig::from_env())
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog_client
    }

    pub fn account(&self) -> &AccountClient {
        &self.account_client
    }
}
