use futures::join;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;

use crate::config::PollinationsConfig;
use crate::error::{PollenError, Result};
use crate::models::{AccountInfo, BalanceResponse, ProfileResponse};

#[derive(Clone)]
pub struct AccountClient {
    client: Client,
    config: PollinationsConfig,
}

impl AccountClient {
    pub fn new(client: Client, config: PollinationsConfig) -> Self {
        Self { client, config }
    }

    /// Fetch balance and profile concurrently. Either half may fail
    /// without sinking the other; whatever arrived is returned and the
    /// failures are only logged. Never errors.
    pub async fn fetch(&self, api_key: &str) -> AccountInfo {
        let (balance, profile) = join!(self.fetch_balance(api_key), self.fetch_profile(api_key));

        let balance = match balance {
            Ok(response) => response.balance,
            Err(e) => {
                log::debug!("Balance fetch failed: {}", e);
                None
            }
        };

        let (display_name, tier) = match profile {
            Ok(response) => (response.name, response.tier),
            Err(e) => {
                log::debug!("Profile fetch failed: {}", e);
                (None, None)
            }
        };

        AccountInfo {
            display_name,
            tier,
            balance,
        }
    }

    async fn fetch_balance(&self, api_key: &str) -> Result<BalanceResponse> {
        self.get_json(&self.config.balance_endpoint(), api_key).await
    }

    async fn fetch_profile(&self, api_key: &str) -> Result<ProfileResponse> {
        self.get_json(&self.config.profile_endpoint(), api_key).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .send()
            .await
            .map_err(|e| PollenError::Network(format!("Account request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollenError::Api {
                status: status.as_u16(),
                message: format!("Account endpoint {} returned {}", endpoint, status),
            });
        }

        response
            .json()
            .await
            .map_err(|e| PollenError::Response(format!("Malformed account response: {}", e)))
    }
}
