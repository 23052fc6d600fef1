use serde::{Deserialize, Serialize};

/// Account details stitched together from the balance and profile
/// endpoints. Every field is optional so one endpoint failing still
/// leaves the other's data usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub display_name: Option<String>,
    pub tier: Option<String>,
    pub balance: Option<f64>,
}

impl AccountInfo {
    /// Overlay this fetch onto previously known data. Fields present here
    /// win; fields this fetch is missing keep their prior value.
    pub fn merged_over(self, previous: &AccountInfo) -> AccountInfo {
        AccountInfo {
            display_name: self.display_name.or_else(|| previous.display_name.clone()),
            tier: self.tier.or_else(|| previous.tier.clone()),
            balance: self.balance.or(previous.balance),
        }
    }

    pub fn display_name_or_default(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unknown User")
    }

    pub fn tier_or_default(&self) -> &str {
        self.tier.as_deref().unwrap_or("Free")
    }

    pub fn balance_or_zero(&self) -> f64 {
        self.balance.unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.tier.is_none() && self.balance.is_none()
    }
}

/// Wire shape of `GET /account/balance`.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub balance: Option<f64>,
}

/// Wire shape of `GET /account/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub name: Option<String>,
    pub tier: Option<String>,
}
