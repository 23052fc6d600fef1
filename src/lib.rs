pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pollinations;
pub mod session;
pub mod store;

pub use config::{Config, PollinationsConfig, PreferenceConfig};
pub use error::{PollenError, Result};
pub use models::{
    AccountInfo, Capabilities, Capability, Catalog, CatalogEntry, CatalogSource, GeneratedImage,
    GenerationRequest, HealthMetrics, ImageHandle, ModelDescriptor, ModelFilter, Pricing,
    PricingTier,
};
pub use pollinations::{AccountClient, CatalogClient, ImageClient, PollinationsClient};
pub use session::{Session, SessionState};
pub use store::{PreferenceStore, Preferences};
