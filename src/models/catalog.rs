use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical model record every wire shape is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub description: String,
    pub capabilities: Capabilities,
    pub pricing: Pricing,
    pub health: HealthMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub accepts_text: bool,
    pub accepts_image: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        // Absent capability data means the model takes both inputs.
        Capabilities {
            accepts_text: true,
            accepts_image: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingTier {
    Free,
    Paid,
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingTier::Free => write!(f, "free"),
            PricingTier::Paid => write!(f, "paid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Pollen,
    Diamond,
}

impl Currency {
    fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.eq_ignore_ascii_case("diamond") => Currency::Diamond,
            _ => Currency::Pollen,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Pollen => write!(f, "pollen"),
            Currency::Diamond => write!(f, "diamond"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub tier: PricingTier,
    pub unit_cost: f64,
    pub currency: Currency,
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing {
            tier: PricingTier::Free,
            unit_cost: 0.0,
            currency: Currency::Pollen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub success_rate_percent: f64,
    pub avg_response_seconds: f64,
}

impl Default for HealthMetrics {
    fn default() -> Self {
        // A model the service lists is assumed healthy until told otherwise.
        HealthMetrics {
            success_rate_percent: 99.0,
            avg_response_seconds: 0.0,
        }
    }
}

/// One entry of the models listing as it arrives on the wire. The service
/// has served three shapes over time; `untagged` picks the first that fits,
/// so the variants are ordered by their required discriminating field
/// (`id`, then `name`, then a bare string).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Detailed(DetailedEntry),
    Flat(FlatEntry),
    Name(String),
}

/// Richer object shape: `id` + display name + modalities + nested pricing.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailedEntry {
    pub id: String,
    pub name: Option<String>,
    pub input_modalities: Option<Vec<String>>,
    pub pricing: Option<DetailedPricing>,
    pub paid_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedPricing {
    pub currency: Option<String>,
    #[serde(rename = "completionImageTokens")]
    pub completion_image_tokens: Option<f64>,
}

/// Flat object shape from older deployments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    pub name: String,
    pub description: Option<String>,
    pub success_rate: Option<f64>,
    pub avg_response_time: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    #[serde(rename = "isT2I")]
    pub is_t2i: Option<bool>,
    #[serde(rename = "isI2I")]
    pub is_i2i: Option<bool>,
}

impl CatalogEntry {
    pub fn into_descriptor(self) -> ModelDescriptor {
        match self {
            CatalogEntry::Name(name) => ModelDescriptor {
                description: name.clone(),
                name,
                capabilities: Capabilities::default(),
                pricing: Pricing::default(),
                health: HealthMetrics::default(),
            },
            CatalogEntry::Flat(entry) => {
                let price = entry.price.unwrap_or(0.0);
                ModelDescriptor {
                    description: entry.description.unwrap_or_else(|| entry.name.clone()),
                    name: entry.name,
                    capabilities: Capabilities {
                        accepts_text: entry.is_t2i.unwrap_or(true),
                        accepts_image: entry.is_i2i.unwrap_or(true),
                    },
                    pricing: Pricing {
                        tier: if price > 0.0 {
                            PricingTier::Paid
                        } else {
                            PricingTier::Free
                        },
                        unit_cost: price,
                        currency: Currency::parse_or_default(entry.currency.as_deref()),
                    },
                    health: HealthMetrics {
                        success_rate_percent: entry.success_rate.unwrap_or(99.0),
                        avg_response_seconds: entry.avg_response_time.unwrap_or(0.0),
                    },
                }
            }
            CatalogEntry::Detailed(entry) => {
                let capabilities = match &entry.input_modalities {
                    Some(modalities) => Capabilities {
                        accepts_text: modalities.iter().any(|m| m == "text"),
                        accepts_image: modalities.iter().any(|m| m == "image"),
                    },
                    None => Capabilities::default(),
                };
                let (unit_cost, currency) = match &entry.pricing {
                    Some(pricing) => (
                        pricing.completion_image_tokens.unwrap_or(0.0),
                        Currency::parse_or_default(pricing.currency.as_deref()),
                    ),
                    None => (0.0, Currency::Pollen),
                };
                ModelDescriptor {
                    description: entry.name.unwrap_or_else(|| entry.id.clone()),
                    name: entry.id,
                    capabilities,
                    pricing: Pricing {
                        tier: if entry.paid_only.unwrap_or(false) {
                            PricingTier::Paid
                        } else {
                            PricingTier::Free
                        },
                        unit_cost,
                        currency,
                    },
                    health: HealthMetrics::default(),
                }
            }
        }
    }
}

/// Map wire entries to descriptors, deduplicating by name. The last entry
/// with a given name wins; first-seen order is preserved.
pub fn normalize_catalog(entries: Vec<CatalogEntry>) -> Vec<ModelDescriptor> {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, ModelDescriptor> = HashMap::new();

    for entry in entries {
        let descriptor = entry.into_descriptor();
        if !by_name.contains_key(&descriptor.name) {
            order.push(descriptor.name.clone());
        }
        by_name.insert(descriptor.name.clone(), descriptor);
    }

    order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect()
}

/// Where a catalog came from; offline catalogs warrant a soft advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote { endpoint: String },
    OfflineFallback,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub models: Vec<ModelDescriptor>,
    pub source: CatalogSource,
}

impl Catalog {
    pub fn remote(models: Vec<ModelDescriptor>, endpoint: impl Into<String>) -> Self {
        Catalog {
            models,
            source: CatalogSource::Remote {
                endpoint: endpoint.into(),
            },
        }
    }

    pub fn offline() -> Self {
        Catalog {
            models: offline_fallback_models(),
            source: CatalogSource::OfflineFallback,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.source == CatalogSource::OfflineFallback
    }

    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn filter(&self, filter: &ModelFilter) -> Vec<&ModelDescriptor> {
        self.models
            .iter()
            .filter(|model| filter.matches(model))
            .collect()
    }
}

/// The static list substituted when every catalog endpoint fails. Mix of
/// image and video generation models known to exist on the service.
pub fn offline_fallback_models() -> Vec<ModelDescriptor> {
    let mut models = Vec::new();

    let mut insert = |name: &str,
                      description: &str,
                      success_rate: f64,
                      avg_response: f64,
                      currency: Currency,
                      accepts_image: bool| {
        models.push(ModelDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            capabilities: Capabilities {
                accepts_text: true,
                accepts_image,
            },
            pricing: Pricing {
                // No unit costs are known offline; diamond-billed models
                // are the paid tier so the free/paid filter keeps working.
                tier: if currency == Currency::Diamond {
                    PricingTier::Paid
                } else {
                    PricingTier::Free
                },
                unit_cost: 0.0,
                currency,
            },
            health: HealthMetrics {
                success_rate_percent: success_rate,
                avg_response_seconds: avg_response,
            },
        });
    };

    insert("flux", "Flux (Default)", 99.0, 3.0, Currency::Pollen, true);
    insert("turbo", "Turbo (Fast)", 98.0, 1.5, Currency::Pollen, true);
    insert("gptimage", "GPT Image", 95.0, 4.0, Currency::Diamond, true);
    insert("gptimage-large", "GPT Image Large", 95.0, 5.0, Currency::Diamond, true);
    insert("seedream", "SeeDream", 97.0, 2.8, Currency::Pollen, true);
    insert("seedream-pro", "SeeDream Pro", 96.0, 3.5, Currency::Diamond, true);
    insert("nanobanana", "NanoBanana", 96.0, 2.0, Currency::Pollen, true);
    insert("nanobanana-pro", "NanoBanana Pro", 95.0, 3.0, Currency::Diamond, true);
    insert("kontext", "Kontext", 94.0, 3.2, Currency::Pollen, true);
    insert("zimage", "ZImage", 95.0, 3.0, Currency::Pollen, true);
    insert("klein", "Klein", 95.0, 2.5, Currency::Pollen, true);
    insert("klein-large", "Klein Large", 94.0, 4.0, Currency::Diamond, true);
    insert("imagen-4", "Imagen 4", 98.0, 4.0, Currency::Diamond, false);
    insert("midjourney", "Midjourney Style", 95.0, 4.0, Currency::Diamond, true);
    insert("anime", "Anime Style", 97.0, 2.8, Currency::Pollen, true);
    insert("veo", "Veo (Video)", 90.0, 10.0, Currency::Diamond, false);
    insert("seedance", "Seedance (Video)", 92.0, 8.0, Currency::Pollen, true);
    insert("wan", "Wan (Video)", 90.0, 9.0, Currency::Pollen, true);
    insert("ltx-2", "LTX-2 (Video)", 90.0, 9.0, Currency::Pollen, true);

    models
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    TextToImage,
    ImageToImage,
}

/// Combinable catalog predicates, AND-composed. The free/paid choice is a
/// single slot, so selecting one tier clears the other.
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    tier: Option<PricingTier>,
    capability: Option<Capability>,
    search: Option<String>,
    min_success_rate: Option<f64>,
}

impl ModelFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn free_only(mut self) -> Self {
        self.tier = Some(PricingTier::Free);
        self
    }

    pub fn paid_only(mut self) -> Self {
        self.tier = Some(PricingTier::Paid);
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn with_search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    /// Keep only models with a success rate of at least 90%.
    pub fn healthy(mut self) -> Self {
        self.min_success_rate = Some(90.0);
        self
    }

    pub fn matches(&self, model: &ModelDescriptor) -> bool {
        if let Some(tier) = self.tier {
            if model.pricing.tier != tier {
                return false;
            }
        }
        match self.capability {
            Some(Capability::TextToImage) if !model.capabilities.accepts_text => return false,
            Some(Capability::ImageToImage) if !model.capabilities.accepts_image => return false,
            _ => {}
        }
        if let Some(min) = self.min_success_rate {
            if model.health.success_rate_percent < min {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            if !needle.is_empty()
                && !model.name.to_lowercase().contains(&needle)
                && !model.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Vec<CatalogEntry> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bare_names_normalize_with_defaults() {
        let models = normalize_catalog(decode(json!(["flux", "turbo"])));

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "flux");
        assert_eq!(models[0].description, "flux");
        assert_eq!(models[1].name, "turbo");
        for model in &models {
            assert!(model.capabilities.accepts_text);
            assert!(model.capabilities.accepts_image);
            assert_eq!(model.pricing.tier, PricingTier::Free);
            assert_eq!(model.pricing.currency, Currency::Pollen);
            assert_eq!(model.health.success_rate_percent, 99.0);
        }
    }

    #[test]
    fn detailed_entry_maps_id_modalities_and_pricing() {
        let models = normalize_catalog(decode(json!([{
            "id": "gptimage",
            "name": "GPT Image",
            "input_modalities": ["text"],
            "pricing": { "currency": "diamond", "completionImageTokens": 5 },
            "paid_only": true
        }])));

        assert_eq!(models.len(), 1);
        let model = &models[0];
        assert_eq!(model.name, "gptimage");
        assert_eq!(model.description, "GPT Image");
        assert!(model.capabilities.accepts_text);
        assert!(!model.capabilities.accepts_image);
        assert_eq!(model.pricing.tier, PricingTier::Paid);
        assert_eq!(model.pricing.currency, Currency::Diamond);
        assert_eq!(model.pricing.unit_cost, 5.0);
    }

    #[test]
    fn detailed_entry_without_modalities_accepts_both() {
        let models = normalize_catalog(decode(json!([{ "id": "mystery" }])));
        assert!(models[0].capabilities.accepts_text);
        assert!(models[0].capabilities.accepts_image);
        assert_eq!(models[0].description, "mystery");
    }

    #[test]
    fn flat_entry_maps_health_and_price() {
        let models = normalize_catalog(decode(json!([{
            "name": "turbo",
            "description": "Turbo (Fast)",
            "successRate": 98,
            "avgResponseTime": 1.5,
            "price": 2,
            "currency": "diamond",
            "isT2I": true,
            "isI2I": false
        }])));

        let model = &models[0];
        assert_eq!(model.description, "Turbo (Fast)");
        assert_eq!(model.health.success_rate_percent, 98.0);
        assert_eq!(model.health.avg_response_seconds, 1.5);
        assert_eq!(model.pricing.tier, PricingTier::Paid);
        assert_eq!(model.pricing.unit_cost, 2.0);
        assert!(!model.capabilities.accepts_image);
    }

    #[test]
    fn mixed_shapes_decode_in_one_listing() {
        let models = normalize_catalog(decode(json!([
            "flux",
            { "name": "turbo", "successRate": 97 },
            { "id": "zimage", "paid_only": false }
        ])));

        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["flux", "turbo", "zimage"]);
    }

    #[test]
    fn duplicate_names_keep_last_entry_in_first_position() {
        let models = normalize_catalog(decode(json!([
            "flux",
            "turbo",
            { "name": "flux", "description": "Flux v2", "successRate": 91 }
        ])));

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "flux");
        assert_eq!(models[0].description, "Flux v2");
        assert_eq!(models[0].health.success_rate_percent, 91.0);
        assert_eq!(models[1].name, "turbo");
    }

    #[test]
    fn offline_fallback_is_nonempty_and_varied() {
        let models = offline_fallback_models();
        assert_eq!(models.len(), 19);

        let flux = models.iter().find(|m| m.name == "flux").unwrap();
        assert_eq!(flux.pricing.tier, PricingTier::Free);

        let imagen = models.iter().find(|m| m.name == "imagen-4").unwrap();
        assert!(!imagen.capabilities.accepts_image);
        assert_eq!(imagen.pricing.tier, PricingTier::Paid);

        // Video entries survive in the fallback.
        assert!(models.iter().any(|m| m.name == "veo"));
    }

    #[test]
    fn lookup_by_name() {
        let catalog = Catalog::offline();
        assert!(catalog.get("flux").is_some());
        assert!(catalog.get("does-not-exist").is_none());
    }

    #[test]
    fn filter_tier_choices_are_mutually_exclusive() {
        let catalog = Catalog::offline();
        let free_then_paid = ModelFilter::new().free_only().paid_only();
        for model in catalog.filter(&free_then_paid) {
            assert_eq!(model.pricing.tier, PricingTier::Paid);
        }
    }

    #[test]
    fn filters_and_compose() {
        let catalog = Catalog::offline();
        let filter = ModelFilter::new()
            .free_only()
            .with_capability(Capability::ImageToImage)
            .with_search("video");

        for model in catalog.filter(&filter) {
            assert_eq!(model.pricing.tier, PricingTier::Free);
            assert!(model.capabilities.accepts_image);
            let haystack = format!("{} {}", model.name, model.description).to_lowercase();
            assert!(haystack.contains("video"));
        }
        assert!(!catalog.filter(&filter).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let catalog = Catalog::offline();
        let by_description = ModelFilter::new().with_search("GPT IMAGE");
        assert!(catalog
            .filter(&by_description)
            .iter()
            .any(|m| m.name == "gptimage"));

        let by_name = ModelFilter::new().with_search("NANOBANANA");
        assert_eq!(catalog.filter(&by_name).len(), 2);
    }

    #[test]
    fn healthy_filter_drops_low_success_rates() {
        let mut models = offline_fallback_models();
        models[0].health.success_rate_percent = 42.0;
        let catalog = Catalog {
            models,
            source: CatalogSource::OfflineFallback,
        };

        let healthy = catalog.filter(&ModelFilter::new().healthy());
        assert!(healthy.iter().all(|m| m.health.success_rate_percent >= 90.0));
        assert_eq!(healthy.len(), 18);
    }
}
