use crate::models::usdc::Usdc;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub id: String,
    pub description: String,
    #[serde(rename = "priceUSD")]
    pub price: Usdc,
    pub endpoint: String,
    #[serde(
        rename = "maxDurationSecs",
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration_as_secs"
    )]
    pub max_duration: Option<Duration>,
}

fn duration_as_secs<S: Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(d) => serializer.serialize_some(&d.as_secs()),
        None => serializer.serialize_none(),
    }
}

// The set of priced services is fixed per deployment.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: BTreeMap<String, ServiceDescriptor>,
}

impl ServiceCatalog {
    // Prices are in USDC base units (six decimals): 1_000 = 0.001 USDC.
    pub fn standard() -> Self {
        let mut catalog = Self {
            services: BTreeMap::new(),
        };
        catalog.insert("weather", "Real-time weather data", 1_000, None);
        catalog.insert("crypto", "Cryptocurrency prices", 5_000, None);
        catalog.insert("news", "Latest news headlines", 2_000, None);
        catalog.insert("geo", "Geocoding service", 3_000, None);
        catalog.insert(
            "tts",
            "Text-to-speech synthesis",
            5_000,
            Some(Duration::from_secs(60)),
        );
        catalog.insert("memory", "Agent memory storage", 2_000, None);
        catalog.insert(
            "premium",
            "Full API access (all services)",
            10_000,
            Some(Duration::from_secs(30 * 24 * 60 * 60)),
        );
        catalog
    }

    fn insert(&mut self, id: &str, description: &str, units: u64, max_duration: Option<Duration>) {
        self.services.insert(
            id.to_string(),
            ServiceDescriptor {
                id: id.to_string(),
                description: description.to_string(),
                price: Usdc::from_base_units(units),
                endpoint: format!("/api/{id}"),
                max_duration,
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDescriptor> {
        self.services.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
