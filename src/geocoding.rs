use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::configuration::GeocodingSettings;

pub const MIN_QUERY_LEN: usize = 3;

// Client for the address search API (api-adresse.data.gouv.fr format)
#[derive(Clone)]
pub struct GeocodingClient {
    http_client: Client,
    base_url: String,
    max_results: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AddressSuggestion {
    pub label: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: FeatureProperties,
}

#[derive(Deserialize)]
struct Geometry {
    // GeoJSON order: [longitude, latitude]
    coordinates: [f64; 2],
}

#[derive(Deserialize)]
struct FeatureProperties {
    label: String,
    city: Option<String>,
    postcode: Option<String>,
}

impl From<Feature> for AddressSuggestion {
    fn from(feature: Feature) -> Self {
        Self {
            label: feature.properties.label,
            city: feature.properties.city,
            postal_code: feature.properties.postcode,
            longitude: feature.geometry.coordinates[0],
            latitude: feature.geometry.coordinates[1],
        }
    }
}

impl GeocodingClient {
    pub fn new(settings: &GeocodingSettings) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.api_uri.trim_end_matches('/').to_string(),
            max_results: settings.max_results,
        })
    }

    #[tracing::instrument("Searching addresses", skip(self))]
    pub async fn search(
        &self,
        query: &str,
        limit: Option<u8>,
    ) -> Result<Vec<AddressSuggestion>, reqwest::Error> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let limit = limit.unwrap_or(self.max_results).clamp(1, self.max_results.max(1));

        let collection = self.http_client
            .get(format!("{}/search/", self.base_url))
            .query(&[("q", query.to_string()), ("limit", limit.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<FeatureCollection>()
            .await?;

        Ok(collection.features.into_iter().map(AddressSuggestion::from).collect())
    }
}
