use crate::application_port::*;
use serde::Deserialize;
use std::time::Duration;

/// Pass-through client for the address geocoding provider.
pub struct HttpGeocodeService {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    addresses: Vec<GeocodeAddress>,
}

#[derive(Debug, Deserialize)]
struct GeocodeAddress {
    road_address: String,
    #[serde(rename = "x")]
    longitude: f64,
    #[serde(rename = "y")]
    latitude: f64,
}

impl HttpGeocodeService {
    pub fn new(base_url: String, service_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpGeocodeService {
            client,
            base_url,
            service_key,
        })
    }
}

#[async_trait::async_trait]
impl GeocodeService for HttpGeocodeService {
    async fn query(&self, address: &str) -> Result<GeocodeResult, LookupError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("query", address), ("key", self.service_key.as_str())])
            .send()
            .await
            .map_err(|e| LookupError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::Provider(format!(
                "geocode provider returned {}",
                response.status()
            )));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        let hit = body
            .addresses
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::Provider("no match for address".to_string()))?;

        Ok(GeocodeResult {
            address: hit.road_address,
            latitude: hit.latitude,
            longitude: hit.longitude,
        })
    }
}
