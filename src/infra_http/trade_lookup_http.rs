use crate::application_port::*;
use serde::Deserialize;
use std::time::Duration;

/// Pass-through client for the apartment sale-price provider. One GET per
/// query, bounded by the client timeout; no retries, no caching.
pub struct HttpTradeLookup {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct TradeResponse {
    items: Vec<TradeRecord>,
}

impl HttpTradeLookup {
    pub fn new(base_url: String, service_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTradeLookup {
            client,
            base_url,
            service_key,
        })
    }
}

#[async_trait::async_trait]
impl TradeLookupService for HttpTradeLookup {
    async fn query(&self, query: TradeQuery) -> Result<Vec<TradeRecord>, LookupError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("LAWD_CD", query.lawd_cd.as_str()),
                ("DEAL_YMD", query.deal_ym.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LookupError::Provider(format!(
                "trade provider returned {}",
                response.status()
            )));
        }

        let body: TradeResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;
        Ok(body.items)
    }
}
