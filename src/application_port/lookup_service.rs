use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("could not decode provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeQuery {
    /// Legal-district code of the apartment complex.
    pub lawd_cd: String,
    /// Deal month, `YYYYMM`.
    pub deal_ym: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub apartment: String,
    pub deal_amount: String,
    pub deal_year: u16,
    pub deal_month: u8,
    pub deal_day: u8,
    pub area: f64,
    pub floor: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Apartment sale-price lookups: a thin pass-through to the external trade
/// API. HTTP request in, DTO out; no state here.
#[async_trait::async_trait]
pub trait TradeLookupService: Send + Sync {
    async fn query(&self, query: TradeQuery) -> Result<Vec<TradeRecord>, LookupError>;
}

/// Address geocoding, same pass-through shape.
#[async_trait::async_trait]
pub trait GeocodeService: Send + Sync {
    async fn query(&self, address: &str) -> Result<GeocodeResult, LookupError>;
}
