use crate::application_port::*;

// Minimal fakes for local runs without provider credentials.

#[derive(Debug, Default)]
pub struct FakeTradeLookup;

impl FakeTradeLookup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl TradeLookupService for FakeTradeLookup {
    async fn query(&self, query: TradeQuery) -> Result<Vec<TradeRecord>, LookupError> {
        let year: u16 = query.deal_ym.get(..4).and_then(|s| s.parse().ok()).unwrap_or(2024);
        let month: u8 = query.deal_ym.get(4..6).and_then(|s| s.parse().ok()).unwrap_or(1);
        Ok(vec![
            TradeRecord {
                apartment: format!("complex-{}", query.lawd_cd),
                deal_amount: "82,500".to_string(),
                deal_year: year,
                deal_month: month,
                deal_day: 12,
                area: 84.97,
                floor: 11,
            },
            TradeRecord {
                apartment: format!("complex-{}", query.lawd_cd),
                deal_amount: "79,000".to_string(),
                deal_year: year,
                deal_month: month,
                deal_day: 25,
                area: 59.92,
                floor: 4,
            },
        ])
    }
}

#[derive(Debug, Default)]
pub struct FakeGeocodeService;

impl FakeGeocodeService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl GeocodeService for FakeGeocodeService {
    async fn query(&self, address: &str) -> Result<GeocodeResult, LookupError> {
        Ok(GeocodeResult {
            address: address.to_string(),
            latitude: 37.5665,
            longitude: 126.978,
        })
    }
}
