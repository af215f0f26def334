mod geocode_http;
mod trade_lookup_http;

pub use geocode_http::*;
pub use trade_lookup_http::*;
