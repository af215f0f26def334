use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub storage: Storage,
    pub http: Http,
    pub lookup: Lookup,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Dev fallback; `JWT_SIGNING_KEY` takes precedence.
    pub signing_key: String,
    /// Dev fallback; `FINGERPRINT_KEY` takes precedence.
    pub fingerprint_key: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub leeway_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "mysql" or "memory"
    pub mysql_dsn: String,
    /// Optional login seeded into the memory backend for local runs.
    pub seed_user: Option<SeedUser>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub cert_path: String,
    pub key_path: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Lookup {
    pub backend: String, // "fake" or "http"
    pub trade_base_url: String,
    pub geocode_base_url: String,
    pub service_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
