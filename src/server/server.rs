use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::domain_port::*;
use crate::infra_http::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use chrono::Utc;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub trade_service: Arc<dyn TradeLookupService>,
    pub geocode_service: Arc<dyn GeocodeService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let signing_key = std::env::var("JWT_SIGNING_KEY")
            .unwrap_or_else(|_| settings.auth.signing_key.clone())
            .into_bytes();
        let fingerprint_key = std::env::var("FINGERPRINT_KEY")
            .unwrap_or_else(|_| settings.auth.fingerprint_key.clone())
            .into_bytes();

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            leeway: Duration::from_secs(settings.auth.leeway_secs),
            signing_key,
        }));

        let user_repo: Arc<dyn UserRepo>;
        let session_store: Arc<dyn SessionStore>;
        let pool = match settings.storage.backend.as_str() {
            "mysql" => {
                let pool = MySqlPoolOptions::new()
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(&settings.storage.mysql_dsn)
                    .await?;
                user_repo = Arc::new(MySqlUserRepo::new(pool.clone()));
                session_store = Arc::new(MySqlSessionStore::new(pool.clone()));
                Some(pool)
            }
            "memory" => {
                let users = Arc::new(MemoryUserRepo::new());
                if let Some(seed) = &settings.storage.seed_user {
                    users.insert(UserRecord {
                        user_id: UserId(Uuid::new_v4()),
                        username: seed.username.clone(),
                        password_hash: hash_secret(&seed.password)?,
                        is_active: true,
                        created_at: Utc::now(),
                    });
                    warn!(username = %seed.username, "seeded memory user store; not for production");
                }
                user_repo = users;
                session_store = Arc::new(MemorySessionStore::new());
                None
            }
            other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        };

        let credential_verifier: Arc<dyn CredentialVerifier> =
            Arc::new(ArgonCredentialVerifier::new(user_repo.clone())?);

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            credential_verifier,
            token_codec,
            session_store,
            fingerprint_key,
        ));

        let lookup_timeout = Duration::from_secs(settings.lookup.timeout_secs);
        let (trade_service, geocode_service): (Arc<dyn TradeLookupService>, Arc<dyn GeocodeService>) =
            match settings.lookup.backend.as_str() {
                "fake" => (Arc::new(FakeTradeLookup::new()), Arc::new(FakeGeocodeService::new())),
                "http" => (
                    Arc::new(HttpTradeLookup::new(
                        settings.lookup.trade_base_url.clone(),
                        settings.lookup.service_key.clone(),
                        lookup_timeout,
                    )?),
                    Arc::new(HttpGeocodeService::new(
                        settings.lookup.geocode_base_url.clone(),
                        settings.lookup.service_key.clone(),
                        lookup_timeout,
                    )?),
                ),
                other => return Err(anyhow::anyhow!("Unknown lookup backend: {}", other)),
            };

        info!("server started");

        Ok(Self {
            auth_service,
            trade_service,
            geocode_service,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
