use crate::domain_model::{SessionId, UserId};
use crate::domain_port::{StoreError, UserRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("wrong token type presented")]
    TokenTypeMismatch,
    #[error("session not found")]
    SessionNotFound,
    #[error("session revoked")]
    SessionRevoked,
    #[error("refresh token replay detected")]
    ReplayDetected,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Store(e.0)
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Decoded claims of either token kind. `session_id` and `generation` are
/// only present on refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub token_type: TokenType,
    pub session_id: Option<SessionId>,
    pub generation: Option<u32>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn issue_refresh_token(
        &self,
        user: UserId,
        session_id: SessionId,
        generation: u32,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError>;
    /// Decode and verify a token, insisting on `expected` type.
    async fn decode(&self, token: &str, expected: TokenType) -> Result<TokenClaims, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a username/password pair against stored records.
    ///
    /// Unknown user and wrong password are both `InvalidCredentials` with the
    /// same timing class; a disabled account is `AccountDisabled`.
    async fn verify(&self, username: &str, password: &str) -> Result<UserRecord, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Exchange a live refresh token for a rotated pair. Single-use: a stale
    /// token is treated as replay and kills the session.
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    /// Bearer check for protected routes.
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
    /// Idempotent session revocation.
    async fn logout(&self, session_id: SessionId) -> Result<(), AuthError>;
    /// Logout addressed by the refresh token itself; the session id is taken
    /// from its claims.
    async fn logout_by_token(&self, refresh_token: &str) -> Result<(), AuthError>;
}
