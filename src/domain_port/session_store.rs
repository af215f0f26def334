use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
#[error("storage failure: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session not found")]
    NotFound,
    #[error("session revoked")]
    Revoked,
    #[error("refresh token fingerprint does not match the live one")]
    FingerprintMismatch,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persisted refresh-token lineage, one record per session.
///
/// `validate_and_rotate` is the only operation that needs mutual exclusion,
/// and only per session: the check of the stored fingerprint and its
/// replacement must be one indivisible step, so that two refreshes racing on
/// the same stale token cannot both win.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocate a session: generation 0, not revoked, fingerprint unbound.
    async fn create(&self, user_id: UserId) -> Result<SessionRecord, StoreError>;

    /// Bind the login-time refresh token fingerprint to a fresh session.
    async fn save_fingerprint(
        &self,
        session_id: SessionId,
        fingerprint: &str,
    ) -> Result<(), SessionStoreError>;

    /// Atomically confirm `presented` is the live fingerprint and replace it,
    /// bumping the generation. Returns the new generation.
    async fn validate_and_rotate(
        &self,
        session_id: SessionId,
        presented: &str,
        replacement: &str,
    ) -> Result<u32, SessionStoreError>;

    /// Mark the session revoked. Idempotent; unknown ids are a no-op.
    async fn revoke(&self, session_id: SessionId) -> Result<(), StoreError>;
}
