use crate::application_port::*;
use crate::domain_model::{SessionId, UserId};
use crate::domain_port::{SessionStore, SessionStoreError};
use crate::logger::*;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use std::sync::Arc;

fn store_err(e: SessionStoreError) -> AuthError {
    match e {
        SessionStoreError::NotFound => AuthError::SessionNotFound,
        SessionStoreError::Revoked => AuthError::SessionRevoked,
        SessionStoreError::FingerprintMismatch => AuthError::ReplayDetected,
        SessionStoreError::Store(e) => AuthError::Store(e.0),
    }
}

pub struct RealAuthService {
    credential_verifier: Arc<dyn CredentialVerifier>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn SessionStore>,
    fingerprint_key: Vec<u8>,
}

impl RealAuthService {
    pub fn new(
        credential_verifier: Arc<dyn CredentialVerifier>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionStore>,
        fingerprint_key: Vec<u8>,
    ) -> Self {
        Self {
            credential_verifier,
            token_codec,
            session_store,
            fingerprint_key,
        }
    }

    /// Keyed, non-reversible representation of a refresh token; only this is
    /// ever persisted.
    fn fingerprint(&self, token: &str) -> Result<String, AuthError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.fingerprint_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { username, password } = request;

        let user = self.credential_verifier.verify(&username, &password).await?;

        let session = self.session_store.create(user.user_id).await?;

        let (access_token, access_exp) = self.token_codec.issue_access_token(user.user_id).await?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue_refresh_token(user.user_id, session.session_id, session.generation)
            .await?;

        let fingerprint = self.fingerprint(&refresh_token.0)?;
        self.session_store
            .save_fingerprint(session.session_id, &fingerprint)
            .await
            .map_err(store_err)?;

        info!(user_id = %user.user_id, session_id = %session.session_id, "login succeeded");

        Ok(LoginResult {
            user_id: user.user_id,
            session_id: session.session_id,
            tokens: AuthTokens {
                access_token,
                refresh_token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh_exp,
            },
        })
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = self
            .token_codec
            .decode(refresh_token, TokenType::Refresh)
            .await?;

        // The codec rejects refresh tokens without these claims.
        let session_id = claims.session_id.ok_or(AuthError::TokenInvalid)?;
        let generation = claims.generation.ok_or(AuthError::TokenInvalid)?;

        let presented = self.fingerprint(refresh_token)?;

        // Issue the replacement first; the rotation is the commit point.
        let (new_refresh, refresh_exp) = self
            .token_codec
            .issue_refresh_token(claims.user_id, session_id, generation + 1)
            .await?;
        let replacement = self.fingerprint(&new_refresh.0)?;

        match self
            .session_store
            .validate_and_rotate(session_id, &presented, &replacement)
            .await
        {
            Ok(new_generation) => {
                debug!(%session_id, generation = new_generation, "refresh token rotated");
            }
            Err(SessionStoreError::FingerprintMismatch) => {
                // An already-rotated token came back: theft or a lost race.
                // Either way the lineage is compromised; kill the session.
                warn!(%session_id, user_id = %claims.user_id, "refresh token replay; revoking session");
                self.session_store.revoke(session_id).await?;
                return Err(AuthError::ReplayDetected);
            }
            Err(e) => return Err(store_err(e)),
        }

        let (access_token, access_exp) = self.token_codec.issue_access_token(claims.user_id).await?;

        Ok(AuthTokens {
            access_token,
            refresh_token: new_refresh,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.token_codec.decode(token, TokenType::Access).await?;
        Ok(claims.user_id)
    }

    async fn logout(&self, session_id: SessionId) -> Result<(), AuthError> {
        self.session_store.revoke(session_id).await?;
        info!(%session_id, "session revoked");
        Ok(())
    }

    async fn logout_by_token(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .token_codec
            .decode(refresh_token, TokenType::Refresh)
            .await?;
        let session_id = claims.session_id.ok_or(AuthError::TokenInvalid)?;
        self.logout(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{ArgonCredentialVerifier, JwtConfig, JwtHs256Codec, hash_secret};
    use crate::domain_port::UserRecord;
    use crate::infra_memory::{MemorySessionStore, MemoryUserRepo};
    use chrono::Utc;
    use std::time::Duration;
    use uuid::Uuid;

    fn service() -> Arc<RealAuthService> {
        let repo = Arc::new(MemoryUserRepo::new());
        repo.insert(UserRecord {
            user_id: UserId(Uuid::new_v4()),
            username: "resident".to_string(),
            password_hash: hash_secret("correct horse").unwrap(),
            is_active: true,
            created_at: Utc::now(),
        });

        let verifier = Arc::new(ArgonCredentialVerifier::new(repo).unwrap());
        let codec = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: "cadastre.auth".to_string(),
            audience: "cadastre-client".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(14 * 24 * 60 * 60),
            leeway: Duration::from_secs(5),
            signing_key: b"test-signing-key".to_vec(),
        }));
        let sessions = Arc::new(MemorySessionStore::new());

        Arc::new(RealAuthService::new(
            verifier,
            codec,
            sessions,
            b"test-fingerprint-key".to_vec(),
        ))
    }

    async fn login(service: &RealAuthService) -> LoginResult {
        service
            .login(LoginInput {
                username: "resident".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_then_refresh_yields_generation_one() {
        let service = service();
        let result = login(&service).await;

        let rotated = service
            .refresh_token(&result.tokens.refresh_token.0)
            .await
            .unwrap();

        let claims = service
            .token_codec
            .decode(&rotated.refresh_token.0, TokenType::Refresh)
            .await
            .unwrap();
        assert_eq!(claims.generation, Some(1));
        assert_eq!(claims.session_id, Some(result.session_id));
    }

    #[tokio::test]
    async fn replayed_refresh_token_kills_the_session() {
        let service = service();
        let result = login(&service).await;
        let stale = result.tokens.refresh_token.0.clone();

        let rotated = service.refresh_token(&stale).await.unwrap();

        // Second use of the same token is replay.
        assert!(matches!(
            service.refresh_token(&stale).await,
            Err(AuthError::ReplayDetected)
        ));

        // The session is dead for everyone now, including the live token.
        assert!(matches!(
            service.refresh_token(&rotated.refresh_token.0).await,
            Err(AuthError::SessionRevoked)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refresh_has_exactly_one_winner() {
        let service = service();
        let result = login(&service).await;
        let token = result.tokens.refresh_token.0;

        let a = {
            let service = service.clone();
            let token = token.clone();
            tokio::spawn(async move { service.refresh_token(&token).await })
        };
        let b = {
            let service = service.clone();
            let token = token.clone();
            tokio::spawn(async move { service.refresh_token(&token).await })
        };

        let outcomes = [a.await.unwrap(), b.await.unwrap()];
        let wins = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(outcomes.iter().any(|o| matches!(
            o,
            Err(AuthError::ReplayDetected) | Err(AuthError::SessionRevoked)
        )));
    }

    #[tokio::test]
    async fn logout_then_refresh_is_session_revoked() {
        let service = service();
        let result = login(&service).await;

        service.logout(result.session_id).await.unwrap();
        // Idempotent.
        service.logout(result.session_id).await.unwrap();

        assert!(matches!(
            service.refresh_token(&result.tokens.refresh_token.0).await,
            Err(AuthError::SessionRevoked)
        ));
    }

    #[tokio::test]
    async fn logout_by_refresh_token_revokes_its_session() {
        let service = service();
        let result = login(&service).await;

        service
            .logout_by_token(&result.tokens.refresh_token.0)
            .await
            .unwrap();

        assert!(matches!(
            service.refresh_token(&result.tokens.refresh_token.0).await,
            Err(AuthError::SessionRevoked)
        ));
        // An access token is not a logout credential.
        assert!(matches!(
            service.logout_by_token(&result.tokens.access_token.0).await,
            Err(AuthError::TokenTypeMismatch)
        ));
    }

    #[tokio::test]
    async fn access_token_passes_bearer_check_and_refresh_does_not() {
        let service = service();
        let result = login(&service).await;

        let user_id = service
            .verify_token(&result.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(user_id, result.user_id);

        assert!(matches!(
            service.verify_token(&result.tokens.refresh_token.0).await,
            Err(AuthError::TokenTypeMismatch)
        ));
    }

    #[tokio::test]
    async fn login_failures_propagate() {
        let service = service();

        assert!(matches!(
            service
                .login(LoginInput {
                    username: "resident".to_string(),
                    password: "wrong".to_string(),
                })
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn refresh_with_garbage_is_token_invalid() {
        let service = service();
        assert!(matches!(
            service.refresh_token("not-a-token").await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let service = service();
        let first = login(&service).await;
        let second = login(&service).await;

        // Killing one device's session leaves the other intact.
        let stale = first.tokens.refresh_token.0.clone();
        service.refresh_token(&stale).await.unwrap();
        let _ = service.refresh_token(&stale).await;

        assert!(service
            .refresh_token(&second.tokens.refresh_token.0)
            .await
            .is_ok());
    }
}
