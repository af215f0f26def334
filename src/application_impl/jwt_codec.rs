use crate::application_port::*;
use crate::domain_model::{SessionId, UserId};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Signing configuration, built once at startup and handed to the codec as an
/// explicit dependency. No runtime mutation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Clock-skew tolerance applied when checking `exp`.
    pub leeway: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    typ: TokenType,
    /// Session id; refresh tokens only.
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<String>,
    /// Rotation generation; refresh tokens only. Keeps tokens of one session
    /// distinct across rotations even within the same clock second.
    #[serde(rename = "gen", skip_serializing_if = "Option::is_none")]
    generation: Option<u32>,
}

fn encode_claims(claims: &JwtClaims, cfg: &JwtConfig) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))
}

fn decode_claims(token: &str, cfg: &JwtConfig) -> Result<JwtClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.leeway = cfg.leeway.as_secs();
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    fn base_claims(&self, user: UserId, ttl: Duration, typ: TokenType) -> (JwtClaims, DateTime<Utc>) {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + ttl;
        let claims = JwtClaims {
            sub: user.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            typ,
            sid: None,
            generation: None,
        };
        (claims, exp_dt)
    }

    fn claims_to_public(claims: JwtClaims) -> Result<TokenClaims, AuthError> {
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenInvalid)?;
        let session_id = claims
            .sid
            .as_deref()
            .map(|s| s.parse::<SessionId>().map_err(|_| AuthError::TokenInvalid))
            .transpose()?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::TokenInvalid)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::TokenInvalid)?;
        Ok(TokenClaims {
            user_id,
            token_type: claims.typ,
            session_id,
            generation: claims.generation,
            issued_at,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (claims, exp_dt) = self.base_claims(user, self.cfg.access_ttl, TokenType::Access);
        let token = encode_claims(&claims, &self.cfg)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
        session_id: SessionId,
        generation: u32,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (mut claims, exp_dt) = self.base_claims(user, self.cfg.refresh_ttl, TokenType::Refresh);
        claims.sid = Some(session_id.to_string());
        claims.generation = Some(generation);
        let token = encode_claims(&claims, &self.cfg)?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn decode(&self, token: &str, expected: TokenType) -> Result<TokenClaims, AuthError> {
        let claims = decode_claims(token, &self.cfg)?;
        if claims.typ != expected {
            return Err(AuthError::TokenTypeMismatch);
        }
        if claims.typ == TokenType::Refresh && (claims.sid.is_none() || claims.generation.is_none()) {
            return Err(AuthError::TokenInvalid);
        }
        Self::claims_to_public(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_cfg() -> JwtConfig {
        JwtConfig {
            issuer: "cadastre.auth".to_string(),
            audience: "cadastre-client".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(14 * 24 * 60 * 60),
            leeway: Duration::from_secs(5),
            signing_key: b"test-signing-key".to_vec(),
        }
    }

    #[tokio::test]
    async fn access_token_round_trips_subject_and_type() {
        let codec = JwtHs256Codec::new(test_cfg());
        let user = UserId(Uuid::new_v4());

        let (token, exp) = codec.issue_access_token(user).await.unwrap();
        let claims = codec.decode(&token.0, TokenType::Access).await.unwrap();

        assert_eq!(claims.user_id, user);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.session_id, None);
        assert_eq!(claims.expires_at.timestamp(), exp.timestamp());
    }

    #[tokio::test]
    async fn refresh_token_carries_session_and_generation() {
        let codec = JwtHs256Codec::new(test_cfg());
        let user = UserId(Uuid::new_v4());
        let sid = SessionId(Uuid::new_v4());

        let (token, _) = codec.issue_refresh_token(user, sid, 3).await.unwrap();
        let claims = codec.decode(&token.0, TokenType::Refresh).await.unwrap();

        assert_eq!(claims.user_id, user);
        assert_eq!(claims.session_id, Some(sid));
        assert_eq!(claims.generation, Some(3));
    }

    #[tokio::test]
    async fn type_mismatch_is_detected_both_ways() {
        let codec = JwtHs256Codec::new(test_cfg());
        let user = UserId(Uuid::new_v4());
        let sid = SessionId(Uuid::new_v4());

        let (access, _) = codec.issue_access_token(user).await.unwrap();
        let (refresh, _) = codec.issue_refresh_token(user, sid, 0).await.unwrap();

        assert!(matches!(
            codec.decode(&access.0, TokenType::Refresh).await,
            Err(AuthError::TokenTypeMismatch)
        ));
        assert!(matches!(
            codec.decode(&refresh.0, TokenType::Access).await,
            Err(AuthError::TokenTypeMismatch)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_rejected_past_leeway() {
        let mut cfg = test_cfg();
        cfg.access_ttl = Duration::from_secs(0);
        cfg.leeway = Duration::from_secs(0);
        let codec = JwtHs256Codec::new(cfg);
        let user = UserId(Uuid::new_v4());

        let (token, _) = codec.issue_access_token(user).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(matches!(
            codec.decode(&token.0, TokenType::Access).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn leeway_tolerates_small_skew() {
        // Token already past exp, but within the configured leeway.
        let mut cfg = test_cfg();
        cfg.access_ttl = Duration::from_secs(0);
        cfg.leeway = Duration::from_secs(30);
        let codec = JwtHs256Codec::new(cfg);
        let user = UserId(Uuid::new_v4());

        let (token, _) = codec.issue_access_token(user).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(codec.decode(&token.0, TokenType::Access).await.is_ok());
    }

    #[tokio::test]
    async fn tampered_token_is_invalid() {
        let codec = JwtHs256Codec::new(test_cfg());
        let other = JwtHs256Codec::new(JwtConfig {
            signing_key: b"a-different-key".to_vec(),
            ..test_cfg()
        });
        let user = UserId(Uuid::new_v4());

        let (token, _) = other.issue_access_token(user).await.unwrap();

        assert!(matches!(
            codec.decode(&token.0, TokenType::Access).await,
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            codec.decode("not-a-token", TokenType::Access).await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
