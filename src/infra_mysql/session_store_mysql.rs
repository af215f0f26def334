use super::util::store_err;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

/// MySQL-backed session lineage. Rotation runs inside a transaction with a
/// row lock, so concurrent refreshes on one session serialize and exactly one
/// observes the presented fingerprint as live.
pub struct MySqlSessionStore {
    pool: MySqlPool,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionStore { pool }
    }

    fn sid_bytes(id: &SessionId) -> &[u8] {
        id.0.as_bytes()
    }
}

#[async_trait::async_trait]
impl SessionStore for MySqlSessionStore {
    async fn create(&self, user_id: UserId) -> Result<SessionRecord, StoreError> {
        let now = Utc::now();
        let record = SessionRecord {
            session_id: SessionId(Uuid::new_v4()),
            user_id,
            fingerprint: String::new(),
            generation: 0,
            created_at: now,
            last_rotated_at: now,
            revoked: false,
        };

        sqlx::query(
            r#"
INSERT INTO auth_session
    (session_id, user_id, fingerprint, generation, created_at, last_rotated_at, revoked)
VALUES (?, ?, '', 0, ?, ?, FALSE)
"#,
        )
        .bind(Self::sid_bytes(&record.session_id))
        .bind(record.user_id.0.as_bytes().as_slice())
        .bind(record.created_at)
        .bind(record.last_rotated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(record)
    }

    async fn save_fingerprint(
        &self,
        session_id: SessionId,
        fingerprint: &str,
    ) -> Result<(), SessionStoreError> {
        let result = sqlx::query(
            r#"
UPDATE auth_session SET fingerprint = ? WHERE session_id = ?
"#,
        )
        .bind(fingerprint)
        .bind(Self::sid_bytes(&session_id))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(SessionStoreError::NotFound);
        }
        Ok(())
    }

    async fn validate_and_rotate(
        &self,
        session_id: SessionId,
        presented: &str,
        replacement: &str,
    ) -> Result<u32, SessionStoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query(
            r#"
SELECT fingerprint, generation, revoked
FROM auth_session
WHERE session_id = ?
FOR UPDATE
"#,
        )
        .bind(Self::sid_bytes(&session_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?
        .ok_or(SessionStoreError::NotFound)?;

        let fingerprint: String = row.try_get("fingerprint").map_err(store_err)?;
        let generation: u32 = row.try_get("generation").map_err(store_err)?;
        let revoked: bool = row.try_get("revoked").map_err(store_err)?;

        if revoked {
            return Err(SessionStoreError::Revoked);
        }
        if fingerprint.is_empty() || fingerprint != presented {
            return Err(SessionStoreError::FingerprintMismatch);
        }

        let new_generation = generation + 1;
        sqlx::query(
            r#"
UPDATE auth_session
SET fingerprint = ?, generation = ?, last_rotated_at = ?
WHERE session_id = ?
"#,
        )
        .bind(replacement)
        .bind(new_generation)
        .bind(Utc::now())
        .bind(Self::sid_bytes(&session_id))
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        Ok(new_generation)
    }

    async fn revoke(&self, session_id: SessionId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
UPDATE auth_session SET revoked = TRUE WHERE session_id = ?
"#,
        )
        .bind(Self::sid_bytes(&session_id))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }
}
