use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// In-process session store. The dashmap entry guard makes
/// `validate_and_rotate` a single indivisible check-and-set per session,
/// matching the row-locked MySQL implementation.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        MemorySessionStore {
            sessions: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
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
        self.sessions.insert(record.session_id, record.clone());
        Ok(record)
    }

    async fn save_fingerprint(
        &self,
        session_id: SessionId,
        fingerprint: &str,
    ) -> Result<(), SessionStoreError> {
        let mut entry = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionStoreError::NotFound)?;
        entry.fingerprint = fingerprint.to_string();
        Ok(())
    }

    async fn validate_and_rotate(
        &self,
        session_id: SessionId,
        presented: &str,
        replacement: &str,
    ) -> Result<u32, SessionStoreError> {
        let mut entry = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionStoreError::NotFound)?;

        if entry.revoked {
            return Err(SessionStoreError::Revoked);
        }
        if entry.fingerprint.is_empty() || entry.fingerprint != presented {
            return Err(SessionStoreError::FingerprintMismatch);
        }

        entry.fingerprint = replacement.to_string();
        entry.generation += 1;
        entry.last_rotated_at = Utc::now();
        Ok(entry.generation)
    }

    async fn revoke(&self, session_id: SessionId) -> Result<(), StoreError> {
        if let Some(mut entry) = self.sessions.get_mut(&session_id) {
            entry.revoked = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn rotation_lifecycle() {
        let store = MemorySessionStore::new();
        let session = store.create(UserId(Uuid::new_v4())).await.unwrap();
        assert_eq!(session.generation, 0);
        assert!(!session.revoked);

        store.save_fingerprint(session.session_id, "fp-0").await.unwrap();

        let generation = store
            .validate_and_rotate(session.session_id, "fp-0", "fp-1")
            .await
            .unwrap();
        assert_eq!(generation, 1);

        // The replaced fingerprint is dead.
        assert!(matches!(
            store.validate_and_rotate(session.session_id, "fp-0", "fp-2").await,
            Err(SessionStoreError::FingerprintMismatch)
        ));

        // The live one rotates again.
        let generation = store
            .validate_and_rotate(session.session_id, "fp-1", "fp-2")
            .await
            .unwrap();
        assert_eq!(generation, 2);
    }

    #[tokio::test]
    async fn unbound_session_matches_no_fingerprint() {
        let store = MemorySessionStore::new();
        let session = store.create(UserId(Uuid::new_v4())).await.unwrap();

        assert!(matches!(
            store.validate_and_rotate(session.session_id, "", "fp-1").await,
            Err(SessionStoreError::FingerprintMismatch)
        ));
    }

    #[tokio::test]
    async fn revoked_session_never_rotates() {
        let store = MemorySessionStore::new();
        let session = store.create(UserId(Uuid::new_v4())).await.unwrap();
        store.save_fingerprint(session.session_id, "fp-0").await.unwrap();

        store.revoke(session.session_id).await.unwrap();
        assert!(matches!(
            store.validate_and_rotate(session.session_id, "fp-0", "fp-1").await,
            Err(SessionStoreError::Revoked)
        ));

        // Revoke is idempotent, including for unknown sessions.
        store.revoke(session.session_id).await.unwrap();
        store.revoke(SessionId(Uuid::new_v4())).await.unwrap();
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = MemorySessionStore::new();
        assert!(matches!(
            store
                .validate_and_rotate(SessionId(Uuid::new_v4()), "fp", "fp2")
                .await,
            Err(SessionStoreError::NotFound)
        ));
        assert!(matches!(
            store.save_fingerprint(SessionId(Uuid::new_v4()), "fp").await,
            Err(SessionStoreError::NotFound)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_rotation_has_exactly_one_winner() {
        let store = Arc::new(MemorySessionStore::new());
        let session = store.create(UserId(Uuid::new_v4())).await.unwrap();
        store.save_fingerprint(session.session_id, "stale").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let sid = session.session_id;
            handles.push(tokio::spawn(async move {
                store
                    .validate_and_rotate(sid, "stale", &format!("fp-{}", i))
                    .await
            }));
        }

        let mut wins = 0;
        let mut mismatches = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(generation) => {
                    assert_eq!(generation, 1);
                    wins += 1;
                }
                Err(SessionStoreError::FingerprintMismatch) => mismatches += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(mismatches, 7);
    }
}
