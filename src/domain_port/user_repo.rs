use crate::domain_model::*;
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Read-only view of the user-management collaborator's records.
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fetch a user by username (for login).
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;
}
