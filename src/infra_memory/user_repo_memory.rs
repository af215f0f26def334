use crate::domain_port::*;
use dashmap::DashMap;

/// In-process user records, keyed by username. Backs the `memory` storage
/// backend and the unit tests; seed it with `insert`.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<String, UserRecord>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo {
            users: DashMap::new(),
        }
    }

    pub fn insert(&self, record: UserRecord) {
        self.users.insert(record.username.clone(), record);
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(username).map(|r| r.value().clone()))
    }
}
