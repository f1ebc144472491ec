use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use citadel_application::UserDirectory;
use citadel_core::AppResult;
use citadel_domain::{User, UserId};

/// In-memory user directory implementation.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id(), user);
    }

    /// Removes a user, mirroring deletion in the identity subsystem.
    pub async fn remove_user(&self, user_id: UserId) -> Option<User> {
        self.users.write().await.remove(&user_id)
    }

    pub(crate) async fn snapshot(&self) -> BTreeMap<UserId, User> {
        self.users.read().await.clone()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.name() == name)
            .cloned())
    }
}
