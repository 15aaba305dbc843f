//! In-memory user profile store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use heimdall_auth::AuthResult;
use heimdall_auth::storage::UserStorage;
use heimdall_auth::types::UserProfile;

/// In-memory [`UserStorage`].
#[derive(Default)]
pub struct MemoryUserStorage {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryUserStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile.
    pub fn insert(&self, profile: UserProfile) {
        self.users
            .write()
            .expect("user store lock poisoned")
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<UserProfile>> {
        Ok(self
            .users
            .read()
            .expect("user store lock poisoned")
            .get(user_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryUserStorage::new();
        store.insert(UserProfile {
            id: "user-1".to_string(),
            email: Some("jane@example.com".to_string()),
            ..UserProfile::default()
        });

        let found = store.find_by_id("user-1").await.unwrap().unwrap();
        assert_eq!(found.email.as_deref(), Some("jane@example.com"));

        assert!(store.find_by_id("nobody").await.unwrap().is_none());
    }
}
