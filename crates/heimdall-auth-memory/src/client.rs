//! In-memory client store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use heimdall_auth::storage::ClientStorage;
use heimdall_auth::types::Client;
use heimdall_auth::{AuthError, AuthResult};

/// In-memory [`ClientStorage`].
#[derive(Default)]
pub struct MemoryClientStorage {
    clients: RwLock<HashMap<String, Client>>,
    failures: RwLock<Vec<(String, OffsetDateTime)>>,
}

impl MemoryClientStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.read().expect("client store lock poisoned").len()
    }

    /// Returns `true` if the store holds no clients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ClientStorage for MemoryClientStorage {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self
            .clients
            .read()
            .expect("client store lock poisoned")
            .get(client_id)
            .cloned())
    }

    async fn create(&self, client: &Client) -> AuthResult<()> {
        let mut clients = self.clients.write().expect("client store lock poisoned");
        if clients.contains_key(&client.client_id) {
            return Err(AuthError::internal("Duplicate client_id"));
        }
        clients.insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn update(&self, client: &Client) -> AuthResult<()> {
        let mut clients = self.clients.write().expect("client store lock poisoned");
        if !clients.contains_key(&client.client_id) {
            return Err(AuthError::not_found("Client not found"));
        }
        clients.insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn delete(&self, client_id: &str) -> AuthResult<bool> {
        Ok(self
            .clients
            .write()
            .expect("client store lock poisoned")
            .remove(client_id)
            .is_some())
    }

    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Client>> {
        let mut clients: Vec<Client> = self
            .clients
            .read()
            .expect("client store lock poisoned")
            .values()
            .cloned()
            .collect();
        clients.sort_by_key(|c| c.created_at);
        Ok(clients.into_iter().skip(offset).take(limit).collect())
    }

    async fn touch_last_used(&self, client_id: &str, at: OffsetDateTime) -> AuthResult<()> {
        if let Some(client) = self
            .clients
            .write()
            .expect("client store lock poisoned")
            .get_mut(client_id)
        {
            client.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn record_auth_failure(&self, client_id: &str, at: OffsetDateTime) -> AuthResult<()> {
        self.failures
            .write()
            .expect("client store lock poisoned")
            .push((client_id.to_string(), at));
        Ok(())
    }

    async fn auth_failures_since(
        &self,
        client_id: &str,
        since: OffsetDateTime,
    ) -> AuthResult<u64> {
        Ok(self
            .failures
            .read()
            .expect("client store lock poisoned")
            .iter()
            .filter(|(id, at)| id == client_id && *at >= since)
            .count() as u64)
    }
}
