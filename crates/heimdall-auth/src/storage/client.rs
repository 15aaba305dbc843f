//! Client storage trait.
//!
//! Defines the interface for OAuth client persistence operations.
//! Implementations are provided by storage backends (PostgreSQL in the
//! reference deployment, `heimdall-auth-memory` in this workspace).

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::Client;

/// Storage operations for OAuth 2.0 clients.
///
/// Lookups return clients regardless of status; the registry and the token
/// service decide what a suspended or revoked client may do.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Find a client by its OAuth client_id.
    ///
    /// Returns `None` if no such client exists (including hard-deleted ones).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>>;

    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if a client with the same client_id already exists
    /// or the storage operation fails.
    async fn create(&self, client: &Client) -> AuthResult<()>;

    /// Replace an existing client record.
    ///
    /// # Errors
    ///
    /// Returns an error if the client doesn't exist or the storage
    /// operation fails.
    async fn update(&self, client: &Client) -> AuthResult<()>;

    /// Hard-delete a client.
    ///
    /// # Returns
    ///
    /// `true` if a record was removed, `false` if none existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, client_id: &str) -> AuthResult<bool>;

    /// List clients ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Client>>;

    /// Stamp the client's `last_used_at`.
    ///
    /// Missing clients are ignored; this is bookkeeping, not an assertion.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn touch_last_used(&self, client_id: &str, at: OffsetDateTime) -> AuthResult<()>;

    /// Record one failed credential validation for the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn record_auth_failure(&self, client_id: &str, at: OffsetDateTime) -> AuthResult<()>;

    /// Count failed credential validations since the given instant.
    ///
    /// Unknown clients yield zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn auth_failures_since(
        &self,
        client_id: &str,
        since: OffsetDateTime,
    ) -> AuthResult<u64>;
}
