//! Token-pair storage trait.
//!
//! This module defines the persistence contract the token lifecycle service
//! relies on. The service holds no in-process locks; every correctness
//! guarantee under concurrency comes from this interface.
//!
//! # Contract
//!
//! - Records arrive with hashed credentials only; implementations never see
//!   plaintext tokens
//! - The expiry CHECK constraints (`expires_at > created_at`,
//!   `refresh_token_expires_at > expires_at`) are enforced at the storage
//!   layer; a violating insert is an error, never adjusted
//! - [`TokenStorage::rotate`] is the single operation requiring a true
//!   atomicity guarantee (see its documentation)

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::{TokenRecord, TokenStats};

/// Storage operations for issued token pairs.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Stores a new token pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the record violates the expiry constraints, a
    /// hash collides with an existing record, or the operation fails.
    async fn create(&self, record: &TokenRecord) -> AuthResult<()>;

    /// Finds a pair by the SHA-256 hash of its refresh token.
    ///
    /// Returns records regardless of expiry/revocation; callers check the
    /// predicates themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_refresh_hash(&self, refresh_hash: &str) -> AuthResult<Option<TokenRecord>>;

    /// Finds a pair by the SHA-256 hash of its access token's `jti`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_jti_hash(&self, jti_hash: &str) -> AuthResult<Option<TokenRecord>>;

    /// Atomically rotates a refresh token: marks the pair identified by
    /// `refresh_hash` revoked and inserts `replacement` as one indivisible
    /// step.
    ///
    /// The revocation is conditional on the old pair still being unrevoked.
    /// Of N concurrent calls with the same `refresh_hash`, exactly one
    /// observes `true`; the rest observe `false` and must treat the token
    /// as already consumed. No concurrent reader may see the replacement
    /// without the old pair being revoked.
    ///
    /// # Returns
    ///
    /// `true` if this call performed the rotation, `false` if the old pair
    /// was already revoked or does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the replacement violates the expiry constraints
    /// or the operation fails. On error no state change is observed.
    async fn rotate(
        &self,
        refresh_hash: &str,
        replacement: &TokenRecord,
        now: OffsetDateTime,
    ) -> AuthResult<bool>;

    /// Marks the pair with the given refresh-token hash revoked.
    ///
    /// # Returns
    ///
    /// `true` if a live pair transitioned to revoked, `false` if no pair
    /// matched or it was already revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_by_refresh_hash(
        &self,
        refresh_hash: &str,
        now: OffsetDateTime,
    ) -> AuthResult<bool>;

    /// Marks the pair with the given `jti` hash revoked.
    ///
    /// # Returns
    ///
    /// `true` if a live pair transitioned to revoked, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_by_jti_hash(&self, jti_hash: &str, now: OffsetDateTime) -> AuthResult<bool>;

    /// Revokes every live pair belonging to a client.
    ///
    /// # Returns
    ///
    /// The number of pairs revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_by_client(&self, client_id: &str, now: OffsetDateTime) -> AuthResult<u64>;

    /// Revokes every live pair belonging to a user.
    ///
    /// # Returns
    ///
    /// The number of pairs revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke_by_user(&self, user_id: &str, now: OffsetDateTime) -> AuthResult<u64>;

    /// Deletes pairs whose refresh token expired before `now`.
    ///
    /// Idempotent; a sweep with nothing to do returns zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;

    /// Deletes pairs revoked before `cutoff`.
    ///
    /// Idempotent; a sweep with nothing to do returns zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_revoked_before(&self, cutoff: OffsetDateTime) -> AuthResult<u64>;

    /// Counts token pairs for one client created at or after `since`.
    ///
    /// `now` is the instant used to decide whether an access token is still
    /// active. Unknown clients yield the zero value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn stats_for_client(
        &self,
        client_id: &str,
        since: OffsetDateTime,
        now: OffsetDateTime,
    ) -> AuthResult<TokenStats>;
}
