//! Revoked access token storage trait.
//!
//! Signed access tokens are stateless, so revoking one means remembering
//! its `jti` until the token would have expired anyway. Refresh tokens
//! don't need this: their pair record carries `revoked_at` directly.
//!
//! Revoking a refresh token retires the pair but deliberately leaves the
//! already-issued access token alone — it stays valid until it expires or
//! is revoked itself, which is what keeps the two revocation paths
//! independent.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;

/// Storage trait for revoked access-token JTIs.
///
/// Entries are keyed by the SHA-256 hash of the `jti` claim and carry the
/// token's natural expiry so the record can be dropped once tracking it no
/// longer matters.
#[async_trait]
pub trait RevokedTokenStorage: Send + Sync {
    /// Marks an access token JTI as revoked.
    ///
    /// Idempotent: revoking an already-revoked JTI succeeds.
    ///
    /// # Arguments
    ///
    /// * `jti_hash` - SHA-256 hash of the JWT ID
    /// * `expires_at` - when the token would have naturally expired
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn revoke(&self, jti_hash: &str, expires_at: OffsetDateTime) -> AuthResult<()>;

    /// Checks if an access token JTI has been revoked.
    ///
    /// Called on every access-token introspection; implementations should
    /// keep it fast.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn is_revoked(&self, jti_hash: &str) -> AuthResult<bool>;

    /// Deletes revocation records whose tokens have expired by `now`.
    ///
    /// Idempotent; a sweep with nothing to do returns zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
