//! Persisted token-pair record.
//!
//! One record corresponds to one issued pair: a signed access token and its
//! opaque refresh token. Only digests of the two credentials are stored.
//!
//! # Storage Security
//!
//! - `jti_hash` is the SHA-256 digest of the access token's `jti` claim
//! - `refresh_token_hash` is the SHA-256 digest of the refresh token
//! - The plaintext of either value never reaches storage

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A persisted access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// SHA-256 hash of the access token's `jti` claim.
    pub jti_hash: String,

    /// SHA-256 hash of the refresh token value.
    pub refresh_token_hash: String,

    /// Client this pair was issued to.
    pub client_id: String,

    /// Subject that authorized this pair.
    pub user_id: String,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Id of the record this pair replaced, when created by a refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated_from: Option<Uuid>,

    /// When this pair was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the access token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the refresh token expires. Always after `expires_at`.
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_token_expires_at: OffsetDateTime,

    /// When this pair was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,
}

impl TokenRecord {
    /// Validates the expiry-ordering invariants enforced by the storage
    /// layer's CHECK constraints.
    ///
    /// Records violating these are never written; the caller treats a
    /// violation as a programming error, not something to clamp.
    ///
    /// # Errors
    ///
    /// Returns an error if `expires_at <= created_at` or
    /// `refresh_token_expires_at <= expires_at`.
    pub fn validate(&self) -> Result<(), TokenRecordError> {
        if self.expires_at <= self.created_at {
            return Err(TokenRecordError::AccessExpiryNotAfterCreation);
        }
        if self.refresh_token_expires_at <= self.expires_at {
            return Err(TokenRecordError::RefreshExpiryNotAfterAccessExpiry);
        }
        Ok(())
    }

    /// Returns `true` if this pair has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Returns `true` if the access token is expired at `now`.
    #[must_use]
    pub fn access_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the refresh token is expired at `now`.
    #[must_use]
    pub fn refresh_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.refresh_token_expires_at
    }

    /// Returns `true` if the access token is live at `now`.
    #[must_use]
    pub fn access_active(&self, now: OffsetDateTime) -> bool {
        !self.is_revoked() && !self.access_expired(now)
    }

    /// Returns `true` if the refresh token may still be exchanged at `now`.
    #[must_use]
    pub fn refresh_usable(&self, now: OffsetDateTime) -> bool {
        !self.is_revoked() && !self.refresh_expired(now)
    }
}

/// Invariant violations in a token record.
///
/// These mirror the storage CHECK constraints; hitting one means the caller
/// constructed an impossible pair.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenRecordError {
    /// `expires_at` must be strictly after `created_at`.
    #[error("Access token expiry must be after creation time")]
    AccessExpiryNotAfterCreation,

    /// `refresh_token_expires_at` must be strictly after `expires_at`.
    #[error("Refresh token expiry must be after access token expiry")]
    RefreshExpiryNotAfterAccessExpiry,
}
