//! In-memory revoked-JTI store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use heimdall_auth::AuthResult;
use heimdall_auth::storage::RevokedTokenStorage;

/// In-memory [`RevokedTokenStorage`]: jti hash → natural expiry.
#[derive(Default)]
pub struct MemoryRevokedTokenStorage {
    revoked: RwLock<HashMap<String, OffsetDateTime>>,
}

impl MemoryRevokedTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked revocations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revoked.read().expect("revocation lock poisoned").len()
    }

    /// Returns `true` if no revocations are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevokedTokenStorage for MemoryRevokedTokenStorage {
    async fn revoke(&self, jti_hash: &str, expires_at: OffsetDateTime) -> AuthResult<()> {
        self.revoked
            .write()
            .expect("revocation lock poisoned")
            .insert(jti_hash.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti_hash: &str) -> AuthResult<bool> {
        Ok(self
            .revoked
            .read()
            .expect("revocation lock poisoned")
            .contains_key(jti_hash))
    }

    async fn cleanup_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut revoked = self.revoked.write().expect("revocation lock poisoned");
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - revoked.len()) as u64)
    }
}
