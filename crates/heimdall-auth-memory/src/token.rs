//! In-memory token-pair store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;

use heimdall_auth::storage::TokenStorage;
use heimdall_auth::types::{TokenRecord, TokenStats};
use heimdall_auth::{AuthError, AuthResult};

/// In-memory [`TokenStorage`] keyed by refresh-token hash.
///
/// Every mutation runs under one write lock, which is what makes
/// [`TokenStorage::rotate`] an all-or-nothing step: no reader can observe
/// the replacement inserted without the old pair revoked.
#[derive(Default)]
pub struct MemoryTokenStorage {
    records: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().expect("token store lock poisoned").len()
    }

    /// Returns `true` if the store holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the record whose access token has the given `jti` hash.
    /// Exists so tests can simulate a row vanishing underneath a
    /// still-verifiable signature.
    pub fn remove_by_jti_hash(&self, jti_hash: &str) {
        let mut records = self.records.write().expect("token store lock poisoned");
        records.retain(|_, r| r.jti_hash != jti_hash);
    }

    fn check_constraints(
        records: &HashMap<String, TokenRecord>,
        record: &TokenRecord,
    ) -> AuthResult<()> {
        // Mirrors the relational CHECK constraints and unique indexes: a
        // violating insert is a programming error, never adjusted.
        record
            .validate()
            .map_err(|e| AuthError::internal(e.to_string()))?;

        if records.contains_key(&record.refresh_token_hash) {
            return Err(AuthError::internal("Duplicate refresh token hash"));
        }
        if records.values().any(|r| r.jti_hash == record.jti_hash) {
            return Err(AuthError::internal("Duplicate jti hash"));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn create(&self, record: &TokenRecord) -> AuthResult<()> {
        let mut records = self.records.write().expect("token store lock poisoned");
        Self::check_constraints(&records, record)?;
        records.insert(record.refresh_token_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_by_refresh_hash(&self, refresh_hash: &str) -> AuthResult<Option<TokenRecord>> {
        Ok(self
            .records
            .read()
            .expect("token store lock poisoned")
            .get(refresh_hash)
            .cloned())
    }

    async fn find_by_jti_hash(&self, jti_hash: &str) -> AuthResult<Option<TokenRecord>> {
        Ok(self
            .records
            .read()
            .expect("token store lock poisoned")
            .values()
            .find(|r| r.jti_hash == jti_hash)
            .cloned())
    }

    async fn rotate(
        &self,
        refresh_hash: &str,
        replacement: &TokenRecord,
        now: OffsetDateTime,
    ) -> AuthResult<bool> {
        let mut records = self.records.write().expect("token store lock poisoned");

        let usable = matches!(records.get(refresh_hash), Some(old) if old.revoked_at.is_none());
        if !usable {
            return Ok(false);
        }

        Self::check_constraints(&records, replacement)?;

        let old = records.get_mut(refresh_hash).expect("checked above");
        old.revoked_at = Some(now);
        records.insert(replacement.refresh_token_hash.clone(), replacement.clone());
        Ok(true)
    }

    async fn revoke_by_refresh_hash(
        &self,
        refresh_hash: &str,
        now: OffsetDateTime,
    ) -> AuthResult<bool> {
        let mut records = self.records.write().expect("token store lock poisoned");
        match records.get_mut(refresh_hash) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_by_jti_hash(&self, jti_hash: &str, now: OffsetDateTime) -> AuthResult<bool> {
        let mut records = self.records.write().expect("token store lock poisoned");
        for record in records.values_mut() {
            if record.jti_hash == jti_hash && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn revoke_by_client(&self, client_id: &str, now: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().expect("token store lock poisoned");
        let mut count = 0;
        for record in records.values_mut() {
            if record.client_id == client_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_by_user(&self, user_id: &str, now: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().expect("token store lock poisoned");
        let mut count = 0;
        for record in records.values_mut() {
            if record.user_id == user_id && record.revoked_at.is_none() {
                record.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().expect("token store lock poisoned");
        let before = records.len();
        records.retain(|_, r| !r.refresh_expired(now));
        Ok((before - records.len()) as u64)
    }

    async fn delete_revoked_before(&self, cutoff: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().expect("token store lock poisoned");
        let before = records.len();
        records.retain(|_, r| !matches!(r.revoked_at, Some(at) if at < cutoff));
        Ok((before - records.len()) as u64)
    }

    async fn stats_for_client(
        &self,
        client_id: &str,
        since: OffsetDateTime,
        now: OffsetDateTime,
    ) -> AuthResult<TokenStats> {
        let records = self.records.read().expect("token store lock poisoned");
        let mut stats = TokenStats::default();

        for record in records.values() {
            if record.client_id != client_id || record.created_at < since {
                continue;
            }
            stats.total += 1;
            if record.rotated_from.is_some() {
                stats.refreshed += 1;
            } else {
                stats.issued += 1;
            }
            if record.access_active(now) {
                stats.active += 1;
            }
            stats.last_issued_at = match stats.last_issued_at {
                Some(at) if at >= record.created_at => Some(at),
                _ => Some(record.created_at),
            };
        }

        Ok(stats)
    }
}
