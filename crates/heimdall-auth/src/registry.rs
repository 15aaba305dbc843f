//! Client registry.
//!
//! Lifecycle and validation of OAuth client applications: registration,
//! credential validation, secret rotation, status transitions, partial
//! updates, and per-client statistics.
//!
//! Credential validation deliberately returns `Ok(None)` rather than an
//! error for every rejection cause (unknown id, wrong secret, suspended or
//! revoked client) so that callers cannot distinguish them, and a timing
//! side channel is the only observable difference.

use std::sync::Arc;

use serde::Serialize;

use crate::AuthResult;
use crate::clock::{Clock, SystemClock};
use crate::credentials;
use crate::error::AuthError;
use crate::storage::{ClientStorage, TokenStorage};
use crate::types::{Client, ClientStats, ClientStatus, DEFAULT_CLIENT_SCOPES, StatsTimeframe};

/// Optional settings for client registration.
#[derive(Debug, Clone, Default)]
pub struct RegistrationOptions {
    /// Allowed scopes; defaults to `openid email profile`.
    pub scopes: Option<Vec<String>>,

    /// Whether PKCE is required; defaults to `true`.
    pub require_pkce: Option<bool>,

    /// Whether the client skips the consent screen; defaults to `false`.
    pub trusted: Option<bool>,
}

/// Result of a successful registration.
///
/// `client_secret` is the only copy of the plaintext secret that will ever
/// exist; it is not recoverable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredClient {
    /// The stored client record.
    #[serde(flatten)]
    pub client: Client,

    /// The plaintext client secret, returned exactly once.
    pub client_secret: String,
}

/// Partial update for a client record.
///
/// `None` fields are left untouched. An update with every field `None` is
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    /// New display name.
    pub name: Option<String>,

    /// New redirect URI whitelist. An empty list is rejected.
    pub redirect_uris: Option<Vec<String>>,

    /// New allowed scopes.
    pub scopes: Option<Vec<String>>,

    /// New PKCE requirement.
    pub require_pkce: Option<bool>,

    /// New trusted flag.
    pub trusted: Option<bool>,
}

impl ClientUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.redirect_uris.is_none()
            && self.scopes.is_none()
            && self.require_pkce.is_none()
            && self.trusted.is_none()
    }
}

/// Client registry service.
pub struct ClientRegistry {
    clients: Arc<dyn ClientStorage>,
    tokens: Arc<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
}

impl ClientRegistry {
    /// Creates a new client registry.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStorage>, tokens: Arc<dyn TokenStorage>) -> Self {
        Self {
            clients,
            tokens,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Registers a new client application.
    ///
    /// Generates the client id and secret, persists the record with the
    /// secret hashed, and returns the plaintext secret exactly once.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name, an empty redirect list, a
    ///   malformed redirect URI, or a `javascript:` redirect
    /// - `Transient`/`Internal` for storage or hashing failures
    pub async fn register(
        &self,
        name: &str,
        redirect_uris: &[String],
        owner_id: &str,
        options: RegistrationOptions,
    ) -> AuthResult<RegisteredClient> {
        let client_id = credentials::generate_client_id();
        let client_secret = credentials::generate_client_secret();
        let secret_hash = credentials::hash_secret(&client_secret)
            .map_err(|e| AuthError::internal(format!("Failed to hash client secret: {e}")))?;

        let client = Client {
            client_id,
            secret_hash,
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            redirect_uris: redirect_uris.to_vec(),
            scopes: options.scopes.unwrap_or_else(|| {
                DEFAULT_CLIENT_SCOPES.iter().map(|s| s.to_string()).collect()
            }),
            require_pkce: options.require_pkce.unwrap_or(true),
            trusted: options.trusted.unwrap_or(false),
            status: ClientStatus::Active,
            created_at: self.clock.now(),
            last_used_at: None,
        };

        client
            .validate()
            .map_err(|e| AuthError::validation(e.to_string()))?;

        self.clients.create(&client).await?;

        tracing::info!(
            client_id = %client.client_id,
            owner_id = %owner_id,
            "Registered OAuth client"
        );

        Ok(RegisteredClient {
            client,
            client_secret,
        })
    }

    /// Validates client credentials.
    ///
    /// Returns `Ok(None)` — never an error — for an unknown id, a wrong
    /// secret, or a suspended/revoked client. On success the client is
    /// returned without its secret hash and `last_used_at` is stamped in
    /// the background; a failed secret check is recorded the same way.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures.
    pub async fn validate_credentials(
        &self,
        client_id: &str,
        secret: &str,
    ) -> AuthResult<Option<Client>> {
        let Some(mut client) = self.clients.find_by_client_id(client_id).await? else {
            return Ok(None);
        };

        if client.status != ClientStatus::Active {
            return Ok(None);
        }

        let matches = match credentials::verify_secret(secret, &client.secret_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(client_id = %client_id, error = %e, "Stored secret hash unreadable");
                false
            }
        };

        let now = self.clock.now();
        if !matches {
            let clients = self.clients.clone();
            let id = client.client_id.clone();
            tokio::spawn(async move {
                if let Err(e) = clients.record_auth_failure(&id, now).await {
                    tracing::warn!(client_id = %id, error = %e, "Failed to record auth failure");
                }
            });
            return Ok(None);
        }

        let clients = self.clients.clone();
        let id = client.client_id.clone();
        tokio::spawn(async move {
            if let Err(e) = clients.touch_last_used(&id, now).await {
                tracing::warn!(client_id = %id, error = %e, "Failed to stamp last_used_at");
            }
        });

        client.secret_hash = String::new();
        Ok(Some(client))
    }

    /// Checks a redirect URI against the client's whitelist.
    ///
    /// Exact, case-sensitive comparison; unknown clients yield `false`.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures.
    pub async fn validate_redirect_uri(&self, client_id: &str, uri: &str) -> AuthResult<bool> {
        let Some(client) = self.clients.find_by_client_id(client_id).await? else {
            return Ok(false);
        };
        Ok(client.is_redirect_uri_allowed(uri))
    }

    /// Issues a new secret for the client, invalidating the previous one
    /// immediately and permanently.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client.
    pub async fn regenerate_secret(&self, client_id: &str) -> AuthResult<String> {
        let mut client = self.require_client(client_id).await?;

        let client_secret = credentials::generate_client_secret();
        client.secret_hash = credentials::hash_secret(&client_secret)
            .map_err(|e| AuthError::internal(format!("Failed to hash client secret: {e}")))?;

        self.clients.update(&client).await?;

        tracing::info!(client_id = %client_id, "Regenerated client secret");
        Ok(client_secret)
    }

    /// Suspends a client. Reversible via [`ClientRegistry::activate`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client, `StateConflict` for a
    /// revoked one.
    pub async fn suspend(&self, client_id: &str) -> AuthResult<()> {
        self.transition(client_id, ClientStatus::Suspended).await
    }

    /// Reactivates a suspended client.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client, `StateConflict` for a
    /// revoked one — revocation is terminal.
    pub async fn activate(&self, client_id: &str) -> AuthResult<()> {
        self.transition(client_id, ClientStatus::Active).await
    }

    /// Revokes a client permanently. The record is retained; there is no
    /// path back through `activate`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client.
    pub async fn revoke(&self, client_id: &str) -> AuthResult<()> {
        let mut client = self.require_client(client_id).await?;
        client.status = ClientStatus::Revoked;
        self.clients.update(&client).await?;

        tracing::warn!(client_id = %client_id, "Revoked OAuth client");
        Ok(())
    }

    /// Hard-deletes a client record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record existed.
    pub async fn delete(&self, client_id: &str) -> AuthResult<()> {
        if !self.clients.delete(client_id).await? {
            return Err(AuthError::not_found("Client not found"));
        }
        tracing::warn!(client_id = %client_id, "Deleted OAuth client");
        Ok(())
    }

    /// Applies a partial update to a client.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty patch, an empty redirect list, or a
    ///   redirect URI that fails syntax checks
    /// - `NotFound` for an unknown client
    pub async fn update(&self, client_id: &str, patch: ClientUpdate) -> AuthResult<Client> {
        if patch.is_empty() {
            return Err(AuthError::validation("No valid fields to update"));
        }

        let mut client = self.require_client(client_id).await?;

        if let Some(name) = patch.name {
            client.name = name;
        }
        if let Some(redirect_uris) = patch.redirect_uris {
            client.redirect_uris = redirect_uris;
        }
        if let Some(scopes) = patch.scopes {
            client.scopes = scopes;
        }
        if let Some(require_pkce) = patch.require_pkce {
            client.require_pkce = require_pkce;
        }
        if let Some(trusted) = patch.trusted {
            client.trusted = trusted;
        }

        client
            .validate()
            .map_err(|e| AuthError::validation(e.to_string()))?;

        self.clients.update(&client).await?;

        client.secret_hash = String::new();
        Ok(client)
    }

    /// Fetches a client by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown client.
    pub async fn get(&self, client_id: &str) -> AuthResult<Client> {
        let mut client = self.require_client(client_id).await?;
        client.secret_hash = String::new();
        Ok(client)
    }

    /// Lists clients ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures.
    pub async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Client>> {
        let mut clients = self.clients.list(limit, offset).await?;
        for client in &mut clients {
            client.secret_hash = String::new();
        }
        Ok(clients)
    }

    /// Aggregates token and auth-failure statistics for one client within
    /// the timeframe window.
    ///
    /// A nonexistent client yields zeroed stats, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures.
    pub async fn get_stats(
        &self,
        client_id: &str,
        timeframe: StatsTimeframe,
    ) -> AuthResult<ClientStats> {
        let now = self.clock.now();
        let since = now - timeframe.duration();

        let tokens = self.tokens.stats_for_client(client_id, since, now).await?;
        let auth_failures = self.clients.auth_failures_since(client_id, since).await?;

        Ok(ClientStats {
            tokens,
            auth_failures,
        })
    }

    async fn require_client(&self, client_id: &str) -> AuthResult<Client> {
        self.clients
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| AuthError::not_found("Client not found"))
    }

    async fn transition(&self, client_id: &str, to: ClientStatus) -> AuthResult<()> {
        let mut client = self.require_client(client_id).await?;

        if client.status == ClientStatus::Revoked {
            return Err(AuthError::state_conflict("Client is revoked"));
        }

        client.status = to;
        self.clients.update(&client).await?;

        tracing::info!(client_id = %client_id, status = %to, "Client status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::{TokenRecord, TokenStats};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::time::Duration as StdDuration;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    struct MockClientStorage {
        clients: RwLock<HashMap<String, Client>>,
        failures: RwLock<Vec<(String, OffsetDateTime)>>,
    }

    impl MockClientStorage {
        fn new() -> Self {
            Self {
                clients: RwLock::new(HashMap::new()),
                failures: RwLock::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ClientStorage for MockClientStorage {
        async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
            Ok(self.clients.read().unwrap().get(client_id).cloned())
        }

        async fn create(&self, client: &Client) -> AuthResult<()> {
            let mut clients = self.clients.write().unwrap();
            if clients.contains_key(&client.client_id) {
                return Err(AuthError::internal("duplicate client_id"));
            }
            clients.insert(client.client_id.clone(), client.clone());
            Ok(())
        }

        async fn update(&self, client: &Client) -> AuthResult<()> {
            let mut clients = self.clients.write().unwrap();
            if !clients.contains_key(&client.client_id) {
                return Err(AuthError::not_found("Client not found"));
            }
            clients.insert(client.client_id.clone(), client.clone());
            Ok(())
        }

        async fn delete(&self, client_id: &str) -> AuthResult<bool> {
            Ok(self.clients.write().unwrap().remove(client_id).is_some())
        }

        async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<Client>> {
            let mut clients: Vec<Client> =
                self.clients.read().unwrap().values().cloned().collect();
            clients.sort_by_key(|c| c.created_at);
            Ok(clients.into_iter().skip(offset).take(limit).collect())
        }

        async fn touch_last_used(&self, client_id: &str, at: OffsetDateTime) -> AuthResult<()> {
            if let Some(client) = self.clients.write().unwrap().get_mut(client_id) {
                client.last_used_at = Some(at);
            }
            Ok(())
        }

        async fn record_auth_failure(&self, client_id: &str, at: OffsetDateTime) -> AuthResult<()> {
            self.failures
                .write()
                .unwrap()
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
                .unwrap()
                .iter()
                .filter(|(id, at)| id == client_id && *at >= since)
                .count() as u64)
        }
    }

    /// Stats-only token store; everything else is unused by the registry.
    struct MockTokenStorage {
        records: RwLock<Vec<TokenRecord>>,
    }

    impl MockTokenStorage {
        fn new() -> Self {
            Self {
                records: RwLock::new(Vec::new()),
            }
        }

        fn push(&self, record: TokenRecord) {
            self.records.write().unwrap().push(record);
        }
    }

    #[async_trait]
    impl TokenStorage for MockTokenStorage {
        async fn create(&self, record: &TokenRecord) -> AuthResult<()> {
            self.push(record.clone());
            Ok(())
        }

        async fn find_by_refresh_hash(&self, _: &str) -> AuthResult<Option<TokenRecord>> {
            Ok(None)
        }

        async fn find_by_jti_hash(&self, _: &str) -> AuthResult<Option<TokenRecord>> {
            Ok(None)
        }

        async fn rotate(
            &self,
            _: &str,
            _: &TokenRecord,
            _: OffsetDateTime,
        ) -> AuthResult<bool> {
            Ok(false)
        }

        async fn revoke_by_refresh_hash(&self, _: &str, _: OffsetDateTime) -> AuthResult<bool> {
            Ok(false)
        }

        async fn revoke_by_jti_hash(&self, _: &str, _: OffsetDateTime) -> AuthResult<bool> {
            Ok(false)
        }

        async fn revoke_by_client(&self, _: &str, _: OffsetDateTime) -> AuthResult<u64> {
            Ok(0)
        }

        async fn revoke_by_user(&self, _: &str, _: OffsetDateTime) -> AuthResult<u64> {
            Ok(0)
        }

        async fn delete_expired(&self, _: OffsetDateTime) -> AuthResult<u64> {
            Ok(0)
        }

        async fn delete_revoked_before(&self, _: OffsetDateTime) -> AuthResult<u64> {
            Ok(0)
        }

        async fn stats_for_client(
            &self,
            client_id: &str,
            since: OffsetDateTime,
            now: OffsetDateTime,
        ) -> AuthResult<TokenStats> {
            let records = self.records.read().unwrap();
            let mut stats = TokenStats::default();
            for record in records.iter() {
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

    struct Harness {
        registry: ClientRegistry,
        clients: Arc<MockClientStorage>,
        tokens: Arc<MockTokenStorage>,
        clock: Arc<ManualClock>,
    }

    fn create_harness() -> Harness {
        let clients = Arc::new(MockClientStorage::new());
        let tokens = Arc::new(MockTokenStorage::new());
        let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
        let registry =
            ClientRegistry::new(clients.clone(), tokens.clone()).with_clock(clock.clone());
        Harness {
            registry,
            clients,
            tokens,
            clock,
        }
    }

    fn redirect_uris() -> Vec<String> {
        vec!["https://app.example.com/callback".to_string()]
    }

    async fn register_default(h: &Harness) -> RegisteredClient {
        h.registry
            .register(
                "Test App",
                &redirect_uris(),
                "owner-1",
                RegistrationOptions::default(),
            )
            .await
            .unwrap()
    }

    /// Waits for the fire-and-forget bookkeeping tasks to land.
    async fn settle() {
        tokio::time::sleep(StdDuration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_register_defaults() {
        let h = create_harness();
        let registered = register_default(&h).await;

        assert!(credentials::is_valid_client_id(&registered.client.client_id));
        assert!(credentials::is_valid_client_secret(&registered.client_secret));
        assert_eq!(
            registered.client.scopes,
            vec!["openid", "email", "profile"]
        );
        assert!(registered.client.require_pkce);
        assert!(!registered.client.trusted);
        assert_eq!(registered.client.status, ClientStatus::Active);

        // Only the hash is stored
        let stored = h
            .clients
            .find_by_client_id(&registered.client.client_id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.secret_hash.starts_with("$argon2id$"));
        assert!(!stored.secret_hash.contains(&registered.client_secret));
    }

    #[tokio::test]
    async fn test_register_with_options() {
        let h = create_harness();
        let registered = h
            .registry
            .register(
                "Trusted App",
                &redirect_uris(),
                "owner-1",
                RegistrationOptions {
                    scopes: Some(vec!["openid".to_string()]),
                    require_pkce: Some(false),
                    trusted: Some(true),
                },
            )
            .await
            .unwrap();

        assert_eq!(registered.client.scopes, vec!["openid"]);
        assert!(!registered.client.require_pkce);
        assert!(registered.client.trusted);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let h = create_harness();

        let result = h
            .registry
            .register("", &redirect_uris(), "owner-1", Default::default())
            .await;
        assert!(matches!(result, Err(AuthError::Validation { .. })));

        let result = h
            .registry
            .register("App", &[], "owner-1", Default::default())
            .await;
        assert!(matches!(result, Err(AuthError::Validation { .. })));

        let result = h
            .registry
            .register(
                "App",
                &["javascript:alert(1)".to_string()],
                "owner-1",
                Default::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::Validation { .. })));

        let result = h
            .registry
            .register(
                "App",
                &["not a url".to_string()],
                "owner-1",
                Default::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::Validation { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_validate_credentials_success() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        let client = h
            .registry
            .validate_credentials(&id, &registered.client_secret)
            .await
            .unwrap()
            .expect("credentials should validate");

        // Returned without the secret hash
        assert!(client.secret_hash.is_empty());

        settle().await;
        let stored = h.clients.find_by_client_id(&id).await.unwrap().unwrap();
        assert!(stored.last_used_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_validate_credentials_rejections_return_none() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        // Unknown client
        assert!(
            h.registry
                .validate_credentials("cl_QQQQQQQQQQQQQQQQ", "cs_whatever")
                .await
                .unwrap()
                .is_none()
        );

        // Wrong secret
        assert!(
            h.registry
                .validate_credentials(&id, &credentials::generate_client_secret())
                .await
                .unwrap()
                .is_none()
        );

        settle().await;
        assert_eq!(
            h.clients
                .auth_failures_since(&id, OffsetDateTime::now_utc() - Duration::hours(1))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_suspension_gates_credentials() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        h.registry.suspend(&id).await.unwrap();
        assert!(
            h.registry
                .validate_credentials(&id, &registered.client_secret)
                .await
                .unwrap()
                .is_none()
        );

        // Reactivation restores validation
        h.registry.activate(&id).await.unwrap();
        assert!(
            h.registry
                .validate_credentials(&id, &registered.client_secret)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_revoked_client_is_terminal() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        h.registry.revoke(&id).await.unwrap();

        assert!(
            h.registry
                .validate_credentials(&id, &registered.client_secret)
                .await
                .unwrap()
                .is_none()
        );

        // No path back through activate or suspend
        assert!(matches!(
            h.registry.activate(&id).await,
            Err(AuthError::StateConflict { .. })
        ));
        assert!(matches!(
            h.registry.suspend(&id).await,
            Err(AuthError::StateConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_redirect_uri_exactness() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        assert!(
            h.registry
                .validate_redirect_uri(&id, "https://app.example.com/callback")
                .await
                .unwrap()
        );
        assert!(
            !h.registry
                .validate_redirect_uri(&id, "https://app.example.com/Callback")
                .await
                .unwrap()
        );
        assert!(
            !h.registry
                .validate_redirect_uri(&id, "https://app.example.com/callback/extra")
                .await
                .unwrap()
        );
        assert!(
            !h.registry
                .validate_redirect_uri("cl_QQQQQQQQQQQQQQQQ", "https://app.example.com/callback")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_regenerate_secret_invalidates_old() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        let new_secret = h.registry.regenerate_secret(&id).await.unwrap();
        assert!(credentials::is_valid_client_secret(&new_secret));
        assert_ne!(new_secret, registered.client_secret);

        // The old secret no longer validates; the new one does.
        assert!(
            h.registry
                .validate_credentials(&id, &registered.client_secret)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            h.registry
                .validate_credentials(&id, &new_secret)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_regenerate_secret_unknown_client() {
        let h = create_harness();
        let result = h.registry.regenerate_secret("cl_QQQQQQQQQQQQQQQQ").await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        let updated = h
            .registry
            .update(
                &id,
                ClientUpdate {
                    name: Some("Renamed".to_string()),
                    trusted: Some(true),
                    ..ClientUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert!(updated.trusted);
        // Untouched fields survive
        assert_eq!(updated.redirect_uris, redirect_uris());
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch_and_empty_redirects() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        let result = h.registry.update(&id, ClientUpdate::default()).await;
        match result {
            Err(AuthError::Validation { message }) => {
                assert_eq!(message, "No valid fields to update");
            }
            other => panic!("expected Validation, got {other:?}"),
        }

        let result = h
            .registry
            .update(
                &id,
                ClientUpdate {
                    redirect_uris: Some(vec![]),
                    ..ClientUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();

        h.registry.delete(&id).await.unwrap();
        assert!(
            h.clients
                .find_by_client_id(&id)
                .await
                .unwrap()
                .is_none()
        );

        let result = h.registry.delete(&id).await;
        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_stats_window() {
        let h = create_harness();
        let registered = register_default(&h).await;
        let id = registered.client.client_id.clone();
        let now = h.clock.now();

        let record = |created_at: OffsetDateTime, rotated: bool| TokenRecord {
            id: Uuid::new_v4(),
            jti_hash: "a".repeat(64),
            refresh_token_hash: Uuid::new_v4().to_string(),
            client_id: id.clone(),
            user_id: "user-1".to_string(),
            scope: "openid".to_string(),
            rotated_from: rotated.then(Uuid::new_v4),
            created_at,
            expires_at: created_at + Duration::hours(1),
            refresh_token_expires_at: created_at + Duration::days(30),
            revoked_at: None,
        };

        // Two in-window pairs (one via rotation), one outside the window.
        h.tokens.push(record(now - Duration::minutes(10), false));
        h.tokens.push(record(now - Duration::minutes(5), true));
        h.tokens.push(record(now - Duration::hours(3), false));

        let stats = h
            .registry
            .get_stats(&id, StatsTimeframe::LastHour)
            .await
            .unwrap();
        assert_eq!(stats.tokens.issued, 1);
        assert_eq!(stats.tokens.refreshed, 1);
        assert_eq!(stats.tokens.total, 2);
        assert_eq!(stats.tokens.active, 2);
        assert_eq!(stats.tokens.last_issued_at, Some(now - Duration::minutes(5)));

        // The 24h window sees all three
        let stats = h
            .registry
            .get_stats(&id, StatsTimeframe::LastDay)
            .await
            .unwrap();
        assert_eq!(stats.tokens.total, 3);
    }

    #[tokio::test]
    async fn test_stats_zeroed_for_unknown_client() {
        let h = create_harness();
        let stats = h
            .registry
            .get_stats("cl_QQQQQQQQQQQQQQQQ", StatsTimeframe::LastDay)
            .await
            .unwrap();
        assert_eq!(stats, ClientStats::default());
    }
}
