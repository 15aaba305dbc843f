//! Token lifecycle service.
//!
//! This service ties together the credential codec, the JWT signer, and the
//! token store: issuance, refresh (rotate-on-use), introspection,
//! revocation, userinfo, and the housekeeping sweeps.
//!
//! # Concurrency
//!
//! The service holds no mutable in-process state and takes no locks across
//! store calls; it may be shared across any number of request handlers and
//! horizontally scaled processes. Refresh rotation is the one operation
//! needing atomicity, and that guarantee lives in
//! [`TokenStorage::rotate`](crate::storage::TokenStorage::rotate): of N
//! concurrent refreshes with the same token, exactly one wins.
//!
//! # Error posture
//!
//! `issue` and `refresh` assert and fail with specific error kinds.
//! `introspect` and `revoke` are best-effort queries: they degrade to
//! `active=false` / silent success instead of propagating lookup or format
//! failures.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::credentials;
use crate::error::AuthError;
use crate::scope::ScopeSet;
use crate::storage::{ClientStorage, RevokedTokenStorage, TokenStorage, UserStorage};
use crate::token::introspection::IntrospectionResponse;
use crate::token::jwt::{AccessTokenClaims, JwtService};
use crate::token::kind::{TokenKind, classify};
use crate::types::{Client, TokenRecord, UserInfoResponse, UserProfile};

/// A freshly issued access/refresh token pair.
///
/// The refresh token appears here in plaintext exactly once; storage only
/// ever sees its digest.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// The signed access token.
    pub access_token: String,

    /// The opaque refresh token.
    pub refresh_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes (space-separated).
    pub scope: String,
}

/// Token lifecycle service.
pub struct TokenService {
    jwt: Arc<JwtService>,
    clients: Arc<dyn ClientStorage>,
    tokens: Arc<dyn TokenStorage>,
    revoked: Arc<dyn RevokedTokenStorage>,
    users: Arc<dyn UserStorage>,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Creates a new token lifecycle service.
    #[must_use]
    pub fn new(
        jwt: Arc<JwtService>,
        clients: Arc<dyn ClientStorage>,
        tokens: Arc<dyn TokenStorage>,
        revoked: Arc<dyn RevokedTokenStorage>,
        users: Arc<dyn UserStorage>,
        config: AuthConfig,
    ) -> Self {
        Self {
            jwt,
            clients,
            tokens,
            revoked,
            users,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock. Expiry boundaries become directly testable.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issues a new token pair for the given client, subject, and scope.
    ///
    /// Identity claims are shaped by the granted scope: the `email` claims
    /// require the `email` scope, the name/picture claims require
    /// `profile`. Absent profile attributes stay absent.
    ///
    /// Concurrent issuance for the same client/user is unordered and
    /// independent; every pair gets a fresh `jti` and refresh token.
    ///
    /// # Errors
    ///
    /// - `Validation` for empty client/user ids or empty scope
    /// - `NotFound` for an unknown client
    /// - `StateConflict` for a suspended or revoked client
    /// - `Transient` for store timeouts
    pub async fn issue(
        &self,
        client_id: &str,
        user_id: &str,
        scope: &str,
        profile: Option<&UserProfile>,
    ) -> AuthResult<TokenPair> {
        if client_id.trim().is_empty() {
            return Err(AuthError::validation("client_id is required"));
        }
        if user_id.trim().is_empty() {
            return Err(AuthError::validation("user_id is required"));
        }

        let scope_set = ScopeSet::parse(scope);
        if scope_set.is_empty() {
            return Err(AuthError::validation("scope cannot be empty"));
        }

        let client = self.require_active_client(client_id).await?;
        if !client.is_scope_allowed(&scope_set) {
            return Err(AuthError::validation("Scope not allowed for this client"));
        }

        let (record, pair) = self.mint_pair(&client, user_id, &scope_set, profile, None)?;
        self.with_store_timeout(self.tokens.create(&record)).await?;

        tracing::info!(
            client_id = %client.client_id,
            user_id = %user_id,
            scope = %pair.scope,
            "Issued token pair"
        );

        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair, revoking the presented
    /// token in the same step.
    ///
    /// The requested scope, when present, must be a subset of the original
    /// grant. A rejected expansion consumes nothing: the presented token
    /// remains valid for a corrected retry. A successful exchange is
    /// strictly one-shot; concurrent reuse of the same token fails.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed token (rejected before any lookup)
    /// - `NotFound` for an unknown token or client
    /// - `StateConflict` for a revoked/expired token, client mismatch,
    ///   suspended client, or attempted scope expansion
    /// - `Transient` for store timeouts
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        scope: Option<&str>,
    ) -> AuthResult<TokenPair> {
        if !credentials::is_valid_refresh_token(refresh_token) {
            return Err(AuthError::validation("Invalid refresh token format"));
        }

        let refresh_hash = credentials::hash_opaque_token(refresh_token);
        let record = self
            .with_store_timeout(self.tokens.find_by_refresh_hash(&refresh_hash))
            .await?
            .ok_or_else(|| AuthError::not_found("Invalid refresh token"))?;

        if record.is_revoked() {
            return Err(AuthError::state_conflict("Refresh token revoked"));
        }
        if record.client_id != client_id {
            return Err(AuthError::state_conflict("Client ID mismatch"));
        }

        let now = self.clock.now();
        if record.refresh_expired(now) {
            return Err(AuthError::state_conflict("Refresh token expired"));
        }

        let client = self.require_active_client(client_id).await?;

        let original_scope = ScopeSet::parse(&record.scope);
        let granted_scope = match scope {
            None => original_scope,
            Some(requested) => {
                let requested_set = ScopeSet::parse(requested);
                if requested_set.is_empty() {
                    return Err(AuthError::validation("scope cannot be empty"));
                }
                if !requested_set.is_subset_of(&original_scope) {
                    // No state change: the presented token stays valid.
                    return Err(AuthError::state_conflict("Cannot expand scope"));
                }
                requested_set
            }
        };

        let profile = self
            .with_store_timeout(self.users.find_by_id(&record.user_id))
            .await?;

        let (replacement, pair) = self.mint_pair(
            &client,
            &record.user_id,
            &granted_scope,
            profile.as_ref(),
            Some(record.id),
        )?;

        let rotated = self
            .with_store_timeout(self.tokens.rotate(&refresh_hash, &replacement, now))
            .await?;
        if !rotated {
            // Lost the race: another caller consumed this token first.
            return Err(AuthError::state_conflict("Refresh token revoked"));
        }

        tracing::info!(
            client_id = %client.client_id,
            user_id = %record.user_id,
            rotated_from = %record.id,
            "Rotated refresh token"
        );

        Ok(pair)
    }

    /// Reports whether a token is currently active, with metadata when it
    /// is.
    ///
    /// Never fails: malformed tokens, signature failures, expiry,
    /// revocation, store rows that vanished, and store errors all yield
    /// `active=false`. The store is authoritative — a verifiable signature
    /// without a live row is inactive.
    ///
    /// Introspecting another client's token is permitted (and logged) by
    /// default; when `allow_cross_client` is off it reports inactive.
    pub async fn introspect(
        &self,
        token: &str,
        client_id: &str,
        hint: Option<TokenKind>,
    ) -> IntrospectionResponse {
        let Some(kind) = hint.or_else(|| classify(token)) else {
            return IntrospectionResponse::inactive();
        };

        match kind {
            TokenKind::Access => self.introspect_access(token, client_id).await,
            TokenKind::Refresh => self.introspect_refresh(token, client_id).await,
        }
    }

    async fn introspect_access(&self, token: &str, client_id: &str) -> IntrospectionResponse {
        let claims = match self.jwt.decode_allow_expired::<AccessTokenClaims>(token) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Introspection: access token failed verification");
                return IntrospectionResponse::inactive();
            }
        };

        let now = self.clock.now();
        if claims.exp <= now.unix_timestamp() {
            return IntrospectionResponse::inactive();
        }

        // The store is authoritative: a verifiable signature with no live
        // row is inactive.
        let jti_hash = credentials::hash_opaque_token(&claims.jti);
        let record = match self.tokens.find_by_jti_hash(&jti_hash).await {
            Ok(Some(record)) => record,
            Ok(None) => return IntrospectionResponse::inactive(),
            Err(e) => {
                tracing::warn!(error = %e, "Introspection: token store lookup failed");
                return IntrospectionResponse::inactive();
            }
        };

        // Pair-level revoked_at covers the refresh side only; an access
        // token dies on its own jti revocation or expiry.
        match self.revoked.is_revoked(&jti_hash).await {
            Ok(false) => {}
            Ok(true) => return IntrospectionResponse::inactive(),
            Err(e) => {
                tracing::warn!(error = %e, "Introspection: revocation lookup failed");
                return IntrospectionResponse::inactive();
            }
        }
        if !self.cross_client_permitted(&record, client_id) {
            return IntrospectionResponse::inactive();
        }

        IntrospectionResponse::active()
            .with_token_type("Bearer")
            .with_scope(record.scope.clone())
            .with_client_id(record.client_id.clone())
            .with_sub(claims.sub)
            .with_exp(claims.exp)
            .with_iat(claims.iat)
            .with_jti(claims.jti)
    }

    async fn introspect_refresh(&self, token: &str, client_id: &str) -> IntrospectionResponse {
        if !credentials::is_valid_refresh_token(token) {
            return IntrospectionResponse::inactive();
        }

        let refresh_hash = credentials::hash_opaque_token(token);
        let record = match self.tokens.find_by_refresh_hash(&refresh_hash).await {
            Ok(Some(record)) => record,
            Ok(None) => return IntrospectionResponse::inactive(),
            Err(e) => {
                tracing::warn!(error = %e, "Introspection: token store lookup failed");
                return IntrospectionResponse::inactive();
            }
        };

        let now = self.clock.now();
        if !record.refresh_usable(now) {
            return IntrospectionResponse::inactive();
        }
        if !self.cross_client_permitted(&record, client_id) {
            return IntrospectionResponse::inactive();
        }

        IntrospectionResponse::active()
            .with_token_type(TokenKind::Refresh.as_str())
            .with_scope(record.scope.clone())
            .with_client_id(record.client_id.clone())
            .with_sub(record.user_id.clone())
            .with_exp(record.refresh_token_expires_at.unix_timestamp())
            .with_iat(record.created_at.unix_timestamp())
    }

    fn cross_client_permitted(&self, record: &TokenRecord, requesting_client: &str) -> bool {
        if record.client_id == requesting_client {
            return true;
        }

        tracing::warn!(
            token_client_id = %record.client_id,
            requesting_client_id = %requesting_client,
            allowed = self.config.introspection.allow_cross_client,
            "Cross-client token introspection"
        );

        self.config.introspection.allow_cross_client
    }

    /// Revokes a token.
    ///
    /// Idempotent and silent: revoking an already-revoked, expired, or
    /// nonexistent token is a no-op, and lookup failures are swallowed —
    /// the operation means "ensure this is gone", not "assert it exists".
    /// Tokens owned by a different client are left untouched.
    pub async fn revoke(&self, token: &str, client_id: &str, hint: Option<TokenKind>) {
        let Some(kind) = hint.or_else(|| classify(token)) else {
            tracing::debug!("Revocation: unrecognized token shape, nothing to do");
            return;
        };

        match kind {
            TokenKind::Access => self.revoke_access(token, client_id).await,
            TokenKind::Refresh => self.revoke_refresh(token, client_id).await,
        }
    }

    /// Revoking an access token records its jti until natural expiry. The
    /// pair record (and so the refresh token) is left alone.
    async fn revoke_access(&self, token: &str, client_id: &str) {
        let claims = match self.jwt.decode_allow_expired::<AccessTokenClaims>(token) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Revocation: access token failed verification");
                return;
            }
        };

        let jti_hash = credentials::hash_opaque_token(&claims.jti);
        let Some(record) = self.lookup_for_revocation(
            self.tokens.find_by_jti_hash(&jti_hash).await,
            client_id,
        ) else {
            return;
        };

        let expires_at =
            OffsetDateTime::from_unix_timestamp(claims.exp).unwrap_or(record.expires_at);

        match self.revoked.revoke(&jti_hash, expires_at).await {
            Ok(()) => {
                tracing::info!(client_id = %client_id, kind = %TokenKind::Access, "Token revoked");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Revocation: token store update failed");
            }
        }
    }

    /// Revoking a refresh token retires the pair. The already-issued
    /// access token stays valid until it expires or is revoked itself.
    async fn revoke_refresh(&self, token: &str, client_id: &str) {
        let refresh_hash = credentials::hash_opaque_token(token);
        let Some(_record) = self.lookup_for_revocation(
            self.tokens.find_by_refresh_hash(&refresh_hash).await,
            client_id,
        ) else {
            return;
        };

        match self
            .tokens
            .revoke_by_refresh_hash(&refresh_hash, self.clock.now())
            .await
        {
            Ok(true) => {
                tracing::info!(client_id = %client_id, kind = %TokenKind::Refresh, "Token revoked");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Revocation: token store update failed");
            }
        }
    }

    /// Unwraps a revocation lookup, swallowing misses and errors, and
    /// refusing tokens owned by a different client.
    fn lookup_for_revocation(
        &self,
        lookup: AuthResult<Option<TokenRecord>>,
        client_id: &str,
    ) -> Option<TokenRecord> {
        let record = match lookup {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Revocation: token store lookup failed");
                return None;
            }
        };

        if record.client_id != client_id {
            tracing::warn!(
                token_client_id = %record.client_id,
                requesting_client_id = %client_id,
                "Revocation refused: token owned by a different client"
            );
            return None;
        }

        Some(record)
    }

    /// Revokes every live pair issued to a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub async fn revoke_all_for_client(&self, client_id: &str) -> AuthResult<u64> {
        let count = self
            .with_store_timeout(self.tokens.revoke_by_client(client_id, self.clock.now()))
            .await?;
        tracing::info!(client_id = %client_id, count, "Revoked all client tokens");
        Ok(count)
    }

    /// Revokes every live pair issued to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> AuthResult<u64> {
        let count = self
            .with_store_timeout(self.tokens.revoke_by_user(user_id, self.clock.now()))
            .await?;
        tracing::info!(user_id = %user_id, count, "Revoked all user tokens");
        Ok(count)
    }

    /// Returns the userinfo claims for a subject.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown subject.
    pub async fn get_user_info(&self, user_id: &str) -> AuthResult<UserInfoResponse> {
        let profile = self
            .with_store_timeout(self.users.find_by_id(user_id))
            .await?
            .ok_or_else(|| AuthError::not_found("User not found"))?;

        Ok(UserInfoResponse::from(profile))
    }

    /// Deletes pairs whose refresh token has expired, along with
    /// revocation records for access tokens past their natural expiry.
    ///
    /// Idempotent; returns the number of rows removed. Intended for a
    /// periodic housekeeping sweep, not the request path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub async fn delete_expired_tokens(&self) -> AuthResult<u64> {
        let now = self.clock.now();
        let pairs = self
            .with_store_timeout(self.tokens.delete_expired(now))
            .await?;
        let jtis = self
            .with_store_timeout(self.revoked.cleanup_expired(now))
            .await?;
        Ok(pairs + jtis)
    }

    /// Deletes pairs revoked longer ago than the configured retention
    /// window.
    ///
    /// Idempotent; returns the number of pairs removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub async fn delete_old_revoked_tokens(&self) -> AuthResult<u64> {
        let cutoff = self.clock.now() - self.config.tokens.revoked_retention;
        self.with_store_timeout(self.tokens.delete_revoked_before(cutoff))
            .await
    }

    /// Gets the JWT service reference.
    #[must_use]
    pub fn jwt_service(&self) -> &Arc<JwtService> {
        &self.jwt
    }

    /// Gets the service configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn require_active_client(&self, client_id: &str) -> AuthResult<Client> {
        let client = self
            .with_store_timeout(self.clients.find_by_client_id(client_id))
            .await?
            .ok_or_else(|| AuthError::not_found("Invalid client_id"))?;

        match client.status {
            crate::types::ClientStatus::Active => Ok(client),
            crate::types::ClientStatus::Suspended => {
                Err(AuthError::state_conflict("Client is suspended"))
            }
            crate::types::ClientStatus::Revoked => {
                Err(AuthError::state_conflict("Client is revoked"))
            }
        }
    }

    /// Builds the claims, signs the access token, generates the refresh
    /// token, and assembles the persistence record. Nothing is stored here.
    fn mint_pair(
        &self,
        client: &Client,
        user_id: &str,
        scope: &ScopeSet,
        profile: Option<&UserProfile>,
        rotated_from: Option<Uuid>,
    ) -> AuthResult<(TokenRecord, TokenPair)> {
        let now = self.clock.now();
        let access_lifetime = self.config.tokens.access_token_lifetime;
        let refresh_lifetime = self.config.tokens.refresh_token_lifetime;

        let mut builder =
            AccessTokenClaims::builder(self.jwt.issuer(), user_id, &client.client_id)
                .issued_at(now)
                .expires_in_seconds(access_lifetime.as_secs() as i64)
                .scope(scope.to_string());

        if let Some(profile) = profile {
            if scope.contains("email") {
                if let Some(ref email) = profile.email {
                    builder = builder.email(email, profile.email_verified.unwrap_or(false));
                }
            }
            if scope.contains("profile") {
                if let Some(ref name) = profile.name {
                    builder = builder.name(name);
                }
                if let Some(ref given_name) = profile.given_name {
                    builder = builder.given_name(given_name);
                }
                if let Some(ref family_name) = profile.family_name {
                    builder = builder.family_name(family_name);
                }
                if let Some(ref picture) = profile.picture {
                    builder = builder.picture(picture);
                }
            }
        }

        let claims = builder.build();
        let access_token = self.jwt.encode(&claims)?;
        let refresh_token = credentials::generate_refresh_token();

        let record = TokenRecord {
            id: Uuid::new_v4(),
            jti_hash: credentials::hash_opaque_token(&claims.jti),
            refresh_token_hash: credentials::hash_opaque_token(&refresh_token),
            client_id: client.client_id.clone(),
            user_id: user_id.to_string(),
            scope: scope.to_string(),
            rotated_from,
            created_at: now,
            expires_at: now + access_lifetime,
            refresh_token_expires_at: now + refresh_lifetime,
            revoked_at: None,
        };

        // A violation here is a programming error, never something to clamp.
        record
            .validate()
            .map_err(|e| AuthError::internal(e.to_string()))?;

        let pair = TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: access_lifetime.as_secs(),
            scope: scope.to_string(),
        };

        Ok((record, pair))
    }

    async fn with_store_timeout<T>(
        &self,
        fut: impl Future<Output = AuthResult<T>>,
    ) -> AuthResult<T> {
        match tokio::time::timeout(self.config.tokens.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::transient("Token store operation timed out")),
        }
    }
}
