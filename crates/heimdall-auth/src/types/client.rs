//! OAuth 2.0 Client domain types.
//!
//! This module defines the `Client` struct and related types for OAuth 2.0
//! client registrations.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::scope::ScopeSet;

// =============================================================================
// Client Status
// =============================================================================

/// Lifecycle status of a registered client.
///
/// `Suspended` is reversible; `Revoked` is terminal — a revoked client can
/// never be reactivated, only deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// The client may authenticate and be issued tokens.
    Active,
    /// The client is temporarily blocked; reactivation restores it.
    Suspended,
    /// The client is permanently disabled. The record is retained.
    Revoked,
}

impl ClientStatus {
    /// Returns the status as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client
// =============================================================================

/// Default scopes granted to newly registered clients.
pub const DEFAULT_CLIENT_SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// OAuth 2.0 Client registration.
///
/// The `client_secret` is only ever handed out in plaintext at creation or
/// rotation time; this record carries the Argon2 hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier used in OAuth flows (`cl_` + 16 alphanumeric).
    pub client_id: String,

    /// Argon2 hash of the client secret.
    #[serde(skip_serializing)]
    pub secret_hash: String,

    /// Human-readable display name.
    pub name: String,

    /// User that registered the client.
    pub owner_id: String,

    /// Allowed redirect URIs. Matched exactly, case-sensitively, with no
    /// substring or wildcard semantics. Never empty.
    pub redirect_uris: Vec<String>,

    /// OAuth scopes this client is allowed to request.
    pub scopes: Vec<String>,

    /// Whether PKCE is required for the authorization code flow.
    pub require_pkce: bool,

    /// Trusted clients skip the consent screen.
    pub trusted: bool,

    /// Current lifecycle status.
    pub status: ClientStatus,

    /// When this client was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this client last passed credential validation.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub last_used_at: Option<OffsetDateTime>,
}

impl Client {
    /// Validates the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.name.is_empty() {
            return Err(ClientValidationError::EmptyName);
        }

        if self.redirect_uris.is_empty() {
            return Err(ClientValidationError::NoRedirectUris);
        }

        for uri in &self.redirect_uris {
            validate_redirect_uri_syntax(uri)?;
        }

        Ok(())
    }

    /// Checks if the given redirect URI is allowed for this client.
    ///
    /// Exact string comparison only: case differences, trailing segments,
    /// and query variations all fail.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if every token of the requested scope is allowed for this
    /// client.
    #[must_use]
    pub fn is_scope_allowed(&self, requested: &ScopeSet) -> bool {
        let allowed = ScopeSet::parse(&self.scopes.join(" "));
        requested.is_subset_of(&allowed)
    }

    /// Returns `true` if the client may authenticate and be issued tokens.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ClientStatus::Active
    }
}

/// Validates a single redirect URI: absolute URL, no `javascript:` scheme.
pub(crate) fn validate_redirect_uri_syntax(uri: &str) -> Result<(), ClientValidationError> {
    let parsed = url::Url::parse(uri).map_err(|_| ClientValidationError::InvalidRedirectUri {
        uri: uri.to_string(),
    })?;

    if parsed.scheme().eq_ignore_ascii_case("javascript") {
        return Err(ClientValidationError::ForbiddenRedirectScheme {
            uri: uri.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during client validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Client name cannot be empty.
    #[error("Client name cannot be empty")]
    EmptyName,

    /// At least one redirect URI is required.
    #[error("At least one redirect URI is required")]
    NoRedirectUris,

    /// Redirect URI is not a valid absolute URL.
    #[error("Invalid redirect URI: {uri}")]
    InvalidRedirectUri {
        /// The offending URI.
        uri: String,
    },

    /// Redirect URI uses a forbidden scheme.
    #[error("Redirect URI scheme not allowed: {uri}")]
    ForbiddenRedirectScheme {
        /// The offending URI.
        uri: String,
    },
}

// =============================================================================
// Tests
// =============================================================================
