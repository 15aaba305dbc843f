//! # heimdall-auth
//!
//! OAuth 2.0 / OIDC provider token lifecycle core for Heimdall.
//!
//! This crate provides:
//! - Client registration, credential validation, and lifecycle management
//! - Signed access-token issuance (RS256) with scope-shaped identity claims
//! - Refresh-token rotation (strictly one-shot, atomic under concurrency)
//! - Token introspection and idempotent revocation
//! - Storage contracts for the relational backend
//!
//! ## Overview
//!
//! The lifecycle service is stateless: every correctness guarantee under
//! concurrent use comes from the [`storage`] contracts, so the service can
//! be scaled horizontally with no shared memory. Signed tokens alone are
//! never trusted for liveness — the token store is authoritative for
//! revocation.
//!
//! ## Modules
//!
//! - [`config`] - lifecycle configuration
//! - [`credentials`] - credential generation, hashing, format validation
//! - [`registry`] - OAuth client registry
//! - [`token`] - issuance, refresh, introspection, revocation
//! - [`storage`] - storage traits for auth-related data
//! - [`types`] - domain types
//! - [`clock`] - injectable time source
//! - [`maintenance`] - periodic cleanup sweep

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod maintenance;
pub mod registry;
pub mod scope;
pub mod storage;
pub mod token;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, IntrospectionConfig, SigningConfig, TokenLifetimeConfig};
pub use error::{AuthError, ErrorCategory};
pub use registry::{ClientRegistry, ClientUpdate, RegisteredClient, RegistrationOptions};
pub use scope::ScopeSet;
pub use storage::{ClientStorage, RevokedTokenStorage, TokenStorage, UserStorage};
pub use token::{
    AccessTokenClaims, IntrospectionResponse, Jwk, Jwks, JwtError, JwtService, SigningKeyPair,
    TokenKind, TokenPair, TokenService, classify,
};
pub use types::{
    Client, ClientStats, ClientStatus, ClientValidationError, DEFAULT_CLIENT_SCOPES,
    StatsTimeframe, TokenRecord, TokenRecordError, TokenStats, UserInfoResponse, UserProfile,
};

/// Type alias for token lifecycle results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use heimdall_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{AuthConfig, IntrospectionConfig, SigningConfig, TokenLifetimeConfig};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::registry::{ClientRegistry, ClientUpdate, RegisteredClient, RegistrationOptions};
    pub use crate::scope::ScopeSet;
    pub use crate::storage::{ClientStorage, RevokedTokenStorage, TokenStorage, UserStorage};
    pub use crate::token::{
        AccessTokenClaims, IntrospectionResponse, JwtService, SigningKeyPair, TokenKind, TokenPair,
        TokenService,
    };
    pub use crate::types::{
        Client, ClientStats, ClientStatus, StatsTimeframe, TokenRecord, UserInfoResponse,
        UserProfile,
    };
}
