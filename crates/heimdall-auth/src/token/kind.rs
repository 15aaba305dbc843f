//! Token shape classification.
//!
//! Refresh tokens are opaque fixed-format strings; access tokens are
//! three-segment JWS structures. Classification happens once, up front, and
//! the rest of the lifecycle service pattern-matches on the variant instead
//! of re-testing string shape ad hoc.

use serde::{Deserialize, Serialize};

use crate::credentials;

/// The two kinds of bearer credential the provider issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// A signed access token (compact JWS).
    Access,
    /// An opaque refresh token.
    Refresh,
}

impl TokenKind {
    /// Returns the RFC 7009/7662 `token_type_hint` value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a token string by shape.
///
/// Returns `None` for values that are neither a well-formed refresh token
/// nor plausibly a compact JWS.
#[must_use]
pub fn classify(token: &str) -> Option<TokenKind> {
    if credentials::is_valid_refresh_token(token) {
        return Some(TokenKind::Refresh);
    }
    if token.split('.').count() == 3 && !token.starts_with('.') && !token.ends_with('.') {
        return Some(TokenKind::Access);
    }
    None
}
