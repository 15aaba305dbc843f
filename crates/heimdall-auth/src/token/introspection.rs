//! Token introspection response types (RFC 7662).
//!
//! Introspection is a best-effort query, not an assertion: every failure
//! mode — malformed token, bad signature, expiry, revocation, missing store
//! row — collapses into `active: false` with no further detail.

use serde::Serialize;

/// Token introspection response.
///
/// `active` is the only required field. Metadata appears only when the
/// token is live according to both its signature/format and the token
/// store.
#[derive(Debug, Clone, Serialize, Default)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active.
    pub active: bool,

    /// A space-separated list of scope values granted to the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Type of the token: "Bearer" or "refresh_token".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Subject identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// JWT ID of the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl IntrospectionResponse {
    /// Creates an inactive response.
    ///
    /// Never reveals why the token is inactive.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            ..Default::default()
        }
    }

    /// Creates an active response.
    #[must_use]
    pub fn active() -> Self {
        Self {
            active: true,
            ..Default::default()
        }
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the client ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the token type.
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub fn with_exp(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Sets the issued at time.
    #[must_use]
    pub fn with_iat(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the JWT ID.
    #[must_use]
    pub fn with_jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_serializes_to_active_false_only() {
        let response = IntrospectionResponse::inactive();
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"active":false}"#);
    }

    #[test]
    fn test_active_with_metadata() {
        let response = IntrospectionResponse::active()
            .with_scope("openid email")
            .with_client_id("cl_ABCDEFGHIJKLMNOP")
            .with_token_type("Bearer")
            .with_exp(1_700_000_000)
            .with_iat(1_699_996_400)
            .with_sub("user-1")
            .with_jti("a-jti");

        assert!(response.active);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"active\":true"));
        assert!(json.contains("\"scope\":\"openid email\""));
        assert!(json.contains("\"client_id\":\"cl_ABCDEFGHIJKLMNOP\""));
        assert!(json.contains("\"token_type\":\"Bearer\""));
        assert!(json.contains("\"sub\":\"user-1\""));
    }
}
