//! JWT access-token signing and verification.
//!
//! Access tokens are compact JWS structures signed with RS256 using a
//! process-wide, read-only RSA key pair (2048 bits or larger). The `kid`
//! header always names the configured signing key.
//!
//! Verification is pinned to RS256: a token whose header claims any other
//! algorithm — in particular an HMAC token keyed with the public key — is
//! rejected before signature comparison.
//!
//! Signature validity alone never makes a token usable; the lifecycle
//! service additionally checks the token store, which is authoritative for
//! revocation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::SigningConfig;
use crate::error::AuthError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is malformed or carries an unexpected algorithm.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error (expired, bad
    /// signature, bad claims) as opposed to a key/configuration problem.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired
                | Self::InvalidSignature
                | Self::InvalidClaims { .. }
                | Self::DecodingError { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::decoding_error(err.to_string()),
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::state_conflict("Token expired"),
            JwtError::InvalidSignature => AuthError::security("Invalid token signature"),
            JwtError::DecodingError { .. } | JwtError::InvalidClaims { .. } => {
                AuthError::security("Invalid token")
            }
            JwtError::EncodingError { message } => AuthError::internal(message),
            JwtError::KeyGenerationError { message } | JwtError::InvalidKey { message } => {
                AuthError::configuration(message)
            }
        }
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Access token claims.
///
/// Identity claims are conditional on the granted scope: the `email` pair
/// requires the `email` scope, the name/picture group requires `profile`.
/// Absent claims are omitted entirely, never emitted as null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer (authorization server URL).
    pub iss: String,

    /// Subject (user identifier).
    pub sub: String,

    /// Audience (the client the token was issued to).
    pub aud: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// JWT ID. Fresh per issuance; its SHA-256 digest is the storage
    /// lookup key.
    pub jti: String,

    /// Space-separated scopes.
    pub scope: String,

    /// Email address (requires `email` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Email verification status (requires `email` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Full display name (requires `profile` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Given name (requires `profile` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Family name (requires `profile` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Profile picture URL (requires `profile` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl AccessTokenClaims {
    /// Creates a new builder for access token claims.
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> AccessTokenClaimsBuilder {
        AccessTokenClaimsBuilder::new(issuer, subject, audience)
    }
}

/// Builder for `AccessTokenClaims`.
pub struct AccessTokenClaimsBuilder {
    iss: String,
    sub: String,
    aud: String,
    exp: i64,
    iat: i64,
    jti: String,
    scope: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

impl AccessTokenClaimsBuilder {
    fn new(issuer: impl Into<String>, subject: impl Into<String>, audience: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: audience.into(),
            exp: now + 3600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            scope: String::new(),
            email: None,
            email_verified: None,
            name: None,
            given_name: None,
            family_name: None,
            picture: None,
        }
    }

    /// Sets issued-at to the given instant, keeping the current lifetime.
    #[must_use]
    pub fn issued_at(mut self, iat: OffsetDateTime) -> Self {
        let lifetime = self.exp - self.iat;
        self.iat = iat.unix_timestamp();
        self.exp = self.iat + lifetime;
        self
    }

    /// Sets the expiration time in seconds after issued-at.
    #[must_use]
    pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
        self.exp = self.iat + seconds;
        self
    }

    /// Sets the scopes.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the email claims.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = Some(verified);
        self
    }

    /// Sets the full display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the given name.
    #[must_use]
    pub fn given_name(mut self, given_name: impl Into<String>) -> Self {
        self.given_name = Some(given_name.into());
        self
    }

    /// Sets the family name.
    #[must_use]
    pub fn family_name(mut self, family_name: impl Into<String>) -> Self {
        self.family_name = Some(family_name.into());
        self
    }

    /// Sets the profile picture URL.
    #[must_use]
    pub fn picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Builds the access token claims.
    #[must_use]
    pub fn build(self) -> AccessTokenClaims {
        AccessTokenClaims {
            iss: self.iss,
            sub: self.sub,
            aud: self.aud,
            exp: self.exp,
            iat: self.iat,
            jti: self.jti,
            scope: self.scope,
            email: self.email,
            email_verified: self.email_verified,
            name: self.name,
            given_name: self.given_name,
            family_name: self.family_name,
            picture: self.picture,
        }
    }
}

// ============================================================================
// JWKS Types
// ============================================================================

/// JSON Web Key Set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    /// The keys in this set.
    pub keys: Vec<Jwk>,
}

/// JSON Web Key (RSA signing key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always "RSA".
    pub kty: String,

    /// Key ID.
    pub kid: String,

    /// Key use, always "sig".
    #[serde(rename = "use")]
    pub use_: String,

    /// Algorithm, always "RS256".
    pub alg: String,

    /// RSA modulus (base64url encoded).
    pub n: String,

    /// RSA exponent (base64url encoded).
    pub e: String,
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// An RSA signing key pair for JWT operations.
pub struct SigningKeyPair {
    /// Key ID.
    pub kid: String,

    /// Encoding key (private key) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (public key) for verification.
    decoding_key: DecodingKey,

    /// RSA modulus for JWKS export.
    modulus: Vec<u8>,

    /// RSA exponent for JWKS export.
    exponent: Vec<u8>,
}

impl SigningKeyPair {
    /// Generates a new 2048-bit RSA key pair.
    ///
    /// Intended for tests and local development; production keys arrive as
    /// PEM via [`SigningKeyPair::from_pem`].
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn generate() -> Result<Self, JwtError> {
        let bits = 2048;
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let public_key = private_key.to_public_key();
        let n = public_key.n().to_bytes_be();
        let e = public_key.e().to_bytes_be();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Ok(Self {
            kid: Uuid::new_v4().to_string(),
            encoding_key,
            decoding_key,
            modulus: n,
            exponent: e,
        })
    }

    /// Loads a key pair from PEM strings.
    ///
    /// # Errors
    ///
    /// Returns an error if either PEM is invalid.
    pub fn from_pem(
        kid: impl Into<String>,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        let public_key = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            kid: kid.into(),
            encoding_key,
            decoding_key,
            modulus: public_key.n().to_bytes_be(),
            exponent: public_key.e().to_bytes_be(),
        })
    }

    /// Exports the public key as a JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: self.kid.clone(),
            use_: "sig".to_string(),
            alg: "RS256".to_string(),
            n: URL_SAFE_NO_PAD.encode(&self.modulus),
            e: URL_SAFE_NO_PAD.encode(&self.exponent),
        }
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Service for signing and verifying access tokens.
///
/// Thread-safe (`Send + Sync`); constructed once at startup and shared.
pub struct JwtService {
    signing_key: SigningKeyPair,
    issuer: String,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Creates a new JWT service from an explicit key pair.
    #[must_use]
    pub fn new(signing_key: SigningKeyPair, issuer: impl Into<String>) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
        }
    }

    /// Creates a JWT service from signing configuration.
    ///
    /// # Errors
    ///
    /// Fails closed with a configuration error if either PEM is missing or
    /// unparseable; no issuance or verification happens without key
    /// material.
    pub fn from_config(issuer: impl Into<String>, config: &SigningConfig) -> Result<Self, AuthError> {
        let private_pem = config
            .private_key_pem
            .as_deref()
            .ok_or_else(|| AuthError::configuration("Signing private key is not configured"))?;
        let public_pem = config
            .public_key_pem
            .as_deref()
            .ok_or_else(|| AuthError::configuration("Signing public key is not configured"))?;

        if config.key_id.is_empty() {
            return Err(AuthError::configuration("Signing key id is not configured"));
        }

        let key_pair = SigningKeyPair::from_pem(config.key_id.clone(), private_pem, public_pem)
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        Ok(Self::new(key_pair, issuer))
    }

    /// Signs claims into a compact JWT.
    ///
    /// The header carries `alg=RS256`, `typ=JWT`, and the configured `kid`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.signing_key.kid.clone());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes and validates a JWT, including expiry.
    ///
    /// Validation accepts RS256 only; a header claiming HS256 (or anything
    /// else) fails regardless of what it was keyed with.
    ///
    /// # Errors
    ///
    /// Fails distinctly for malformed structure, bad signature, expiry, and
    /// claim mismatches.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false; // Audience validated at application layer

        decode(token, &self.signing_key.decoding_key, &validation).map_err(JwtError::from)
    }

    /// Decodes a JWT without validating expiration.
    ///
    /// Used by introspection, which reports expiry itself against its own
    /// clock. The signature is still fully validated.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_allow_expired<T: DeserializeOwned>(
        &self,
        token: &str,
    ) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode(token, &self.signing_key.decoding_key, &validation).map_err(JwtError::from)
    }

    /// Returns the current signing key ID.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.signing_key.kid
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the JWKS containing the public key.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![self.signing_key.to_jwk()],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        let key_pair = SigningKeyPair::generate().unwrap();
        JwtService::new(key_pair, "https://auth.example.com")
    }

    fn test_claims() -> AccessTokenClaims {
        AccessTokenClaims::builder("https://auth.example.com", "user-1", "cl_ABCDEFGHIJKLMNOP")
            .scope("openid email")
            .expires_in_seconds(3600)
            .build()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let service = test_service();
        let claims = test_claims();

        let token = service.encode(&claims).unwrap();
        assert_eq!(token.matches('.').count(), 2);

        let decoded = service.decode::<AccessTokenClaims>(&token).unwrap();
        assert_eq!(decoded.claims.sub, "user-1");
        assert_eq!(decoded.claims.aud, "cl_ABCDEFGHIJKLMNOP");
        assert_eq!(decoded.claims.scope, "openid email");
        assert_eq!(decoded.claims.jti, claims.jti);
    }

    #[test]
    fn test_header_carries_kid_and_rs256() {
        let service = test_service();
        let token = service.encode(&test_claims()).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(service.current_kid()));
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let claims =
            AccessTokenClaims::builder("https://auth.example.com", "user-1", "cl_ABCDEFGHIJKLMNOP")
                .expires_in_seconds(-3600)
                .build();

        let token = service.encode(&claims).unwrap();
        let result = service.decode::<AccessTokenClaims>(&token);
        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_decode_allow_expired() {
        let service = test_service();
        let claims =
            AccessTokenClaims::builder("https://auth.example.com", "user-1", "cl_ABCDEFGHIJKLMNOP")
                .expires_in_seconds(-3600)
                .build();

        let token = service.encode(&claims).unwrap();
        let decoded = service
            .decode_allow_expired::<AccessTokenClaims>(&token)
            .unwrap();
        assert_eq!(decoded.claims.sub, "user-1");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let service1 = test_service();
        let service2 = test_service();

        let token = service1.encode(&test_claims()).unwrap();
        let result = service2.decode::<AccessTokenClaims>(&token);
        assert!(matches!(result.unwrap_err(), JwtError::InvalidSignature));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = test_service();
        let result = service.decode::<AccessTokenClaims>("not-a-jwt");
        assert!(matches!(result.unwrap_err(), JwtError::DecodingError { .. }));
    }

    #[test]
    fn test_algorithm_confusion_rejected() {
        // An attacker signing an HS256 token with the public key as the HMAC
        // secret must not get past verification.
        let key_pair = SigningKeyPair::generate().unwrap();
        let public_jwk = key_pair.to_jwk();
        let service = JwtService::new(key_pair, "https://auth.example.com");

        let forged = encode(
            &Header::new(Algorithm::HS256),
            &test_claims(),
            &EncodingKey::from_secret(public_jwk.n.as_bytes()),
        )
        .unwrap();

        let result = service.decode::<AccessTokenClaims>(&forged);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_requires_key_material() {
        let config = SigningConfig::default();
        let result = JwtService::from_config("https://auth.example.com", &config);
        assert!(matches!(
            result.unwrap_err(),
            AuthError::Configuration { .. }
        ));
    }

    #[test]
    fn test_conditional_claims_omitted() {
        let claims =
            AccessTokenClaims::builder("https://auth.example.com", "user-1", "cl_ABCDEFGHIJKLMNOP")
                .scope("openid")
                .build();

        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("email"));
        assert!(!json.contains("name"));
        assert!(!json.contains("picture"));
    }

    #[test]
    fn test_identity_claims_serialized_when_set() {
        let claims =
            AccessTokenClaims::builder("https://auth.example.com", "user-1", "cl_ABCDEFGHIJKLMNOP")
                .scope("openid email profile")
                .email("jane@example.com", true)
                .name("Jane Doe")
                .given_name("Jane")
                .family_name("Doe")
                .build();

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"email\":\"jane@example.com\""));
        assert!(json.contains("\"email_verified\":true"));
        assert!(json.contains("\"given_name\":\"Jane\""));
    }

    #[test]
    fn test_jwks_export() {
        let service = test_service();
        let jwks = service.jwks();

        assert_eq!(jwks.keys.len(), 1);
        let jwk = &jwks.keys[0];
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.use_, "sig");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.kid, service.current_kid());
        assert!(!jwk.n.is_empty());
        assert!(!jwk.e.is_empty());
    }

    #[test]
    fn test_fresh_jti_per_builder() {
        let a = test_claims();
        let b = test_claims();
        assert_ne!(a.jti, b.jti);
    }
}
