//! Credential generation, hashing, and format validation.
//!
//! This module is the single source of truth for the opaque credential
//! formats used across the provider:
//!
//! - client ids: `cl_` + 16 alphanumeric characters
//! - client secrets: `cs_` + 32 alphanumeric characters
//! - refresh tokens: `rt_` + 43 URL-safe base64 characters (256-bit entropy)
//!
//! # Security
//!
//! - Generation uses a cryptographically secure RNG
//! - Client secrets are stored as Argon2id hashes, never plaintext
//! - Opaque tokens are looked up by their SHA-256 digest so that equality
//!   queries work without scanning plaintext

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Prefix for client identifiers.
pub const CLIENT_ID_PREFIX: &str = "cl_";

/// Prefix for client secrets.
pub const CLIENT_SECRET_PREFIX: &str = "cs_";

/// Prefix for refresh tokens.
pub const REFRESH_TOKEN_PREFIX: &str = "rt_";

const CLIENT_ID_BODY_LEN: usize = 16;
const CLIENT_SECRET_BODY_LEN: usize = 32;
const REFRESH_TOKEN_BODY_LEN: usize = 43;

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a new client identifier.
///
/// # Format
///
/// `cl_{16 alphanumeric characters}` (19 characters total)
#[must_use]
pub fn generate_client_id() -> String {
    format!(
        "{}{}",
        CLIENT_ID_PREFIX,
        random_alphanumeric(CLIENT_ID_BODY_LEN)
    )
}

/// Generate a new client secret.
///
/// The plaintext is returned to the caller exactly once; only the Argon2
/// hash produced by [`hash_secret`] is ever persisted.
///
/// # Format
///
/// `cs_{32 alphanumeric characters}` (35 characters total)
#[must_use]
pub fn generate_client_secret() -> String {
    format!(
        "{}{}",
        CLIENT_SECRET_PREFIX,
        random_alphanumeric(CLIENT_SECRET_BODY_LEN)
    )
}

/// Generate a cryptographically secure refresh token.
///
/// The body is a 256-bit random value encoded as unpadded base64url
/// (43 characters).
///
/// # Format
///
/// `rt_{43 URL-safe base64 characters}` (46 characters total)
#[must_use]
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    format!("{}{}", REFRESH_TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a client secret for storage using Argon2id.
///
/// Each call generates a fresh salt, so hashing the same secret twice
/// yields different hashes; both verify via [`verify_secret`].
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a client secret against a stored Argon2 hash.
///
/// # Returns
///
/// `Ok(true)` if the secret matches, `Ok(false)` if it doesn't.
/// Returns `Err` only if the stored hash is not valid PHC format.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Hash an opaque token value using SHA-256.
///
/// Deterministic: used both when storing new tokens and when looking them
/// up. Applies to refresh tokens and to access-token `jti` values.
#[must_use]
pub fn hash_opaque_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns `true` if the value is a well-formed client id.
#[must_use]
pub fn is_valid_client_id(value: &str) -> bool {
    has_alphanumeric_body(value, CLIENT_ID_PREFIX, CLIENT_ID_BODY_LEN)
}

/// Returns `true` if the value is a well-formed client secret.
#[must_use]
pub fn is_valid_client_secret(value: &str) -> bool {
    has_alphanumeric_body(value, CLIENT_SECRET_PREFIX, CLIENT_SECRET_BODY_LEN)
}

/// Returns `true` if the value is a well-formed refresh token.
#[must_use]
pub fn is_valid_refresh_token(value: &str) -> bool {
    match value.strip_prefix(REFRESH_TOKEN_PREFIX) {
        Some(body) => {
            body.len() == REFRESH_TOKEN_BODY_LEN
                && body
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}

fn has_alphanumeric_body(value: &str, prefix: &str, body_len: usize) -> bool {
    match value.strip_prefix(prefix) {
        Some(body) => body.len() == body_len && body.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_client_id_format() {
        let id = generate_client_id();
        assert!(id.starts_with("cl_"));
        assert_eq!(id.len(), 19);
        assert!(is_valid_client_id(&id));
    }

    #[test]
    fn test_generate_client_secret_format() {
        let secret = generate_client_secret();
        assert!(secret.starts_with("cs_"));
        assert_eq!(secret.len(), 35);
        assert!(is_valid_client_secret(&secret));
    }

    #[test]
    fn test_generate_refresh_token_format() {
        let token = generate_refresh_token();
        assert!(token.starts_with("rt_"));
        // rt_ + 32 bytes base64url = 46 characters
        assert_eq!(token.len(), 46);
        assert!(is_valid_refresh_token(&token));
    }

    #[test]
    fn test_generated_values_are_unique() {
        let ids: Vec<String> = (0..100).map(|_| generate_client_id()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());

        let secrets: Vec<String> = (0..100).map(|_| generate_client_secret()).collect();
        let mut unique = secrets.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(secrets.len(), unique.len());

        let tokens: Vec<String> = (0..100).map(|_| generate_refresh_token()).collect();
        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(tokens.len(), unique.len());
    }

    #[test]
    fn test_hash_secret_produces_different_hashes() {
        let secret = generate_client_secret();
        let hash1 = hash_secret(&secret).unwrap();
        let hash2 = hash_secret(&secret).unwrap();

        assert!(hash1.starts_with("$argon2id$"));
        assert_ne!(hash1, hash2);

        assert!(verify_secret(&secret, &hash1).unwrap());
        assert!(verify_secret(&secret, &hash2).unwrap());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let secret = generate_client_secret();
        let hash = hash_secret(&secret).unwrap();

        assert!(!verify_secret(&generate_client_secret(), &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_format() {
        assert!(verify_secret("cs_anything", "not-a-phc-hash").is_err());
    }

    #[test]
    fn test_hash_opaque_token_deterministic() {
        let token = generate_refresh_token();
        let hash = hash_opaque_token(&token);

        // SHA-256 produces 64 hex characters
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_opaque_token(&token));
        assert_ne!(hash, hash_opaque_token("different-token"));
    }

    #[test]
    fn test_client_id_validator_rejects_bad_shapes() {
        assert!(!is_valid_client_id(""));
        assert!(!is_valid_client_id("cl_"));
        assert!(!is_valid_client_id("cs_ABCDEFGHIJKLMNOP"));
        assert!(!is_valid_client_id("cl_short"));
        assert!(!is_valid_client_id("cl_ABCDEFGHIJKLMNOPQ")); // 17 chars
        assert!(!is_valid_client_id("cl_ABCDEFGHIJKLMN-P")); // non-alphanumeric
        assert!(is_valid_client_id("cl_ABCDEFGHIJKLMNOP"));
    }

    #[test]
    fn test_client_secret_validator_rejects_bad_shapes() {
        assert!(!is_valid_client_secret("cl_ABCDEFGHIJKLMNOP"));
        assert!(!is_valid_client_secret("cs_tooshort"));
        assert!(is_valid_client_secret(&generate_client_secret()));
    }

    #[test]
    fn test_refresh_token_validator_rejects_bad_shapes() {
        assert!(!is_valid_refresh_token(""));
        assert!(!is_valid_refresh_token("rt_short"));
        assert!(!is_valid_refresh_token("cs_AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
        // 43 chars but contains '+' which is not URL-safe
        assert!(!is_valid_refresh_token(
            "rt_AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA+"
        ));
        assert!(is_valid_refresh_token(
            "rt_AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA-_A"
        ));
    }
}
