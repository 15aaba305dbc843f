//! Token lifecycle error types.
//!
//! This module defines the error taxonomy shared by the credential codec,
//! the client registry, and the token lifecycle service. Each variant maps
//! to a distinct caller behavior:
//!
//! - `Validation` — malformed input, safe to retry after correcting it
//! - `NotFound` — the referenced client/token/user does not exist
//! - `StateConflict` — the operation conflicts with current state
//!   (suspended client, revoked token, scope expansion); no partial progress
//! - `Security` — signature failures and tampered tokens
//! - `Configuration` — missing key material; the service fails closed
//! - `Transient` — store timeouts/outages; the only retryable kind
//! - `Internal` — invariant violations and unexpected failures

use std::fmt;

/// Errors that can occur during client and token lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The input is malformed and was rejected before any store mutation.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what is malformed.
        message: String,
    },

    /// The referenced client, token, or user does not exist.
    ///
    /// The message never reveals whether the resource existed historically.
    #[error("{message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// The operation conflicts with the current state of the resource.
    #[error("{message}")]
    StateConflict {
        /// Description of the conflict.
        message: String,
    },

    /// Signature verification failed or the token has been tampered with.
    ///
    /// The message is safe to return to callers; details for audit go to the
    /// log, never into the error.
    #[error("Security error: {message}")]
    Security {
        /// Externally safe description.
        message: String,
    },

    /// The signing configuration is incomplete. Issuance and verification
    /// refuse to operate rather than degrade.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A store or signer call timed out or failed transiently.
    ///
    /// This is the only kind callers may blindly retry.
    #[error("Transient error: {message}")]
    Transient {
        /// Description of the transient failure.
        message: String,
    },

    /// An invariant was violated or an unexpected internal failure occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `StateConflict` error.
    #[must_use]
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::StateConflict {
            message: message.into(),
        }
    }

    /// Creates a new `Security` error.
    #[must_use]
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Transient` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::StateConflict { .. }
                | Self::Security { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::Transient { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if the operation may be retried without changes.
    ///
    /// Only transient store/signer failures qualify; everything else is a
    /// definitive rejection.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::StateConflict { .. } => ErrorCategory::Conflict,
            Self::Security { .. } => ErrorCategory::Security,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Transient { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    ///
    /// Used when the surrounding service maps failures onto RFC 6749 error
    /// responses.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_request",
            Self::NotFound { .. } => "invalid_grant",
            Self::StateConflict { .. } => "invalid_grant",
            Self::Security { .. } => "invalid_token",
            Self::Configuration { .. } => "server_error",
            Self::Transient { .. } => "temporarily_unavailable",
            Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of lifecycle errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Missing resource errors.
    NotFound,
    /// State conflict errors.
    Conflict,
    /// Signature/tampering errors.
    Security,
    /// Configuration errors.
    Configuration,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Security => write!(f, "security"),
            Self::Configuration => write!(f, "configuration"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
