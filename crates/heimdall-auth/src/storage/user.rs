//! User profile storage trait.
//!
//! The lifecycle core only ever reads user profiles (for claim shaping and
//! the userinfo operation); account management lives elsewhere.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::UserProfile;

/// Read-only access to user profiles.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user profile by subject identifier.
    ///
    /// Returns `None` for unknown subjects.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<UserProfile>>;
}
