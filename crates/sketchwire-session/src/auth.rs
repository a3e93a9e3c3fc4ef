//! Identity hooks: persistent user lookup and the admin capability.
//!
//! Sketchwire does not store accounts itself. The [`UserDirectory`] trait
//! resolves a display name to an account id held somewhere else, and the
//! server treats any failure as "guest".

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use crate::SessionError;

/// Resolves display names to persistent account ids.
///
/// # Example
///
/// ```rust
/// use sketchwire_session::{SessionError, UserDirectory};
///
/// /// Everybody is a guest.
/// struct NoAccounts;
///
/// impl UserDirectory for NoAccounts {
///     async fn lookup(&self, _name: &str) -> Result<Option<i64>, SessionError> {
///         Ok(None)
///     }
/// }
/// ```
pub trait UserDirectory: Send + Sync + 'static {
    /// Returns the account id for `display_name`, or `None` for a guest.
    ///
    /// # Errors
    /// Returns [`SessionError::LookupFailed`] if the backing store cannot
    /// be reached. Callers degrade to guest.
    fn lookup(
        &self,
        display_name: &str,
    ) -> impl Future<Output = Result<Option<i64>, SessionError>> + Send;
}

/// A fixed, in-process [`UserDirectory`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, i64>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory (everyone is a guest).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account.
    pub fn with_user(mut self, display_name: impl Into<String>, user_id: i64) -> Self {
        self.users.insert(display_name.into(), user_id);
        self
    }
}

impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, display_name: &str) -> Result<Option<i64>, SessionError> {
        Ok(self.users.get(display_name).copied())
    }
}

/// Shared secret that grants the admin capability to a connection.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone)]
pub struct AdminToken(String);

impl AdminToken {
    /// Wraps a secret. Empty secrets are refused.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Compares `candidate` against the secret in constant time with
    /// respect to the candidate's contents.
    pub fn verify(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let given = candidate.as_bytes();
        if expected.len() != given.len() {
            return false;
        }
        expected
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_known_user_returns_id() {
        let dir = InMemoryUserDirectory::new().with_user("alice", 7);
        assert_eq!(dir.lookup("alice").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_lookup_unknown_user_is_guest() {
        let dir = InMemoryUserDirectory::new().with_user("alice", 7);
        assert_eq!(dir.lookup("Alice").await.unwrap(), None);
    }

    #[test]
    fn test_admin_token_verify_matches_exact_secret() {
        let token = AdminToken::new("s3cret").unwrap();
        assert!(token.verify("s3cret"));
        assert!(!token.verify("s3cre"));
        assert!(!token.verify("s3creT"));
        assert!(!token.verify(""));
    }

    #[test]
    fn test_admin_token_empty_secret_refused() {
        assert!(AdminToken::new("").is_none());
    }

    #[test]
    fn test_admin_token_debug_is_redacted() {
        let token = AdminToken::new("hunter2").unwrap();
        assert!(!format!("{token:?}").contains("hunter2"));
    }
}
