//! Account registration and credential verification
//!
//! Passwords are stored as SHA-256 hex digests; comparison happens against
//! the digest, never the plaintext. Session mutation on login is the
//! caller-visible side effect: a successful login records the username and
//! leaves id resolution to the session's read-through cache.

use crate::error::{Result, SalesSightError};
use crate::session::Session;
use crate::storage::StorageBackend;
use crate::types::{User, UserId};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Hex digest of a password for storage and comparison
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Register a new account
///
/// Both fields must be non-empty. A taken username surfaces as
/// `AlreadyExists` so the page can tell the user to pick another.
pub async fn register(
    store: &dyn StorageBackend,
    username: &str,
    password: &str,
) -> Result<UserId> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(SalesSightError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let id = store.create_user(username, &hash_password(password)).await?;
    info!("Registered new user '{}'", username);
    Ok(id)
}

/// Verify credentials and, on success, authenticate the session
///
/// Returns `None` on a username/password mismatch without touching the
/// session, so the caller can show an invalid-credentials warning.
pub async fn log_in(
    store: &dyn StorageBackend,
    session: &mut Session,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    match store
        .verify_credentials(username, &hash_password(password))
        .await?
    {
        Some(user) => {
            session.log_in(&user.username);
            info!("User '{}' logged in", user.username);
            Ok(Some(user))
        }
        None => {
            warn!("Failed login attempt for '{}'", username);
            Ok(None)
        }
    }
}

/// End the session's authenticated state
pub fn log_out(session: &mut Session) {
    if let Some(username) = session.current_username() {
        info!("User '{}' logged out", username);
    }
    session.log_out();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::libsql::LibsqlStore;
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, LibsqlStore) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let store = LibsqlStore::new(db_path.to_str().unwrap());
        store.init_schema().await.unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_hashing_is_deterministic_and_distinct() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("Secret"));
        // sha256 hex is 64 chars
        assert_eq!(hash_password("secret").len(), 64);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();

        let id = register(&store, "alice", "wonderland").await.unwrap();

        let user = log_in(&store, &mut session, "alice", "wonderland")
            .await
            .unwrap()
            .expect("login should succeed");
        assert_eq!(user.id, id);
        assert_eq!(session.current_username(), Some("alice"));
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_session_untouched() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();

        register(&store, "alice", "wonderland").await.unwrap();

        let result = log_in(&store, &mut session, "alice", "rabbit-hole")
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let (_guard, store) = test_store().await;

        assert!(matches!(
            register(&store, "", "pw").await.unwrap_err(),
            SalesSightError::Validation(_)
        ));
        assert!(matches!(
            register(&store, "alice", "").await.unwrap_err(),
            SalesSightError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (_guard, store) = test_store().await;

        register(&store, "alice", "one").await.unwrap();
        let err = register(&store, "alice", "two").await.unwrap_err();
        assert!(matches!(err, SalesSightError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_logout_after_login() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();

        register(&store, "alice", "wonderland").await.unwrap();
        log_in(&store, &mut session, "alice", "wonderland")
            .await
            .unwrap();

        log_out(&mut session);
        assert!(!session.is_logged_in());
    }
}
