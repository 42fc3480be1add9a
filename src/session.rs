//! Per-visit session state and identity resolution
//!
//! A [`Session`] owns the ephemeral state of one interactive visit: who is
//! logged in, the cached user id, the loaded sales-data path, and the
//! current analysis instance. It is passed explicitly into every handler
//! that needs it; nothing here is ambient or global. The state does not
//! survive across independent visits.

use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::{AnalysisId, UserId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ephemeral state for one user visit
#[derive(Debug, Default)]
pub struct Session {
    username: Option<String>,
    /// Read-through cache over the store's username -> id lookup;
    /// lives as long as the session, no expiry
    user_id: Option<UserId>,
    data_path: Option<PathBuf>,
    analysis: Option<AnalysisId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The authenticated username, if any; pure read, no side effects
    pub fn current_username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    /// Resolve the current user's id, filling the cache on miss
    ///
    /// Returns the cached id when present; otherwise, if a username is set,
    /// queries the store for the matching id, caches it, and returns it.
    /// Returns `None` when no username is set or no matching user exists.
    /// Safe to call repeatedly; idempotent once cached.
    pub async fn current_user_id(
        &mut self,
        store: &dyn StorageBackend,
    ) -> Result<Option<UserId>> {
        if let Some(id) = self.user_id {
            return Ok(Some(id));
        }

        let Some(username) = self.username.clone() else {
            return Ok(None);
        };

        match store.find_user(&username).await? {
            Some(user) => {
                debug!("Resolved user id {} for '{}'", user.id, username);
                self.user_id = Some(user.id);
                Ok(Some(user.id))
            }
            None => Ok(None),
        }
    }

    /// Mark the session authenticated as `username`
    ///
    /// Drops any cached id from a previous login; it is re-resolved lazily.
    pub fn log_in(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
        self.user_id = None;
    }

    /// Clear authentication and visit state, mirroring a logout
    pub fn log_out(&mut self) {
        self.username = None;
        self.user_id = None;
        self.data_path = None;
    }

    /// Path of the loaded sales data file, if any
    pub fn data_path(&self) -> Option<&Path> {
        self.data_path.as_deref()
    }

    pub fn set_data_path(&mut self, path: impl Into<PathBuf>) {
        self.data_path = Some(path.into());
    }

    /// Start a new analysis instance, returning its id
    ///
    /// Each instance delimits the window in which one feedback submission
    /// is accepted.
    pub fn begin_analysis(&mut self) -> AnalysisId {
        let id = AnalysisId::new();
        debug!("Starting analysis instance {}", id);
        self.analysis = Some(id);
        id
    }

    pub fn current_analysis(&self) -> Option<AnalysisId> {
        self.analysis
    }
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

    #[tokio::test]
    async fn test_no_username_resolves_to_none() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();

        assert_eq!(session.current_user_id(&store).await.unwrap(), None);
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_unknown_username_resolves_to_none() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();
        session.log_in("ghost");

        assert_eq!(session.current_user_id(&store).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_id_is_cached_after_first_resolution() {
        let (guard, store) = test_store().await;
        let expected = store.create_user("alice", "hash").await.unwrap();

        let mut session = Session::new();
        session.log_in("alice");

        let first = session.current_user_id(&store).await.unwrap();
        assert_eq!(first, Some(expected));

        // Remove the backing row; the cached id must survive, proving the
        // second call does not hit the store.
        let db = libsql::Builder::new_local(
            guard.path().join("test.db").to_str().unwrap(),
        )
        .build()
        .await
        .unwrap();
        let conn = db.connect().unwrap();
        conn.execute("DELETE FROM users WHERE username = 'alice'", libsql::params![])
            .await
            .unwrap();

        let second = session.current_user_id(&store).await.unwrap();
        assert_eq!(second, Some(expected));
    }

    #[tokio::test]
    async fn test_login_resets_cached_id() {
        let (_guard, store) = test_store().await;
        let alice = store.create_user("alice", "hash-a").await.unwrap();
        let bob = store.create_user("bob", "hash-b").await.unwrap();

        let mut session = Session::new();
        session.log_in("alice");
        assert_eq!(session.current_user_id(&store).await.unwrap(), Some(alice));

        session.log_in("bob");
        assert_eq!(session.current_user_id(&store).await.unwrap(), Some(bob));
    }

    #[tokio::test]
    async fn test_logout_clears_visit_state() {
        let (_guard, store) = test_store().await;
        store.create_user("alice", "hash").await.unwrap();

        let mut session = Session::new();
        session.log_in("alice");
        session.set_data_path("/tmp/sales.csv");
        session.current_user_id(&store).await.unwrap();

        session.log_out();
        assert!(!session.is_logged_in());
        assert!(session.data_path().is_none());
        assert_eq!(session.current_user_id(&store).await.unwrap(), None);
    }

    #[test]
    fn test_each_analysis_gets_a_fresh_instance() {
        let mut session = Session::new();
        assert!(session.current_analysis().is_none());

        let first = session.begin_analysis();
        let second = session.begin_analysis();
        assert_ne!(first, second);
        assert_eq!(session.current_analysis(), Some(second));
    }
}
