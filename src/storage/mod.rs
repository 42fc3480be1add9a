//! Storage layer for SalesSight
//!
//! Provides the abstraction and the libSQL implementation for persistent
//! storage of user accounts and feedback submissions.

pub mod libsql;

use crate::error::Result;
use crate::types::{FeedbackRecord, User, UserId};
use async_trait::async_trait;

/// Storage backend trait defining all required operations
///
/// Connections are scoped per call: every operation acquires, uses, and
/// releases its own connection. This suits the single-instance local usage
/// this application targets; a multi-user deployment would swap this seam
/// for a pooled implementation.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Idempotently create all tables; safe to call on every process start
    async fn init_schema(&self) -> Result<()>;

    /// Create a user account, returning the store-assigned id
    ///
    /// Fails with `AlreadyExists` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId>;

    /// Look up a user by username
    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Return the user matching both username and password hash, if any
    async fn verify_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>>;

    /// Append one feedback row
    ///
    /// The caller is responsible for validating the score range before
    /// calling; this layer does not re-validate. `id` and `timestamp` are
    /// assigned by the store.
    async fn insert_feedback(
        &self,
        user_id: Option<UserId>,
        feature_name: &str,
        score: i64,
        comments: Option<&str>,
    ) -> Result<()>;

    /// All feedback submitted by the given username, newest first
    async fn feedback_for_user(&self, username: &str) -> Result<Vec<FeedbackRecord>>;

    /// All feedback rows joined to usernames, newest first
    ///
    /// The username is `None` for rows whose account was since removed.
    async fn all_feedback(&self) -> Result<Vec<(Option<String>, FeedbackRecord)>>;
}
