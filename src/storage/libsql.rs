//! LibSQL storage backend implementation
//!
//! Persists user accounts and feedback submissions in a local SQLite file.
//! Every operation opens its own connection and drops it on return; there
//! is no pooled or long-lived handle. Write serialization across processes
//! is delegated entirely to SQLite.

use crate::error::{Result, SalesSightError};
use crate::storage::StorageBackend;
use crate::types::{FeedbackRecord, Rating, User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{params, Builder, Connection, Row, Value};
use tracing::{debug, info};

/// LibSQL storage backend over a local database file
#[derive(Debug)]
pub struct LibsqlStore {
    path: String,
}

impl LibsqlStore {
    /// Create a store over the given database file path
    ///
    /// The file is created lazily on first connection; call
    /// [`StorageBackend::init_schema`] before any other operation.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store after validating an existing database file
    ///
    /// Checks the SQLite header so a corrupted or foreign file produces an
    /// actionable error instead of a failed query later.
    ///
    /// # Arguments
    /// * `path` - Path to the database file
    /// * `create_if_missing` - If false, error when the file does not exist
    pub fn new_with_validation(path: impl Into<String>, create_if_missing: bool) -> Result<Self> {
        let path = path.into();
        Self::validate_database_file(&path, !create_if_missing)?;
        Ok(Self { path })
    }

    /// Validate the database file before opening
    ///
    /// Returns Ok(()) when the file is a valid SQLite database, or does not
    /// exist and `must_exist` is false.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<()> {
        use std::path::Path;

        let path = Path::new(db_path);
        if !path.exists() {
            if must_exist {
                return Err(SalesSightError::Database(format!(
                    "Database file not found at '{}'. Run 'salessight init' first or check your configuration.",
                    db_path
                )));
            }
            return Ok(());
        }

        // SQLite files start with "SQLite format 3\0" (16 bytes)
        let bytes = std::fs::read(path).map_err(|e| {
            SalesSightError::Database(format!("Cannot read database file at '{}': {}", db_path, e))
        })?;
        if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
            return Err(SalesSightError::Database(format!(
                "Database file at '{}' is corrupted or not a valid SQLite database. Delete it and run 'salessight init' to reinitialize.",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(())
    }

    /// Open a fresh connection for one operation
    async fn connect(&self) -> Result<Connection> {
        let db = Builder::new_local(&self.path)
            .build()
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| SalesSightError::Database(format!("Failed to get connection: {}", e)))?;

        // Referenced-user deletion must clear feedback.user_id, not cascade
        conn.execute("PRAGMA foreign_keys = ON", params![])
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to enable foreign keys: {}", e)))?;

        Ok(conn)
    }

    /// Convert a feedback row (id, user_id, feature_name, effectiveness_score,
    /// comments, timestamp) to a FeedbackRecord
    fn row_to_feedback(row: &Row) -> Result<FeedbackRecord> {
        let id: i64 = row
            .get(0)
            .map_err(|e| SalesSightError::Database(e.to_string()))?;

        let user_id = match row
            .get_value(1)
            .map_err(|e| SalesSightError::Database(e.to_string()))?
        {
            Value::Integer(i) => Some(UserId(i)),
            _ => None,
        };

        let feature_name: String = row
            .get(2)
            .map_err(|e| SalesSightError::Database(e.to_string()))?;

        let raw_score: i64 = row
            .get(3)
            .map_err(|e| SalesSightError::Database(e.to_string()))?;
        let score = Rating::from_score(raw_score)?;

        let comments = match row
            .get_value(4)
            .map_err(|e| SalesSightError::Database(e.to_string()))?
        {
            Value::Text(s) => Some(s),
            _ => None,
        };

        let raw_ts: String = row
            .get(5)
            .map_err(|e| SalesSightError::Database(e.to_string()))?;
        let submitted_at = parse_store_timestamp(&raw_ts)?;

        Ok(FeedbackRecord {
            id,
            user_id,
            feature_name,
            score,
            comments,
            submitted_at,
        })
    }
}

/// Parse the `CURRENT_TIMESTAMP` text format SQLite writes
fn parse_store_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| SalesSightError::Database(format!("Invalid timestamp '{}': {}", raw, e)))?;
    Ok(naive.and_utc())
}

#[async_trait]
impl StorageBackend for LibsqlStore {
    async fn init_schema(&self) -> Result<()> {
        let conn = self.connect().await?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )
            "#,
            params![],
        )
        .await
        .map_err(|e| SalesSightError::Database(format!("Failed to create users table: {}", e)))?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                feature_name TEXT NOT NULL CHECK (length(feature_name) > 0),
                effectiveness_score INTEGER NOT NULL,
                comments TEXT,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            params![],
        )
        .await
        .map_err(|e| {
            SalesSightError::Database(format!("Failed to create feedback table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_feedback_user ON feedback(user_id)",
            params![],
        )
        .await
        .map_err(|e| SalesSightError::Database(format!("Failed to create index: {}", e)))?;

        info!("Database schema initialized at {}", self.path);
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId> {
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO users (username, password) VALUES (?, ?)",
            params![username, password_hash],
        )
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") {
                SalesSightError::AlreadyExists(username.to_string())
            } else {
                SalesSightError::Database(format!("Failed to create user: {}", msg))
            }
        })?;

        let id = conn.last_insert_rowid();
        debug!("Created user '{}' with id {}", username, id);
        Ok(UserId(id))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, username FROM users WHERE username = ?",
                params![username],
            )
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to query user: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to read row: {}", e)))?;

        match row {
            Some(row) => {
                let id: i64 = row
                    .get(0)
                    .map_err(|e| SalesSightError::Database(e.to_string()))?;
                let username: String = row
                    .get(1)
                    .map_err(|e| SalesSightError::Database(e.to_string()))?;
                Ok(Some(User {
                    id: UserId(id),
                    username,
                }))
            }
            None => Ok(None),
        }
    }

    async fn verify_credentials(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, username FROM users WHERE username = ? AND password = ?",
                params![username, password_hash],
            )
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to query user: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to read row: {}", e)))?;

        match row {
            Some(row) => {
                let id: i64 = row
                    .get(0)
                    .map_err(|e| SalesSightError::Database(e.to_string()))?;
                let username: String = row
                    .get(1)
                    .map_err(|e| SalesSightError::Database(e.to_string()))?;
                Ok(Some(User {
                    id: UserId(id),
                    username,
                }))
            }
            None => Ok(None),
        }
    }

    async fn insert_feedback(
        &self,
        user_id: Option<UserId>,
        feature_name: &str,
        score: i64,
        comments: Option<&str>,
    ) -> Result<()> {
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO feedback (user_id, feature_name, effectiveness_score, comments) VALUES (?, ?, ?, ?)",
            params![
                user_id.map(|u| u.0),
                feature_name,
                score,
                comments.map(|c| c.to_string()),
            ],
        )
        .await
        .map_err(|e| SalesSightError::Database(format!("Failed to insert feedback: {}", e)))?;

        debug!(
            "Stored feedback for '{}' (score {}, user {:?})",
            feature_name, score, user_id
        );
        Ok(())
    }

    async fn feedback_for_user(&self, username: &str) -> Result<Vec<FeedbackRecord>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT f.id, f.user_id, f.feature_name, f.effectiveness_score, f.comments, f.timestamp
                FROM feedback f
                JOIN users u ON f.user_id = u.id
                WHERE u.username = ?
                ORDER BY f.timestamp DESC, f.id DESC
                "#,
                params![username],
            )
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to query feedback: {}", e)))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to read row: {}", e)))?
        {
            records.push(Self::row_to_feedback(&row)?);
        }

        Ok(records)
    }

    async fn all_feedback(&self) -> Result<Vec<(Option<String>, FeedbackRecord)>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT f.id, f.user_id, f.feature_name, f.effectiveness_score, f.comments, f.timestamp, u.username
                FROM feedback f
                LEFT JOIN users u ON f.user_id = u.id
                ORDER BY f.timestamp DESC, f.id DESC
                "#,
                params![],
            )
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to query feedback: {}", e)))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| SalesSightError::Database(format!("Failed to read row: {}", e)))?
        {
            let record = Self::row_to_feedback(&row)?;
            let username = match row
                .get_value(6)
                .map_err(|e| SalesSightError::Database(e.to_string()))?
            {
                Value::Text(s) => Some(s),
                _ => None,
            };
            records.push((username, record));
        }

        Ok(records)
    }
}
