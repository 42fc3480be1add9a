//! Feedback form state machine
//!
//! Collects a 1-5 effectiveness rating plus optional comments for one
//! application feature, after an analysis run has completed. The form is an
//! explicit state machine owned by the hosting page:
//!
//! Idle -> AnalysisComplete -> AwaitingSubmission -> Submitted
//!
//! `Submitted` is terminal for the current analysis instance; only a new
//! analysis run (via [`FeedbackForm::unlock`]) re-opens the form. The
//! already-submitted guard lives here, in session-scoped state, not in the
//! store: a fresh visit or analysis run legitimately starts a new
//! submission window.

use crate::session::Session;
use crate::storage::StorageBackend;
use crate::types::Rating;
use tracing::{debug, warn};

/// Feature label attached to submissions from the forecasting page
pub const SALES_FORECASTING_FEATURE: &str = "Sales Forecasting";

/// Form lifecycle states, scoped to one page instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// No analysis performed yet; form hidden
    Idle,
    /// Analysis produced results; form visible with default values
    AnalysisComplete,
    /// User has started editing; form visible and editable
    AwaitingSubmission,
    /// Feedback persisted; confirmation shown, further submissions blocked
    Submitted,
}

/// User-facing message produced by a form transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// One record persisted; form now in `Submitted`
    Accepted,
    /// No resolvable user identity; nothing persisted, form stays open
    AuthenticationRequired,
    /// A submission already succeeded for this analysis instance
    AlreadySubmitted,
    /// The form is not open (no completed analysis)
    NotOpen,
    /// The store rejected the write; entered values are preserved
    StorageFailed(String),
}

/// Page-level feedback form
///
/// Owns the widget values (rating, comments) alongside the state machine so
/// a failed submission preserves what the user typed.
#[derive(Debug)]
pub struct FeedbackForm {
    feature_name: String,
    state: FormState,
    rating: Rating,
    comments: String,
    notice: Option<Notice>,
}

impl FeedbackForm {
    /// Create a hidden form for the given feature
    pub fn new(feature_name: impl Into<String>) -> Self {
        Self {
            feature_name: feature_name.into(),
            state: FormState::Idle,
            rating: Rating::default(),
            comments: String::new(),
            notice: None,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn feature_name(&self) -> &str {
        &self.feature_name
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Whether the form is visible and accepting edits
    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            FormState::AnalysisComplete | FormState::AwaitingSubmission
        )
    }

    /// Open a fresh submission cycle after an analysis run completes
    ///
    /// Re-arms the already-submitted guard and resets the widgets: rating
    /// back to the midpoint, comments cleared.
    pub fn unlock(&mut self) {
        debug!("Feedback form unlocked for '{}'", self.feature_name);
        self.state = FormState::AnalysisComplete;
        self.rating = Rating::default();
        self.comments.clear();
        self.notice = None;
    }

    /// Select a rating choice
    pub fn set_rating(&mut self, rating: Rating) {
        if self.is_open() {
            self.rating = rating;
            self.state = FormState::AwaitingSubmission;
        }
    }

    /// Move the rating selection one choice up
    pub fn rating_up(&mut self) {
        self.set_rating(self.rating.next());
    }

    /// Move the rating selection one choice down
    pub fn rating_down(&mut self) {
        self.set_rating(self.rating.prev());
    }

    /// Append a character to the comments field
    pub fn push_comment_char(&mut self, c: char) {
        if self.is_open() {
            self.comments.push(c);
            self.state = FormState::AwaitingSubmission;
        }
    }

    /// Delete the last character of the comments field
    pub fn pop_comment_char(&mut self) {
        if self.is_open() {
            self.comments.pop();
            self.state = FormState::AwaitingSubmission;
        }
    }

    /// Attempt to persist the current form values
    ///
    /// Gates, in order: the form must be open; a previous submission for
    /// this analysis instance blocks; the session must resolve to a user
    /// id (read-through cache, store fallback); then the insert must
    /// succeed. On storage failure the form stays open with the entered
    /// values intact and the cause in the notice. On success the widgets
    /// reset and the state becomes `Submitted`.
    pub async fn submit(
        &mut self,
        session: &mut Session,
        store: &dyn StorageBackend,
    ) -> SubmitOutcome {
        match self.state {
            FormState::Idle => return SubmitOutcome::NotOpen,
            FormState::Submitted => {
                self.notice = Some(Notice {
                    kind: NoticeKind::Warning,
                    text: "Feedback already submitted for this analysis run.".to_string(),
                });
                return SubmitOutcome::AlreadySubmitted;
            }
            FormState::AnalysisComplete | FormState::AwaitingSubmission => {}
        }

        let user_id = match session.current_user_id(store).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Identity resolution failed: {}", e);
                self.notice = Some(Notice {
                    kind: NoticeKind::Error,
                    text: format!("Failed to submit feedback: {}", e),
                });
                return SubmitOutcome::StorageFailed(e.to_string());
            }
        };

        let Some(user_id) = user_id else {
            self.notice = Some(Notice {
                kind: NoticeKind::Warning,
                text: "Please log in to submit feedback.".to_string(),
            });
            return SubmitOutcome::AuthenticationRequired;
        };

        let trimmed = self.comments.trim();
        let comments = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        };

        match store
            .insert_feedback(
                Some(user_id),
                &self.feature_name,
                self.rating.score(),
                comments,
            )
            .await
        {
            Ok(()) => {
                debug!(
                    "Feedback accepted for '{}' from user {}",
                    self.feature_name, user_id
                );
                self.state = FormState::Submitted;
                self.rating = Rating::default();
                self.comments.clear();
                self.notice = Some(Notice {
                    kind: NoticeKind::Success,
                    text: "Thank you for your feedback! We appreciate it.".to_string(),
                });
                SubmitOutcome::Accepted
            }
            Err(e) => {
                warn!("Feedback insert failed: {}", e);
                self.notice = Some(Notice {
                    kind: NoticeKind::Error,
                    text: format!("Failed to submit feedback: {}", e),
                });
                SubmitOutcome::StorageFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SalesSightError};
    use crate::storage::libsql::LibsqlStore;
    use crate::types::{FeedbackRecord, User, UserId};
    use async_trait::async_trait;
    use tempfile::TempDir;

    async fn test_store() -> (TempDir, LibsqlStore) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let store = LibsqlStore::new(db_path.to_str().unwrap());
        store.init_schema().await.unwrap();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_submit_rejected_while_idle() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();
        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);

        assert_eq!(form.state(), FormState::Idle);
        let outcome = form.submit(&mut session, &store).await;
        assert_eq!(outcome, SubmitOutcome::NotOpen);
        assert!(store.all_feedback().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_editing_moves_to_awaiting_submission() {
        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        form.unlock();
        assert_eq!(form.state(), FormState::AnalysisComplete);
        assert_eq!(form.rating(), Rating::Average);

        form.rating_up();
        assert_eq!(form.state(), FormState::AwaitingSubmission);
        assert_eq!(form.rating(), Rating::Good);

        form.push_comment_char('x');
        assert_eq!(form.comments(), "x");
        form.pop_comment_char();
        assert_eq!(form.comments(), "");
    }

    #[tokio::test]
    async fn test_widgets_inert_while_hidden() {
        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        form.rating_up();
        form.push_comment_char('x');
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(form.rating(), Rating::Average);
        assert_eq!(form.comments(), "");
    }

    #[tokio::test]
    async fn test_alice_submits_excellent_with_no_comments() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();
        let alice = store
            .create_user("alice", "hash")
            .await
            .unwrap();
        session.log_in("alice");

        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        session.begin_analysis();
        form.unlock();
        form.set_rating(Rating::Excellent);

        let outcome = form.submit(&mut session, &store).await;
        assert_eq!(outcome, SubmitOutcome::Accepted);
        assert_eq!(form.state(), FormState::Submitted);
        assert_eq!(form.notice().unwrap().kind, NoticeKind::Success);

        // widgets reset for visual cleanliness
        assert_eq!(form.rating(), Rating::Average);
        assert_eq!(form.comments(), "");

        let rows = store.feedback_for_user("alice").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, Some(alice));
        assert_eq!(rows[0].feature_name, SALES_FORECASTING_FEATURE);
        assert_eq!(rows[0].score, Rating::Excellent);
        assert_eq!(rows[0].comments, None);
    }

    #[tokio::test]
    async fn test_resubmission_blocked_until_new_analysis() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();
        store.create_user("alice", "hash").await.unwrap();
        session.log_in("alice");

        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        session.begin_analysis();
        form.unlock();
        form.set_rating(Rating::Good);
        assert_eq!(
            form.submit(&mut session, &store).await,
            SubmitOutcome::Accepted
        );

        // Second attempt in the same analysis instance: no second row
        assert_eq!(
            form.submit(&mut session, &store).await,
            SubmitOutcome::AlreadySubmitted
        );
        assert_eq!(store.feedback_for_user("alice").await.unwrap().len(), 1);

        // A new analysis run re-opens submission
        session.begin_analysis();
        form.unlock();
        form.set_rating(Rating::Poor);
        assert_eq!(
            form.submit(&mut session, &store).await,
            SubmitOutcome::Accepted
        );
        assert_eq!(store.feedback_for_user("alice").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_anonymous_submission_persists_nothing() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();

        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        form.unlock();
        form.set_rating(Rating::Excellent);
        form.push_comment_char('!');

        let outcome = form.submit(&mut session, &store).await;
        assert_eq!(outcome, SubmitOutcome::AuthenticationRequired);
        assert!(store.all_feedback().await.unwrap().is_empty());

        // Form stays open with values preserved
        assert!(form.is_open());
        assert_eq!(form.rating(), Rating::Excellent);
        assert_eq!(form.comments(), "!");
        assert_eq!(form.notice().unwrap().kind, NoticeKind::Warning);
    }

    #[tokio::test]
    async fn test_comments_are_trimmed_to_null() {
        let (_guard, store) = test_store().await;
        let mut session = Session::new();
        store.create_user("alice", "hash").await.unwrap();
        session.log_in("alice");

        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        form.unlock();
        for c in "   ".chars() {
            form.push_comment_char(c);
        }
        assert_eq!(
            form.submit(&mut session, &store).await,
            SubmitOutcome::Accepted
        );

        let rows = store.feedback_for_user("alice").await.unwrap();
        assert_eq!(rows[0].comments, None);
    }

    /// Store double whose writes always fail, for the error-recovery path
    struct FailingStore {
        user: User,
    }

    #[async_trait]
    impl crate::storage::StorageBackend for FailingStore {
        async fn init_schema(&self) -> Result<()> {
            Ok(())
        }

        async fn create_user(&self, _username: &str, _password_hash: &str) -> Result<UserId> {
            Err(SalesSightError::Database("disk full".to_string()))
        }

        async fn find_user(&self, username: &str) -> Result<Option<User>> {
            if username == self.user.username {
                Ok(Some(self.user.clone()))
            } else {
                Ok(None)
            }
        }

        async fn verify_credentials(
            &self,
            _username: &str,
            _password_hash: &str,
        ) -> Result<Option<User>> {
            Ok(None)
        }

        async fn insert_feedback(
            &self,
            _user_id: Option<UserId>,
            _feature_name: &str,
            _score: i64,
            _comments: Option<&str>,
        ) -> Result<()> {
            Err(SalesSightError::Database("disk full".to_string()))
        }

        async fn feedback_for_user(&self, _username: &str) -> Result<Vec<FeedbackRecord>> {
            Ok(Vec::new())
        }

        async fn all_feedback(&self) -> Result<Vec<(Option<String>, FeedbackRecord)>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_storage_failure_preserves_entered_values() {
        let store = FailingStore {
            user: User {
                id: UserId(7),
                username: "alice".to_string(),
            },
        };
        let mut session = Session::new();
        session.log_in("alice");

        let mut form = FeedbackForm::new(SALES_FORECASTING_FEATURE);
        form.unlock();
        form.set_rating(Rating::Good);
        for c in "great tool".chars() {
            form.push_comment_char(c);
        }

        let outcome = form.submit(&mut session, &store).await;
        assert!(matches!(outcome, SubmitOutcome::StorageFailed(_)));

        // Still open, values intact, cause surfaced
        assert_eq!(form.state(), FormState::AwaitingSubmission);
        assert_eq!(form.rating(), Rating::Good);
        assert_eq!(form.comments(), "great tool");
        let notice = form.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.text.contains("disk full"));
    }
}
