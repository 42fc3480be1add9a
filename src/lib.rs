//! SalesSight - Interactive Sales Analytics
//!
//! A terminal application for exploring sales data: user accounts backed by
//! a local SQLite store, CSV import with KPI summaries, a naive trend
//! forecast, and a per-analysis feedback form that records how effective
//! users found the forecasting feature.
//!
//! # Architecture
//!
//! The crate is organized into several layers:
//! - **Types**: Core data structures (User, FeedbackRecord, Rating, ...)
//! - **Storage**: The libSQL backend behind the `StorageBackend` trait
//! - **Session**: Per-visit state and identity resolution with caching
//! - **Feedback**: The form state machine gating one submission per analysis
//! - **Analysis**: CSV loading, KPI aggregation, and forecasting
//! - **TUI**: The ratatui front end tying the pages together
//!
//! # Example
//!
//! ```ignore
//! use salessight_core::{FeedbackForm, LibsqlStore, Session, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = LibsqlStore::new("salessight.db");
//!     store.init_schema().await?;
//!
//!     let mut session = Session::new();
//!     session.log_in("alice");
//!
//!     let mut form = FeedbackForm::new("Sales Forecasting");
//!     session.begin_analysis();
//!     form.unlock();
//!     form.submit(&mut session, &store).await;
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod auth;
pub mod config;
pub mod error;
pub mod feedback;
pub mod session;
pub mod storage;
pub mod tui;
pub mod types;

// Re-export commonly used types
pub use config::Settings;
pub use error::{Result, SalesSightError};
pub use feedback::{FeedbackForm, FormState, SubmitOutcome, SALES_FORECASTING_FEATURE};
pub use session::Session;
pub use storage::{libsql::LibsqlStore, StorageBackend};
pub use types::{
    AnalysisId, FeedbackRecord, Forecast, ForecastHorizon, Rating, SalesRecord, SalesSummary,
    Trend, User, UserId,
};
