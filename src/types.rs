//! Core data types for SalesSight
//!
//! This module defines the fundamental data structures used throughout the
//! application: users, feedback records, analysis instances, and the sales
//! figures the analysis pages operate on.

use crate::error::{Result, SalesSightError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for users
///
/// Wraps the store-assigned integer key to provide type safety and prevent
/// mixing user ids with other integer identifiers in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user account
///
/// Owned by the authentication layer; the feedback subsystem only reads the
/// id when attributing a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// Unique identifier for one analysis run
///
/// An analysis instance delimits the window in which exactly one feedback
/// submission is accepted. A fresh id is minted every time the user runs
/// the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(pub Uuid);

impl AnalysisId {
    /// Create a new random analysis id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effectiveness rating offered by the feedback form
///
/// The form presents exactly these five choices, so an out-of-range score is
/// unrepresentable through the UI. Any raw numeric path must go through
/// [`Rating::from_score`], which rejects values outside 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    VeryPoor,
    Poor,
    Average,
    Good,
    Excellent,
}

impl Rating {
    /// All choices in ascending score order, for rendering the selector
    pub const ALL: [Rating; 5] = [
        Rating::VeryPoor,
        Rating::Poor,
        Rating::Average,
        Rating::Good,
        Rating::Excellent,
    ];

    /// Numeric score persisted to the store (1-5)
    pub fn score(&self) -> i64 {
        match self {
            Rating::VeryPoor => 1,
            Rating::Poor => 2,
            Rating::Average => 3,
            Rating::Good => 4,
            Rating::Excellent => 5,
        }
    }

    /// Parse a raw score, rejecting values outside the 1-5 range
    pub fn from_score(score: i64) -> Result<Self> {
        match score {
            1 => Ok(Rating::VeryPoor),
            2 => Ok(Rating::Poor),
            3 => Ok(Rating::Average),
            4 => Ok(Rating::Good),
            5 => Ok(Rating::Excellent),
            other => Err(SalesSightError::InvalidRating(other)),
        }
    }

    /// Human-readable label matching the slider legend
    pub fn label(&self) -> &'static str {
        match self {
            Rating::VeryPoor => "Very Poor",
            Rating::Poor => "Poor",
            Rating::Average => "Average",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
        }
    }

    /// Next higher choice, saturating at Excellent
    pub fn next(&self) -> Self {
        Rating::from_score((self.score() + 1).min(5)).unwrap_or(Rating::Excellent)
    }

    /// Next lower choice, saturating at Very Poor
    pub fn prev(&self) -> Self {
        Rating::from_score((self.score() - 1).max(1)).unwrap_or(Rating::VeryPoor)
    }
}

impl Default for Rating {
    /// The form opens on the midpoint choice
    fn default() -> Self {
        Rating::Average
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.score(), self.label())
    }
}

/// One persisted feedback submission
///
/// Immutable after creation; `id` and `submitted_at` are assigned by the
/// store. `user_id` is nullable because an account may later be removed
/// without destroying historical feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub feature_name: String,
    pub score: Rating,
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One row of loaded sales data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product: Option<String>,
    pub amount: f64,
}

/// KPI summary shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total: f64,
    pub average: f64,
    pub latest: f64,
    /// Change between the last two rows, in percent
    pub growth_pct: f64,
    /// Monthly totals in chronological order, keyed "YYYY-MM"
    pub monthly: Vec<(String, f64)>,
    /// Top products by total sales, descending (at most five)
    pub top_products: Vec<(String, f64)>,
}

/// Forecast horizon offered by the forecasting page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastHorizon {
    Short,
    Medium,
    Long,
}

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 3] = [
        ForecastHorizon::Short,
        ForecastHorizon::Medium,
        ForecastHorizon::Long,
    ];

    /// Number of days projected
    pub fn days(&self) -> usize {
        match self {
            ForecastHorizon::Short => 30,
            ForecastHorizon::Medium => 60,
            ForecastHorizon::Long => 90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ForecastHorizon::Short => "30 Days - Short-term Forecast",
            ForecastHorizon::Medium => "60 Days - Medium-term Forecast",
            ForecastHorizon::Long => "90 Days - Long-term Forecast",
        }
    }
}

impl Default for ForecastHorizon {
    fn default() -> Self {
        ForecastHorizon::Short
    }
}

/// Direction of the fitted sales trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Rising => write!(f, "rising"),
            Trend::Falling => write!(f, "falling"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Result of one forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub horizon: ForecastHorizon,
    /// The actual data points the projection was fitted on
    pub actual: Vec<(NaiveDate, f64)>,
    /// Projected points, one per day of the horizon
    pub projected: Vec<(NaiveDate, f64)>,
    pub trend: Trend,
}
