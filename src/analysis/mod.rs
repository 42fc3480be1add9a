//! Sales data loading, KPI aggregation, and forecasting
//!
//! The forecasting step here is the deterministic analysis action whose
//! completion unlocks the feedback form; the form treats it as an opaque
//! trigger.

pub mod data;
pub mod forecast;

pub use data::{load_sales_csv, summarize};
pub use forecast::{recommendations, run_forecast};
