//! Naive sales forecasting
//!
//! Fits a least-squares linear trend over the last 30 days of daily
//! aggregated actuals and projects it across the chosen horizon. Projected
//! values are clamped to a band around the last actual value and smoothed
//! with a moving average, so a steep fitted slope cannot produce runaway
//! numbers on a short history.

use crate::config::ForecastSettings;
use crate::error::{Result, SalesSightError};
use crate::types::{Forecast, ForecastHorizon, SalesRecord, Trend};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// How many trailing days of actuals the trend is fitted on
const FIT_WINDOW_DAYS: usize = 30;

/// Fraction of the mean below which a fitted slope counts as stable
const STABLE_BAND: f64 = 0.05;

/// Run a forecast over the loaded records
///
/// `product` restricts the fit to one product when set. Records are
/// aggregated per day before fitting.
pub fn run_forecast(
    records: &[SalesRecord],
    horizon: ForecastHorizon,
    product: Option<&str>,
    settings: &ForecastSettings,
) -> Result<Forecast> {
    let filtered: Vec<&SalesRecord> = match product {
        Some(name) => records
            .iter()
            .filter(|r| r.product.as_deref() == Some(name))
            .collect(),
        None => records.iter().collect(),
    };

    if filtered.is_empty() {
        return Err(SalesSightError::DataImport(match product {
            Some(name) => format!("No sales data found for '{}'", name),
            None => "No sales data loaded".to_string(),
        }));
    }

    // Daily aggregation, then the trailing fit window
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in filtered {
        *daily.entry(record.date).or_insert(0.0) += record.amount;
    }
    let mut actual: Vec<(NaiveDate, f64)> = daily.into_iter().collect();
    if actual.len() > FIT_WINDOW_DAYS {
        actual = actual.split_off(actual.len() - FIT_WINDOW_DAYS);
    }

    if actual.len() < 2 {
        return Err(SalesSightError::DataImport(
            "Not enough data to fit a trend: need at least two days of sales".to_string(),
        ));
    }

    let values: Vec<f64> = actual.iter().map(|(_, v)| *v).collect();
    let (intercept, slope) = fit_line(&values);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let last_actual = *values.last().unwrap_or(&0.0);

    debug!(
        "Fitted trend over {} day(s): intercept {:.2}, slope {:.2}",
        values.len(),
        intercept,
        slope
    );

    let days = horizon.days();
    let mut projected: Vec<f64> = (0..days)
        .map(|i| intercept + slope * (values.len() + i) as f64)
        .collect();

    clamp_to_band(&mut projected, last_actual, settings.max_deviation);
    smooth(&mut projected, settings.smoothing_window);

    let last_date = actual.last().map(|(d, _)| *d).unwrap_or_default();
    let projected: Vec<(NaiveDate, f64)> = projected
        .into_iter()
        .enumerate()
        .map(|(i, v)| (last_date + Duration::days(i as i64 + 1), v))
        .collect();

    let trend = classify_trend(slope, days, mean);

    Ok(Forecast {
        horizon,
        actual,
        projected,
        trend,
    })
}

/// Least-squares fit of y = intercept + slope * x over x = 0..n
fn fit_line(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }

    let slope = if den == 0.0 { 0.0 } else { num / den };
    (mean_y - slope * mean_x, slope)
}

/// Clamp projected values to last_actual * (1 +/- max_deviation)
fn clamp_to_band(values: &mut [f64], last_actual: f64, max_deviation: f64) {
    let a = last_actual * (1.0 - max_deviation);
    let b = last_actual * (1.0 + max_deviation);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    for v in values.iter_mut() {
        *v = v.clamp(lo, hi);
    }
}

/// Centered moving average over the available neighbors
fn smooth(values: &mut Vec<f64>, window: usize) {
    if window < 2 || values.len() < 2 {
        return;
    }
    let half = window / 2;
    let smoothed: Vec<f64> = (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            values[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect();
    *values = smoothed;
}

/// A slope is stable when its change over the horizon stays inside a band
/// around the mean of the actuals
fn classify_trend(slope: f64, horizon_days: usize, mean: f64) -> Trend {
    let span_change = slope * horizon_days as f64;
    if span_change.abs() < STABLE_BAND * mean.abs().max(f64::EPSILON) {
        Trend::Stable
    } else if slope > 0.0 {
        Trend::Rising
    } else {
        Trend::Falling
    }
}

/// Canned recommended actions per trend, shown under the forecast chart
pub fn recommendations(trend: Trend) -> &'static [&'static str] {
    match trend {
        Trend::Rising => &[
            "Increase inventory ahead of projected demand growth",
            "Hold pricing steady; avoid discounting into rising demand",
            "Scale the marketing channels already driving the upturn",
        ],
        Trend::Falling => &[
            "Reduce replenishment orders to avoid overstock",
            "Run targeted promotions on the weakest product lines",
            "Review pricing against competitors before volumes drop further",
        ],
        Trend::Stable => &[
            "Keep inventory at current turnover levels",
            "Test small price or bundle changes to find upside",
            "Invest in retention; stable demand rewards repeat buyers",
        ],
    }
}
