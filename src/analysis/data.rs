//! Sales CSV loading and KPI aggregation
//!
//! Columns are discovered from the header, case-insensitively: a date
//! column (name containing "date"), a sales column (name containing
//! "sales", "revenue", or "amount"), and an optional product column.
//! Accepted date formats are `YYYY-MM-DD` and `MM/DD/YYYY`. Rows that fail
//! to parse are dropped, matching the upload page's documented contract.
//! Fields must not contain commas; the loader does not handle quoting.

use crate::error::{Result, SalesSightError};
use crate::types::{SalesRecord, SalesSummary};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Load sales records from a CSV file
pub fn load_sales_csv(path: &Path) -> Result<Vec<SalesRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SalesSightError::DataImport(format!("Cannot read '{}': {}", path.display(), e))
    })?;

    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| SalesSightError::DataImport("File is empty".to_string()))?;

    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .collect();

    let date_idx = columns
        .iter()
        .position(|c| c.contains("date"))
        .ok_or_else(|| SalesSightError::DataImport("Missing required column: Date".to_string()))?;
    let sales_idx = columns
        .iter()
        .position(|c| c.contains("sales") || c.contains("revenue") || c.contains("amount"))
        .ok_or_else(|| SalesSightError::DataImport("Missing required column: Sales".to_string()))?;
    let product_idx = columns.iter().position(|c| c.contains("product"));

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        let (Some(raw_date), Some(raw_amount)) = (fields.get(date_idx), fields.get(sales_idx))
        else {
            dropped += 1;
            continue;
        };

        let (Some(date), Ok(amount)) = (parse_date(raw_date), raw_amount.parse::<f64>()) else {
            dropped += 1;
            continue;
        };

        let product = product_idx
            .and_then(|i| fields.get(i))
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string());

        records.push(SalesRecord {
            date,
            product,
            amount,
        });
    }

    if dropped > 0 {
        warn!("Dropped {} unparseable row(s) from {}", dropped, path.display());
    }

    if records.is_empty() {
        return Err(SalesSightError::DataImport(
            "No usable rows: check the Date and Sales columns".to_string(),
        ));
    }

    records.sort_by_key(|r| r.date);
    debug!("Loaded {} sales rows from {}", records.len(), path.display());
    Ok(records)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Compute the dashboard KPI set over loaded records
///
/// Records are assumed date-sorted, as [`load_sales_csv`] returns them.
pub fn summarize(records: &[SalesRecord]) -> SalesSummary {
    let total: f64 = records.iter().map(|r| r.amount).sum();
    let average = if records.is_empty() {
        0.0
    } else {
        total / records.len() as f64
    };
    let latest = records.last().map(|r| r.amount).unwrap_or(0.0);

    let growth_pct = match records.len() {
        0 | 1 => 0.0,
        n => {
            let prev = records[n - 2].amount;
            if prev == 0.0 {
                0.0
            } else {
                (records[n - 1].amount - prev) / prev * 100.0
            }
        }
    };

    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *by_month
            .entry(record.date.format("%Y-%m").to_string())
            .or_insert(0.0) += record.amount;
    }
    let monthly: Vec<(String, f64)> = by_month.into_iter().collect();

    let mut by_product: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        if let Some(product) = &record.product {
            *by_product.entry(product.as_str()).or_insert(0.0) += record.amount;
        }
    }
    let mut top_products: Vec<(String, f64)> = by_product
        .into_iter()
        .map(|(name, amount)| (name.to_string(), amount))
        .collect();
    top_products.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    top_products.truncate(5);

    SalesSummary {
        total,
        average,
        latest,
        growth_pct,
        monthly,
        top_products,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_basic_csv() {
        let file = write_csv(
            "Date,Product,Sales\n\
             2026-01-02,Widget,100.5\n\
             2026-01-01,Gadget,50\n",
        );
        let records = load_sales_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        // sorted by date
        assert_eq!(records[0].product.as_deref(), Some("Gadget"));
        assert_eq!(records[1].amount, 100.5);
    }

    #[test]
    fn test_load_accepts_us_dates_and_alternate_headers() {
        let file = write_csv(
            "OrderDate,Revenue\n\
             01/15/2026,10\n\
             01/16/2026,20\n",
        );
        let records = load_sales_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.product.is_none()));
    }

    #[test]
    fn test_bad_rows_are_dropped() {
        let file = write_csv(
            "Date,Sales\n\
             2026-01-01,100\n\
             not-a-date,50\n\
             2026-01-03,not-a-number\n\
             2026-01-04,75\n",
        );
        let records = load_sales_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_columns_error() {
        let file = write_csv("Date,Quantity\n2026-01-01,3\n");
        let err = load_sales_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("Sales"));

        let file = write_csv("Day,Sales\n2026-01-01,3\n");
        let err = load_sales_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("Date"));
    }

    #[test]
    fn test_all_rows_bad_is_an_error() {
        let file = write_csv("Date,Sales\nnope,nope\n");
        assert!(matches!(
            load_sales_csv(file.path()).unwrap_err(),
            SalesSightError::DataImport(_)
        ));
    }

    #[test]
    fn test_missing_file_is_an_import_error() {
        let err = load_sales_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, SalesSightError::DataImport(_)));
    }

    fn record(date: &str, product: Option<&str>, amount: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            product: product.map(String::from),
            amount,
        }
    }

    #[test]
    fn test_summary_kpis() {
        let records = vec![
            record("2026-01-01", Some("Widget"), 100.0),
            record("2026-01-15", Some("Gadget"), 200.0),
            record("2026-02-01", Some("Widget"), 50.0),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.total, 350.0);
        assert!((summary.average - 350.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.latest, 50.0);
        // (50 - 200) / 200 * 100
        assert_eq!(summary.growth_pct, -75.0);

        assert_eq!(
            summary.monthly,
            vec![
                ("2026-01".to_string(), 300.0),
                ("2026-02".to_string(), 50.0)
            ]
        );
        assert_eq!(summary.top_products[0], ("Gadget".to_string(), 200.0));
        assert_eq!(summary.top_products[1], ("Widget".to_string(), 150.0));
    }

    #[test]
    fn test_summary_of_single_row() {
        let records = vec![record("2026-01-01", None, 42.0)];
        let summary = summarize(&records);
        assert_eq!(summary.growth_pct, 0.0);
        assert_eq!(summary.latest, 42.0);
        assert!(summary.top_products.is_empty());
    }
}
