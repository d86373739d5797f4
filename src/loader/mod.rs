//! CSV aggregator: reads each company's price history and merges the
//! survivors into the immutable [`Dataset`].
//!
//! Per-company failures are contained here — a bad file drops that company
//! with a warning and the run continues. Only "nothing loaded at all" is
//! fatal.

use crate::config::{CompanySource, DEFAULT_PALETTE};
use crate::models::{CompanySeries, Dataset, SeriesPoint};
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why one company's source could not be loaded. Contained within the
/// aggregator; never escapes as a run failure.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("no {0:?} column in header")]
    MissingColumn(&'static str),

    #[error("row {row}: unparseable date {value:?}")]
    BadDate { row: usize, value: String },

    #[error("row {row}: unparseable price {value:?}")]
    BadPrice { row: usize, value: String },

    #[error("row {row}: missing field")]
    MissingField { row: usize },

    #[error("no data rows")]
    Empty,
}

/// Zero companies loaded — there is nothing to animate.
#[derive(Debug, Error)]
#[error("no company series loaded; cannot build a chart")]
pub struct EmptyDatasetError;

// ── Field parsers ─────────────────────────────────────────────────────────────

/// Parse a currency-formatted price: strip everything except digits, dot,
/// minus. "$123.45" → 123.45 | "1,234.56" → 1234.56
pub fn parse_price(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

/// Parse dates: ISO, US/EU slashed, or "Feb 20, 2024" style.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%b %d, %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

// ── Header resolution ─────────────────────────────────────────────────────────

/// Find the trade-date and close-price column indices by header name.
/// Accepts "Date" for the former; "Close/Last", "Close" or "Price" for the
/// latter (case-insensitive).
fn resolve_columns(headers: &csv::StringRecord) -> Result<(usize, usize), SourceError> {
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let date_col = lower
        .iter()
        .position(|h| h == "date")
        .ok_or(SourceError::MissingColumn("date"))?;

    let close_col = lower
        .iter()
        .position(|h| h.contains("close") || h.contains("last"))
        .or_else(|| lower.iter().position(|h| h == "price"))
        .ok_or(SourceError::MissingColumn("close"))?;

    Ok((date_col, close_col))
}

// ── Per-company load ──────────────────────────────────────────────────────────

/// Read one company's CSV into a sorted point list. A single bad row fails
/// the whole company — a half-loaded series would draw a misleading line.
pub fn load_company(path: &Path) -> Result<Vec<SeriesPoint>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let (date_col, close_col) = resolve_columns(reader.headers()?)?;

    let mut points = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 2; // 1-based, after the header line
        let record = result?;

        let date_str = record
            .get(date_col)
            .ok_or(SourceError::MissingField { row })?;
        let date = parse_date(date_str).ok_or_else(|| SourceError::BadDate {
            row,
            value: date_str.to_string(),
        })?;

        let close_str = record
            .get(close_col)
            .ok_or(SourceError::MissingField { row })?;
        let close = parse_price(close_str).ok_or_else(|| SourceError::BadPrice {
            row,
            value: close_str.to_string(),
        })?;

        points.push(SeriesPoint { date, close });
    }

    if points.is_empty() {
        return Err(SourceError::Empty);
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}

// ── Aggregate load ────────────────────────────────────────────────────────────

/// Load every configured source, skipping failures, and merge the survivors.
/// Errors only when nothing loads at all.
pub fn load_all(sources: &[CompanySource]) -> Result<Dataset, EmptyDatasetError> {
    let mut companies = Vec::with_capacity(sources.len());

    for (idx, src) in sources.iter().enumerate() {
        debug!("Loading {} from {:?}", src.name, src.path);

        match load_company(&src.path) {
            Ok(points) => {
                info!("{}: {} records loaded", src.name, points.len());
                let color = src
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PALETTE[idx % DEFAULT_PALETTE.len()].to_string());
                companies.push(CompanySeries {
                    name: src.name.clone(),
                    color,
                    points,
                });
            }
            Err(e) => {
                warn!("{}: skipped ({:?}): {}", src.name, src.path, e);
            }
        }
    }

    let dataset = Dataset::from_companies(companies).ok_or(EmptyDatasetError)?;

    info!(
        "{} companies loaded | {} points | {} → {}",
        dataset.companies.len(),
        dataset.point_count(),
        dataset.min_date,
        dataset.max_date,
    );

    Ok(dataset)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn source(name: &str, path: PathBuf) -> CompanySource {
        CompanySource {
            name: name.to_string(),
            path,
            color: None,
        }
    }

    #[test]
    fn test_parse_price_strips_currency() {
        assert_eq!(parse_price("$123.45"), Some(123.45));
        assert_eq!(parse_price("  $610.00 "), Some(610.0));
        assert_eq!(parse_price("1,234.56"), Some(1234.56));
        assert_eq!(parse_price("garbage"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expect = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(parse_date("2024-02-20"), Some(expect));
        assert_eq!(parse_date("02/20/2024"), Some(expect));
        assert_eq!(parse_date("Feb 20, 2024"), Some(expect));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn loads_and_sorts_one_company() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "amd.csv",
            "Date,Close/Last,Volume\n\
             2024-01-10,$30.00,100\n\
             2024-01-01,$10.00,100\n\
             2024-01-05,$20.00,100\n",
        );

        let points = load_company(&path).unwrap();
        assert_eq!(points.len(), 3);
        assert!(points.windows(2).all(|w| w[0].date <= w[1].date));
        assert_eq!(points[0].close, 10.0);
    }

    #[test]
    fn one_bad_row_fails_the_company() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "bad.csv",
            "Date,Close/Last\n2024-01-01,$10.00\n2024-01-02,oops\n",
        );

        match load_company(&path) {
            Err(SourceError::BadPrice { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected BadPrice, got {:?}", other),
        }
    }

    #[test]
    fn missing_close_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "cols.csv", "Date,Volume\n2024-01-01,5\n");

        assert!(matches!(
            load_company(&path),
            Err(SourceError::MissingColumn("close"))
        ));
    }

    #[test]
    fn partial_failure_keeps_the_valid_companies() {
        let dir = tempfile::tempdir().unwrap();
        let good_a = write_csv(dir.path(), "a.csv", "Date,Close/Last\n2024-01-01,$10.00\n");
        let good_b = write_csv(dir.path(), "b.csv", "Date,Close/Last\n2024-01-02,$20.00\n");
        let bad = write_csv(dir.path(), "c.csv", "Date,Close/Last\n2024-01-03,nope\n");
        let missing = dir.path().join("does-not-exist.csv");

        let dataset = load_all(&[
            source("A", good_a),
            source("C", bad),
            source("B", good_b),
            source("M", missing),
        ])
        .unwrap();

        let names: Vec<&str> = dataset.companies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(dataset.min_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(dataset.max_price, 20.0);
    }

    #[test]
    fn zero_loaded_companies_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_csv(dir.path(), "bad.csv", "Date,Close/Last\nnope,$1.00\n");

        let result = load_all(&[source("A", bad), source("B", dir.path().join("nope.csv"))]);
        assert!(result.is_err());
    }

    #[test]
    fn palette_fallback_follows_source_position() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "Date,Close/Last\n2024-01-01,$1.00\n");
        let b = write_csv(dir.path(), "b.csv", "Date,Close/Last\n2024-01-01,$2.00\n");

        let mut src_b = source("B", b);
        src_b.color = Some("#ABCDEF".to_string());

        let dataset = load_all(&[source("A", a), src_b]).unwrap();
        assert_eq!(dataset.companies[0].color, DEFAULT_PALETTE[0]);
        assert_eq!(dataset.companies[1].color, "#ABCDEF");
    }
}
