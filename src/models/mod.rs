use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Axis padding below the global minimum price (multiplicative).
pub const PRICE_PAD_LOW: f64 = 0.85;
/// Axis padding above the global maximum price (multiplicative).
pub const PRICE_PAD_HIGH: f64 = 1.15;

// ── Series point ──────────────────────────────────────────────────────────────

/// One (trade date, closing price) observation. Immutable once loaded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub close: f64,
}

// ── Company series ────────────────────────────────────────────────────────────

/// One company's full price history, sorted ascending by date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanySeries {
    pub name: String,
    /// Hex color ("#RRGGBB") for this company's line/marker/label.
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

impl CompanySeries {
    /// The subsequence with `date <= cutoff`. Empty when the series starts
    /// after the cutoff. Points are sorted, so this is a binary search.
    pub fn prefix(&self, cutoff: NaiveDate) -> &[SeriesPoint] {
        let end = self.points.partition_point(|p| p.date <= cutoff);
        &self.points[..end]
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// All company series plus the global extrema needed to size the chart.
/// Built once at startup, read-only afterwards. Company order = load order,
/// which drives z-order, legend order and panel order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub companies: Vec<CompanySeries>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub min_price: f64,
    pub max_price: f64,
}

impl Dataset {
    /// Merge loaded series into a Dataset. Returns `None` when there are no
    /// companies or no points at all — the caller treats that as fatal.
    pub fn from_companies(companies: Vec<CompanySeries>) -> Option<Self> {
        let mut min_date: Option<NaiveDate> = None;
        let mut max_date: Option<NaiveDate> = None;
        let mut min_price = f64::INFINITY;
        let mut max_price = f64::NEG_INFINITY;

        for series in &companies {
            for p in &series.points {
                min_date = Some(min_date.map_or(p.date, |d| d.min(p.date)));
                max_date = Some(max_date.map_or(p.date, |d| d.max(p.date)));
                min_price = min_price.min(p.close);
                max_price = max_price.max(p.close);
            }
        }

        Some(Self {
            companies,
            min_date: min_date?,
            max_date: max_date?,
            min_price,
            max_price,
        })
    }

    /// Whole days between the global min and max date.
    pub fn span_days(&self) -> i64 {
        (self.max_date - self.min_date).num_days()
    }

    pub fn price_span(&self) -> f64 {
        self.max_price - self.min_price
    }

    /// Y-axis limits: 15% below the global min, 15% above the global max.
    pub fn price_axis_bounds(&self) -> (f64, f64) {
        (self.min_price * PRICE_PAD_LOW, self.max_price * PRICE_PAD_HIGH)
    }

    pub fn point_count(&self) -> usize {
        self.companies.iter().map(|c| c.points.len()).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(name: &str, points: &[(NaiveDate, f64)]) -> CompanySeries {
        CompanySeries {
            name: name.to_string(),
            color: "#FF6B6B".to_string(),
            points: points
                .iter()
                .map(|&(date, close)| SeriesPoint { date, close })
                .collect(),
        }
    }

    #[test]
    fn extrema_span_all_series() {
        let ds = Dataset::from_companies(vec![
            series("A", &[(d(2024, 1, 1), 10.0), (d(2024, 1, 10), 30.0)]),
            series("B", &[(d(2023, 12, 20), 5.0), (d(2024, 2, 1), 12.0)]),
        ])
        .unwrap();

        assert_eq!(ds.min_date, d(2023, 12, 20));
        assert_eq!(ds.max_date, d(2024, 2, 1));
        assert_eq!(ds.min_price, 5.0);
        assert_eq!(ds.max_price, 30.0);
        assert_eq!(ds.span_days(), 43);
        assert_eq!(ds.point_count(), 4);
    }

    #[test]
    fn axis_bounds_pad_15_percent() {
        let ds = Dataset::from_companies(vec![series(
            "A",
            &[(d(2024, 1, 1), 100.0), (d(2024, 1, 2), 200.0)],
        )])
        .unwrap();

        let (lo, hi) = ds.price_axis_bounds();
        assert!((lo - 85.0).abs() < 1e-9);
        assert!((hi - 230.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(Dataset::from_companies(vec![]).is_none());
        // A company with zero points doesn't count either.
        assert!(Dataset::from_companies(vec![series("A", &[])]).is_none());
    }

    #[test]
    fn prefix_is_inclusive_binary_search() {
        let s = series(
            "A",
            &[
                (d(2024, 1, 1), 1.0),
                (d(2024, 1, 5), 2.0),
                (d(2024, 1, 10), 3.0),
            ],
        );

        assert_eq!(s.prefix(d(2024, 1, 7)).len(), 2);
        assert_eq!(s.prefix(d(2024, 1, 1)).len(), 1);
        assert_eq!(s.prefix(d(2024, 1, 10)).len(), 3);
        assert!(s.prefix(d(2023, 12, 31)).is_empty());
    }
}
