//! Frame renderer core: maps an animation frame index to a cutoff date and
//! derives the complete visual state for that frame.
//!
//! Pure computation — no I/O, no shared mutable state. The presenter (and the
//! export path) consume the returned [`FrameState`]; rendering the same frame
//! twice yields structurally identical output.

use crate::models::{Dataset, SeriesPoint};
use crate::utils::fmt_usd;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Horizontal label offset from the marker, in days.
pub const LABEL_DAY_OFFSET: i64 = 3;
/// Vertical label offset as a fraction of the global price span.
/// Fixed heuristic to separate overlapping labels; no collision guarantee.
pub const LABEL_PRICE_OFFSET_FRAC: f64 = 0.02;

// ── Visual state ──────────────────────────────────────────────────────────────

/// Floating price tag next to a marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLabel {
    /// Anchor date: marker date + [`LABEL_DAY_OFFSET`].
    pub date: NaiveDate,
    /// Anchor price: marker price + 2% of the global price span.
    pub price: f64,
    /// "$123.40"
    pub text: String,
}

/// Everything drawn for one company in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyVisual {
    pub name: String,
    pub color: String,
    /// The revealed prefix of the series — the visible line path.
    pub path: Vec<SeriesPoint>,
    /// Last revealed point; `None` before the series starts.
    pub marker: Option<SeriesPoint>,
    pub label: Option<PriceLabel>,
}

/// The running current-prices box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPanel {
    /// "Date: 2024-02-20"
    pub header: String,
    /// "NVIDIA: $610.00", one per company with data, in dataset order.
    pub rows: Vec<String>,
}

impl SummaryPanel {
    /// Panel text with a blank spacer line under the header.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(self.header.clone());
        out.push(String::new());
        out.extend(self.rows.iter().cloned());
        out
    }
}

/// Complete description of one frame — every visual element the presenter
/// must (re)draw. Fully derived from `(dataset, frame)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameState {
    pub frame: usize,
    pub cutoff: NaiveDate,
    pub companies: Vec<CompanyVisual>,
    pub panel: SummaryPanel,
}

// ── Animator ──────────────────────────────────────────────────────────────────

/// Frame-to-state mapper over an immutable dataset. Owned by the caller;
/// holds no per-frame state of its own.
pub struct Animator<'a> {
    dataset: &'a Dataset,
    frame_count: usize,
}

impl<'a> Animator<'a> {
    pub fn new(dataset: &'a Dataset, frame_count: usize) -> Self {
        assert!(frame_count > 0, "frame_count must be positive");
        Self {
            dataset,
            frame_count,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Linear map from frame index to calendar date:
    /// `min_date + floor(frame * span_days / frame_count)`.
    ///
    /// Panics when `frame >= frame_count` — that is a driver bug.
    pub fn cutoff_date(&self, frame: usize) -> NaiveDate {
        assert!(
            frame < self.frame_count,
            "frame index {} out of range [0, {})",
            frame,
            self.frame_count
        );

        let span = self.dataset.span_days();
        let offset = frame as i64 * span / self.frame_count as i64;
        self.dataset.min_date + Duration::days(offset)
    }

    /// Build the full visual state for one frame: line path, marker and label
    /// per company, plus the summary panel — one pass over the companies.
    pub fn frame_state(&self, frame: usize) -> FrameState {
        let cutoff = self.cutoff_date(frame);
        let label_rise = self.dataset.price_span() * LABEL_PRICE_OFFSET_FRAC;

        let mut companies = Vec::with_capacity(self.dataset.companies.len());
        let mut rows = Vec::new();

        for series in &self.dataset.companies {
            let path = series.prefix(cutoff).to_vec();
            let marker = path.last().copied();

            let label = marker.map(|last| PriceLabel {
                date: last.date + Duration::days(LABEL_DAY_OFFSET),
                price: last.close + label_rise,
                text: fmt_usd(last.close),
            });

            if let Some(last) = marker {
                rows.push(format!("{}: {}", series.name, fmt_usd(last.close)));
            }

            companies.push(CompanyVisual {
                name: series.name.clone(),
                color: series.color.clone(),
                path,
                marker,
                label,
            });
        }

        FrameState {
            frame,
            cutoff,
            companies,
            panel: SummaryPanel {
                header: format!("Date: {}", cutoff.format("%Y-%m-%d")),
                rows,
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
