use chrono::NaiveDate;
use serde::Serialize;

// ── Raw CSV rows ──────────────────────────────────────────────────────────────

/// One uploaded row: Date, Open, High, Low, Close, Volume (all text).
/// Any of them may be absent when the column is missing or the row is short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub date: Option<String>,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub close: Option<String>,
    pub volume: Option<String>,
}

// ── Cleaned series ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
    /// Percentage change from the previous surviving row (5.0 means +5%).
    pub pct_change: Option<f64>,
}

/// Validated rows sorted ascending by date.
///
/// Only constructed by the cleaner, so the ordering invariant holds for
/// every value in circulation.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct PriceSeries {
    rows: Vec<PricePoint>,
}

impl PriceSeries {
    pub(crate) fn from_sorted(rows: Vec<PricePoint>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));
        Self { rows }
    }

    pub fn rows(&self) -> &[PricePoint] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.rows.last()
    }

    /// The last `n` rows (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first()?.date, self.last()?.date))
    }
}

// ── Event window ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EventWindowResult {
    pub event_date: Option<NaiveDate>,
    pub before_avg: Option<f64>,
    pub after_avg: Option<f64>,
    pub in_range: bool,
    /// Rows strictly before the event that fed `before_avg`.
    pub before: Vec<PricePoint>,
    /// Rows strictly after the event that fed `after_avg`.
    pub after: Vec<PricePoint>,
}

impl EventWindowResult {
    /// No event, or an event outside the series: nothing to average.
    pub fn out_of_range(event_date: Option<NaiveDate>) -> Self {
        Self {
            event_date,
            ..Default::default()
        }
    }
}
