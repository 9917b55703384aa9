//! Event-window analysis: average daily return just before and just after
//! an event date.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::{EventWindowResult, PricePoint, PriceSeries};
use chrono::{NaiveDate, TimeDelta};
use tracing::debug;

/// Stateless calculator; holds only its window parameters.
#[derive(Debug, Clone)]
pub struct EventWindowAnalyzer {
    context_days: i64,
    window_rows: usize,
}

impl Default for EventWindowAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl EventWindowAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            context_days: config.context_days,
            window_rows: config.window_rows,
        }
    }

    /// Compare returns on either side of `event_date`.
    ///
    /// An absent or out-of-range event yields `in_range == false` with no
    /// averages. Only rows within ±`context_days` of the event are
    /// candidates; from those, the last `window_rows` strictly before and the
    /// first `window_rows` strictly after are averaged.
    pub fn evaluate_event(
        &self,
        series: &PriceSeries,
        event_date: Option<NaiveDate>,
    ) -> Result<EventWindowResult, AnalysisError> {
        let (first, last) = series.date_range().ok_or(AnalysisError::EmptySeries)?;

        let Some(event) = event_date else {
            return Ok(EventWindowResult::out_of_range(None));
        };

        if event < first || event > last {
            debug!("Event {} outside series range {} → {}", event, first, last);
            return Ok(EventWindowResult::out_of_range(Some(event)));
        }

        // saturates at the calendar limits instead of overflowing
        let span = TimeDelta::try_days(self.context_days).unwrap_or(TimeDelta::MAX);
        let lo = event.checked_sub_signed(span).unwrap_or(NaiveDate::MIN);
        let hi = event.checked_add_signed(span).unwrap_or(NaiveDate::MAX);
        let window: Vec<&PricePoint> = series
            .rows()
            .iter()
            .filter(|p| p.date >= lo && p.date <= hi)
            .collect();

        let earlier: Vec<&PricePoint> = window.iter().copied().filter(|p| p.date < event).collect();
        let before: Vec<PricePoint> = earlier[earlier.len().saturating_sub(self.window_rows)..]
            .iter()
            .map(|p| (*p).clone())
            .collect();

        let after: Vec<PricePoint> = window
            .iter()
            .filter(|p| p.date > event)
            .take(self.window_rows)
            .map(|p| (*p).clone())
            .collect();

        debug!(
            "Event {}: {} rows in context window, {} before, {} after",
            event,
            window.len(),
            before.len(),
            after.len()
        );

        Ok(EventWindowResult {
            event_date: Some(event),
            before_avg: mean_pct_change(&before),
            after_avg: mean_pct_change(&after),
            in_range: true,
            before,
            after,
        })
    }
}

/// Mean over the defined `pct_change` values; `None` if there are none.
pub fn mean_pct_change(rows: &[PricePoint]) -> Option<f64> {
    let (sum, count) = rows
        .iter()
        .filter_map(|p| p.pct_change)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
