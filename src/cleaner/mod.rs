//! Raw records → validated, sorted price series with daily returns.

use crate::models::{PricePoint, PriceSeries, RawRecord};
use chrono::NaiveDate;
use tracing::debug;

/// Month/day/year, as exported by most brokerage CSV downloads.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

// ── Field parsers ─────────────────────────────────────────────────────────────

/// Parse a number, dropping thousands separators.
/// "1,234.56" → 1234.56 | "" → None | "nan" / "inf" → None | "abc" → None
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date in exactly `format`; anything else is undefined.
pub fn parse_date(s: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), format).ok()
}

/// Percentage change from `prev` to `curr`; undefined when `prev` is zero
/// or the result is not finite.
pub fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev * 100.0).filter(|v| v.is_finite())
}

// ── RawRecord → PricePoint ────────────────────────────────────────────────────

/// Parse one row. `None` when Date or Close is undefined.
pub fn record_to_point(row: &RawRecord, date_format: &str) -> Option<PricePoint> {
    let date = parse_date(row.date.as_deref()?, date_format)?;
    let close = parse_number(row.close.as_deref()?)?;

    Some(PricePoint {
        date,
        open: row.open.as_deref().and_then(parse_number),
        high: row.high.as_deref().and_then(parse_number),
        low: row.low.as_deref().and_then(parse_number),
        close,
        volume: row.volume.as_deref().and_then(parse_number),
        pct_change: None,
    })
}

// ── Series ────────────────────────────────────────────────────────────────────

/// Parse, drop invalid rows, sort by date, then derive `pct_change`.
///
/// Dates are read with `date_format` (normally [`DEFAULT_DATE_FORMAT`]).
/// Returns are taken between neighbouring surviving rows, so a dropped row
/// is bridged rather than leaving a gap.
pub fn clean(records: &[RawRecord], date_format: &str) -> PriceSeries {
    let mut points: Vec<PricePoint> = records
        .iter()
        .filter_map(|r| record_to_point(r, date_format))
        .collect();

    let dropped = records.len() - points.len();
    if dropped > 0 {
        debug!("Dropped {} of {} rows without a valid Date/Close", dropped, records.len());
    }

    points.sort_by_key(|p| p.date);

    for i in 1..points.len() {
        points[i].pct_change = pct_change(points[i - 1].close, points[i].close);
    }

    PriceSeries::from_sorted(points)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn raw(date: &str, close: &str) -> RawRecord {
        RawRecord {
            date: Some(date.to_string()),
            close: Some(close.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn clean_default(records: &[RawRecord]) -> PriceSeries {
        clean(records, DEFAULT_DATE_FORMAT)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number(" 610.00 "), Some(610.0));
        assert_eq!(parse_number("12,345,678"), Some(12_345_678.0));
        assert_eq!(parse_number("-3.5"), Some(-3.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-infinity"), None);
        assert_eq!(parse_number("N/A"), None);
    }

    #[test]
    fn test_parse_date_is_month_first() {
        assert_eq!(parse_date("02/03/2024", DEFAULT_DATE_FORMAT), Some(d(2024, 2, 3)));
        assert_eq!(parse_date("1/5/2024", DEFAULT_DATE_FORMAT), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("13/01/2024", DEFAULT_DATE_FORMAT), None);
        assert_eq!(parse_date("2024-01-05", DEFAULT_DATE_FORMAT), None);
        assert_eq!(parse_date("Jan 5, 2024", DEFAULT_DATE_FORMAT), None);
    }

    #[test]
    fn test_thousands_separator_close() {
        let series = clean_default(&[raw("01/02/2024", "1,234.56")]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.rows()[0].close, 1234.56);
        assert_eq!(series.rows()[0].pct_change, None);
    }

    #[test]
    fn test_optional_fields_parse_independently() {
        let row = RawRecord {
            date: Some("03/04/2024".into()),
            open: Some("1,000.5".into()),
            high: Some("oops".into()),
            low: None,
            close: Some("1,010".into()),
            volume: Some("2,500,000".into()),
        };
        let p = record_to_point(&row, DEFAULT_DATE_FORMAT).unwrap();
        assert_eq!(p.open, Some(1000.5));
        assert_eq!(p.high, None);
        assert_eq!(p.low, None);
        assert_eq!(p.close, 1010.0);
        assert_eq!(p.volume, Some(2_500_000.0));
    }

    #[test]
    fn test_drops_rows_without_date_or_close() {
        let rows = vec![
            raw("01/02/2024", "100"),
            raw("2024-01-03", "101"),
            raw("01/04/2024", ""),
            RawRecord {
                date: Some("01/05/2024".into()),
                ..Default::default()
            },
            raw("01/08/2024", "103"),
        ];
        let series = clean_default(&rows);
        let dates: Vec<_> = series.rows().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 8)]);
        // bridged across the dropped rows
        let pct = series.rows()[1].pct_change.unwrap();
        assert!((pct - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_sorts_ascending_and_computes_returns() {
        let rows = vec![
            raw("01/04/2024", "105"),
            raw("01/02/2024", "100"),
            raw("01/03/2024", "102"),
        ];
        let series = clean_default(&rows);
        assert!(series.rows().windows(2).all(|w| w[0].date <= w[1].date));

        let closes: Vec<_> = series.rows().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![100.0, 102.0, 105.0]);

        for w in series.rows().windows(2) {
            let expected = (w[1].close - w[0].close) / w[0].close * 100.0;
            let got = w[1].pct_change.unwrap();
            assert!(((got - expected) / expected).abs() < 1e-9);
        }
        assert_eq!(series.rows()[0].pct_change, None);
    }

    #[test]
    fn test_zero_previous_close_leaves_return_undefined() {
        let series = clean_default(&[raw("01/02/2024", "0"), raw("01/03/2024", "5")]);
        assert_eq!(series.rows()[1].pct_change, None);
    }

    #[test]
    fn test_infinite_close_is_dropped_and_returns_stay_finite() {
        let rows = vec![
            raw("01/01/2024", "100"),
            raw("01/02/2024", "inf"),
            raw("01/03/2024", "100"),
            raw("01/04/2024", "101"),
        ];
        let series = clean_default(&rows);
        assert_eq!(series.len(), 3);
        assert!(series.rows().iter().all(|p| p.pct_change.map_or(true, f64::is_finite)));
        assert_eq!(series.rows()[1].pct_change, Some(0.0));
        assert!((series.rows()[2].pct_change.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_overflowing_return_is_undefined() {
        assert_eq!(pct_change(f64::MIN_POSITIVE, f64::MAX), None);
        assert_eq!(pct_change(100.0, 110.0).map(|v| (v - 10.0).abs() < 1e-9), Some(true));
    }

    #[test]
    fn test_unparseable_date_column_gives_empty_series() {
        let rows = vec![raw("2024-01-02", "100"), raw("2024-01-03", "101")];
        assert!(clean_default(&rows).is_empty());
    }

    #[test]
    fn test_custom_date_format() {
        let series = clean(&[raw("2024-01-02", "100")], "%Y-%m-%d");
        assert_eq!(series.first().unwrap().date, d(2024, 1, 2));
    }
}
