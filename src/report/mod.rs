//! Rendering: plain-text report, JSON, and cleaned-series CSV export.

use crate::config::ReportConfig;
use crate::models::{EventWindowResult, PriceSeries};
use crate::pipeline::{BatchReport, FileAnalysis, FileOutcome};
use crate::utils::{fmt_number, fmt_pct};
use anyhow::Result;
use std::fmt::Write as _;
use std::io::Write;

const RULE: &str = "─────────────────────────────────────────────";

// ── Text ──────────────────────────────────────────────────────────────────────

pub fn render_text(report: &BatchReport, cfg: &ReportConfig) -> String {
    let mut out = String::new();

    for outcome in &report.files {
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "  Report: {}", outcome.file());
        let _ = writeln!(out, "{}", RULE);
        match outcome {
            FileOutcome::Analyzed(analysis) => render_analysis(&mut out, analysis, cfg),
            FileOutcome::Failed(e) => {
                let _ = writeln!(out, "  ✗ {}", e);
            }
        }
    }

    let s = &report.stats;
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "  {} files | {} rows | {} errors",
        fmt_number(s.files_processed),
        fmt_number(s.rows_kept),
        fmt_number(s.errors)
    );
    out
}

fn render_analysis(out: &mut String, analysis: &FileAnalysis, cfg: &ReportConfig) {
    let series = &analysis.series;
    let Some((first, last)) = series.date_range() else {
        let _ = writeln!(
            out,
            "  No rows with a valid Date and Close ({} read)",
            fmt_number(analysis.rows_read)
        );
        return;
    };

    let _ = writeln!(
        out,
        "  Rows     : {} ({} dropped)",
        fmt_number(series.len()),
        fmt_number(analysis.rows_dropped())
    );
    let _ = writeln!(out, "  From     : {}", first);
    let _ = writeln!(out, "  To       : {}", last);

    render_recent(out, series, cfg);

    for event in &analysis.events {
        render_event(out, event, cfg);
    }
}

fn render_recent(out: &mut String, series: &PriceSeries, cfg: &ReportConfig) {
    let _ = writeln!(out);
    let _ = writeln!(out, "  Recent data");
    let _ = writeln!(out, "    {:<12} {:>14} {:>12}", "Date", "Close", "Pct_Change");
    for p in series.tail(cfg.recent_rows) {
        let _ = writeln!(
            out,
            "    {:<12} {:>14.*} {:>12}",
            p.date.to_string(),
            cfg.decimals,
            p.close,
            fmt_pct(p.pct_change, cfg.decimals, &cfg.undefined_display)
        );
    }
}

fn render_event(out: &mut String, event: &EventWindowResult, cfg: &ReportConfig) {
    let Some(date) = event.event_date else {
        return;
    };

    let _ = writeln!(out);
    if !event.in_range {
        let _ = writeln!(
            out,
            "  ⚠ The event date ({}) is out of range for this dataset.",
            date
        );
        return;
    }

    let _ = writeln!(out, "  Impact analysis around {} (average daily return)", date);
    let _ = writeln!(
        out,
        "    Before Event : {:>10}  ({} days)",
        fmt_pct(event.before_avg, cfg.decimals, &cfg.undefined_display),
        event.before.len()
    );
    let _ = writeln!(
        out,
        "    After Event  : {:>10}  ({} days)",
        fmt_pct(event.after_avg, cfg.decimals, &cfg.undefined_display),
        event.after.len()
    );
}

// ── JSON ──────────────────────────────────────────────────────────────────────

pub fn render_json(report: &BatchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

// ── CSV export ────────────────────────────────────────────────────────────────

/// Write the series in the same layout the loader reads, plus `Pct_Change`.
/// Undefined values become empty cells.
pub fn write_series_csv<W: Write>(
    series: &PriceSeries,
    date_format: &str,
    writer: W,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume", "Pct_Change"])?;

    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

    for p in series.rows() {
        wtr.write_record([
            p.date.format(date_format).to_string(),
            opt(p.open),
            opt(p.high),
            opt(p.low),
            p.close.to_string(),
            opt(p.volume),
            opt(p.pct_change),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
