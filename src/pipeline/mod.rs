//! Batch orchestrator: loader → cleaner → analyzer, one file at a time.
//!
//! Files are independent. Each runs on the blocking pool (bounded by
//! `batch.concurrency`) and a failure in one file, including a task panic,
//! becomes that file's `ParseError` without touching the others. Outcomes are
//! returned in input order.

use crate::analyzer::EventWindowAnalyzer;
use crate::cleaner::clean;
use crate::config::AppConfig;
use crate::error::ParseError;
use crate::loader::{file_label, load_csv};
use crate::models::{EventWindowResult, PriceSeries, RawRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// A file that was read successfully.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub file: String,
    pub rows_read: usize,
    pub series: PriceSeries,
    /// One result per requested event date; empty when the series is.
    pub events: Vec<EventWindowResult>,
}

impl FileAnalysis {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.series.len()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Analyzed(FileAnalysis),
    Failed(ParseError),
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            FileOutcome::Analyzed(a) => &a.file,
            FileOutcome::Failed(e) => &e.file,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BatchStats {
    pub files_processed: usize,
    pub rows_kept: usize,
    pub events_in_range: usize,
    pub errors: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

/// Clean `records` and evaluate every event against the resulting series.
///
/// An empty `event_dates` evaluates a single absent event, so the result
/// still states that nothing was in range.
pub fn analyze_records(
    file: &str,
    records: &[RawRecord],
    event_dates: &[NaiveDate],
    analyzer: &EventWindowAnalyzer,
    date_format: &str,
) -> FileAnalysis {
    let series = clean(records, date_format);

    let requested: Vec<Option<NaiveDate>> = if event_dates.is_empty() {
        vec![None]
    } else {
        event_dates.iter().copied().map(Some).collect()
    };

    let evaluated: Result<Vec<_>, _> = requested
        .into_iter()
        .map(|event| analyzer.evaluate_event(&series, event))
        .collect();

    let events = match evaluated {
        Ok(events) => events,
        Err(e) => {
            warn!("{}: {} (no rows with a valid Date and Close)", file, e);
            Vec::new()
        }
    };

    FileAnalysis {
        file: file.to_string(),
        rows_read: records.len(),
        series,
        events,
    }
}

pub struct BatchPipeline {
    config: AppConfig,
}

impl BatchPipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, files: Vec<PathBuf>, event_dates: Vec<NaiveDate>) -> BatchReport {
        let analyzer = Arc::new(EventWindowAnalyzer::new(&self.config.analysis));
        let date_format: Arc<str> = Arc::from(self.config.analysis.date_format.as_str());
        let event_dates: Arc<[NaiveDate]> = Arc::from(event_dates);
        let sem = Arc::new(Semaphore::new(self.config.batch.concurrency));

        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            let label = file_label(&path);
            let analyzer = Arc::clone(&analyzer);
            let date_format = Arc::clone(&date_format);
            let event_dates = Arc::clone(&event_dates);
            let sem = Arc::clone(&sem);

            let task_label = label.clone();
            let handle = tokio::spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return Ok(Err(ParseError {
                            file: task_label,
                            reason: e.to_string(),
                        }));
                    }
                };

                tokio::task::spawn_blocking(move || -> Result<FileAnalysis, ParseError> {
                    let records = load_csv(&path).map_err(|e| ParseError::new(&task_label, &e))?;
                    Ok(analyze_records(
                        &task_label,
                        &records,
                        &event_dates,
                        &analyzer,
                        &date_format,
                    ))
                })
                .await
            });

            handles.push((label, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        let mut stats = BatchStats::default();

        for (label, handle) in handles {
            stats.files_processed += 1;

            // outer join covers the async task, inner one the blocking read
            let outcome = match handle.await.and_then(|joined| joined) {
                Ok(Ok(analysis)) => {
                    info!(
                        "{}: {} rows kept, {} dropped",
                        analysis.file,
                        analysis.series.len(),
                        analysis.rows_dropped()
                    );
                    stats.rows_kept += analysis.series.len();
                    stats.events_in_range += analysis.events.iter().filter(|e| e.in_range).count();
                    FileOutcome::Analyzed(analysis)
                }
                Ok(Err(e)) => {
                    warn!("{}", e);
                    stats.errors += 1;
                    FileOutcome::Failed(e)
                }
                Err(e) => {
                    error!("Task panic for {}: {}", label, e);
                    stats.errors += 1;
                    FileOutcome::Failed(ParseError {
                        file: label,
                        reason: format!("task failed: {}", e),
                    })
                }
            };
            outcomes.push(outcome);
        }

        info!(
            "Done: {} files | {} rows | {} events in range | {} errors",
            stats.files_processed, stats.rows_kept, stats.events_in_range, stats.errors
        );

        BatchReport {
            files: outcomes,
            stats,
        }
    }
}
