use serde::Serialize;
use thiserror::Error;

/// Failure to read an input as tabular price data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}

/// File-level failure, attributed to the file that caused it.
#[derive(Debug, Clone, Error, Serialize)]
#[error("Error reading file {file}: {reason}")]
pub struct ParseError {
    pub file: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, source: &LoadError) -> Self {
        Self {
            file: file.into(),
            reason: source.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Cannot evaluate an event against an empty price series")]
    EmptySeries,
}
