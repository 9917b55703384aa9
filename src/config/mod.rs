use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Event-window parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Half-width, in calendar days, of the context window around the event.
    #[serde(default = "default_context_days")]
    pub context_days: i64,

    /// Maximum rows taken on each side of the event.
    #[serde(default = "default_window_rows")]
    pub window_rows: usize,

    #[serde(default = "default_date_format")]
    pub date_format: String,
}

/// Multi-file batch settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Output formatting
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_recent_rows")]
    pub recent_rows: usize,

    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Shown in place of an average that could not be computed.
    #[serde(default = "default_undefined_display")]
    pub undefined_display: String,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

/// A century either side is more context than any price file carries.
const MAX_CONTEXT_DAYS: i64 = 36_500;

fn default_context_days() -> i64 {
    15
}
fn default_window_rows() -> usize {
    5
}
fn default_date_format() -> String {
    "%m/%d/%Y".to_string()
}
fn default_concurrency() -> usize {
    4
}
fn default_recent_rows() -> usize {
    5
}
fn default_decimals() -> usize {
    2
}
fn default_undefined_display() -> String {
    "n/a".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context_days: default_context_days(),
            window_rows: default_window_rows(),
            date_format: default_date_format(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_rows: default_recent_rows(),
            decimals: default_decimals(),
            undefined_display: default_undefined_display(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("EVENT_IMPACT").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Invalid event-impact configuration")?;
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0..=MAX_CONTEXT_DAYS).contains(&self.analysis.context_days),
            "analysis.context_days must be between 0 and {}",
            MAX_CONTEXT_DAYS
        );
        anyhow::ensure!(self.analysis.window_rows > 0, "analysis.window_rows must be > 0");
        anyhow::ensure!(self.batch.concurrency > 0, "batch.concurrency must be > 0");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_five_day_window() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.analysis.context_days, 15);
        assert_eq!(cfg.analysis.window_rows, 5);
        assert_eq!(cfg.analysis.date_format, "%m/%d/%Y");
        assert_eq!(cfg.report.decimals, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[analysis]\nwindow_rows = 3\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.analysis.window_rows, 3);
        assert_eq!(cfg.analysis.context_days, 15);
        assert_eq!(cfg.batch.concurrency, 4);
        assert_eq!(cfg.report.undefined_display, "n/a");
    }

    #[test]
    fn test_oversized_context_days_rejected() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[analysis]\ncontext_days = 200000000000000\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("context_days"));
    }

    #[test]
    fn test_negative_context_days_rejected() {
        let mut cfg = AppConfig::default();
        cfg.analysis.context_days = -1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut cfg = AppConfig::default();
        cfg.analysis.window_rows = 0;
        assert!(cfg.validate().is_err());
    }
}
