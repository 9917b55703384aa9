mod analyzer;
mod cleaner;
mod config;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;
mod utils;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cleaner::clean;
use crate::config::AppConfig;
use crate::loader::{expand_inputs, load_csv};
use crate::pipeline::BatchPipeline;

#[derive(Parser)]
#[command(name = "event-impact", about = "Price reaction around an event date", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Average daily return in the days before and after an event
    Analyze {
        /// CSV files or directories of CSV files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Event date (YYYY-MM-DD); repeat to evaluate several events
        #[arg(short, long = "event-date")]
        event_date: Vec<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the cleaned series (with Pct_Change) as CSV
    Clean {
        file: PathBuf,

        /// Output path (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "event_impact=info,warn",
        1 => "event_impact=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Analyze {
            inputs,
            event_date,
            json,
        } => {
            let files = expand_inputs(&inputs)?;
            anyhow::ensure!(!files.is_empty(), "No CSV files found in {:?}", inputs);
            info!("Analyzing {} files", files.len());

            let report = {
                let _t = utils::Timer::start("Event analysis");
                BatchPipeline::new(config.clone()).run(files, event_date).await
            };

            if json {
                println!("{}", report::render_json(&report)?);
            } else {
                print!("{}", report::render_text(&report, &config.report));
            }
        }

        Command::Clean { file, out } => {
            let records = load_csv(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let series = clean(&records, &config.analysis.date_format);
            info!("{:?}: {} of {} rows kept", file, series.len(), records.len());

            match out {
                Some(path) => {
                    let f = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    report::write_series_csv(&series, &config.analysis.date_format, f)?;
                }
                None => {
                    let stdout = std::io::stdout().lock();
                    report::write_series_csv(&series, &config.analysis.date_format, stdout)?;
                }
            }
        }
    }

    Ok(())
}
